use crate::{api, setting::Setting, Error, Result, Service};
use actix_cors::Cors;
use actix_web::{
    body::MessageBody,
    dev::{ServiceFactory, ServiceRequest},
    middleware, web, App as WebApp, HttpServer,
};
use razorpay_client::{Gateway, Razorpay};
use sea_orm::{ConnectOptions, Database};
use std::path::Path;
use tracing::{info, warn};

pub struct AppState {
    pub service: Service,
    pub setting: Setting,
}

impl AppState {
    pub async fn create<P: AsRef<Path>>(
        setting_path: Option<P>,
        setting_env_prefix: Option<String>,
    ) -> Result<Self> {
        let env_notice = setting_env_prefix
            .as_ref()
            .map(|s| {
                format!(
                    ", config will be overridden by ENV settings with prefix `{}_`",
                    s
                )
            })
            .unwrap_or_default();

        let setting = if let Some(path) = setting_path {
            info!("Load config {:?}{}", path.as_ref(), env_notice);
            Setting::read(path.as_ref(), setting_env_prefix)?
        } else if let Some(prefix) = setting_env_prefix {
            info!("Load default config{}", env_notice);
            Setting::from_env(prefix)?
        } else {
            info!("Load default config");
            Setting::default()
        };

        info!(
            "{:?} {:?} {:?}",
            setting.network, setting.razorpay, setting.checkout
        );

        Self::from_setting(setting).await
    }

    pub async fn from_setting(setting: Setting) -> Result<Self> {
        let gateway: Option<Box<dyn Gateway + Sync + Send>> = match setting.razorpay.credentials()
        {
            Some((key_id, key_secret)) => Some(Box::new(Razorpay::new(
                &setting.razorpay.api_url,
                key_id,
                key_secret,
                setting.razorpay.timeout(),
            )?)),
            None => {
                warn!("razorpay keys are not configured, orders will be mocked");
                None
            }
        };

        let conn = match setting.database_url()? {
            Some(url) => {
                let mut options = ConnectOptions::new(url);
                options.sqlx_logging_level(tracing::log::LevelFilter::Trace);
                Some(Database::connect(options).await?)
            }
            None => {
                warn!("db_url is not configured, donations can't be saved");
                None
            }
        };

        let secret = setting.razorpay.key_secret().map(ToOwned::to_owned);
        let service = Service::new(gateway, secret, conn);

        Ok(Self { service, setting })
    }
}

pub fn create_web_app(
    data: web::Data<AppState>,
) -> WebApp<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = actix_web::dev::ServiceResponse<impl MessageBody>,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    WebApp::new()
        .app_data(data)
        .app_data(
            web::JsonConfig::default()
                .error_handler(|err, _req| Error::Validation(err.to_string()).into()),
        )
        .app_data(
            web::PathConfig::default()
                .error_handler(|err, _req| Error::Validation(err.to_string()).into()),
        )
        .wrap(middleware::Logger::default()) // enable logger
        .service(
            api::scope().wrap(
                Cors::default()
                    .allow_any_header()
                    .allow_any_origin()
                    .allowed_methods(vec!["GET", "POST"])
                    .max_age(86_400),
            ),
        )
}

/// start app
pub async fn start(state: AppState) -> Result<()> {
    let state = web::Data::new(state);

    let c_data = state.clone();
    let server = HttpServer::new(move || create_web_app(c_data.clone()));
    let num = if state.setting.thread.http == 0 {
        num_cpus::get()
    } else {
        state.setting.thread.http
    };
    let host = state.setting.network.host.clone();
    let port = state.setting.network.port;
    info!("Start http server {}:{}", host, port);
    server.workers(num).bind((host, port))?.run().await?;
    Ok(())
}
