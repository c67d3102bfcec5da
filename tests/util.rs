#![allow(unused)]

use actix_http::{body::MessageBody, Method, Request};
use actix_web::{
    dev::{Service, ServiceResponse},
    test::{call_service, read_body, TestRequest},
};
use anyhow::Result;
use cowseva::{catalog::Seva, setting::Setting, AppState};
use migration::{Migrator, MigratorTrait};
use razorpay_client::{async_trait, Error, Gateway, Order, OrderRequest};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DbConn};
use serde_json::Value;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

pub const KEY_ID: &str = "rzp_test_key";
pub const KEY_SECRET: &str = "rzp_test_secret";

/// In process gateway, counts calls and answers with sequential order ids.
#[derive(Clone, Default)]
pub struct FakeGateway {
    pub calls: Arc<AtomicUsize>,
    /// reject every order with this description
    pub reject: Option<String>,
    pub timeout: bool,
}

impl FakeGateway {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Gateway for FakeGateway {
    async fn create_order(&self, req: &OrderRequest) -> razorpay_client::Result<Order> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.timeout {
            return Err(Error::Timeout);
        }
        if let Some(description) = &self.reject {
            return Err(Error::Rejected {
                status: 400,
                code: "BAD_REQUEST_ERROR".to_owned(),
                description: description.clone(),
            });
        }
        Ok(Order {
            id: format!("order_test{}", n),
            entity: "order".to_owned(),
            amount: req.amount,
            amount_paid: 0,
            amount_due: req.amount,
            currency: req.currency.clone(),
            receipt: Some(req.receipt.clone()),
            status: "created".to_owned(),
            attempts: 0,
            notes: serde_json::to_value(&req.notes)?,
            created_at: 0,
        })
    }
}

pub fn feed_a_cow_499() -> Seva {
    serde_json::from_value(serde_json::json!({
        "slug": "feed-a-cow",
        "name": "Feed a cow",
        "amount": 499,
    }))
    .unwrap()
}

/// test state on a fresh in memory sqlite database
pub async fn create_state(gateway: Option<FakeGateway>, secret: bool) -> Result<AppState> {
    let mut setting = Setting::default();
    setting.catalog = vec![feed_a_cow_499()].into();
    if gateway.is_some() {
        setting.razorpay.key_id = Some(KEY_ID.to_owned());
    }
    if secret {
        setting.razorpay.key_secret = Some(KEY_SECRET.to_owned());
    }

    let mut options = ConnectOptions::new("sqlite::memory:".to_owned());
    options.max_connections(1);
    let conn = Database::connect(options).await?;
    Migrator::up(&conn, None).await?;

    let service = cowseva::Service::new(
        gateway.map(|g| Box::new(g) as Box<dyn Gateway + Sync + Send>),
        setting.razorpay.key_secret().map(ToOwned::to_owned),
        Some(conn),
    );
    Ok(AppState { service, setting })
}

/// live gateway and signing secret
pub async fn create_test_state() -> Result<(AppState, FakeGateway)> {
    let gateway = FakeGateway::default();
    let state = create_state(Some(gateway.clone()), true).await?;
    Ok((state, gateway))
}

/// reject every update of the donations table, reads keep working
pub async fn read_only_donations(conn: &DbConn) -> Result<()> {
    conn.execute_unprepared(
        "CREATE TRIGGER donations_read_only BEFORE UPDATE ON donations \
         BEGIN SELECT RAISE(ABORT, 'donations are read only'); END;",
    )
    .await?;
    Ok(())
}

pub fn get_req(path: &str) -> TestRequest {
    TestRequest::with_uri(path)
}

pub fn post_req(path: &str, data: Value) -> TestRequest {
    TestRequest::with_uri(path)
        .method(Method::POST)
        .set_json(data)
}

pub async fn call<S, B>(req: TestRequest, app: &S) -> Result<(Value, u16)>
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let res = call_service(app, req.to_request()).await;
    let status = res.status().as_u16();
    let body = read_body(res).await;
    let val = serde_json::from_slice(&body)?;
    Ok((val, status))
}

pub async fn get<S, B>(app: &S, path: &str) -> Result<(Value, u16)>
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    call(get_req(path), app).await
}

pub async fn post<S, B>(app: &S, path: &str, data: Value) -> Result<(Value, u16)>
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    call(post_req(path, data), app).await
}
