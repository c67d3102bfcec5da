//! razorpay v1 orders api

use crate::{gateway::*, Error, Result};
use base64::engine::{general_purpose, Engine};
use hyper::{
    client::HttpConnector,
    header::{AUTHORIZATION, CONTENT_TYPE},
    Body, Client, Method, Request, Uri,
};
use hyper_openssl::HttpsConnector;
use openssl::ssl::{SslConnector, SslMethod};
use serde::Deserialize;
use std::time::Duration;

pub const API_URL: &str = "https://api.razorpay.com";

type TlsClient = Client<HttpsConnector<HttpConnector>, Body>;

#[derive(Clone, Debug)]
pub struct Razorpay {
    client: TlsClient,
    orders_uri: Uri,
    authorization: String,
    timeout: Option<Duration>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct ErrorDetail {
    code: String,
    description: String,
}

impl Razorpay {
    pub fn new(
        api_url: &str,
        key_id: &str,
        key_secret: &str,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        if key_id.is_empty() || key_secret.is_empty() {
            return Err(Error::Invalid("empty key".to_owned()));
        }
        let orders_uri: Uri = format!("{}/v1/orders", api_url.trim_end_matches('/')).parse()?;

        let mut http = HttpConnector::new();
        http.enforce_http(false);
        let connector = SslConnector::builder(SslMethod::tls())?;
        let https = HttpsConnector::with_connector(http, connector)?;
        let client = Client::builder().build(https);

        let credentials = general_purpose::STANDARD.encode(format!("{}:{}", key_id, key_secret));
        Ok(Self {
            client,
            orders_uri,
            authorization: format!("Basic {}", credentials),
            timeout,
        })
    }

    async fn post(&self, body: Vec<u8>) -> Result<(u16, Vec<u8>)> {
        let req = Request::builder()
            .method(Method::POST)
            .uri(self.orders_uri.clone())
            .header(AUTHORIZATION, &self.authorization)
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body))?;
        let res = self.client.request(req).await?;
        let status = res.status().as_u16();
        let bytes = hyper::body::to_bytes(res.into_body()).await?;
        Ok((status, bytes.to_vec()))
    }
}

#[async_trait::async_trait]
impl Gateway for Razorpay {
    async fn create_order(&self, req: &OrderRequest) -> Result<Order> {
        let body = serde_json::to_vec(req)?;
        let (status, bytes) = match self.timeout {
            Some(timeout) => tokio::time::timeout(timeout, self.post(body))
                .await
                .map_err(|_| Error::Timeout)??,
            None => self.post(body).await?,
        };

        if (200..300).contains(&status) {
            Ok(serde_json::from_slice(&bytes)?)
        } else {
            let detail = serde_json::from_slice::<ErrorBody>(&bytes)
                .map(|b| b.error)
                .unwrap_or_default();
            Err(Error::Rejected {
                status,
                code: detail.code,
                description: if detail.description.is_empty() {
                    format!("gateway responded with status {}", status)
                } else {
                    detail.description
                },
            })
        }
    }
}
