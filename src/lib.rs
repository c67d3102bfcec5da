use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde_json::json;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::error;

mod api;
mod app;
pub mod catalog;
pub mod checkout;
mod service;
pub mod setting;

pub use {
    app::*,
    service::{Donor, OrderOutcome, Service},
};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Gateway(#[from] razorpay_client::Error),
    #[error(transparent)]
    DbErr(#[from] sea_orm::DbErr),
    #[error(transparent)]
    Config(#[from] config::ConfigError),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("{0}")]
    Message(String),
    #[error("{0}")]
    Validation(String),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("{0}")]
    Conflict(String),
    #[error("{0} is not configured")]
    NotConfigured(&'static str),
    #[error("invalid payment signature")]
    InvalidSignature,
}

impl Error {
    /// Message safe to show to the donor.
    pub fn public_message(&self) -> String {
        match self {
            Error::Validation(_)
            | Error::NotFound(_)
            | Error::Conflict(_)
            | Error::NotConfigured(_)
            | Error::InvalidSignature => self.to_string(),
            Error::Json(_) => "invalid payload".to_owned(),
            Error::Gateway(razorpay_client::Error::Timeout) => {
                "payment gateway timed out, please retry".to_owned()
            }
            Error::Gateway(e) if e.is_rejected() => e.to_string(),
            Error::Gateway(_) => "payment initialization failed".to_owned(),
            Error::DbErr(_) => "failed to save donation".to_owned(),
            _ => "internal server error".to_owned(),
        }
    }
}

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        match self {
            Error::Validation(_) | Error::Json(_) => StatusCode::BAD_REQUEST,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Conflict(_) => StatusCode::CONFLICT,
            Error::InvalidSignature => StatusCode::UNAUTHORIZED,
            Error::Gateway(razorpay_client::Error::Timeout) => StatusCode::GATEWAY_TIMEOUT,
            Error::Gateway(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Creates full response for error.
    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            error!(error = self.to_string(), "request failed");
        }
        HttpResponse::build(status).json(json!({
            "success": false,
            "error": self.public_message(),
        }))
    }
}

pub type Result<T, E = Error> = core::result::Result<T, E>;

pub fn now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

pub fn now_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis()
}
