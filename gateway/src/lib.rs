#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    InvalidUri(#[from] hyper::http::uri::InvalidUri),
    #[error(transparent)]
    Http(#[from] hyper::http::Error),
    #[error(transparent)]
    Hyper(#[from] hyper::Error),
    #[error(transparent)]
    OpensslErrorStack(#[from] openssl::error::ErrorStack),
    #[error("{description}")]
    Rejected {
        status: u16,
        code: String,
        description: String,
    },
    #[error("request timed out")]
    Timeout,
    #[error("invalid: {0}")]
    Invalid(String),
}

impl Error {
    /// The gateway answered and refused the request.
    pub fn is_rejected(&self) -> bool {
        matches!(self, Error::Rejected { .. })
    }
}

pub type Result<T, E = Error> = core::result::Result<T, E>;

pub use async_trait::async_trait;

pub mod gateway;
pub use gateway::{Gateway, Order, OrderRequest};

pub mod razorpay;
pub use razorpay::Razorpay;

pub mod signature;
