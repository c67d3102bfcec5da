use crate::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Create order params, amount in the currency subunit (paise for INR).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OrderRequest {
    pub amount: u64,
    pub currency: String,
    pub receipt: String,
    pub notes: BTreeMap<String, String>,
}

/// Order created by the gateway.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Order {
    pub id: String,
    #[serde(default)]
    pub entity: String,
    pub amount: u64,
    #[serde(default)]
    pub amount_paid: u64,
    #[serde(default)]
    pub amount_due: u64,
    pub currency: String,
    #[serde(default)]
    pub receipt: Option<String>,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub attempts: u32,
    /// razorpay returns `[]` for empty notes
    #[serde(default)]
    pub notes: Value,
    #[serde(default)]
    pub created_at: u64,
}

/// the payment gateway trait for hosted checkout orders
#[async_trait::async_trait]
pub trait Gateway {
    async fn create_order(&self, req: &OrderRequest) -> Result<Order>;
}
