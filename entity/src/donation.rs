use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// donation payment status
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(Some(16))")]
#[serde(rename_all = "snake_case")]
pub enum Status {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "paid")]
    Paid,
    #[sea_orm(string_value = "failed")]
    Failed,
}

impl Status {
    /// paid and failed are final
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Status::Pending)
    }
}

/// donations

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "donations")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub seva_slug: String,
    pub seva_name: String,

    /// major currency unit
    pub amount: i64,

    pub full_name: String,
    pub email: String,
    pub phone: String,

    #[sea_orm(column_type = "Text", nullable)]
    pub address: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub message: Option<String>,
    /// PAN number
    pub tax_id: Option<String>,
    pub country: Option<String>,

    /// gateway order id
    pub order_id: Option<String>,
    /// gateway payment id
    pub payment_id: Option<String>,

    pub status: Status,

    /// status confirmed by a payment signature
    pub verified: bool,

    /// data create time
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
