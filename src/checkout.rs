//! Browser checkout handoff.
//!
//! The hosted checkout widget is opaque, the server only builds its options
//! and validates what the widget callbacks report back.

use crate::{catalog::minor_units, setting, Error, Result};
use entity::donation;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct Prefill {
    pub name: String,
    pub email: String,
    pub contact: String,
}

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct Notes {
    pub donation_id: String,
}

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct Theme {
    pub color: String,
}

/// checkout.js options
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct CheckoutOptions {
    pub key: String,
    pub amount: u64,
    pub currency: String,
    pub name: String,
    pub description: String,
    pub order_id: String,
    pub prefill: Prefill,
    pub notes: Notes,
    pub theme: Theme,
}

impl CheckoutOptions {
    pub fn new(
        razorpay: &setting::Razorpay,
        checkout: &setting::Checkout,
        donation: &donation::Model,
    ) -> Result<Self> {
        let key = razorpay
            .key_id()
            .ok_or(Error::NotConfigured("payment gateway key"))?;
        if donation.status.is_terminal() {
            return Err(Error::Conflict("The donation is already closed.".to_owned()));
        }
        let order_id = donation
            .order_id
            .clone()
            .ok_or_else(|| Error::Conflict("The donation has no payment order.".to_owned()))?;
        Ok(Self {
            key: key.to_owned(),
            amount: minor_units(donation.amount.max(0) as u64),
            currency: razorpay.currency.clone(),
            name: checkout.name.clone(),
            description: donation.seva_name.clone(),
            order_id,
            prefill: Prefill {
                name: donation.full_name.clone(),
                email: donation.email.clone(),
                contact: donation.phone.clone(),
            },
            notes: Notes {
                donation_id: donation.id.to_string(),
            },
            theme: Theme {
                color: checkout.theme_color.clone(),
            },
        })
    }
}

/// Raw widget callback as posted by the browser.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum CheckoutEvent {
    Success {
        #[serde(alias = "razorpay_payment_id", alias = "razorpayPaymentId")]
        payment_id: String,
        #[serde(default, alias = "razorpay_order_id", alias = "razorpayOrderId")]
        order_id: Option<String>,
        #[serde(default, alias = "razorpay_signature", alias = "razorpaySignature")]
        signature: Option<String>,
    },
    Dismissed,
}

/// Validated checkout callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutOutcome {
    /// success with the gateway signature
    Verified {
        order_id: String,
        payment_id: String,
        signature: String,
    },
    /// success reported by the browser alone
    Unverified { payment_id: String },
    /// donor closed the checkout
    Dismissed,
}

fn present(s: Option<String>) -> Option<String> {
    s.map(|s| s.trim().to_owned()).filter(|s| !s.is_empty())
}

impl TryFrom<CheckoutEvent> for CheckoutOutcome {
    type Error = Error;

    fn try_from(event: CheckoutEvent) -> Result<Self> {
        match event {
            CheckoutEvent::Dismissed => Ok(CheckoutOutcome::Dismissed),
            CheckoutEvent::Success {
                payment_id,
                order_id,
                signature,
            } => {
                let payment_id = present(Some(payment_id))
                    .ok_or_else(|| Error::Validation("payment_id is required".to_owned()))?;
                match (present(order_id), present(signature)) {
                    (Some(order_id), Some(signature)) => Ok(CheckoutOutcome::Verified {
                        order_id,
                        payment_id,
                        signature,
                    }),
                    (None, None) => Ok(CheckoutOutcome::Unverified { payment_id }),
                    _ => Err(Error::Validation(
                        "order_id and signature must be sent together".to_owned(),
                    )),
                }
            }
        }
    }
}
