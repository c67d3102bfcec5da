//! http api

use crate::{
    catalog::{Catalog, Seva},
    checkout::{CheckoutEvent, CheckoutOptions, CheckoutOutcome},
    AppState, Donor, Error, OrderOutcome, Result,
};
use actix_web::{get, post, web, HttpResponse, Responder, Scope};
use entity::donation;
use serde::{Deserialize, Serialize};
use serde_aux::prelude::deserialize_option_number_from_string;
use serde_json::{json, Value};
use tracing::warn;

pub const CARGO_PKG_VERSION: Option<&'static str> = option_env!("CARGO_PKG_VERSION");

/// country stored when the donor leaves it empty
pub const DEFAULT_COUNTRY: &str = "India";

fn version() -> String {
    CARGO_PKG_VERSION.map(ToOwned::to_owned).unwrap_or_default()
}

pub fn scope() -> Scope {
    web::scope("/api")
        .service(health)
        .service(list_sevas)
        .service(get_seva)
        .service(create_donation)
        .service(mark_paid)
        .service(get_donation)
        .service(checkout_options)
        .service(checkout_callback)
        .service(create_order)
        .service(verify_payment)
}

fn donation_json(d: &donation::Model) -> Value {
    json!({
        "id": d.id,
        "seva_slug": d.seva_slug,
        "seva_name": d.seva_name,
        "amount": d.amount,
        "status": d.status,
        "order_id": d.order_id,
        "payment_id": d.payment_id,
        "created_at": d.created_at,
    })
}

fn trimmed(s: Option<String>) -> Option<String> {
    s.map(|s| s.trim().to_owned()).filter(|s| !s.is_empty())
}

fn required(s: &str, field: &str) -> Result<String> {
    let s = s.trim();
    if s.is_empty() {
        Err(Error::Validation(format!("{} is required", field)))
    } else {
        Ok(s.to_owned())
    }
}

fn valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    }
}

#[get("/health")]
pub async fn health(state: web::Data<AppState>) -> Result<impl Responder, Error> {
    let database = match state.service.db() {
        Ok(db) => db.ping().await.is_ok(),
        Err(_) => false,
    };
    Ok(web::Json(json!({
        "version": version(),
        "gateway": if state.service.has_gateway() { "live" } else { "mock" },
        "database": database,
    })))
}

#[get("/sevas")]
pub async fn list_sevas(state: web::Data<AppState>) -> Result<impl Responder, Error> {
    Ok(web::Json(json!({ "sevas": state.setting.catalog.list() })))
}

#[get("/sevas/{slug}")]
pub async fn get_seva(
    state: web::Data<AppState>,
    slug: web::Path<String>,
) -> Result<impl Responder, Error> {
    let seva = state
        .setting
        .catalog
        .get(&slug)
        .ok_or(Error::NotFound("seva"))?;
    Ok(web::Json(json!({ "seva": seva })))
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CreateDonationReq {
    #[serde(alias = "sevaSlug")]
    pub seva_slug: String,
    #[serde(alias = "fullName")]
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub address: Option<String>,
    pub message: Option<String>,
    #[serde(alias = "pan_number", alias = "panNumber", alias = "taxId")]
    pub tax_id: Option<String>,
    pub country: Option<String>,
}

impl CreateDonationReq {
    /// Resolve the seva from the catalog and check donor fields.
    pub fn validate(self, catalog: &Catalog) -> Result<(&Seva, Donor)> {
        let slug = required(&self.seva_slug, "seva_slug")?;
        let seva = catalog
            .get(&slug)
            .ok_or_else(|| Error::Validation(format!("unknown seva `{}`", slug)))?;

        let full_name = required(&self.full_name, "full_name")?;
        if full_name.chars().count() < 2 {
            return Err(Error::Validation("full_name is too short".to_owned()));
        }
        let email = required(&self.email, "email")?;
        if !valid_email(&email) {
            return Err(Error::Validation("email is invalid".to_owned()));
        }
        let phone = required(&self.phone, "phone")?;
        if phone.chars().count() < 8 {
            return Err(Error::Validation("phone is invalid".to_owned()));
        }

        Ok((
            seva,
            Donor {
                full_name,
                email,
                phone,
                address: trimmed(self.address),
                message: trimmed(self.message),
                tax_id: trimmed(self.tax_id),
                country: trimmed(self.country).unwrap_or_else(|| DEFAULT_COUNTRY.to_owned()),
            },
        ))
    }
}

/// donation intake, amount and name come from the catalog
#[post("/donations")]
pub async fn create_donation(
    state: web::Data<AppState>,
    data: web::Json<CreateDonationReq>,
) -> Result<impl Responder, Error> {
    let (seva, donor) = data.into_inner().validate(&state.setting.catalog)?;
    let donation = state.service.create_donation(seva, donor).await?;
    Ok(web::Json(json!({ "donation_id": donation.id })))
}

#[get("/donations/{id}")]
pub async fn get_donation(
    state: web::Data<AppState>,
    id: web::Path<i32>,
) -> Result<impl Responder, Error> {
    let donation = state
        .service
        .get_donation(id.into_inner())
        .await?
        .ok_or(Error::NotFound("donation"))?;
    Ok(web::Json(json!({ "donation": donation_json(&donation) })))
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CreateOrderReq {
    /// advisory only, the catalog amount is charged
    #[serde(deserialize_with = "deserialize_option_number_from_string")]
    pub amount: Option<f64>,
    #[serde(alias = "sevaSlug")]
    pub seva_slug: String,
    #[serde(
        alias = "donationId",
        deserialize_with = "deserialize_option_number_from_string"
    )]
    pub donation_id: Option<i32>,
}

#[post("/orders")]
pub async fn create_order(
    state: web::Data<AppState>,
    data: web::Json<CreateOrderReq>,
) -> Result<impl Responder, Error> {
    let data = data.into_inner();
    let slug = required(&data.seva_slug, "seva_slug")?;
    let seva = state
        .setting
        .catalog
        .get(&slug)
        .ok_or_else(|| Error::Validation(format!("unknown seva `{}`", slug)))?;

    if let Some(amount) = data.amount {
        if amount != seva.amount as f64 {
            warn!(
                seva = %seva.slug,
                amount,
                catalog_amount = seva.amount,
                "client amount ignored"
            );
        }
    }

    let donation = match data.donation_id {
        Some(id) => {
            let donation = state
                .service
                .get_donation(id)
                .await?
                .ok_or(Error::NotFound("donation"))?;
            if donation.status.is_terminal() {
                return Err(Error::Conflict("The donation is already closed.".to_owned()));
            }
            if donation.seva_slug != seva.slug {
                return Err(Error::Validation(
                    "seva_slug does not match the donation".to_owned(),
                ));
            }
            Some(donation)
        }
        None => None,
    };

    let outcome = state
        .service
        .create_order(seva, donation.as_ref(), &state.setting.razorpay.currency)
        .await?;

    Ok(web::Json(match outcome {
        OrderOutcome::Mock(req) => json!({
            "mock": true,
            "order": {
                "id": null,
                "amount": req.amount,
                "currency": req.currency,
                "receipt": req.receipt,
                "notes": req.notes,
            },
        }),
        OrderOutcome::Live { order, donation_id } => json!({
            "mock": false,
            "order": order,
            "donation_id": donation_id,
        }),
    }))
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct MarkPaidReq {
    #[serde(
        alias = "donationId",
        deserialize_with = "deserialize_option_number_from_string"
    )]
    pub donation_id: Option<i32>,
    #[serde(alias = "razorpay_payment_id", alias = "razorpayPaymentId")]
    pub payment_id: String,
}

/// unverified success from the checkout handler
#[post("/donations/mark-paid")]
pub async fn mark_paid(
    state: web::Data<AppState>,
    data: web::Json<MarkPaidReq>,
) -> Result<impl Responder, Error> {
    let id = data
        .donation_id
        .ok_or_else(|| Error::Validation("donation_id is required".to_owned()))?;
    let payment_id = required(&data.payment_id, "payment_id")?;
    state.service.mark_paid(id, &payment_id).await?;
    Ok(web::Json(json!({"success": true})))
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct VerifyReq {
    #[serde(
        alias = "donationId",
        deserialize_with = "deserialize_option_number_from_string"
    )]
    pub donation_id: Option<i32>,
    #[serde(alias = "razorpay_order_id", alias = "razorpayOrderId")]
    pub order_id: String,
    #[serde(alias = "razorpay_payment_id", alias = "razorpayPaymentId")]
    pub payment_id: String,
    #[serde(alias = "razorpay_signature", alias = "razorpaySignature")]
    pub signature: String,
}

#[post("/payments/verify")]
pub async fn verify_payment(
    state: web::Data<AppState>,
    data: web::Json<VerifyReq>,
) -> Result<impl Responder, Error> {
    let id = data
        .donation_id
        .ok_or_else(|| Error::Validation("donation_id is required".to_owned()))?;
    let order_id = required(&data.order_id, "order_id")?;
    let payment_id = required(&data.payment_id, "payment_id")?;
    let signature = required(&data.signature, "signature")?;
    state
        .service
        .verify_payment(id, &order_id, &payment_id, &signature)
        .await?;
    Ok(web::Json(json!({"success": true})))
}

/// options for the browser checkout widget
#[get("/donations/{id}/checkout")]
pub async fn checkout_options(
    state: web::Data<AppState>,
    id: web::Path<i32>,
) -> Result<impl Responder, Error> {
    let donation = state
        .service
        .get_donation(id.into_inner())
        .await?
        .ok_or(Error::NotFound("donation"))?;
    let options = CheckoutOptions::new(
        &state.setting.razorpay,
        &state.setting.checkout,
        &donation,
    )?;
    Ok(web::Json(json!({ "checkout": options })))
}

/// checkout widget callbacks, success or dismiss
#[post("/donations/{id}/checkout")]
pub async fn checkout_callback(
    state: web::Data<AppState>,
    id: web::Path<i32>,
    data: web::Json<CheckoutEvent>,
) -> Result<HttpResponse, Error> {
    let outcome = CheckoutOutcome::try_from(data.into_inner())?;
    let donation = state
        .service
        .handle_checkout(id.into_inner(), outcome)
        .await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "status": donation.status,
    })))
}
