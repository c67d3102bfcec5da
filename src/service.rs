use crate::{catalog::Seva, checkout::CheckoutOutcome, now, now_millis, Error, Result};
use entity::donation::{self, Status};
use razorpay_client::{signature, Gateway, Order, OrderRequest};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DbConn, EntityTrait, NotSet, QueryFilter, Set,
    TransactionTrait,
};
use std::collections::BTreeMap;
use tracing::{error, info, warn};

/// Validated donor contact fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Donor {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub address: Option<String>,
    pub message: Option<String>,
    pub tax_id: Option<String>,
    pub country: String,
}

/// Result of order initiation.
#[derive(Debug, Clone, PartialEq)]
pub enum OrderOutcome {
    /// gateway credentials are missing, nothing was sent
    Mock(OrderRequest),
    Live {
        order: Order,
        donation_id: Option<i32>,
    },
}

/// Donation service
pub struct Service {
    gateway: Option<Box<dyn Gateway + Sync + Send>>,
    secret: Option<String>,
    conn: Option<DbConn>,
}

impl Service {
    pub fn new(
        gateway: Option<Box<dyn Gateway + Sync + Send>>,
        secret: Option<String>,
        conn: Option<DbConn>,
    ) -> Self {
        Self {
            gateway,
            secret,
            conn,
        }
    }

    /// live orders, otherwise orders are mocked
    pub fn has_gateway(&self) -> bool {
        self.gateway.is_some()
    }

    pub fn db(&self) -> Result<&DbConn> {
        self.conn.as_ref().ok_or(Error::NotConfigured("database"))
    }

    pub async fn get_donation(&self, id: i32) -> Result<Option<donation::Model>> {
        Ok(donation::Entity::find_by_id(id).one(self.db()?).await?)
    }

    async fn find_donation(&self, id: i32) -> Result<donation::Model> {
        self.get_donation(id)
            .await?
            .ok_or(Error::NotFound("donation"))
    }

    pub async fn create_donation(&self, seva: &Seva, donor: Donor) -> Result<donation::Model> {
        let time = now() as i64;
        let model = donation::ActiveModel {
            id: NotSet,
            seva_slug: Set(seva.slug.clone()),
            seva_name: Set(seva.name.clone()),
            amount: Set(seva.amount as i64),
            full_name: Set(donor.full_name),
            email: Set(donor.email),
            phone: Set(donor.phone),
            address: Set(donor.address),
            message: Set(donor.message),
            tax_id: Set(donor.tax_id),
            country: Set(Some(donor.country)),
            order_id: Set(None),
            payment_id: Set(None),
            status: Set(Status::Pending),
            verified: Set(false),
            created_at: Set(time),
            updated_at: Set(time),
        };
        let donation = model.insert(self.db()?).await?;
        info!(donation = donation.id, seva = %donation.seva_slug, "donation created");
        Ok(donation)
    }

    /// Create a gateway order for the seva, linked to the donation if given.
    pub async fn create_order(
        &self,
        seva: &Seva,
        donation: Option<&donation::Model>,
        currency: &str,
    ) -> Result<OrderOutcome> {
        let mut notes = BTreeMap::new();
        notes.insert("seva_slug".to_owned(), seva.slug.clone());
        notes.insert(
            "donation_id".to_owned(),
            donation.map(|d| d.id.to_string()).unwrap_or_default(),
        );
        let req = OrderRequest {
            amount: seva.minor_amount(),
            currency: currency.to_owned(),
            receipt: format!("seva_{}_{}", seva.slug, now_millis()),
            notes,
        };

        let gateway = match &self.gateway {
            Some(gateway) => gateway,
            None => {
                warn!(seva = %seva.slug, "payment gateway is not configured, mock order");
                return Ok(OrderOutcome::Mock(req));
            }
        };

        let order = gateway.create_order(&req).await.map_err(|e| {
            error!(error = e.to_string(), seva = %seva.slug, "failed to create gateway order");
            e
        })?;

        let donation_id = donation.map(|d| d.id);
        if let Some(id) = donation_id {
            match self.attach_order(id, &order.id).await {
                Ok(true) => info!(donation = id, order = %order.id, "order attached"),
                Ok(false) => info!(
                    donation = id,
                    order = %order.id,
                    "donation already has an order, keep it"
                ),
                Err(e) => {
                    error!(
                        error = e.to_string(),
                        donation = id,
                        order = %order.id,
                        "gateway order created but not saved"
                    );
                    return Err(e);
                }
            }
        }
        Ok(OrderOutcome::Live { order, donation_id })
    }

    /// Store the order id unless the donation already has one.
    pub async fn attach_order(&self, id: i32, order_id: &str) -> Result<bool> {
        let res = donation::Entity::update_many()
            .set(donation::ActiveModel {
                order_id: Set(Some(order_id.to_owned())),
                updated_at: Set(now() as i64),
                ..Default::default()
            })
            .filter(donation::Column::Id.eq(id))
            .filter(donation::Column::OrderId.is_null())
            .exec(self.db()?)
            .await?;
        Ok(res.rows_affected == 1)
    }

    /// Unverified success reported by the browser.
    /// Never touches a donation settled by a payment signature.
    pub async fn mark_paid(&self, id: i32, payment_id: &str) -> Result<donation::Model> {
        let db = self.db()?;
        let donation = self.find_donation(id).await?;
        if donation.status == Status::Failed {
            return Err(Error::Conflict("The donation payment has failed.".to_owned()));
        }

        let res = donation::Entity::update_many()
            .set(donation::ActiveModel {
                status: Set(Status::Paid),
                payment_id: Set(Some(payment_id.to_owned())),
                updated_at: Set(now() as i64),
                ..Default::default()
            })
            .filter(donation::Column::Id.eq(id))
            .filter(donation::Column::Verified.eq(false))
            .filter(donation::Column::Status.is_in([Status::Pending, Status::Paid]))
            .exec(db)
            .await?;
        if res.rows_affected == 1 {
            info!(donation = id, payment = payment_id, "donation marked paid");
        }

        let donation = self.find_donation(id).await?;
        if donation.status == Status::Failed {
            return Err(Error::Conflict("The donation payment has failed.".to_owned()));
        }
        Ok(donation)
    }

    /// Settle the donation with the checkout payment signature.
    /// A signed order held by another donation, or differing from the stored
    /// one, leaves the donation unchanged.
    pub async fn verify_payment(
        &self,
        id: i32,
        order_id: &str,
        payment_id: &str,
        sig: &str,
    ) -> Result<donation::Model> {
        let secret = self
            .secret
            .as_deref()
            .ok_or(Error::NotConfigured("payment gateway secret"))?;
        let db = self.db()?;
        let donation = self.find_donation(id).await?;

        if !signature::verify(secret, order_id, payment_id, sig) {
            warn!(
                donation = id,
                order = order_id,
                payment = payment_id,
                stored_order = donation.order_id.as_deref().unwrap_or_default(),
                "payment signature mismatch"
            );
            donation::Entity::update_many()
                .set(donation::ActiveModel {
                    status: Set(Status::Failed),
                    updated_at: Set(now() as i64),
                    ..Default::default()
                })
                .filter(donation::Column::Id.eq(id))
                .filter(donation::Column::Status.eq(Status::Pending))
                .exec(db)
                .await?;
            return Err(Error::InvalidSignature);
        }

        // the signed order must be this donation's order
        let owner = donation::Entity::find()
            .filter(donation::Column::OrderId.eq(order_id))
            .one(db)
            .await?;
        let foreign = owner.as_ref().map_or(false, |o| o.id != id);
        let stale = donation
            .order_id
            .as_deref()
            .map_or(false, |o| o != order_id);
        if foreign || stale {
            warn!(
                donation = id,
                order = order_id,
                payment = payment_id,
                stored_order = donation.order_id.as_deref().unwrap_or_default(),
                owner = ?owner.map(|o| o.id),
                "verified payment for a different order"
            );
            return Err(Error::Conflict(
                "The payment belongs to a different order.".to_owned(),
            ));
        }

        let time = now() as i64;
        let txn = db.begin().await?;
        donation::Entity::update_many()
            .set(donation::ActiveModel {
                status: Set(Status::Paid),
                payment_id: Set(Some(payment_id.to_owned())),
                verified: Set(true),
                updated_at: Set(time),
                ..Default::default()
            })
            .filter(donation::Column::Id.eq(id))
            .exec(&txn)
            .await?;
        donation::Entity::update_many()
            .set(donation::ActiveModel {
                order_id: Set(Some(order_id.to_owned())),
                ..Default::default()
            })
            .filter(donation::Column::Id.eq(id))
            .filter(donation::Column::OrderId.is_null())
            .exec(&txn)
            .await?;
        txn.commit().await?;

        info!(donation = id, payment = payment_id, "payment verified");
        self.find_donation(id).await
    }

    /// React to the checkout widget callback.
    pub async fn handle_checkout(
        &self,
        id: i32,
        outcome: CheckoutOutcome,
    ) -> Result<donation::Model> {
        match outcome {
            CheckoutOutcome::Verified {
                order_id,
                payment_id,
                signature,
            } => {
                self.verify_payment(id, &order_id, &payment_id, &signature)
                    .await
            }
            CheckoutOutcome::Unverified { payment_id } => self.mark_paid(id, &payment_id).await,
            CheckoutOutcome::Dismissed => {
                // stays pending for a retry
                let donation = self.find_donation(id).await?;
                info!(donation = id, "checkout dismissed");
                Ok(donation)
            }
        }
    }
}
