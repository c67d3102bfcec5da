use anyhow::Result;
use cowseva::{catalog::Seva, checkout::CheckoutOutcome, Donor, Error, OrderOutcome};
use entity::donation::Status;
use razorpay_client::signature;
use util::{create_state, create_test_state, feed_a_cow_499, FakeGateway, KEY_SECRET};

mod util;

fn donor() -> Donor {
    Donor {
        full_name: "Asha Rao".to_owned(),
        email: "asha@example.com".to_owned(),
        phone: "9876543210".to_owned(),
        country: "India".to_owned(),
        ..Default::default()
    }
}

fn seva(slug: &str, amount: u64) -> Seva {
    serde_json::from_value(serde_json::json!({
        "slug": slug,
        "name": slug,
        "amount": amount,
    }))
    .unwrap()
}

fn flip(s: &str, index: usize) -> String {
    let mut bytes = s.as_bytes().to_vec();
    bytes[index] ^= 1;
    String::from_utf8(bytes).unwrap()
}

#[tokio::test]
async fn create_donation() -> Result<()> {
    let state = create_state(None, false).await?;
    let seva = feed_a_cow_499();
    let donation = state.service.create_donation(&seva, donor()).await?;

    assert_eq!(donation.status, Status::Pending);
    assert_eq!(donation.amount, 499);
    assert_eq!(donation.seva_slug, "feed-a-cow");
    assert_eq!(donation.country.as_deref(), Some("India"));
    assert_eq!(donation.order_id, None);
    assert_eq!(donation.payment_id, None);
    assert!(!donation.verified);
    assert_eq!(donation.created_at, donation.updated_at);

    let second = state.service.create_donation(&seva, donor()).await?;
    assert_ne!(donation.id, second.id);
    Ok(())
}

#[tokio::test]
async fn mock_order_no_network() -> Result<()> {
    let state = create_state(None, false).await?;
    let seva = feed_a_cow_499();
    match state.service.create_order(&seva, None, "INR").await? {
        OrderOutcome::Mock(req) => {
            assert_eq!(req.amount, 49900);
            assert_eq!(req.currency, "INR");
            assert_eq!(req.notes["donation_id"], "");
        }
        outcome => panic!("unexpected order {:?}", outcome),
    }
    Ok(())
}

#[tokio::test]
async fn order_id_first_write_wins() -> Result<()> {
    let (state, gateway) = create_test_state().await?;
    let service = &state.service;
    let seva = feed_a_cow_499();
    let donation = service.create_donation(&seva, donor()).await?;

    for _ in 0..3 {
        let outcome = service.create_order(&seva, Some(&donation), "INR").await?;
        assert!(matches!(outcome, OrderOutcome::Live { .. }));
    }
    assert_eq!(gateway.calls(), 3);
    let donation = service.get_donation(donation.id).await?.unwrap();
    assert_eq!(donation.order_id.as_deref(), Some("order_test1"));
    assert!(!service.attach_order(donation.id, "order_other").await?);
    Ok(())
}

#[tokio::test]
async fn verify_keeps_order_id() -> Result<()> {
    let (state, _) = create_test_state().await?;
    let service = &state.service;
    let seva = feed_a_cow_499();
    let donation = service.create_donation(&seva, donor()).await?;
    service.create_order(&seva, Some(&donation), "INR").await?;

    // signed for an order the donation doesn't hold
    let sig = signature::sign(KEY_SECRET, "order_late", "pay_1");
    let res = service
        .verify_payment(donation.id, "order_late", "pay_1", &sig)
        .await;
    assert!(matches!(res, Err(Error::Conflict(_))));
    let current = service.get_donation(donation.id).await?.unwrap();
    assert_eq!(current.status, Status::Pending);
    assert_eq!(current.order_id.as_deref(), Some("order_test1"));

    let sig = signature::sign(KEY_SECRET, "order_test1", "pay_1");
    let paid = service
        .verify_payment(donation.id, "order_test1", "pay_1", &sig)
        .await?;
    assert_eq!(paid.status, Status::Paid);
    assert!(paid.verified);
    assert_eq!(paid.payment_id.as_deref(), Some("pay_1"));
    assert_eq!(paid.order_id.as_deref(), Some("order_test1"));

    // no order yet, the verified one is stored
    let donation = service.create_donation(&seva, donor()).await?;
    let sig = signature::sign(KEY_SECRET, "order_2", "pay_2");
    let paid = service
        .verify_payment(donation.id, "order_2", "pay_2", &sig)
        .await?;
    assert_eq!(paid.order_id.as_deref(), Some("order_2"));
    Ok(())
}

#[tokio::test]
async fn order_of_another_donation() -> Result<()> {
    let (state, _) = create_test_state().await?;
    let service = &state.service;
    let cheap = seva("feed-a-cow", 1);
    let dear = seva("acid-attack-support", 2501);
    let cheap_donation = service.create_donation(&cheap, donor()).await?;
    let dear_donation = service.create_donation(&dear, donor()).await?;

    let order = match service
        .create_order(&cheap, Some(&cheap_donation), "INR")
        .await?
    {
        OrderOutcome::Live { order, .. } => order,
        outcome => panic!("unexpected order {:?}", outcome),
    };
    assert_eq!(order.amount, 100);

    // a valid signature for the cheap order can't settle the dear donation
    let sig = signature::sign(KEY_SECRET, &order.id, "pay_cheap");
    let res = service
        .verify_payment(dear_donation.id, &order.id, "pay_cheap", &sig)
        .await;
    assert!(matches!(res, Err(Error::Conflict(_))));
    let dear_donation = service.get_donation(dear_donation.id).await?.unwrap();
    assert_eq!(dear_donation.status, Status::Pending);
    assert_eq!(dear_donation.order_id, None);
    assert_eq!(dear_donation.payment_id, None);
    assert!(!dear_donation.verified);

    let paid = service
        .verify_payment(cheap_donation.id, &order.id, "pay_cheap", &sig)
        .await?;
    assert_eq!(paid.status, Status::Paid);
    Ok(())
}

#[tokio::test]
async fn order_saved_failure_surfaced() -> Result<()> {
    let (state, gateway) = create_test_state().await?;
    let service = &state.service;
    let seva = feed_a_cow_499();
    let donation = service.create_donation(&seva, donor()).await?;
    util::read_only_donations(service.db()?).await?;

    let res = service.create_order(&seva, Some(&donation), "INR").await;
    assert!(matches!(res, Err(Error::DbErr(_))));
    assert_eq!(gateway.calls(), 1);
    let donation = service.get_donation(donation.id).await?.unwrap();
    assert_eq!(donation.order_id, None);
    assert_eq!(donation.status, Status::Pending);
    Ok(())
}

#[tokio::test]
async fn verify_idempotent() -> Result<()> {
    let (state, _) = create_test_state().await?;
    let service = &state.service;
    let donation = service.create_donation(&feed_a_cow_499(), donor()).await?;
    let sig = signature::sign(KEY_SECRET, "order_1", "pay_1");

    let first = service
        .verify_payment(donation.id, "order_1", "pay_1", &sig)
        .await?;
    let second = service
        .verify_payment(donation.id, "order_1", "pay_1", &sig)
        .await?;
    assert_eq!(first.status, Status::Paid);
    assert_eq!(second.status, Status::Paid);
    assert_eq!(first.payment_id, second.payment_id);
    assert_eq!(first.order_id, second.order_id);
    Ok(())
}

#[tokio::test]
async fn single_bit_mutations_fail() -> Result<()> {
    let (state, _) = create_test_state().await?;
    let service = &state.service;
    let seva = feed_a_cow_499();
    let order_id = "order_IEIaMR65cu6nz3";
    let payment_id = "pay_IH4NVgf4Dreq1l";
    let sig = signature::sign(KEY_SECRET, order_id, payment_id);
    let sig_bytes = hex_flip(&sig);

    let cases = vec![
        (flip(order_id, 3), payment_id.to_owned(), sig.clone()),
        (order_id.to_owned(), flip(payment_id, 5), sig.clone()),
        (order_id.to_owned(), payment_id.to_owned(), sig_bytes),
    ];
    for (order, payment, s) in cases {
        let donation = service.create_donation(&seva, donor()).await?;
        let res = service
            .verify_payment(donation.id, &order, &payment, &s)
            .await;
        assert!(matches!(res, Err(Error::InvalidSignature)));
        let donation = service.get_donation(donation.id).await?.unwrap();
        assert_eq!(donation.status, Status::Failed);
        assert_eq!(donation.payment_id, None);
    }
    Ok(())
}

/// flip the lowest bit of the first signature byte
fn hex_flip(sig: &str) -> String {
    let first = u8::from_str_radix(&sig[..2], 16).unwrap() ^ 1;
    format!("{:02x}{}", first, &sig[2..])
}

#[tokio::test]
async fn failed_never_returns_to_pending() -> Result<()> {
    let (state, _) = create_test_state().await?;
    let service = &state.service;
    let donation = service.create_donation(&feed_a_cow_499(), donor()).await?;

    let res = service
        .verify_payment(donation.id, "order_1", "pay_1", "00")
        .await;
    assert!(matches!(res, Err(Error::InvalidSignature)));

    // the browser can't mark a failed donation paid
    let res = service.mark_paid(donation.id, "pay_1").await;
    assert!(matches!(res, Err(Error::Conflict(_))));

    let dismissed = service
        .handle_checkout(donation.id, CheckoutOutcome::Dismissed)
        .await?;
    assert_eq!(dismissed.status, Status::Failed);

    // a valid signature is authoritative
    let sig = signature::sign(KEY_SECRET, "order_1", "pay_1");
    let paid = service
        .verify_payment(donation.id, "order_1", "pay_1", &sig)
        .await?;
    assert_eq!(paid.status, Status::Paid);
    Ok(())
}

#[tokio::test]
async fn verified_overrides_mark_paid() -> Result<()> {
    let (state, _) = create_test_state().await?;
    let service = &state.service;
    let donation = service.create_donation(&feed_a_cow_499(), donor()).await?;

    let marked = service.mark_paid(donation.id, "pay_browser").await?;
    assert_eq!(marked.status, Status::Paid);
    assert!(!marked.verified);

    // a bad signature can't flip a paid donation
    let res = service
        .verify_payment(donation.id, "order_1", "pay_1", "00")
        .await;
    assert!(matches!(res, Err(Error::InvalidSignature)));
    let current = service.get_donation(donation.id).await?.unwrap();
    assert_eq!(current.status, Status::Paid);

    let sig = signature::sign(KEY_SECRET, "order_1", "pay_1");
    let verified = service
        .verify_payment(donation.id, "order_1", "pay_1", &sig)
        .await?;
    assert!(verified.verified);
    assert_eq!(verified.payment_id.as_deref(), Some("pay_1"));

    // late browser callback leaves the verified payment alone
    let late = service.mark_paid(donation.id, "pay_browser").await?;
    assert_eq!(late.status, Status::Paid);
    assert_eq!(late.payment_id.as_deref(), Some("pay_1"));
    Ok(())
}

#[tokio::test]
async fn concurrent_callbacks() -> Result<()> {
    let (state, _) = create_test_state().await?;
    let service = &state.service;
    let donation = service.create_donation(&feed_a_cow_499(), donor()).await?;
    let sig = signature::sign(KEY_SECRET, "order_1", "pay_1");

    let (marked, verified, again) = tokio::join!(
        service.mark_paid(donation.id, "pay_1"),
        service.verify_payment(donation.id, "order_1", "pay_1", &sig),
        service.verify_payment(donation.id, "order_1", "pay_1", &sig),
    );
    assert!(marked.is_ok());
    assert!(verified.is_ok());
    assert!(again.is_ok());

    let donation = service.get_donation(donation.id).await?.unwrap();
    assert_eq!(donation.status, Status::Paid);
    assert!(donation.verified);
    assert_eq!(donation.payment_id.as_deref(), Some("pay_1"));
    Ok(())
}

#[tokio::test]
async fn gateway_rejected() -> Result<()> {
    let gateway = FakeGateway {
        reject: Some("Authentication failed".to_owned()),
        ..Default::default()
    };
    let state = create_state(Some(gateway.clone()), true).await?;
    let seva = feed_a_cow_499();
    let donation = state.service.create_donation(&seva, donor()).await?;
    let res = state
        .service
        .create_order(&seva, Some(&donation), "INR")
        .await;
    assert!(matches!(res, Err(Error::Gateway(_))));
    assert_eq!(gateway.calls(), 1);
    let donation = state.service.get_donation(donation.id).await?.unwrap();
    assert_eq!(donation.order_id, None);
    assert_eq!(donation.status, Status::Pending);
    Ok(())
}
