#[path = "common/mod.rs"]
mod common;

use chrono::{Duration, Utc};
use mongodb::bson::{DateTime, doc};

use quickbill::{
    billing::{DefaulterPolicy, ReportFilter},
    models::{AccountType, PaymentMethod, PaymentStatus, UserRole},
    reports::{DefaulterSort, load_defaulters},
    state::{
        create_account, create_bill, create_session, create_user, create_zone, delete_session,
        find_user, find_user_by_session, init_state, list_accounts, list_bills, list_payments,
        list_users, list_zones, mark_bill_served, record_payment, successful_total_for_account,
    },
    totp::generate_base32_secret,
};

#[tokio::test]
async fn seed_populates_ledger_collections() {
    let Some(ctx) = common::setup_state().await else {
        return;
    };
    let state = ctx.state.clone();

    let users = list_users(&state).await.unwrap();
    let zones = list_zones(&state).await.unwrap();
    let accounts = list_accounts(&state, doc! {}).await.unwrap();
    let bills = list_bills(&state, doc! {}).await.unwrap();
    let payments = list_payments(&state, doc! {}).await.unwrap();

    assert_eq!(users.len(), 3, "users seeded");
    let role_of = |email: &str| users.iter().find(|u| u.email == email).map(|u| u.role);
    assert_eq!(role_of("admin@quickbill.local"), Some(UserRole::Admin));
    assert_eq!(role_of("finance@quickbill.local"), Some(UserRole::Finance));
    assert_eq!(role_of("collector@quickbill.local"), Some(UserRole::Collector));
    assert_eq!(zones.len(), 3, "zones seeded");
    assert_eq!(accounts.len(), 8, "accounts seeded");
    assert_eq!(bills.len(), 9, "bills seeded");
    assert_eq!(payments.len(), 5, "payments seeded");
    assert!(
        accounts.iter().any(|a| a.zone_id.is_none()),
        "one account is left without a zone"
    );

    // A second start against the same database must not seed again.
    let again = init_state(&common::test_config(&ctx.db_name)).await.unwrap();
    assert_eq!(list_accounts(&again, doc! {}).await.unwrap().len(), 8);

    common::teardown(ctx).await;
}

#[tokio::test]
async fn ledger_writes_feed_the_defaulter_report() {
    let Some(ctx) = common::setup_state().await else {
        return;
    };
    let state = ctx.state.clone();
    let now = Utc::now();

    let zone = create_zone(&state, "Riverside", Some("RVS".into())).await.unwrap();
    let account = create_account(
        &state,
        AccountType::Business,
        "BUS-900",
        "Riverside Bakery",
        Some(zone),
        600.0,
    )
    .await
    .unwrap();
    assert!(
        create_account(&state, AccountType::Business, "BUS-901", "Bad", None, -1.0)
            .await
            .is_err()
    );

    let bill = create_bill(
        &state,
        &account,
        "BB-900",
        2020,
        600.0,
        DateTime::from_chrono(now),
    )
    .await
    .unwrap();
    let first_served = DateTime::from_chrono(now - Duration::days(120));
    mark_bill_served(&state, &bill, first_served, None).await.unwrap();
    // Serving twice keeps the first date.
    mark_bill_served(&state, &bill, DateTime::from_chrono(now), None)
        .await
        .unwrap();

    record_payment(
        &state,
        &bill,
        100.0,
        PaymentMethod::Cash,
        PaymentStatus::Successful,
        DateTime::from_chrono(now),
        None,
    )
    .await
    .unwrap();
    record_payment(
        &state,
        &bill,
        50.0,
        PaymentMethod::Card,
        PaymentStatus::Cancelled,
        DateTime::from_chrono(now),
        None,
    )
    .await
    .unwrap();
    assert!(
        record_payment(
            &state,
            &bill,
            0.0,
            PaymentMethod::Cash,
            PaymentStatus::Successful,
            DateTime::from_chrono(now),
            None,
        )
        .await
        .is_err()
    );

    let paid = successful_total_for_account(&state, AccountType::Business, &account)
        .await
        .unwrap();
    assert_eq!(paid, 100.0);

    let report = load_defaulters(
        &state,
        &ReportFilter::default().with_zone(zone),
        DefaulterSort::default(),
        now,
    )
    .await;
    assert_eq!(report.records.len(), 1);
    let record = &report.records[0];
    assert_eq!(record.name, "Riverside Bakery");
    assert_eq!(record.remaining_balance, 500.0);
    assert_eq!(record.days_since_served, 120);
    assert_eq!(record.zone.as_deref(), Some("Riverside"));
    assert!(DefaulterPolicy::default().is_past_grace(record.days_since_served));

    common::teardown(ctx).await;
}

#[tokio::test]
async fn sessions_round_trip() {
    let Some(ctx) = common::setup_state().await else {
        return;
    };
    let state = ctx.state.clone();

    create_user(
        &state,
        "auditor@quickbill.local",
        &generate_base32_secret(),
        "Abena Owusu",
        UserRole::Finance,
    )
    .await
    .unwrap();
    let user = find_user(&state, "auditor@quickbill.local")
        .await
        .unwrap()
        .expect("user created");
    assert_eq!(user.role, UserRole::Finance);

    let token = create_session(&state, &user.email).await.unwrap();
    let resolved = find_user_by_session(&state, &token).await.unwrap();
    assert_eq!(resolved.map(|u| u.email), Some(user.email.clone()));

    delete_session(&state, &token).await.unwrap();
    assert!(find_user_by_session(&state, &token).await.unwrap().is_none());

    common::teardown(ctx).await;
}
