#[path = "common/mod.rs"]
mod common;

use std::sync::Arc;

use axum::{
    Extension, Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode},
    routing::get,
};
use chrono::{Datelike, Utc};
use mongodb::bson::oid::ObjectId;
use tower::ServiceExt; // for oneshot

use quickbill::{
    billing::ReportFilter,
    models::UserRole,
    reports::{
        DefaulterSort, load_bill_status, load_collections, load_defaulters, load_revenue,
        load_zone_performance,
    },
    routes::revenue_page,
    session::SessionData,
    state::{AppState, StaffUser, connect_state},
};

// Nothing listens on port 1; selection fails fast.
const UNREACHABLE_URI: &str = "mongodb://127.0.0.1:1/?serverSelectionTimeoutMS=200";

async fn unreachable_state() -> AppState {
    let mut config = common::test_config("quickbill_unreachable");
    config.mongodb_uri = UNREACHABLE_URI.to_string();
    connect_state(&config).await.expect("client options parse")
}

fn finance_session() -> SessionData {
    SessionData {
        user: StaffUser {
            id: ObjectId::new(),
            email: "finance@quickbill.local".into(),
            secret: String::new(),
            full_name: "Finance Officer".into(),
            role: UserRole::Finance,
        },
        token: "offline".into(),
    }
}

#[tokio::test]
async fn reports_fall_back_to_empty_when_store_is_down() {
    let state = unreachable_state().await;
    let filter = ReportFilter::default();
    let year = Utc::now().year();

    let defaulters = load_defaulters(&state, &filter, DefaulterSort::default(), Utc::now()).await;
    assert!(defaulters.records.is_empty());
    assert_eq!(defaulters.summary.total_defaulters, 0);
    assert_eq!(defaulters.summary.total_outstanding, 0.0);

    let collections = load_collections(&state, &filter).await;
    assert_eq!(collections.payment_count, 0);
    assert_eq!(collections.total_collected, 0.0);
    assert!(collections.by_method.is_empty());

    let revenue = load_revenue(&state, &filter).await;
    assert_eq!(revenue.year, year);
    assert_eq!(revenue.months.len(), 12);
    assert!(revenue.months.iter().all(|m| m.collected == 0.0));
    assert_eq!((revenue.billed_total, revenue.collection_rate), (0.0, 0.0));

    let bill_status = load_bill_status(&state, &filter).await;
    assert_eq!(bill_status.year, year);
    assert_eq!((bill_status.total, bill_status.served), (0, 0));
    assert_eq!(bill_status.served_pct, 0.0);

    let zones = load_zone_performance(&state, &filter, Utc::now()).await;
    assert_eq!(zones.year, year);
    assert!(zones.rows.is_empty());
    assert_eq!(zones.totals.outstanding, 0.0);
}

#[tokio::test]
async fn report_page_still_renders_when_store_is_down() {
    let state = Arc::new(unreachable_state().await);
    let app = Router::new()
        .route("/reports/revenue", get(revenue_page))
        .layer(Extension(finance_session()))
        .with_state(state);

    let res = app
        .oneshot(
            Request::builder()
                .uri("/reports/revenue")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .expect("request failed");
    assert_eq!(res.status(), StatusCode::OK);
    let body = to_bytes(res.into_body(), 1024 * 1024).await.unwrap();
    assert!(String::from_utf8_lossy(&body).contains("Revenue"));
}
