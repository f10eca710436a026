// routes/mod.rs
// Route handlers and the application router.

use std::sync::Arc;

use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::session::require_session;
use crate::state::AppState;

pub mod home;
pub mod login;
pub mod logout;
pub mod reports;

pub use home::home;
pub use login::login;
pub use logout::logout;
pub use reports::{
    bill_status_page, collections_page, defaulters_api, defaulters_page, reports_index,
    revenue_page, zone_performance_page,
};

pub fn build_app(state: Arc<AppState>) -> Router {
    let protected = Router::new()
        .route("/logout", post(logout))
        .route("/reports", get(reports_index))
        .route("/reports/defaulters", get(defaulters_page))
        .route("/reports/collections", get(collections_page))
        .route("/reports/revenue", get(revenue_page))
        .route("/reports/bill-status", get(bill_status_page))
        .route("/reports/zone-performance", get(zone_performance_page))
        .route("/api/reports/defaulters", get(defaulters_api))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_session,
        ));

    Router::new()
        .route("/", get(home))
        .route("/login", post(login))
        .merge(protected)
        .with_state(state)
}
