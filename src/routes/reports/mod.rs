// routes/reports/mod.rs
// Report pages (HTML) and the defaulter JSON endpoint.

use std::sync::Arc;

use askama::Template;
use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse},
};

use crate::{session::SessionUser, state::AppState};

mod bill_status;
mod collections;
mod defaulters;
mod helpers;
mod revenue;
mod zone_performance;

pub use bill_status::bill_status_page;
pub use collections::collections_page;
pub use defaulters::{defaulters_api, defaulters_page};
pub use revenue::revenue_page;
pub use zone_performance::zone_performance_page;

use helpers::{render, require_report_access};

struct ReportLink {
    href: &'static str,
    title: &'static str,
    blurb: &'static str,
}

const REPORT_LINKS: [ReportLink; 5] = [
    ReportLink {
        href: "/reports/defaulters",
        title: "Defaulters",
        blurb: "Served bills still unpaid after the grace period, by urgency.",
    },
    ReportLink {
        href: "/reports/collections",
        title: "Collections",
        blurb: "Successful payments by method, zone, account type and collector.",
    },
    ReportLink {
        href: "/reports/revenue",
        title: "Revenue",
        blurb: "Billed against collected for a billing year, month by month.",
    },
    ReportLink {
        href: "/reports/bill-status",
        title: "Bill status",
        blurb: "Served and unserved bills per zone and staff member.",
    },
    ReportLink {
        href: "/reports/zone-performance",
        title: "Zone performance",
        blurb: "Billing, collection rate and defaulters per zone.",
    },
];

#[derive(Template)]
#[template(path = "reports/index.html")]
struct ReportsIndexTemplate {
    user_name: String,
    links: &'static [ReportLink],
    grace_days: i64,
    high_days: i64,
    critical_days: i64,
}

pub async fn reports_index(
    session_user: SessionUser,
    State(state): State<Arc<AppState>>,
) -> Result<Html<String>, StatusCode> {
    require_report_access(&session_user)?;
    render(ReportsIndexTemplate {
        user_name: session_user.user().full_name.clone(),
        links: &REPORT_LINKS,
        grace_days: state.policy.grace_period_days,
        high_days: state.policy.high_after_days,
        critical_days: state.policy.critical_after_days,
    })
}

fn into_page(result: Result<Html<String>, StatusCode>) -> axum::response::Response {
    result
        .map(IntoResponse::into_response)
        .unwrap_or_else(|status| status.into_response())
}
