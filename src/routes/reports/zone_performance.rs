use std::sync::Arc;

use askama::Template;
use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
};
use chrono::Utc;

use crate::{
    billing::ReportQuery,
    reports::{ZoneRow, load_zone_performance},
    session::SessionUser,
    state::AppState,
};

use super::helpers::{
    FilterForm, chart_json, money, parse_filter, pct, render, require_report_access,
};
use super::into_page;

struct ZoneView {
    zone: String,
    accounts: usize,
    bills: usize,
    billed: String,
    collected: String,
    outstanding: String,
    collection_rate: String,
    defaulters: usize,
    defaulter_outstanding: String,
}

impl From<&ZoneRow> for ZoneView {
    fn from(row: &ZoneRow) -> Self {
        Self {
            zone: row.zone.clone(),
            accounts: row.accounts,
            bills: row.bills,
            billed: money(row.billed),
            collected: money(row.collected),
            outstanding: money(row.outstanding),
            collection_rate: pct(row.collection_rate),
            defaulters: row.defaulters,
            defaulter_outstanding: money(row.defaulter_outstanding),
        }
    }
}

#[derive(Template)]
#[template(path = "reports/zone_performance.html")]
struct ZonePerformanceTemplate {
    user_name: String,
    filters: FilterForm,
    year: i32,
    rows: Vec<ZoneView>,
    totals: ZoneView,
    chart_data: String,
}

pub async fn zone_performance_page(
    session_user: SessionUser,
    State(state): State<Arc<AppState>>,
    Query(query): Query<ReportQuery>,
) -> Response {
    if let Err(status) = require_report_access(&session_user) {
        return status.into_response();
    }
    let filter = match parse_filter(&query) {
        Ok(filter) => filter,
        Err(response) => return response,
    };

    let report = load_zone_performance(&state, &filter, Utc::now()).await;
    let filters = FilterForm::new("/reports/zone-performance", &state, &filter)
        .await
        .with_year();

    into_page(render(ZonePerformanceTemplate {
        user_name: session_user.user().full_name.clone(),
        filters,
        year: report.year,
        rows: report.rows.iter().map(ZoneView::from).collect(),
        totals: ZoneView::from(&report.totals),
        chart_data: chart_json(&report.rows),
    }))
}
