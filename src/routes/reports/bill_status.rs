use std::sync::Arc;

use askama::Template;
use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
};

use crate::{
    billing::ReportQuery,
    reports::{StatusGroup, load_bill_status},
    session::SessionUser,
    state::AppState,
};

use super::helpers::{
    FilterForm, GroupView, chart_json, group_views, parse_filter, pct, render,
    require_report_access,
};
use super::into_page;

struct ZoneStatusRow {
    zone: String,
    served: usize,
    unserved: usize,
    total: usize,
    served_pct: String,
}

impl From<&StatusGroup> for ZoneStatusRow {
    fn from(group: &StatusGroup) -> Self {
        Self {
            zone: group.key.clone(),
            served: group.served,
            unserved: group.unserved,
            total: group.total,
            served_pct: pct(group.served_pct),
        }
    }
}

#[derive(Template)]
#[template(path = "reports/bill_status.html")]
struct BillStatusTemplate {
    user_name: String,
    filters: FilterForm,
    year: i32,
    total: usize,
    served: usize,
    unserved: usize,
    served_pct: String,
    by_zone: Vec<ZoneStatusRow>,
    by_server: Vec<GroupView>,
    chart_data: String,
}

pub async fn bill_status_page(
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

    let report = load_bill_status(&state, &filter).await;
    let filters = FilterForm::new("/reports/bill-status", &state, &filter)
        .await
        .with_year();
    let served_amount: f64 = report.by_server.iter().map(|g| g.total_amount).sum();

    into_page(render(BillStatusTemplate {
        user_name: session_user.user().full_name.clone(),
        filters,
        year: report.year,
        total: report.total,
        served: report.served,
        unserved: report.unserved,
        served_pct: pct(report.served_pct),
        by_zone: report.by_zone.iter().map(ZoneStatusRow::from).collect(),
        by_server: group_views(&report.by_server, served_amount),
        chart_data: chart_json(&report.by_zone),
    }))
}
