use std::sync::Arc;

use askama::Template;
use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
};

use crate::{
    billing::ReportQuery, reports::load_collections, session::SessionUser, state::AppState,
};

use super::helpers::{
    FilterForm, GroupView, chart_json, group_views, money, parse_filter, render,
    require_report_access,
};
use super::into_page;

#[derive(Template)]
#[template(path = "reports/collections.html")]
struct CollectionsTemplate {
    user_name: String,
    filters: FilterForm,
    total_collected: String,
    payment_count: usize,
    average_payment: String,
    by_method: Vec<GroupView>,
    by_account_type: Vec<GroupView>,
    by_zone: Vec<GroupView>,
    by_collector: Vec<GroupView>,
    chart_data: String,
}

pub async fn collections_page(
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

    let report = load_collections(&state, &filter).await;
    let whole = report.total_collected;
    let filters = FilterForm::new("/reports/collections", &state, &filter)
        .await
        .with_period();

    into_page(render(CollectionsTemplate {
        user_name: session_user.user().full_name.clone(),
        filters,
        total_collected: money(whole),
        payment_count: report.payment_count,
        average_payment: money(report.average_payment),
        by_method: group_views(&report.by_method, whole),
        by_account_type: group_views(&report.by_account_type, whole),
        by_zone: group_views(&report.by_zone, whole),
        by_collector: group_views(&report.by_collector, whole),
        chart_data: chart_json(&report.daily),
    }))
}
