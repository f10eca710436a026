use std::sync::Arc;

use askama::Template;
use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::Utc;

use crate::{
    billing::{DefaulterRecord, ReportFilter, ReportQuery, UrgencyLevel},
    reports::{DefaulterSort, load_defaulters},
    session::SessionUser,
    state::AppState,
};

use super::helpers::{
    FilterForm, GroupView, SelectOption, chart_json, group_views, money, parse_filter, render,
    require_report_access,
};
use super::into_page;

struct DefaulterRow {
    account_number: String,
    name: String,
    account_type: &'static str,
    zone: String,
    bill_number: String,
    billing_year: i32,
    amount_payable: String,
    total_paid: String,
    remaining_balance: String,
    days_since_served: i64,
    urgency: &'static str,
    urgency_class: &'static str,
    defaulter_type: &'static str,
    served_by: String,
    served_on: String,
}

impl From<&DefaulterRecord> for DefaulterRow {
    fn from(record: &DefaulterRecord) -> Self {
        Self {
            account_number: record.account_number.clone(),
            name: record.name.clone(),
            account_type: record.account_type.label(),
            zone: record.zone.clone().unwrap_or_else(|| "-".into()),
            bill_number: record.bill_number.clone(),
            billing_year: record.billing_year,
            amount_payable: money(record.amount_payable),
            total_paid: money(record.total_paid),
            remaining_balance: money(record.remaining_balance),
            days_since_served: record.days_since_served,
            urgency: record.urgency_level.label(),
            urgency_class: match record.urgency_level {
                UrgencyLevel::Critical => "critical",
                UrgencyLevel::High => "high",
                UrgencyLevel::Moderate => "moderate",
            },
            defaulter_type: record.defaulter_type.label(),
            served_by: record.served_by.clone().unwrap_or_else(|| "-".into()),
            served_on: record.served_at.format("%Y-%m-%d").to_string(),
        }
    }
}

#[derive(Template)]
#[template(path = "reports/defaulters.html")]
struct DefaultersTemplate {
    user_name: String,
    filters: FilterForm,
    sorts: Vec<SelectOption>,
    rows: Vec<DefaulterRow>,
    total_defaulters: usize,
    total_outstanding: String,
    critical: usize,
    high: usize,
    moderate: usize,
    multi_year: usize,
    current_year: usize,
    by_zone: Vec<GroupView>,
    by_account_type: Vec<GroupView>,
    grace_days: i64,
    chart_data: String,
    api_link: String,
}

pub async fn defaulters_page(
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
    let sort = DefaulterSort::parse(query.sort.as_deref());

    let report = load_defaulters(&state, &filter, sort, Utc::now()).await;
    let summary = &report.summary;
    let filters = FilterForm::new("/reports/defaulters", &state, &filter)
        .await
        .with_min_amount();
    let sorts = DefaulterSort::ALL
        .into_iter()
        .map(|s| SelectOption {
            value: s.as_str().to_string(),
            label: s.label().to_string(),
            selected: s == sort,
        })
        .collect();

    into_page(render(DefaultersTemplate {
        user_name: session_user.user().full_name.clone(),
        filters,
        sorts,
        rows: report.records.iter().map(DefaulterRow::from).collect(),
        total_defaulters: summary.total_defaulters,
        total_outstanding: money(summary.total_outstanding),
        critical: summary.critical,
        high: summary.high,
        moderate: summary.moderate,
        multi_year: summary.multi_year,
        current_year: summary.current_year,
        by_zone: group_views(&summary.by_zone, summary.total_outstanding),
        by_account_type: group_views(&summary.by_account_type, summary.total_outstanding),
        grace_days: state.policy.grace_period_days,
        chart_data: chart_json(&summary.by_urgency),
        api_link: api_link(&filter, sort),
    }))
}

/// JSON endpoint URL carrying the page's filter and sort.
fn api_link(filter: &ReportFilter, sort: DefaulterSort) -> String {
    let filters = filter.to_query_string();
    let sort = format!("sort={}", sort.as_str());
    if filters.is_empty() {
        format!("/api/reports/defaulters?{sort}")
    } else {
        format!("/api/reports/defaulters?{filters}&{sort}")
    }
}

/// Same report as the page, for scripts and exports.
pub async fn defaulters_api(
    session_user: SessionUser,
    State(state): State<Arc<AppState>>,
    Query(query): Query<ReportQuery>,
) -> Response {
    if let Err(status) = require_report_access(&session_user) {
        return (status, Json(serde_json::json!({ "error": "forbidden" }))).into_response();
    }
    let filter = match ReportFilter::from_query(&query) {
        Ok(filter) => filter,
        Err(err) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({ "error": err.to_string() })),
            )
                .into_response();
        }
    };
    let sort = DefaulterSort::parse(query.sort.as_deref());
    let now = Utc::now();
    let report = load_defaulters(&state, &filter, sort, now).await;

    Json(serde_json::json!({
        "generated_at": now,
        "sort": sort.as_str(),
        "policy": {
            "grace_period_days": state.policy.grace_period_days,
            "high_after_days": state.policy.high_after_days,
            "critical_after_days": state.policy.critical_after_days,
        },
        "summary": report.summary,
        "records": report.records,
    }))
    .into_response()
}
