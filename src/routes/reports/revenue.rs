use std::sync::Arc;

use askama::Template;
use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
};

use crate::{billing::ReportQuery, reports::load_revenue, session::SessionUser, state::AppState};

use super::helpers::{
    FilterForm, chart_json, money, parse_filter, pct, render, require_report_access,
};
use super::into_page;

struct MonthRow {
    label: &'static str,
    collected: String,
    payments: usize,
}

struct TypeRow {
    label: &'static str,
    bills: usize,
    billed: String,
    collected: String,
    rate: String,
}

#[derive(Template)]
#[template(path = "reports/revenue.html")]
struct RevenueTemplate {
    user_name: String,
    filters: FilterForm,
    year: i32,
    bill_count: usize,
    billed_total: String,
    collected_total: String,
    outstanding: String,
    collection_rate: String,
    months: Vec<MonthRow>,
    by_type: Vec<TypeRow>,
    chart_data: String,
}

pub async fn revenue_page(
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

    let report = load_revenue(&state, &filter).await;
    let filters = FilterForm::new("/reports/revenue", &state, &filter)
        .await
        .with_year();

    into_page(render(RevenueTemplate {
        user_name: session_user.user().full_name.clone(),
        filters,
        year: report.year,
        bill_count: report.bill_count,
        billed_total: money(report.billed_total),
        collected_total: money(report.collected_total),
        outstanding: money(report.outstanding),
        collection_rate: pct(report.collection_rate),
        months: report
            .months
            .iter()
            .map(|m| MonthRow {
                label: m.label,
                collected: money(m.collected),
                payments: m.payments,
            })
            .collect(),
        by_type: report
            .by_account_type
            .iter()
            .map(|t| TypeRow {
                label: t.account_type.label(),
                bills: t.bills,
                billed: money(t.billed),
                collected: money(t.collected),
                rate: pct(t.collection_rate),
            })
            .collect(),
        chart_data: chart_json(&report.months),
    }))
}
