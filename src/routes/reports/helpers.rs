use askama::Template;
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use serde::Serialize;

use crate::{
    billing::{FilterError, GroupTotal, ReportFilter, ReportQuery, percentage},
    models::AccountType,
    session::SessionUser,
    state::{AppState, list_zones},
};

pub(super) fn render<T: Template>(tpl: T) -> Result<Html<String>, StatusCode> {
    tpl.render().map(Html).map_err(|err| {
        tracing::error!(error = %err, "template render failed");
        StatusCode::INTERNAL_SERVER_ERROR
    })
}

pub(super) fn require_report_access(session_user: &SessionUser) -> Result<(), StatusCode> {
    if !session_user.can_view_reports() {
        tracing::warn!(
            email = %session_user.user().email,
            role = session_user.role().as_str(),
            "report access denied"
        );
        return Err(StatusCode::FORBIDDEN);
    }
    Ok(())
}

pub(super) fn bad_filter(err: FilterError) -> Response {
    (StatusCode::BAD_REQUEST, err.to_string()).into_response()
}

/// Two decimals with thousands separators: `1234.5` -> `1,234.50`.
pub(crate) fn money(amount: f64) -> String {
    let cents = (amount.abs() * 100.0).round() as u64;
    let whole = (cents / 100).to_string();
    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    let sign = if amount < 0.0 && cents > 0 { "-" } else { "" };
    format!("{sign}{grouped}.{:02}", cents % 100)
}

pub(crate) fn pct(value: f64) -> String {
    format!("{value:.1}%")
}

/// JSON for `<script type="application/json">` blocks. `</` is escaped so the
/// payload cannot close the tag.
pub(super) fn chart_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value)
        .unwrap_or_else(|_| "null".to_string())
        .replace("</", "<\\/")
}

#[derive(Clone)]
pub(super) struct SelectOption {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

/// Grouped total with display strings and its share of the whole.
pub(super) struct GroupView {
    pub key: String,
    pub count: usize,
    pub amount: String,
    pub share: String,
}

pub(super) fn group_views(groups: &[GroupTotal], whole: f64) -> Vec<GroupView> {
    groups
        .iter()
        .map(|g| GroupView {
            key: g.key.clone(),
            count: g.count,
            amount: money(g.total_amount),
            share: pct(percentage(g.total_amount, whole)),
        })
        .collect()
}

/// Values for the shared filter bar, echoed back as the user typed them.
pub(super) struct FilterForm {
    pub action: &'static str,
    pub from: String,
    pub to: String,
    pub year: String,
    pub min_amount: String,
    pub zones: Vec<SelectOption>,
    pub types: Vec<SelectOption>,
    pub show_period: bool,
    pub show_year: bool,
    pub show_min_amount: bool,
}

impl FilterForm {
    pub async fn new(action: &'static str, state: &AppState, filter: &ReportFilter) -> Self {
        let zones = match list_zones(state).await {
            Ok(zones) => zones
                .into_iter()
                .filter_map(|z| {
                    z.id.map(|id| SelectOption {
                        value: id.to_hex(),
                        label: z.name,
                        selected: filter.zone_id == Some(id),
                    })
                })
                .collect(),
            Err(err) => {
                tracing::warn!(error = %err, "zone list unavailable for filter bar");
                Vec::new()
            }
        };
        let types = [AccountType::Business, AccountType::Property]
            .into_iter()
            .map(|kind| SelectOption {
                value: kind.as_str().to_string(),
                label: kind.label().to_string(),
                selected: filter.account_type == Some(kind),
            })
            .collect();

        Self {
            action,
            from: filter.from.map(|d| d.to_string()).unwrap_or_default(),
            to: filter.to.map(|d| d.to_string()).unwrap_or_default(),
            year: filter.year_or_current().to_string(),
            min_amount: filter.min_amount.map(|a| a.to_string()).unwrap_or_default(),
            zones,
            types,
            show_period: false,
            show_year: false,
            show_min_amount: false,
        }
    }

    pub fn with_period(mut self) -> Self {
        self.show_period = true;
        self
    }

    pub fn with_year(mut self) -> Self {
        self.show_year = true;
        self
    }

    pub fn with_min_amount(mut self) -> Self {
        self.show_min_amount = true;
        self
    }
}

pub(super) fn parse_filter(query: &ReportQuery) -> Result<ReportFilter, Response> {
    ReportFilter::from_query(query).map_err(|err| {
        tracing::debug!(error = %err, "rejected report filter");
        bad_filter(err)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn money_groups_thousands() {
        assert_eq!(money(0.0), "0.00");
        assert_eq!(money(1234.5), "1,234.50");
        assert_eq!(money(1_000_000.0), "1,000,000.00");
        assert_eq!(money(999.999), "1,000.00");
        assert_eq!(money(-42.1), "-42.10");
    }

    #[test]
    fn chart_json_cannot_close_script_tag() {
        let json = chart_json(&vec!["</script>"]);
        assert!(!json.contains("</"));
    }
}
