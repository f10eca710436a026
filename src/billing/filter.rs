use std::str::FromStr;

use chrono::{Datelike, Duration, NaiveDate, NaiveTime, Utc};
use mongodb::bson::{DateTime, Document, doc, oid::ObjectId};
use serde::Deserialize;
use thiserror::Error;

use crate::models::{AccountType, PaymentStatus, ServedStatus};

#[derive(Debug, Error, PartialEq)]
pub enum FilterError {
    #[error("invalid date for {field}: {value} (expected YYYY-MM-DD)")]
    Date { field: &'static str, value: String },
    #[error("invalid zone id: {0}")]
    Zone(String),
    #[error("invalid account type: {0}")]
    AccountType(String),
    #[error("invalid amount: {0}")]
    Amount(String),
    #[error("invalid year: {0}")]
    Year(String),
    #[error("the start date {from} is after the end date {to}")]
    Period { from: NaiveDate, to: NaiveDate },
}

/// Raw query-string parameters shared by the report pages.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReportQuery {
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub to: Option<String>,
    #[serde(default)]
    pub zone: Option<String>,
    #[serde(default, rename = "type")]
    pub account_type: Option<String>,
    #[serde(default)]
    pub year: Option<String>,
    #[serde(default)]
    pub min_amount: Option<String>,
    #[serde(default)]
    pub sort: Option<String>,
}

/// Composable report predicate. Every unset field means "no restriction".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportFilter {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub zone_id: Option<ObjectId>,
    pub account_type: Option<AccountType>,
    pub billing_year: Option<i32>,
    pub min_amount: Option<f64>,
}

fn clean(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn parse_date(
    value: &Option<String>,
    field: &'static str,
) -> Result<Option<NaiveDate>, FilterError> {
    clean(value)
        .map(|v| {
            NaiveDate::parse_from_str(v, "%Y-%m-%d").map_err(|_| FilterError::Date {
                field,
                value: v.to_string(),
            })
        })
        .transpose()
}

fn midnight(date: NaiveDate) -> DateTime {
    DateTime::from_chrono(date.and_time(NaiveTime::MIN).and_utc())
}

impl ReportFilter {
    pub fn from_query(query: &ReportQuery) -> Result<Self, FilterError> {
        let from = parse_date(&query.from, "from")?;
        let to = parse_date(&query.to, "to")?;
        if let (Some(from), Some(to)) = (from, to) {
            if from > to {
                return Err(FilterError::Period { from, to });
            }
        }

        let zone_id = clean(&query.zone)
            .map(|v| ObjectId::from_str(v).map_err(|_| FilterError::Zone(v.to_string())))
            .transpose()?;
        let account_type = clean(&query.account_type)
            .map(|v| AccountType::parse(v).ok_or_else(|| FilterError::AccountType(v.to_string())))
            .transpose()?;
        let billing_year = clean(&query.year)
            .map(|v| {
                v.parse::<i32>()
                    .ok()
                    .filter(|y| (1900..=9999).contains(y))
                    .ok_or_else(|| FilterError::Year(v.to_string()))
            })
            .transpose()?;
        let min_amount = clean(&query.min_amount)
            .map(|v| {
                v.parse::<f64>()
                    .ok()
                    .filter(|a| a.is_finite() && *a >= 0.0)
                    .ok_or_else(|| FilterError::Amount(v.to_string()))
            })
            .transpose()?;

        Ok(Self {
            from,
            to,
            zone_id,
            account_type,
            billing_year,
            min_amount,
        })
    }

    pub fn with_period(mut self, from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        self.from = from;
        self.to = to;
        self
    }

    pub fn with_zone(mut self, zone_id: ObjectId) -> Self {
        self.zone_id = Some(zone_id);
        self
    }

    pub fn with_account_type(mut self, account_type: AccountType) -> Self {
        self.account_type = Some(account_type);
        self
    }

    pub fn with_billing_year(mut self, year: i32) -> Self {
        self.billing_year = Some(year);
        self
    }

    pub fn with_min_amount(mut self, amount: f64) -> Self {
        self.min_amount = Some(amount);
        self
    }

    /// Billing year to report on, falling back to the current calendar year.
    pub fn year_or_current(&self) -> i32 {
        self.billing_year.unwrap_or_else(|| Utc::now().year())
    }

    pub fn account_match(&self) -> Document {
        let mut filter = doc! {};
        if let Some(zone_id) = self.zone_id {
            filter.insert("zone_id", zone_id);
        }
        if let Some(kind) = self.account_type {
            filter.insert("account_type", kind.as_str());
        }
        filter
    }

    pub fn bill_match(&self) -> Document {
        let mut filter = doc! {};
        if let Some(kind) = self.account_type {
            filter.insert("bill_type", kind.as_str());
        }
        if let Some(year) = self.billing_year {
            filter.insert("billing_year", year);
        }
        filter
    }

    /// Served bills whose serving instant is strictly before `cutoff`.
    pub fn served_bill_match(&self, cutoff: chrono::DateTime<Utc>) -> Document {
        let mut filter = self.bill_match();
        filter.insert("served_status", ServedStatus::Served.as_str());
        filter.insert(
            "served_at",
            doc! { "$ne": null, "$lt": DateTime::from_chrono(cutoff) },
        );
        filter
    }

    /// Successful payments inside the period. `to` is inclusive.
    pub fn payment_match(&self) -> Document {
        let mut filter = doc! { "payment_status": PaymentStatus::Successful.as_str() };
        let mut range = doc! {};
        if let Some(from) = self.from {
            range.insert("$gte", midnight(from));
        }
        if let Some(to) = self.to {
            range.insert("$lt", midnight(to + Duration::days(1)));
        }
        if !range.is_empty() {
            filter.insert("payment_date", range);
        }
        filter
    }

    pub fn accepts_amount(&self, amount: f64) -> bool {
        self.min_amount.is_none_or(|min| amount >= min)
    }

    /// Query-string form of this filter, for links that keep the current selection.
    pub fn to_query_string(&self) -> String {
        let mut parts = Vec::new();
        if let Some(from) = self.from {
            parts.push(format!("from={from}"));
        }
        if let Some(to) = self.to {
            parts.push(format!("to={to}"));
        }
        if let Some(zone) = &self.zone_id {
            parts.push(format!("zone={}", zone.to_hex()));
        }
        if let Some(kind) = self.account_type {
            parts.push(format!("type={}", kind.as_str()));
        }
        if let Some(year) = self.billing_year {
            parts.push(format!("year={year}"));
        }
        if let Some(amount) = self.min_amount {
            parts.push(format!("min_amount={amount}"));
        }
        parts.join("&")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(pairs: &[(&str, &str)]) -> ReportQuery {
        let mut q = ReportQuery::default();
        for (key, value) in pairs {
            let value = Some(value.to_string());
            match *key {
                "from" => q.from = value,
                "to" => q.to = value,
                "zone" => q.zone = value,
                "type" => q.account_type = value,
                "year" => q.year = value,
                "min_amount" => q.min_amount = value,
                _ => {}
            }
        }
        q
    }

    #[test]
    fn blank_parameters_mean_no_filter() {
        let filter = ReportFilter::from_query(&query(&[("from", " "), ("zone", ""), ("type", "")]))
            .unwrap();
        assert_eq!(filter, ReportFilter::default());
        assert!(filter.account_match().is_empty());
        assert!(filter.bill_match().is_empty());
    }

    #[test]
    fn parses_all_fields() {
        let zone = ObjectId::new();
        let zone_hex = zone.to_hex();
        let filter = ReportFilter::from_query(&query(&[
            ("from", "2024-01-01"),
            ("to", "2024-01-31"),
            ("zone", zone_hex.as_str()),
            ("type", "Business"),
            ("year", "2024"),
            ("min_amount", "150.5"),
        ]))
        .unwrap();
        assert_eq!(filter.zone_id, Some(zone));
        assert_eq!(filter.account_type, Some(AccountType::Business));
        assert_eq!(filter.billing_year, Some(2024));
        assert_eq!(filter.min_amount, Some(150.5));
        assert_eq!(filter.account_match().get_str("account_type").unwrap(), "business");
        assert_eq!(filter.bill_match().get_i32("billing_year").unwrap(), 2024);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            ReportFilter::from_query(&query(&[("from", "01/02/2024")])),
            Err(FilterError::Date { field: "from", .. })
        ));
        assert!(matches!(
            ReportFilter::from_query(&query(&[("zone", "north")])),
            Err(FilterError::Zone(_))
        ));
        assert!(matches!(
            ReportFilter::from_query(&query(&[("min_amount", "-5")])),
            Err(FilterError::Amount(_))
        ));
        assert!(matches!(
            ReportFilter::from_query(&query(&[("from", "2024-02-01"), ("to", "2024-01-01")])),
            Err(FilterError::Period { .. })
        ));
    }

    #[test]
    fn payment_period_end_is_inclusive() {
        let filter = ReportFilter::default().with_period(
            NaiveDate::from_ymd_opt(2024, 3, 1),
            NaiveDate::from_ymd_opt(2024, 3, 31),
        );
        let matcher = filter.payment_match();
        assert_eq!(matcher.get_str("payment_status").unwrap(), "successful");
        let range = matcher.get_document("payment_date").unwrap();
        let end = range.get_datetime("$lt").unwrap().to_chrono();
        assert_eq!(end.date_naive(), NaiveDate::from_ymd_opt(2024, 4, 1).unwrap());
    }

    #[test]
    fn min_amount_predicate() {
        let filter = ReportFilter::default().with_min_amount(100.0);
        assert!(filter.accepts_amount(100.0));
        assert!(!filter.accepts_amount(99.99));
        assert!(ReportFilter::default().accepts_amount(0.01));
    }

    #[test]
    fn query_string_round_trips_selection() {
        let filter = ReportFilter::default()
            .with_billing_year(2023)
            .with_account_type(AccountType::Property);
        assert_eq!(filter.to_query_string(), "type=property&year=2023");
    }
}
