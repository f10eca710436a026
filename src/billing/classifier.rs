use chrono::{DateTime, Datelike, Utc};
use serde::Serialize;

use crate::models::{AccountType, Bill, BillableAccount, ServedStatus};

use super::balance::Balance;
use super::policy::{DefaulterPolicy, UrgencyLevel, days_since};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DefaulterType {
    #[serde(rename = "Multi-Year")]
    MultiYear,
    #[serde(rename = "Current Year")]
    CurrentYear,
}

impl DefaulterType {
    pub fn for_billing_year(billing_year: i32, current_year: i32) -> Self {
        if billing_year < current_year {
            DefaulterType::MultiYear
        } else {
            DefaulterType::CurrentYear
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DefaulterType::MultiYear => "Multi-Year",
            DefaulterType::CurrentYear => "Current Year",
        }
    }
}

/// Everything the classifier needs to judge one bill of one account.
#[derive(Debug, Clone)]
pub struct DefaulterCandidate {
    pub account: BillableAccount,
    pub zone_name: Option<String>,
    pub bill: Bill,
    pub balance: Balance,
    pub served_by_name: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DefaulterRecord {
    pub account_id: String,
    #[serde(rename = "type")]
    pub account_type: AccountType,
    pub account_number: String,
    pub name: String,
    pub zone: Option<String>,
    pub bill_number: String,
    pub billing_year: i32,
    pub amount_payable: f64,
    pub total_paid: f64,
    pub remaining_balance: f64,
    pub days_since_served: i64,
    pub urgency_level: UrgencyLevel,
    pub defaulter_type: DefaulterType,
    pub served_by: Option<String>,
    pub served_at: DateTime<Utc>,
}

/// Returns a record only when the bill is served, past the grace period and still owed.
pub fn classify(
    candidate: DefaulterCandidate,
    now: DateTime<Utc>,
    policy: &DefaulterPolicy,
) -> Option<DefaulterRecord> {
    let DefaulterCandidate {
        account,
        zone_name,
        bill,
        balance,
        served_by_name,
    } = candidate;

    if bill.served_status != ServedStatus::Served {
        return None;
    }
    let served_at = bill.served_at?.to_chrono();
    let days = days_since(served_at, now);
    if !policy.is_past_grace(days) || !balance.is_outstanding() {
        return None;
    }

    Some(DefaulterRecord {
        account_id: account.id.map(|id| id.to_hex()).unwrap_or_default(),
        account_type: account.account_type,
        account_number: account.account_number,
        name: account.name,
        zone: zone_name,
        bill_number: bill.bill_number,
        billing_year: bill.billing_year,
        amount_payable: balance.amount_payable,
        total_paid: balance.total_paid,
        remaining_balance: balance.remaining_balance,
        days_since_served: days,
        urgency_level: policy.urgency(days),
        defaulter_type: DefaulterType::for_billing_year(bill.billing_year, now.year()),
        served_by: served_by_name,
        served_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use mongodb::bson::{self, oid::ObjectId};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 8, 1, 12, 0, 0).single().unwrap()
    }

    fn candidate(
        served: Option<i64>,
        billing_year: i32,
        payable: f64,
        paid: f64,
    ) -> DefaulterCandidate {
        let account_id = ObjectId::new();
        DefaulterCandidate {
            account: BillableAccount {
                id: Some(account_id),
                account_type: AccountType::Property,
                account_number: "PROP-001".into(),
                name: "Kofi Mensah".into(),
                owner_name: None,
                zone_id: None,
                amount_payable: payable,
            },
            zone_name: Some("Central".into()),
            bill: Bill {
                id: Some(ObjectId::new()),
                bill_number: "BL-2024-001".into(),
                bill_type: AccountType::Property,
                reference_id: account_id,
                billing_year,
                amount_payable: payable,
                due_date: bson::DateTime::from_chrono(now()),
                served_status: if served.is_some() {
                    ServedStatus::Served
                } else {
                    ServedStatus::Unserved
                },
                served_at: served
                    .map(|days| bson::DateTime::from_chrono(now() - Duration::days(days))),
                served_by: None,
            },
            balance: Balance::settle(payable, paid),
            served_by_name: Some("Ama Serwaa".into()),
        }
    }

    #[test]
    fn served_past_grace_with_balance_is_defaulter() {
        let policy = DefaulterPolicy::default();
        let record = classify(candidate(Some(100), 2024, 500.0, 0.0), now(), &policy)
            .expect("should classify");
        assert_eq!(record.remaining_balance, 500.0);
        assert_eq!(record.days_since_served, 100);
        assert_eq!(record.urgency_level, UrgencyLevel::Moderate);
        assert_eq!(record.defaulter_type, DefaulterType::CurrentYear);
        assert_eq!(record.served_by.as_deref(), Some("Ama Serwaa"));
    }

    #[test]
    fn served_flag_without_timestamp_is_excluded() {
        let mut c = candidate(Some(120), 2024, 500.0, 0.0);
        c.bill.served_at = None;
        assert!(classify(c, now(), &DefaulterPolicy::default()).is_none());
    }

    #[test]
    fn timestamp_on_unserved_bill_is_excluded() {
        let mut c = candidate(Some(120), 2024, 500.0, 0.0);
        c.bill.served_status = ServedStatus::Unserved;
        assert!(classify(c, now(), &DefaulterPolicy::default()).is_none());
    }

    #[test]
    fn grace_period_comes_from_policy() {
        let policy = DefaulterPolicy {
            grace_period_days: 30,
            high_after_days: 60,
            critical_after_days: 90,
        };
        let record = classify(candidate(Some(61), 2024, 80.0, 0.0), now(), &policy)
            .expect("past a 30 day grace");
        assert_eq!(record.urgency_level, UrgencyLevel::High);
    }

    #[test]
    fn defaulter_type_compares_against_current_year() {
        assert_eq!(DefaulterType::for_billing_year(2023, 2024), DefaulterType::MultiYear);
        assert_eq!(DefaulterType::for_billing_year(2024, 2024), DefaulterType::CurrentYear);
        assert_eq!(DefaulterType::for_billing_year(2025, 2024), DefaulterType::CurrentYear);
    }
}
