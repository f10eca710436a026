use std::collections::HashMap;

use anyhow::Result;
use chrono::NaiveDate;
use mongodb::bson::{doc, oid::ObjectId};
use serde::Serialize;

use crate::billing::{GroupTotal, ReportFilter, group_totals, round_cents};
use crate::models::{AccountType, BillableAccount, PaymentMethod};
use crate::state::{AppState, list_accounts, list_bills, list_payments, user_names, zone_names};

/// One successful payment with the labels it is grouped by.
#[derive(Debug, Clone)]
pub struct CollectionRow {
    pub amount: f64,
    pub method: PaymentMethod,
    pub account_type: Option<AccountType>,
    pub zone: Option<String>,
    pub collector: Option<String>,
    pub paid_on: NaiveDate,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CollectionsReport {
    pub total_collected: f64,
    pub payment_count: usize,
    pub average_payment: f64,
    pub by_method: Vec<GroupTotal>,
    pub by_account_type: Vec<GroupTotal>,
    pub by_zone: Vec<GroupTotal>,
    pub by_collector: Vec<GroupTotal>,
    /// Per-day totals, oldest first.
    pub daily: Vec<GroupTotal>,
}

impl CollectionsReport {
    pub fn build(rows: &[CollectionRow]) -> Self {
        let total: f64 = rows.iter().map(|r| r.amount).sum();
        let average = if rows.is_empty() {
            0.0
        } else {
            total / rows.len() as f64
        };

        let mut daily = group_totals(rows, |r| Some(r.paid_on.to_string()), |r| r.amount);
        daily.sort_by(|a, b| a.key.cmp(&b.key));

        Self {
            total_collected: round_cents(total),
            payment_count: rows.len(),
            average_payment: round_cents(average),
            by_method: group_totals(rows, |r| Some(r.method.label().to_string()), |r| r.amount),
            by_account_type: group_totals(
                rows,
                |r| r.account_type.map(|t| t.label().to_string()),
                |r| r.amount,
            ),
            by_zone: group_totals(rows, |r| r.zone.clone(), |r| r.amount),
            by_collector: group_totals(rows, |r| r.collector.clone(), |r| r.amount),
            daily,
        }
    }
}

pub async fn load_collections(state: &AppState, filter: &ReportFilter) -> CollectionsReport {
    match load_rows(state, filter).await {
        Ok(rows) => CollectionsReport::build(&rows),
        Err(err) => {
            tracing::error!(error = %err, "collections report query failed; showing empty report");
            CollectionsReport::default()
        }
    }
}

async fn load_rows(state: &AppState, filter: &ReportFilter) -> Result<Vec<CollectionRow>> {
    let payments = list_payments(state, filter.payment_match()).await?;
    if payments.is_empty() {
        return Ok(Vec::new());
    }

    let mut bill_ids: Vec<ObjectId> = payments.iter().map(|p| p.bill_id).collect();
    bill_ids.sort();
    bill_ids.dedup();
    let bills: HashMap<ObjectId, (ObjectId, AccountType)> =
        list_bills(state, doc! { "_id": { "$in": bill_ids } })
            .await?
            .into_iter()
            .filter_map(|b| b.id.map(|id| (id, (b.reference_id, b.bill_type))))
            .collect();
    let accounts: HashMap<ObjectId, BillableAccount> = list_accounts(state, filter.account_match())
        .await?
        .into_iter()
        .filter_map(|a| a.id.map(|id| (id, a)))
        .collect();
    let zones = zone_names(state).await?;
    let users = user_names(state).await?;
    let restricted = filter.zone_id.is_some() || filter.account_type.is_some();

    let mut rows = Vec::with_capacity(payments.len());
    for payment in payments {
        let account = bills
            .get(&payment.bill_id)
            .and_then(|(account_id, _)| accounts.get(account_id));
        if restricted && account.is_none() {
            continue;
        }
        rows.push(CollectionRow {
            amount: payment.amount_paid,
            method: payment.payment_method,
            account_type: bills.get(&payment.bill_id).map(|(_, kind)| *kind),
            zone: account
                .and_then(|a| a.zone_id)
                .and_then(|z| zones.get(&z).cloned()),
            collector: payment.received_by.and_then(|u| users.get(&u).cloned()),
            paid_on: payment.payment_date.to_chrono().date_naive(),
        });
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(amount: f64, method: PaymentMethod, zone: Option<&str>, day: u32) -> CollectionRow {
        CollectionRow {
            amount,
            method,
            account_type: Some(AccountType::Property),
            zone: zone.map(str::to_string),
            collector: None,
            paid_on: NaiveDate::from_ymd_opt(2024, 5, day).unwrap(),
        }
    }

    #[test]
    fn totals_and_breakdowns() {
        let rows = vec![
            row(100.0, PaymentMethod::Cash, Some("North"), 3),
            row(50.0, PaymentMethod::MobileMoney, None, 1),
            row(25.5, PaymentMethod::Cash, Some("North"), 3),
        ];
        let report = CollectionsReport::build(&rows);
        assert_eq!(report.total_collected, 175.5);
        assert_eq!(report.payment_count, 3);
        assert_eq!(report.average_payment, 58.5);
        assert_eq!(report.by_method[0].key, "Cash");
        assert_eq!(report.by_method[0].count, 2);
        assert_eq!(report.by_zone[1].key, "Unassigned");
        assert_eq!(report.by_collector[0].key, "Unassigned");
        assert_eq!(report.by_collector[0].total_amount, 175.5);
        let days: Vec<&str> = report.daily.iter().map(|d| d.key.as_str()).collect();
        assert_eq!(days, vec!["2024-05-01", "2024-05-03"]);
    }

    #[test]
    fn empty_input_gives_zeroed_report() {
        let report = CollectionsReport::build(&[]);
        assert_eq!(report.total_collected, 0.0);
        assert_eq!(report.average_payment, 0.0);
        assert!(report.by_method.is_empty());
    }
}
