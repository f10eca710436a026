use std::collections::HashMap;

use anyhow::Result;
use chrono::Datelike;
use mongodb::bson::oid::ObjectId;
use serde::Serialize;

use crate::billing::{ReportFilter, percentage, round_cents, successful_total};
use crate::models::{AccountType, Bill, Payment};
use crate::state::AppState;

use super::{payments_for_bills, scoped_bills};

const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

#[derive(Debug, Clone, Serialize)]
pub struct MonthTotal {
    pub month: u32,
    pub label: &'static str,
    pub collected: f64,
    pub payments: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct TypeRevenue {
    pub account_type: AccountType,
    pub bills: usize,
    pub billed: f64,
    pub collected: f64,
    pub collection_rate: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RevenueReport {
    pub year: i32,
    pub bill_count: usize,
    pub billed_total: f64,
    pub collected_total: f64,
    pub outstanding: f64,
    pub collection_rate: f64,
    pub months: Vec<MonthTotal>,
    pub by_account_type: Vec<TypeRevenue>,
}

impl RevenueReport {
    pub fn empty(year: i32) -> Self {
        Self::build(year, &[], &[])
    }

    /// Billed vs collected for one billing year. Only successful payments on
    /// `bills` are counted; months follow the payment date within `year`.
    pub fn build(year: i32, bills: &[Bill], payments: &[Payment]) -> Self {
        let bill_types: HashMap<ObjectId, AccountType> = bills
            .iter()
            .filter_map(|b| b.id.map(|id| (id, b.bill_type)))
            .collect();
        let counted: Vec<(&Payment, AccountType)> = payments
            .iter()
            .filter(|p| p.payment_status.counts_toward_balance())
            .filter_map(|p| bill_types.get(&p.bill_id).map(|kind| (p, *kind)))
            .collect();

        let mut months: Vec<MonthTotal> = MONTHS
            .into_iter()
            .enumerate()
            .map(|(i, label)| MonthTotal {
                month: i as u32 + 1,
                label,
                collected: 0.0,
                payments: 0,
            })
            .collect();
        // Months cover payments dated in `year`; late payments still count in the totals.
        for (payment, _) in &counted {
            let paid_at = payment.payment_date.to_chrono();
            if paid_at.year() != year {
                continue;
            }
            if let Some(bucket) = months.get_mut(paid_at.month0() as usize) {
                bucket.collected += payment.amount_paid;
                bucket.payments += 1;
            }
        }
        for bucket in &mut months {
            bucket.collected = round_cents(bucket.collected);
        }

        let by_account_type = [AccountType::Business, AccountType::Property]
            .into_iter()
            .map(|kind| {
                let of_kind: Vec<&Bill> = bills.iter().filter(|b| b.bill_type == kind).collect();
                let billed: f64 = of_kind.iter().map(|b| b.amount_payable).sum();
                let collected =
                    successful_total(counted.iter().filter(|(_, k)| *k == kind).map(|(p, _)| *p));
                TypeRevenue {
                    account_type: kind,
                    bills: of_kind.len(),
                    billed: round_cents(billed),
                    collected: round_cents(collected),
                    collection_rate: percentage(collected, billed),
                }
            })
            .collect();

        let billed_total: f64 = bills.iter().map(|b| b.amount_payable).sum();
        let collected_total = successful_total(counted.iter().map(|(p, _)| *p));

        Self {
            year,
            bill_count: bills.len(),
            billed_total: round_cents(billed_total),
            collected_total: round_cents(collected_total),
            outstanding: round_cents((billed_total - collected_total).max(0.0)),
            collection_rate: percentage(collected_total, billed_total),
            months,
            by_account_type,
        }
    }
}

pub async fn load_revenue(state: &AppState, filter: &ReportFilter) -> RevenueReport {
    let year = filter.year_or_current();
    match load_rows(state, filter, year).await {
        Ok((bills, payments)) => RevenueReport::build(year, &bills, &payments),
        Err(err) => {
            tracing::error!(
                error = %err,
                year,
                "revenue report query failed; showing empty report"
            );
            RevenueReport::empty(year)
        }
    }
}

async fn load_rows(
    state: &AppState,
    filter: &ReportFilter,
    year: i32,
) -> Result<(Vec<Bill>, Vec<Payment>)> {
    let bills = scoped_bills(state, filter, year).await?;
    let payments = payments_for_bills(state, &bills).await?;
    Ok((bills, payments))
}
