use std::collections::HashMap;

use anyhow::Result;
use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::Serialize;

use crate::billing::{DefaulterRecord, ReportFilter, UNASSIGNED, percentage, round_cents};
use crate::models::{Bill, BillableAccount, Payment, Zone};
use crate::state::{AppState, list_accounts, list_zones};

use super::{DefaulterSort, load_defaulters, payments_for_bills, scoped_bills};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ZoneRow {
    pub zone: String,
    pub accounts: usize,
    pub bills: usize,
    pub billed: f64,
    pub collected: f64,
    pub outstanding: f64,
    pub collection_rate: f64,
    pub defaulters: usize,
    pub defaulter_outstanding: f64,
}

/// Ledger rows for one billing year, already narrowed by the report filter.
#[derive(Debug, Clone, Default)]
pub struct ZoneLedger {
    pub zones: Vec<Zone>,
    pub accounts: Vec<BillableAccount>,
    pub bills: Vec<Bill>,
    pub payments: Vec<Payment>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ZonePerformanceReport {
    pub year: i32,
    pub rows: Vec<ZoneRow>,
    pub totals: ZoneRow,
}

impl ZonePerformanceReport {
    pub fn empty(year: i32) -> Self {
        Self::build(year, &ZoneLedger::default(), &[])
    }

    pub fn build(year: i32, ledger: &ZoneLedger, defaulters: &[DefaulterRecord]) -> Self {
        let zone_of: HashMap<ObjectId, &str> = ledger
            .zones
            .iter()
            .filter_map(|z| z.id.map(|id| (id, z.name.as_str())))
            .collect();
        let mut rows: HashMap<String, ZoneRow> = ledger
            .zones
            .iter()
            .map(|z| (z.name.clone(), zone_row(&z.name)))
            .collect();

        let mut account_zone: HashMap<ObjectId, String> = HashMap::new();
        for account in &ledger.accounts {
            let zone = account
                .zone_id
                .and_then(|z| zone_of.get(&z).copied())
                .unwrap_or(UNASSIGNED)
                .to_string();
            if let Some(id) = account.id {
                account_zone.insert(id, zone.clone());
            }
            rows.entry(zone.clone()).or_insert_with(|| zone_row(&zone)).accounts += 1;
        }

        let mut bill_zone: HashMap<ObjectId, String> = HashMap::new();
        for bill in &ledger.bills {
            let zone = account_zone
                .get(&bill.reference_id)
                .cloned()
                .unwrap_or_else(|| UNASSIGNED.to_string());
            if let Some(id) = bill.id {
                bill_zone.insert(id, zone.clone());
            }
            let row = rows.entry(zone.clone()).or_insert_with(|| zone_row(&zone));
            row.bills += 1;
            row.billed += bill.amount_payable;
        }

        for payment in &ledger.payments {
            if !payment.payment_status.counts_toward_balance() {
                continue;
            }
            if let Some(row) = bill_zone.get(&payment.bill_id).and_then(|z| rows.get_mut(z)) {
                row.collected += payment.amount_paid;
            }
        }

        for record in defaulters {
            let zone = record.zone.clone().unwrap_or_else(|| UNASSIGNED.to_string());
            let row = rows.entry(zone.clone()).or_insert_with(|| zone_row(&zone));
            row.defaulters += 1;
            row.defaulter_outstanding += record.remaining_balance;
        }

        let mut rows: Vec<ZoneRow> = rows.into_values().map(finish).collect();
        rows.sort_by(|a, b| {
            b.collected
                .total_cmp(&a.collected)
                .then_with(|| a.zone.cmp(&b.zone))
        });

        let mut totals = rows.iter().fold(zone_row("Total"), |mut acc, row| {
            acc.accounts += row.accounts;
            acc.bills += row.bills;
            acc.billed += row.billed;
            acc.collected += row.collected;
            acc.outstanding += row.outstanding;
            acc.defaulters += row.defaulters;
            acc.defaulter_outstanding += row.defaulter_outstanding;
            acc
        });
        // Outstanding is the sum of clamped rows; an overpaid zone never offsets another.
        totals.billed = round_cents(totals.billed);
        totals.collected = round_cents(totals.collected);
        totals.outstanding = round_cents(totals.outstanding);
        totals.collection_rate = percentage(totals.collected, totals.billed);
        totals.defaulter_outstanding = round_cents(totals.defaulter_outstanding);

        Self { year, rows, totals }
    }
}

fn zone_row(name: &str) -> ZoneRow {
    ZoneRow {
        zone: name.to_string(),
        ..ZoneRow::default()
    }
}

fn finish(mut row: ZoneRow) -> ZoneRow {
    row.billed = round_cents(row.billed);
    row.collected = round_cents(row.collected);
    row.outstanding = round_cents((row.billed - row.collected).max(0.0));
    row.collection_rate = percentage(row.collected, row.billed);
    row.defaulter_outstanding = round_cents(row.defaulter_outstanding);
    row
}

pub async fn load_zone_performance(
    state: &AppState,
    filter: &ReportFilter,
    now: DateTime<Utc>,
) -> ZonePerformanceReport {
    let year = filter.year_or_current();
    // Ledger and defaulter columns share one billing-year scope.
    let scoped = filter.clone().with_billing_year(year);
    let ledger = match load_ledger(state, &scoped, year).await {
        Ok(ledger) => ledger,
        Err(err) => {
            tracing::error!(
                error = %err,
                year,
                "zone performance query failed; showing empty report"
            );
            return ZonePerformanceReport::empty(year);
        }
    };
    let defaulters = load_defaulters(state, &scoped, DefaulterSort::default(), now).await;
    ZonePerformanceReport::build(year, &ledger, &defaulters.records)
}

async fn load_ledger(state: &AppState, filter: &ReportFilter, year: i32) -> Result<ZoneLedger> {
    let mut zones = list_zones(state).await?;
    if let Some(zone_id) = filter.zone_id {
        zones.retain(|z| z.id == Some(zone_id));
    }
    let accounts = list_accounts(state, filter.account_match()).await?;
    let bills = scoped_bills(state, filter, year).await?;
    let payments = payments_for_bills(state, &bills).await?;
    Ok(ZoneLedger {
        zones,
        accounts,
        bills,
        payments,
    })
}
