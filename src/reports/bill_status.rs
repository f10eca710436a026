use std::collections::BTreeMap;

use anyhow::Result;
use mongodb::bson::oid::ObjectId;
use serde::Serialize;

use crate::billing::{GroupTotal, ReportFilter, UNASSIGNED, group_totals, percentage};
use crate::models::{BillableAccount, ServedStatus};
use crate::state::{AppState, list_accounts, user_names, zone_names};

use super::scoped_bills;

#[derive(Debug, Clone)]
pub struct BillStatusRow {
    pub served: bool,
    pub zone: Option<String>,
    pub served_by: Option<String>,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusGroup {
    pub key: String,
    pub served: usize,
    pub unserved: usize,
    pub total: usize,
    pub served_pct: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct BillStatusReport {
    pub year: i32,
    pub total: usize,
    pub served: usize,
    pub unserved: usize,
    pub served_pct: f64,
    pub by_zone: Vec<StatusGroup>,
    /// Served bills per staff member; amounts are the billed value delivered.
    pub by_server: Vec<GroupTotal>,
}

impl BillStatusReport {
    pub fn empty(year: i32) -> Self {
        Self::build(year, &[])
    }

    pub fn build(year: i32, rows: &[BillStatusRow]) -> Self {
        let served = rows.iter().filter(|r| r.served).count();

        let mut zones: BTreeMap<String, (usize, usize)> = BTreeMap::new();
        for row in rows {
            let key = row
                .zone
                .as_deref()
                .map(str::trim)
                .filter(|z| !z.is_empty())
                .unwrap_or(UNASSIGNED)
                .to_string();
            let entry = zones.entry(key).or_default();
            if row.served {
                entry.0 += 1;
            } else {
                entry.1 += 1;
            }
        }
        let mut by_zone: Vec<StatusGroup> = zones
            .into_iter()
            .map(|(key, (served, unserved))| StatusGroup {
                key,
                served,
                unserved,
                total: served + unserved,
                served_pct: percentage(served as f64, (served + unserved) as f64),
            })
            .collect();
        by_zone.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.key.cmp(&b.key)));

        let served_rows: Vec<&BillStatusRow> = rows.iter().filter(|r| r.served).collect();
        let by_server = group_totals(&served_rows, |r| r.served_by.clone(), |r| r.amount);

        Self {
            year,
            total: rows.len(),
            served,
            unserved: rows.len() - served,
            served_pct: percentage(served as f64, rows.len() as f64),
            by_zone,
            by_server,
        }
    }
}

pub async fn load_bill_status(state: &AppState, filter: &ReportFilter) -> BillStatusReport {
    let year = filter.year_or_current();
    match load_rows(state, filter, year).await {
        Ok(rows) => BillStatusReport::build(year, &rows),
        Err(err) => {
            tracing::error!(
                error = %err,
                year,
                "bill status report query failed; showing empty report"
            );
            BillStatusReport::empty(year)
        }
    }
}

async fn load_rows(
    state: &AppState,
    filter: &ReportFilter,
    year: i32,
) -> Result<Vec<BillStatusRow>> {
    let bills = scoped_bills(state, filter, year).await?;
    if bills.is_empty() {
        return Ok(Vec::new());
    }
    let accounts: BTreeMap<ObjectId, BillableAccount> = list_accounts(state, filter.account_match())
        .await?
        .into_iter()
        .filter_map(|a| a.id.map(|id| (id, a)))
        .collect();
    let zones = zone_names(state).await?;
    let users = user_names(state).await?;

    Ok(bills
        .into_iter()
        .map(|bill| BillStatusRow {
            served: bill.served_status == ServedStatus::Served,
            zone: accounts
                .get(&bill.reference_id)
                .and_then(|a| a.zone_id)
                .and_then(|z| zones.get(&z).cloned()),
            served_by: bill.served_by.and_then(|u| users.get(&u).cloned()),
            amount: bill.amount_payable,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(served: bool, zone: Option<&str>, by: Option<&str>) -> BillStatusRow {
        BillStatusRow {
            served,
            zone: zone.map(str::to_string),
            served_by: by.map(str::to_string),
            amount: 100.0,
        }
    }

    #[test]
    fn counts_served_and_unserved_per_zone() {
        let rows = vec![
            row(true, Some("North"), Some("Ama")),
            row(false, Some("North"), None),
            row(true, Some("North"), Some("Ama")),
            row(true, None, Some("Kofi")),
        ];
        let report = BillStatusReport::build(2024, &rows);
        assert_eq!((report.total, report.served, report.unserved), (4, 3, 1));
        assert_eq!(report.served_pct, 75.0);

        let north = &report.by_zone[0];
        assert_eq!(north.key, "North");
        assert_eq!((north.served, north.unserved, north.total), (2, 1, 3));
        assert_eq!(north.served_pct, 66.7);
        assert_eq!(report.by_zone[1].key, "Unassigned");

        assert_eq!(report.by_server[0].key, "Ama");
        assert_eq!(report.by_server[0].count, 2);
        assert_eq!(report.by_server[1].key, "Kofi");
    }

    #[test]
    fn unserved_bills_do_not_count_for_servers() {
        let report = BillStatusReport::build(2024, &[row(false, Some("East"), Some("Ama"))]);
        assert!(report.by_server.is_empty());
        assert_eq!(report.served_pct, 0.0);
    }

    #[test]
    fn empty_report_is_zeroed() {
        let report = BillStatusReport::empty(2022);
        assert_eq!(report.year, 2022);
        assert_eq!(report.total, 0);
        assert!(report.by_zone.is_empty());
    }
}
