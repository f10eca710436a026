use std::collections::HashMap;
use std::time::Instant;

use anyhow::Result;
use chrono::{DateTime, Utc};
use mongodb::bson::{doc, oid::ObjectId};
use serde::Serialize;

use crate::billing::{
    Balance, DefaulterCandidate, DefaulterPolicy, DefaulterRecord, DefaulterSummary, ReportFilter,
    classify,
};
use crate::models::BillableAccount;
use crate::state::{
    AppState, list_accounts, list_bills, successful_total_for_account, user_names, zone_names,
};

/// Ordering of the defaulter table. The classifier itself never orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DefaulterSort {
    #[default]
    BalanceDesc,
    BalanceAsc,
    Name,
    DaysDesc,
}

impl DefaulterSort {
    pub const ALL: [DefaulterSort; 4] = [
        DefaulterSort::BalanceDesc,
        DefaulterSort::BalanceAsc,
        DefaulterSort::Name,
        DefaulterSort::DaysDesc,
    ];

    /// Unknown values fall back to the default ordering.
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("balance_asc") => DefaulterSort::BalanceAsc,
            Some("name") => DefaulterSort::Name,
            Some("days_desc") => DefaulterSort::DaysDesc,
            _ => DefaulterSort::BalanceDesc,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DefaulterSort::BalanceDesc => "balance_desc",
            DefaulterSort::BalanceAsc => "balance_asc",
            DefaulterSort::Name => "name",
            DefaulterSort::DaysDesc => "days_desc",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DefaulterSort::BalanceDesc => "Highest balance",
            DefaulterSort::BalanceAsc => "Lowest balance",
            DefaulterSort::Name => "Name",
            DefaulterSort::DaysDesc => "Longest overdue",
        }
    }

    pub fn apply(&self, records: &mut [DefaulterRecord]) {
        records.sort_by(|a, b| {
            let primary = match self {
                DefaulterSort::BalanceDesc => b.remaining_balance.total_cmp(&a.remaining_balance),
                DefaulterSort::BalanceAsc => a.remaining_balance.total_cmp(&b.remaining_balance),
                DefaulterSort::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
                DefaulterSort::DaysDesc => b.days_since_served.cmp(&a.days_since_served),
            };
            primary.then_with(|| a.account_number.cmp(&b.account_number))
        });
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DefaulterReport {
    pub records: Vec<DefaulterRecord>,
    pub summary: DefaulterSummary,
}

impl DefaulterReport {
    /// Classifies every candidate, keeps one record per account (the bill served
    /// longest ago), applies the minimum-balance filter and orders the result.
    pub fn build(
        candidates: Vec<DefaulterCandidate>,
        now: DateTime<Utc>,
        policy: &DefaulterPolicy,
        filter: &ReportFilter,
        sort: DefaulterSort,
    ) -> Self {
        let mut per_account: HashMap<String, DefaulterRecord> = HashMap::new();
        for record in candidates
            .into_iter()
            .filter_map(|c| classify(c, now, policy))
            .filter(|r| filter.accepts_amount(r.remaining_balance))
        {
            let key = format!("{}:{}", record.account_type.as_str(), record.account_id);
            match per_account.get(&key) {
                Some(existing) if existing.days_since_served >= record.days_since_served => {}
                _ => {
                    per_account.insert(key, record);
                }
            }
        }

        let mut records: Vec<DefaulterRecord> = per_account.into_values().collect();
        sort.apply(&mut records);
        let summary = DefaulterSummary::from_records(&records);
        Self { records, summary }
    }

    pub fn empty() -> Self {
        Self::default()
    }
}

/// Defaulter report for the current ledger. Store failures yield an empty report.
pub async fn load_defaulters(
    state: &AppState,
    filter: &ReportFilter,
    sort: DefaulterSort,
    now: DateTime<Utc>,
) -> DefaulterReport {
    let started = Instant::now();
    match load_candidates(state, filter, now).await {
        Ok(candidates) => {
            let report = DefaulterReport::build(candidates, now, &state.policy, filter, sort);
            tracing::debug!(
                defaulters = report.summary.total_defaulters,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "defaulter report built"
            );
            report
        }
        Err(err) => {
            tracing::error!(error = %err, "defaulter report query failed; showing empty report");
            DefaulterReport::empty()
        }
    }
}

async fn load_candidates(
    state: &AppState,
    filter: &ReportFilter,
    now: DateTime<Utc>,
) -> Result<Vec<DefaulterCandidate>> {
    let bills = list_bills(state, filter.served_bill_match(state.policy.served_cutoff(now))).await?;
    if bills.is_empty() {
        return Ok(Vec::new());
    }

    let mut account_ids: Vec<ObjectId> = bills.iter().map(|b| b.reference_id).collect();
    account_ids.sort();
    account_ids.dedup();
    let mut account_match = filter.account_match();
    account_match.insert("_id", doc! { "$in": account_ids });
    let accounts: HashMap<ObjectId, BillableAccount> = list_accounts(state, account_match)
        .await?
        .into_iter()
        .filter_map(|a| a.id.map(|id| (id, a)))
        .collect();

    let zones = zone_names(state).await?;
    let users = user_names(state).await?;
    let mut balances: HashMap<ObjectId, Balance> = HashMap::new();
    let mut candidates = Vec::with_capacity(bills.len());

    for bill in bills {
        // Accounts filtered out by zone or type drop their bills too.
        let Some(account) = accounts.get(&bill.reference_id) else {
            continue;
        };
        if account.account_type != bill.bill_type {
            continue;
        }
        let balance = match balances.get(&bill.reference_id) {
            Some(balance) => *balance,
            None => {
                let lookup =
                    successful_total_for_account(state, account.account_type, &bill.reference_id)
                        .await;
                let balance = Balance::from_lookup(account.amount_payable, lookup);
                balances.insert(bill.reference_id, balance);
                balance
            }
        };
        candidates.push(DefaulterCandidate {
            zone_name: account.zone_id.and_then(|z| zones.get(&z).cloned()),
            served_by_name: bill.served_by.and_then(|u| users.get(&u).cloned()),
            account: account.clone(),
            bill,
            balance,
        });
    }
    Ok(candidates)
}
