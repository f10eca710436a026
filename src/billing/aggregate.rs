use std::collections::HashMap;

use serde::Serialize;

use super::balance::round_cents;
use super::classifier::{DefaulterRecord, DefaulterType};
use super::policy::UrgencyLevel;

/// Bucket used for rows whose grouping key is missing.
pub const UNASSIGNED: &str = "Unassigned";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupTotal {
    pub key: String,
    pub count: usize,
    pub total_amount: f64,
}

/// Groups `items` by `key`, counting rows and summing `amount`.
/// Groups come back ordered by total amount descending, then by key.
pub fn group_totals<T, K, A>(items: &[T], key: K, amount: A) -> Vec<GroupTotal>
where
    K: Fn(&T) -> Option<String>,
    A: Fn(&T) -> f64,
{
    let mut groups: HashMap<String, (usize, f64)> = HashMap::new();
    for item in items {
        let group = key(item)
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .unwrap_or_else(|| UNASSIGNED.to_string());
        let entry = groups.entry(group).or_insert((0, 0.0));
        entry.0 += 1;
        entry.1 += amount(item);
    }

    let mut totals: Vec<GroupTotal> = groups
        .into_iter()
        .map(|(key, (count, total))| GroupTotal {
            key,
            count,
            total_amount: round_cents(total),
        })
        .collect();
    totals.sort_by(|a, b| {
        b.total_amount
            .total_cmp(&a.total_amount)
            .then_with(|| a.key.cmp(&b.key))
    });
    totals
}

/// Share of `part` in `whole` as a percentage with one decimal. Zero when `whole` is zero.
pub fn percentage(part: f64, whole: f64) -> f64 {
    if whole <= 0.0 {
        return 0.0;
    }
    (part / whole * 1000.0).round() / 10.0
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DefaulterSummary {
    pub total_defaulters: usize,
    pub total_outstanding: f64,
    pub critical: usize,
    pub high: usize,
    pub moderate: usize,
    pub multi_year: usize,
    pub current_year: usize,
    pub by_zone: Vec<GroupTotal>,
    pub by_urgency: Vec<GroupTotal>,
    pub by_account_type: Vec<GroupTotal>,
}

impl DefaulterSummary {
    pub fn from_records(records: &[DefaulterRecord]) -> Self {
        let count_urgency =
            |level: UrgencyLevel| records.iter().filter(|r| r.urgency_level == level).count();
        let count_type =
            |kind: DefaulterType| records.iter().filter(|r| r.defaulter_type == kind).count();

        Self {
            total_defaulters: records.len(),
            total_outstanding: round_cents(records.iter().map(|r| r.remaining_balance).sum()),
            critical: count_urgency(UrgencyLevel::Critical),
            high: count_urgency(UrgencyLevel::High),
            moderate: count_urgency(UrgencyLevel::Moderate),
            multi_year: count_type(DefaulterType::MultiYear),
            current_year: count_type(DefaulterType::CurrentYear),
            by_zone: group_totals(records, |r| r.zone.clone(), |r| r.remaining_balance),
            by_urgency: group_totals(
                records,
                |r| Some(r.urgency_level.label().to_string()),
                |r| r.remaining_balance,
            ),
            by_account_type: group_totals(
                records,
                |r| Some(r.account_type.label().to_string()),
                |r| r.remaining_balance,
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Row {
        zone: Option<&'static str>,
        amount: f64,
    }

    #[test]
    fn missing_keys_land_in_unassigned() {
        let rows = vec![
            Row { zone: Some("North"), amount: 10.0 },
            Row { zone: None, amount: 5.0 },
            Row { zone: Some("  "), amount: 2.5 },
        ];
        let totals = group_totals(&rows, |r| r.zone.map(str::to_string), |r| r.amount);
        assert_eq!(totals.len(), 2);
        assert_eq!(totals[0].key, "North");
        assert_eq!(totals[1].key, UNASSIGNED);
        assert_eq!(totals[1].count, 2);
        assert_eq!(totals[1].total_amount, 7.5);
    }

    #[test]
    fn groups_sorted_by_amount_then_key() {
        let rows = vec![
            Row { zone: Some("B"), amount: 50.0 },
            Row { zone: Some("A"), amount: 50.0 },
            Row { zone: Some("C"), amount: 80.0 },
        ];
        let keys: Vec<String> = group_totals(&rows, |r| r.zone.map(str::to_string), |r| r.amount)
            .into_iter()
            .map(|g| g.key)
            .collect();
        assert_eq!(keys, vec!["C", "A", "B"]);
    }

    #[test]
    fn totals_match_input() {
        let rows: Vec<Row> = (0..25)
            .map(|i| Row {
                zone: if i % 3 == 0 { None } else { Some(["East", "West"][i % 2]) },
                amount: i as f64 * 1.25,
            })
            .collect();
        let totals = group_totals(&rows, |r| r.zone.map(str::to_string), |r| r.amount);
        let count: usize = totals.iter().map(|g| g.count).sum();
        let sum: f64 = totals.iter().map(|g| g.total_amount).sum();
        assert_eq!(count, rows.len());
        assert_eq!(round_cents(sum), round_cents(rows.iter().map(|r| r.amount).sum()));
    }

    #[test]
    fn percentage_handles_zero_whole() {
        assert_eq!(percentage(5.0, 0.0), 0.0);
        assert_eq!(percentage(1.0, 3.0), 33.3);
        assert_eq!(percentage(250.0, 1000.0), 25.0);
    }
}
