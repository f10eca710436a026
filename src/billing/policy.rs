use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::Serialize;

pub const DEFAULT_GRACE_PERIOD_DAYS: i64 = 90;
pub const DEFAULT_HIGH_URGENCY_DAYS: i64 = 150;
pub const DEFAULT_CRITICAL_URGENCY_DAYS: i64 = 180;

/// Severity tier of a defaulter, ordered from least to most urgent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum UrgencyLevel {
    Moderate,
    High,
    Critical,
}

impl UrgencyLevel {
    pub fn label(&self) -> &'static str {
        match self {
            UrgencyLevel::Moderate => "Moderate",
            UrgencyLevel::High => "High",
            UrgencyLevel::Critical => "Critical",
        }
    }
}

/// Thresholds that decide when a served bill turns into a defaulter and how urgent it is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DefaulterPolicy {
    pub grace_period_days: i64,
    pub high_after_days: i64,
    pub critical_after_days: i64,
}

impl Default for DefaulterPolicy {
    fn default() -> Self {
        Self {
            grace_period_days: DEFAULT_GRACE_PERIOD_DAYS,
            high_after_days: DEFAULT_HIGH_URGENCY_DAYS,
            critical_after_days: DEFAULT_CRITICAL_URGENCY_DAYS,
        }
    }
}

impl DefaulterPolicy {
    pub fn is_past_grace(&self, days_since_served: i64) -> bool {
        days_since_served > self.grace_period_days
    }

    pub fn urgency(&self, days_since_served: i64) -> UrgencyLevel {
        if days_since_served > self.critical_after_days {
            UrgencyLevel::Critical
        } else if days_since_served > self.high_after_days {
            UrgencyLevel::High
        } else {
            UrgencyLevel::Moderate
        }
    }

    /// Bills served before this instant are past the grace period on `now`'s calendar day.
    pub fn served_cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let grace_start = Duration::try_days(self.grace_period_days)
            .and_then(|grace| now.date_naive().checked_sub_signed(grace))
            .unwrap_or(NaiveDate::MIN);
        grace_start.and_time(NaiveTime::MIN).and_utc()
    }
}

/// Whole calendar days (UTC) between the serving date and `now`.
pub fn days_since(served_at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now.date_naive() - served_at.date_naive()).num_days()
}
