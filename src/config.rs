// config.rs
// Environment-driven settings (.env is loaded by main through dotenvy).

use std::{env, net::SocketAddr};

use thiserror::Error;

use crate::billing::{
    DEFAULT_CRITICAL_URGENCY_DAYS, DEFAULT_GRACE_PERIOD_DAYS, DEFAULT_HIGH_URGENCY_DAYS,
    DefaulterPolicy,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{key} must be {expected}, got {value:?}")]
    Invalid {
        key: &'static str,
        expected: &'static str,
        value: String,
    },
    #[error(
        "thresholds need 0 <= grace ({grace}) < high ({high}) < critical ({critical}) <= 36500"
    )]
    Thresholds { grace: i64, high: i64, critical: i64 },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub addr: SocketAddr,
    pub mongodb_uri: String,
    pub mongodb_db: String,
    pub users_file: String,
    pub ledger_file: String,
    pub policy: DefaulterPolicy,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let addr_raw = env_or("QUICKBILL_ADDR", "0.0.0.0:8080");
        let addr = addr_raw.parse().map_err(|_| ConfigError::Invalid {
            key: "QUICKBILL_ADDR",
            expected: "a socket address like 0.0.0.0:8080",
            value: addr_raw.clone(),
        })?;

        Ok(Self {
            addr,
            mongodb_uri: env_or("MONGODB_URI", "mongodb://localhost:27017"),
            mongodb_db: env_or("MONGODB_DB", "quickbill"),
            users_file: env_or("USERS_FILE", "./data/users.json"),
            ledger_file: env_or("LEDGER_FILE", "./data/ledger.json"),
            policy: policy_from_env()?,
        })
    }
}

/// Upper bound for any threshold, about a century.
pub const MAX_POLICY_DAYS: i64 = 36_500;

pub fn policy_from_env() -> Result<DefaulterPolicy, ConfigError> {
    policy_from_values(
        days_var("GRACE_PERIOD_DAYS", DEFAULT_GRACE_PERIOD_DAYS)?,
        days_var("HIGH_URGENCY_DAYS", DEFAULT_HIGH_URGENCY_DAYS)?,
        days_var("CRITICAL_URGENCY_DAYS", DEFAULT_CRITICAL_URGENCY_DAYS)?,
    )
}

pub fn policy_from_values(
    grace: i64,
    high: i64,
    critical: i64,
) -> Result<DefaulterPolicy, ConfigError> {
    if grace < 0 || grace >= high || high >= critical || critical > MAX_POLICY_DAYS {
        return Err(ConfigError::Thresholds {
            grace,
            high,
            critical,
        });
    }
    Ok(DefaulterPolicy {
        grace_period_days: grace,
        high_after_days: high,
        critical_after_days: critical,
    })
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn days_var(key: &'static str, default: i64) -> Result<i64, ConfigError> {
    match env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw.trim().parse().map_err(|_| ConfigError::Invalid {
            key,
            expected: "a whole number of days",
            value: raw,
        }),
        _ => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_thresholds_are_valid() {
        let policy = policy_from_values(90, 150, 180).unwrap();
        assert_eq!(policy, DefaulterPolicy::default());
    }

    #[test]
    fn thresholds_must_increase() {
        assert!(matches!(
            policy_from_values(90, 90, 180),
            Err(ConfigError::Thresholds { .. })
        ));
        assert!(matches!(
            policy_from_values(90, 200, 180),
            Err(ConfigError::Thresholds { .. })
        ));
        assert!(policy_from_values(-1, 10, 20).is_err());
    }

    #[test]
    fn thresholds_are_bounded() {
        assert!(policy_from_values(100, 200, MAX_POLICY_DAYS).is_ok());
        assert!(matches!(
            policy_from_values(100_000_000, 100_000_001, 100_000_002),
            Err(ConfigError::Thresholds { .. })
        ));
        assert!(matches!(
            policy_from_values(90, 150, MAX_POLICY_DAYS + 1),
            Err(ConfigError::Thresholds { .. })
        ));
    }
}
