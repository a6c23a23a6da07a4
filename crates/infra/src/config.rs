//! Environment-driven configuration.

use std::ops::RangeInclusive;
use std::time::Duration;

use thiserror::Error;

use tierlink_core::TierDurations;

use crate::identify_lock::LockConfig;

pub const DEFAULT_REDIS_URL: &str = "redis://localhost:6379";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

/// Accepted tier durations, in days.
pub const TIER_DAYS_RANGE: RangeInclusive<i64> = 1..=36_500;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

/// Process settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Postgres URL; `None` selects the in-memory store.
    pub database_url: Option<String>,
    pub redis_url: String,
    pub durations: TierDurations,
    pub lock: LockConfig,
    pub bind_addr: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_url: None,
            redis_url: DEFAULT_REDIS_URL.to_string(),
            durations: TierDurations::default(),
            lock: LockConfig::default(),
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
        }
    }
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build settings from an arbitrary variable source (unset → default).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

        let durations = TierDurations {
            standard_days: parse_days(&get, "TIERLINK_STANDARD_DAYS", defaults.durations.standard_days)?,
            gold_days: parse_days(&get, "TIERLINK_GOLD_DAYS", defaults.durations.gold_days)?,
        };

        let lock = LockConfig {
            ttl: Duration::from_secs(parse_or(
                &get,
                "TIERLINK_LOCK_TTL_SECS",
                defaults.lock.ttl.as_secs(),
            )?),
            poll_interval: Duration::from_secs(parse_or(
                &get,
                "TIERLINK_LOCK_POLL_SECS",
                defaults.lock.poll_interval.as_secs(),
            )?),
            key_prefix: get("TIERLINK_LOCK_PREFIX").unwrap_or(defaults.lock.key_prefix),
        };

        Ok(Self {
            database_url: get("DATABASE_URL"),
            redis_url: get("REDIS_URL").unwrap_or(defaults.redis_url),
            durations,
            lock,
            bind_addr: get("TIERLINK_BIND_ADDR").unwrap_or(defaults.bind_addr),
        })
    }
}

fn parse_days<G>(get: &G, var: &'static str, default: i64) -> Result<i64, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    let days = parse_or(get, var, default)?;
    if !TIER_DAYS_RANGE.contains(&days) {
        return Err(ConfigError::Invalid {
            var,
            reason: format!(
                "{days} days is outside {}..={}",
                TIER_DAYS_RANGE.start(),
                TIER_DAYS_RANGE.end()
            ),
        });
    }
    Ok(days)
}

fn parse_or<T, G>(get: &G, var: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(var) {
        None => Ok(default),
        Some(raw) => raw.trim().parse::<T>().map_err(|e| ConfigError::Invalid {
            var,
            reason: format!("'{raw}': {e}"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k: &str| map.get(k).cloned()
    }

    #[test]
    fn empty_environment_yields_defaults() {
        let settings = Settings::from_lookup(lookup(&[])).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.durations.standard_days, 31);
        assert!(settings.database_url.is_none());
    }

    #[test]
    fn overrides_are_applied() {
        let settings = Settings::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/tierlink"),
            ("TIERLINK_GOLD_DAYS", "365"),
            ("TIERLINK_LOCK_POLL_SECS", "1"),
            ("TIERLINK_LOCK_PREFIX", "amu"),
        ]))
        .unwrap();

        assert_eq!(settings.database_url.as_deref(), Some("postgres://localhost/tierlink"));
        assert_eq!(settings.durations.gold_days, 365);
        assert_eq!(settings.durations.standard_days, 31);
        assert_eq!(settings.lock.poll_interval, Duration::from_secs(1));
        assert_eq!(settings.lock.key_for("t"), "amu:token:lock:t");
    }

    #[test]
    fn negative_tier_duration_is_rejected() {
        let err = Settings::from_lookup(lookup(&[("TIERLINK_STANDARD_DAYS", "-5")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "TIERLINK_STANDARD_DAYS", .. }));
    }

    #[test]
    fn zero_tier_duration_is_rejected() {
        let err = Settings::from_lookup(lookup(&[("TIERLINK_GOLD_DAYS", "0")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "TIERLINK_GOLD_DAYS", .. }));
    }

    #[test]
    fn oversized_tier_duration_is_rejected() {
        let err = Settings::from_lookup(lookup(&[("TIERLINK_GOLD_DAYS", "9223372036854775807")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "TIERLINK_GOLD_DAYS", .. }));

        let err = Settings::from_lookup(lookup(&[("TIERLINK_STANDARD_DAYS", "36501")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "TIERLINK_STANDARD_DAYS", .. }));
    }

    #[test]
    fn range_bounds_are_accepted() {
        let settings = Settings::from_lookup(lookup(&[
            ("TIERLINK_STANDARD_DAYS", "1"),
            ("TIERLINK_GOLD_DAYS", "36500"),
        ]))
        .unwrap();
        assert_eq!(settings.durations.standard_days, 1);
        assert_eq!(settings.durations.gold_days, 36_500);
    }

    #[test]
    fn lock_ttl_is_read_from_environment() {
        let settings = Settings::from_lookup(lookup(&[("TIERLINK_LOCK_TTL_SECS", "999")])).unwrap();
        assert_eq!(settings.lock.ttl, Duration::from_secs(999));
    }

    #[test]
    fn unparseable_number_is_an_error() {
        let err = Settings::from_lookup(lookup(&[("TIERLINK_STANDARD_DAYS", "thirty")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "TIERLINK_STANDARD_DAYS", .. }));
    }
}
