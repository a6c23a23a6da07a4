//! Strongly-typed guild identifier.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Identifier of a guild (the tenant account owning an entitlement).
///
/// Guild ids arrive from the outside world as decimal strings; `FromStr` is the
/// only parsing entry point.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GuildId(u64);

impl GuildId {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    pub const fn get(self) -> u64 {
        self.0
    }
}

impl core::fmt::Display for GuildId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl From<u64> for GuildId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<GuildId> for u64 {
    fn from(value: GuildId) -> Self {
        value.0
    }
}

impl FromStr for GuildId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let id = s
            .parse::<u64>()
            .map_err(|e| DomainError::invalid_id(format!("GuildId '{s}': {e}")))?;
        Ok(Self(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_decimal_snowflake() {
        let id: GuildId = "754465589958803548".parse().unwrap();
        assert_eq!(id.get(), 754465589958803548);
        assert_eq!(id.to_string(), "754465589958803548");
    }

    #[test]
    fn rejects_non_numeric_and_signed_input() {
        for raw in ["", "abc", "-5", "12 34", "0x10", "18446744073709551616"] {
            let err = raw.parse::<GuildId>().unwrap_err();
            assert!(matches!(err, DomainError::InvalidId(_)), "{raw} should be invalid");
        }
    }
}
