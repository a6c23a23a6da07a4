//! Premium tiers and their entitlement durations.

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Default subscription length in days.
///
/// 31 so that a subscription renewed on the last day of a 31-day month stays valid.
pub const DEFAULT_SUBSCRIPTION_DAYS: i64 = 31;

/// Entitlement level of a guild.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PremiumTier {
    Free,
    /// Paid tier.
    Standard,
    /// Highest paid tier; may grant inheriting sub-servers.
    Gold,
}

impl PremiumTier {
    pub fn is_paid(self) -> bool {
        !matches!(self, PremiumTier::Free)
    }

    /// Only Gold guilds can lend their tier to sub-servers.
    pub fn can_grant_subservers(self) -> bool {
        matches!(self, PremiumTier::Gold)
    }

    /// Storage code (`premium` column).
    pub fn code(self) -> i16 {
        match self {
            PremiumTier::Free => 0,
            PremiumTier::Standard => 1,
            PremiumTier::Gold => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PremiumTier::Free => "free",
            PremiumTier::Standard => "standard",
            PremiumTier::Gold => "gold",
        }
    }
}

impl TryFrom<i16> for PremiumTier {
    type Error = DomainError;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(PremiumTier::Free),
            1 => Ok(PremiumTier::Standard),
            2 => Ok(PremiumTier::Gold),
            other => Err(DomainError::validation(format!("unknown premium tier code {other}"))),
        }
    }
}

impl core::fmt::Display for PremiumTier {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Entitlement duration per paid tier, in days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierDurations {
    pub standard_days: i64,
    pub gold_days: i64,
}

impl TierDurations {
    pub fn days_for(&self, tier: PremiumTier) -> i64 {
        match tier {
            PremiumTier::Free => 0,
            PremiumTier::Standard => self.standard_days,
            PremiumTier::Gold => self.gold_days,
        }
    }
}

impl Default for TierDurations {
    fn default() -> Self {
        Self {
            standard_days: DEFAULT_SUBSCRIPTION_DAYS,
            gold_days: DEFAULT_SUBSCRIPTION_DAYS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_codes_are_stable() {
        for tier in [PremiumTier::Free, PremiumTier::Standard, PremiumTier::Gold] {
            assert_eq!(PremiumTier::try_from(tier.code()).unwrap(), tier);
        }
    }

    #[test]
    fn unknown_code_is_rejected() {
        assert!(matches!(PremiumTier::try_from(7), Err(DomainError::Validation(_))));
        assert!(PremiumTier::try_from(-1).is_err());
    }

    #[test]
    fn free_tier_has_no_duration() {
        let durations = TierDurations {
            standard_days: 30,
            gold_days: 365,
        };
        assert_eq!(durations.days_for(PremiumTier::Free), 0);
        assert_eq!(durations.days_for(PremiumTier::Standard), 30);
        assert_eq!(durations.days_for(PremiumTier::Gold), 365);
    }
}
