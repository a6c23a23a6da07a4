//! Guild entitlement record and derived status.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::expiry;
use crate::id::GuildId;
use crate::tier::{PremiumTier, TierDurations};

/// Premium state of a single guild.
///
/// `transferred_to` and `inherits_from` are provenance links written by the
/// transfer flow. `tier` and `subscription_start_unix` are owned by billing and
/// never touched here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitlementRecord {
    pub guild_id: GuildId,
    pub name: Option<String>,
    pub tier: PremiumTier,
    /// Start of the current paid period (unix seconds).
    pub subscription_start_unix: Option<i64>,
    /// Set once this guild has donated its premium elsewhere.
    pub transferred_to: Option<GuildId>,
    /// Set while this guild's tier is on loan from another guild.
    pub inherits_from: Option<GuildId>,
}

impl EntitlementRecord {
    /// Record for a guild seen for the first time: free tier, no links.
    pub fn new_free(guild_id: GuildId) -> Self {
        Self {
            guild_id,
            name: None,
            tier: PremiumTier::Free,
            subscription_start_unix: None,
            transferred_to: None,
            inherits_from: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_subscription(mut self, tier: PremiumTier, start_unix: i64) -> Self {
        self.tier = tier;
        self.subscription_start_unix = Some(start_unix);
        self
    }

    /// True when either provenance link is set.
    pub fn is_linked(&self) -> bool {
        self.transferred_to.is_some() || self.inherits_from.is_some()
    }

    /// Days of entitlement left, or `None` without a recorded subscription start.
    pub fn days_remaining(&self, now: DateTime<Utc>, durations: &TierDurations) -> Option<i64> {
        self.subscription_start_unix.map(|start| {
            expiry::days_remaining(start, now.timestamp(), durations.days_for(self.tier))
        })
    }

    /// Paid tier with days left on the clock.
    pub fn has_active_subscription(&self, now: DateTime<Utc>, durations: &TierDurations) -> bool {
        self.tier.is_paid() && self.days_remaining(now, durations).is_some_and(|d| d > 0)
    }

    pub fn status(&self, now: DateTime<Utc>, durations: &TierDurations) -> EntitlementStatus {
        EntitlementStatus {
            tier: self.tier,
            days_remaining: self.days_remaining(now, durations),
            active: self.has_active_subscription(now, durations),
        }
    }
}

/// Point-in-time view of a record's entitlement. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitlementStatus {
    pub tier: PremiumTier,
    pub days_remaining: Option<i64>,
    pub active: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expiry::SECS_IN_A_DAY;

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    #[test]
    fn new_record_is_free_and_unlinked() {
        let r = EntitlementRecord::new_free(GuildId::new(1));
        assert_eq!(r.tier, PremiumTier::Free);
        assert!(r.subscription_start_unix.is_none());
        assert!(!r.is_linked());
    }

    #[test]
    fn status_reports_remaining_days() {
        let now = 1_700_000_000;
        let r = EntitlementRecord::new_free(GuildId::new(1))
            .with_subscription(PremiumTier::Standard, now - 10 * SECS_IN_A_DAY);
        let status = r.status(at(now), &TierDurations::default());
        assert_eq!(status.days_remaining, Some(21));
        assert!(status.active);
    }

    #[test]
    fn free_tier_is_never_active() {
        let now = 1_700_000_000;
        let r = EntitlementRecord::new_free(GuildId::new(1))
            .with_subscription(PremiumTier::Free, now);
        assert!(!r.has_active_subscription(at(now), &TierDurations::default()));
    }

    #[test]
    fn missing_start_has_no_remaining_days() {
        let mut r = EntitlementRecord::new_free(GuildId::new(1));
        r.tier = PremiumTier::Gold;
        let status = r.status(at(1_700_000_000), &TierDurations::default());
        assert_eq!(status.days_remaining, None);
        assert!(!status.active);
    }
}
