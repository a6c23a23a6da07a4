//! Eligibility evaluator for premium transfers and Gold sub-server grants.
//!
//! `evaluate` is a pure function over two entitlement records and the current
//! time. Rules run in a fixed order and the first failing rule is reported, so
//! the same inputs always produce the same `Rejection`.
//!
//! Inheritance is single-hop: any origin or destination that already carries a
//! provenance link is rejected, which makes chains (A→B→C) and cycles (A→B→A)
//! impossible to construct.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::entitlement::EntitlementRecord;
use crate::tier::{PremiumTier, TierDurations};

/// Which operation is being evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferKind {
    /// Origin gives its tier away permanently.
    Transfer,
    /// Gold origin lends its tier to a sub-server and keeps its own.
    Grant,
}

/// Why a transfer or grant was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rejection {
    #[error("origin or destination guild has no entitlement record")]
    MissingRecord,

    #[error("origin guild is free tier and has nothing to transfer")]
    OriginNotEntitled,

    #[error("only gold premium guilds can add inheriting sub-servers")]
    OriginNotGoldTier,

    #[error("origin guild has already transferred its premium to another guild")]
    OriginAlreadyTransferred,

    #[error("origin guild inherits premium from another guild and cannot pass it on")]
    OriginIsInheritor,

    #[error("destination guild has already transferred its premium elsewhere")]
    DestAlreadyTransferred,

    #[error("destination guild already inherits premium from another guild")]
    DestIsInheritor,

    #[error("origin guild has no recorded subscription")]
    OriginHasNoSubscription,

    #[error("origin guild premium has expired")]
    OriginExpired,

    #[error("destination guild has active premium and cannot be overwritten")]
    DestHasActiveEntitlement,

    #[error("destination guild has a non-free tier with no recorded subscription")]
    DestHasForeignEntitlement,
}

impl Rejection {
    /// Stable machine-readable code.
    pub fn code(self) -> &'static str {
        match self {
            Rejection::MissingRecord => "missing_record",
            Rejection::OriginNotEntitled => "origin_not_entitled",
            Rejection::OriginNotGoldTier => "origin_not_gold_tier",
            Rejection::OriginAlreadyTransferred => "origin_already_transferred",
            Rejection::OriginIsInheritor => "origin_is_inheritor",
            Rejection::DestAlreadyTransferred => "dest_already_transferred",
            Rejection::DestIsInheritor => "dest_is_inheritor",
            Rejection::OriginHasNoSubscription => "origin_has_no_subscription",
            Rejection::OriginExpired => "origin_expired",
            Rejection::DestHasActiveEntitlement => "dest_has_active_entitlement",
            Rejection::DestHasForeignEntitlement => "dest_has_foreign_entitlement",
        }
    }
}

/// Decide whether `origin` may transfer (or grant) its premium to `dest`.
pub fn evaluate(
    kind: TransferKind,
    origin: Option<&EntitlementRecord>,
    dest: Option<&EntitlementRecord>,
    now: DateTime<Utc>,
    durations: &TierDurations,
) -> Result<(), Rejection> {
    let (Some(origin), Some(dest)) = (origin, dest) else {
        return Err(Rejection::MissingRecord);
    };

    ensure_origin_tier(kind, origin)?;
    ensure_unlinked(origin, dest)?;
    ensure_origin_current(origin, now, durations)?;
    ensure_dest_vacant(dest, now, durations)?;

    Ok(())
}

fn ensure_origin_tier(kind: TransferKind, origin: &EntitlementRecord) -> Result<(), Rejection> {
    if origin.tier == PremiumTier::Free {
        return Err(Rejection::OriginNotEntitled);
    }
    if kind == TransferKind::Grant && !origin.tier.can_grant_subservers() {
        return Err(Rejection::OriginNotGoldTier);
    }
    Ok(())
}

fn ensure_unlinked(origin: &EntitlementRecord, dest: &EntitlementRecord) -> Result<(), Rejection> {
    if origin.transferred_to.is_some() {
        return Err(Rejection::OriginAlreadyTransferred);
    }
    if origin.inherits_from.is_some() {
        return Err(Rejection::OriginIsInheritor);
    }
    if dest.transferred_to.is_some() {
        return Err(Rejection::DestAlreadyTransferred);
    }
    if dest.inherits_from.is_some() {
        return Err(Rejection::DestIsInheritor);
    }
    Ok(())
}

fn ensure_origin_current(
    origin: &EntitlementRecord,
    now: DateTime<Utc>,
    durations: &TierDurations,
) -> Result<(), Rejection> {
    match origin.days_remaining(now, durations) {
        None => Err(Rejection::OriginHasNoSubscription),
        Some(days) if days <= 0 => Err(Rejection::OriginExpired),
        Some(_) => Ok(()),
    }
}

fn ensure_dest_vacant(
    dest: &EntitlementRecord,
    now: DateTime<Utc>,
    durations: &TierDurations,
) -> Result<(), Rejection> {
    if dest.subscription_start_unix.is_some() {
        // A lapsed paid tier (or a free one) may be overwritten.
        if dest.has_active_subscription(now, durations) {
            return Err(Rejection::DestHasActiveEntitlement);
        }
    } else if dest.tier != PremiumTier::Free {
        return Err(Rejection::DestHasForeignEntitlement);
    }
    Ok(())
}
