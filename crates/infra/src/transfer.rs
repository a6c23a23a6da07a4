//! Premium transfer orchestration.
//!
//! ```text
//! decimal guild ids
//!   ↓
//! 1. Parse ids (malformed → MalformedIdentifier, store untouched)
//!   ↓
//! 2. Load origin + destination records (unknown → MissingRecord)
//!   ↓
//! 3. Evaluate eligibility (pure; rejection → Rejected(reason))
//!   ↓
//! 4. Write provenance links
//! ```
//!
//! No lock is held across steps 2–4. Two racing transfers on the same pair are
//! settled by the store's guarded writes: the loser gets `Store(Conflict)`.
//! Failures are returned to the caller as-is; nothing here retries.

use serde::Serialize;
use thiserror::Error;
use tracing::{info, instrument, warn};

use tierlink_core::{
    evaluate, Clock, EntitlementRecord, EntitlementStatus, GuildId, Rejection, SystemClock,
    TierDurations, TransferKind,
};

use crate::store::{EntitlementStore, StoreError};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransferError {
    /// A guild id was not a decimal `u64`.
    #[error("malformed guild identifier: {0}")]
    MalformedIdentifier(String),

    /// The store has no record for this guild.
    #[error("no entitlement record for guild {0}")]
    MissingRecord(GuildId),

    /// An eligibility rule refused the operation.
    #[error("transfer rejected: {0}")]
    Rejected(#[from] Rejection),

    /// The account store failed. Not safe to blindly retry a transfer: the
    /// destination link may already be written.
    #[error("store failure: {0}")]
    Store(StoreError),
}

impl From<StoreError> for TransferError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::NotFound(id) => TransferError::MissingRecord(id),
            other => TransferError::Store(other),
        }
    }
}

/// A record together with its entitlement status at lookup time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GuildPremium {
    pub record: EntitlementRecord,
    pub status: EntitlementStatus,
}

/// Applies premium transfers and Gold sub-server grants against a store.
#[derive(Debug)]
pub struct TransferService<S, C = SystemClock> {
    store: S,
    clock: C,
    durations: TierDurations,
}

impl<S> TransferService<S, SystemClock> {
    pub fn new(store: S, durations: TierDurations) -> Self {
        Self::with_clock(store, SystemClock, durations)
    }
}

impl<S, C> TransferService<S, C> {
    pub fn with_clock(store: S, clock: C, durations: TierDurations) -> Self {
        Self {
            store,
            clock,
            durations,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn durations(&self) -> TierDurations {
        self.durations
    }
}

impl<S, C> TransferService<S, C>
where
    S: EntitlementStore,
    C: Clock,
{
    /// Move `origin`'s premium to `dest` permanently.
    ///
    /// On success `dest` inherits from `origin` and `origin` is marked as
    /// transferred to `dest`, closing it to further transfers.
    #[instrument(skip(self))]
    pub async fn transfer(&self, origin: &str, dest: &str) -> Result<(), TransferError> {
        let (origin, dest) = self.authorize(TransferKind::Transfer, origin, dest).await?;

        self.store.link_transfer(origin, dest).await?;

        info!(%origin, %dest, "premium transferred");
        Ok(())
    }

    /// Let Gold guild `origin` share its tier with sub-server `dest`.
    ///
    /// Only `dest` is linked; `origin` keeps its tier and may grant again.
    #[instrument(skip(self))]
    pub async fn grant(&self, origin: &str, dest: &str) -> Result<(), TransferError> {
        let (origin, dest) = self.authorize(TransferKind::Grant, origin, dest).await?;

        self.store.set_inherits_from(dest, origin).await?;

        info!(%origin, %dest, "gold sub-server added");
        Ok(())
    }

    /// Current record and derived status of a guild.
    #[instrument(skip(self))]
    pub async fn lookup(&self, guild: &str) -> Result<GuildPremium, TransferError> {
        let guild_id = parse_guild_id(guild)?;
        let record = self
            .store
            .get_record(guild_id)
            .await?
            .ok_or(TransferError::MissingRecord(guild_id))?;
        let status = record.status(self.clock.now(), &self.durations);
        Ok(GuildPremium { record, status })
    }

    /// First-interaction hook: make sure a record exists for `guild`.
    #[instrument(skip(self))]
    pub async fn register(
        &self,
        guild: &str,
        name: Option<&str>,
    ) -> Result<EntitlementRecord, TransferError> {
        let guild_id = parse_guild_id(guild)?;
        Ok(self.store.ensure_record(guild_id, name).await?)
    }

    /// Parse, load and evaluate; returns the typed ids of an accepted pair.
    async fn authorize(
        &self,
        kind: TransferKind,
        origin: &str,
        dest: &str,
    ) -> Result<(GuildId, GuildId), TransferError> {
        let origin_id = parse_guild_id(origin)?;
        let dest_id = parse_guild_id(dest)?;

        let origin = self
            .store
            .get_record(origin_id)
            .await?
            .ok_or(TransferError::MissingRecord(origin_id))?;
        let dest = self
            .store
            .get_record(dest_id)
            .await?
            .ok_or(TransferError::MissingRecord(dest_id))?;

        let now = self.clock.now();
        if let Err(reason) = evaluate(kind, Some(&origin), Some(&dest), now, &self.durations) {
            warn!(
                origin = %origin_id,
                dest = %dest_id,
                kind = ?kind,
                reason = reason.code(),
                "premium {} rejected",
                match kind {
                    TransferKind::Transfer => "transfer",
                    TransferKind::Grant => "grant",
                }
            );
            return Err(TransferError::Rejected(reason));
        }

        Ok((origin_id, dest_id))
    }
}

fn parse_guild_id(raw: &str) -> Result<GuildId, TransferError> {
    raw.parse::<GuildId>()
        .map_err(|e| TransferError::MalformedIdentifier(e.to_string()))
}
