//! Guild entitlement storage boundary.
//!
//! The transfer flow only needs point reads and two link mutations, so the
//! trait stays small. Implementations:
//!
//! - [`InMemoryEntitlementStore`]: tests/dev
//! - [`PostgresEntitlementStore`]: `guilds` table via SQLx
//!
//! ## Guarded link writes
//!
//! `set_inherits_from` / `set_transferred_to` only update a row whose link
//! columns are both still empty. A row that gained a link after it was read
//! yields `StoreError::Conflict` instead of being overwritten.

pub mod in_memory;
pub mod postgres;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use tierlink_core::{EntitlementRecord, GuildId};

pub use in_memory::InMemoryEntitlementStore;
pub use postgres::PostgresEntitlementStore;

/// Entitlement store operation error.
///
/// These are infrastructure errors; eligibility rejections never appear here.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("guild not found: {0}")]
    NotFound(GuildId),

    /// A guarded write found the row already linked (lost race).
    #[error("conflicting update: {0}")]
    Conflict(String),

    #[error("failed to decode guild row: {0}")]
    Decode(String),

    #[error("storage error: {0}")]
    Database(String),
}

/// Account store consumed by the transfer flow.
#[async_trait]
pub trait EntitlementStore: Send + Sync {
    /// Load the record for a guild, `None` if the guild is unknown.
    async fn get_record(&self, guild_id: GuildId) -> Result<Option<EntitlementRecord>, StoreError>;

    /// Create a free, unlinked record if none exists; returns the current record.
    ///
    /// A provided `name` replaces the stored name. Tier and links are never touched.
    async fn ensure_record(
        &self,
        guild_id: GuildId,
        name: Option<&str>,
    ) -> Result<EntitlementRecord, StoreError>;

    /// Mark `guild_id` as inheriting its tier from `source`.
    async fn set_inherits_from(&self, guild_id: GuildId, source: GuildId) -> Result<(), StoreError>;

    /// Mark `guild_id` as having donated its tier to `target`.
    async fn set_transferred_to(&self, guild_id: GuildId, target: GuildId) -> Result<(), StoreError>;

    /// Write both links of a transfer.
    ///
    /// The default applies the destination link first, then the origin link, and
    /// stops at the first failure: a failure in the second write leaves the
    /// destination inheriting while the origin is unmarked. Stores that can
    /// update both rows atomically override this.
    async fn link_transfer(&self, origin: GuildId, dest: GuildId) -> Result<(), StoreError> {
        self.set_inherits_from(dest, origin).await?;
        self.set_transferred_to(origin, dest).await
    }
}

#[async_trait]
impl<S> EntitlementStore for Arc<S>
where
    S: EntitlementStore + ?Sized,
{
    async fn get_record(&self, guild_id: GuildId) -> Result<Option<EntitlementRecord>, StoreError> {
        (**self).get_record(guild_id).await
    }

    async fn ensure_record(
        &self,
        guild_id: GuildId,
        name: Option<&str>,
    ) -> Result<EntitlementRecord, StoreError> {
        (**self).ensure_record(guild_id, name).await
    }

    async fn set_inherits_from(&self, guild_id: GuildId, source: GuildId) -> Result<(), StoreError> {
        (**self).set_inherits_from(guild_id, source).await
    }

    async fn set_transferred_to(&self, guild_id: GuildId, target: GuildId) -> Result<(), StoreError> {
        (**self).set_transferred_to(guild_id, target).await
    }

    async fn link_transfer(&self, origin: GuildId, dest: GuildId) -> Result<(), StoreError> {
        (**self).link_transfer(origin, dest).await
    }
}
