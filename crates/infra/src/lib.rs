//! Infrastructure layer: entitlement storage, transfer orchestration,
//! identify locks, configuration.

pub mod config;
pub mod identify_lock;
pub mod store;
pub mod transfer;

pub use config::{ConfigError, Settings};
pub use store::{EntitlementStore, InMemoryEntitlementStore, PostgresEntitlementStore, StoreError};
pub use transfer::{GuildPremium, TransferError, TransferService};
