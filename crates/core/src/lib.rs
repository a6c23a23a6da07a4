//! `tierlink-core`: premium entitlement domain.
//!
//! This crate contains **pure domain** logic (no infrastructure concerns): the
//! entitlement record, tier expiry arithmetic, and the eligibility evaluator
//! deciding whether a premium transfer or Gold sub-server grant is legal.

pub mod clock;
pub mod eligibility;
pub mod entitlement;
pub mod error;
pub mod expiry;
pub mod id;
pub mod tier;

pub use clock::{Clock, FixedClock, SystemClock};
pub use eligibility::{evaluate, Rejection, TransferKind};
pub use entitlement::{EntitlementRecord, EntitlementStatus};
pub use error::{DomainError, DomainResult};
pub use id::GuildId;
pub use tier::{PremiumTier, TierDurations};
