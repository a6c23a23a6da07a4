//! Cooperative cross-process lock for bot-token identify calls.
//!
//! A token's identify lock is a key with a short TTL in a shared store. Holders
//! `acquire` it before identifying; others `wait_until_unlocked`, re-checking on
//! a fixed interval until the key has expired.
//!
//! This is a polling mutex, not a fenced lease: `acquire` overwrites an existing
//! key and nothing verifies ownership.
//!
//! The API is blocking. From async code, call it through `spawn_blocking`.

pub mod in_memory;
#[cfg(feature = "redis")]
pub mod redis_lock;

use std::time::Duration;

use thiserror::Error;

pub use in_memory::InMemoryIdentifyLock;
#[cfg(feature = "redis")]
pub use redis_lock::RedisIdentifyLock;

/// Default time a freshly acquired identify lock stays set.
pub const DEFAULT_LOCK_TTL: Duration = Duration::from_secs(5);

/// Default pause between `is_locked` checks while waiting.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

pub const DEFAULT_KEY_PREFIX: &str = "tierlink";

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LockError {
    #[error("lock backend error: {0}")]
    Backend(String),
}

/// Lock timing and key namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockConfig {
    pub ttl: Duration,
    pub poll_interval: Duration,
    pub key_prefix: String,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_LOCK_TTL,
            poll_interval: DEFAULT_POLL_INTERVAL,
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
        }
    }
}

impl LockConfig {
    /// Store key guarding identify calls for `token_key`.
    pub fn key_for(&self, token_key: &str) -> String {
        format!("{}:token:lock:{}", self.key_prefix, token_key)
    }
}

pub trait IdentifyLock: Send + Sync {
    /// Set the lock for `token_key`, expiring after `ttl`.
    fn acquire(&self, token_key: &str, ttl: Duration) -> Result<(), LockError>;

    /// Timing and namespace this lock was built with.
    fn config(&self) -> &LockConfig;

    /// Set the lock for `token_key` with the configured ttl.
    fn acquire_default(&self, token_key: &str) -> Result<(), LockError> {
        self.acquire(token_key, self.config().ttl)
    }

    /// Whether the lock key is currently present.
    ///
    /// Backend errors count as unlocked so a store outage cannot stall callers.
    fn is_locked(&self, token_key: &str) -> bool;

    /// Block until the lock for `token_key` is absent.
    fn wait_until_unlocked(&self, token_key: &str);
}

impl<L> IdentifyLock for std::sync::Arc<L>
where
    L: IdentifyLock + ?Sized,
{
    fn acquire(&self, token_key: &str, ttl: Duration) -> Result<(), LockError> {
        (**self).acquire(token_key, ttl)
    }

    fn config(&self) -> &LockConfig {
        (**self).config()
    }

    fn acquire_default(&self, token_key: &str) -> Result<(), LockError> {
        (**self).acquire_default(token_key)
    }

    fn is_locked(&self, token_key: &str) -> bool {
        (**self).is_locked(token_key)
    }

    fn wait_until_unlocked(&self, token_key: &str) {
        (**self).wait_until_unlocked(token_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_is_namespaced() {
        let config = LockConfig::default();
        assert_eq!(config.key_for("bot-1"), "tierlink:token:lock:bot-1");
        assert_eq!(config.ttl, Duration::from_secs(5));
        assert_eq!(config.poll_interval, Duration::from_secs(5));
    }
}
