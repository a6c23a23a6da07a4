use std::collections::HashMap;
use std::sync::Mutex;
use std::thread;
use std::time::{Duration, Instant};

use tracing::debug;

use super::{IdentifyLock, LockConfig, LockError};

/// Process-local identify lock for tests/dev.
#[derive(Debug)]
pub struct InMemoryIdentifyLock {
    config: LockConfig,
    expiries: Mutex<HashMap<String, Instant>>,
}

impl InMemoryIdentifyLock {
    pub fn new(config: LockConfig) -> Self {
        Self {
            config,
            expiries: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryIdentifyLock {
    fn default() -> Self {
        Self::new(LockConfig::default())
    }
}

impl IdentifyLock for InMemoryIdentifyLock {
    fn acquire(&self, token_key: &str, ttl: Duration) -> Result<(), LockError> {
        let mut expiries = self
            .expiries
            .lock()
            .map_err(|_| LockError::Backend("lock poisoned".to_string()))?;
        expiries.insert(self.config.key_for(token_key), Instant::now() + ttl);
        debug!(token_key, ttl_ms = ttl.as_millis() as u64, "identify lock acquired");
        Ok(())
    }

    fn config(&self) -> &LockConfig {
        &self.config
    }

    fn is_locked(&self, token_key: &str) -> bool {
        let Ok(mut expiries) = self.expiries.lock() else {
            return false;
        };
        let key = self.config.key_for(token_key);
        match expiries.get(&key) {
            Some(expires_at) if *expires_at > Instant::now() => true,
            Some(_) => {
                expiries.remove(&key);
                false
            }
            None => false,
        }
    }

    fn wait_until_unlocked(&self, token_key: &str) {
        while self.is_locked(token_key) {
            debug!(token_key, "waiting for identify lock to clear");
            thread::sleep(self.config.poll_interval);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_lock() -> InMemoryIdentifyLock {
        InMemoryIdentifyLock::new(LockConfig {
            poll_interval: Duration::from_millis(10),
            ..LockConfig::default()
        })
    }

    #[test]
    fn acquired_key_is_locked_until_ttl() {
        let lock = fast_lock();
        assert!(!lock.is_locked("bot"));

        lock.acquire("bot", Duration::from_millis(80)).unwrap();
        assert!(lock.is_locked("bot"));
        assert!(!lock.is_locked("other-bot"));

        thread::sleep(Duration::from_millis(120));
        assert!(!lock.is_locked("bot"));
    }

    #[test]
    fn acquire_default_uses_configured_ttl() {
        let lock = InMemoryIdentifyLock::new(LockConfig {
            ttl: Duration::from_millis(60),
            poll_interval: Duration::from_millis(10),
            ..LockConfig::default()
        });

        lock.acquire_default("bot").unwrap();
        assert!(lock.is_locked("bot"));

        thread::sleep(Duration::from_millis(100));
        assert!(!lock.is_locked("bot"));
    }

    #[test]
    fn wait_returns_once_lock_expires() {
        let lock = fast_lock();
        lock.acquire("bot", Duration::from_millis(50)).unwrap();

        let started = Instant::now();
        lock.wait_until_unlocked("bot");

        assert!(started.elapsed() >= Duration::from_millis(40));
        assert!(!lock.is_locked("bot"));
    }

    #[test]
    fn wait_on_free_key_returns_immediately() {
        let lock = InMemoryIdentifyLock::default();
        let started = Instant::now();
        lock.wait_until_unlocked("never-locked");
        assert!(started.elapsed() < Duration::from_secs(1));
    }
}
