//! Redis-backed identify lock (`SET ... PX` / `EXISTS`).

use std::thread;
use std::time::Duration;

use tracing::{info, instrument, warn};

use super::{IdentifyLock, LockConfig, LockError};

/// Identify lock shared across processes through Redis.
#[derive(Debug, Clone)]
pub struct RedisIdentifyLock {
    client: redis::Client,
    config: LockConfig,
}

impl RedisIdentifyLock {
    pub fn new(redis_url: impl AsRef<str>, config: LockConfig) -> Result<Self, LockError> {
        let client = redis::Client::open(redis_url.as_ref())
            .map_err(|e| LockError::Backend(e.to_string()))?;
        Ok(Self { client, config })
    }

    fn connection(&self) -> Result<redis::Connection, LockError> {
        self.client
            .get_connection()
            .map_err(|e| LockError::Backend(e.to_string()))
    }
}

impl IdentifyLock for RedisIdentifyLock {
    #[instrument(skip(self), err)]
    fn acquire(&self, token_key: &str, ttl: Duration) -> Result<(), LockError> {
        let mut conn = self.connection()?;

        // PX keeps sub-second TTLs exact; Redis rejects a zero expiry.
        let ttl_ms = ttl.as_millis().max(1) as u64;
        let _: () = redis::cmd("SET")
            .arg(self.config.key_for(token_key))
            .arg("")
            .arg("PX")
            .arg(ttl_ms)
            .query(&mut conn)
            .map_err(|e| LockError::Backend(e.to_string()))?;

        info!(ttl_ms, "locked token for identify");
        Ok(())
    }

    fn config(&self) -> &LockConfig {
        &self.config
    }

    fn is_locked(&self, token_key: &str) -> bool {
        let mut conn = match self.connection() {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, "identify lock check failed; treating as unlocked");
                return false;
            }
        };

        let exists: Result<i64, _> = redis::cmd("EXISTS")
            .arg(self.config.key_for(token_key))
            .query(&mut conn);

        match exists {
            Ok(n) => n == 1,
            Err(e) => {
                warn!(error = %e, "identify lock check failed; treating as unlocked");
                false
            }
        }
    }

    fn wait_until_unlocked(&self, token_key: &str) {
        while self.is_locked(token_key) {
            info!(
                poll_secs = self.config.poll_interval.as_secs(),
                "waiting for token identify lock"
            );
            thread::sleep(self.config.poll_interval);
        }
    }
}
