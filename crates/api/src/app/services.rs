use std::sync::Arc;

use tierlink_infra::identify_lock::IdentifyLock;
use tierlink_infra::{
    EntitlementStore, InMemoryEntitlementStore, PostgresEntitlementStore, Settings, TransferService,
};

/// Store handle shared by all requests.
pub type SharedStore = Arc<dyn EntitlementStore>;

/// Transfer service as wired into the router.
pub type PremiumService = TransferService<SharedStore>;

/// Pick the store from settings: Postgres when `DATABASE_URL` is set, otherwise in-memory.
pub async fn build_service(settings: &Settings) -> anyhow::Result<Arc<PremiumService>> {
    let store: SharedStore = match &settings.database_url {
        Some(url) => {
            let store = PostgresEntitlementStore::connect(url).await?;
            tracing::info!("using postgres entitlement store");
            Arc::new(store)
        }
        None => {
            tracing::warn!("DATABASE_URL not set; using in-memory entitlement store");
            Arc::new(InMemoryEntitlementStore::new())
        }
    };

    Ok(Arc::new(TransferService::new(store, settings.durations)))
}

/// Identify lock shared with gateway shards (Redis when built with the `redis` feature).
#[cfg(feature = "redis")]
pub fn build_identify_lock(settings: &Settings) -> anyhow::Result<Arc<dyn IdentifyLock>> {
    let lock = tierlink_infra::identify_lock::RedisIdentifyLock::new(
        &settings.redis_url,
        settings.lock.clone(),
    )?;
    tracing::info!(prefix = %settings.lock.key_prefix, "using redis identify lock");
    Ok(Arc::new(lock))
}

#[cfg(not(feature = "redis"))]
pub fn build_identify_lock(settings: &Settings) -> anyhow::Result<Arc<dyn IdentifyLock>> {
    tracing::warn!("built without redis; identify lock is process-local");
    Ok(Arc::new(
        tierlink_infra::identify_lock::InMemoryIdentifyLock::new(settings.lock.clone()),
    ))
}

#[cfg(all(test, not(feature = "redis")))]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn local_identify_lock_uses_configured_ttl() {
        let mut settings = Settings::default();
        settings.lock.ttl = Duration::from_millis(60);
        settings.lock.key_prefix = "shard".to_string();

        let lock = build_identify_lock(&settings).unwrap();
        assert_eq!(lock.config(), &settings.lock);

        lock.acquire_default("token-a").unwrap();
        assert!(lock.is_locked("token-a"));
        assert!(!lock.is_locked("token-b"));

        std::thread::sleep(Duration::from_millis(100));
        assert!(!lock.is_locked("token-a"));
    }
}
