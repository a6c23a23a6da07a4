use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use tierlink_core::{EntitlementRecord, GuildId};

use super::{EntitlementStore, StoreError};

/// In-memory entitlement store.
///
/// Intended for tests/dev. `link_transfer` updates both records under a single
/// write lock, so it is atomic.
#[derive(Debug, Default)]
pub struct InMemoryEntitlementStore {
    records: RwLock<HashMap<GuildId, EntitlementRecord>>,
}

impl InMemoryEntitlementStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a record wholesale (seeding, billing stand-in).
    pub fn upsert(&self, record: EntitlementRecord) -> Result<(), StoreError> {
        let mut records = self.write()?;
        records.insert(record.guild_id, record);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.records.read().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn write(
        &self,
    ) -> Result<std::sync::RwLockWriteGuard<'_, HashMap<GuildId, EntitlementRecord>>, StoreError> {
        self.records
            .write()
            .map_err(|_| StoreError::Database("lock poisoned".to_string()))
    }
}

fn guarded<'a>(
    records: &'a mut HashMap<GuildId, EntitlementRecord>,
    guild_id: GuildId,
) -> Result<&'a mut EntitlementRecord, StoreError> {
    let record = records
        .get_mut(&guild_id)
        .ok_or(StoreError::NotFound(guild_id))?;
    if record.is_linked() {
        return Err(StoreError::Conflict(format!(
            "guild {guild_id} already carries a premium link"
        )));
    }
    Ok(record)
}

#[async_trait]
impl EntitlementStore for InMemoryEntitlementStore {
    async fn get_record(&self, guild_id: GuildId) -> Result<Option<EntitlementRecord>, StoreError> {
        let records = self
            .records
            .read()
            .map_err(|_| StoreError::Database("lock poisoned".to_string()))?;
        Ok(records.get(&guild_id).cloned())
    }

    async fn ensure_record(
        &self,
        guild_id: GuildId,
        name: Option<&str>,
    ) -> Result<EntitlementRecord, StoreError> {
        let mut records = self.write()?;
        let record = records
            .entry(guild_id)
            .or_insert_with(|| EntitlementRecord::new_free(guild_id));
        if let Some(name) = name {
            record.name = Some(name.to_string());
        }
        Ok(record.clone())
    }

    async fn set_inherits_from(&self, guild_id: GuildId, source: GuildId) -> Result<(), StoreError> {
        let mut records = self.write()?;
        guarded(&mut records, guild_id)?.inherits_from = Some(source);
        Ok(())
    }

    async fn set_transferred_to(&self, guild_id: GuildId, target: GuildId) -> Result<(), StoreError> {
        let mut records = self.write()?;
        guarded(&mut records, guild_id)?.transferred_to = Some(target);
        Ok(())
    }

    async fn link_transfer(&self, origin: GuildId, dest: GuildId) -> Result<(), StoreError> {
        let mut records = self.write()?;

        // Validate both rows before touching either.
        guarded(&mut records, dest)?;
        guarded(&mut records, origin)?;

        guarded(&mut records, dest)?.inherits_from = Some(origin);
        if let Some(o) = records.get_mut(&origin) {
            o.transferred_to = Some(dest);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tierlink_core::PremiumTier;

    fn id(n: u64) -> GuildId {
        GuildId::new(n)
    }

    #[tokio::test]
    async fn ensure_record_creates_free_record_once() {
        let store = InMemoryEntitlementStore::new();

        let created = store.ensure_record(id(1), Some("alpha")).await.unwrap();
        assert_eq!(created.tier, PremiumTier::Free);
        assert_eq!(created.name.as_deref(), Some("alpha"));

        store
            .upsert(created.clone().with_subscription(PremiumTier::Gold, 100))
            .unwrap();

        // Existing tier survives; only the name is refreshed.
        let again = store.ensure_record(id(1), Some("beta")).await.unwrap();
        assert_eq!(again.tier, PremiumTier::Gold);
        assert_eq!(again.name.as_deref(), Some("beta"));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn guarded_write_refuses_linked_row() {
        let store = InMemoryEntitlementStore::new();
        store.ensure_record(id(1), None).await.unwrap();

        store.set_inherits_from(id(1), id(2)).await.unwrap();
        let err = store.set_inherits_from(id(1), id(3)).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));

        let rec = store.get_record(id(1)).await.unwrap().unwrap();
        assert_eq!(rec.inherits_from, Some(id(2)));
    }

    #[tokio::test]
    async fn unknown_guild_is_not_found() {
        let store = InMemoryEntitlementStore::new();
        assert!(store.get_record(id(5)).await.unwrap().is_none());
        assert_eq!(
            store.set_transferred_to(id(5), id(6)).await,
            Err(StoreError::NotFound(id(5)))
        );
    }

    #[tokio::test]
    async fn link_transfer_is_all_or_nothing() {
        let store = InMemoryEntitlementStore::new();
        store.ensure_record(id(1), None).await.unwrap();
        let mut linked = EntitlementRecord::new_free(id(2));
        linked.transferred_to = Some(id(9));
        store.upsert(linked).unwrap();

        let err = store.link_transfer(id(1), id(2)).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));

        let origin = store.get_record(id(1)).await.unwrap().unwrap();
        assert!(!origin.is_linked());
    }
}
