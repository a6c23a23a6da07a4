//! Postgres-backed entitlement store.
//!
//! Reads and writes the `guilds` table:
//!
//! | column | type |
//! |--------|------|
//! | `guild_id` | `BIGINT PRIMARY KEY` |
//! | `guild_name` | `TEXT NULL` |
//! | `premium` | `SMALLINT` (0 free, 1 standard, 2 gold) |
//! | `tx_time_unix` | `INTEGER NULL` |
//! | `transferred_to` | `BIGINT NULL` |
//! | `inherits_from` | `BIGINT NULL` |
//!
//! ## Error Mapping
//!
//! | SQLx Error | StoreError |
//! |------------|------------|
//! | Database, code `23505` (unique violation) | `Conflict` |
//! | Database (other) | `Database` |
//! | PoolClosed / PoolTimedOut | `Database` |
//! | Row decode failure | `Decode` |
//! | Other | `Database` |
//!
//! ## Transfers
//!
//! `link_transfer` runs both guarded updates inside one transaction (destination
//! first, then origin). Either both links are committed or neither is.

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::{PgConnection, PgPool, Row};
use tracing::{info, instrument};

use tierlink_core::{EntitlementRecord, GuildId, PremiumTier};

use super::{EntitlementStore, StoreError};

const SELECT_GUILD: &str = r#"
    SELECT guild_id, guild_name, premium, tx_time_unix, transferred_to, inherits_from
    FROM guilds
    WHERE guild_id = $1
"#;

const SET_INHERITS_FROM: &str = r#"
    UPDATE guilds
    SET inherits_from = $2
    WHERE guild_id = $1 AND inherits_from IS NULL AND transferred_to IS NULL
"#;

const SET_TRANSFERRED_TO: &str = r#"
    UPDATE guilds
    SET transferred_to = $2
    WHERE guild_id = $1 AND inherits_from IS NULL AND transferred_to IS NULL
"#;

/// Postgres entitlement store.
///
/// Uses a shared SQLx pool; each store call checks out one connection for its
/// duration and returns it on completion.
#[derive(Debug, Clone)]
pub struct PostgresEntitlementStore {
    pool: Arc<PgPool>,
}

impl PostgresEntitlementStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Connect a fresh pool to `database_url`.
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPool::connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool))
    }

    async fn acquire(
        &self,
        operation: &str,
    ) -> Result<sqlx::pool::PoolConnection<sqlx::Postgres>, StoreError> {
        self.pool
            .acquire()
            .await
            .map_err(|e| map_sqlx_error(operation, e))
    }
}

#[async_trait]
impl EntitlementStore for PostgresEntitlementStore {
    #[instrument(skip(self), fields(guild_id = %guild_id), err)]
    async fn get_record(&self, guild_id: GuildId) -> Result<Option<EntitlementRecord>, StoreError> {
        let mut conn = self.acquire("get_record").await?;
        fetch_record(&mut conn, guild_id).await
    }

    #[instrument(skip(self), fields(guild_id = %guild_id), err)]
    async fn ensure_record(
        &self,
        guild_id: GuildId,
        name: Option<&str>,
    ) -> Result<EntitlementRecord, StoreError> {
        let row = sqlx::query(
            r#"
            INSERT INTO guilds (guild_id, guild_name, premium)
            VALUES ($1, $2, $3)
            ON CONFLICT (guild_id)
            DO UPDATE SET guild_name = COALESCE(EXCLUDED.guild_name, guilds.guild_name)
            RETURNING guild_id, guild_name, premium, tx_time_unix, transferred_to, inherits_from
            "#,
        )
        .bind(to_db_id(guild_id)?)
        .bind(name)
        .bind(PremiumTier::Free.code())
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("ensure_record", e))?;

        decode_record(&row)
    }

    #[instrument(skip(self), fields(guild_id = %guild_id, source = %source), err)]
    async fn set_inherits_from(&self, guild_id: GuildId, source: GuildId) -> Result<(), StoreError> {
        let mut conn = self.acquire("set_inherits_from").await?;
        guarded_update(&mut conn, SET_INHERITS_FROM, guild_id, source, "set_inherits_from").await?;
        info!(%guild_id, %source, "marked guild as inheriting premium");
        Ok(())
    }

    #[instrument(skip(self), fields(guild_id = %guild_id, target = %target), err)]
    async fn set_transferred_to(&self, guild_id: GuildId, target: GuildId) -> Result<(), StoreError> {
        let mut conn = self.acquire("set_transferred_to").await?;
        guarded_update(&mut conn, SET_TRANSFERRED_TO, guild_id, target, "set_transferred_to").await?;
        info!(%guild_id, %target, "marked guild as transferred");
        Ok(())
    }

    #[instrument(skip(self), fields(origin = %origin, dest = %dest), err)]
    async fn link_transfer(&self, origin: GuildId, dest: GuildId) -> Result<(), StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        // Dropping `tx` without commit rolls back.
        guarded_update(&mut tx, SET_INHERITS_FROM, dest, origin, "link_transfer.dest").await?;
        guarded_update(&mut tx, SET_TRANSFERRED_TO, origin, dest, "link_transfer.origin").await?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;

        info!(%origin, %dest, "premium transfer committed");
        Ok(())
    }
}

async fn fetch_record(
    conn: &mut PgConnection,
    guild_id: GuildId,
) -> Result<Option<EntitlementRecord>, StoreError> {
    let row = sqlx::query(SELECT_GUILD)
        .bind(to_db_id(guild_id)?)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| map_sqlx_error("get_record", e))?;

    row.as_ref().map(decode_record).transpose()
}

/// Run one guarded link update; zero affected rows means missing or already linked.
async fn guarded_update(
    conn: &mut PgConnection,
    sql: &'static str,
    guild_id: GuildId,
    link: GuildId,
    operation: &str,
) -> Result<(), StoreError> {
    let result = sqlx::query(sql)
        .bind(to_db_id(guild_id)?)
        .bind(to_db_id(link)?)
        .execute(&mut *conn)
        .await
        .map_err(|e| map_sqlx_error(operation, e))?;

    if result.rows_affected() == 1 {
        return Ok(());
    }

    match fetch_record(conn, guild_id).await? {
        None => Err(StoreError::NotFound(guild_id)),
        Some(_) => Err(StoreError::Conflict(format!(
            "guild {guild_id} already carries a premium link ({operation})"
        ))),
    }
}

fn to_db_id(id: GuildId) -> Result<i64, StoreError> {
    i64::try_from(id.get()).map_err(|_| StoreError::Decode(format!("guild id {id} exceeds BIGINT range")))
}

fn from_db_id(raw: i64) -> Result<GuildId, StoreError> {
    u64::try_from(raw)
        .map(GuildId::new)
        .map_err(|_| StoreError::Decode(format!("negative guild id {raw}")))
}

fn decode_record(row: &sqlx::postgres::PgRow) -> Result<EntitlementRecord, StoreError> {
    let decode = |e: sqlx::Error| StoreError::Decode(e.to_string());

    let guild_id: i64 = row.try_get("guild_id").map_err(decode)?;
    let name: Option<String> = row.try_get("guild_name").map_err(decode)?;
    let premium: i16 = row.try_get("premium").map_err(decode)?;
    let tx_time_unix: Option<i32> = row.try_get("tx_time_unix").map_err(decode)?;
    let transferred_to: Option<i64> = row.try_get("transferred_to").map_err(decode)?;
    let inherits_from: Option<i64> = row.try_get("inherits_from").map_err(decode)?;

    Ok(EntitlementRecord {
        guild_id: from_db_id(guild_id)?,
        name,
        tier: PremiumTier::try_from(premium).map_err(|e| StoreError::Decode(e.to_string()))?,
        subscription_start_unix: tx_time_unix.map(i64::from),
        transferred_to: transferred_to.map(from_db_id).transpose()?,
        inherits_from: inherits_from.map(from_db_id).transpose()?,
    })
}

/// Map SQLx errors to StoreError.
fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code().as_deref() {
                Some("23505") => StoreError::Conflict(msg),
                _ => StoreError::Database(msg),
            }
        }
        sqlx::Error::PoolClosed => {
            StoreError::Database(format!("connection pool closed in {}", operation))
        }
        sqlx::Error::PoolTimedOut => {
            StoreError::Database(format!("connection pool timed out in {}", operation))
        }
        sqlx::Error::ColumnDecode { .. } | sqlx::Error::ColumnNotFound(_) => {
            StoreError::Decode(format!("{} in {}", err, operation))
        }
        _ => StoreError::Database(format!("sqlx error in {}: {}", operation, err)),
    }
}
