//! Keyed values with expiry, used for the OTP send throttle and pending OTP codes.
//!
//! The Postgres store is shared by every server instance; the in-memory store is for
//! tests and single-node development.

use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::time::Instant;

use crate::{db::DbPool, error::AppResult};

#[async_trait]
pub trait TtlStore: Send + Sync {
    /// Claim `key` for `ttl`. Returns `false` while an unexpired entry holds it.
    async fn try_claim(&self, key: &str, ttl: Duration) -> AppResult<bool>;

    /// Store `value` under `key`, replacing any previous entry.
    async fn put(&self, key: &str, value: &str, ttl: Duration) -> AppResult<()>;

    /// Remove the entry and return its value if it had not expired.
    async fn take(&self, key: &str) -> AppResult<Option<String>>;

    async fn remove(&self, key: &str) -> AppResult<()>;
}

#[derive(Default)]
pub struct MemoryTtlStore {
    entries: DashMap<String, (String, Instant)>,
}

impl MemoryTtlStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn evict_expired(&self) {
        let now = Instant::now();
        self.entries.retain(|_, (_, expires)| *expires > now);
    }
}

#[async_trait]
impl TtlStore for MemoryTtlStore {
    async fn try_claim(&self, key: &str, ttl: Duration) -> AppResult<bool> {
        self.evict_expired();
        let now = Instant::now();
        let mut claimed = false;
        self.entries
            .entry(key.to_string())
            .and_modify(|(_, expires)| {
                if *expires <= now {
                    *expires = now + ttl;
                    claimed = true;
                }
            })
            .or_insert_with(|| {
                claimed = true;
                (String::new(), now + ttl)
            });
        Ok(claimed)
    }

    async fn put(&self, key: &str, value: &str, ttl: Duration) -> AppResult<()> {
        self.evict_expired();
        self.entries
            .insert(key.to_string(), (value.to_string(), Instant::now() + ttl));
        Ok(())
    }

    async fn take(&self, key: &str) -> AppResult<Option<String>> {
        let now = Instant::now();
        Ok(self
            .entries
            .remove(key)
            .filter(|(_, (_, expires))| *expires > now)
            .map(|(_, (value, _))| value))
    }

    async fn remove(&self, key: &str) -> AppResult<()> {
        self.entries.remove(key);
        Ok(())
    }
}

pub struct PgTtlStore {
    pool: DbPool,
}

impl PgTtlStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TtlStore for PgTtlStore {
    async fn try_claim(&self, key: &str, ttl: Duration) -> AppResult<bool> {
        let row: Option<(String,)> = sqlx::query_as(
            r#"
            INSERT INTO ttl_entries (key, value, expires_at)
            VALUES ($1, '', now() + make_interval(secs => $2))
            ON CONFLICT (key) DO UPDATE
                SET value = EXCLUDED.value, expires_at = EXCLUDED.expires_at
                WHERE ttl_entries.expires_at <= now()
            RETURNING key
            "#,
        )
        .bind(key)
        .bind(ttl.as_secs_f64())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.is_some())
    }

    async fn put(&self, key: &str, value: &str, ttl: Duration) -> AppResult<()> {
        sqlx::query("DELETE FROM ttl_entries WHERE expires_at <= now()")
            .execute(&self.pool)
            .await?;
        sqlx::query(
            r#"
            INSERT INTO ttl_entries (key, value, expires_at)
            VALUES ($1, $2, now() + make_interval(secs => $3))
            ON CONFLICT (key) DO UPDATE
                SET value = EXCLUDED.value, expires_at = EXCLUDED.expires_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(ttl.as_secs_f64())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn take(&self, key: &str) -> AppResult<Option<String>> {
        let row: Option<(String, bool)> = sqlx::query_as(
            "DELETE FROM ttl_entries WHERE key = $1 RETURNING value, expires_at > now()",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.filter(|(_, live)| *live).map(|(value, _)| value))
    }

    async fn remove(&self, key: &str) -> AppResult<()> {
        sqlx::query("DELETE FROM ttl_entries WHERE key = $1")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
