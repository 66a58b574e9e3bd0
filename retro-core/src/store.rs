//! Per-thread state storage: daily entries plus the last generated texts.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool};
use tokio::sync::RwLock;

use crate::config::{StoreBackend, StoreConfig};
use crate::error::RetroError;
use crate::models::{DailyEntry, ThreadState};

#[async_trait]
pub trait ThreadStore: Send + Sync {
    /// Append an entry and return the thread's entry count afterwards.
    async fn append_daily(&self, thread_id: &str, entry: DailyEntry) -> Result<usize, RetroError>;

    /// Load a thread. Unknown threads load as empty state.
    async fn load(&self, thread_id: &str) -> Result<ThreadState, RetroError>;

    async fn set_retrospective(&self, thread_id: &str, text: &str) -> Result<(), RetroError>;

    async fn set_insights(&self, thread_id: &str, text: &str) -> Result<(), RetroError>;

    /// Backend name for health output.
    fn backend_name(&self) -> &str;
}

// ============================================================================
// In-memory store
// ============================================================================

#[derive(Debug, Default)]
pub struct MemoryThreadStore {
    threads: RwLock<HashMap<String, ThreadState>>,
}

impl MemoryThreadStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ThreadStore for MemoryThreadStore {
    async fn append_daily(&self, thread_id: &str, entry: DailyEntry) -> Result<usize, RetroError> {
        let mut threads = self.threads.write().await;
        let state = threads
            .entry(thread_id.to_string())
            .or_insert_with(|| ThreadState::empty(thread_id));
        state.daily_summaries.push(entry);
        Ok(state.daily_summaries.len())
    }

    async fn load(&self, thread_id: &str) -> Result<ThreadState, RetroError> {
        let threads = self.threads.read().await;
        Ok(threads
            .get(thread_id)
            .cloned()
            .unwrap_or_else(|| ThreadState::empty(thread_id)))
    }

    async fn set_retrospective(&self, thread_id: &str, text: &str) -> Result<(), RetroError> {
        let mut threads = self.threads.write().await;
        threads
            .entry(thread_id.to_string())
            .or_insert_with(|| ThreadState::empty(thread_id))
            .retrospective_summary = Some(text.to_string());
        Ok(())
    }

    async fn set_insights(&self, thread_id: &str, text: &str) -> Result<(), RetroError> {
        let mut threads = self.threads.write().await;
        threads
            .entry(thread_id.to_string())
            .or_insert_with(|| ThreadState::empty(thread_id))
            .actionable_insights = Some(text.to_string());
        Ok(())
    }

    fn backend_name(&self) -> &str {
        "memory"
    }
}

// ============================================================================
// PostgreSQL store
// ============================================================================

pub async fn create_pool(config: &StoreConfig) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.url)
        .await
}

pub async fn health_check(pool: &PgPool) -> Result<String, sqlx::Error> {
    let row: (String,) = sqlx::query_as("SELECT version()").fetch_one(pool).await?;
    Ok(row.0)
}

#[derive(Debug, Clone)]
pub struct PgThreadStore {
    pool: PgPool,
}

impl PgThreadStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn ensure_schema(&self) -> Result<(), RetroError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS retro_threads (
                thread_id TEXT PRIMARY KEY,
                retrospective_summary TEXT,
                actionable_insights TEXT,
                updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS retro_daily_entries (
                id BIGSERIAL PRIMARY KEY,
                thread_id TEXT NOT NULL REFERENCES retro_threads(thread_id) ON DELETE CASCADE,
                text TEXT NOT NULL,
                submitted_at TIMESTAMPTZ NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn touch_thread(&self, tx: &mut sqlx::PgConnection, thread_id: &str) -> Result<(), RetroError> {
        sqlx::query(
            "INSERT INTO retro_threads (thread_id) VALUES ($1)
             ON CONFLICT (thread_id) DO UPDATE SET updated_at = now()",
        )
        .bind(thread_id)
        .execute(tx)
        .await?;
        Ok(())
    }

    async fn set_column(&self, thread_id: &str, column: &str, text: &str) -> Result<(), RetroError> {
        // Column names come from the two callers below, never from input.
        let sql = format!(
            "INSERT INTO retro_threads (thread_id, {col}) VALUES ($1, $2)
             ON CONFLICT (thread_id) DO UPDATE SET {col} = EXCLUDED.{col}, updated_at = now()",
            col = column
        );
        sqlx::query(&sql)
            .bind(thread_id)
            .bind(text)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl ThreadStore for PgThreadStore {
    async fn append_daily(&self, thread_id: &str, entry: DailyEntry) -> Result<usize, RetroError> {
        let mut tx = self.pool.begin().await?;

        self.touch_thread(&mut *tx, thread_id).await?;

        sqlx::query(
            "INSERT INTO retro_daily_entries (thread_id, text, submitted_at) VALUES ($1, $2, $3)",
        )
        .bind(thread_id)
        .bind(&entry.text)
        .bind(entry.submitted_at)
        .execute(&mut *tx)
        .await?;

        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*)::bigint FROM retro_daily_entries WHERE thread_id = $1")
                .bind(thread_id)
                .fetch_one(&mut *tx)
                .await?;

        tx.commit().await?;

        tracing::debug!(thread_id, count, "Stored daily entry");
        Ok(count as usize)
    }

    async fn load(&self, thread_id: &str) -> Result<ThreadState, RetroError> {
        let texts: Option<(Option<String>, Option<String>)> = sqlx::query_as(
            "SELECT retrospective_summary, actionable_insights FROM retro_threads WHERE thread_id = $1",
        )
        .bind(thread_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some((retrospective_summary, actionable_insights)) = texts else {
            return Ok(ThreadState::empty(thread_id));
        };

        let daily_summaries: Vec<DailyEntry> = sqlx::query_as(
            "SELECT text, submitted_at FROM retro_daily_entries WHERE thread_id = $1 ORDER BY id",
        )
        .bind(thread_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(ThreadState {
            thread_id: thread_id.to_string(),
            daily_summaries,
            retrospective_summary,
            actionable_insights,
        })
    }

    async fn set_retrospective(&self, thread_id: &str, text: &str) -> Result<(), RetroError> {
        self.set_column(thread_id, "retrospective_summary", text).await
    }

    async fn set_insights(&self, thread_id: &str, text: &str) -> Result<(), RetroError> {
        self.set_column(thread_id, "actionable_insights", text).await
    }

    fn backend_name(&self) -> &str {
        "postgres"
    }
}

/// Build the configured store. The Postgres backend connects and creates its
/// tables before returning.
pub async fn create_store(config: &StoreConfig) -> Result<Arc<dyn ThreadStore>, RetroError> {
    match config.backend {
        StoreBackend::Memory => Ok(Arc::new(MemoryThreadStore::new())),
        StoreBackend::Postgres => {
            let pool = create_pool(config).await?;
            let version = health_check(&pool).await?;
            tracing::info!(postgresql = %version, "Connected thread store");
            let store = PgThreadStore::new(pool);
            store.ensure_schema().await?;
            Ok(Arc::new(store))
        }
    }
}
