//! Connection pool và migrations

use crate::error::PersistenceResult;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use std::time::Duration;

/// Writers wait this long for the SQLite write lock
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Pool sizing and database location
#[derive(Debug, Clone)]
pub struct PoolSettings {
    /// SQLite URL, ví dụ "sqlite:data/barangay.db?mode=rwc"
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout: Duration,
}

impl PoolSettings {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            url: "sqlite:data/barangay.db?mode=rwc".to_string(),
            max_connections: 10,
            min_connections: 1,
            acquire_timeout: Duration::from_secs(5),
        }
    }
}

/// Tạo connection pool (file được tạo nếu chưa có)
pub async fn create_pool(settings: &PoolSettings) -> PersistenceResult<SqlitePool> {
    let options = SqliteConnectOptions::from_str(&settings.url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .busy_timeout(BUSY_TIMEOUT);

    let pool = SqlitePoolOptions::new()
        .max_connections(settings.max_connections)
        .min_connections(settings.min_connections)
        .acquire_timeout(settings.acquire_timeout)
        .test_before_acquire(true)
        .connect_with(options)
        .await?;

    tracing::debug!(url = %settings.url, "Opened SQLite pool");
    Ok(pool)
}

/// In-memory database. Một connection duy nhất, không bao giờ bị đóng,
/// vì mỗi connection ":memory:" là một database riêng.
pub async fn create_memory_pool() -> PersistenceResult<SqlitePool> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;
    Ok(pool)
}

/// Chạy migrations
pub async fn run_migrations(pool: &SqlitePool) -> PersistenceResult<()> {
    sqlx::migrate!("../../migrations").run(pool).await?;
    Ok(())
}

/// Tạo database mới với schema
pub async fn init_database(settings: &PoolSettings) -> PersistenceResult<SqlitePool> {
    let pool = create_pool(settings).await?;
    run_migrations(&pool).await?;
    tracing::info!(url = %settings.url, "Database initialized");
    Ok(pool)
}
