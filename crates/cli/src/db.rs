//! Database connection, initialization and status

use anyhow::{Context, Result};
use barangay_business::ServiceSettings;
use barangay_config::PortalConfig;
use barangay_core::Role;
use barangay_persistence::{AccountRepo, Database, PoolSettings, ReceiptRepo, RequestRepo, SanctionRepo};
use std::path::Path;

pub fn pool_settings(config: &PortalConfig) -> PoolSettings {
    PoolSettings {
        url: config.database.url.clone(),
        max_connections: config.database.max_connections,
        min_connections: config.database.min_connections,
        acquire_timeout: config.database.acquire_timeout(),
    }
}

pub fn service_settings(config: &PortalConfig) -> ServiceSettings {
    ServiceSettings {
        bcrypt_cost: config.security.bcrypt_cost,
        upload_root: config.storage.upload_root.clone(),
    }
}

/// File path behind a `sqlite:` URL, if it names a file
fn database_file(url: &str) -> Option<&Path> {
    let rest = url.strip_prefix("sqlite://").or_else(|| url.strip_prefix("sqlite:"))?;
    let path = rest.split('?').next().unwrap_or(rest);
    if path.is_empty() || path.starts_with(":memory:") {
        None
    } else {
        Some(Path::new(path))
    }
}

/// Connect (creating the file and its directory) and run migrations
pub async fn connect(config: &PortalConfig) -> Result<Database> {
    if let Some(parent) = database_file(&config.database.url).and_then(Path::parent) {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create database directory {}", parent.display()))?;
        }
    }

    Database::connect(&pool_settings(config))
        .await
        .with_context(|| format!("Failed to open database {}", config.database.url))
}

/// Initialize the database with schema
pub async fn init_database(config: &PortalConfig) -> Result<()> {
    println!("📦 Running migrations...");
    let db = connect(config).await?;
    db.close().await;
    Ok(())
}

async fn count_table(db: &Database, table: &str) -> i64 {
    let sql = format!("SELECT COUNT(*) FROM {table}");
    sqlx::query_scalar(&sql).fetch_one(db.pool()).await.unwrap_or(0)
}

/// Show database status
pub async fn show_status(config: &PortalConfig) -> Result<()> {
    let db = connect(config).await?;

    println!("📊 Database Status");
    println!("   URL: {}", config.database.url);
    println!();

    for role in Role::ALL {
        let count = AccountRepo::count(db.pool(), role).await?;
        println!("   {:<18}{}", format!("{}:", role.as_str()), count);
    }
    println!("   {:<18}{}", "request_document:", RequestRepo::count(db.pool()).await?);
    println!("   {:<18}{}", "receipt:", ReceiptRepo::count(db.pool()).await?);
    println!("   {:<18}{}", "sanctions:", SanctionRepo::count(db.pool()).await?);

    // Community tables have no repo-level counters.
    for table in ["community_report", "community_update", "comments", "update_votes"] {
        println!("   {:<18}{}", format!("{table}:"), count_table(&db, table).await);
    }

    db.close().await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use barangay_config::ConfigLoader;

    #[test]
    fn test_database_file() {
        assert_eq!(
            database_file("sqlite:data/barangay.db?mode=rwc"),
            Some(Path::new("data/barangay.db"))
        );
        assert_eq!(database_file("sqlite:///var/lib/b.db"), Some(Path::new("/var/lib/b.db")));
        assert_eq!(database_file("sqlite::memory:"), None);
        assert_eq!(database_file("postgres://x"), None);
    }

    #[test]
    fn test_settings_follow_config() {
        let config = ConfigLoader::load_str("[database]\nmax_connections = 3\n[security]\nbcrypt_cost = 6").unwrap();
        let pool = pool_settings(&config);
        assert_eq!(pool.max_connections, 3);
        assert_eq!(pool.acquire_timeout.as_secs(), 5);
        assert_eq!(service_settings(&config).bcrypt_cost, 6);
    }

    #[tokio::test]
    async fn test_connect_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("barangay.db");
        let mut config = PortalConfig::default();
        config.database.url = format!("sqlite:{}?mode=rwc", path.display());

        let db = connect(&config).await.unwrap();
        assert_eq!(RequestRepo::count(db.pool()).await.unwrap(), 0);
        db.close().await;
        assert!(path.exists());
    }
}
