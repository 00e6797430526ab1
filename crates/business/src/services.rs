//! Service context shared by every business service

use barangay_persistence::Database;
use sqlx::SqlitePool;
use std::path::{Path, PathBuf};

/// Tunables the services need besides the pool
#[derive(Debug, Clone)]
pub struct ServiceSettings {
    /// bcrypt work factor cho password hashing
    pub bcrypt_cost: u32,
    /// Root directory; uploads land under `<root>/uploads/documents/<resident_id>/`
    pub upload_root: PathBuf,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            bcrypt_cost: bcrypt::DEFAULT_COST,
            upload_root: PathBuf::from("static"),
        }
    }
}

/// Context for business operations - contains database access
#[derive(Debug, Clone)]
pub struct ServiceContext {
    pool: SqlitePool,
    settings: ServiceSettings,
}

impl ServiceContext {
    /// Create new service context from database
    pub fn new(db: &Database) -> Self {
        Self::with_settings(db, ServiceSettings::default())
    }

    pub fn with_settings(db: &Database, settings: ServiceSettings) -> Self {
        Self {
            pool: db.pool().clone(),
            settings,
        }
    }

    /// Get database pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn bcrypt_cost(&self) -> u32 {
        self.settings.bcrypt_cost
    }

    pub fn upload_root(&self) -> &Path {
        &self.settings.upload_root
    }
}
