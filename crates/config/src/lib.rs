//! Barangay Config - Configuration management
//!
//! TOML file với defaults cho mọi field, validation, và env overrides
//! (`DATABASE_URL`, `BARANGAY_LISTEN`, `UPLOAD_ROOT`).

pub mod loader;
pub mod types;

pub use loader::{ConfigError, ConfigLoader};
pub use types::{DatabaseConfig, PortalConfig, SanctionsConfig, SecurityConfig, ServerConfig, StorageConfig};
