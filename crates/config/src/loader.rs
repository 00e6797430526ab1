//! Configuration loader

use std::net::SocketAddr;
use std::path::Path;
use thiserror::Error;

use crate::types::PortalConfig;

/// Configuration loading errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// File not found
    #[error("config file not found: {0}")]
    NotFound(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// Validation error
    #[error("validation error: {0}")]
    Validation(String),
}

/// Loads and validates [`PortalConfig`]
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from file
    pub fn load_file<P: AsRef<Path>>(path: P) -> Result<PortalConfig, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }

        let content = std::fs::read_to_string(path)?;
        let config = Self::load_str(&content)?;
        tracing::debug!(path = %path.display(), "Configuration loaded");
        Ok(config)
    }

    /// Load configuration from string
    pub fn load_str(content: &str) -> Result<PortalConfig, ConfigError> {
        let config: PortalConfig = toml::from_str(content)?;
        Self::validate(&config)?;
        Ok(config)
    }

    /// File if given, defaults otherwise; env overrides applied on top.
    pub fn load(path: Option<&Path>) -> Result<PortalConfig, ConfigError> {
        let mut config = match path {
            Some(path) => Self::load_file(path)?,
            None => PortalConfig::default(),
        };
        Self::apply_env_overrides(&mut config)?;
        Ok(config)
    }

    /// Apply `DATABASE_URL`, `BARANGAY_LISTEN` and `UPLOAD_ROOT`
    pub fn apply_env_overrides(config: &mut PortalConfig) -> Result<(), ConfigError> {
        Self::apply_overrides(config, |key| std::env::var(key).ok())
    }

    /// Same as [`apply_env_overrides`](Self::apply_env_overrides) with an
    /// arbitrary variable source.
    pub fn apply_overrides<F>(config: &mut PortalConfig, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("DATABASE_URL") {
            config.database.url = url;
        }
        if let Some(listen) = lookup("BARANGAY_LISTEN") {
            config.server.listen = listen.parse::<SocketAddr>().map_err(|e| {
                ConfigError::Validation(format!("BARANGAY_LISTEN '{}': {}", listen, e))
            })?;
        }
        if let Some(root) = lookup("UPLOAD_ROOT") {
            config.storage.upload_root = root.into();
        }
        Self::validate(config)
    }

    /// Validate configuration
    pub fn validate(config: &PortalConfig) -> Result<(), ConfigError> {
        let db = &config.database;
        if db.url.trim().is_empty() {
            return Err(ConfigError::Validation("database.url is empty".to_string()));
        }
        if db.max_connections == 0 {
            return Err(ConfigError::Validation(
                "database.max_connections must be at least 1".to_string(),
            ));
        }
        if db.min_connections > db.max_connections {
            return Err(ConfigError::Validation(format!(
                "database.min_connections ({}) exceeds max_connections ({})",
                db.min_connections, db.max_connections
            )));
        }

        if !(4..=31).contains(&config.security.bcrypt_cost) {
            return Err(ConfigError::Validation(format!(
                "security.bcrypt_cost must be within 4..=31, got {}",
                config.security.bcrypt_cost
            )));
        }
        if config.security.session_cookie.trim().is_empty() {
            return Err(ConfigError::Validation(
                "security.session_cookie is empty".to_string(),
            ));
        }

        if config.sanctions.sweep_interval_secs == 0 {
            return Err(ConfigError::Validation(
                "sanctions.sweep_interval_secs must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = ConfigLoader::load_str("").unwrap();
        assert_eq!(config, PortalConfig::default());
        assert_eq!(config.server.listen.port(), 8080);
        assert_eq!(config.database.url, "sqlite:data/barangay.db?mode=rwc");
        assert_eq!(config.database.max_connections, 10);
        assert_eq!(config.security.bcrypt_cost, 12);
        assert_eq!(config.security.session_cookie, "barangay_session");
        assert_eq!(config.sanctions.sweep_interval().as_secs(), 5);
        assert_eq!(config.storage.upload_root, std::path::PathBuf::from("static"));
    }

    #[test]
    fn test_load_string() {
        let config_str = r#"
[server]
listen = "0.0.0.0:9000"

[database]
url = "sqlite::memory:"
max_connections = 4

[sanctions]
sweep_interval_secs = 60
"#;

        let config = ConfigLoader::load_str(config_str).unwrap();
        assert_eq!(config.server.listen.port(), 9000);
        assert_eq!(config.server.log_level, "info");
        assert_eq!(config.database.max_connections, 4);
        assert_eq!(config.database.min_connections, 1);
        assert_eq!(config.sanctions.sweep_interval_secs, 60);
    }

    #[test]
    fn test_validation_errors() {
        for bad in [
            "[database]\nmax_connections = 0",
            "[database]\nmin_connections = 20",
            "[security]\nbcrypt_cost = 2",
            "[security]\nsession_cookie = \"\"",
            "[sanctions]\nsweep_interval_secs = 0",
        ] {
            let result = ConfigLoader::load_str(bad);
            assert!(matches!(result, Err(ConfigError::Validation(_))), "{bad}");
        }

        assert!(matches!(
            ConfigLoader::load_str("[server]\nlisten = 8080"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_load_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[storage]\nupload_root = \"/srv/barangay\"").unwrap();

        let config = ConfigLoader::load_file(file.path()).unwrap();
        assert_eq!(config.storage.upload_root, std::path::PathBuf::from("/srv/barangay"));

        let missing = ConfigLoader::load_file("/nonexistent/barangay.toml");
        assert!(matches!(missing, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_overrides() {
        let mut config = PortalConfig::default();
        ConfigLoader::apply_overrides(&mut config, |key| match key {
            "DATABASE_URL" => Some("sqlite:other.db".to_string()),
            "BARANGAY_LISTEN" => Some("0.0.0.0:3000".to_string()),
            _ => None,
        })
        .unwrap();
        assert_eq!(config.database.url, "sqlite:other.db");
        assert_eq!(config.server.listen.port(), 3000);

        let result = ConfigLoader::apply_overrides(&mut config, |key| {
            (key == "BARANGAY_LISTEN").then(|| "not-an-address".to_string())
        });
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }
}
