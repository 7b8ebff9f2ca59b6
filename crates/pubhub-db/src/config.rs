//! # Manager Configuration
//!
//! File, environment and default settings used to initialize a manager.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     PUBHUB_DB_BACKEND=sqlite                                           │
//! │     PUBHUB_DB_PATH=/var/lib/pubhub/pubhub.db                           │
//! │     PUBHUB_DB_IN_MEMORY=true                                           │
//! │     PUBHUB_DB_MAX_CONNECTIONS=8                                        │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/pubhub/pubhub.toml (Linux)                               │
//! │     ~/Library/Application Support/com.pubhub.pubhub/pubhub.toml (macOS)│
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     sqlite, database file in the platform data directory               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # pubhub.toml
//! [manager]
//! backend = "sqlite"
//!
//! [database]
//! path = "/path/to/pubhub.db"   # optional
//! in_memory = false
//! max_connections = 5
//! min_connections = 1
//! connect_timeout_secs = 30
//! run_migrations = true
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use crate::manager::DbType;
use crate::pool::DbConfig;

/// File name of the configuration file inside the config directory.
const CONFIG_FILE_NAME: &str = "pubhub.toml";

/// File name of the default database inside the data directory.
const DATABASE_FILE_NAME: &str = "pubhub.db";

// =============================================================================
// Manager Settings
// =============================================================================

/// Which backend the builder should produce.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagerSettings {
    #[serde(default)]
    pub backend: DbType,
}

// =============================================================================
// Database Settings
// =============================================================================

/// Storage session settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// Database file. Defaults to `pubhub.db` in the platform data directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,

    /// Use a private in-memory database instead of a file.
    #[serde(default)]
    pub in_memory: bool,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    #[serde(default = "default_true")]
    pub run_migrations: bool,
}

fn default_max_connections() -> u32 {
    5
}

fn default_min_connections() -> u32 {
    1
}

fn default_connect_timeout() -> u64 {
    30
}

fn default_true() -> bool {
    true
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: None,
            in_memory: false,
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connect_timeout_secs: default_connect_timeout(),
            run_migrations: true,
        }
    }
}

// =============================================================================
// Main Configuration
// =============================================================================

/// Complete manager configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagerConfig {
    #[serde(default)]
    pub manager: ManagerSettings,

    #[serde(default)]
    pub database: DatabaseSettings,
}

impl ManagerConfig {
    /// Configuration for a private in-memory database.
    pub fn in_memory() -> Self {
        let mut config = Self::default();
        config.database.in_memory = true;
        config
    }

    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (pubhub.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> DbResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading manager config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns defaults (plus environment) if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load manager config: {}. Using defaults.", e);
            let mut config = Self::default();
            config.apply_env_overrides();
            if config.validate().is_err() {
                return Self::default();
            }
            config
        })
    }

    /// Saves configuration to file as pretty TOML.
    pub fn save(&self, config_path: Option<PathBuf>) -> DbResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| DbError::InvalidConfig("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)?;

        info!(?path, "Manager config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> DbResult<()> {
        let db = &self.database;

        if db.max_connections == 0 {
            return Err(DbError::InvalidConfig(
                "max_connections must be greater than 0".into(),
            ));
        }

        if db.min_connections > db.max_connections {
            return Err(DbError::InvalidConfig(format!(
                "min_connections ({}) exceeds max_connections ({})",
                db.min_connections, db.max_connections
            )));
        }

        if db.connect_timeout_secs == 0 {
            return Err(DbError::InvalidConfig(
                "connect_timeout_secs must be greater than 0".into(),
            ));
        }

        if let Some(ref path) = db.path {
            if path.as_os_str().is_empty() {
                return Err(DbError::InvalidConfig("database path is empty".into()));
            }
        }

        Ok(())
    }

    /// Builds the pool configuration for these settings.
    pub fn to_db_config(&self) -> DbResult<DbConfig> {
        let db = &self.database;

        let config = if db.in_memory {
            DbConfig::in_memory()
        } else {
            let path = db
                .path
                .clone()
                .or_else(Self::default_database_path)
                .ok_or_else(|| DbError::InvalidConfig("No database path available".into()))?;

            DbConfig::new(path)
                .max_connections(db.max_connections)
                .min_connections(db.min_connections)
        };

        Ok(config
            .connect_timeout(Duration::from_secs(db.connect_timeout_secs))
            .run_migrations(db.run_migrations))
    }

    /// Returns the selected backend.
    pub fn backend(&self) -> DbType {
        self.manager.backend
    }

    /// Applies environment variable overrides.
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(backend) = lookup("PUBHUB_DB_BACKEND") {
            match backend.parse() {
                Ok(parsed) => {
                    debug!(backend = %backend, "Overriding backend from environment");
                    self.manager.backend = parsed;
                }
                Err(_) => warn!(backend = %backend, "Unknown backend in environment"),
            }
        }

        if let Some(path) = lookup("PUBHUB_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = Some(PathBuf::from(path));
        }

        if let Some(flag) = lookup("PUBHUB_DB_IN_MEMORY") {
            match flag.to_lowercase().as_str() {
                "1" | "true" | "yes" => self.database.in_memory = true,
                "0" | "false" | "no" => self.database.in_memory = false,
                _ => warn!(value = %flag, "Invalid PUBHUB_DB_IN_MEMORY value"),
            }
        }

        if let Some(max) = lookup("PUBHUB_DB_MAX_CONNECTIONS") {
            if let Ok(n) = max.parse::<u32>() {
                self.database.max_connections = n;
            }
        }
    }

    /// Returns the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "pubhub", "pubhub")
            .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
    }

    /// Returns the default database file path.
    pub fn default_database_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "pubhub", "pubhub")
            .map(|dirs| dirs.data_dir().join(DATABASE_FILE_NAME))
    }
}
