//! Connection settings
//!
//! Resolution order (highest to lowest):
//! 1. `DATABASE_URL`
//! 2. `PGHOST`, `PGPORT`, `PGUSER`, `PGPASSWORD`, `PGDATABASE`,
//!    `LIGHTBNB_MAX_CONNECTIONS`
//! 3. `./lightbnb.toml` merged over `~/.lightbnb/config.toml`
//! 4. Built-in defaults
//!
//! `.env` files are folded into the process environment first by
//! [`load_dotenv`], so they land at level 2.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sqlx::postgres::PgConnectOptions;
use tracing::{debug, info, warn};

use crate::error::{DbError, Result};

const DEFAULT_HOST: &str = "localhost";
const DEFAULT_PORT: u16 = 5432;
const DEFAULT_USER: &str = "vagrant";
const DEFAULT_DATABASE: &str = "lightbnb";

/// Default maximum connections for the pool.
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Local config file name, looked up in the current directory
pub const LOCAL_CONFIG_FILE: &str = "lightbnb.toml";

/// Load environment variables from .env files
///
/// Checks the current directory first, then `~/.lightbnb/.env`.
/// dotenvy never overwrites variables that are already set.
pub fn load_dotenv() {
    let mut loaded_from = Vec::new();

    if let Ok(path) = dotenvy::dotenv() {
        debug!("Loaded .env from current directory: {}", path.display());
        loaded_from.push(path);
    }

    if let Some(env_file) = config_dir().map(|dir| dir.join(".env")) {
        if env_file.exists() {
            match dotenvy::from_path(&env_file) {
                Ok(()) => {
                    debug!("Loaded .env from {}", env_file.display());
                    loaded_from.push(env_file);
                }
                Err(e) => debug!("Failed to load {}: {}", env_file.display(), e),
            }
        }
    }

    if loaded_from.is_empty() {
        debug!("No .env files found, using process environment only");
    }
}

/// The lightbnb config directory (~/.lightbnb)
pub fn config_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".lightbnb"))
}

/// Top-level layout of `lightbnb.toml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LightbnbConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
}

/// PostgreSQL connection settings
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Full connection string; overrides every discrete field when set
    pub url: Option<String>,
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: Option<String>,
    pub database: String,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            user: DEFAULT_USER.to_string(),
            password: None,
            database: DEFAULT_DATABASE.to_string(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
        }
    }
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("url", &self.url.as_ref().map(|_| "<redacted>"))
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("database", &self.database)
            .field("max_connections", &self.max_connections)
            .finish()
    }
}

impl LightbnbConfig {
    /// Parse a config from TOML text
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        Self::from_table(read_table(contents)?)
    }

    /// Read and parse a config file
    pub fn from_path(path: &Path) -> Result<Self> {
        Self::from_table(read_table_from(path)?)
    }

    fn from_table(table: toml::Table) -> Result<Self> {
        toml::Value::Table(table)
            .try_into()
            .map_err(|e: toml::de::Error| DbError::config(e.to_string()))
    }

    /// Load config from TOML files
    ///
    /// `./lightbnb.toml` is merged over `~/.lightbnb/config.toml` key by
    /// key. Unreadable or malformed files are skipped with a warning.
    pub fn load() -> Self {
        let global = config_dir().map(|dir| dir.join("config.toml"));
        let local = PathBuf::from(LOCAL_CONFIG_FILE);

        Self::layered([global, Some(local)].into_iter().flatten())
    }

    /// Merge config files in order, later files overriding earlier ones
    pub fn layered(paths: impl IntoIterator<Item = PathBuf>) -> Self {
        let mut merged = toml::Table::new();
        for path in paths.into_iter().filter(|path| path.exists()) {
            let loaded = read_table_from(&path)
                .and_then(|table| Self::from_table(table.clone()).map(|_| table));
            match loaded {
                Ok(table) => {
                    debug!("Loaded config from {}", path.display());
                    merge_tables(&mut merged, table);
                }
                Err(e) => warn!("Ignoring {}: {}", path.display(), e),
            }
        }

        Self::from_table(merged).unwrap_or_else(|e| {
            warn!("Ignoring merged config: {}", e);
            Self::default()
        })
    }
}

fn read_table(contents: &str) -> Result<toml::Table> {
    toml::from_str(contents).map_err(|e| DbError::config(e.to_string()))
}

fn read_table_from(path: &Path) -> Result<toml::Table> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| DbError::config(format!("failed to read {}: {}", path.display(), e)))?;
    read_table(&contents)
}

/// Merge `overlay` into `base` (overlay wins, nested tables merge)
fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        match value {
            toml::Value::Table(incoming) if base.get(&key).is_some_and(toml::Value::is_table) => {
                if let Some(toml::Value::Table(existing)) = base.get_mut(&key) {
                    merge_tables(existing, incoming);
                }
            }
            value => {
                base.insert(key, value);
            }
        }
    }
}

impl DatabaseConfig {
    /// Resolve settings from config files and the process environment
    pub fn load() -> Result<Self> {
        let mut config = LightbnbConfig::load().database;
        config.apply_env(|key| std::env::var(key).ok())?;
        info!(
            host = %config.host,
            port = config.port,
            database = %config.database,
            from_url = config.url.is_some(),
            "Resolved database configuration"
        );
        Ok(config)
    }

    /// Overlay environment variables read through `lookup`
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("DATABASE_URL") {
            self.url = Some(url);
        }
        if let Some(host) = lookup("PGHOST") {
            self.host = host;
        }
        if let Some(port) = lookup("PGPORT") {
            self.port = port
                .parse()
                .map_err(|_| DbError::config(format!("invalid PGPORT '{}'", port)))?;
        }
        if let Some(user) = lookup("PGUSER") {
            self.user = user;
        }
        if let Some(password) = lookup("PGPASSWORD") {
            self.password = Some(password);
        }
        if let Some(database) = lookup("PGDATABASE") {
            self.database = database;
        }
        if let Some(max) = lookup("LIGHTBNB_MAX_CONNECTIONS") {
            self.max_connections = max.parse().map_err(|_| {
                DbError::config(format!("invalid LIGHTBNB_MAX_CONNECTIONS '{}'", max))
            })?;
        }
        Ok(())
    }

    /// Build sqlx connect options from these settings
    pub fn connect_options(&self) -> Result<PgConnectOptions> {
        if let Some(url) = &self.url {
            return Ok(url.parse::<PgConnectOptions>()?);
        }

        let mut options = PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .database(&self.database);
        if let Some(password) = &self.password {
            options = options.password(password);
        }
        Ok(options)
    }
}
