//! Server settings for festival contacts
//!
//! Settings live in settings.json inside the config directory. Environment
//! variables override the file, CLI flags override both.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::Paths;

/// Which record store backs the artist collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Sqlite,
    Memory,
}

impl StoreBackend {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "sqlite" => Some(StoreBackend::Sqlite),
            "memory" => Some(StoreBackend::Memory),
            _ => None,
        }
    }
}

/// Record store location
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseSettings {
    #[serde(default)]
    pub backend: StoreBackend,

    /// Logical database name; the SQLite file is named after it
    #[serde(default = "default_database_name")]
    pub name: String,

    /// Collection (table) holding the artist records
    #[serde(default = "default_collection")]
    pub collection: String,

    /// Explicit database file, overrides the name-derived path
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Sqlite,
            name: default_database_name(),
            collection: default_collection(),
            path: None,
        }
    }
}

/// Settings structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Server ID, used as the token signing secret and password salt
    #[serde(default)]
    pub server_id: String,

    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub database: DatabaseSettings,

    /// Password protecting the artist routes; open when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_password: Option<String>,

    /// Lifetime of issued access tokens in days
    #[serde(default = "default_token_max_age_days")]
    pub token_max_age_days: i64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_id: String::new(),
            host: default_host(),
            port: default_port(),
            database: DatabaseSettings::default(),
            access_password: None,
            token_max_age_days: default_token_max_age_days(),
        }
    }
}

impl Settings {
    /// Load settings from file, creating it with a fresh server id if needed
    pub fn load(paths: &Paths) -> Result<Self> {
        let settings_path = paths.settings_path();

        let mut settings = if settings_path.exists() {
            let content =
                std::fs::read_to_string(&settings_path).context("Failed to read settings file")?;
            serde_json::from_str(&content).context("Failed to parse settings file")?
        } else {
            Self::default()
        };

        if settings.server_id.is_empty() || !settings_path.exists() {
            if settings.server_id.is_empty() {
                settings.server_id = uuid::Uuid::new_v4().to_string();
            }
            settings.save(paths)?;
        }

        Ok(settings)
    }

    /// Save settings to file
    pub fn save(&self, paths: &Paths) -> Result<()> {
        let content = serde_json::to_string_pretty(self).context("Failed to serialize settings")?;
        std::fs::write(paths.settings_path(), content).context("Failed to write settings file")?;
        Ok(())
    }

    /// Apply `FESTIVAL_*` environment variables
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from any key lookup
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("FESTIVAL_HOST") {
            self.host = host;
        }
        if let Some(port) = lookup("FESTIVAL_PORT") {
            self.port = port
                .parse()
                .with_context(|| format!("FESTIVAL_PORT is not a valid port: {}", port))?;
        }
        if let Some(backend) = lookup("FESTIVAL_STORE") {
            self.database.backend = match StoreBackend::from_str(&backend) {
                Some(b) => b,
                None => bail!("FESTIVAL_STORE must be sqlite or memory, got {}", backend),
            };
        }
        if let Some(path) = lookup("FESTIVAL_DATABASE_PATH") {
            self.database.path = Some(PathBuf::from(path));
        }
        if let Some(name) = lookup("FESTIVAL_DATABASE_NAME") {
            self.database.name = name;
        }
        if let Some(collection) = lookup("FESTIVAL_COLLECTION") {
            self.database.collection = collection;
        }
        if let Some(password) = lookup("FESTIVAL_ACCESS_PASSWORD") {
            self.access_password = if password.is_empty() {
                None
            } else {
                Some(password)
            };
        }
        Ok(())
    }

    /// Reject values that cannot be used safely
    pub fn validate(&self) -> Result<()> {
        if self.database.name.trim().is_empty() {
            bail!("Database name must not be empty");
        }
        if !is_identifier(&self.database.collection) {
            bail!(
                "Collection name must match [A-Za-z_][A-Za-z0-9_]*, got {:?}",
                self.database.collection
            );
        }
        if self.token_max_age_days <= 0 {
            bail!("tokenMaxAgeDays must be positive");
        }
        Ok(())
    }

    /// Resolved SQLite file location
    pub fn database_path(&self, paths: &Paths) -> PathBuf {
        self.database
            .path
            .clone()
            .unwrap_or_else(|| paths.database_path(&self.database.name))
    }

    pub fn token_max_age_secs(&self) -> i64 {
        self.token_max_age_days * 24 * 3600
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

// Default value functions for serde

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_database_name() -> String {
    "festival-contacts".to_string()
}

fn default_collection() -> String {
    "data".to_string()
}

fn default_token_max_age_days() -> i64 {
    30
}
