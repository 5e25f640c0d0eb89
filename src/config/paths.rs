//! Path management for festival contacts
//!
//! This module resolves the config directory and the files kept inside it.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Filesystem locations used by the server
#[derive(Debug, Clone)]
pub struct Paths {
    /// Config directory path
    config_dir: PathBuf,
    /// Path to static web client files
    client_path: PathBuf,
}

impl Paths {
    pub fn new(config_override: Option<PathBuf>, client_override: Option<PathBuf>) -> Result<Self> {
        let config_dir = match config_override {
            Some(path) => path,
            None => directories::ProjectDirs::from("", "", "festival-contacts")
                .map(|dirs| dirs.config_dir().to_path_buf())
                .unwrap_or_else(|| PathBuf::from(".festival-contacts")),
        };

        let client_path = client_override.unwrap_or_else(|| config_dir.join("client"));

        std::fs::create_dir_all(&config_dir)
            .with_context(|| format!("Failed to create config directory {:?}", config_dir))?;

        Ok(Self {
            config_dir,
            client_path,
        })
    }

    /// Get the config directory
    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Get the client path
    pub fn client_path(&self) -> &Path {
        &self.client_path
    }

    /// Get the settings file path
    pub fn settings_path(&self) -> PathBuf {
        self.config_dir.join("settings.json")
    }

    /// Database file for a logical database name
    pub fn database_path(&self, name: &str) -> PathBuf {
        self.config_dir.join(format!("{}.db", name))
    }
}
