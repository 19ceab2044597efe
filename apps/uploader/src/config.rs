//! Uploader configuration.
//!
//! Stored as TOML at `~/.config/ecgupload/uploader.toml` unless `--config`
//! names another file:
//!
//! ```toml
//! [sftp]
//! host = "sftp.example.org"
//! username = "landing"
//! key_path = "/etc/ecgupload/id_ed25519"
//! remote_path = "/landing/uploads"
//!
//! [upload]
//! max_file_bytes = 104857600
//! ```
//!
//! `SFTP_*` environment variables (and a `.env` file) override the file.

use std::path::{Path, PathBuf};

use anyhow::Context;
use ecgupload_sftp::SftpConfig;
use ecgupload_transfer::{DEFAULT_CHUNK_SIZE, StreamWriter};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub sftp: SftpConfig,

    #[serde(default)]
    pub upload: UploadConfig,
}

/// Streaming limits applied to every file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Per-file size limit in bytes; unlimited when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_file_bytes: Option<u64>,

    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_file_bytes: None,
            chunk_size: default_chunk_size(),
        }
    }
}

impl UploadConfig {
    pub fn writer(&self) -> StreamWriter {
        StreamWriter::new(self.chunk_size).with_max_file_bytes(self.max_file_bytes)
    }
}

impl Config {
    /// Loads the file at `path` (or the default location), then applies the
    /// `.env` file and process environment.
    ///
    /// SFTP settings are only required when `local_only` is false.
    pub fn load(path: Option<&Path>, local_only: bool) -> anyhow::Result<Self> {
        if let Ok(env_file) = dotenvy::dotenv() {
            tracing::debug!(path = %env_file.display(), "loaded .env");
        }
        Self::load_with(path, local_only, |key| std::env::var(key).ok())
    }

    fn load_with<F>(path: Option<&Path>, local_only: bool, lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match path {
            Some(path) => Self::read(path)?,
            None => {
                let path = config_path();
                if path.exists() {
                    Self::read(&path)?
                } else {
                    tracing::debug!(path = %path.display(), "no configuration file, using defaults");
                    Config::default()
                }
            }
        };

        config.sftp.apply_env(lookup)?;
        if !local_only {
            config.sftp.validate()?;
        }
        Ok(config)
    }

    fn read(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read configuration {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("invalid configuration {}", path.display()))?;
        tracing::debug!(path = %path.display(), "configuration loaded");
        Ok(config)
    }
}

/// Returns the default configuration file path.
fn config_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
    PathBuf::from(home)
        .join(".config")
        .join("ecgupload")
        .join("uploader.toml")
}
