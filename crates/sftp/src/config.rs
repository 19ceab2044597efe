//! SFTP connection settings.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_IO_TIMEOUT_SECS, DEFAULT_PORT};

/// Errors in the SFTP settings.
#[derive(Debug, thiserror::Error)]
pub enum SftpConfigError {
    #[error("missing required SFTP setting: {0}")]
    Missing(&'static str),

    #[error("invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

/// Connection settings for the remote landing server.
///
/// Only presence is validated; the content of each value is the
/// operator's responsibility.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct SftpConfig {
    #[serde(default)]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub username: String,

    /// Private key used for public-key authentication.
    #[serde(default)]
    pub key_path: PathBuf,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_passphrase: Option<String>,

    /// Base directory on the server; batches land below it.
    #[serde(default)]
    pub remote_path: String,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Upper bound for any single remote operation after connecting.
    #[serde(default = "default_io_timeout")]
    pub io_timeout_secs: u64,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_connect_timeout() -> u64 {
    DEFAULT_CONNECT_TIMEOUT_SECS
}

fn default_io_timeout() -> u64 {
    DEFAULT_IO_TIMEOUT_SECS
}

impl fmt::Debug for SftpConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SftpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("key_path", &self.key_path)
            .field(
                "key_passphrase",
                &self.key_passphrase.as_ref().map(|_| "<redacted>"),
            )
            .field("remote_path", &self.remote_path)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .field("io_timeout_secs", &self.io_timeout_secs)
            .finish()
    }
}

impl Default for SftpConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: default_port(),
            username: String::new(),
            key_path: PathBuf::new(),
            key_passphrase: None,
            remote_path: String::new(),
            connect_timeout_secs: default_connect_timeout(),
            io_timeout_secs: default_io_timeout(),
        }
    }
}

impl SftpConfig {
    // Environment variables that override file settings.
    pub const ENV_HOST: &'static str = "SFTP_HOST";
    pub const ENV_PORT: &'static str = "SFTP_PORT";
    pub const ENV_USERNAME: &'static str = "SFTP_USERNAME";
    pub const ENV_KEY_PATH: &'static str = "SFTP_KEY_PATH";
    pub const ENV_REMOTE_PATH: &'static str = "SFTP_REMOTE_PATH";

    /// Overrides fields from `lookup` (normally `std::env::var`).
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), SftpConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup(Self::ENV_HOST) {
            self.host = host;
        }
        if let Some(port) = lookup(Self::ENV_PORT) {
            self.port = port.trim().parse().map_err(|_| SftpConfigError::Invalid {
                key: Self::ENV_PORT,
                value: port.clone(),
            })?;
        }
        if let Some(username) = lookup(Self::ENV_USERNAME) {
            self.username = username;
        }
        if let Some(key_path) = lookup(Self::ENV_KEY_PATH) {
            self.key_path = PathBuf::from(key_path);
        }
        if let Some(remote_path) = lookup(Self::ENV_REMOTE_PATH) {
            self.remote_path = remote_path;
        }
        Ok(())
    }

    /// Checks that every required setting is present.
    pub fn validate(&self) -> Result<(), SftpConfigError> {
        if self.host.trim().is_empty() {
            return Err(SftpConfigError::Missing("host"));
        }
        if self.username.trim().is_empty() {
            return Err(SftpConfigError::Missing("username"));
        }
        if self.key_path.as_os_str().is_empty() {
            return Err(SftpConfigError::Missing("key_path"));
        }
        if self.remote_path.trim().is_empty() {
            return Err(SftpConfigError::Missing("remote_path"));
        }
        if self.port == 0 {
            return Err(SftpConfigError::Invalid {
                key: "port",
                value: "0".into(),
            });
        }
        Ok(())
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn io_timeout(&self) -> Duration {
        Duration::from_secs(self.io_timeout_secs)
    }

    /// `user@host:port`, for logs and error messages.
    pub fn peer(&self) -> String {
        format!("{}@{}:{}", self.username, self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn complete() -> SftpConfig {
        SftpConfig {
            host: "sftp.example.org".into(),
            username: "landing".into(),
            key_path: "/etc/ecgupload/id_ed25519".into(),
            remote_path: "/landing/uploads".into(),
            ..SftpConfig::default()
        }
    }

    #[test]
    fn defaults() {
        let config = SftpConfig::default();
        assert_eq!(config.port, 22);
        assert_eq!(config.connect_timeout(), Duration::from_secs(20));
        assert_eq!(config.io_timeout(), Duration::from_secs(300));
        assert!(config.key_passphrase.is_none());
    }

    #[test]
    fn validate_complete() {
        assert!(complete().validate().is_ok());
    }

    #[test]
    fn validate_reports_missing_field() {
        let mut config = complete();
        config.host = "  ".into();
        assert!(matches!(config.validate(), Err(SftpConfigError::Missing("host"))));

        let mut config = complete();
        config.key_path = PathBuf::new();
        assert!(matches!(
            config.validate(),
            Err(SftpConfigError::Missing("key_path"))
        ));

        let mut config = complete();
        config.remote_path.clear();
        assert!(matches!(
            config.validate(),
            Err(SftpConfigError::Missing("remote_path"))
        ));
    }

    #[test]
    fn env_overrides_file_values() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("SFTP_HOST", "10.0.0.5"),
            ("SFTP_PORT", "2222"),
            ("SFTP_REMOTE_PATH", "/data/landing"),
        ]);
        let mut config = complete();
        config
            .apply_env(|k| env.get(k).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.host, "10.0.0.5");
        assert_eq!(config.port, 2222);
        assert_eq!(config.remote_path, "/data/landing");
        assert_eq!(config.username, "landing");
    }

    #[test]
    fn env_invalid_port() {
        let mut config = complete();
        let err = config
            .apply_env(|k| (k == "SFTP_PORT").then(|| "ssh".to_string()))
            .unwrap_err();
        assert!(err.to_string().contains("SFTP_PORT"));
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let toml_str = r#"
            host = "sftp.example.org"
            username = "landing"
        "#;
        let config: SftpConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.host, "sftp.example.org");
        assert_eq!(config.port, 22);
        assert_eq!(config.connect_timeout_secs, 20);
    }

    #[test]
    fn peer_format() {
        assert_eq!(complete().peer(), "landing@sftp.example.org:22");
    }

    #[test]
    fn debug_redacts_passphrase() {
        let config = SftpConfig {
            key_passphrase: Some("hunter2".into()),
            ..complete()
        };
        let shown = format!("{config:?}");
        assert!(!shown.contains("hunter2"));
        assert!(shown.contains("<redacted>"));
        assert!(shown.contains("sftp.example.org"));
    }
}
