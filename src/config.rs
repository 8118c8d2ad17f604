//! Configuration management for RAX File Server
//!
//! Settings are read from an optional `config.toml` and overridden by
//! `RAX_FILES_*` environment variables. Every key has a default so the server
//! starts without a config file.

use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::{Component, Path, PathBuf};

/// Locations searched for the config file, in order.
const CONFIG_PATHS: [&str; 2] = [
    "rax-file-server/config", // Docker production: /app/rax-file-server/config.toml
    "config",                 // Local development: ./config.toml
];

/// Server configuration, loaded once at startup.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    // ═══ NETWORK ═══
    /// IP address the HTTP listener binds to
    pub bind_address: String,

    /// Port the HTTP listener binds to
    pub port: u16,

    // ═══ STORAGE ═══
    /// Root of the visible storage tree
    pub storage_root: String,

    /// Scratch area for staged uploads and transient download archives
    pub temp_root: String,

    /// Maximum length of a stored name, in characters
    pub max_name_length: usize,

    /// Space on the storage volume never handed out to uploads
    pub reserved_space_mb: u64,

    // ═══ COLLABORATORS ═══
    /// JSON file with the accepted bearer tokens
    pub tokens_file: String,

    /// External archiver used to pack and unpack directories
    pub archive_program: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1".to_string(),
            port: 8000,
            storage_root: "./uploaded_files".to_string(),
            temp_root: "./uploaded_files.tmp".to_string(),
            max_name_length: 255,
            reserved_space_mb: 1024,
            tokens_file: "tokens.json".to_string(),
            archive_program: "tar".to_string(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from config.toml with environment overrides
    pub fn load() -> Result<Self, config::ConfigError> {
        let config_path = CONFIG_PATHS
            .iter()
            .find(|path| Path::new(&format!("{path}.toml")).exists())
            .copied()
            .unwrap_or(CONFIG_PATHS[1]);

        let defaults = Self::default();
        let settings = Config::builder()
            .set_default("bind_address", defaults.bind_address)?
            .set_default("port", i64::from(defaults.port))?
            .set_default("storage_root", defaults.storage_root)?
            .set_default("temp_root", defaults.temp_root)?
            .set_default("max_name_length", defaults.max_name_length as i64)?
            .set_default("reserved_space_mb", defaults.reserved_space_mb as i64)?
            .set_default("tokens_file", defaults.tokens_file)?
            .set_default("archive_program", defaults.archive_program)?
            .add_source(File::with_name(config_path).required(false))
            .add_source(Environment::with_prefix("RAX_FILES").try_parsing(true))
            .build()?;

        let config: ServerConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validation for all configuration values
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        if self.port == 0 {
            return Err(config::ConfigError::Message("port cannot be 0".into()));
        }

        if self.storage_root.trim().is_empty() {
            return Err(config::ConfigError::Message(
                "storage_root cannot be empty".into(),
            ));
        }

        if self.temp_root.trim().is_empty() {
            return Err(config::ConfigError::Message(
                "temp_root cannot be empty".into(),
            ));
        }

        let storage = lexical(Path::new(&self.storage_root));
        let temp = lexical(Path::new(&self.temp_root));
        if storage == temp {
            return Err(config::ConfigError::Message(
                "temp_root must differ from storage_root".into(),
            ));
        }
        if temp.starts_with(&storage) {
            return Err(config::ConfigError::Message(
                "temp_root cannot live inside storage_root".into(),
            ));
        }

        if self.max_name_length == 0 {
            return Err(config::ConfigError::Message(
                "max_name_length must be greater than 0".into(),
            ));
        }

        if self.archive_program.trim().is_empty() {
            return Err(config::ConfigError::Message(
                "archive_program cannot be empty".into(),
            ));
        }

        Ok(())
    }

    /// Get bind address and port as socket address string
    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }

    /// Get storage root as PathBuf
    pub fn storage_root_path(&self) -> PathBuf {
        PathBuf::from(&self.storage_root)
    }

    /// Get temp root as PathBuf
    pub fn temp_root_path(&self) -> PathBuf {
        PathBuf::from(&self.temp_root)
    }

    pub fn tokens_file_path(&self) -> PathBuf {
        PathBuf::from(&self.tokens_file)
    }

    /// Reserved safety margin in bytes
    pub fn reserved_space_bytes(&self) -> u64 {
        self.reserved_space_mb.saturating_mul(1024 * 1024)
    }
}

/// Drops `.` components and trailing separators so equivalent spellings compare equal.
fn lexical(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = ServerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.listen_address(), "127.0.0.1:8000");
        assert_eq!(config.reserved_space_bytes(), 1024 * 1024 * 1024);
    }

    #[test]
    fn rejects_zero_port() {
        let config = ServerConfig {
            port: 0,
            ..ServerConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_temp_root_inside_storage_root() {
        let config = ServerConfig {
            storage_root: "./data".into(),
            temp_root: "data/tmp".into(),
            ..ServerConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_identical_roots() {
        let config = ServerConfig {
            storage_root: "./data".into(),
            temp_root: "data/".into(),
            ..ServerConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_zero_name_length() {
        let config = ServerConfig {
            max_name_length: 0,
            ..ServerConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
