//! Configuration loading
//!
//! Values are layered: built-in defaults, then an optional YAML file, then
//! `MODREQ__SECTION__KEY` environment variables.

use crate::error::{ModReqError, Result};
use config::{Environment, File, FileFormat};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Name of the configuration file inside the config directory
pub const CONFIG_FILE_NAME: &str = "config.yml";

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub settings: SettingsConfig,
    pub discord: DiscordConfig,
    pub runtime: RuntimeConfig,
    pub logging: LoggingConfig,
}

/// Ticket database and connection pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite database file; relative paths resolve against the data directory
    pub file: PathBuf,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
    pub idle_timeout_secs: u64,
    pub max_lifetime_secs: u64,
    /// How long a writer waits on a locked database before failing
    pub busy_timeout_ms: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            file: PathBuf::from("modreq.db"),
            max_connections: 10,
            min_connections: 2,
            acquire_timeout_secs: 30,
            idle_timeout_secs: 600,
            max_lifetime_secs: 1800,
            busy_timeout_ms: 5000,
        }
    }
}

impl DatabaseConfig {
    /// Database path with relative paths resolved against `data_dir`
    #[must_use]
    pub fn resolved_path(&self, data_dir: &Path) -> PathBuf {
        if self.file.is_absolute() {
            self.file.clone()
        } else {
            data_dir.join(&self.file)
        }
    }

    #[must_use]
    pub const fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
    }

    #[must_use]
    pub const fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    #[must_use]
    pub const fn max_lifetime(&self) -> Duration {
        Duration::from_secs(self.max_lifetime_secs)
    }

    #[must_use]
    pub const fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}

/// Ticket rules
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SettingsConfig {
    /// Maximum simultaneously open tickets per reporter; 0 disables the limit
    pub max_requests_per_player: u32,
    pub list_page_size: usize,
}

impl Default for SettingsConfig {
    fn default() -> Self {
        Self {
            max_requests_per_player: 5,
            list_page_size: 10,
        }
    }
}

/// Discord webhook notifications
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscordConfig {
    pub enabled: bool,
    pub webhook_url: String,
    pub opened_embed_color: String,
    pub elevated_embed_color: String,
    pub completed_embed_color: String,
    pub closed_embed_color: String,
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            webhook_url: String::new(),
            opened_embed_color: "#00FF00".to_string(),
            elevated_embed_color: "#0000FF".to_string(),
            completed_embed_color: "#FF0000".to_string(),
            closed_embed_color: "#303030".to_string(),
        }
    }
}

impl DiscordConfig {
    /// Notifications are sent only when enabled and a URL is configured
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.enabled && !self.webhook_url.trim().is_empty()
    }
}

/// Worker runtime sizing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub worker_threads: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self { worker_threads: 4 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directive used when `RUST_LOG` is unset
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from defaults, an optional file and the environment
    ///
    /// An explicitly given `path` must exist; the default location is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let defaults = serde_yaml::to_string(&Self::default())?;
        let mut builder =
            config::Config::builder().add_source(File::from_str(&defaults, FileFormat::Yaml));

        builder = match path {
            Some(path) => builder.add_source(File::from(path).format(FileFormat::Yaml)),
            None => match Self::default_path() {
                Some(path) => builder.add_source(
                    File::from(path)
                        .format(FileFormat::Yaml)
                        .required(false),
                ),
                None => builder,
            },
        };

        let config = builder
            .add_source(
                Environment::with_prefix("MODREQ")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize::<Self>()?;

        config.validate()?;
        Ok(config)
    }

    /// Write the default configuration to `path` unless a file already exists
    ///
    /// Returns `true` if a file was written.
    pub fn write_default(path: &Path) -> Result<bool> {
        if path.exists() {
            return Ok(false);
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_yaml::to_string(&Self::default())?)?;
        Ok(true)
    }

    /// Default configuration file location
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
    }

    /// Directory that relative database paths resolve against
    #[must_use]
    pub fn data_dir() -> PathBuf {
        project_dirs().map_or_else(|| PathBuf::from("."), |dirs| dirs.data_dir().to_path_buf())
    }

    fn validate(&self) -> Result<()> {
        let db = &self.database;
        if db.max_connections == 0 {
            return Err(ModReqError::InvalidConfig(
                "database.max_connections must be at least 1".to_string(),
            ));
        }
        if db.min_connections > db.max_connections {
            return Err(ModReqError::InvalidConfig(format!(
                "database.min_connections ({}) exceeds database.max_connections ({})",
                db.min_connections, db.max_connections
            )));
        }
        if self.runtime.worker_threads == 0 {
            return Err(ModReqError::InvalidConfig(
                "runtime.worker_threads must be at least 1".to_string(),
            ));
        }
        if self.settings.list_page_size == 0 {
            return Err(ModReqError::InvalidConfig(
                "settings.list_page_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("dev", "bwmp", "modreq")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    #[test]
    #[serial]
    fn test_load_file_overrides_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yml");
        std::fs::write(
            &path,
            "settings:\n  max_requests_per_player: 0\ndatabase:\n  max_connections: 4\n",
        )
        .unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.settings.max_requests_per_player, 0);
        assert_eq!(config.settings.list_page_size, 10);
        assert_eq!(config.database.max_connections, 4);
        assert_eq!(config.database.min_connections, 2);
    }

    #[test]
    #[serial]
    fn test_environment_overrides_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yml");
        std::fs::write(&path, "settings:\n  list_page_size: 20\n").unwrap();

        // SAFETY: serialized with the other tests touching the environment
        unsafe { std::env::set_var("MODREQ__SETTINGS__LIST_PAGE_SIZE", "7") };
        let config = Config::load(Some(&path));
        unsafe { std::env::remove_var("MODREQ__SETTINGS__LIST_PAGE_SIZE") };

        assert_eq!(config.unwrap().settings.list_page_size, 7);
    }

    #[test]
    #[serial]
    fn test_missing_explicit_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let result = Config::load(Some(&dir.path().join("absent.yml")));
        assert!(matches!(result, Err(ModReqError::Config(_))));
    }

    #[test]
    #[serial]
    fn test_invalid_pool_bounds_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yml");
        std::fs::write(
            &path,
            "database:\n  max_connections: 2\n  min_connections: 3\n",
        )
        .unwrap();

        assert!(matches!(
            Config::load(Some(&path)),
            Err(ModReqError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_write_default_does_not_overwrite() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.yml");

        assert!(Config::write_default(&path).unwrap());
        std::fs::write(&path, "settings:\n  list_page_size: 3\n").unwrap();
        assert!(!Config::write_default(&path).unwrap());

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("list_page_size: 3"));
    }

    #[test]
    fn test_discord_requires_url() {
        let mut discord = DiscordConfig {
            enabled: true,
            ..DiscordConfig::default()
        };
        assert!(!discord.is_active());
        discord.webhook_url = "https://discord.example/api/webhooks/1".to_string();
        assert!(discord.is_active());
    }

    #[test]
    fn test_relative_database_path() {
        let db = DatabaseConfig::default();
        let resolved = db.resolved_path(Path::new("/var/lib/modreq"));
        assert_eq!(resolved, PathBuf::from("/var/lib/modreq/modreq.db"));
    }
}
