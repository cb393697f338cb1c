//! Error types for modreq
//!
//! Only infrastructure failures and caller mistakes are errors. Lifecycle
//! preconditions that do not hold (already claimed, already closed, quota
//! reached, unknown ticket) are reported through [`crate::core::Outcome`].

use thiserror::Error;

/// Result type alias used throughout the crate
pub type Result<T> = std::result::Result<T, ModReqError>;

/// Main error type for modreq
#[derive(Error, Debug)]
pub enum ModReqError {
    /// A statement against the ticket database failed
    #[error("Database error: {0}")]
    Database(#[source] sqlx::Error),

    /// No pooled connection became available within the acquire timeout
    #[error("Timed out waiting for a database connection")]
    PoolTimeout,

    /// The pool has been shut down
    #[error("Database connection pool is closed")]
    PoolClosed,

    /// A schema migration failed; the schema stays at the previous version
    #[error("Migration to schema version {version} failed: {source}")]
    Migration {
        version: i64,
        #[source]
        source: Box<ModReqError>,
    },

    /// The registered migrations are not strictly ascending
    #[error("Migrations out of order: version {version} follows {previous}")]
    MigrationOrder { previous: i64, version: i64 },

    /// A stored row could not be mapped back onto the model
    #[error("Corrupt row in {table}: {reason}")]
    CorruptRow { table: &'static str, reason: String },

    /// Invalid caller input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration could not be loaded
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Configuration loaded but holds values the engine cannot run with
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration could not be written
    #[error("Failed to serialize configuration: {0}")]
    ConfigSerialize(#[from] serde_yaml::Error),

    /// The host main loop is no longer accepting work
    #[error("Main loop is not running")]
    HostUnavailable,

    /// A background task panicked or was cancelled
    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Custom error with message
    #[error("{0}")]
    Custom(String),
}

impl From<sqlx::Error> for ModReqError {
    fn from(error: sqlx::Error) -> Self {
        match error {
            sqlx::Error::PoolTimedOut => Self::PoolTimeout,
            sqlx::Error::PoolClosed => Self::PoolClosed,
            other => Self::Database(other),
        }
    }
}

impl ModReqError {
    /// Create a custom error with a message
    pub fn custom(msg: impl Into<String>) -> Self {
        Self::Custom(msg.into())
    }

    /// Whether retrying the same operation later may succeed
    #[must_use]
    pub fn is_retriable(&self) -> bool {
        match self {
            Self::PoolTimeout
            | Self::Database(sqlx::Error::Io(_) | sqlx::Error::WorkerCrashed) => true,
            Self::Database(sqlx::Error::Database(db)) => is_busy_or_locked(db.code().as_deref()),
            _ => false,
        }
    }

    /// Check if this error is recoverable by the user
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::InvalidInput(_) | Self::Config(_) | Self::InvalidConfig(_) | Self::PoolTimeout
        )
    }

    /// Check if this is a configuration error
    #[must_use]
    pub const fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::Config(_) | Self::InvalidConfig(_) | Self::ConfigSerialize(_)
        )
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::PoolTimeout => {
                "The ticket database is busy. Please try again in a moment.".to_string()
            },
            Self::Migration { version, .. } => format!(
                "The ticket database could not be upgraded to schema version {version}."
            ),
            _ => self.to_string(),
        }
    }

    /// Get suggestions for fixing the error
    #[must_use]
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::PoolTimeout => vec![
                "Retry the command".to_string(),
                "Raise database.acquire_timeout_secs or database.max_connections".to_string(),
            ],
            Self::Migration { .. } | Self::MigrationOrder { .. } => vec![
                "Check the log output for the failing statement".to_string(),
                "Restore the database from a backup before retrying".to_string(),
            ],
            Self::Config(_) | Self::InvalidConfig(_) => vec![
                "Run 'modreq config init' to write a default configuration".to_string(),
                "Check MODREQ__* environment variables".to_string(),
            ],
            Self::InvalidInput(_) => vec![format!(
                "Descriptions and notes must be 1-{} characters",
                crate::core::MAX_TEXT_LEN
            )],
            _ => vec![],
        }
    }
}

/// SQLITE_BUSY (5) and SQLITE_LOCKED (6), including their extended codes
fn is_busy_or_locked(code: Option<&str>) -> bool {
    code.and_then(|code| code.parse::<i32>().ok())
        .is_some_and(|code| matches!(code & 0xff, 5 | 6))
}
