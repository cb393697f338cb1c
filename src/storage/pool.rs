//! Connection pool and database lifecycle

use super::migrations::{MigrationReport, Migrator};
use super::sqlite::SqliteTicketStore;
use crate::config::DatabaseConfig;
use crate::error::Result;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// Open a bounded pool on the SQLite file at `path`, creating it if needed
pub async fn connect(config: &DatabaseConfig, path: &Path) -> Result<SqlitePool> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .busy_timeout(config.busy_timeout());

    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(config.acquire_timeout())
        .idle_timeout(config.idle_timeout())
        .max_lifetime(config.max_lifetime())
        .test_before_acquire(true)
        .connect_with(options)
        .await?;

    info!(
        path = %path.display(),
        max_connections = config.max_connections,
        "Opened ticket database"
    );
    Ok(pool)
}

/// An open, fully migrated ticket database
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
    path: PathBuf,
    report: MigrationReport,
}

impl Database {
    /// Connect and bring the schema up to date
    ///
    /// A failed migration closes the pool and is returned; callers treat it
    /// as fatal at startup.
    pub async fn open(config: &DatabaseConfig, path: &Path) -> Result<Self> {
        let pool = connect(config, path).await?;

        match Migrator::default().run(&pool).await {
            Ok(report) => Ok(Self {
                pool,
                path: path.to_path_buf(),
                report,
            }),
            Err(e) => {
                error!(error = %e, "Database migration failed");
                pool.close().await;
                Err(e)
            },
        }
    }

    /// Ticket store backed by this database's pool
    #[must_use]
    pub fn store(&self) -> SqliteTicketStore {
        SqliteTicketStore::new(self.pool.clone())
    }

    #[must_use]
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Migrations applied when the database was opened
    #[must_use]
    pub const fn migration_report(&self) -> &MigrationReport {
        &self.report
    }

    /// Wait for checked-out connections to return, then close the pool
    pub async fn close(self) {
        self.pool.close().await;
        info!(path = %self.path.display(), "Closed ticket database");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_open_creates_and_migrates() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data").join("modreq.db");

        let db = Database::open(&DatabaseConfig::default(), &path).await.unwrap();
        assert!(path.exists());
        assert_eq!(db.migration_report().to, 4);
        db.close().await;

        let db = Database::open(&DatabaseConfig::default(), &path).await.unwrap();
        assert!(db.migration_report().is_noop());
        db.close().await;
    }

    #[tokio::test]
    async fn test_closed_pool_surfaces_pool_closed() {
        let dir = TempDir::new().unwrap();
        let db = Database::open(&DatabaseConfig::default(), &dir.path().join("m.db"))
            .await
            .unwrap();
        let pool = db.pool().clone();
        db.close().await;

        let error = crate::error::ModReqError::from(pool.acquire().await.unwrap_err());
        assert!(matches!(error, crate::error::ModReqError::PoolClosed));
    }
}
