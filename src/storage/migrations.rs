//! Versioned schema migrations
//!
//! Every migration is a list of "add if not present" steps. Applied versions
//! are recorded one row per version in `schema_version`; the highest row is
//! the current schema version. Each migration runs in its own
//! `BEGIN IMMEDIATE` transaction, so a failure leaves the schema at the last
//! recorded version and re-running is harmless.

use crate::error::{ModReqError, Result};
use chrono::{SecondsFormat, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};

const CREATE_VERSION_TABLE: &str = "CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER NOT NULL,
    applied_at TEXT NOT NULL
)";

/// A single idempotent schema change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// A statement that is safe to repeat (`CREATE ... IF NOT EXISTS`,
    /// `UPDATE` converging on a fixed value, ...)
    Execute(&'static str),
    /// `ALTER TABLE ... ADD COLUMN`, skipped when the column already exists
    AddColumn {
        table: &'static str,
        column: &'static str,
        definition: &'static str,
    },
}

/// A numbered group of steps
#[derive(Debug, Clone, Copy)]
pub struct Migration {
    pub version: i64,
    pub description: &'static str,
    pub steps: &'static [Step],
}

/// Migrations shipped with this build, in ascending order
pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        description: "tickets and notes",
        steps: &[
            Step::Execute(
                "CREATE TABLE IF NOT EXISTS tickets (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    reporter_id TEXT NOT NULL,
                    reporter_name TEXT NOT NULL,
                    description TEXT NOT NULL,
                    status TEXT NOT NULL DEFAULT 'OPEN',
                    claimed_by TEXT,
                    claimed_by_name TEXT,
                    world_name TEXT,
                    x REAL,
                    y REAL,
                    z REAL,
                    yaw REAL,
                    pitch REAL,
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL,
                    closed_at TEXT
                )",
            ),
            Step::Execute(
                "CREATE TABLE IF NOT EXISTS ticket_notes (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    ticket_id INTEGER NOT NULL,
                    author_id TEXT NOT NULL,
                    author_name TEXT NOT NULL,
                    content TEXT NOT NULL,
                    created_at TEXT NOT NULL,
                    FOREIGN KEY (ticket_id) REFERENCES tickets(id) ON DELETE CASCADE
                )",
            ),
            Step::Execute("CREATE INDEX IF NOT EXISTS idx_tickets_reporter ON tickets(reporter_id)"),
            Step::Execute("CREATE INDEX IF NOT EXISTS idx_tickets_status ON tickets(status)"),
            Step::Execute("CREATE INDEX IF NOT EXISTS idx_tickets_claimed_by ON tickets(claimed_by)"),
            Step::Execute("CREATE INDEX IF NOT EXISTS idx_tickets_created_at ON tickets(created_at)"),
            Step::Execute("CREATE INDEX IF NOT EXISTS idx_notes_ticket ON ticket_notes(ticket_id)"),
        ],
    },
    Migration {
        version: 2,
        description: "claiming is independent of status",
        steps: &[
            Step::Execute("UPDATE tickets SET status = 'OPEN' WHERE status = 'CLAIMED'"),
            Step::Execute("CREATE INDEX IF NOT EXISTS idx_tickets_updated_at ON tickets(updated_at)"),
            Step::Execute("CREATE INDEX IF NOT EXISTS idx_notes_created_at ON ticket_notes(created_at)"),
        ],
    },
    Migration {
        version: 3,
        description: "track who closed or completed a ticket",
        steps: &[
            Step::AddColumn {
                table: "tickets",
                column: "closed_by",
                definition: "TEXT",
            },
            Step::AddColumn {
                table: "tickets",
                column: "closed_by_name",
                definition: "TEXT",
            },
            Step::AddColumn {
                table: "tickets",
                column: "completed_by",
                definition: "TEXT",
            },
            Step::AddColumn {
                table: "tickets",
                column: "completed_by_name",
                definition: "TEXT",
            },
            Step::Execute("CREATE INDEX IF NOT EXISTS idx_tickets_closed_by ON tickets(closed_by)"),
            Step::Execute(
                "CREATE INDEX IF NOT EXISTS idx_tickets_completed_by ON tickets(completed_by)",
            ),
        ],
    },
    Migration {
        version: 4,
        description: "open ticket quota lookup",
        steps: &[Step::Execute(
            "CREATE INDEX IF NOT EXISTS idx_tickets_reporter_status ON tickets(reporter_id, status)",
        )],
    },
];

/// What a migration run did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationReport {
    /// Schema version found when the run started
    pub from: i64,
    /// Schema version when the run finished
    pub to: i64,
    /// Versions applied by this run, ascending
    pub applied: Vec<i64>,
}

impl MigrationReport {
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.applied.is_empty()
    }
}

/// Applies a migration list to a database
#[derive(Debug, Clone, Copy)]
pub struct Migrator<'a> {
    migrations: &'a [Migration],
}

impl Default for Migrator<'static> {
    fn default() -> Self {
        Self::new(MIGRATIONS)
    }
}

impl<'a> Migrator<'a> {
    #[must_use]
    pub const fn new(migrations: &'a [Migration]) -> Self {
        Self { migrations }
    }

    /// Highest version this migrator knows about
    #[must_use]
    pub fn latest_version(&self) -> i64 {
        self.migrations.last().map_or(0, |m| m.version)
    }

    /// Bring the schema up to [`Self::latest_version`]
    ///
    /// One pooled connection is held for the whole run.
    pub async fn run(&self, pool: &SqlitePool) -> Result<MigrationReport> {
        let mut conn = pool.acquire().await?;
        self.run_on(&mut conn).await
    }

    /// Same as [`Self::run`] on a connection the caller already holds
    pub async fn run_on(&self, conn: &mut SqliteConnection) -> Result<MigrationReport> {
        self.check_order()?;

        sqlx::query(CREATE_VERSION_TABLE).execute(&mut *conn).await?;

        let from = current_version(conn).await?;
        info!(version = from, "Current database schema version");

        if from > self.latest_version() {
            warn!(
                database = from,
                known = self.latest_version(),
                "Database schema is newer than this build"
            );
        }

        let mut applied = Vec::new();
        for migration in self.migrations.iter().filter(|m| m.version > from) {
            info!(
                version = migration.version,
                description = migration.description,
                "Applying migration"
            );
            let ran = apply(conn, migration)
                .await
                .map_err(|source| ModReqError::Migration {
                    version: migration.version,
                    source: Box::new(source),
                })?;
            if ran {
                applied.push(migration.version);
            }
        }

        let to = current_version(conn).await?;
        if !applied.is_empty() {
            info!(from, to, "Database migration completed");
        }

        Ok(MigrationReport { from, to, applied })
    }

    fn check_order(&self) -> Result<()> {
        let mut previous = 0;
        for migration in self.migrations {
            if migration.version <= previous {
                return Err(ModReqError::MigrationOrder {
                    previous,
                    version: migration.version,
                });
            }
            previous = migration.version;
        }
        Ok(())
    }
}

/// Highest recorded schema version, 0 for a fresh database
pub async fn current_version(conn: &mut SqliteConnection) -> Result<i64> {
    let version: i64 = sqlx::query_scalar("SELECT COALESCE(MAX(version), 0) FROM schema_version")
        .fetch_one(&mut *conn)
        .await?;
    Ok(version)
}

/// Run one migration in an immediate transaction
///
/// Returns `false` if another process recorded the version first.
async fn apply(conn: &mut SqliteConnection, migration: &Migration) -> Result<bool> {
    sqlx::query("BEGIN IMMEDIATE").execute(&mut *conn).await?;

    let result = apply_locked(conn, migration).await;
    let finish = if result.is_ok() { "COMMIT" } else { "ROLLBACK" };

    match sqlx::query(finish).execute(&mut *conn).await {
        Ok(_) => result,
        Err(error) if result.is_err() => {
            warn!(version = migration.version, %error, "Rollback failed");
            result
        },
        Err(error) => {
            if let Err(rollback) = sqlx::query("ROLLBACK").execute(&mut *conn).await {
                warn!(version = migration.version, error = %rollback, "Rollback failed");
            }
            Err(error.into())
        },
    }
}

async fn apply_locked(conn: &mut SqliteConnection, migration: &Migration) -> Result<bool> {
    if current_version(conn).await? >= migration.version {
        debug!(version = migration.version, "Migration already recorded, skipping");
        return Ok(false);
    }

    for step in migration.steps {
        match *step {
            Step::Execute(sql) => {
                let result = sqlx::query(sql).execute(&mut *conn).await?;
                debug!(rows = result.rows_affected(), "Executed migration step");
            },
            Step::AddColumn {
                table,
                column,
                definition,
            } => {
                let exists: i64 = sqlx::query_scalar(
                    "SELECT COUNT(*) FROM pragma_table_info(?1) WHERE name = ?2",
                )
                .bind(table)
                .bind(column)
                .fetch_one(&mut *conn)
                .await?;

                if exists == 0 {
                    sqlx::query(&format!("ALTER TABLE {table} ADD COLUMN {column} {definition}"))
                        .execute(&mut *conn)
                        .await?;
                } else {
                    debug!(table, column, "Column already present");
                }
            },
        }
    }

    sqlx::query("INSERT INTO schema_version (version, applied_at) VALUES (?1, ?2)")
        .bind(migration.version)
        .bind(Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true))
        .execute(&mut *conn)
        .await?;

    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::scratch_pool;

    async fn version_rows(pool: &SqlitePool) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM schema_version")
            .fetch_one(pool)
            .await
            .unwrap()
    }

    async fn column_names(pool: &SqlitePool, table: &str) -> Vec<String> {
        sqlx::query_scalar("SELECT name FROM pragma_table_info(?1)")
            .bind(table)
            .fetch_all(pool)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_fresh_database_reaches_latest_version() {
        let (_dir, pool) = scratch_pool().await;

        let report = Migrator::default().run(&pool).await.unwrap();

        assert_eq!(report.from, 0);
        assert_eq!(report.to, 4);
        assert_eq!(report.applied, vec![1, 2, 3, 4]);
        assert!(column_names(&pool, "tickets").await.contains(&"completed_by_name".to_string()));
    }

    #[tokio::test]
    async fn test_second_run_is_a_noop() {
        let (_dir, pool) = scratch_pool().await;
        Migrator::default().run(&pool).await.unwrap();
        let rows_before = version_rows(&pool).await;

        // total_changes() is per connection; measure on the one that migrates
        let mut conn = pool.acquire().await.unwrap();
        let changes_before: i64 = sqlx::query_scalar("SELECT total_changes()")
            .fetch_one(&mut *conn)
            .await
            .unwrap();

        let report = Migrator::default().run_on(&mut conn).await.unwrap();

        let changes_after: i64 = sqlx::query_scalar("SELECT total_changes()")
            .fetch_one(&mut *conn)
            .await
            .unwrap();
        drop(conn);

        assert!(report.is_noop());
        assert_eq!(report.from, report.to);
        assert_eq!(changes_after, changes_before);
        assert_eq!(version_rows(&pool).await, rows_before);
    }

    #[tokio::test]
    async fn test_upgrade_from_version_one_converts_legacy_status() {
        let (_dir, pool) = scratch_pool().await;
        Migrator::new(&MIGRATIONS[..1]).run(&pool).await.unwrap();

        sqlx::query(
            "INSERT INTO tickets (reporter_id, reporter_name, description, status, created_at, updated_at)
             VALUES ('r', 'alice', 'legacy', 'CLAIMED', '2024-01-01T00:00:00.000000Z', '2024-01-01T00:00:00.000000Z')",
        )
        .execute(&pool)
        .await
        .unwrap();

        let report = Migrator::default().run(&pool).await.unwrap();
        assert_eq!(report.from, 1);
        assert_eq!(report.applied, vec![2, 3, 4]);

        let status: String = sqlx::query_scalar("SELECT status FROM tickets")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(status, "OPEN");
    }

    #[tokio::test]
    async fn test_add_column_tolerates_existing_column() {
        let (_dir, pool) = scratch_pool().await;
        Migrator::new(&MIGRATIONS[..2]).run(&pool).await.unwrap();

        // A previous partial run already added one of the columns
        sqlx::query("ALTER TABLE tickets ADD COLUMN closed_by TEXT")
            .execute(&pool)
            .await
            .unwrap();

        let report = Migrator::default().run(&pool).await.unwrap();
        assert_eq!(report.applied, vec![3, 4]);
        let columns = column_names(&pool, "tickets").await;
        assert_eq!(columns.iter().filter(|c| *c == "closed_by").count(), 1);
    }

    #[tokio::test]
    async fn test_failed_step_keeps_last_recorded_version() {
        const BROKEN: &[Migration] = &[
            Migration {
                version: 1,
                description: "ok",
                steps: &[Step::Execute("CREATE TABLE IF NOT EXISTS a (id INTEGER)")],
            },
            Migration {
                version: 2,
                description: "partial",
                steps: &[
                    Step::Execute("CREATE TABLE IF NOT EXISTS b (id INTEGER)"),
                    Step::Execute("INSERT INTO missing_table VALUES (1)"),
                ],
            },
            Migration {
                version: 3,
                description: "never reached",
                steps: &[Step::Execute("CREATE TABLE IF NOT EXISTS c (id INTEGER)")],
            },
        ];
        let (_dir, pool) = scratch_pool().await;

        let error = Migrator::new(BROKEN).run(&pool).await.unwrap_err();
        assert!(matches!(error, ModReqError::Migration { version: 2, .. }));

        let mut conn = pool.acquire().await.unwrap();
        assert_eq!(current_version(&mut conn).await.unwrap(), 1);
        let tables: Vec<String> =
            sqlx::query_scalar("SELECT name FROM sqlite_master WHERE type = 'table' AND name IN ('b', 'c')")
                .fetch_all(&mut *conn)
                .await
                .unwrap();
        assert!(tables.is_empty(), "partial migration was not rolled back");
    }

    #[tokio::test]
    async fn test_out_of_order_migrations_rejected() {
        const UNORDERED: &[Migration] = &[
            Migration {
                version: 2,
                description: "two",
                steps: &[],
            },
            Migration {
                version: 1,
                description: "one",
                steps: &[],
            },
        ];
        let (_dir, pool) = scratch_pool().await;

        let error = Migrator::new(UNORDERED).run(&pool).await.unwrap_err();
        assert!(matches!(
            error,
            ModReqError::MigrationOrder {
                previous: 2,
                version: 1
            }
        ));
    }
}
