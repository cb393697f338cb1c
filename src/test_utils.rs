//! Test utilities for modreq
//!
//! Scratch databases and fixtures shared by the unit tests.

#![cfg(test)]

use crate::config::DatabaseConfig;
use crate::core::{Actor, NewTicket};
use crate::integration::EventBus;
use crate::service::{Limits, TicketService};
use crate::storage::{Database, Migrator, SqliteTicketStore, connect};
use sqlx::SqlitePool;
use std::sync::Arc;
use tempfile::TempDir;

/// Pool on an empty database file; no migrations applied
pub async fn scratch_pool() -> (TempDir, SqlitePool) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let pool = connect(&DatabaseConfig::default(), &dir.path().join("modreq.db"))
        .await
        .expect("Failed to open scratch database");
    (dir, pool)
}

/// Store on a fully migrated scratch database
pub async fn scratch_store() -> (TempDir, SqliteTicketStore) {
    let (dir, pool) = scratch_pool().await;
    Migrator::default()
        .run(&pool)
        .await
        .expect("Failed to migrate scratch database");
    (dir, SqliteTicketStore::new(pool))
}

/// Test fixture: a migrated database with a lifecycle service on top
pub struct TestDatabase {
    pub temp_dir: TempDir,
    pub database: Database,
    pub service: TicketService,
}

impl TestDatabase {
    pub async fn new() -> Self {
        Self::with_limits(Limits::default()).await
    }

    pub async fn with_limits(limits: Limits) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let database = Database::open(
            &DatabaseConfig::default(),
            &temp_dir.path().join("modreq.db"),
        )
        .await
        .expect("Failed to open database");
        let service = TicketService::new(
            Arc::new(database.store()),
            EventBus::default(),
            limits,
        );

        Self {
            temp_dir,
            database,
            service,
        }
    }
}

/// Unsaved ticket from a reporter name
pub fn new_ticket(reporter: &str, description: &str) -> NewTicket {
    NewTicket {
        reporter: Actor::from_name(reporter),
        description: description.to_string(),
        location: None,
    }
}
