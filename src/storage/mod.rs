//! Ticket persistence
//!
//! Every ticket mutation is a single conditional statement against SQLite;
//! whether it took effect is read from the affected-row count, never from a
//! prior read. Schema changes are applied by [`Migrator`] when a
//! [`Database`] is opened.

pub mod migrations;
mod pool;
mod repository;
mod sqlite;

pub use migrations::{MIGRATIONS, Migration, MigrationReport, Migrator, Step};
pub use pool::{Database, connect};
#[cfg(test)]
pub use repository::MockTicketRepository;
pub use repository::{Mutation, TicketRepository, Transition};
pub use sqlite::{SqliteTicketStore, timestamp};
