//! modreq - Moderator-assistance tickets for multiplayer game servers
//!
//! This crate provides the ticket lifecycle engine behind the `modreq`
//! command:
//! - A ticket model with an Open/Elevated/Completed/Closed state machine and
//!   a claim that is independent of status
//! - A SQLite store whose mutations are single conditional statements
//! - Versioned schema migrations applied on startup
//! - Best-effort lifecycle notifications (Discord webhooks)

// Allow missing error documentation for internal implementations
#![allow(clippy::missing_errors_doc)]
// Allow some pedantic lints that don't improve code quality
#![allow(clippy::option_if_let_else)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_self)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_panics_doc)]

//! # Concurrent Safety
//!
//! Claims and status changes never read a ticket before writing it. Each one
//! is an `UPDATE ... WHERE id = ? AND <expected state>` and the affected-row
//! count decides whether it took effect, so two staff members racing to
//! claim the same ticket cannot both succeed. Ticket creation checks the
//! per-player quota inside the `INSERT` itself.
//!
//! # Example
//!
//! ```rust,ignore
//! use modreq::config::DatabaseConfig;
//! use modreq::core::Actor;
//! use modreq::integration::EventBus;
//! use modreq::service::{Limits, TicketService};
//! use modreq::storage::Database;
//! use std::sync::Arc;
//!
//! let db = Database::open(&DatabaseConfig::default(), "modreq.db".as_ref()).await?;
//! let service = TicketService::new(Arc::new(db.store()), EventBus::default(), Limits::default());
//!
//! let alice = Actor::from_name("alice");
//! let ticket = service.create(&alice, "stuck in wall", None).await?;
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod host;
pub mod integration;
pub mod service;
pub mod storage;

#[cfg(test)]
pub mod test_utils;

// Re-export commonly used types
pub use error::{ModReqError, Result};
