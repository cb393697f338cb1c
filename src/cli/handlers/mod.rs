//! Command handlers
//!
//! Each handler runs one subcommand against a [`HandlerContext`] and reports
//! whether it took effect through [`Completion`].

mod base;
mod claim;
mod config;
mod create;
mod list;
mod migrate;
mod note;
mod show;
mod teleport;
mod transition;

pub use base::{Completion, HandlerContext, database_path, resolve_actor};
pub use claim::{handle_claim, handle_unclaim};
pub use config::handle_config_command;
pub use create::handle_create;
pub use list::{ListParams, handle_list};
pub use migrate::handle_migrate;
pub use note::handle_note;
pub use show::handle_info;
pub use teleport::handle_teleport;
pub use transition::{StatusChange, handle_status_change};
