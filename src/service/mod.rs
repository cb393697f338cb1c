//! Ticket lifecycle service

mod lifecycle;
mod query;

pub use crate::core::{ReporterFilter, TicketQuery};
pub use lifecycle::{Limits, TicketService};
pub use query::Page;
