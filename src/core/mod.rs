//! Ticket data model
//!
//! Plain data types shared by the store, the lifecycle service and the
//! presentation layer. Nothing in here touches storage or I/O.

mod builders;
mod outcome;
mod query;
mod status;
mod ticket;

pub use builders::{NoteBuilder, TicketBuilder};
pub use outcome::{Declined, Outcome};
pub use query::{ReporterFilter, TicketQuery};
pub use status::Status;
pub use ticket::{Actor, Location, MAX_TEXT_LEN, NewNote, NewTicket, Note, Ticket, TicketId};
