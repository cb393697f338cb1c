use crate::core::{Actor, NewNote, NewTicket, Note, Status, Ticket, TicketId, TicketQuery};
use crate::error::Result;
use async_trait::async_trait;
use uuid::Uuid;

/// Result of a conditional write
///
/// The affected-row count decides between `Applied` and the other two; the
/// follow-up existence check only explains a write that did not happen.
/// Status changes carry the row as the same statement left it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation<T = ()> {
    /// Exactly one row matched the precondition and was changed
    Applied(T),
    /// The ticket exists but its state did not match the precondition
    Rejected { status: Status },
    /// No ticket with that id
    Missing,
}

impl<T> Mutation<T> {
    #[must_use]
    pub const fn is_applied(&self) -> bool {
        matches!(self, Self::Applied(_))
    }
}

/// A status change that ends in `status`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    Elevate,
    Complete(Actor),
    Close(Actor),
}

impl Transition {
    /// Status the ticket has after the transition
    #[must_use]
    pub const fn target(&self) -> Status {
        match self {
            Self::Elevate => Status::Elevated,
            Self::Complete(_) => Status::Completed,
            Self::Close(_) => Status::Closed,
        }
    }
}

/// Repository trait for ticket storage operations
///
/// Every state-changing method is a single conditional write; none of them
/// read the row first. Implementations must be usable from any worker thread.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TicketRepository: Send + Sync {
    /// Insert a new open ticket unless the reporter already has `max_open`
    /// open tickets (`0` disables the limit)
    ///
    /// Returns the stored ticket, or `None` when the quota check failed.
    async fn insert_ticket(&self, ticket: &NewTicket, max_open: u32) -> Result<Option<Ticket>>;

    /// Snapshot of a ticket including its notes
    async fn get(&self, id: TicketId) -> Result<Option<Ticket>>;

    /// Tickets matching `query`, oldest first, including their notes
    async fn list(&self, query: &TicketQuery) -> Result<Vec<Ticket>>;

    /// Number of open or elevated tickets raised by `reporter`
    async fn count_open(&self, reporter: Uuid) -> Result<u32>;

    /// Set the claimant if nobody holds the claim
    async fn claim(&self, id: TicketId, staff: &Actor) -> Result<Mutation>;

    /// Set the claimant unconditionally
    async fn force_claim(&self, id: TicketId, staff: &Actor) -> Result<Mutation>;

    /// Clear the claimant if someone holds the claim
    async fn unclaim(&self, id: TicketId) -> Result<Mutation>;

    /// Move a non-terminal ticket to the transition's target status
    ///
    /// An applied transition returns the snapshot read inside the writing
    /// transaction, so an error always means nothing was committed.
    async fn transition(&self, id: TicketId, transition: &Transition) -> Result<Mutation<Ticket>>;

    /// Append a note; `None` when the ticket does not exist
    async fn add_note(&self, note: &NewNote) -> Result<Option<Note>>;
}
