//! Ticket lifecycle operations
//!
//! The service validates input, issues one conditional store write per
//! operation and turns the write's result into an [`Outcome`]. It never
//! reads a ticket to decide whether a mutation is allowed.

use super::query::Page;
use crate::config::SettingsConfig;
use crate::core::{
    Actor, Declined, Location, MAX_TEXT_LEN, NewNote, NewTicket, Note, Outcome, Status, Ticket,
    TicketId, TicketQuery,
};
use crate::error::{ModReqError, Result};
use crate::integration::{EventBus, EventKind, LifecycleEvent};
use crate::storage::{Mutation, TicketRepository, Transition};
use std::sync::Arc;
use tracing::{debug, error, info};
use uuid::Uuid;

/// Configured ticket limits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Open tickets a reporter may hold at once; 0 means unlimited
    pub max_open_per_reporter: u32,
    pub page_size: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self::from(&SettingsConfig::default())
    }
}

impl From<&SettingsConfig> for Limits {
    fn from(settings: &SettingsConfig) -> Self {
        Self {
            max_open_per_reporter: settings.max_requests_per_player,
            page_size: settings.list_page_size,
        }
    }
}

/// Trim and length-check user supplied text
fn validate_text(field: &str, text: &str) -> Result<String> {
    let text = text.trim();
    if text.is_empty() {
        return Err(ModReqError::InvalidInput(format!("{field} must not be empty")));
    }
    let len = text.chars().count();
    if len > MAX_TEXT_LEN {
        return Err(ModReqError::InvalidInput(format!(
            "{field} is {len} characters, the maximum is {MAX_TEXT_LEN}"
        )));
    }
    Ok(text.to_string())
}

fn log_failure(operation: &'static str) -> impl Fn(&ModReqError) {
    move |e| error!(operation, error = %e, retriable = e.is_retriable(), "Ticket operation failed")
}

/// Lifecycle operations over a [`TicketRepository`]
#[derive(Clone)]
pub struct TicketService {
    store: Arc<dyn TicketRepository>,
    events: EventBus,
    limits: Limits,
}

impl std::fmt::Debug for TicketService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TicketService")
            .field("store", &"Arc<dyn TicketRepository>")
            .field("events", &self.events)
            .field("limits", &self.limits)
            .finish()
    }
}

impl TicketService {
    #[must_use]
    pub fn new(store: Arc<dyn TicketRepository>, events: EventBus, limits: Limits) -> Self {
        Self {
            store,
            events,
            limits,
        }
    }

    #[must_use]
    pub const fn limits(&self) -> Limits {
        self.limits
    }

    #[must_use]
    pub const fn events(&self) -> &EventBus {
        &self.events
    }

    /// Open a new ticket for `reporter`
    ///
    /// Declines with [`Declined::QuotaExceeded`] when the reporter already
    /// holds the configured number of open tickets.
    pub async fn create(
        &self,
        reporter: &Actor,
        description: &str,
        location: Option<Location>,
    ) -> Result<Outcome<Ticket>> {
        let description = validate_text("description", description)?;
        let limit = self.limits.max_open_per_reporter;
        let new = NewTicket {
            reporter: reporter.clone(),
            description,
            location,
        };

        let inserted = self
            .store
            .insert_ticket(&new, limit)
            .await
            .inspect_err(log_failure("create"))?;

        let Some(ticket) = inserted else {
            debug!(reporter = %reporter, limit, "Create declined, quota reached");
            return Ok(Outcome::Declined(Declined::QuotaExceeded { limit }));
        };

        info!(ticket = %ticket.id, reporter = %reporter, "Ticket created");
        Ok(Outcome::Applied(self.announce(EventKind::Created, ticket, None)))
    }

    /// Claim an unclaimed ticket
    pub async fn claim(&self, id: TicketId, staff: &Actor) -> Result<Outcome<()>> {
        let mutation = self
            .store
            .claim(id, staff)
            .await
            .inspect_err(log_failure("claim"))?;

        Ok(self.claim_outcome("claim", id, staff, mutation, |_| Declined::AlreadyClaimed))
    }

    /// Claim a ticket regardless of who holds it
    ///
    /// Authorization is the caller's concern.
    pub async fn force_claim(&self, id: TicketId, staff: &Actor) -> Result<Outcome<()>> {
        let mutation = self
            .store
            .force_claim(id, staff)
            .await
            .inspect_err(log_failure("force_claim"))?;

        Ok(self.claim_outcome("force_claim", id, staff, mutation, |_| Declined::AlreadyClaimed))
    }

    /// Release the current claim
    pub async fn unclaim(&self, id: TicketId, staff: &Actor) -> Result<Outcome<()>> {
        let mutation = self
            .store
            .unclaim(id)
            .await
            .inspect_err(log_failure("unclaim"))?;

        Ok(self.claim_outcome("unclaim", id, staff, mutation, |_| Declined::NotClaimed))
    }

    fn claim_outcome(
        &self,
        operation: &'static str,
        id: TicketId,
        staff: &Actor,
        mutation: Mutation,
        rejected: impl FnOnce(Status) -> Declined,
    ) -> Outcome<()> {
        let outcome = match mutation {
            Mutation::Applied(()) => {
                info!(operation, ticket = %id, staff = %staff, "Claim updated");
                return Outcome::Applied(());
            },
            Mutation::Missing => Declined::NotFound,
            Mutation::Rejected { status } => rejected(status),
        };
        debug!(operation, ticket = %id, staff = %staff, reason = %outcome, "Declined");
        Outcome::Declined(outcome)
    }

    /// Raise a non-terminal ticket to senior staff
    pub async fn elevate(&self, id: TicketId, actor: &Actor) -> Result<Outcome<Ticket>> {
        self.transition(id, Transition::Elevate, EventKind::Elevated, actor)
            .await
    }

    /// Resolve a non-terminal ticket as done
    pub async fn complete(&self, id: TicketId, actor: &Actor) -> Result<Outcome<Ticket>> {
        self.transition(id, Transition::Complete(actor.clone()), EventKind::Completed, actor)
            .await
    }

    /// Close a non-terminal ticket without resolving it
    pub async fn close(&self, id: TicketId, actor: &Actor) -> Result<Outcome<Ticket>> {
        self.transition(id, Transition::Close(actor.clone()), EventKind::Closed, actor)
            .await
    }

    async fn transition(
        &self,
        id: TicketId,
        transition: Transition,
        kind: EventKind,
        actor: &Actor,
    ) -> Result<Outcome<Ticket>> {
        let mutation = self
            .store
            .transition(id, &transition)
            .await
            .inspect_err(log_failure("transition"))?;

        match mutation {
            Mutation::Applied(ticket) => {
                info!(
                    ticket = %id,
                    status = %transition.target(),
                    actor = %actor,
                    "Ticket status changed"
                );
                Ok(Outcome::Applied(self.announce(kind, ticket, Some(actor.name.clone()))))
            },
            Mutation::Missing => {
                debug!(ticket = %id, %kind, "Declined, ticket not found");
                Ok(Outcome::Declined(Declined::NotFound))
            },
            Mutation::Rejected { status } => {
                debug!(ticket = %id, %kind, %status, "Declined, ticket is terminal");
                Ok(Outcome::Declined(Declined::Terminal { status }))
            },
        }
    }

    /// Append a note; allowed in every status
    pub async fn add_note(
        &self,
        id: TicketId,
        author: &Actor,
        content: &str,
    ) -> Result<Outcome<Note>> {
        let note = NewNote {
            ticket_id: id,
            author: author.clone(),
            content: validate_text("note", content)?,
        };

        match self
            .store
            .add_note(&note)
            .await
            .inspect_err(log_failure("add_note"))?
        {
            Some(note) => {
                info!(ticket = %id, author = %author, "Note added");
                Ok(Outcome::Applied(note))
            },
            None => {
                debug!(ticket = %id, "Note declined, ticket not found");
                Ok(Outcome::Declined(Declined::NotFound))
            },
        }
    }

    /// Snapshot of one ticket with its notes
    pub async fn get(&self, id: TicketId) -> Result<Option<Ticket>> {
        self.store.get(id).await.inspect_err(log_failure("get"))
    }

    /// Tickets matching `query`, oldest first
    pub async fn list(&self, query: &TicketQuery) -> Result<Vec<Ticket>> {
        self.store
            .list(query)
            .await
            .inspect_err(log_failure("list"))
    }

    /// One page of [`Self::list`] using the configured page size
    pub async fn list_page(&self, query: &TicketQuery, page: usize) -> Result<Page<Ticket>> {
        let tickets = self.list(query).await?;
        Ok(Page::paginate(tickets, page, self.limits.page_size))
    }

    /// Open or elevated tickets currently held by `reporter`
    pub async fn count_open(&self, reporter: Uuid) -> Result<u32> {
        self.store
            .count_open(reporter)
            .await
            .inspect_err(log_failure("count_open"))
    }

    /// Whether `reporter` is below the open ticket quota right now
    ///
    /// Advisory only; [`Self::create`] enforces the quota atomically.
    pub async fn can_create(&self, reporter: Uuid) -> Result<bool> {
        let limit = self.limits.max_open_per_reporter;
        if limit == 0 {
            return Ok(true);
        }
        Ok(self.count_open(reporter).await? < limit)
    }

    /// Publish the snapshot a committed write returned
    fn announce(&self, kind: EventKind, ticket: Ticket, actor: Option<String>) -> Ticket {
        self.events
            .publish(LifecycleEvent::new(kind, ticket.clone(), actor));
        ticket
    }
}
