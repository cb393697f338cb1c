use super::{Actor, Location, Note, Status, Ticket, TicketId};
use chrono::{DateTime, Utc};

/// Builder for creating Ticket instances
///
/// Used when rehydrating rows from the store and in tests; new tickets are
/// only ever persisted through the lifecycle service.
#[derive(Default)]
pub struct TicketBuilder {
    id: Option<TicketId>,
    reporter: Option<Actor>,
    description: Option<String>,
    status: Option<Status>,
    claimed_by: Option<Actor>,
    closed_by: Option<Actor>,
    completed_by: Option<Actor>,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
    closed_at: Option<DateTime<Utc>>,
    location: Option<Location>,
    notes: Vec<Note>,
}

impl TicketBuilder {
    /// Create a new ticket builder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the ticket ID
    #[must_use]
    pub const fn id(mut self, id: TicketId) -> Self {
        self.id = Some(id);
        self
    }

    /// Set the reporter
    #[must_use]
    pub fn reporter(mut self, reporter: Actor) -> Self {
        self.reporter = Some(reporter);
        self
    }

    /// Set the description
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the status
    #[must_use]
    pub const fn status(mut self, status: Status) -> Self {
        self.status = Some(status);
        self
    }

    /// Set the current claimant
    #[must_use]
    pub fn claimed_by(mut self, staff: Option<Actor>) -> Self {
        self.claimed_by = staff;
        self
    }

    /// Set who closed the ticket
    #[must_use]
    pub fn closed_by(mut self, staff: Option<Actor>) -> Self {
        self.closed_by = staff;
        self
    }

    /// Set who completed the ticket
    #[must_use]
    pub fn completed_by(mut self, staff: Option<Actor>) -> Self {
        self.completed_by = staff;
        self
    }

    /// Set `created_at` timestamp
    #[must_use]
    pub const fn created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }

    /// Set `updated_at` timestamp
    #[must_use]
    pub const fn updated_at(mut self, updated_at: DateTime<Utc>) -> Self {
        self.updated_at = Some(updated_at);
        self
    }

    /// Set `closed_at` timestamp
    #[must_use]
    pub const fn closed_at(mut self, closed_at: Option<DateTime<Utc>>) -> Self {
        self.closed_at = closed_at;
        self
    }

    /// Set the location
    #[must_use]
    pub fn location(mut self, location: Option<Location>) -> Self {
        self.location = location;
        self
    }

    /// Add notes
    #[must_use]
    pub fn notes(mut self, notes: Vec<Note>) -> Self {
        self.notes = notes;
        self
    }

    /// Add a single note
    #[must_use]
    pub fn note(mut self, note: Note) -> Self {
        self.notes.push(note);
        self
    }

    /// Build the ticket
    ///
    /// `updated_at` defaults to `created_at` and is never allowed to be
    /// earlier than it.
    pub fn build(self) -> Ticket {
        let created_at = self.created_at.unwrap_or_else(Utc::now);
        let updated_at = self.updated_at.unwrap_or(created_at).max(created_at);

        Ticket {
            id: self.id.unwrap_or(TicketId::new(0)),
            reporter: self
                .reporter
                .unwrap_or_else(|| Actor::from_name("unknown")),
            description: self.description.unwrap_or_default(),
            status: self.status.unwrap_or_default(),
            claimed_by: self.claimed_by,
            closed_by: self.closed_by,
            completed_by: self.completed_by,
            created_at,
            updated_at,
            closed_at: self.closed_at,
            location: self.location,
            notes: self.notes,
        }
    }
}

/// Builder for creating Note instances
#[derive(Default)]
pub struct NoteBuilder {
    id: Option<i64>,
    ticket_id: Option<TicketId>,
    author: Option<Actor>,
    content: Option<String>,
    created_at: Option<DateTime<Utc>>,
}

impl NoteBuilder {
    /// Create a new note builder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the note ID
    #[must_use]
    pub const fn id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    /// Set the owning ticket
    #[must_use]
    pub const fn ticket_id(mut self, ticket_id: TicketId) -> Self {
        self.ticket_id = Some(ticket_id);
        self
    }

    /// Set the author
    #[must_use]
    pub fn author(mut self, author: Actor) -> Self {
        self.author = Some(author);
        self
    }

    /// Set the content
    #[must_use]
    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    /// Set `created_at` timestamp
    #[must_use]
    pub const fn created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }

    /// Build the note
    pub fn build(self) -> Note {
        Note {
            id: self.id.unwrap_or_default(),
            ticket_id: self.ticket_id.unwrap_or(TicketId::new(0)),
            author: self.author.unwrap_or_else(|| Actor::from_name("unknown")),
            content: self.content.unwrap_or_default(),
            created_at: self.created_at.unwrap_or_else(Utc::now),
        }
    }
}
