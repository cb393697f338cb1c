use super::Status;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Maximum length, in characters, of descriptions and note contents
pub const MAX_TEXT_LEN: usize = 500;

/// Store-assigned ticket identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TicketId(i64);

impl TicketId {
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for TicketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl FromStr for TicketId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim_start_matches('#').parse().map(Self)
    }
}

/// A player or staff identity
///
/// The name is a cached display name; the id is authoritative.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Actor {
    pub id: Uuid,
    pub name: String,
}

impl Actor {
    pub fn new(id: Uuid, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }

    /// Identity derived deterministically from a name, for callers that
    /// only know the name (console, offline tooling)
    pub fn from_name(name: impl Into<String>) -> Self {
        let name = name.into();
        let id = Uuid::new_v5(&Uuid::NAMESPACE_OID, format!("modreq:{name}").as_bytes());
        Self { id, name }
    }
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Position in a world at which a ticket was raised
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub world: String,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub yaw: f32,
    pub pitch: f32,
}

impl Location {
    pub fn new(world: impl Into<String>, x: f64, y: f64, z: f64) -> Self {
        Self {
            world: world.into(),
            x,
            y,
            z,
            yaw: 0.0,
            pitch: 0.0,
        }
    }

    #[must_use]
    pub const fn with_rotation(mut self, yaw: f32, pitch: f32) -> Self {
        self.yaw = yaw;
        self.pitch = pitch;
        self
    }

    /// Where to put a staff member teleporting to this ticket: one block
    /// above the recorded position so they do not land inside the floor
    #[must_use]
    pub fn teleport_target(&self) -> Self {
        Self {
            y: self.y + 1.0,
            ..self.clone()
        }
    }
}

impl fmt::Display for Location {
    #[allow(clippy::cast_possible_truncation)]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}, {}, {})",
            self.world, self.x as i64, self.y as i64, self.z as i64
        )
    }
}

/// A staff annotation on a ticket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: i64,
    pub ticket_id: TicketId,
    pub author: Actor,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// A moderator-assistance request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: TicketId,
    pub reporter: Actor,
    pub description: String,
    pub status: Status,
    pub claimed_by: Option<Actor>,
    pub closed_by: Option<Actor>,
    pub completed_by: Option<Actor>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
    pub location: Option<Location>,
    pub notes: Vec<Note>,
}

impl Ticket {
    #[must_use]
    pub const fn is_open(&self) -> bool {
        !self.status.is_terminal()
    }

    #[must_use]
    pub const fn is_claimed(&self) -> bool {
        self.claimed_by.is_some()
    }

    /// Staff member credited with the terminal transition, if any
    #[must_use]
    pub fn resolved_by(&self) -> Option<&Actor> {
        match self.status {
            Status::Completed => self.completed_by.as_ref(),
            Status::Closed => self.closed_by.as_ref(),
            Status::Open | Status::Elevated => None,
        }
    }
}

/// Input for a ticket that has not been persisted yet
#[derive(Debug, Clone, PartialEq)]
pub struct NewTicket {
    pub reporter: Actor,
    pub description: String,
    pub location: Option<Location>,
}

/// Input for a note that has not been persisted yet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNote {
    pub ticket_id: TicketId,
    pub author: Actor,
    pub content: String,
}
