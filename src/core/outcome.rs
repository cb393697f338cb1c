use super::Status;
use serde::Serialize;
use std::fmt;

/// Why a lifecycle operation did not take effect
///
/// These are ordinary business outcomes, not errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum Declined {
    /// No ticket with the requested id exists
    NotFound,
    /// Someone already holds the claim
    AlreadyClaimed,
    /// Nobody holds the claim
    NotClaimed,
    /// The ticket is Completed or Closed
    Terminal { status: Status },
    /// The reporter already has the maximum number of open tickets
    QuotaExceeded { limit: u32 },
}

impl fmt::Display for Declined {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => f.write_str("ticket not found"),
            Self::AlreadyClaimed => f.write_str("ticket is already claimed"),
            Self::NotClaimed => f.write_str("ticket is not claimed"),
            Self::Terminal { status } => {
                write!(f, "ticket is already {}", status.display_name().to_lowercase())
            },
            Self::QuotaExceeded { limit } => {
                write!(f, "maximum number of open requests reached ({limit})")
            },
        }
    }
}

/// Result of a lifecycle operation that passed infrastructure checks
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub enum Outcome<T> {
    Applied(T),
    Declined(Declined),
}

impl<T> Outcome<T> {
    pub const fn is_applied(&self) -> bool {
        matches!(self, Self::Applied(_))
    }

    pub fn applied(self) -> Option<T> {
        match self {
            Self::Applied(value) => Some(value),
            Self::Declined(_) => None,
        }
    }

    pub const fn declined(&self) -> Option<Declined> {
        match self {
            Self::Applied(_) => None,
            Self::Declined(reason) => Some(*reason),
        }
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Outcome<U> {
        match self {
            Self::Applied(value) => Outcome::Applied(f(value)),
            Self::Declined(reason) => Outcome::Declined(reason),
        }
    }
}
