use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle status of a ticket
///
/// `Completed` and `Closed` are terminal: once a ticket reaches either of
/// them no further status transition is accepted. Claiming is tracked
/// separately and never changes the status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// Awaiting staff attention
    #[default]
    Open,
    /// Escalated for admin attention
    Elevated,
    /// Resolved by staff
    Completed,
    /// Closed without resolution
    Closed,
}

impl Status {
    pub const ALL: [Self; 4] = [Self::Open, Self::Elevated, Self::Completed, Self::Closed];

    /// Statuses that still accept lifecycle transitions
    pub const ACTIVE: [Self; 2] = [Self::Open, Self::Elevated];

    #[must_use]
    pub const fn is_terminal(self) -> bool {
        match self {
            Self::Open | Self::Elevated => false,
            Self::Completed | Self::Closed => true,
        }
    }

    /// Column value used by the store
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "OPEN",
            Self::Elevated => "ELEVATED",
            Self::Completed => "COMPLETED",
            Self::Closed => "CLOSED",
        }
    }

    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Open => "Open",
            Self::Elevated => "Elevated",
            Self::Completed => "Completed",
            Self::Closed => "Closed",
        }
    }

    /// Legacy ampersand color code shown in chat
    #[must_use]
    pub const fn color_code(self) -> &'static str {
        match self {
            Self::Open => "&a",
            Self::Elevated => "&6",
            Self::Completed => "&2",
            Self::Closed => "&7",
        }
    }

    #[must_use]
    pub fn colored_display_name(self) -> String {
        format!("{}{}", self.color_code(), self.display_name())
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "OPEN" => Ok(Self::Open),
            "ELEVATED" => Ok(Self::Elevated),
            "COMPLETED" | "DONE" => Ok(Self::Completed),
            "CLOSED" => Ok(Self::Closed),
            _ => Err(format!("Unknown status: {s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_statuses() {
        assert!(!Status::Open.is_terminal());
        assert!(!Status::Elevated.is_terminal());
        assert!(Status::Completed.is_terminal());
        assert!(Status::Closed.is_terminal());
    }

    #[test]
    fn test_status_parsing() {
        for status in Status::ALL {
            assert_eq!(status.as_str().parse::<Status>().unwrap(), status);
        }
        assert_eq!("done".parse::<Status>().unwrap(), Status::Completed);
        assert!("claimed".parse::<Status>().is_err());
    }

    #[test]
    fn test_colored_display_name() {
        assert_eq!(Status::Elevated.colored_display_name(), "&6Elevated");
        assert_eq!(Status::Closed.to_string(), "Closed");
    }
}
