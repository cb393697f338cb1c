//! Command-line interface for modreq

pub mod handlers;
pub mod output;

pub use output::OutputFormatter;

use crate::core::{Status, TicketId};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Moderator-assistance tickets for multiplayer game servers
#[derive(Debug, Parser)]
#[command(name = "modreq", version, about, long_about = None)]
pub struct Cli {
    /// Name of the player or staff member issuing the command
    #[arg(long = "as", global = true, env = "MODREQ_ACTOR", default_value = "console")]
    pub actor: String,

    /// Output results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Configuration file to load instead of the default location
    #[arg(long, global = true, env = "MODREQ_CONFIG")]
    pub config: Option<PathBuf>,

    /// Ticket database file, overriding `database.file`
    #[arg(long, global = true, env = "MODREQ_DATABASE")]
    pub database: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Open a new mod request
    Create {
        /// What you need help with
        #[arg(required = true, num_args = 1..)]
        description: Vec<String>,

        #[command(flatten)]
        location: LocationArgs,
    },

    /// Claim a request so other staff know you are handling it
    Claim {
        id: TicketId,

        /// Take over a request someone else has claimed
        #[arg(short, long)]
        force: bool,
    },

    /// Release your claim on a request
    Unclaim { id: TicketId },

    /// Escalate a request to senior staff
    Elevate { id: TicketId },

    /// Mark a request as completed
    Done { id: TicketId },

    /// Close a request without completing it
    Close { id: TicketId },

    /// Add a note to a request
    Note {
        id: TicketId,

        #[arg(required = true, num_args = 1..)]
        message: Vec<String>,
    },

    /// Show a request with its notes
    Info { id: TicketId },

    /// List requests, open and elevated ones by default
    List {
        /// Only requests in this status (repeatable)
        #[arg(short, long, value_name = "STATUS")]
        status: Vec<Status>,

        /// Include completed and closed requests
        #[arg(short, long, conflicts_with = "status")]
        all: bool,

        /// Only requests by players whose name contains this text
        #[arg(short, long)]
        player: Option<String>,

        /// Only your own requests
        #[arg(short, long, conflicts_with = "player")]
        mine: bool,

        #[arg(long, default_value_t = 1)]
        page: usize,
    },

    /// Teleport to the location a request was made at
    Tp { id: TicketId },

    /// Apply pending database migrations
    Migrate,

    /// Configuration management
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Write the default configuration file if none exists
    Init {
        /// Where to write it instead of the default location
        path: Option<PathBuf>,
    },

    /// Print the effective configuration
    Show,

    /// Print the default configuration file location
    Path,
}

/// Where the reporter was standing
#[derive(Debug, Clone, Args)]
pub struct LocationArgs {
    #[arg(long, requires_all = ["x", "y", "z"])]
    pub world: Option<String>,

    #[arg(long, requires = "world", allow_negative_numbers = true)]
    pub x: Option<f64>,

    #[arg(long, requires = "world", allow_negative_numbers = true)]
    pub y: Option<f64>,

    #[arg(long, requires = "world", allow_negative_numbers = true)]
    pub z: Option<f64>,

    #[arg(long, requires = "world", allow_negative_numbers = true)]
    pub yaw: Option<f32>,

    #[arg(long, requires = "world", allow_negative_numbers = true)]
    pub pitch: Option<f32>,
}

impl LocationArgs {
    #[must_use]
    pub fn into_location(self) -> Option<crate::core::Location> {
        let (world, x, y, z) = (self.world?, self.x?, self.y?, self.z?);
        Some(
            crate::core::Location::new(world, x, y, z)
                .with_rotation(self.yaw.unwrap_or_default(), self.pitch.unwrap_or_default()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_create_with_location() {
        let cli = Cli::try_parse_from([
            "modreq", "--as", "alice", "create", "stuck", "in", "wall", "--world", "overworld",
            "--x", "10", "--y", "64", "--z", "-3",
        ])
        .unwrap();

        assert_eq!(cli.actor, "alice");
        let Commands::Create {
            description,
            location,
        } = cli.command
        else {
            panic!("expected create");
        };
        assert_eq!(description.join(" "), "stuck in wall");
        let location = location.into_location().unwrap();
        assert_eq!(location.world, "overworld");
        assert!((location.z + 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_location_requires_all_coordinates() {
        let result = Cli::try_parse_from(["modreq", "create", "help", "--world", "overworld"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_ticket_id_accepts_hash_prefix() {
        let cli = Cli::try_parse_from(["modreq", "claim", "#12", "--force"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Claim { id, force: true } if id.get() == 12
        ));
    }
}
