//! Base handler utilities for common operations
//!
//! Opens the database, wires the lifecycle service to the configured
//! notification sinks and tears everything down again once a command is
//! finished.

use crate::cli::output::OutputFormatter;
use crate::config::Config;
use crate::core::{Actor, Outcome};
use crate::error::{ModReqError, Result};
use crate::host::HostHandle;
use crate::integration::{EventBus, NotificationSink, spawn_dispatcher};
use crate::service::{Limits, TicketService};
use crate::storage::{Database, TicketRepository};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// How long pending notifications may take to go out before exit
const NOTIFICATION_GRACE: Duration = Duration::from_secs(15);

/// How a command ended when it did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// The command took effect
    Done,
    /// A lifecycle precondition did not hold
    Declined,
}

impl Completion {
    /// Process exit code for this completion
    #[must_use]
    pub const fn exit_code(self) -> i32 {
        match self {
            Self::Done => 0,
            Self::Declined => 2,
        }
    }
}

/// Identity for the `--as` name
pub fn resolve_actor(name: &str) -> Result<Actor> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ModReqError::InvalidInput(
            "--as needs a player or staff name".to_string(),
        ));
    }
    Ok(Actor::from_name(name))
}

/// Database file from `--database`, else the configured one
#[must_use]
pub fn database_path(config: &Config, database: Option<&Path>) -> PathBuf {
    database.map_or_else(
        || config.database.resolved_path(&Config::data_dir()),
        Path::to_path_buf,
    )
}

/// Context for handler operations
///
/// Encapsulates the resources every ticket command needs.
pub struct HandlerContext {
    pub config: Config,
    pub service: TicketService,
    pub actor: Actor,
    pub host: HostHandle,
    pub formatter: OutputFormatter,
    database: Database,
    dispatcher: Option<JoinHandle<()>>,
}

impl HandlerContext {
    /// Open the database and start notification delivery
    pub async fn open(
        config: Config,
        database: Option<&Path>,
        actor: Actor,
        host: HostHandle,
        formatter: OutputFormatter,
    ) -> Result<Self> {
        let path = database_path(&config, database);
        let database = Database::open(&config.database, &path).await?;

        let events = EventBus::default();
        let sinks = notification_sinks(&config);
        let dispatcher = (!sinks.is_empty()).then(|| spawn_dispatcher(&events, sinks));

        let store: Arc<dyn TicketRepository> = Arc::new(database.store());
        let service = TicketService::new(store, events, Limits::from(&config.settings));

        Ok(Self {
            config,
            service,
            actor,
            host,
            formatter,
            database,
            dispatcher,
        })
    }

    /// Print the applied value with `on_applied`, or report the decline
    pub fn report<T>(
        &self,
        operation: &str,
        outcome: Outcome<T>,
        on_applied: impl FnOnce(&OutputFormatter, T) -> Result<()>,
    ) -> Result<Completion> {
        match outcome {
            Outcome::Applied(value) => {
                on_applied(&self.formatter, value)?;
                Ok(Completion::Done)
            },
            Outcome::Declined(reason) => {
                self.formatter.declined(operation, reason)?;
                Ok(Completion::Declined)
            },
        }
    }

    /// Flush pending notifications and close the database
    pub async fn shutdown(self) {
        let Self {
            service,
            database,
            dispatcher,
            ..
        } = self;

        // Dropping the last bus sender lets the dispatcher drain and exit
        drop(service);

        if let Some(handle) = dispatcher {
            match tokio::time::timeout(NOTIFICATION_GRACE, handle).await {
                Ok(Ok(())) => debug!("Notifications flushed"),
                Ok(Err(e)) => warn!(error = %e, "Notification dispatcher failed"),
                Err(_) => warn!("Timed out delivering notifications"),
            }
        }

        database.close().await;
    }
}

fn notification_sinks(config: &Config) -> Vec<Arc<dyn NotificationSink>> {
    let mut sinks: Vec<Arc<dyn NotificationSink>> = Vec::new();

    #[cfg(feature = "webhook")]
    {
        use crate::integration::webhook::WebhookSink;

        if config.discord.is_active() {
            match WebhookSink::new(&config.discord) {
                Ok(sink) => sinks.push(Arc::new(sink)),
                Err(e) => warn!(error = %e, "Discord notifications disabled"),
            }
        }
    }

    #[cfg(not(feature = "webhook"))]
    {
        if config.discord.is_active() {
            warn!("Discord notifications configured but webhook support is not compiled in");
        }
    }

    sinks
}
