//! Lifecycle notifications
//!
//! The lifecycle service publishes one [`LifecycleEvent`] per applied
//! transition on an [`EventBus`]. A dispatcher task forwards events to the
//! configured [`NotificationSink`]s. Delivery is best effort: failures are
//! logged and never reach the operation that produced the event.

#[cfg(feature = "webhook")]
pub mod webhook;

use crate::core::Ticket;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Default number of undelivered events a slow subscriber may fall behind
pub const DEFAULT_CAPACITY: usize = 100;

/// Lifecycle transitions that produce notifications
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Created,
    Elevated,
    Completed,
    Closed,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Created => "created",
            Self::Elevated => "elevated",
            Self::Completed => "completed",
            Self::Closed => "closed",
        })
    }
}

/// Snapshot of a ticket right after a transition
#[derive(Debug, Clone, Serialize)]
pub struct LifecycleEvent {
    pub kind: EventKind,
    /// Ticket state including its notes
    pub ticket: Ticket,
    /// Display name of the acting staff member, if any
    pub actor: Option<String>,
    pub at: DateTime<Utc>,
}

impl LifecycleEvent {
    #[must_use]
    pub fn new(kind: EventKind, ticket: Ticket, actor: Option<String>) -> Self {
        Self {
            kind,
            ticket,
            actor,
            at: Utc::now(),
        }
    }
}

/// Broadcast bus for lifecycle events
///
/// Cloning yields another handle to the same bus.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<LifecycleEvent>,
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.sender.receiver_count())
            .finish()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl EventBus {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Get an event receiver
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<LifecycleEvent> {
        self.sender.subscribe()
    }

    /// Publish an event; returns the number of subscribers it reached
    pub fn publish(&self, event: LifecycleEvent) -> usize {
        let kind = event.kind;
        let ticket = event.ticket.id;
        match self.sender.send(event) {
            Ok(receivers) => {
                debug!(%kind, %ticket, receivers, "Published lifecycle event");
                receivers
            },
            Err(_) => {
                debug!(%kind, %ticket, "No subscribers for lifecycle event");
                0
            },
        }
    }
}

/// Destination for lifecycle notifications
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Short name used in log output
    fn name(&self) -> &str;

    async fn deliver(&self, event: &LifecycleEvent) -> anyhow::Result<()>;
}

/// Forward events from `bus` to every sink until the bus is dropped
///
/// Sinks run one after another per event; a failing sink does not stop the
/// others.
pub fn spawn_dispatcher(bus: &EventBus, sinks: Vec<Arc<dyn NotificationSink>>) -> JoinHandle<()> {
    let mut receiver = bus.subscribe();

    tokio::spawn(async move {
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    for sink in &sinks {
                        if let Err(e) = sink.deliver(&event).await {
                            warn!(
                                sink = sink.name(),
                                kind = %event.kind,
                                ticket = %event.ticket.id,
                                error = %e,
                                "Notification delivery failed"
                            );
                        }
                    }
                },
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Notification dispatcher fell behind, events dropped");
                },
                Err(broadcast::error::RecvError::Closed) => {
                    debug!("Event bus closed, stopping notification dispatcher");
                    break;
                },
            }
        }
    })
}
