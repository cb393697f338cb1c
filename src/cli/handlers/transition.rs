use super::base::{Completion, HandlerContext};
use crate::core::TicketId;
use crate::error::Result;

/// Status changes available from the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusChange {
    Elevate,
    Complete,
    Close,
}

impl StatusChange {
    const fn verb(self) -> (&'static str, &'static str) {
        match self {
            Self::Elevate => ("elevate", "Elevated"),
            Self::Complete => ("complete", "Completed"),
            Self::Close => ("close", "Closed"),
        }
    }
}

/// Handle the elevate, done and close commands
pub async fn handle_status_change(
    ctx: &HandlerContext,
    id: TicketId,
    change: StatusChange,
) -> Result<Completion> {
    let outcome = match change {
        StatusChange::Elevate => ctx.service.elevate(id, &ctx.actor).await?,
        StatusChange::Complete => ctx.service.complete(id, &ctx.actor).await?,
        StatusChange::Close => ctx.service.close(id, &ctx.actor).await?,
    };

    let (verb, past) = change.verb();
    ctx.report(&format!("{verb} request"), outcome, |formatter, ticket| {
        if formatter.is_json() {
            return formatter.print_json(&ticket);
        }
        formatter.success(&format!("{past} request {id}"));
        Ok(())
    })
}
