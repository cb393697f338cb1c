use super::base::{Completion, HandlerContext};
use crate::core::{Declined, TicketId};
use crate::error::Result;
use serde_json::json;
use tracing::debug;

/// Handle the tp command
///
/// The ticket is loaded on a worker; moving the player happens on the main
/// loop, which owns world state.
pub async fn handle_teleport(ctx: &HandlerContext, id: TicketId) -> Result<Completion> {
    let Some(ticket) = ctx.service.get(id).await? else {
        ctx.formatter.declined("teleport", Declined::NotFound)?;
        return Ok(Completion::Declined);
    };

    let Some(location) = ticket.location.as_ref() else {
        ctx.formatter
            .warning(&format!("No location data for request {id}"));
        return Ok(Completion::Declined);
    };

    let target = location.teleport_target();
    let player = ctx.actor.name.clone();
    let formatter = ctx.formatter;
    let destination = target.clone();

    ctx.host
        .run_on_main(move || {
            debug!(%player, location = %destination, "Teleporting player");
            formatter.success(&format!("Teleported {player} to {destination}"));
        })
        .await?;

    if ctx.formatter.is_json() {
        ctx.formatter.print_json(&json!({
            "status": "ok",
            "ticket": id,
            "player": ctx.actor.name,
            "target": target,
        }))?;
    } else {
        ctx.formatter.info(&format!(
            "Request {id} by {}: {}",
            ticket.reporter.name, ticket.description
        ));
    }
    Ok(Completion::Done)
}
