use super::base::{Completion, HandlerContext};
use crate::core::TicketId;
use crate::error::Result;
use serde_json::json;

/// Handle the claim command
pub async fn handle_claim(ctx: &HandlerContext, id: TicketId, force: bool) -> Result<Completion> {
    let outcome = if force {
        ctx.service.force_claim(id, &ctx.actor).await?
    } else {
        ctx.service.claim(id, &ctx.actor).await?
    };

    ctx.report("claim request", outcome, |formatter, ()| {
        if formatter.is_json() {
            return formatter.print_json(&json!({
                "status": "ok",
                "ticket": id,
                "claimed_by": ctx.actor.name,
                "forced": force,
            }));
        }
        formatter.success(&format!("Claimed request {id}"));
        Ok(())
    })
}

/// Handle the unclaim command
pub async fn handle_unclaim(ctx: &HandlerContext, id: TicketId) -> Result<Completion> {
    let outcome = ctx.service.unclaim(id, &ctx.actor).await?;

    ctx.report("unclaim request", outcome, |formatter, ()| {
        if formatter.is_json() {
            return formatter.print_json(&json!({ "status": "ok", "ticket": id }));
        }
        formatter.success(&format!("Unclaimed request {id}"));
        Ok(())
    })
}
