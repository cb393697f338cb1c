use super::base::{Completion, HandlerContext};
use crate::core::TicketId;
use crate::error::Result;

/// Handle the note command
pub async fn handle_note(ctx: &HandlerContext, id: TicketId, message: &[String]) -> Result<Completion> {
    let content = message.join(" ");
    let outcome = ctx.service.add_note(id, &ctx.actor, &content).await?;

    ctx.report("add note", outcome, |formatter, note| {
        if formatter.is_json() {
            return formatter.print_json(&note);
        }
        formatter.success(&format!("Added note to request {id}"));
        Ok(())
    })
}
