use super::base::{Completion, HandlerContext};
use crate::core::{Declined, TicketId};
use crate::error::Result;

/// Handle the info command
pub async fn handle_info(ctx: &HandlerContext, id: TicketId) -> Result<Completion> {
    match ctx.service.get(id).await? {
        Some(ticket) => {
            ctx.formatter.print_ticket(&ticket)?;
            Ok(Completion::Done)
        },
        None => {
            ctx.formatter.declined("show request", Declined::NotFound)?;
            Ok(Completion::Declined)
        },
    }
}
