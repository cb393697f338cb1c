use super::base::{Completion, HandlerContext};
use crate::core::Location;
use crate::error::Result;

/// Handle the create command
///
/// The description words are joined with single spaces.
pub async fn handle_create(
    ctx: &HandlerContext,
    description: &[String],
    location: Option<Location>,
) -> Result<Completion> {
    let description = description.join(" ");
    let outcome = ctx
        .service
        .create(&ctx.actor, &description, location)
        .await?;

    ctx.report("create request", outcome, |formatter, ticket| {
        if formatter.is_json() {
            return formatter.print_json(&ticket);
        }
        formatter.success(&format!("Created mod request {}", ticket.id));
        if let Some(location) = &ticket.location {
            formatter.info(&format!("Location: {location}"));
        }
        formatter.info("Staff will be with you shortly.");
        Ok(())
    })
}
