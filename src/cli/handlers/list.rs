use super::base::{Completion, HandlerContext};
use crate::core::{Status, TicketQuery};
use crate::error::Result;

/// Filters accepted by the list command
#[derive(Debug, Clone, Default)]
pub struct ListParams {
    pub statuses: Vec<Status>,
    pub all: bool,
    pub player: Option<String>,
    pub mine: bool,
    pub page: usize,
}

impl ListParams {
    fn query(&self, ctx: &HandlerContext) -> TicketQuery {
        let query = if self.all {
            TicketQuery::all()
        } else if self.statuses.is_empty() {
            TicketQuery::active()
        } else {
            TicketQuery::with_statuses(self.statuses.iter().copied())
        };

        if self.mine {
            query.reporter_id(ctx.actor.id)
        } else if let Some(player) = &self.player {
            query.reporter_name(player.clone())
        } else {
            query
        }
    }
}

/// Handle the list command
pub async fn handle_list(ctx: &HandlerContext, params: &ListParams) -> Result<Completion> {
    let page = ctx
        .service
        .list_page(&params.query(ctx), params.page)
        .await?;
    ctx.formatter.print_page(&page)?;
    Ok(Completion::Done)
}
