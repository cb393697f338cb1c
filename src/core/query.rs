use super::Status;
use uuid::Uuid;

/// Which reporter a listing is restricted to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReporterFilter {
    /// Exact reporter identity
    Id(Uuid),
    /// Case-insensitive substring of the reporter's display name
    NameContains(String),
}

/// Filter for ticket listings
///
/// An empty status set matches every status. Results are always ordered
/// oldest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TicketQuery {
    pub statuses: Vec<Status>,
    pub reporter: Option<ReporterFilter>,
}

impl TicketQuery {
    /// Every ticket
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Open and elevated tickets
    #[must_use]
    pub fn active() -> Self {
        Self::with_statuses(Status::ACTIVE)
    }

    #[must_use]
    pub fn with_statuses(statuses: impl IntoIterator<Item = Status>) -> Self {
        let mut list: Vec<Status> = Vec::new();
        for status in statuses {
            if !list.contains(&status) {
                list.push(status);
            }
        }
        Self {
            statuses: list,
            reporter: None,
        }
    }

    #[must_use]
    pub fn reporter_id(mut self, id: Uuid) -> Self {
        self.reporter = Some(ReporterFilter::Id(id));
        self
    }

    #[must_use]
    pub fn reporter_name(mut self, fragment: impl Into<String>) -> Self {
        self.reporter = Some(ReporterFilter::NameContains(fragment.into()));
        self
    }

    /// Whether `status` passes the status filter
    #[must_use]
    pub fn matches_status(&self, status: Status) -> bool {
        self.statuses.is_empty() || self.statuses.contains(&status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_active_query() {
        let query = TicketQuery::active();
        assert!(query.matches_status(Status::Open));
        assert!(query.matches_status(Status::Elevated));
        assert!(!query.matches_status(Status::Closed));
    }

    #[test]
    fn test_duplicate_statuses_collapsed() {
        let query = TicketQuery::with_statuses([Status::Open, Status::Open, Status::Closed]);
        assert_eq!(query.statuses, vec![Status::Open, Status::Closed]);
    }

    #[test]
    fn test_empty_status_set_matches_everything() {
        let query = TicketQuery::all().reporter_name("ali");
        assert!(Status::ALL.iter().all(|s| query.matches_status(*s)));
        assert_eq!(
            query.reporter,
            Some(ReporterFilter::NameContains("ali".to_string()))
        );
    }
}
