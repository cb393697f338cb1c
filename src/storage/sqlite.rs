//! SQLite implementation of [`TicketRepository`]

use super::repository::{Mutation, TicketRepository, Transition};
use crate::core::{
    Actor, Location, NewNote, NewTicket, Note, NoteBuilder, ReporterFilter, Status, Ticket,
    TicketBuilder, TicketId, TicketQuery,
};
use crate::error::{ModReqError, Result};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use sqlx::sqlite::SqliteQueryResult;
use sqlx::{FromRow, QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use std::collections::HashMap;
use tracing::{debug, trace};
use uuid::Uuid;

macro_rules! ticket_columns {
    () => {
        "id, reporter_id, reporter_name, description, status, claimed_by, claimed_by_name, \
         closed_by, closed_by_name, completed_by, completed_by_name, world_name, x, y, z, yaw, \
         pitch, created_at, updated_at, closed_at"
    };
}

const SELECT_TICKET: &str = concat!("SELECT ", ticket_columns!(), " FROM tickets WHERE id = ?1");

const SELECT_NOTES: &str = "SELECT id, ticket_id, author_id, author_name, content, created_at \
                            FROM ticket_notes WHERE ticket_id IN (";

const INSERT_WITH_QUOTA: &str = concat!(
    "INSERT INTO tickets (reporter_id, reporter_name, description, status, world_name, x, y, z, \
     yaw, pitch, created_at, updated_at) \
     SELECT ?1, ?2, ?3, 'OPEN', ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10 \
     WHERE ?11 = 0 OR (SELECT COUNT(*) FROM tickets WHERE reporter_id = ?1 \
     AND status IN ('OPEN', 'ELEVATED')) < ?11 RETURNING ",
    ticket_columns!()
);

const COUNT_OPEN: &str = "SELECT COUNT(*) FROM tickets \
                          WHERE reporter_id = ?1 AND status IN ('OPEN', 'ELEVATED')";

const CLAIM: &str = "UPDATE tickets SET claimed_by = ?2, claimed_by_name = ?3, \
                     updated_at = MAX(updated_at, ?4) WHERE id = ?1 AND claimed_by IS NULL";

const FORCE_CLAIM: &str = "UPDATE tickets SET claimed_by = ?2, claimed_by_name = ?3, \
                           updated_at = MAX(updated_at, ?4) WHERE id = ?1";

const UNCLAIM: &str = "UPDATE tickets SET claimed_by = NULL, claimed_by_name = NULL, \
                       updated_at = MAX(updated_at, ?2) WHERE id = ?1 AND claimed_by IS NOT NULL";

const ELEVATE: &str = concat!(
    "UPDATE tickets SET status = 'ELEVATED', updated_at = MAX(updated_at, ?2) \
     WHERE id = ?1 AND status IN ('OPEN', 'ELEVATED') RETURNING ",
    ticket_columns!()
);

const COMPLETE: &str = concat!(
    "UPDATE tickets SET status = 'COMPLETED', completed_by = ?3, completed_by_name = ?4, \
     closed_at = MAX(created_at, ?2), updated_at = MAX(updated_at, ?2) \
     WHERE id = ?1 AND status IN ('OPEN', 'ELEVATED') RETURNING ",
    ticket_columns!()
);

const CLOSE: &str = concat!(
    "UPDATE tickets SET status = 'CLOSED', closed_by = ?3, closed_by_name = ?4, \
     closed_at = MAX(created_at, ?2), updated_at = MAX(updated_at, ?2) \
     WHERE id = ?1 AND status IN ('OPEN', 'ELEVATED') RETURNING ",
    ticket_columns!()
);

const INSERT_NOTE: &str = "INSERT INTO ticket_notes (ticket_id, author_id, author_name, content, \
     created_at) SELECT ?1, ?2, ?3, ?4, ?5 WHERE EXISTS (SELECT 1 FROM tickets WHERE id = ?1)";

const TOUCH: &str = "UPDATE tickets SET updated_at = MAX(updated_at, ?2) WHERE id = ?1";

/// SQLite keeps at most 32766 host parameters per statement; stay well below
const NOTE_BATCH: usize = 500;

/// Current time at the precision stored in the database
#[must_use]
pub fn timestamp() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Fixed-width RFC 3339 text, so lexical order matches time order
fn encode_time(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn decode_time(table: &'static str, value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|at| at.with_timezone(&Utc))
        .map_err(|e| ModReqError::CorruptRow {
            table,
            reason: format!("bad timestamp {value:?}: {e}"),
        })
}

fn decode_uuid(table: &'static str, value: &str) -> Result<Uuid> {
    Uuid::parse_str(value).map_err(|e| ModReqError::CorruptRow {
        table,
        reason: format!("bad identity {value:?}: {e}"),
    })
}

fn decode_actor(id: Option<String>, name: Option<String>) -> Result<Option<Actor>> {
    id.map(|id| Ok(Actor::new(decode_uuid("tickets", &id)?, name.unwrap_or_default())))
        .transpose()
}

/// `%fragment%` with LIKE wildcards in the fragment escaped by `\`
fn like_pattern(fragment: &str) -> String {
    let mut pattern = String::with_capacity(fragment.len() + 2);
    pattern.push('%');
    for c in fragment.to_lowercase().chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

#[derive(Debug, FromRow)]
struct TicketRow {
    id: i64,
    reporter_id: String,
    reporter_name: String,
    description: String,
    status: String,
    claimed_by: Option<String>,
    claimed_by_name: Option<String>,
    closed_by: Option<String>,
    closed_by_name: Option<String>,
    completed_by: Option<String>,
    completed_by_name: Option<String>,
    world_name: Option<String>,
    x: Option<f64>,
    y: Option<f64>,
    z: Option<f64>,
    yaw: Option<f64>,
    pitch: Option<f64>,
    created_at: String,
    updated_at: String,
    closed_at: Option<String>,
}

impl TicketRow {
    #[allow(clippy::cast_possible_truncation)]
    fn into_ticket(self, notes: Vec<Note>) -> Result<Ticket> {
        let status = self.status.parse::<Status>().map_err(|reason| ModReqError::CorruptRow {
            table: "tickets",
            reason,
        })?;

        let location = match (self.world_name, self.x, self.y, self.z) {
            (Some(world), Some(x), Some(y), Some(z)) => Some(
                Location::new(world, x, y, z).with_rotation(
                    self.yaw.unwrap_or_default() as f32,
                    self.pitch.unwrap_or_default() as f32,
                ),
            ),
            _ => None,
        };

        Ok(TicketBuilder::new()
            .id(TicketId::new(self.id))
            .reporter(Actor::new(
                decode_uuid("tickets", &self.reporter_id)?,
                self.reporter_name,
            ))
            .description(self.description)
            .status(status)
            .claimed_by(decode_actor(self.claimed_by, self.claimed_by_name)?)
            .closed_by(decode_actor(self.closed_by, self.closed_by_name)?)
            .completed_by(decode_actor(self.completed_by, self.completed_by_name)?)
            .created_at(decode_time("tickets", &self.created_at)?)
            .updated_at(decode_time("tickets", &self.updated_at)?)
            .closed_at(
                self.closed_at
                    .as_deref()
                    .map(|at| decode_time("tickets", at))
                    .transpose()?,
            )
            .location(location)
            .notes(notes)
            .build())
    }
}

#[derive(Debug, FromRow)]
struct NoteRow {
    id: i64,
    ticket_id: i64,
    author_id: String,
    author_name: String,
    content: String,
    created_at: String,
}

impl TryFrom<NoteRow> for Note {
    type Error = ModReqError;

    fn try_from(row: NoteRow) -> Result<Self> {
        Ok(NoteBuilder::new()
            .id(row.id)
            .ticket_id(TicketId::new(row.ticket_id))
            .author(Actor::new(
                decode_uuid("ticket_notes", &row.author_id)?,
                row.author_name,
            ))
            .content(row.content)
            .created_at(decode_time("ticket_notes", &row.created_at)?)
            .build())
    }
}

/// Notes for `ticket_ids`, grouped by ticket and ordered oldest first
async fn load_notes(
    conn: &mut SqliteConnection,
    ticket_ids: &[i64],
) -> Result<HashMap<i64, Vec<Note>>> {
    let mut by_ticket: HashMap<i64, Vec<Note>> = HashMap::new();

    for chunk in ticket_ids.chunks(NOTE_BATCH) {
        let mut builder = QueryBuilder::<Sqlite>::new(SELECT_NOTES);
        let mut ids = builder.separated(", ");
        for id in chunk {
            ids.push_bind(*id);
        }
        ids.push_unseparated(") ORDER BY created_at ASC, id ASC");

        let rows: Vec<NoteRow> = builder.build_query_as().fetch_all(&mut *conn).await?;
        for row in rows {
            let note = Note::try_from(row)?;
            by_ticket.entry(note.ticket_id.get()).or_default().push(note);
        }
    }

    Ok(by_ticket)
}

async fn hydrate(conn: &mut SqliteConnection, rows: Vec<TicketRow>) -> Result<Vec<Ticket>> {
    let ids: Vec<i64> = rows.iter().map(|row| row.id).collect();
    let mut notes = load_notes(conn, &ids).await?;

    rows.into_iter()
        .map(|row| {
            let ticket_notes = notes.remove(&row.id).unwrap_or_default();
            row.into_ticket(ticket_notes)
        })
        .collect()
}

async fn hydrate_one(conn: &mut SqliteConnection, row: TicketRow) -> Result<Ticket> {
    let notes = load_notes(conn, &[row.id]).await?.remove(&row.id);
    row.into_ticket(notes.unwrap_or_default())
}

/// Ticket store over a shared SQLite pool
#[derive(Debug, Clone)]
pub struct SqliteTicketStore {
    pool: SqlitePool,
}

impl SqliteTicketStore {
    /// Wrap an already migrated pool
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Explain a conditional write from its affected-row count
    async fn outcome(&self, id: TicketId, result: &SqliteQueryResult) -> Result<Mutation> {
        if result.rows_affected() > 0 {
            return Ok(Mutation::Applied(()));
        }
        self.explain(id).await
    }

    /// Why a conditional write matched no row
    async fn explain<T>(&self, id: TicketId) -> Result<Mutation<T>> {
        let status: Option<String> = sqlx::query_scalar("SELECT status FROM tickets WHERE id = ?1")
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await?;

        match status {
            None => Ok(Mutation::Missing),
            Some(status) => {
                let status = status.parse::<Status>().map_err(|reason| ModReqError::CorruptRow {
                    table: "tickets",
                    reason,
                })?;
                debug!(ticket = %id, ?status, "Conditional update matched no row");
                Ok(Mutation::Rejected { status })
            },
        }
    }

    async fn set_claim(&self, sql: &'static str, id: TicketId, staff: &Actor) -> Result<Mutation> {
        let result = sqlx::query(sql)
            .bind(id.get())
            .bind(staff.id.to_string())
            .bind(staff.name.as_str())
            .bind(encode_time(&timestamp()))
            .execute(&self.pool)
            .await?;
        self.outcome(id, &result).await
    }
}

#[async_trait]
impl TicketRepository for SqliteTicketStore {
    async fn insert_ticket(&self, ticket: &NewTicket, max_open: u32) -> Result<Option<Ticket>> {
        let location = ticket.location.as_ref();
        let row: Option<TicketRow> = sqlx::query_as(INSERT_WITH_QUOTA)
            .bind(ticket.reporter.id.to_string())
            .bind(ticket.reporter.name.as_str())
            .bind(ticket.description.as_str())
            .bind(location.map(|l| l.world.clone()))
            .bind(location.map(|l| l.x))
            .bind(location.map(|l| l.y))
            .bind(location.map(|l| l.z))
            .bind(location.map(|l| f64::from(l.yaw)))
            .bind(location.map(|l| f64::from(l.pitch)))
            .bind(encode_time(&timestamp()))
            .bind(i64::from(max_open))
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            debug!(reporter = %ticket.reporter, max_open, "Open ticket quota reached");
            return Ok(None);
        };

        trace!(ticket = row.id, "Inserted ticket");
        row.into_ticket(Vec::new()).map(Some)
    }

    async fn get(&self, id: TicketId) -> Result<Option<Ticket>> {
        let mut tx = self.pool.begin().await?;

        let row: Option<TicketRow> = sqlx::query_as(SELECT_TICKET)
            .bind(id.get())
            .fetch_optional(&mut *tx)
            .await?;

        let ticket = match row {
            Some(row) => Some(hydrate_one(&mut *tx, row).await?),
            None => None,
        };

        tx.commit().await?;
        Ok(ticket)
    }

    async fn list(&self, query: &TicketQuery) -> Result<Vec<Ticket>> {
        let mut builder = QueryBuilder::<Sqlite>::new(concat!(
            "SELECT ",
            ticket_columns!(),
            " FROM tickets WHERE 1 = 1"
        ));

        if !query.statuses.is_empty() {
            builder.push(" AND status IN (");
            let mut statuses = builder.separated(", ");
            for status in &query.statuses {
                statuses.push_bind(status.as_str());
            }
            statuses.push_unseparated(")");
        }

        match &query.reporter {
            Some(ReporterFilter::Id(id)) => {
                builder.push(" AND reporter_id = ").push_bind(id.to_string());
            },
            Some(ReporterFilter::NameContains(fragment)) => {
                builder
                    .push(" AND LOWER(reporter_name) LIKE ")
                    .push_bind(like_pattern(fragment))
                    .push(" ESCAPE '\\'");
            },
            None => {},
        }

        builder.push(" ORDER BY created_at ASC, id ASC");

        let mut tx = self.pool.begin().await?;
        let rows: Vec<TicketRow> = builder.build_query_as().fetch_all(&mut *tx).await?;
        let tickets = hydrate(&mut *tx, rows).await?;
        tx.commit().await?;

        Ok(tickets)
    }

    async fn count_open(&self, reporter: Uuid) -> Result<u32> {
        let count: i64 = sqlx::query_scalar(COUNT_OPEN)
            .bind(reporter.to_string())
            .fetch_one(&self.pool)
            .await?;
        Ok(u32::try_from(count).unwrap_or(u32::MAX))
    }

    async fn claim(&self, id: TicketId, staff: &Actor) -> Result<Mutation> {
        self.set_claim(CLAIM, id, staff).await
    }

    async fn force_claim(&self, id: TicketId, staff: &Actor) -> Result<Mutation> {
        self.set_claim(FORCE_CLAIM, id, staff).await
    }

    async fn unclaim(&self, id: TicketId) -> Result<Mutation> {
        let result = sqlx::query(UNCLAIM)
            .bind(id.get())
            .bind(encode_time(&timestamp()))
            .execute(&self.pool)
            .await?;
        self.outcome(id, &result).await
    }

    async fn transition(&self, id: TicketId, transition: &Transition) -> Result<Mutation<Ticket>> {
        let now = encode_time(&timestamp());
        let query = match transition {
            Transition::Elevate => sqlx::query_as::<_, TicketRow>(ELEVATE).bind(id.get()).bind(now),
            Transition::Complete(staff) => sqlx::query_as::<_, TicketRow>(COMPLETE)
                .bind(id.get())
                .bind(now)
                .bind(staff.id.to_string())
                .bind(staff.name.as_str()),
            Transition::Close(staff) => sqlx::query_as::<_, TicketRow>(CLOSE)
                .bind(id.get())
                .bind(now)
                .bind(staff.id.to_string())
                .bind(staff.name.as_str()),
        };

        // Snapshot and write commit together; dropping `tx` on error rolls back
        let mut tx = self.pool.begin().await?;
        let row = query.fetch_optional(&mut *tx).await?;
        let Some(row) = row else {
            tx.rollback().await?;
            return self.explain(id).await;
        };

        let ticket = hydrate_one(&mut *tx, row).await?;
        tx.commit().await?;

        Ok(Mutation::Applied(ticket))
    }

    async fn add_note(&self, note: &NewNote) -> Result<Option<Note>> {
        let created_at = timestamp();
        let stamp = encode_time(&created_at);
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(INSERT_NOTE)
            .bind(note.ticket_id.get())
            .bind(note.author.id.to_string())
            .bind(note.author.name.as_str())
            .bind(note.content.as_str())
            .bind(stamp.as_str())
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(None);
        }
        let note_id = result.last_insert_rowid();

        sqlx::query(TOUCH)
            .bind(note.ticket_id.get())
            .bind(stamp.as_str())
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(Some(
            NoteBuilder::new()
                .id(note_id)
                .ticket_id(note.ticket_id)
                .author(note.author.clone())
                .content(note.content.clone())
                .created_at(created_at)
                .build(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{new_ticket, scratch_store};

    #[tokio::test]
    async fn test_insert_and_get_round_trip() {
        let (_dir, store) = scratch_store().await;
        let location = Location::new("overworld", 10.5, 64.0, -3.25).with_rotation(90.0, -12.5);
        let mut ticket = new_ticket("alice", "stuck in wall");
        ticket.location = Some(location.clone());

        let inserted = store.insert_ticket(&ticket, 5).await.unwrap().unwrap();
        let id = inserted.id;
        let stored = store.get(id).await.unwrap().unwrap();

        assert_eq!(stored, inserted);
        assert_eq!(stored.reporter, ticket.reporter);
        assert_eq!(stored.status, Status::Open);
        assert_eq!(stored.location, Some(location));
        assert!(stored.claimed_by.is_none());
        assert!(stored.closed_at.is_none());
        assert_eq!(stored.created_at, stored.updated_at);
    }

    #[tokio::test]
    async fn test_get_missing_ticket() {
        let (_dir, store) = scratch_store().await;
        assert!(store.get(TicketId::new(404)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_quota_counts_only_active_tickets() {
        let (_dir, store) = scratch_store().await;
        let ticket = new_ticket("alice", "help");

        let first = store.insert_ticket(&ticket, 2).await.unwrap().unwrap().id;
        store.insert_ticket(&ticket, 2).await.unwrap().unwrap();
        assert!(store.insert_ticket(&ticket, 2).await.unwrap().is_none());
        assert_eq!(store.count_open(ticket.reporter.id).await.unwrap(), 2);

        let staff = Actor::from_name("bob");
        store
            .transition(first, &Transition::Close(staff))
            .await
            .unwrap();
        assert!(store.insert_ticket(&ticket, 2).await.unwrap().is_some());

        // Zero disables the limit
        for _ in 0..5 {
            assert!(store.insert_ticket(&ticket, 0).await.unwrap().is_some());
        }
    }

    #[tokio::test]
    async fn test_claim_is_conditional() {
        let (_dir, store) = scratch_store().await;
        let id = store
            .insert_ticket(&new_ticket("alice", "help"), 0)
            .await
            .unwrap()
            .unwrap()
            .id;
        let bob = Actor::from_name("bob");
        let carol = Actor::from_name("carol");

        assert_eq!(store.claim(id, &bob).await.unwrap(), Mutation::Applied(()));
        assert_eq!(
            store.claim(id, &carol).await.unwrap(),
            Mutation::Rejected {
                status: Status::Open
            }
        );
        assert_eq!(store.get(id).await.unwrap().unwrap().claimed_by, Some(bob));

        assert_eq!(store.force_claim(id, &carol).await.unwrap(), Mutation::Applied(()));
        assert_eq!(
            store.get(id).await.unwrap().unwrap().claimed_by,
            Some(carol)
        );

        assert_eq!(store.unclaim(id).await.unwrap(), Mutation::Applied(()));
        assert!(matches!(
            store.unclaim(id).await.unwrap(),
            Mutation::Rejected { .. }
        ));
        assert_eq!(
            store.claim(TicketId::new(99), &Actor::from_name("bob")).await.unwrap(),
            Mutation::Missing
        );
    }

    #[tokio::test]
    async fn test_terminal_ticket_rejects_transitions() {
        let (_dir, store) = scratch_store().await;
        let id = store
            .insert_ticket(&new_ticket("alice", "help"), 0)
            .await
            .unwrap()
            .unwrap()
            .id;
        let bob = Actor::from_name("bob");

        assert!(store.transition(id, &Transition::Elevate).await.unwrap().is_applied());
        assert!(
            store
                .transition(id, &Transition::Complete(bob.clone()))
                .await
                .unwrap()
                .is_applied()
        );

        let done = store.get(id).await.unwrap().unwrap();
        assert_eq!(done.status, Status::Completed);
        assert_eq!(done.completed_by, Some(bob.clone()));
        assert!(done.closed_at.is_some());
        assert!(done.closed_by.is_none());

        for transition in [
            Transition::Elevate,
            Transition::Complete(bob.clone()),
            Transition::Close(bob.clone()),
        ] {
            assert_eq!(
                store.transition(id, &transition).await.unwrap(),
                Mutation::Rejected {
                    status: Status::Completed
                }
            );
        }
        assert_eq!(
            store.transition(TicketId::new(77), &Transition::Elevate).await.unwrap(),
            Mutation::Missing
        );
    }

    #[tokio::test]
    async fn test_transition_returns_committed_snapshot() {
        let (_dir, store) = scratch_store().await;
        let id = store
            .insert_ticket(&new_ticket("alice", "help"), 0)
            .await
            .unwrap()
            .unwrap()
            .id;
        let bob = Actor::from_name("bob");
        let note = NewNote {
            ticket_id: id,
            author: bob.clone(),
            content: "on it".to_string(),
        };
        store.add_note(&note).await.unwrap().unwrap();

        let Mutation::Applied(snapshot) = store
            .transition(id, &Transition::Close(bob.clone()))
            .await
            .unwrap()
        else {
            panic!("close should apply");
        };

        assert_eq!(snapshot.status, Status::Closed);
        assert_eq!(snapshot.closed_by, Some(bob));
        assert_eq!(snapshot.notes.len(), 1);
        assert_eq!(snapshot, store.get(id).await.unwrap().unwrap());
    }

    #[tokio::test]
    async fn test_notes_ordered_and_touch_ticket() {
        let (_dir, store) = scratch_store().await;
        let id = store
            .insert_ticket(&new_ticket("alice", "help"), 0)
            .await
            .unwrap()
            .unwrap()
            .id;
        let created = store.get(id).await.unwrap().unwrap();
        let bob = Actor::from_name("bob");

        for content in ["first", "second", "third"] {
            let note = NewNote {
                ticket_id: id,
                author: bob.clone(),
                content: content.to_string(),
            };
            store.add_note(&note).await.unwrap().unwrap();
        }

        let ticket = store.get(id).await.unwrap().unwrap();
        let contents: Vec<&str> = ticket.notes.iter().map(|n| n.content.as_str()).collect();
        assert_eq!(contents, ["first", "second", "third"]);
        assert!(ticket.updated_at >= created.updated_at);

        let orphan = NewNote {
            ticket_id: TicketId::new(500),
            author: bob,
            content: "nobody home".to_string(),
        };
        assert!(store.add_note(&orphan).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_filters_and_order() {
        let (_dir, store) = scratch_store().await;
        let a1 = store.insert_ticket(&new_ticket("Alice", "one"), 0).await.unwrap().unwrap().id;
        let b1 = store.insert_ticket(&new_ticket("bob", "two"), 0).await.unwrap().unwrap().id;
        let a2 = store.insert_ticket(&new_ticket("alice", "three"), 0).await.unwrap().unwrap().id;
        store
            .transition(b1, &Transition::Close(Actor::from_name("mod")))
            .await
            .unwrap();

        let all: Vec<TicketId> = store
            .list(&TicketQuery::all())
            .await
            .unwrap()
            .iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(all, vec![a1, b1, a2]);

        let active = store.list(&TicketQuery::active()).await.unwrap();
        assert_eq!(active.iter().map(|t| t.id).collect::<Vec<_>>(), vec![a1, a2]);

        let by_name = store
            .list(&TicketQuery::all().reporter_name("ALI"))
            .await
            .unwrap();
        assert_eq!(by_name.len(), 2);

        let wildcard = store
            .list(&TicketQuery::all().reporter_name("%"))
            .await
            .unwrap();
        assert!(wildcard.is_empty());

        let reporter = Actor::from_name("bob").id;
        let closed = store
            .list(&TicketQuery::with_statuses([Status::Closed]).reporter_id(reporter))
            .await
            .unwrap();
        assert_eq!(closed.len(), 1);
        assert_eq!(closed[0].id, b1);
    }

    #[tokio::test]
    async fn test_corrupt_status_is_an_error() {
        let (_dir, store) = scratch_store().await;
        let id = store
            .insert_ticket(&new_ticket("alice", "help"), 0)
            .await
            .unwrap()
            .unwrap()
            .id;
        sqlx::query("UPDATE tickets SET status = 'WAT' WHERE id = ?1")
            .bind(id.get())
            .execute(&store.pool)
            .await
            .unwrap();

        let error = store.get(id).await.unwrap_err();
        assert!(matches!(error, ModReqError::CorruptRow { table: "tickets", .. }));
    }

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("Al_%"), "%al\\_\\%%");
    }

    #[test]
    fn test_timestamps_sort_lexically() {
        let early = timestamp();
        let late = early + chrono::Duration::microseconds(1);
        assert!(encode_time(&early) < encode_time(&late));
        assert_eq!(decode_time("tickets", &encode_time(&early)).unwrap(), early);
    }
}
