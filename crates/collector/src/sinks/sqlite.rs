//! SqliteSink - durable, idempotent event store
//!
//! Rows are keyed on the event id and inserted with `INSERT OR IGNORE`,
//! so a batch redelivered after a failed acknowledgement leaves one row per
//! event.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use rusqlite::{params, Connection};
use tracing::{debug, info, instrument};

use contracts::{Event, EventId, EventSink, ItemFailure, SinkError};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS events (
    id          TEXT PRIMARY KEY,
    type        TEXT NOT NULL,
    action      TEXT NOT NULL,
    account_id  TEXT NOT NULL,
    time        INTEGER NOT NULL,
    server_id   TEXT,
    user_id     TEXT
);
"#;

const INSERT_EVENT: &str = r#"
INSERT OR IGNORE INTO events (id, type, action, account_id, time, server_id, user_id)
VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
"#;

/// Flattened `events` table row
#[derive(Debug, Clone)]
struct EventRow {
    id: EventId,
    type_name: &'static str,
    action: String,
    account_id: String,
    time: i64,
    server_id: Option<String>,
    user_id: Option<String>,
}

impl From<&Event> for EventRow {
    fn from(event: &Event) -> Self {
        Self {
            id: *event.id(),
            type_name: event.type_name(),
            action: event.action().to_string(),
            account_id: event.account_id().to_string(),
            time: event.created().timestamp(),
            server_id: event.server_id().map(str::to_string),
            user_id: event.user_id().map(str::to_string),
        }
    }
}

/// Sink that stores events in a SQLite `events` table
pub struct SqliteSink {
    name: String,
    conn: Arc<Mutex<Connection>>,
}

impl SqliteSink {
    /// Open (or create) the database at `path` and provision the table
    pub fn open(name: impl Into<String>, path: impl AsRef<Path>) -> Result<Self, SinkError> {
        let name = name.into();
        let conn = Connection::open(path.as_ref())
            .map_err(|e| SinkError::write(&name, format!("open failed: {e}")))?;
        conn.execute_batch("PRAGMA journal_mode = WAL; PRAGMA synchronous = NORMAL;")
            .map_err(|e| SinkError::write(&name, format!("pragma failed: {e}")))?;
        Self::with_connection(name, conn)
    }

    /// In-memory database (for testing)
    pub fn open_in_memory(name: impl Into<String>) -> Result<Self, SinkError> {
        let name = name.into();
        let conn = Connection::open_in_memory()
            .map_err(|e| SinkError::write(&name, format!("open failed: {e}")))?;
        Self::with_connection(name, conn)
    }

    /// Create from params (for factory)
    pub fn from_params(
        name: impl Into<String>,
        params: &HashMap<String, String>,
    ) -> Result<Self, SinkError> {
        let name = name.into();
        let path = params
            .get("path")
            .ok_or_else(|| SinkError::write(&name, "missing 'path' parameter"))?;
        Self::open(name, path)
    }

    fn with_connection(name: String, conn: Connection) -> Result<Self, SinkError> {
        conn.execute_batch(SCHEMA)
            .map_err(|e| SinkError::write(&name, format!("schema provisioning failed: {e}")))?;
        debug!(sink = %name, "SqliteSink schema ready");
        Ok(Self {
            name,
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Number of stored events
    pub fn event_count(&self) -> Result<usize, SinkError> {
        let conn = self.lock()?;
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM events", [], |row| row.get(0))
            .map_err(|e| SinkError::write(&self.name, e.to_string()))?;
        Ok(count as usize)
    }

    /// Whether an event with `id` is stored
    pub fn contains(&self, id: &EventId) -> Result<bool, SinkError> {
        let conn = self.lock()?;
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM events WHERE id = ?1",
                [id.to_string()],
                |row| row.get(0),
            )
            .map_err(|e| SinkError::write(&self.name, e.to_string()))?;
        Ok(count > 0)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, SinkError> {
        self.conn
            .lock()
            .map_err(|_| SinkError::write(&self.name, "connection mutex poisoned"))
    }
}

/// Insert every row in one transaction, collecting per-row failures
fn insert_rows(
    conn: &Mutex<Connection>,
    rows: &[EventRow],
) -> Result<Vec<ItemFailure>, String> {
    let mut conn = conn
        .lock()
        .map_err(|_| "connection mutex poisoned".to_string())?;
    let tx = conn.transaction().map_err(|e| e.to_string())?;

    let mut failures = Vec::new();
    {
        let mut stmt = tx.prepare_cached(INSERT_EVENT).map_err(|e| e.to_string())?;
        for row in rows {
            if let Err(e) = stmt.execute(params![
                row.id.to_string(),
                row.type_name,
                row.action,
                row.account_id,
                row.time,
                row.server_id,
                row.user_id,
            ]) {
                failures.push(ItemFailure {
                    event_id: row.id,
                    message: e.to_string(),
                });
            }
        }
    }

    tx.commit().map_err(|e| e.to_string())?;
    Ok(failures)
}

impl EventSink for SqliteSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "sqlite_sink_put",
        skip(self, events),
        fields(sink = %self.name, events = events.len())
    )]
    async fn put(&mut self, events: &[Event]) -> Result<(), SinkError> {
        let rows: Vec<EventRow> = events.iter().map(EventRow::from).collect();
        let conn = Arc::clone(&self.conn);

        let failures = tokio::task::spawn_blocking(move || insert_rows(&conn, &rows))
            .await
            .map_err(|e| SinkError::write(&self.name, format!("insert task failed: {e}")))?
            .map_err(|e| SinkError::write(&self.name, e))?;

        if failures.is_empty() {
            Ok(())
        } else {
            Err(SinkError::Items {
                sink_name: self.name.clone(),
                failures,
            })
        }
    }

    #[instrument(name = "sqlite_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), SinkError> {
        info!(sink = %self.name, "SqliteSink closed");
        Ok(())
    }
}
