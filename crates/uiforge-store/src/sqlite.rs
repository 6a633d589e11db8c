use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use parking_lot::Mutex;
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, params};
use uiforge_session::{DurableStore, Session, SessionId};

use crate::{Result, StoreError};

mod embedded {
    use refinery::embed_migrations;
    embed_migrations!("migrations");
}

const SESSION_COLUMNS: &str =
    "id, owner_id, name, messages, code, ui, is_temporary, created_at, updated_at";

/// Durable session store over SQLite.
///
/// Thread-safe via internal `Mutex<Connection>`; every call runs on the
/// blocking thread pool.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open (or create) the database at `path` and run pending migrations.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .map_err(|e| StoreError::Migration(format!("{}: {}", parent.display(), e)))?;
        }

        let mut conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        Self::run_migrations(&mut conn)?;

        tracing::debug!(path = %path.display(), "Opened session database");
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        Self::run_migrations(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn run_migrations(conn: &mut Connection) -> Result<()> {
        embedded::migrations::runner()
            .run(conn)
            .map_err(|e| StoreError::Migration(e.to_string()))?;
        Ok(())
    }

    /// Run `f` against the connection on the blocking pool.
    async fn with_conn<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || f(&conn.lock()))
            .await
            .map_err(|e| StoreError::Task(e.to_string()))?
    }

    // ── Session rows ────────────────────────────────────────────────

    pub async fn get_session(&self, owner_id: &str, id: &SessionId) -> Result<Option<Session>> {
        let owner_id = owner_id.to_string();
        let id = id.as_str().to_string();
        self.with_conn(move |conn| {
            let session = conn
                .query_row(
                    &format!(
                        "SELECT {SESSION_COLUMNS} FROM sessions WHERE id = ?1 AND owner_id = ?2"
                    ),
                    params![id, owner_id],
                    row_to_session,
                )
                .optional()?;
            Ok(session)
        })
        .await
    }

    pub async fn list_sessions(&self, owner_id: &str) -> Result<Vec<Session>> {
        let owner_id = owner_id.to_string();
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {SESSION_COLUMNS} FROM sessions
                 WHERE owner_id = ?1 ORDER BY updated_at DESC"
            ))?;
            let rows = stmt.query_map(params![owner_id], row_to_session)?;

            let mut sessions = Vec::new();
            for r in rows {
                sessions.push(r?);
            }
            Ok(sessions)
        })
        .await
    }

    /// Insert or update a session row.
    ///
    /// An existing row with the same id but a different owner is left
    /// untouched.
    pub async fn upsert_session(&self, session: &Session) -> Result<()> {
        let id = session.id.as_str().to_string();
        let owner_id = session.owner_id.clone();
        let name = session.name.clone();
        let messages = serde_json::to_string(&session.messages)?;
        let code = session.code.clone();
        let ui = serde_json::to_string(&session.ui)?;
        let is_temporary = session.is_temporary;
        let created_at = format_dt(&session.created_at);
        let updated_at = format_dt(&session.last_activity());

        self.with_conn(move |conn| {
            let changed = conn.execute(
                "INSERT INTO sessions
                     (id, owner_id, name, messages, code, ui, is_temporary, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                 ON CONFLICT(id) DO UPDATE SET
                     name = excluded.name,
                     messages = excluded.messages,
                     code = excluded.code,
                     ui = excluded.ui,
                     is_temporary = excluded.is_temporary,
                     updated_at = excluded.updated_at
                 WHERE sessions.owner_id = excluded.owner_id",
                params![
                    id,
                    owner_id,
                    name,
                    messages,
                    code,
                    ui,
                    is_temporary as i32,
                    created_at,
                    updated_at
                ],
            )?;
            if changed == 0 {
                tracing::warn!(session_id = %id, "Upsert skipped: id belongs to another owner");
            }
            Ok(())
        })
        .await
    }

    pub async fn delete_session(&self, owner_id: &str, id: &SessionId) -> Result<bool> {
        let owner_id = owner_id.to_string();
        let id = id.as_str().to_string();
        self.with_conn(move |conn| {
            let changed = conn.execute(
                "DELETE FROM sessions WHERE id = ?1 AND owner_id = ?2",
                params![id, owner_id],
            )?;
            Ok(changed > 0)
        })
        .await
    }
}

#[async_trait]
impl DurableStore for SqliteStore {
    async fn get(&self, owner_id: &str, id: &SessionId) -> uiforge_session::Result<Option<Session>> {
        Ok(self.get_session(owner_id, id).await?)
    }

    async fn list_by_owner(&self, owner_id: &str) -> uiforge_session::Result<Vec<Session>> {
        Ok(self.list_sessions(owner_id).await?)
    }

    async fn upsert(&self, session: &Session) -> uiforge_session::Result<()> {
        Ok(self.upsert_session(session).await?)
    }

    async fn delete(&self, owner_id: &str, id: &SessionId) -> uiforge_session::Result<()> {
        self.delete_session(owner_id, id).await?;
        Ok(())
    }

    fn name(&self) -> &str {
        "sqlite"
    }
}

// ── Helpers ─────────────────────────────────────────────────────────

/// Fixed-width UTC timestamps so text order is chronological order.
fn format_dt(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_dt(idx: usize, s: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn parse_json<T: serde::de::DeserializeOwned>(idx: usize, s: &str) -> rusqlite::Result<T> {
    serde_json::from_str(s)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn row_to_session(row: &rusqlite::Row<'_>) -> rusqlite::Result<Session> {
    Ok(Session {
        id: SessionId::from(row.get::<_, String>(0)?),
        owner_id: row.get(1)?,
        name: row.get(2)?,
        messages: parse_json(3, &row.get::<_, String>(3)?)?,
        code: row.get(4)?,
        ui: parse_json(5, &row.get::<_, String>(5)?)?,
        is_temporary: row.get::<_, i32>(6)? != 0,
        created_at: parse_dt(7, &row.get::<_, String>(7)?)?,
        updated_at: Some(parse_dt(8, &row.get::<_, String>(8)?)?),
    })
}
