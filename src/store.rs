// Durable persistence for draft headers and the append-only pick log.
//
// The engine only ever appends picks and rewrites the small draft header;
// it never updates or deletes a pick row. Anything that can satisfy that
// contract can sit behind `DraftStore`; the shipped implementation is
// SQLite.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use anyhow::{Context, Result};
use rusqlite::{params, Connection};

use crate::catalog::Position;
use crate::draft::state::{DraftMeta, Pick};

/// Storage seam for the engine.
///
/// `append_pick` must be idempotent per `(draft_id, overall)` so that a
/// crash-and-replay never duplicates a pick, and `load_picks` must return
/// picks ordered by overall sequence number.
pub trait DraftStore: Send + Sync {
    /// Write (or overwrite) the draft header.
    fn save_draft(&self, meta: &DraftMeta) -> Result<()>;

    /// Read a draft header, `None` if the draft has never been saved.
    fn load_draft(&self, draft_id: &str) -> Result<Option<DraftMeta>>;

    /// Append one accepted pick. A repeat of an already-stored overall
    /// number is a no-op.
    fn append_pick(&self, draft_id: &str, pick: &Pick) -> Result<()>;

    /// All stored picks for a draft, ordered by overall sequence number.
    fn load_picks(&self, draft_id: &str) -> Result<Vec<Pick>>;

    /// Whether any pick has been stored for a draft.
    fn has_picks(&self, draft_id: &str) -> Result<bool>;
}

static DRAFT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Generate a unique draft id from the current UTC timestamp.
///
/// Format: `draft_YYYYMMDD_HHMMSS_SSS_NNN` (e.g.
/// `draft_20260825_143022_123_000`). The trailing counter keeps ids unique
/// even when several drafts are created in the same millisecond.
pub fn generate_draft_id() -> String {
    let seq = DRAFT_SEQ.fetch_add(1, Ordering::Relaxed) % 1000;
    let now = chrono::Utc::now();
    format!("{}_{seq:03}", now.format("draft_%Y%m%d_%H%M%S_%3f"))
}

/// SQLite-backed `DraftStore`.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) a SQLite database at `path` and ensure the schema
    /// exists. Pass `":memory:"` for an ephemeral in-memory database
    /// (useful for tests).
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open database at {path}"))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;
             PRAGMA foreign_keys = ON;",
        )
        .context("failed to set database pragmas")?;

        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS drafts (
                draft_id TEXT PRIMARY KEY,
                meta     TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS draft_picks (
                draft_id  TEXT NOT NULL,
                overall   INTEGER NOT NULL,
                team_id   TEXT NOT NULL,
                player_id TEXT NOT NULL,
                position  TEXT NOT NULL,
                picked_at TEXT NOT NULL,
                PRIMARY KEY (draft_id, overall)
            );
            ",
        )
        .context("failed to create database schema")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Acquire the database connection.
    ///
    /// Panics if the mutex is poisoned (another thread panicked while
    /// holding the lock). This should never happen in normal operation.
    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().expect("database mutex poisoned")
    }

    /// Number of picks stored for a draft.
    pub fn pick_count(&self, draft_id: &str) -> Result<usize> {
        let conn = self.conn();
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM draft_picks WHERE draft_id = ?1",
                params![draft_id],
                |row| row.get(0),
            )
            .context("failed to count draft picks")?;
        Ok(count as usize)
    }
}

impl DraftStore for SqliteStore {
    fn save_draft(&self, meta: &DraftMeta) -> Result<()> {
        let conn = self.conn();
        let meta_json =
            serde_json::to_string(meta).context("failed to serialize draft meta")?;
        conn.execute(
            "INSERT OR REPLACE INTO drafts (draft_id, meta) VALUES (?1, ?2)",
            params![meta.draft_id, meta_json],
        )
        .context("failed to save draft meta")?;
        Ok(())
    }

    fn load_draft(&self, draft_id: &str) -> Result<Option<DraftMeta>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare("SELECT meta FROM drafts WHERE draft_id = ?1")
            .context("failed to prepare load_draft query")?;

        let mut rows = stmt
            .query_map(params![draft_id], |row| row.get::<_, String>(0))
            .context("failed to query draft meta")?;

        match rows.next() {
            Some(row_result) => {
                let meta_json = row_result.context("failed to read draft meta row")?;
                let meta: DraftMeta = serde_json::from_str(&meta_json)
                    .context("failed to deserialize draft meta")?;
                Ok(Some(meta))
            }
            None => Ok(None),
        }
    }

    fn append_pick(&self, draft_id: &str, pick: &Pick) -> Result<()> {
        let conn = self.conn();
        conn.execute(
            "INSERT OR IGNORE INTO draft_picks
                (draft_id, overall, team_id, player_id, position, picked_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                draft_id,
                pick.overall,
                pick.team_id,
                pick.player_id,
                pick.position.display_str(),
                pick.picked_at.to_rfc3339(),
            ],
        )
        .context("failed to append draft pick")?;
        Ok(())
    }

    fn load_picks(&self, draft_id: &str) -> Result<Vec<Pick>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare(
                "SELECT overall, team_id, player_id, position, picked_at
                 FROM draft_picks WHERE draft_id = ?1 ORDER BY overall",
            )
            .context("failed to prepare load_picks query")?;

        let rows = stmt
            .query_map(params![draft_id], |row| {
                Ok((
                    row.get::<_, u32>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                ))
            })
            .context("failed to query draft picks")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("failed to map draft pick rows")?;

        let mut picks = Vec::with_capacity(rows.len());
        for (overall, team_id, player_id, position, picked_at) in rows {
            let position = Position::from_str_pos(&position)
                .with_context(|| format!("unknown position '{position}' in stored pick"))?;
            let picked_at = chrono::DateTime::parse_from_rfc3339(&picked_at)
                .with_context(|| format!("bad timestamp '{picked_at}' in stored pick"))?
                .with_timezone(&chrono::Utc);
            picks.push(Pick {
                overall,
                team_id,
                player_id,
                position,
                picked_at,
            });
        }
        Ok(picks)
    }

    fn has_picks(&self, draft_id: &str) -> Result<bool> {
        let conn = self.conn();
        let exists: bool = conn
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM draft_picks WHERE draft_id = ?1)",
                params![draft_id],
                |row| row.get(0),
            )
            .context("failed to check draft_picks existence")?;
        Ok(exists)
    }
}
