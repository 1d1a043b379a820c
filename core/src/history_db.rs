//! Persistent command history
//!
//! One SQLite table, appended to after every executed command. Reads are
//! newest-first pages with optional folder and command-text filters.

use crate::dispatcher::CommandStatus;
use crate::errors::{Result, ScmError};
use crate::session::ModeKind;
use chrono::{DateTime, Utc};
use rusqlite::functions::FunctionFlags;
use rusqlite::{Connection, OptionalExtension, params};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Embedded schema SQL from HISTORY_SCHEMA.sql
const SCHEMA_SQL: &str = include_str!("../HISTORY_SCHEMA.sql");

pub const DEFAULT_PAGE_SIZE: u32 = 50;

/// A row from command_history
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    pub mode: ModeKind,
    pub folder: Option<String>,
    pub command_text: String,
    pub status: CommandStatus,
    pub summary: String,
    pub output_text: String,
}

/// Everything but the id, which the database assigns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewHistoryEntry {
    pub timestamp: DateTime<Utc>,
    pub mode: ModeKind,
    pub folder: Option<String>,
    pub command_text: String,
    pub status: CommandStatus,
    pub summary: String,
    pub output_text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryQuery {
    /// 1-indexed.
    pub page: u32,
    pub page_size: u32,
    /// Exact folder match.
    pub folder: Option<String>,
    /// Case-insensitive substring of the command text.
    pub text: Option<String>,
}

impl Default for HistoryQuery {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            folder: None,
            text: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryPage {
    /// Newest first.
    pub entries: Vec<HistoryEntry>,
    /// Matching entries across all pages.
    pub total: u64,
    pub query: HistoryQuery,
}

impl HistoryPage {
    pub fn total_pages(&self) -> u64 {
        self.total.div_ceil(u64::from(self.query.page_size.max(1)))
    }

    pub fn has_next(&self) -> bool {
        u64::from(self.query.page) < self.total_pages()
    }

    pub fn has_previous(&self) -> bool {
        self.query.page > 1
    }
}

/// History database wrapper
pub struct HistoryDb {
    conn: Connection,
}

impl HistoryDb {
    /// Open (creating if needed) the history database at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| {
                ScmError::history_db_with_source(
                    format!("failed to create history directory: {}", parent.display()),
                    e,
                )
            })?;
        }

        let conn = Connection::open(path).map_err(|e| {
            ScmError::history_db_with_source(
                format!("failed to open history db at {}", path.display()),
                e,
            )
        })?;
        conn.busy_timeout(Duration::from_secs(5))
            .map_err(|e| ScmError::history_db_with_source("failed to set busy timeout", e))?;

        Self::apply_schema(&conn)?;

        tracing::debug!(path = %path.display(), "history db initialized");

        Ok(Self { conn })
    }

    /// In-memory database; nothing survives the process.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| ScmError::history_db_with_source("failed to open in-memory db", e))?;

        Self::apply_schema(&conn)?;

        Ok(Self { conn })
    }

    fn apply_schema(conn: &Connection) -> Result<()> {
        conn.execute_batch(SCHEMA_SQL)
            .map_err(|e| ScmError::history_db_with_source("failed to apply schema", e))?;
        register_fold_case(conn)
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Writes
    // ─────────────────────────────────────────────────────────────────────────────

    /// Append one entry and return its id.
    pub fn record(&self, entry: &NewHistoryEntry) -> Result<i64> {
        self.conn
            .execute(
                r#"
                INSERT INTO command_history
                    (timestamp, mode, folder, command_text, status, summary, output_text)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
                params![
                    entry.timestamp.to_rfc3339(),
                    entry.mode.as_ref(),
                    entry.folder,
                    entry.command_text,
                    entry.status.as_ref(),
                    entry.summary,
                    entry.output_text,
                ],
            )
            .map_err(|e| ScmError::history_db_with_source("failed to record command", e))?;
        let id = self.conn.last_insert_rowid();
        tracing::debug!(id, command = %entry.command_text, "history recorded");
        Ok(id)
    }

    /// Delete every entry; returns how many were removed.
    pub fn clear(&self) -> Result<usize> {
        let removed = self
            .conn
            .execute("DELETE FROM command_history", [])
            .map_err(|e| ScmError::history_db_with_source("failed to clear history", e))?;
        tracing::info!(removed, "history cleared");
        Ok(removed)
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Reads
    // ─────────────────────────────────────────────────────────────────────────────

    pub fn get(&self, id: i64) -> Result<HistoryEntry> {
        self.conn
            .query_row(
                r#"
                SELECT id, timestamp, mode, folder, command_text, status, summary, output_text
                FROM command_history
                WHERE id = ?1
                "#,
                params![id],
                row_to_entry,
            )
            .optional()
            .map_err(|e| ScmError::history_db_with_source("failed to read history entry", e))?
            .ok_or_else(|| ScmError::not_found(format!("history entry {id} not found")))
    }

    pub fn page(&self, query: &HistoryQuery) -> Result<HistoryPage> {
        if query.page < 1 {
            return Err(ScmError::validation("page numbers start at 1"));
        }
        if query.page_size < 1 {
            return Err(ScmError::validation("page size must be at least 1"));
        }

        let filters = r#"
            WHERE (?1 IS NULL OR folder = ?1)
              AND (?2 IS NULL OR instr(fold_case(command_text), fold_case(?2)) > 0)
        "#;

        let total: i64 = self
            .conn
            .query_row(
                &format!("SELECT COUNT(*) FROM command_history {filters}"),
                params![query.folder, query.text],
                |row| row.get(0),
            )
            .map_err(|e| ScmError::history_db_with_source("failed to count history", e))?;

        let offset = i64::from(query.page - 1)
            .checked_mul(i64::from(query.page_size))
            .ok_or_else(|| ScmError::validation("page out of range"))?;
        let mut stmt = self
            .conn
            .prepare(&format!(
                r#"
                SELECT id, timestamp, mode, folder, command_text, status, summary, output_text
                FROM command_history
                {filters}
                ORDER BY id DESC
                LIMIT ?3 OFFSET ?4
                "#
            ))
            .map_err(|e| ScmError::history_db_with_source("failed to prepare query", e))?;

        let rows = stmt
            .query_map(
                params![
                    query.folder,
                    query.text,
                    i64::from(query.page_size),
                    offset
                ],
                row_to_entry,
            )
            .map_err(|e| ScmError::history_db_with_source("failed to query history", e))?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(row.map_err(|e| {
                ScmError::history_db_with_source("failed to read history row", e)
            })?);
        }

        Ok(HistoryPage {
            entries,
            total: u64::try_from(total).unwrap_or(0),
            query: query.clone(),
        })
    }

    pub fn count(&self) -> Result<i64> {
        self.conn
            .query_row("SELECT COUNT(*) FROM command_history", [], |row| row.get(0))
            .map_err(|e| ScmError::history_db_with_source("failed to count history", e))
    }
}

/// `fold_case(text)`: Unicode lowercase, since SQLite's `lower()` only folds ASCII.
fn register_fold_case(conn: &Connection) -> Result<()> {
    conn.create_scalar_function(
        "fold_case",
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let text: Option<String> = ctx.get(0)?;
            Ok(text.as_deref().map(str::to_lowercase))
        },
    )
    .map_err(|e| ScmError::history_db_with_source("failed to register fold_case", e))
}

fn row_to_entry(row: &rusqlite::Row<'_>) -> rusqlite::Result<HistoryEntry> {
    let timestamp: String = row.get(1)?;
    let mode: String = row.get(2)?;
    let status: String = row.get(5)?;
    Ok(HistoryEntry {
        id: row.get(0)?,
        timestamp: DateTime::parse_from_rfc3339(&timestamp)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, Box::new(e))
            })?,
        mode: ModeKind::from_str(&mode).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
        })?,
        folder: row.get(3)?,
        command_text: row.get(4)?,
        status: CommandStatus::from_str(&status).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(5, rusqlite::types::Type::Text, Box::new(e))
        })?,
        summary: row.get(6)?,
        output_text: row.get(7)?,
    })
}
