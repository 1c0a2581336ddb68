//! SQLite persistence layer.
//!
//! RULE: Only store/ talks to the database.
//! The engine and the claim workflow call store methods; they never
//! execute SQL directly.

use crate::{
    error::QuestResult,
    event::EventLogEntry,
    loot::RewardType,
    recurrence::TaskSchedule,
    types::{EntityId, PlayerId, Seed, TileIndex, Timestamp},
};
use rusqlite::{params, types::Type, Connection, OptionalExtension, Transaction};
use serde::{Deserialize, Serialize};

mod game_state;
mod reward;
mod task;

pub struct QuestStore {
    conn: Connection,
    path: Option<String>, // None for :memory:, Some(path) for file
}

/// A resolved reward, as stored in the ledger.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RewardRow {
    pub reward_id:   EntityId,
    pub player_id:   PlayerId,
    pub tile_index:  TileIndex,
    pub reward_type: RewardType,
    pub metadata:    serde_json::Value,
    pub created_at:  Timestamp,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskRow {
    pub task_id:     EntityId,
    pub player_id:   PlayerId,
    pub title:       String,
    pub description: Option<String>,
    pub schedule:    TaskSchedule,
    pub created_at:  Timestamp,
}

impl QuestStore {
    pub fn open(path: &str) -> QuestResult<Self> {
        let conn = Connection::open_with_flags(
            path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI,
        )?;
        // WAL mode only for real files (shared-memory and :memory: ignore it).
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self {
            conn,
            path: Some(path.to_string()),
        })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> QuestResult<Self> {
        let conn = Connection::open(":memory:")?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn, path: None })
    }

    /// Reopen a new connection to the same database.
    /// For in-memory databases, this returns a new in-memory database (isolated).
    pub fn reopen(&self) -> QuestResult<Self> {
        match &self.path {
            Some(p) => Self::open(p),
            None => Self::in_memory(),
        }
    }

    /// Apply all schema migrations in order. Safe to run repeatedly.
    pub fn migrate(&self) -> QuestResult<()> {
        self.conn
            .execute_batch(include_str!("../../../migrations/001_foundation.sql"))?;
        self.conn
            .execute_batch(include_str!("../../../migrations/002_rewards.sql"))?;
        self.conn
            .execute_batch(include_str!("../../../migrations/003_tasks.sql"))?;
        Ok(())
    }

    /// Begin a transaction on the shared connection. Every store call made
    /// while it is alive joins it; dropping it without `commit()` rolls
    /// everything back.
    pub fn begin(&self) -> QuestResult<Transaction<'_>> {
        Ok(self.conn.unchecked_transaction()?)
    }

    // ── Player ─────────────────────────────────────────────────

    /// Returns false when the player already exists.
    pub fn insert_player(&self, player_id: &str, seed: Seed, now: Timestamp) -> QuestResult<bool> {
        let changed = self.conn.execute(
            "INSERT INTO player (player_id, seed, created_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(player_id) DO NOTHING",
            params![player_id, seed, now],
        )?;
        Ok(changed == 1)
    }

    pub fn player_seed(&self, player_id: &str) -> QuestResult<Option<Seed>> {
        let seed = self
            .conn
            .query_row(
                "SELECT seed FROM player WHERE player_id = ?1",
                params![player_id],
                |row| row.get::<_, Seed>(0),
            )
            .optional()?;
        Ok(seed)
    }

    // ── Event log ──────────────────────────────────────────────

    pub fn append_event(&self, entry: &EventLogEntry) -> QuestResult<()> {
        self.conn.execute(
            "INSERT INTO event_log (player_id, occurred_at, event_type, payload)
             VALUES (?1, ?2, ?3, ?4)",
            params![entry.player_id, entry.occurred_at, entry.event_type, entry.payload],
        )?;
        Ok(())
    }

    pub fn events_for_player(&self, player_id: &str) -> QuestResult<Vec<EventLogEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, player_id, occurred_at, event_type, payload
             FROM event_log WHERE player_id = ?1
             ORDER BY id ASC",
        )?;
        let entries = stmt
            .query_map(params![player_id], |row| {
                Ok(EventLogEntry {
                    id:          Some(row.get(0)?),
                    player_id:   row.get(1)?,
                    occurred_at: row.get(2)?,
                    event_type:  row.get(3)?,
                    payload:     row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }
}

/// Decode a TEXT column into a domain enum.
fn text_enum<T>(idx: usize, raw: String, parse: fn(&str) -> Option<T>) -> rusqlite::Result<T> {
    parse(&raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            Type::Text,
            format!("unrecognized value '{raw}'").into(),
        )
    })
}

/// Decode a TEXT column holding JSON.
fn json_column(idx: usize, raw: String) -> rusqlite::Result<serde_json::Value> {
    serde_json::from_str(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}
