use crate::{
    claim::ClaimOutcome,
    event::GameEvent,
    progression::CheckpointProgress,
    recurrence::Urgency,
    snapshot::GameState,
    store::TaskRow,
    track::Tile,
    types::{EntityId, Timestamp},
};
use serde::{Deserialize, Serialize};

/// All player-issued commands.
/// Variants added over time. Never removed or reordered.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum PlayerCommand {
    // ── Read ──────────────────────────────────────
    GetState,
    Window,
    TaskBoard,

    // ── Track ─────────────────────────────────────
    Advance { tiles: i64 },
    StormTick,
    StartWeek,

    // ── Rewards ───────────────────────────────────
    /// Raw JSON so the boundary can reject non-integers itself.
    Claim { tile_index: serde_json::Value },

    // ── Tasks ─────────────────────────────────────
    AddTask { task: NewTask },
    CompleteTask { task_id: EntityId },
    ResetDueTasks,
}

/// Fields a caller supplies when creating a task.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewTask {
    pub title:         String,
    #[serde(default)]
    pub description:   Option<String>,
    #[serde(default = "default_difficulty")]
    pub difficulty:    u8,
    #[serde(default)]
    pub is_permanent:  bool,
    #[serde(default)]
    pub interval_days: Option<u32>,
    #[serde(default)]
    pub anchor:        Option<String>,
    #[serde(default)]
    pub deadline:      Option<Timestamp>,
}

fn default_difficulty() -> u8 {
    1
}

/// Storm as a client should see it right now.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct StormView {
    pub authoritative: f64,
    pub display:       f64,
    pub speed:         f64,
    pub gap:           f64,
    pub warning:       bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BoardEntry {
    pub task:         TaskRow,
    pub urgency:      Urgency,
    pub due_at:       Option<Timestamp>,
    pub repeat_label: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CommandOutcome {
    State {
        game_state:   GameState,
        storm:        StormView,
        checkpoint:   CheckpointProgress,
        vehicle_name: Option<String>,
    },
    Window { tiles: Vec<Tile> },
    Board { entries: Vec<BoardEntry> },
    Claimed { outcome: ClaimOutcome },
    TaskAdded { task: TaskRow },
    Events { events: Vec<GameEvent> },
}
