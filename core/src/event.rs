//! Game events. Everything the engine changes is recorded as one.
//!
//! Variants are appended, never removed or reordered: the event log
//! stores the snake_case tag and JSON payload of each.

use crate::{
    loot::RewardType,
    types::{EntityId, PlayerId, TileIndex, Timestamp},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameEvent {
    PlayerRegistered {
        player_id: PlayerId,
        seed: u32,
    },

    // ── Storm ──────────────────────────────────────
    StormAdvanced {
        player_id: PlayerId,
        from_position: f64,
        to_position: f64,
        speed: f64,
        daily_task_count: u32,
    },
    PlayerZapped {
        player_id: PlayerId,
        vehicle_position: TileIndex,
        storm_position: f64,
    },

    // ── Vehicle ────────────────────────────────────
    VehicleMoved {
        player_id: PlayerId,
        from_position: TileIndex,
        to_position: TileIndex,
    },
    VehicleEvolved {
        player_id: PlayerId,
        level: u32,
        name: String,
    },
    CrateReached {
        player_id: PlayerId,
        tile_index: TileIndex,
    },

    // ── Rewards ────────────────────────────────────
    RewardGranted {
        player_id: PlayerId,
        tile_index: TileIndex,
        reward_type: RewardType,
    },

    // ── Tasks ──────────────────────────────────────
    TaskCompleted {
        player_id: PlayerId,
        task_id: EntityId,
        tiles: i64,
    },
    TaskReset {
        player_id: PlayerId,
        task_id: EntityId,
    },
}

impl GameEvent {
    /// Stable name for the event_type column.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::PlayerRegistered { .. } => "player_registered",
            Self::StormAdvanced { .. }    => "storm_advanced",
            Self::PlayerZapped { .. }     => "player_zapped",
            Self::VehicleMoved { .. }     => "vehicle_moved",
            Self::VehicleEvolved { .. }   => "vehicle_evolved",
            Self::CrateReached { .. }     => "crate_reached",
            Self::RewardGranted { .. }    => "reward_granted",
            Self::TaskCompleted { .. }    => "task_completed",
            Self::TaskReset { .. }        => "task_reset",
        }
    }
}

/// The event log entry as persisted to SQLite.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventLogEntry {
    pub id:          Option<i64>,
    pub player_id:   PlayerId,
    pub occurred_at: Timestamp,
    pub event_type:  String,
    pub payload:     String, // JSON-serialized GameEvent
}
