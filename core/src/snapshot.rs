//! The per-player aggregate, as persisted and as returned to callers
//! after every state-changing operation.

use crate::{
    storm::StormState,
    types::{PlayerId, TileIndex, Timestamp},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GameState {
    pub player_id:           PlayerId,
    pub vehicle_position:    TileIndex,
    pub storm_position:      f64,
    pub vehicle_level:       u32,
    pub total_distance:      i64,
    pub week_start_position: TileIndex,
    pub scrap_count:         i64,
    pub boost_count:         i64,
    pub ticket_count:        i64,
    pub daily_task_count:    u32,
    pub last_storm_tick:     Timestamp,
    pub zapped:              bool,
    pub updated_at:          Timestamp,
}

impl GameState {
    /// A fresh player at the start of the track, storm `head_start` tiles behind.
    pub fn new(player_id: PlayerId, head_start: f64, now: Timestamp) -> Self {
        Self {
            player_id,
            vehicle_position:    0,
            storm_position:      -head_start,
            vehicle_level:       1,
            total_distance:      0,
            week_start_position: 0,
            scrap_count:         0,
            boost_count:         0,
            ticket_count:        0,
            daily_task_count:    0,
            last_storm_tick:     now,
            zapped:              false,
            updated_at:          now,
        }
    }

    pub fn storm(&self) -> StormState {
        StormState {
            position:         self.storm_position,
            last_tick_at:     self.last_storm_tick,
            daily_task_count: self.daily_task_count,
        }
    }
}
