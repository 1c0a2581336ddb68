use super::QuestStore;
use crate::{error::QuestResult, loot::RewardType, snapshot::GameState, types::Timestamp};
use rusqlite::{params, OptionalExtension, Row};

const GAME_STATE_COLUMNS: &str = "player_id, vehicle_position, storm_position, vehicle_level,
    total_distance, week_start_position, scrap_count, boost_count, ticket_count,
    daily_task_count, last_storm_tick, zapped, updated_at";

impl QuestStore {
    // ── Game state ────────────────────────────────────────────────

    pub fn insert_game_state(&self, s: &GameState) -> QuestResult<()> {
        self.conn.execute(
            &format!(
                "INSERT INTO game_state ({GAME_STATE_COLUMNS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)"
            ),
            params![
                s.player_id,
                s.vehicle_position,
                s.storm_position,
                s.vehicle_level,
                s.total_distance,
                s.week_start_position,
                s.scrap_count,
                s.boost_count,
                s.ticket_count,
                s.daily_task_count,
                s.last_storm_tick,
                s.zapped,
                s.updated_at,
            ],
        )?;
        Ok(())
    }

    pub fn game_state(&self, player_id: &str) -> QuestResult<Option<GameState>> {
        let state = self
            .conn
            .query_row(
                &format!("SELECT {GAME_STATE_COLUMNS} FROM game_state WHERE player_id = ?1"),
                params![player_id],
                game_state_from_row,
            )
            .optional()?;
        Ok(state)
    }

    /// Overwrite every mutable column of the aggregate.
    pub fn save_game_state(&self, s: &GameState) -> QuestResult<()> {
        self.conn.execute(
            "UPDATE game_state SET
                vehicle_position = ?2, storm_position = ?3, vehicle_level = ?4,
                total_distance = ?5, week_start_position = ?6, scrap_count = ?7,
                boost_count = ?8, ticket_count = ?9, daily_task_count = ?10,
                last_storm_tick = ?11, zapped = ?12, updated_at = ?13
             WHERE player_id = ?1",
            params![
                s.player_id,
                s.vehicle_position,
                s.storm_position,
                s.vehicle_level,
                s.total_distance,
                s.week_start_position,
                s.scrap_count,
                s.boost_count,
                s.ticket_count,
                s.daily_task_count,
                s.last_storm_tick,
                s.zapped,
                s.updated_at,
            ],
        )?;
        Ok(())
    }

    /// Bump the inventory counter for a newly granted reward.
    pub fn increment_reward_counter(
        &self,
        player_id: &str,
        reward_type: RewardType,
        now: Timestamp,
    ) -> QuestResult<()> {
        let column = match reward_type {
            RewardType::Scrap     => "scrap_count",
            RewardType::Boost     => "boost_count",
            RewardType::IrlTicket => "ticket_count",
        };
        self.conn.execute(
            &format!(
                "UPDATE game_state SET {column} = {column} + 1, updated_at = ?2
                 WHERE player_id = ?1"
            ),
            params![player_id, now],
        )?;
        Ok(())
    }
}

fn game_state_from_row(row: &Row<'_>) -> rusqlite::Result<GameState> {
    Ok(GameState {
        player_id:           row.get(0)?,
        vehicle_position:    row.get(1)?,
        storm_position:      row.get(2)?,
        vehicle_level:       row.get(3)?,
        total_distance:      row.get(4)?,
        week_start_position: row.get(5)?,
        scrap_count:         row.get(6)?,
        boost_count:         row.get(7)?,
        ticket_count:        row.get(8)?,
        daily_task_count:    row.get(9)?,
        last_storm_tick:     row.get(10)?,
        zapped:              row.get(11)?,
        updated_at:          row.get(12)?,
    })
}
