use super::{json_column, text_enum, QuestStore, RewardRow};
use crate::{error::QuestResult, loot::RewardType, types::TileIndex};
use rusqlite::{params, OptionalExtension, Row};

impl QuestStore {
    // ── Reward ledger ─────────────────────────────────────────────

    pub fn reward(&self, player_id: &str, tile_index: TileIndex) -> QuestResult<Option<RewardRow>> {
        let row = self
            .conn
            .query_row(
                "SELECT reward_id, player_id, tile_index, reward_type, metadata, created_at
                 FROM reward WHERE player_id = ?1 AND tile_index = ?2",
                params![player_id, tile_index],
                reward_from_row,
            )
            .optional()?;
        Ok(row)
    }

    /// Atomic insert-if-absent on (player_id, tile_index).
    /// Returns true when this call created the row.
    pub fn insert_reward_if_absent(&self, r: &RewardRow) -> QuestResult<bool> {
        let changed = self.conn.execute(
            "INSERT INTO reward (reward_id, player_id, tile_index, reward_type, metadata, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(player_id, tile_index) DO NOTHING",
            params![
                r.reward_id,
                r.player_id,
                r.tile_index,
                r.reward_type.as_str(),
                r.metadata.to_string(),
                r.created_at,
            ],
        )?;
        Ok(changed == 1)
    }

    pub fn rewards_for_player(&self, player_id: &str) -> QuestResult<Vec<RewardRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT reward_id, player_id, tile_index, reward_type, metadata, created_at
             FROM reward WHERE player_id = ?1
             ORDER BY tile_index ASC",
        )?;
        let rows = stmt.query_map(params![player_id], reward_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn reward_count(&self, player_id: &str) -> QuestResult<i64> {
        let n: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM reward WHERE player_id = ?1",
            params![player_id],
            |row| row.get(0),
        )?;
        Ok(n)
    }
}

fn reward_from_row(row: &Row<'_>) -> rusqlite::Result<RewardRow> {
    Ok(RewardRow {
        reward_id:   row.get(0)?,
        player_id:   row.get(1)?,
        tile_index:  row.get(2)?,
        reward_type: text_enum(3, row.get(3)?, RewardType::parse)?,
        metadata:    json_column(4, row.get(4)?)?,
        created_at:  row.get(5)?,
    })
}
