//! Reward claim: the storage-gated resolve-or-create boundary.
//!
//! RULE: a stored reward is the truth. The loot roller is consulted only
//! when no row exists for (player, tile), and the new row is written with
//! an insert-if-absent against the UNIQUE(player_id, tile_index)
//! constraint. If another claim won the race, its row is replayed.
//!
//! The whole claim runs in one transaction. Any error drops it, so a
//! failed claim grants nothing and changes no counter.

use crate::{
    error::{QuestError, QuestResult},
    event::{EventLogEntry, GameEvent},
    loot::{LootResult, LootRoller, RewardType},
    rng::identity_hash,
    snapshot::GameState,
    store::{QuestStore, RewardRow},
    track::{TileKind, TrackGenerator},
    types::{TileIndex, Timestamp},
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Largest integer a JSON number carries exactly.
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_991.0;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClaimOutcome {
    pub reward:     LootResult,
    /// False when the reward was already in the ledger.
    pub fresh:      bool,
    pub metadata:   Value,
    pub game_state: GameState,
}

pub struct RewardClaim<'a> {
    store: &'a QuestStore,
    track: &'a TrackGenerator,
    loot:  &'a LootRoller,
}

impl<'a> RewardClaim<'a> {
    pub fn new(store: &'a QuestStore, track: &'a TrackGenerator, loot: &'a LootRoller) -> Self {
        Self { store, track, loot }
    }

    /// Resolve the reward at `raw_tile_index` for the authenticated `caller`.
    pub fn claim(
        &self,
        caller: Option<&str>,
        raw_tile_index: &Value,
        now: Timestamp,
    ) -> QuestResult<ClaimOutcome> {
        let player_id = caller.ok_or(QuestError::Unauthorized)?;
        let tile_index = parse_tile_index(raw_tile_index)?;

        let tx = self.store.begin()?;
        let state = self.load_state(player_id)?;

        if let Some(existing) = self.store.reward(player_id, tile_index)? {
            log::debug!("claim: replaying stored reward player={player_id} tile={tile_index}");
            let outcome = self.replay(existing, state);
            tx.commit()?;
            return Ok(outcome);
        }

        let seed = identity_hash(player_id);
        let tile = self.track.tile(tile_index, seed);
        if tile.kind != TileKind::Crate {
            return Err(QuestError::NotACrate { tile_index });
        }
        if tile_index > state.vehicle_position {
            return Err(QuestError::TileNotReached {
                tile_index,
                vehicle_position: state.vehicle_position,
            });
        }

        let reward = self.loot.roll(tile_index, seed);
        let metadata = match reward.reward_type {
            RewardType::IrlTicket => json!({
                "description": self.loot.ticket_description(tile_index, seed),
            }),
            _ => json!({}),
        };

        let row = RewardRow {
            reward_id:   uuid::Uuid::new_v4().to_string(),
            player_id:   player_id.to_string(),
            tile_index,
            reward_type: reward.reward_type,
            metadata:    metadata.clone(),
            created_at:  now,
        };

        if !self.store.insert_reward_if_absent(&row)? {
            // Lost the race to a concurrent claim on another connection.
            let existing = self
                .store
                .reward(player_id, tile_index)?
                .ok_or_else(|| anyhow::anyhow!("reward row vanished for tile {tile_index}"))?;
            let outcome = self.replay(existing, self.load_state(player_id)?);
            tx.commit()?;
            return Ok(outcome);
        }

        self.store.increment_reward_counter(player_id, reward.reward_type, now)?;
        let event = GameEvent::RewardGranted {
            player_id:   player_id.to_string(),
            tile_index,
            reward_type: reward.reward_type,
        };
        self.store.append_event(&EventLogEntry {
            id:          None,
            player_id:   player_id.to_string(),
            occurred_at: now,
            event_type:  event.type_name().to_string(),
            payload:     serde_json::to_string(&event)?,
        })?;

        let game_state = self.load_state(player_id)?;
        tx.commit()?;

        log::info!(
            "claim: granted {} to player={player_id} tile={tile_index}",
            reward.reward_type.as_str()
        );
        Ok(ClaimOutcome { reward, fresh: true, metadata, game_state })
    }

    fn load_state(&self, player_id: &str) -> QuestResult<GameState> {
        self.store
            .game_state(player_id)?
            .ok_or_else(|| QuestError::PlayerNotFound { player_id: player_id.to_string() })
    }

    fn replay(&self, row: RewardRow, game_state: GameState) -> ClaimOutcome {
        ClaimOutcome {
            reward: LootResult {
                reward_type: row.reward_type,
                label:       self.loot.label_for(row.reward_type),
            },
            fresh: false,
            metadata: row.metadata,
            game_state,
        }
    }
}

/// Accept a non-negative integer no larger than 2^53 - 1, as a JSON number
/// or a numeric string.
pub fn parse_tile_index(raw: &Value) -> QuestResult<TileIndex> {
    let invalid = || QuestError::InvalidTileIndex { raw: raw.to_string() };

    let value = match raw {
        Value::Number(n) => match n.as_i64() {
            Some(i) if (0..=MAX_EXACT_INTEGER as i64).contains(&i) => return Ok(i),
            Some(_) => return Err(invalid()),
            None => n.as_f64().ok_or_else(invalid)?,
        },
        Value::String(s) if !s.trim().is_empty() => s.trim().parse::<f64>().map_err(|_| invalid())?,
        _ => return Err(invalid()),
    };

    if value.is_finite() && value.fract() == 0.0 && (0.0..=MAX_EXACT_INTEGER).contains(&value) {
        Ok(value as TileIndex)
    } else {
        Err(invalid())
    }
}
