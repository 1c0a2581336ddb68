//! Seeded loot rolls.
//!
//! A roll is a pure function of (tile index, player seed), so any caller can
//! reproduce it. Purity does NOT prevent double-granting: once a reward for
//! a (player, tile) has been stored, the stored row is the truth and the
//! roller must not be consulted again. See `claim.rs`.

use crate::{
    config::{LootConfig, LootEntry},
    rng::{Mulberry32, SeedStream},
    types::{Seed, TileIndex},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RewardType {
    Scrap,
    Boost,
    IrlTicket,
}

impl RewardType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scrap     => "scrap",
            Self::Boost     => "boost",
            Self::IrlTicket => "irl_ticket",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "scrap"      => Some(Self::Scrap),
            "boost"      => Some(Self::Boost),
            "irl_ticket" => Some(Self::IrlTicket),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LootResult {
    #[serde(rename = "type")]
    pub reward_type: RewardType,
    pub label:       String,
}

#[derive(Debug, Clone)]
pub struct LootRoller {
    config: LootConfig,
}

impl Default for LootRoller {
    fn default() -> Self {
        Self::new(LootConfig::default())
    }
}

impl LootRoller {
    pub fn new(config: LootConfig) -> Self {
        Self { config }
    }

    pub fn table(&self) -> &[LootEntry] {
        &self.config.table
    }

    /// Roll the weighted table for one tile.
    pub fn roll(&self, tile_index: TileIndex, seed: Seed) -> LootResult {
        let roll = Mulberry32::for_tile(seed, tile_index, SeedStream::Loot).next_f64() * 100.0;

        let mut cumulative = 0.0;
        for entry in &self.config.table {
            cumulative += entry.weight;
            if roll < cumulative {
                return result_for(entry);
            }
        }

        // Only reachable through float error at the top of the table.
        log::warn!("loot: roll {roll} exceeded table total {cumulative}; using first entry");
        self.fallback()
    }

    /// Uniform pick from the ticket descriptions, on its own stream.
    /// Only meaningful when the rolled type is `IrlTicket`.
    pub fn ticket_description(&self, tile_index: TileIndex, seed: Seed) -> &str {
        let descriptions = &self.config.ticket_descriptions;
        let draw = Mulberry32::for_tile(seed, tile_index, SeedStream::TicketDescription).next_f64();
        let idx = (draw * descriptions.len() as f64) as usize;
        descriptions.get(idx).map(String::as_str).unwrap_or_default()
    }

    /// Label for a reward type, used when replaying a stored reward.
    pub fn label_for(&self, reward_type: RewardType) -> String {
        self.config
            .table
            .iter()
            .find(|e| e.reward_type == reward_type)
            .map(|e| e.label.clone())
            .unwrap_or_else(|| reward_type.as_str().to_string())
    }

    fn fallback(&self) -> LootResult {
        self.config
            .table
            .first()
            .map(result_for)
            .unwrap_or(LootResult { reward_type: RewardType::Scrap, label: "Scrap Metal".into() })
    }
}

fn result_for(entry: &LootEntry) -> LootResult {
    LootResult {
        reward_type: entry.reward_type,
        label:       entry.label.clone(),
    }
}

/// Roll with the default table.
pub fn roll_loot(tile_index: TileIndex, seed: Seed) -> LootResult {
    LootRoller::default().roll(tile_index, seed)
}

/// Pick a ticket description with the default list.
pub fn pick_ticket_description(tile_index: TileIndex, seed: Seed) -> String {
    LootRoller::default().ticket_description(tile_index, seed).to_string()
}
