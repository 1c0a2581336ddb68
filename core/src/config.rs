//! Game tuning: every constant the generators and models read.
//!
//! `GameConfig::default()` is the canonical world. A JSON file may override
//! any section; missing sections fall back to defaults. Changing the track
//! or loot sections changes what every player sees at every tile.

use crate::{
    error::{QuestError, QuestResult},
    loot::RewardType,
    track::Biome,
};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StormConfig {
    /// Tiles per hour with no outstanding tasks.
    pub base_speed: f64,
    /// Additional tiles per hour per outstanding task.
    pub task_weight: f64,
    pub tick_interval_minutes: u32,
    /// Gap (in tiles) under which the player is warned.
    pub warning_threshold: f64,
    /// How far behind the start line a new player's storm begins.
    pub head_start: f64,
}

impl Default for StormConfig {
    fn default() -> Self {
        Self {
            base_speed:            1.0,
            task_weight:           0.5,
            tick_interval_minutes: 15,
            warning_threshold:     3.0,
            head_start:            5.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TrackConfig {
    pub crate_chance:       f64,
    pub milestone_interval: i64,
    /// Tiles per biome segment.
    pub biome_length:       i64,
    pub biomes:             Vec<Biome>,
    pub tiles_behind:       i64,
    pub tiles_ahead:        i64,
}

impl Default for TrackConfig {
    fn default() -> Self {
        Self {
            crate_chance:       0.15,
            milestone_interval: 7,
            biome_length:       50,
            biomes:             vec![Biome::Desert, Biome::Forest, Biome::Tundra],
            tiles_behind:       20,
            tiles_ahead:        30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LootEntry {
    pub reward_type: RewardType,
    pub weight:      f64,
    pub label:       String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LootConfig {
    /// Walked in declared order; weights sum to 100.
    pub table:              Vec<LootEntry>,
    pub ticket_descriptions: Vec<String>,
}

impl Default for LootConfig {
    fn default() -> Self {
        Self {
            table: vec![
                LootEntry { reward_type: RewardType::Scrap,     weight: 60.0, label: "Scrap Metal".into() },
                LootEntry { reward_type: RewardType::Boost,     weight: 30.0, label: "Speed Boost".into() },
                LootEntry { reward_type: RewardType::IrlTicket, weight: 10.0, label: "IRL Ticket".into() },
            ],
            ticket_descriptions: vec![
                "30 min extra screen time".into(),
                "Pick what's for dinner".into(),
                "Stay up 30 min later".into(),
                "Skip one chore".into(),
                "Choose a family activity".into(),
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VehicleLevel {
    pub level:        u32,
    pub min_distance: i64,
    pub name:         String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ProgressionConfig {
    /// Ascending by `min_distance`; the first entry starts at 0.
    pub vehicle_levels:          Vec<VehicleLevel>,
    pub weekly_checkpoint_tiles: i64,
}

impl Default for ProgressionConfig {
    fn default() -> Self {
        Self {
            vehicle_levels: vec![
                VehicleLevel { level: 1,  min_distance: 0,   name: "Rust Bucket".into() },
                VehicleLevel { level: 10, min_distance: 100, name: "Road Runner".into() },
                VehicleLevel { level: 50, min_distance: 500, name: "Storm Chaser".into() },
            ],
            weekly_checkpoint_tiles: 50,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GameConfig {
    pub storm:       StormConfig,
    pub track:       TrackConfig,
    pub loot:        LootConfig,
    pub progression: ProgressionConfig,
}

impl GameConfig {
    /// Load a JSON config file and validate it.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: GameConfig = serde_json::from_str(&content)
            .with_context(|| format!("parsing config {}", path.display()))?;
        config.validate()?;
        log::info!("config: loaded {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> QuestResult<()> {
        let t = &self.track;
        if !(0.0..=1.0).contains(&t.crate_chance) {
            return Err(invalid(format!("crate_chance {} outside [0, 1]", t.crate_chance)));
        }
        if t.milestone_interval <= 0 {
            return Err(invalid("milestone_interval must be positive"));
        }
        if t.biome_length <= 0 {
            return Err(invalid("biome_length must be positive"));
        }
        if t.biomes.is_empty() {
            return Err(invalid("biomes must not be empty"));
        }
        if t.tiles_behind < 0 || t.tiles_ahead < 0 {
            return Err(invalid("tile window bounds must be non-negative"));
        }

        let l = &self.loot;
        if l.table.is_empty() {
            return Err(invalid("loot table must not be empty"));
        }
        if l.table.iter().any(|e| e.weight <= 0.0) {
            return Err(invalid("loot weights must be positive"));
        }
        let total: f64 = l.table.iter().map(|e| e.weight).sum();
        if (total - 100.0).abs() > 1e-9 {
            return Err(invalid(format!("loot weights sum to {total}, expected 100")));
        }
        if l.ticket_descriptions.is_empty() {
            return Err(invalid("ticket_descriptions must not be empty"));
        }

        let s = &self.storm;
        if s.base_speed < 0.0 || s.task_weight < 0.0 || s.head_start < 0.0 {
            return Err(invalid("storm tuning must be non-negative"));
        }
        if s.tick_interval_minutes == 0 {
            return Err(invalid("tick_interval_minutes must be positive"));
        }

        let p = &self.progression;
        match p.vehicle_levels.first() {
            Some(first) if first.min_distance == 0 => {}
            _ => return Err(invalid("vehicle_levels must start at distance 0")),
        }
        if p.vehicle_levels.windows(2).any(|w| w[0].min_distance >= w[1].min_distance) {
            return Err(invalid("vehicle_levels must be ascending by min_distance"));
        }
        if p.weekly_checkpoint_tiles <= 0 {
            return Err(invalid("weekly_checkpoint_tiles must be positive"));
        }
        Ok(())
    }
}

fn invalid(reason: impl Into<String>) -> QuestError {
    QuestError::InvalidConfig { reason: reason.into() }
}
