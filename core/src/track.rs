//! The endless track: tile kind and biome as a pure function of
//! (tile index, player seed).
//!
//! Tiles are never stored. Every read regenerates them, so a client and
//! a server holding the same seed always agree on the whole track.

use crate::{
    config::TrackConfig,
    rng::{Mulberry32, SeedStream},
    types::{Seed, TileIndex},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Biome {
    Desert,
    Forest,
    Tundra,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TileKind {
    Road,
    Crate,
    Milestone,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Tile {
    pub index: TileIndex,
    #[serde(rename = "type")]
    pub kind:  TileKind,
    pub biome: Biome,
}

/// Tile generator bound to one track configuration.
#[derive(Debug, Clone)]
pub struct TrackGenerator {
    config: TrackConfig,
}

impl Default for TrackGenerator {
    fn default() -> Self {
        Self::new(TrackConfig::default())
    }
}

impl TrackGenerator {
    pub fn new(config: TrackConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TrackConfig {
        &self.config
    }

    /// Generate one tile. Total over every index; draws exactly one float.
    pub fn tile(&self, index: TileIndex, seed: Seed) -> Tile {
        let roll = Mulberry32::for_tile(seed, index, SeedStream::TileKind).next_f64();

        let kind = if index > 0 && index % self.config.milestone_interval == 0 {
            TileKind::Milestone
        } else if roll < self.config.crate_chance {
            TileKind::Crate
        } else {
            TileKind::Road
        };

        Tile { index, kind, biome: self.biome(index) }
    }

    /// Biome cycles over fixed-length segments, independent of the draw.
    pub fn biome(&self, index: TileIndex) -> Biome {
        let biomes = &self.config.biomes;
        let segment = index.div_euclid(self.config.biome_length);
        let slot = segment.rem_euclid(biomes.len() as i64) as usize;
        biomes[slot]
    }

    /// Tiles `[max(0, center - behind) ..= center + ahead]`, ascending.
    /// The track has a start but no end: nothing below index 0 is returned.
    pub fn window(&self, center: TileIndex, behind: i64, ahead: i64, seed: Seed) -> Vec<Tile> {
        let start = center.saturating_sub(behind).max(0);
        let end = center.saturating_add(ahead);
        (start..=end).map(|i| self.tile(i, seed)).collect()
    }

    /// The configured view window around `center`.
    pub fn view(&self, center: TileIndex, seed: Seed) -> Vec<Tile> {
        self.window(center, self.config.tiles_behind, self.config.tiles_ahead, seed)
    }

    /// Crate tiles in `(from, to]`, ascending. Empty when `to <= from`.
    pub fn crates_in_range(&self, from: TileIndex, to: TileIndex, seed: Seed) -> Vec<Tile> {
        (from.saturating_add(1)..=to)
            .map(|i| self.tile(i, seed))
            .filter(|t| t.kind == TileKind::Crate)
            .collect()
    }
}

/// Generate a tile with the default track.
pub fn generate_tile(index: TileIndex, seed: Seed) -> Tile {
    TrackGenerator::default().tile(index, seed)
}

/// Generate a window with the default track.
pub fn generate_tile_window(center: TileIndex, behind: i64, ahead: i64, seed: Seed) -> Vec<Tile> {
    TrackGenerator::default().window(center, behind, ahead, seed)
}
