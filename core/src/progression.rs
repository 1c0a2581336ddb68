//! Vehicle evolution and the weekly checkpoint.

use crate::config::{ProgressionConfig, VehicleLevel};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default)]
pub struct Progression {
    config: ProgressionConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CheckpointProgress {
    pub tiles:   i64,
    pub target:  i64,
    pub percent: f64,
}

impl Progression {
    pub fn new(config: ProgressionConfig) -> Self {
        Self { config }
    }

    /// The highest level whose distance requirement is met.
    pub fn vehicle_for(&self, total_distance: i64) -> Option<&VehicleLevel> {
        self.config
            .vehicle_levels
            .iter()
            .rev()
            .find(|v| v.min_distance <= total_distance)
            .or_else(|| self.config.vehicle_levels.first())
    }

    pub fn level_for(&self, total_distance: i64) -> u32 {
        self.vehicle_for(total_distance).map(|v| v.level).unwrap_or(1)
    }

    pub fn level_info(&self, level: u32) -> Option<&VehicleLevel> {
        self.config.vehicle_levels.iter().find(|v| v.level == level)
    }

    /// Tiles covered since the start of the week, clamped to the target.
    pub fn weekly_checkpoint(&self, vehicle_position: i64, week_start_position: i64) -> CheckpointProgress {
        let target = self.config.weekly_checkpoint_tiles;
        let tiles = (vehicle_position - week_start_position).clamp(0, target);
        CheckpointProgress {
            tiles,
            target,
            percent: tiles as f64 / target as f64 * 100.0,
        }
    }
}
