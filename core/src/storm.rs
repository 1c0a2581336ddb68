//! The pursuing storm: speed from task load, position between ticks.
//!
//! The authoritative position is written by the storm tick (see
//! `engine.rs`). Everything here is pure; interpolation only fills the gap
//! between ticks for display and never decides the loss condition.

use crate::{config::StormConfig, types::Timestamp};
use serde::{Deserialize, Serialize};

const SECONDS_PER_HOUR: f64 = 3600.0;

/// The persisted storm inputs for one player.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StormState {
    pub position:         f64,
    pub last_tick_at:     Timestamp,
    pub daily_task_count: u32,
}

#[derive(Debug, Clone, Default)]
pub struct StormModel {
    config: StormConfig,
}

impl StormModel {
    pub fn new(config: StormConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &StormConfig {
        &self.config
    }

    /// Tiles per hour. Non-decreasing in task count.
    pub fn speed(&self, daily_task_count: u32) -> f64 {
        self.config.base_speed + f64::from(daily_task_count) * self.config.task_weight
    }

    /// Extrapolated position at `now`. Clock skew (now before the tick)
    /// holds the storm at its last known position.
    pub fn position_at(&self, state: &StormState, now: Timestamp) -> f64 {
        let elapsed = (now - state.last_tick_at).num_milliseconds() as f64 / 1000.0;
        interpolate(state.position, self.speed(state.daily_task_count), elapsed)
    }

    /// What a client should draw: the interpolated position, held at most
    /// one tile past the vehicle until the authoritative tick rules.
    pub fn display_position(&self, state: &StormState, vehicle_position: f64, now: Timestamp) -> f64 {
        self.position_at(state, now).min(vehicle_position + 1.0)
    }

    /// Authoritative advance to `now`.
    pub fn advance(&self, state: &StormState, now: Timestamp) -> StormState {
        StormState {
            position:         self.position_at(state, now),
            last_tick_at:     now.max(state.last_tick_at),
            daily_task_count: state.daily_task_count,
        }
    }

    /// The storm is close but has not caught the vehicle yet.
    pub fn is_warning(&self, vehicle_position: f64, storm_position: f64) -> bool {
        let gap = gap(vehicle_position, storm_position);
        !is_zapped(vehicle_position, storm_position) && gap < self.config.warning_threshold
    }
}

/// `last_position + speed * seconds / 3600`. Negative elapsed time counts as zero.
pub fn interpolate(last_position: f64, speed: f64, seconds_since_tick: f64) -> f64 {
    last_position + speed * seconds_since_tick.max(0.0) / SECONDS_PER_HOUR
}

/// Loss predicate. Equal positions count as caught.
pub fn is_zapped(vehicle_position: f64, storm_position: f64) -> bool {
    storm_position >= vehicle_position
}

/// Signed distance from storm to vehicle; negative means already caught.
pub fn gap(vehicle_position: f64, storm_position: f64) -> f64 {
    vehicle_position - storm_position
}

/// Speed with the default tuning.
pub fn storm_speed(daily_task_count: u32) -> f64 {
    StormModel::default().speed(daily_task_count)
}
