//! Shared primitive types used across the whole core.

use chrono::{DateTime, Utc};

/// A per-player world seed, derived from the player id.
pub type Seed = u32;

/// Position of a tile on the track. Unbounded in both directions for
/// generation; the claim boundary only accepts non-negative values.
pub type TileIndex = i64;

/// The opaque, stable identifier of a player.
pub type PlayerId = String;

/// A stable, unique identifier for any persisted row.
pub type EntityId = String;

/// All persisted timestamps are UTC.
pub type Timestamp = DateTime<Utc>;
