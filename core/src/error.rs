use thiserror::Error;

#[derive(Error, Debug)]
pub enum QuestError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid tile index: {raw}")]
    InvalidTileIndex { raw: String },

    #[error("Tile {tile_index} is not a crate")]
    NotACrate { tile_index: i64 },

    #[error("Tile {tile_index} has not been reached (vehicle at {vehicle_position})")]
    TileNotReached { tile_index: i64, vehicle_position: i64 },

    #[error("Cannot advance {tiles} tiles at once")]
    InvalidAdvance { tiles: i64 },

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Player '{player_id}' not found")]
    PlayerNotFound { player_id: String },

    #[error("Task '{task_id}' not found")]
    TaskNotFound { task_id: String },

    #[error("Invalid config: {reason}")]
    InvalidConfig { reason: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl QuestError {
    /// The HTTP status an outer boundary should answer with.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::InvalidTileIndex { .. }
            | Self::NotACrate { .. }
            | Self::TileNotReached { .. }
            | Self::InvalidAdvance { .. } => 400,
            Self::Unauthorized => 401,
            Self::PlayerNotFound { .. } | Self::TaskNotFound { .. } => 404,
            Self::Database(_)
            | Self::Serialization(_)
            | Self::InvalidConfig { .. }
            | Self::Other(_) => 500,
        }
    }
}

pub type QuestResult<T> = Result<T, QuestError>;
