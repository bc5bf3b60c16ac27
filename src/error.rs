use crate::types::{ActorId, Vec2};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    #[error("failed to parse config JSON: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum SimError {
    #[error("position ({}, {}) is out of bounds", .0.x, .0.y)]
    OutOfBounds(Vec2),

    #[error("cell ({}, {}) is already occupied by actor {occupant}", .pos.x, .pos.y)]
    CellOccupied { pos: Vec2, occupant: ActorId },

    #[error("unknown actor {0}")]
    UnknownActor(ActorId),

    #[error("player {0} is still alive")]
    PlayerExists(ActorId),

    #[error("invalid terrain map: {0}")]
    InvalidMap(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("i/o failure: {0}")]
    Io(#[from] std::io::Error),
}

pub type SimResult<T> = Result<T, SimError>;
