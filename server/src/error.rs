use shared::{PlayerId, TowerId};
use thiserror::Error;

/// Why a player command was rejected. Rejected commands leave state untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("Player {0} not found")]
    UnknownPlayer(PlayerId),
    #[error("Tower {0} not found")]
    UnknownTower(TowerId),
    #[error("Unknown tower type: {0}")]
    UnknownTowerType(String),
    #[error("Unknown upgrade path: {0}")]
    UnknownUpgradePath(String),
    #[error("Position ({x}, {y}) is outside the map")]
    OutOfBounds { x: i32, y: i32 },
    #[error("Cannot build on this terrain")]
    NotBuildable,
    #[error("Tower already exists here")]
    CellOccupied,
    #[error("Tower belongs to another player")]
    NotOwner,
    #[error("Cannot upgrade further")]
    MaxLevel,
    #[error("Not enough money (need {needed})")]
    InsufficientFunds { needed: u32 },
    #[error("Wave already in progress")]
    WaveInProgress,
    #[error("Game is over")]
    GameOver,
}
