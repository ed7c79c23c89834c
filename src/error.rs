//! Error types for the battler simulation

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BattlerError {
    /// A draw asked the pool for more copies than the eligible supply holds.
    ///
    /// This is the only hard failure in the simulation: it means the content
    /// pack or the configuration is broken, not that a player did something odd.
    #[error("Pool underflow: requested {requested}, only {available} eligible")]
    PoolUnderflow { requested: usize, available: usize },

    #[error("Unknown card: {0}")]
    UnknownCard(String),

    #[error("Unknown unit: {0}")]
    UnknownUnit(String),

    #[error("Unknown upgrade: {0}")]
    UnknownUpgrade(String),

    #[error("Entity not found: {0}")]
    EntityNotFound(u32),

    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    #[error("Invalid content format: {0}")]
    ContentFormat(String),

    #[error("Replica channel closed")]
    ReplicaClosed,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Task join error: {0}")]
    JoinError(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, BattlerError>;
