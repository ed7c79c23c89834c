//! Battler Sim - deterministic simulation core for an auto-battler card game
//!
//! Cards are generic entities whose behavior comes from attribute stores and
//! effect descriptors bound through a hierarchical message bus. Every random
//! decision draws from one seeded generator, so a match is fully described by
//! its seed, seats and command log, and lockstep replicas that apply the same
//! command stream agree bit for bit.

pub mod bus;
pub mod core;
pub mod effects;
pub mod error;
pub mod game;
pub mod loader;
pub mod pool;
pub mod replication;

pub use error::{BattlerError, Result};
