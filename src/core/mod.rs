//! Core entities and value types

pub mod attributes;
pub mod card;
pub mod derived;
pub mod entity;
pub mod player;
pub mod role;
pub mod types;

pub use attributes::{Attribute, AttributeStore, MergeConflict, MergePolicy};
pub use card::{Card, CardPhase, UnitSelector};
pub use entity::{CardId, EntityId, EntityStore};
pub use player::Player;
pub use role::{AbilityState, RoleKind, RoleState};
pub use types::{
    Area, Belonging, CardKey, ColorTier, DescriptorId, Faction, GainWay, InfraSlot, Selection,
    UniqueKey, UnitKey, UpgradeKey,
};
