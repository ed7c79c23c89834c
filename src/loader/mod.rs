//! Content collaborator: card, unit and upgrade definitions
//!
//! The engine consumes content through the [`Content`] trait only. The JSON
//! [`ContentPack`] is the in-tree implementation used by the CLI and tests.

pub mod content;
pub mod pack;

pub use content::{CardDef, Content, UnitDef, UnitTag, UpgradeDef, UpgradeEffect};
pub use pack::ContentPack;
