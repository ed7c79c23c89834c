//! Effect attachment: descriptors, unique slots and the descriptor catalog

pub mod builtin;
pub mod catalog;
pub mod descriptor;
pub mod unique;

pub use builtin::EffectSpec;
pub use catalog::{DescriptorCatalog, EffectCatalog};
pub use descriptor::{Binder, Descriptor, DescriptorSpec, Generator};
pub use unique::{Claim, ClaimFacts, UniqueTable};
