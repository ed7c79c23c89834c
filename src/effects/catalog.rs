//! Descriptor catalog: content key → ordered generator list

use crate::core::CardKey;
use crate::effects::builtin::{self, EffectSpec};
use crate::effects::descriptor::Generator;
use crate::loader::Content;
use rustc_hash::FxHashMap;

/// Catalog collaborator consulted whenever a card is placed, combined or
/// re-skinned. `None` means "not implemented yet": the card binds nothing.
pub trait DescriptorCatalog: Send + Sync {
    fn generators(&self, key: &CardKey) -> Option<Vec<Generator>>;
}

/// Catalog built from the `effects` lists of a content pack
#[derive(Default)]
pub struct EffectCatalog {
    table: FxHashMap<CardKey, Vec<Generator>>,
}

impl EffectCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_content(content: &dyn Content) -> Self {
        let mut catalog = EffectCatalog::new();
        for card in content.cards() {
            if let Some(effects) = &card.effects {
                catalog.register_specs(card.key.clone(), effects);
            }
        }
        catalog
    }

    pub fn register_specs(&mut self, key: CardKey, specs: &[EffectSpec]) {
        self.register(key, specs.iter().map(builtin::generator).collect());
    }

    /// Register hand-written generators, replacing any existing entry
    pub fn register(&mut self, key: CardKey, generators: Vec<Generator>) {
        self.table.insert(key, generators);
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

impl DescriptorCatalog for EffectCatalog {
    fn generators(&self, key: &CardKey) -> Option<Vec<Generator>> {
        self.table.get(key).cloned()
    }
}

impl std::fmt::Debug for EffectCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectCatalog")
            .field("entries", &self.table.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::ContentPack;

    #[test]
    fn test_missing_effects_have_no_entry() {
        let pack = ContentPack::demo().unwrap();
        let catalog = EffectCatalog::from_content(&pack);

        assert!(catalog.generators(&CardKey::new("supply-depot")).is_none());
        assert_eq!(
            catalog.generators(&CardKey::new("zealot-guard")).map(|g| g.len()),
            Some(0)
        );
        assert_eq!(
            catalog.generators(&CardKey::new("marine-squad")).map(|g| g.len()),
            Some(1)
        );
    }
}
