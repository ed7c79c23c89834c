//! Card entity
//!
//! A card on a player's board: its identity, the units and upgrades it
//! carries, its attribute store, its leaf bus node and its bound descriptors.
//! Mutating methods here only touch the card's own data and keep the derived
//! cache honest; anything that must post events lives in `game::card_ops`.

use crate::bus::Emitter;
use crate::core::derived::{DerivedCache, Source};
use crate::core::{
    AttributeStore, Belonging, CardId, CardKey, ColorTier, Faction, InfraSlot, UnitKey, UpgradeKey,
};
use crate::effects::Descriptor;
use crate::game::Game;
use crate::loader::{CardDef, Content};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Lifecycle phase of a card
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CardPhase {
    /// Constructed, no position yet
    Unplaced,
    /// Occupies exactly one grid position
    Placed,
    /// Sold, destroyed or combined away; waiting for its removal events to finish
    Detached,
}

/// Which units a replacement applies to
pub enum UnitSelector<'a> {
    Indices(&'a [usize]),
    Matching(&'a dyn Fn(&UnitKey) -> bool),
}

#[derive(Debug)]
pub struct Card {
    pub id: CardId,
    /// Seat of the owning player
    pub owner: usize,
    pub key: CardKey,
    pub name: String,
    pub faction: Faction,
    pub level: u8,
    pub color: ColorTier,
    pub belonging: Belonging,

    units: Vec<UnitKey>,
    upgrades: SmallVec<[UpgradeKey; 4]>,
    attrs: AttributeStore,

    pub descriptors: Vec<Descriptor>,
    /// Content keys this card holds out of the pool
    pub occupied: Vec<CardKey>,

    pub pos: Option<usize>,
    pub phase: CardPhase,
    /// Left/right neighbors as they were at the moment of detaching
    frozen_neighbors: Option<(Option<CardId>, Option<CardId>)>,

    pub bus: Emitter<Game>,
    cache: DerivedCache,
}

impl Card {
    /// A fresh unplaced card for `def`. Starting units are seeded on enter.
    pub fn from_def(id: CardId, owner: usize, def: &CardDef) -> Self {
        Card {
            id,
            owner,
            key: def.key.clone(),
            name: def.name.clone(),
            faction: def.faction.clone(),
            level: def.level,
            color: ColorTier::Normal,
            belonging: def.belonging,
            units: Vec::new(),
            upgrades: SmallVec::new(),
            attrs: AttributeStore::new(),
            descriptors: Vec::new(),
            occupied: Vec::new(),
            pos: None,
            phase: CardPhase::Unplaced,
            frozen_neighbors: None,
            bus: Emitter::new(),
            cache: DerivedCache::new(),
        }
    }

    pub fn is_present(&self) -> bool {
        self.phase == CardPhase::Placed
    }

    pub fn is_egg(&self) -> bool {
        self.level == 0
    }

    pub fn units(&self) -> &[UnitKey] {
        &self.units
    }

    pub fn upgrades(&self) -> &[UpgradeKey] {
        &self.upgrades
    }

    pub fn has_upgrade(&self, key: &UpgradeKey) -> bool {
        self.upgrades.contains(key)
    }

    pub fn attrs(&self) -> &AttributeStore {
        &self.attrs
    }

    pub fn attrs_mut(&mut self) -> &mut AttributeStore {
        self.cache.invalidate(Source::Attributes);
        &mut self.attrs
    }

    /// Append units up to `limit` total; returns how many were added
    pub fn push_units(&mut self, units: impl IntoIterator<Item = UnitKey>, limit: usize) -> usize {
        let room = limit.saturating_sub(self.units.len());
        let before = self.units.len();
        self.units.extend(units.into_iter().take(room));
        self.cache.invalidate(Source::Units);
        self.units.len() - before
    }

    /// Substitute units in place; indices past the end are ignored
    pub fn replace_unit(
        &mut self,
        selector: UnitSelector<'_>,
        replacer: impl Fn(&UnitKey) -> UnitKey,
    ) -> usize {
        let mut replaced = 0;
        match selector {
            UnitSelector::Indices(indices) => {
                for &i in indices {
                    if let Some(unit) = self.units.get_mut(i) {
                        *unit = replacer(unit);
                        replaced += 1;
                    }
                }
            }
            UnitSelector::Matching(pred) => {
                for unit in self.units.iter_mut().filter(|u| pred(u)) {
                    *unit = replacer(unit);
                    replaced += 1;
                }
            }
        }
        if replaced > 0 {
            self.cache.invalidate(Source::Units);
        }
        replaced
    }

    /// Take up to `max` units matching `pred`, front to back
    pub fn remove_units(&mut self, pred: impl Fn(&UnitKey) -> bool, max: usize) -> Vec<UnitKey> {
        let mut taken = Vec::new();
        let mut kept = Vec::with_capacity(self.units.len());
        for unit in self.units.drain(..) {
            if taken.len() < max && pred(&unit) {
                taken.push(unit);
            } else {
                kept.push(unit);
            }
        }
        self.units = kept;
        if !taken.is_empty() {
            self.cache.invalidate(Source::Units);
        }
        taken
    }

    /// Replace the whole unit list (used by combine)
    pub fn set_units(&mut self, units: Vec<UnitKey>) {
        self.units = units;
        self.cache.invalidate(Source::Units);
    }

    pub fn push_upgrade(&mut self, key: UpgradeKey) {
        self.upgrades.push(key);
        self.cache.invalidate(Source::Upgrades);
    }

    pub fn take_upgrades(&mut self) -> Vec<UpgradeKey> {
        self.cache.invalidate(Source::Upgrades);
        self.upgrades.drain(..).collect()
    }

    pub fn value(&self, content: &dyn Content) -> i64 {
        self.cache.value(&self.units, &self.attrs, content)
    }

    pub fn power(&self, content: &dyn Content) -> i64 {
        self.cache.power(&self.units, &self.attrs, content)
    }

    pub fn infra(&self, content: &dyn Content) -> Option<InfraSlot> {
        self.cache.infra(&self.units, content)
    }

    pub fn place(&mut self, pos: usize) {
        self.pos = Some(pos);
        self.phase = CardPhase::Placed;
    }

    /// Leave the grid, remembering the neighbors of the last live position
    pub fn detach(&mut self, left: Option<CardId>, right: Option<CardId>) {
        self.frozen_neighbors = Some((left, right));
        self.pos = None;
        self.phase = CardPhase::Detached;
    }

    pub fn frozen_neighbors(&self) -> Option<(Option<CardId>, Option<CardId>)> {
        self.frozen_neighbors
    }

    /// Add `delta` to `name`, registering it with the add policy on first use
    pub fn bump(&mut self, name: &str, delta: i64) {
        let attrs = self.attrs_mut();
        attrs.configure(name, 0, crate::core::MergePolicy::Add);
        attrs.alter(name, delta);
    }
}
