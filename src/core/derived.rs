//! Memoized derived values of a card
//!
//! A tiny explicit dataflow graph: each derived value lists the sources it
//! reads, and writing a source clears exactly the values depending on it.
//! Values are recomputed lazily on the next read.

use crate::core::{AttributeStore, InfraSlot, UnitKey};
use crate::loader::Content;
use std::cell::Cell;

/// Mutable inputs of the derived values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Units,
    Attributes,
    Upgrades,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Derived {
    /// Sum of unit values plus the "sacrifice" attribute
    Value,
    /// "power" attribute plus one per heroic unit
    Power,
    /// The support unit the card carries, if any
    Infra,
}

impl Derived {
    pub const ALL: [Derived; 3] = [Derived::Value, Derived::Power, Derived::Infra];

    pub const fn depends_on(self) -> &'static [Source] {
        match self {
            Derived::Value => &[Source::Units, Source::Attributes],
            Derived::Power => &[Source::Units, Source::Attributes],
            Derived::Infra => &[Source::Units],
        }
    }
}

#[derive(Debug, Default)]
pub struct DerivedCache {
    value: Cell<Option<i64>>,
    power: Cell<Option<i64>>,
    infra: Cell<Option<Option<InfraSlot>>>,
}

impl DerivedCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every memoized value reading `source`
    pub fn invalidate(&self, source: Source) {
        for derived in Derived::ALL {
            if derived.depends_on().contains(&source) {
                self.clear(derived);
            }
        }
    }

    fn clear(&self, derived: Derived) {
        match derived {
            Derived::Value => self.value.set(None),
            Derived::Power => self.power.set(None),
            Derived::Infra => self.infra.set(None),
        }
    }

    pub fn is_cached(&self, derived: Derived) -> bool {
        match derived {
            Derived::Value => self.value.get().is_some(),
            Derived::Power => self.power.get().is_some(),
            Derived::Infra => self.infra.get().is_some(),
        }
    }

    pub fn value(&self, units: &[UnitKey], attrs: &AttributeStore, content: &dyn Content) -> i64 {
        if let Some(v) = self.value.get() {
            return v;
        }
        let v = units.iter().map(|u| content.unit_value(u)).sum::<i64>() + attrs.get("sacrifice", 0);
        self.value.set(Some(v));
        v
    }

    pub fn power(&self, units: &[UnitKey], attrs: &AttributeStore, content: &dyn Content) -> i64 {
        if let Some(v) = self.power.get() {
            return v;
        }
        let heroic = units.iter().filter(|u| content.is_heroic(u)).count() as i64;
        let v = attrs.get("power", 0) + heroic;
        self.power.set(Some(v));
        v
    }

    pub fn infra(&self, units: &[UnitKey], content: &dyn Content) -> Option<InfraSlot> {
        if let Some(v) = self.infra.get() {
            return v;
        }
        let v = units.iter().find_map(|u| content.infra_of(u));
        self.infra.set(Some(v));
        v
    }
}

impl Clone for DerivedCache {
    fn clone(&self) -> Self {
        // A fresh cache is always correct; it just recomputes on first read.
        DerivedCache::new()
    }
}
