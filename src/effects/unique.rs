//! Unique-slot arbitration
//!
//! Some descriptors claim a named singleton ability. Per player and per key
//! the claims form an ordered list; only the head is enabled. Claims are
//! ordered by:
//!
//! 1. manually disabled claims last,
//! 2. upgraded tier first, unless the slot ignores tier,
//! 3. ascending grid position (detached cards last).
//!
//! Adding re-sorts; removing the head promotes the next claim in place
//! without re-sorting.

use crate::core::{CardId, DescriptorId, UniqueKey};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Claim {
    pub card: CardId,
    pub descriptor: DescriptorId,
}

/// The live facts about a claim that ordering depends on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClaimFacts {
    pub gold: bool,
    pub pos: Option<usize>,
    pub manually_disabled: bool,
}

fn sort_key(facts: &ClaimFacts, ignores_tier: bool) -> (bool, bool, usize) {
    (
        facts.manually_disabled,
        !ignores_tier && !facts.gold,
        facts.pos.unwrap_or(usize::MAX),
    )
}

#[derive(Debug, Clone, Default)]
pub struct UniqueSlot {
    pub ignores_tier: bool,
    pub claims: Vec<Claim>,
}

impl UniqueSlot {
    fn sort(&mut self, facts: &impl Fn(&Claim) -> ClaimFacts) {
        let ignores_tier = self.ignores_tier;
        self.claims.sort_by_key(|c| sort_key(&facts(c), ignores_tier));
    }

    /// `(claim, disabled)` for every claim: only the head is enabled
    fn flags(&self) -> Vec<(Claim, bool)> {
        self.claims
            .iter()
            .enumerate()
            .map(|(i, c)| (*c, i != 0))
            .collect()
    }
}

#[derive(Debug, Clone, Default)]
pub struct UniqueTable {
    slots: BTreeMap<UniqueKey, UniqueSlot>,
}

impl UniqueTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a claim, re-sort the slot and return the new disabled flags
    ///
    /// The first claim on a key decides whether the slot ignores tier.
    pub fn add(
        &mut self,
        key: UniqueKey,
        ignores_tier: bool,
        claim: Claim,
        facts: impl Fn(&Claim) -> ClaimFacts,
    ) -> Vec<(Claim, bool)> {
        let slot = self.slots.entry(key).or_insert_with(|| UniqueSlot {
            ignores_tier,
            claims: Vec::new(),
        });
        slot.claims.push(claim);
        slot.sort(&facts);
        slot.flags()
    }

    /// Drop a claim; returns the newly promoted head if the active claim left
    pub fn remove(&mut self, key: &UniqueKey, claim: Claim) -> Option<Claim> {
        let slot = self.slots.get_mut(key)?;
        let idx = slot.claims.iter().position(|c| *c == claim)?;
        slot.claims.remove(idx);
        let promoted = if idx == 0 { slot.claims.first().copied() } else { None };
        if slot.claims.is_empty() {
            self.slots.remove(key);
        }
        promoted
    }

    /// Re-sort after a claim's facts changed (e.g. a manual toggle)
    pub fn resort(
        &mut self,
        key: &UniqueKey,
        facts: impl Fn(&Claim) -> ClaimFacts,
    ) -> Vec<(Claim, bool)> {
        match self.slots.get_mut(key) {
            Some(slot) => {
                slot.sort(&facts);
                slot.flags()
            }
            None => Vec::new(),
        }
    }

    pub fn active(&self, key: &UniqueKey) -> Option<Claim> {
        self.slots.get(key).and_then(|s| s.claims.first().copied())
    }

    pub fn claims(&self, key: &UniqueKey) -> &[Claim] {
        self.slots.get(key).map_or(&[], |s| s.claims.as_slice())
    }

    pub fn keys(&self) -> impl Iterator<Item = &UniqueKey> {
        self.slots.keys()
    }
}
