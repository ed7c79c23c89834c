//! Card-level operations that post events or touch shared state
//!
//! Unit and upgrade gains, seizing, eliting, and everything about binding
//! descriptors to cards and arbitrating their unique slots.

use crate::bus::{Message, MsgKind, Payload, Route};
use crate::core::{
    Card, CardId, CardKey, ColorTier, DescriptorId, EntityStore, GainWay, UniqueKey, UnitKey,
    UnitSelector, UpgradeKey,
};
use crate::effects::{Binder, Claim, ClaimFacts, Descriptor, Generator};
use crate::game::{log_if_verbose, Game};
use crate::loader::UpgradeEffect;
use crate::Result;
use serde::{Deserialize, Serialize};

/// How a seize treats its target
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeizeOptions {
    /// Suppress the `card-seized` event
    pub unreal: bool,
    /// Also move the target's upgrades
    pub with_upgrades: bool,
}

/// Ordering facts for a unique claim, read from the live card
fn claim_facts(cards: &EntityStore<Card>, claim: &Claim) -> ClaimFacts {
    match cards.find(claim.card) {
        Some(card) => {
            let descriptor = card.descriptors.iter().find(|d| d.id == claim.descriptor);
            ClaimFacts {
                gold: descriptor.map_or(card.color.is_upgraded(), |d| d.gold),
                pos: card.pos,
                manually_disabled: descriptor.map_or(false, |d| d.manually_disabled),
            }
        }
        None => ClaimFacts {
            gold: false,
            pos: None,
            manually_disabled: true,
        },
    }
}

impl Game {
    /// Neighbors of a card; a detached card reports the ones it had when it left
    pub fn neighbors_of(&self, card: CardId) -> (Option<CardId>, Option<CardId>) {
        let Some(c) = self.cards.find(card) else {
            return (None, None);
        };
        match c.pos {
            Some(pos) => self
                .players
                .get(c.owner)
                .map_or((None, None), |p| p.neighbors(pos)),
            None => c.frozen_neighbors().unwrap_or((None, None)),
        }
    }

    pub fn is_present(&self, card: CardId) -> bool {
        self.cards.find(card).map_or(false, Card::is_present)
    }

    /// Give units to a card through the prev/post event pair
    ///
    /// Handlers of `obtain-unit-prev` may rewrite the list before it is
    /// applied; the result is capped at the owner's unit limit and the
    /// units actually added are announced in `obtain-unit-post`.
    pub fn obtain_units(&mut self, card: CardId, units: Vec<UnitKey>, way: GainWay) -> Result<usize> {
        let Some(owner) = self.cards.find(card).map(|c| c.owner) else {
            return Ok(0);
        };

        let prev = self.post(
            Message::new(MsgKind::ObtainUnitPrev)
                .to_player(owner)
                .to_card(Route::Handle(card))
                .with(Payload::Units { card, units, way }),
        )?;
        let Payload::Units { units, .. } = prev.payload else {
            return Ok(0);
        };

        let limit = self.players.get(owner).map_or(0, |p| p.unit_limit);
        let Some(c) = self.cards.find_mut(card) else {
            return Ok(0);
        };
        let room = limit.saturating_sub(c.units().len());
        let applied: Vec<UnitKey> = units.into_iter().take(room).collect();
        c.push_units(applied.iter().cloned(), limit);
        let added = applied.len();

        log_if_verbose!(self, "{} obtains {} unit(s) ({:?})", card, added, way);
        self.post(
            Message::new(MsgKind::ObtainUnitPost)
                .to_player(owner)
                .to_card(Route::Handle(card))
                .with(Payload::Units {
                    card,
                    units: applied,
                    way,
                }),
        )?;
        Ok(added)
    }

    pub fn replace_unit(
        &mut self,
        card: CardId,
        selector: UnitSelector<'_>,
        replacer: impl Fn(&UnitKey) -> UnitKey,
    ) -> usize {
        self.cards
            .find_mut(card)
            .map_or(0, |c| c.replace_unit(selector, replacer))
    }

    pub fn remove_units(
        &mut self,
        card: CardId,
        pred: impl Fn(&UnitKey) -> bool,
        max: usize,
    ) -> Vec<UnitKey> {
        self.cards
            .find_mut(card)
            .map_or_else(Vec::new, |c| c.remove_units(pred, max))
    }

    /// Replace up to `max` eliteable units with their elite forms, left to right
    pub fn elite(&mut self, card: CardId, max: usize) -> usize {
        let content = self.content();
        let Some(c) = self.cards.find_mut(card) else {
            return 0;
        };
        let eligible: Vec<usize> = c
            .units()
            .iter()
            .enumerate()
            .filter(|(_, u)| content.elite_of(u).is_some())
            .map(|(i, _)| i)
            .take(max)
            .collect();
        c.replace_unit(UnitSelector::Indices(&eligible), |u| {
            content.elite_of(u).unwrap_or_else(|| u.clone())
        })
    }

    /// Would `obtain_upgrade` accept this upgrade right now?
    pub fn can_obtain_upgrade(&self, card: CardId, key: &UpgradeKey) -> bool {
        let Some(def) = self.content.upgrade(key) else {
            return false;
        };
        self.cards.find(card).map_or(false, |c| {
            (def.overridable || !c.has_upgrade(key)) && c.upgrades().len() < self.config.max_upgrades
        })
    }

    /// Attach an upgrade and run its effect
    ///
    /// A held non-overridable upgrade, a full upgrade list or an unknown key
    /// is a no-op and returns `false`.
    pub fn obtain_upgrade(&mut self, card: CardId, key: &UpgradeKey) -> Result<bool> {
        if !self.can_obtain_upgrade(card, key) {
            return Ok(false);
        }
        let content = self.content();
        let Some(def) = content.upgrade(key) else {
            return Ok(false);
        };
        let Some(c) = self.cards.find_mut(card) else {
            return Ok(false);
        };
        c.push_upgrade(key.clone());
        let owner = c.owner;

        self.apply_upgrade_effect(card, &def.effect)?;
        self.logger.normal(&format!("{} obtains upgrade {}", card, key));
        self.post(
            Message::new(MsgKind::ObtainUpgrade)
                .to_player(owner)
                .to_card(Route::Handle(card))
                .with(Payload::Upgrade {
                    card,
                    upgrade: key.clone(),
                }),
        )?;
        Ok(true)
    }

    fn apply_upgrade_effect(&mut self, card: CardId, effect: &UpgradeEffect) -> Result<()> {
        match effect {
            UpgradeEffect::None => {}
            UpgradeEffect::GrantUnits { unit, count } => {
                self.obtain_units(card, vec![unit.clone(); *count], GainWay::Upgrade)?;
            }
            UpgradeEffect::AddAttribute {
                name,
                amount,
                policy,
            } => {
                if let Some(c) = self.cards.find_mut(card) {
                    let attrs = c.attrs_mut();
                    attrs.configure(name, 0, *policy);
                    attrs.alter(name, *amount);
                }
            }
            UpgradeEffect::Elite { max } => {
                self.elite(card, *max);
            }
            UpgradeEffect::Reskin { to, color } => self.reskin(card, to, *color)?,
        }
        Ok(())
    }

    /// Change a card's identity in place and rebind its descriptors
    pub fn reskin(&mut self, card: CardId, to: &CardKey, color: Option<ColorTier>) -> Result<()> {
        let content = self.content();
        let Some(def) = content.card(to) else {
            self.logger.warn(&format!("reskin target {} is not in the content pack", to));
            return Ok(());
        };
        self.clear_descriptors(card)?;
        if let Some(c) = self.cards.find_mut(card) {
            c.key = def.key.clone();
            c.name = def.name.clone();
            c.faction = def.faction.clone();
            c.belonging = def.belonging;
            if let Some(color) = color {
                c.color = color;
            }
        }
        self.bind_descriptors(card)?;
        Ok(())
    }

    /// Move every unit (and optionally upgrade) of `target` onto `card`,
    /// then destroy `target`
    ///
    /// Moved upgrades are attached without running their effects again.
    pub fn seize(&mut self, card: CardId, target: CardId, opts: SeizeOptions) -> Result<bool> {
        if card == target || !self.is_present(card) || !self.is_present(target) {
            return Ok(false);
        }
        let owner = self.cards.get(card)?.owner;

        let target_card = self.cards.get_mut(target)?;
        let units = target_card.remove_units(|_| true, usize::MAX);
        let upgrades = if opts.with_upgrades {
            target_card.take_upgrades()
        } else {
            Vec::new()
        };

        self.obtain_units(card, units, GainWay::Seize)?;
        // Effects of carried-over upgrades already shaped the moved units.
        let max_upgrades = self.config.max_upgrades;
        if let Some(c) = self.cards.find_mut(card) {
            for upgrade in upgrades {
                if !c.has_upgrade(&upgrade) && c.upgrades().len() < max_upgrades {
                    c.push_upgrade(upgrade);
                }
            }
        }
        self.destroy(target)?;

        if !opts.unreal {
            self.post(
                Message::new(MsgKind::CardSeized)
                    .to_player(owner)
                    .with(Payload::Seized { card, target }),
            )?;
        }
        Ok(true)
    }

    /// Bind every generator the catalog lists for the card's current key
    pub fn bind_descriptors(&mut self, card: CardId) -> Result<usize> {
        let Some(c) = self.cards.find(card) else {
            return Ok(0);
        };
        let key = c.key.clone();
        let gold = c.color.is_upgraded();
        match self.catalog().generators(&key) {
            Some(generators) => {
                for generator in &generators {
                    self.bind_descriptor(card, generator, gold)?;
                }
                Ok(generators.len())
            }
            None => {
                self.logger.warn(&format!("no descriptors registered for {}", key));
                Ok(0)
            }
        }
    }

    /// Add one extra descriptor at the card's current tier
    pub fn add_descriptor(&mut self, card: CardId, generator: &Generator) -> Result<DescriptorId> {
        let gold = self.cards.get(card)?.color.is_upgraded();
        self.bind_descriptor(card, generator, gold)
    }

    /// Run a generator inside a subscription batch and attach the result
    pub fn bind_descriptor(
        &mut self,
        card: CardId,
        generator: &Generator,
        gold: bool,
    ) -> Result<DescriptorId> {
        let id = self.next_descriptor_id();
        let c = self.cards.get_mut(card)?;
        let seat = c.owner;

        c.bus.begin();
        let spec = {
            let mut binder = Binder::new(card, seat, id, gold, &mut c.bus);
            generator(&mut binder)
        };
        let subscriptions = c.bus.end();
        let unique = spec.unique.clone();
        let ignores_tier = spec.unique_ignores_tier;
        c.descriptors.push(Descriptor::new(id, gold, spec, subscriptions));

        if let Some(key) = unique {
            self.claim_unique(seat, key, ignores_tier, Claim { card, descriptor: id });
        }
        log_if_verbose!(self, "{} binds descriptor {:?}", card, id);
        Ok(id)
    }

    /// Unbind every descriptor: dispose its subscriptions and release its
    /// unique claim, promoting the next claimant where the active one left
    pub fn clear_descriptors(&mut self, card: CardId) -> Result<()> {
        let Some(c) = self.cards.find_mut(card) else {
            return Ok(());
        };
        let seat = c.owner;
        let descriptors = std::mem::take(&mut c.descriptors);

        let mut released = Vec::new();
        for descriptor in descriptors {
            let unique = descriptor.unique.clone();
            let claim = Claim {
                card,
                descriptor: descriptor.id,
            };
            c.bus.dispose(descriptor.unbind());
            if let Some(key) = unique {
                released.push((key, claim));
            }
        }

        for (key, claim) in released {
            let promoted = self
                .players
                .get_mut(seat)
                .and_then(|p| p.unique.remove(&key, claim));
            if let Some(head) = promoted {
                self.set_disabled(head, false);
            }
        }
        Ok(())
    }

    /// Flip the manual switch on the card's `index`-th descriptor
    pub fn toggle_descriptor(&mut self, card: CardId, index: usize) -> Result<bool> {
        let Some(c) = self.cards.find_mut(card) else {
            return Ok(false);
        };
        let seat = c.owner;
        let Some(descriptor) = c.descriptors.get_mut(index) else {
            return Ok(false);
        };
        descriptor.manually_disabled = !descriptor.manually_disabled;
        let unique = descriptor.unique.clone();

        if let Some(key) = unique {
            self.resort_unique(seat, &key);
        }
        Ok(true)
    }

    fn claim_unique(&mut self, seat: usize, key: UniqueKey, ignores_tier: bool, claim: Claim) {
        let cards = &self.cards;
        let Some(player) = self.players.get_mut(seat) else {
            return;
        };
        let flags = player
            .unique
            .add(key, ignores_tier, claim, |cl: &Claim| claim_facts(cards, cl));
        for (claim, disabled) in flags {
            self.set_disabled(claim, disabled);
        }
    }

    fn resort_unique(&mut self, seat: usize, key: &UniqueKey) {
        let cards = &self.cards;
        let Some(player) = self.players.get_mut(seat) else {
            return;
        };
        let flags = player
            .unique
            .resort(key, |cl: &Claim| claim_facts(cards, cl));
        for (claim, disabled) in flags {
            self.set_disabled(claim, disabled);
        }
    }

    fn set_disabled(&mut self, claim: Claim, disabled: bool) {
        if let Some(d) = self
            .cards
            .find_mut(claim.card)
            .and_then(|c| c.descriptors.iter_mut().find(|d| d.id == claim.descriptor))
        {
            d.disabled = disabled;
        }
    }
}
