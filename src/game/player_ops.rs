//! Player-level operations: entering, combining, removing cards, the store,
//! and read-only queries over the present grid

use crate::bus::{Message, MsgKind, Payload};
use crate::core::{Belonging, Card, CardId, CardKey, ColorTier, Faction, UnitKey};
use crate::game::query::QueryKind;
use crate::game::{log_if_verbose, Game};
use crate::Result;
use std::collections::BTreeMap;

/// Why a card leaves the grid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    Sell,
    Destroy,
}

/// What happens when a card of some kind leaves the grid some way
#[derive(Debug, Clone, Copy)]
struct RemovalRule {
    removal: Removal,
    egg: bool,
    before: MsgKind,
    after: MsgKind,
    refund: bool,
    darkness: bool,
}

/// Selling an egg counts as destroying it: no refund, no darkness
const REMOVAL_RULES: [RemovalRule; 4] = [
    RemovalRule {
        removal: Removal::Sell,
        egg: false,
        before: MsgKind::CardSold,
        after: MsgKind::PostSell,
        refund: true,
        darkness: true,
    },
    RemovalRule {
        removal: Removal::Sell,
        egg: true,
        before: MsgKind::CardDestroyed,
        after: MsgKind::PostDestroy,
        refund: false,
        darkness: false,
    },
    RemovalRule {
        removal: Removal::Destroy,
        egg: false,
        before: MsgKind::CardDestroyed,
        after: MsgKind::PostDestroy,
        refund: false,
        darkness: true,
    },
    RemovalRule {
        removal: Removal::Destroy,
        egg: true,
        before: MsgKind::CardDestroyed,
        after: MsgKind::PostDestroy,
        refund: false,
        darkness: false,
    },
];

fn removal_rule(removal: Removal, egg: bool) -> RemovalRule {
    REMOVAL_RULES
        .iter()
        .copied()
        .find(|r| r.removal == removal && r.egg == egg)
        .unwrap_or(REMOVAL_RULES[2])
}

impl Game {
    /// Put a new card for `key` onto the grid at the lowest free slot
    ///
    /// Cards authored with `insert` ask the owner for a position instead and
    /// return `None` until the query is answered. With no free slot the card
    /// never exists and its occupied keys go straight back to the pool.
    pub fn enter(&mut self, seat: usize, key: &CardKey, occupied: Vec<CardKey>) -> Result<Option<CardId>> {
        let content = self.content();
        let Some(def) = content.card(key) else {
            self.logger.warn(&format!("cannot enter unknown card {}", key));
            self.pool.drop(occupied);
            return Ok(None);
        };
        if self.players.get(seat).and_then(|p| p.free_slot()).is_none() {
            self.pool.drop(occupied);
            return Ok(None);
        }
        if def.insert {
            self.issue_query(
                seat,
                QueryKind::InsertSlot {
                    card: key.clone(),
                    occupied,
                },
            )?;
            return Ok(None);
        }
        self.enter_at(seat, key, occupied, None)
    }

    /// Enter at `pos` (shifting neighbors to make room) or at the lowest
    /// free slot when `pos` is `None`
    pub fn enter_at(
        &mut self,
        seat: usize,
        key: &CardKey,
        occupied: Vec<CardKey>,
        pos: Option<usize>,
    ) -> Result<Option<CardId>> {
        let content = self.content();
        let (Some(def), Some(player)) = (content.card(key), self.players.get_mut(seat)) else {
            self.pool.drop(occupied);
            return Ok(None);
        };
        let Some(pos) = pos.or_else(|| player.free_slot()) else {
            self.pool.drop(occupied);
            return Ok(None);
        };
        let Some(moved) = player.put(pos) else {
            self.pool.drop(occupied);
            return Ok(None);
        };
        let limit = player.unit_limit;
        for (id, new_pos) in moved {
            if let Some(c) = self.cards.find_mut(id) {
                c.place(new_pos);
            }
        }

        let id = self.cards.next_id();
        let mut card = Card::from_def(id, seat, def);
        card.occupied = occupied;
        card.push_units(def.units.iter().cloned(), limit);
        card.place(pos);
        self.players[seat].present[pos] = Some(id);
        self.cards.insert(id, card);

        self.bind_descriptors(id)?;
        self.logger
            .normal(&format!("P{} enters {} {} at {}", seat, def.name, id, pos));
        self.post(
            Message::new(MsgKind::CardEntered)
                .to_player(seat)
                .with(Payload::Card(id)),
        )?;
        self.post(
            Message::new(MsgKind::PostEnter)
                .to_player(seat)
                .with(Payload::Card(id)),
        )?;
        Ok(Some(id))
    }

    /// Two normal-tier present cards sharing `key`'s name, leftmost first
    fn combine_pair(&self, seat: usize, name: &str) -> Option<(CardId, CardId)> {
        let player = self.players.get(seat)?;
        let mut matching = player.present_cards().filter_map(|(_, id)| {
            self.cards
                .find(id)
                .filter(|c| c.name == name && c.color == ColorTier::Normal)
                .map(|c| c.id)
        });
        Some((matching.next()?, matching.next()?))
    }

    pub fn can_combine(&self, seat: usize, key: &CardKey) -> bool {
        self.content
            .card(key)
            .map_or(false, |def| self.combine_pair(seat, &def.name).is_some())
    }

    /// Merge two present copies with a third copy of `key` into one
    /// upgraded-tier card
    ///
    /// The leftmost copy survives. The other is detached and removed; its
    /// units, upgrades, attributes and occupied keys move onto the survivor.
    /// The owner is then offered a discover one tier above their level.
    pub fn combine(&mut self, seat: usize, key: &CardKey, occupied: Vec<CardKey>) -> Result<Option<CardId>> {
        let content = self.content();
        let Some(def) = content.card(key) else {
            self.pool.drop(occupied);
            return Ok(None);
        };
        let Some((survivor, consumed)) = self.combine_pair(seat, &def.name) else {
            self.pool.drop(occupied);
            return Ok(None);
        };

        self.clear_descriptors(survivor)?;
        self.clear_descriptors(consumed)?;

        let Some(mut gone) = self.cards.remove(consumed) else {
            return Ok(None);
        };
        if let Some(pos) = gone.pos {
            let (left, right) = self.players[seat].neighbors(pos);
            self.players[seat].present[pos] = None;
            gone.detach(left, right);
        }

        let limit = self.players[seat].unit_limit;
        let max_upgrades = self.config.max_upgrades;
        let s = self.cards.get_mut(survivor)?;
        s.color = s.color.promote();

        // One infra kind per card: the survivor's wins.
        let mut incoming: Vec<UnitKey> = gone.remove_units(|_| true, usize::MAX);
        if s.infra(content.as_ref()).is_some() {
            incoming.retain(|u| content.infra_of(u).is_none());
        }
        s.push_units(incoming, limit);
        for upgrade in gone.upgrades() {
            if !s.has_upgrade(upgrade) && s.upgrades().len() < max_upgrades {
                s.push_upgrade(upgrade.clone());
            }
        }
        let conflicts = s.attrs_mut().combine(gone.attrs());
        s.occupied.append(&mut gone.occupied);
        s.occupied.extend(occupied);
        let faction = s.faction.clone();

        for conflict in conflicts {
            self.logger.warn(&format!(
                "combine {}: attribute {} kept {:?}, dropped {:?}",
                def.name, conflict.name, conflict.kept, conflict.dropped
            ));
        }

        self.bind_descriptors(survivor)?;
        self.logger
            .normal(&format!("P{} combines {} into {}", seat, def.name, survivor));
        self.post(
            Message::new(MsgKind::CardCombined)
                .to_player(seat)
                .with(Payload::Card(survivor)),
        )?;
        self.post(
            Message::new(MsgKind::PostEnter)
                .to_player(seat)
                .with(Payload::Card(survivor)),
        )?;

        let tier = (self.players[seat].level + 1).min(self.config.max_level);
        self.offer_discover(seat, tier, Some(faction))?;
        Ok(Some(survivor))
    }

    pub fn sell(&mut self, card: CardId) -> Result<bool> {
        self.remove_card(card, Removal::Sell)
    }

    pub fn destroy(&mut self, card: CardId) -> Result<bool> {
        self.remove_card(card, Removal::Destroy)
    }

    /// Take a present card off the grid
    ///
    /// The card detaches (freezing its neighbors), loses its descriptors and
    /// announces the removal while still resolvable by handle. Its occupied
    /// keys go back to the pool unless it is virtual, its live neighbors gain
    /// darkness, a sale refunds mineral, and the post event fires last.
    pub fn remove_card(&mut self, card: CardId, removal: Removal) -> Result<bool> {
        let Some(c) = self.cards.find(card) else {
            return Ok(false);
        };
        let Some(pos) = c.pos else {
            return Ok(false);
        };
        let (seat, level, belonging) = (c.owner, c.level, c.belonging);
        let rule = removal_rule(removal, c.is_egg());

        let (left, right) = self.players[seat].neighbors(pos);
        self.players[seat].present[pos] = None;
        self.cards.get_mut(card)?.detach(left, right);
        self.clear_descriptors(card)?;

        self.logger
            .normal(&format!("P{} {:?} {}", seat, removal, card));
        self.post(
            Message::new(rule.before)
                .to_player(seat)
                .with(Payload::Card(card)),
        )?;

        if let Some(c) = self.cards.find_mut(card) {
            let occupied = std::mem::take(&mut c.occupied);
            if belonging != Belonging::Virtual {
                self.pool.drop(occupied);
            }
        }
        if rule.darkness {
            let amount = self.config.darkness_for(level);
            for neighbor in [left, right].into_iter().flatten() {
                if let Some(n) = self.cards.find_mut(neighbor).filter(|n| n.is_present()) {
                    n.bump("darkness", amount);
                }
            }
        }
        if rule.refund {
            self.players[seat].mineral += self.config.sell_refund;
        }

        self.post(
            Message::new(rule.after)
                .to_player(seat)
                .with(Payload::Card(card)),
        )?;
        self.cards.remove(card);
        Ok(true)
    }

    /// Replace the store contents with a fresh weighted draw
    ///
    /// Current offers go back to the pool first. Only tiers up to the
    /// player's level are eligible; if fewer copies are left than slots,
    /// the remaining slots stay empty.
    pub fn refresh_store(&mut self, seat: usize) -> Result<()> {
        let Some(player) = self.players.get_mut(seat) else {
            return Ok(());
        };
        let old: Vec<CardKey> = player.store.iter_mut().filter_map(Option::take).collect();
        let (level, slots) = (player.level, player.store.len());
        self.pool.drop(old);

        let drawn = self.draw_for_store(level, slots)?;
        let player = &mut self.players[seat];
        for (slot, key) in player.store.iter_mut().zip(drawn) {
            *slot = Some(key);
        }

        log_if_verbose!(self, "P{} store {:?}", seat, self.players[seat].store);
        self.post(Message::new(MsgKind::StoreRefreshed).to_player(seat))?;
        Ok(())
    }

    /// Fill only the empty store slots
    pub fn fill_store(&mut self, seat: usize) -> Result<()> {
        let Some(player) = self.players.get(seat) else {
            return Ok(());
        };
        let empty = player.store.iter().filter(|s| s.is_none()).count();
        let level = player.level;
        let drawn = self.draw_for_store(level, empty)?;
        let mut drawn = drawn.into_iter();
        for slot in self.players[seat].store.iter_mut().filter(|s| s.is_none()) {
            *slot = drawn.next();
        }
        Ok(())
    }

    fn draw_for_store(&mut self, level: u8, slots: usize) -> Result<Vec<CardKey>> {
        let content = self.content();
        let eligible = |k: &CardKey| content.card(k).map_or(false, |c| c.level <= level);
        let count = slots.min(self.pool.eligible(&eligible));
        self.pool.draw_weighted(&mut self.rng, &eligible, count)
    }

    /// Pay for and take the next player level
    pub fn level_up(&mut self, seat: usize) -> Result<bool> {
        let max_level = self.config.max_level;
        let Some(player) = self.players.get_mut(seat) else {
            return Ok(false);
        };
        if player.level >= max_level || player.mineral < player.upgrade_cost {
            return Ok(false);
        }
        player.mineral -= player.upgrade_cost;
        player.level += 1;
        let level = player.level;
        player.upgrade_cost = self.config.level_up_cost(level);
        let size = self.config.store_size(level);
        if player.store.len() < size {
            player.store.resize(size, None);
        }

        self.fill_store(seat)?;
        self.logger.normal(&format!("P{} reaches level {}", seat, level));
        self.post(
            Message::new(MsgKind::PlayerUpgraded)
                .to_player(seat)
                .with(Payload::Level(level)),
        )?;
        Ok(true)
    }

    /// Present cards per faction
    pub fn count_by_faction(&self, seat: usize) -> BTreeMap<Faction, usize> {
        let mut counts = BTreeMap::new();
        for card in self.all_of(seat, |_| true) {
            *counts.entry(card.faction.clone()).or_insert(0) += 1;
        }
        counts
    }

    /// Present cards satisfying `pred`, left to right
    pub fn all_of<'a>(&'a self, seat: usize, pred: impl Fn(&Card) -> bool + 'a) -> impl Iterator<Item = &'a Card> + 'a {
        self.players
            .get(seat)
            .into_iter()
            .flat_map(|p| p.present_cards())
            .filter_map(move |(_, id)| self.cards.find(id))
            .filter(move |c| pred(c))
    }

    pub fn all_of_faction<'a>(&'a self, seat: usize, faction: &'a Faction) -> impl Iterator<Item = &'a Card> + 'a {
        self.all_of(seat, move |c| &c.faction == faction)
    }

    pub fn find_by_name<'a>(&'a self, seat: usize, name: &'a str) -> Option<&'a Card> {
        self.all_of(seat, move |c| c.name == name).next()
    }

    pub fn aggregate_power(&self, seat: usize) -> i64 {
        let content = self.content();
        self.all_of(seat, |_| true)
            .map(|c| c.power(content.as_ref()))
            .sum()
    }

    pub fn aggregate_value(&self, seat: usize) -> i64 {
        let content = self.content();
        self.all_of(seat, |_| true)
            .map(|c| c.value(content.as_ref()))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::Handler;
    use crate::core::RoleKind;
    use crate::effects::EffectCatalog;
    use crate::game::{Command, CommandKind, GameConfig, VerbosityLevel};
    use crate::loader::{Content, ContentPack};
    use rand::SeedableRng;
    use rand_chacha::ChaCha12Rng;
    use std::sync::{Arc, Mutex};

    fn demo_game(seed: &str) -> Game {
        let content: Arc<dyn Content> = Arc::new(ContentPack::demo().unwrap());
        let catalog = Arc::new(EffectCatalog::from_content(content.as_ref()));
        let roles = [RoleKind::Neutral, RoleKind::Neutral];
        let mut game = Game::new(GameConfig::default(), content, catalog, seed, &roles);
        game.logger.set_verbosity(VerbosityLevel::Silent);
        game.start().unwrap();
        game
    }

    fn take(game: &mut Game, key: &str) -> Vec<CardKey> {
        let key = CardKey::new(key);
        let mut rng = ChaCha12Rng::seed_from_u64(0);
        game.pool.discover(&mut rng, |k| *k == key, 1, true).unwrap()
    }

    fn stock(game: &mut Game, place: usize, key: &str) {
        let mut taken = take(game, key);
        let old = game.players[0].store[place].replace(taken.remove(0));
        game.pool.drop(old);
    }

    fn place(game: &mut Game, key: &str) -> CardId {
        let occupied = take(game, key);
        game.enter(0, &CardKey::new(key), occupied).unwrap().unwrap()
    }

    /// Record the kinds of `kinds` messages reaching player 0's bus node
    fn record(game: &mut Game, kinds: &[MsgKind]) -> Arc<Mutex<Vec<&'static str>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        for &kind in kinds {
            let seen = Arc::clone(&seen);
            let handler: Handler<Game> = Arc::new(move |_: &mut Game, m: &mut Message| {
                seen.lock().unwrap().push(m.kind.as_str());
                Ok(())
            });
            game.players[0].bus.on(kind, handler);
        }
        seen
    }

    #[test]
    fn test_enter_and_combine_post_in_order() {
        let mut game = demo_game("event-order");
        game.players[0].mineral = 100;
        for slot in 0..3 {
            stock(&mut game, slot, "marine-squad");
        }
        let seen = record(
            &mut game,
            &[MsgKind::CardEntered, MsgKind::CardCombined, MsgKind::PostEnter],
        );

        game.apply(Command::new(0, CommandKind::BuyEnter { place: 0 })).unwrap();
        assert_eq!(*seen.lock().unwrap(), vec!["card-entered", "post-enter"]);

        game.apply(Command::new(0, CommandKind::BuyEnter { place: 1 })).unwrap();
        seen.lock().unwrap().clear();
        game.apply(Command::new(0, CommandKind::BuyCombine { place: 2 })).unwrap();
        assert_eq!(*seen.lock().unwrap(), vec!["card-combined", "post-enter"]);
    }

    #[test]
    fn test_board_queries_see_only_live_present_cards() {
        let mut game = demo_game("board-queries");
        let squad = place(&mut game, "marine-squad");
        place(&mut game, "zealot-guard");
        place(&mut game, "probe-works");
        // Copies held in the store and the hand are not on the board
        stock(&mut game, 0, "zergling-pack");
        let held = [take(&mut game, "zergling-pack").pop(), take(&mut game, "marine-squad").pop()];
        for (slot, key) in held.into_iter().enumerate() {
            game.players[0].hand[slot] = key;
        }
        if let Some(c) = game.cards.find_mut(squad) {
            c.bump("power", 3);
        }

        let terran = Faction::new("terran");
        let protoss = Faction::new("protoss");
        let counts = game.count_by_faction(0);
        assert_eq!(counts.get(&terran), Some(&1));
        assert_eq!(counts.get(&protoss), Some(&2));
        assert_eq!(counts.get(&Faction::new("zerg")), None);

        let names: Vec<&str> = game
            .all_of_faction(0, &protoss)
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(names, vec!["Zealot Guard", "Probe Works"]);
        assert_eq!(game.find_by_name(0, "Marine Squad").map(|c| c.id), Some(squad));
        assert!(game.find_by_name(0, "Zergling Pack").is_none());
        assert!(game.find_by_name(1, "Marine Squad").is_none());
        assert_eq!(game.aggregate_power(0), 3);
        assert_eq!(game.aggregate_power(1), 0);

        game.apply(Command::new(0, CommandKind::PresentSell { place: 0 })).unwrap();
        assert_eq!(game.count_by_faction(0).get(&terran), None);
        assert!(game.find_by_name(0, "Marine Squad").is_none());
        assert_eq!(game.aggregate_power(0), 0);
        assert_eq!(game.all_of_faction(0, &terran).count(), 0);
    }
}
