//! Player commands
//!
//! Commands are plain data: a seat and a [`CommandKind`]. [`Game::apply`]
//! appends them to the log and posts them at the root of the bus, where the
//! handlers installed here validate and execute them. Anything illegal
//! (wrong seat, empty slot, not enough mineral, frozen player) is logged and
//! ignored rather than rejected, so every replica processes the exact same
//! stream.

use crate::bus::{Emitter, Handler, Message, MsgKind, Payload, Route};
use crate::core::{AbilityState, Area, CardKey, RoleKind, UpgradeKey};
use crate::game::query::Resolution;
use crate::game::{log_if_verbose, Game};
use crate::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "name")]
pub enum CommandKind {
    /// Pay the upgrade cost and gain a player level
    #[serde(rename = "$upgrade")]
    Upgrade,
    #[serde(rename = "$refresh")]
    Refresh,
    /// Keep the current store through the next round start
    #[serde(rename = "$lock")]
    Lock,
    #[serde(rename = "$buy-enter")]
    BuyEnter { place: usize },
    #[serde(rename = "$buy-hand")]
    BuyHand { place: usize },
    #[serde(rename = "$buy-combine")]
    BuyCombine { place: usize },
    #[serde(rename = "$hand-enter")]
    HandEnter { place: usize },
    #[serde(rename = "$hand-combine")]
    HandCombine { place: usize },
    #[serde(rename = "$hand-sell")]
    HandSell { place: usize },
    #[serde(rename = "$present-sell")]
    PresentSell { place: usize },
    #[serde(rename = "$present-upgrade")]
    PresentUpgrade { place: usize, upgrade: UpgradeKey },
    /// Flip the manual switch of one descriptor
    #[serde(rename = "$present-toggle")]
    PresentToggle { place: usize, descriptor: usize },
    /// Use the role's active ability
    #[serde(rename = "$ability")]
    Ability,
    #[serde(rename = "$choose")]
    Choose { index: usize },
    #[serde(rename = "$cancel")]
    Cancel,
    /// Finish this round
    #[serde(rename = "$done")]
    Done,
}

impl CommandKind {
    pub fn msg_kind(&self) -> MsgKind {
        match self {
            CommandKind::Upgrade => MsgKind::Upgrade,
            CommandKind::Refresh => MsgKind::Refresh,
            CommandKind::Lock => MsgKind::Lock,
            CommandKind::BuyEnter { .. } => MsgKind::BuyEnter,
            CommandKind::BuyHand { .. } => MsgKind::BuyHand,
            CommandKind::BuyCombine { .. } => MsgKind::BuyCombine,
            CommandKind::HandEnter { .. } => MsgKind::HandEnter,
            CommandKind::HandCombine { .. } => MsgKind::HandCombine,
            CommandKind::HandSell { .. } => MsgKind::HandSell,
            CommandKind::PresentSell { .. } => MsgKind::PresentSell,
            CommandKind::PresentUpgrade { .. } => MsgKind::PresentUpgrade,
            CommandKind::PresentToggle { .. } => MsgKind::PresentToggle,
            CommandKind::Ability => MsgKind::Ability,
            CommandKind::Choose { .. } => MsgKind::Choose,
            CommandKind::Cancel => MsgKind::Cancel,
            CommandKind::Done => MsgKind::Done,
        }
    }

    pub fn name(&self) -> &'static str {
        self.msg_kind().as_str()
    }

    /// The slot a command reads from, if any
    pub fn source(&self) -> Option<(Area, usize)> {
        match *self {
            CommandKind::BuyEnter { place }
            | CommandKind::BuyHand { place }
            | CommandKind::BuyCombine { place } => Some((Area::Store, place)),
            CommandKind::HandEnter { place }
            | CommandKind::HandCombine { place }
            | CommandKind::HandSell { place } => Some((Area::Hand, place)),
            CommandKind::PresentSell { place }
            | CommandKind::PresentUpgrade { place, .. }
            | CommandKind::PresentToggle { place, .. } => Some((Area::Present, place)),
            _ => None,
        }
    }
}

/// One entry of the command log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    pub player: usize,
    #[serde(flatten)]
    pub kind: CommandKind,
}

impl Command {
    pub fn new(player: usize, kind: CommandKind) -> Self {
        Command { player, kind }
    }

    pub fn to_message(&self) -> Message {
        Message::new(self.kind.msg_kind())
            .to_player(self.player)
            .to_card(Route::Index(usize::MAX))
            .with(Payload::Command(self.kind.clone()))
    }
}

/// Register the root handlers that execute commands
pub fn install(bus: &mut Emitter<Game>) {
    let handler: Handler<Game> = Arc::new(|game: &mut Game, msg: &mut Message| {
        let (Route::Index(seat), Payload::Command(kind)) = (msg.player, &msg.payload) else {
            return Ok(());
        };
        let kind = kind.clone();
        game.execute(seat, kind)
    });
    for kind in MsgKind::COMMANDS {
        bus.on(kind, Arc::clone(&handler));
    }
}

impl Game {
    /// Validate and run one command; illegal commands are logged and dropped
    pub fn execute(&mut self, seat: usize, kind: CommandKind) -> Result<()> {
        let Some(player) = self.players.get(seat) else {
            log_if_verbose!(self, "ignored {}: no seat {}", kind.name(), seat);
            return Ok(());
        };
        if player.done {
            log_if_verbose!(self, "ignored {}: P{} is done", kind.name(), seat);
            return Ok(());
        }
        let answering = matches!(kind, CommandKind::Choose { .. } | CommandKind::Cancel);
        if player.is_frozen() != answering {
            log_if_verbose!(self, "ignored {}: P{} query state", kind.name(), seat);
            return Ok(());
        }

        let applied = match &kind {
            CommandKind::Upgrade => self.level_up(seat)?,
            CommandKind::Refresh => self.paid_refresh(seat)?,
            CommandKind::Lock => {
                let player = &mut self.players[seat];
                player.store_locked = !player.store_locked;
                true
            }
            CommandKind::BuyEnter { place } => self.buy_enter(seat, *place)?,
            CommandKind::BuyHand { place } => self.buy_hand(seat, *place)?,
            CommandKind::BuyCombine { place } => self.buy_combine(seat, *place)?,
            CommandKind::HandEnter { place } => self.hand_enter(seat, *place)?,
            CommandKind::HandCombine { place } => self.hand_combine(seat, *place)?,
            CommandKind::HandSell { place } => self.hand_sell(seat, *place),
            CommandKind::PresentSell { place } => match self.players[seat].card_at(*place) {
                Some(card) => self.sell(card)?,
                None => false,
            },
            CommandKind::PresentUpgrade { place, upgrade } => {
                self.present_upgrade(seat, *place, upgrade)?
            }
            CommandKind::PresentToggle { place, descriptor } => {
                match self.players[seat].card_at(*place) {
                    Some(card) => self.toggle_descriptor(card, *descriptor)?,
                    None => false,
                }
            }
            CommandKind::Ability => self.use_ability(seat)?,
            CommandKind::Choose { index } => self.resolve_query(seat, Resolution::Choose(*index))?,
            CommandKind::Cancel => self.resolve_query(seat, Resolution::Cancel)?,
            CommandKind::Done => self.mark_done(seat)?,
        };

        if !applied {
            log_if_verbose!(self, "ignored {} from P{}", kind.name(), seat);
        }
        Ok(())
    }

    /// Price of the next purchase this round
    pub fn buy_price(&self, seat: usize) -> i64 {
        let Some(player) = self.players.get(seat) else {
            return self.config.card_cost;
        };
        let nth = player.round.get("bought", 0);
        (self.config.card_cost - player.role.kind.buy_discount(nth)).max(0)
    }

    fn store_offer(&self, seat: usize, place: usize) -> Option<CardKey> {
        self.players.get(seat)?.store.get(place)?.clone()
    }

    /// Take the store offer at `place`, paying for it
    fn take_from_store(&mut self, seat: usize, place: usize) -> Option<CardKey> {
        let price = self.buy_price(seat);
        let player = self.players.get_mut(seat)?;
        if player.mineral < price {
            return None;
        }
        let key = player.store.get_mut(place)?.take()?;
        player.mineral -= price;
        player.round.alter("bought", 1);
        Some(key)
    }

    fn can_afford(&self, seat: usize) -> bool {
        self.players
            .get(seat)
            .map_or(false, |p| p.mineral >= self.buy_price(seat))
    }

    fn announce_purchase(&mut self, seat: usize, key: &CardKey) -> Result<()> {
        self.logger.normal(&format!("P{} buys {}", seat, key));
        self.post(Message::new(MsgKind::StoreBought).to_player(seat))?;
        Ok(())
    }

    fn buy_enter(&mut self, seat: usize, place: usize) -> Result<bool> {
        let has_room = self.players[seat].free_slot().is_some();
        if !has_room || self.store_offer(seat, place).is_none() || !self.can_afford(seat) {
            return Ok(false);
        }
        let Some(key) = self.take_from_store(seat, place) else {
            return Ok(false);
        };
        self.announce_purchase(seat, &key)?;
        self.enter(seat, &key, vec![key.clone()])?;
        Ok(true)
    }

    fn buy_hand(&mut self, seat: usize, place: usize) -> Result<bool> {
        let Some(slot) = self.players[seat].free_hand_slot() else {
            return Ok(false);
        };
        let Some(key) = self.take_from_store(seat, place) else {
            return Ok(false);
        };
        self.announce_purchase(seat, &key)?;
        self.players[seat].hand[slot] = Some(key);
        Ok(true)
    }

    fn buy_combine(&mut self, seat: usize, place: usize) -> Result<bool> {
        let Some(key) = self.store_offer(seat, place) else {
            return Ok(false);
        };
        if !self.can_combine(seat, &key) || !self.can_afford(seat) {
            return Ok(false);
        }
        let Some(key) = self.take_from_store(seat, place) else {
            return Ok(false);
        };
        self.announce_purchase(seat, &key)?;
        self.combine(seat, &key, vec![key.clone()])?;
        Ok(true)
    }

    fn hand_enter(&mut self, seat: usize, place: usize) -> Result<bool> {
        let player = &mut self.players[seat];
        if player.free_slot().is_none() {
            return Ok(false);
        }
        let Some(key) = player.hand.get_mut(place).and_then(Option::take) else {
            return Ok(false);
        };
        self.enter(seat, &key, vec![key.clone()])?;
        Ok(true)
    }

    fn hand_combine(&mut self, seat: usize, place: usize) -> Result<bool> {
        let Some(key) = self.players[seat].hand.get(place).cloned().flatten() else {
            return Ok(false);
        };
        if !self.can_combine(seat, &key) {
            return Ok(false);
        }
        self.players[seat].hand[place] = None;
        self.combine(seat, &key, vec![key.clone()])?;
        Ok(true)
    }

    fn hand_sell(&mut self, seat: usize, place: usize) -> bool {
        let refund = self.config.sell_refund;
        let player = &mut self.players[seat];
        let Some(key) = player.hand.get_mut(place).and_then(Option::take) else {
            return false;
        };
        player.mineral += refund;
        self.pool.drop([key]);
        true
    }

    fn paid_refresh(&mut self, seat: usize) -> Result<bool> {
        let cost = self.config.refresh_cost;
        let player = &mut self.players[seat];
        if player.mineral < cost {
            return Ok(false);
        }
        player.mineral -= cost;
        player.round.alter("refreshed", 1);
        self.refresh_store(seat)?;
        Ok(true)
    }

    fn present_upgrade(&mut self, seat: usize, place: usize, upgrade: &UpgradeKey) -> Result<bool> {
        let Some(card) = self.players[seat].card_at(place) else {
            return Ok(false);
        };
        let offered = self
            .cards
            .find(card)
            .map_or(false, |c| self.content.upgrades_for(&c.key).contains(upgrade));
        let cost = self.config.upgrade_gas_cost;
        if !offered || self.players[seat].gas < cost || !self.can_obtain_upgrade(card, upgrade) {
            return Ok(false);
        }
        self.players[seat].gas -= cost;
        self.obtain_upgrade(card, upgrade)
    }

    /// Scouts get one free store refresh per round
    fn use_ability(&mut self, seat: usize) -> Result<bool> {
        let role = &mut self.players[seat].role;
        if role.kind != RoleKind::Scout || !role.spend() {
            return Ok(false);
        }
        self.players[seat].round.alter("refreshed", 1);
        self.refresh_store(seat)?;
        Ok(true)
    }

    /// Commands the seat could issue right now that would not be ignored
    ///
    /// Toggles are left out; controllers never need them to make progress.
    pub fn legal_commands(&self, seat: usize) -> Vec<CommandKind> {
        let Some(player) = self.players.get(seat) else {
            return Vec::new();
        };
        if player.done {
            return Vec::new();
        }
        if player.is_frozen() {
            let mut legal: Vec<CommandKind> = self
                .legal_choices(seat)
                .into_iter()
                .map(|index| CommandKind::Choose { index })
                .collect();
            legal.push(CommandKind::Cancel);
            return legal;
        }

        let mut legal = Vec::new();
        let affordable = self.can_afford(seat);
        let grid_room = player.free_slot().is_some();
        let hand_room = player.free_hand_slot().is_some();

        for (place, offer) in player.store.iter().enumerate() {
            let Some(key) = offer else { continue };
            if !affordable {
                break;
            }
            if grid_room {
                legal.push(CommandKind::BuyEnter { place });
            }
            if hand_room {
                legal.push(CommandKind::BuyHand { place });
            }
            if self.can_combine(seat, key) {
                legal.push(CommandKind::BuyCombine { place });
            }
        }
        for (place, held) in player.hand.iter().enumerate() {
            let Some(key) = held else { continue };
            if grid_room {
                legal.push(CommandKind::HandEnter { place });
            }
            if self.can_combine(seat, key) {
                legal.push(CommandKind::HandCombine { place });
            }
            legal.push(CommandKind::HandSell { place });
        }
        let content = self.content();
        for (place, card) in player.present_cards() {
            legal.push(CommandKind::PresentSell { place });
            if player.gas < self.config.upgrade_gas_cost {
                continue;
            }
            let Some(c) = self.cards.find(card) else { continue };
            for upgrade in content.upgrades_for(&c.key) {
                if self.can_obtain_upgrade(card, upgrade) {
                    legal.push(CommandKind::PresentUpgrade {
                        place,
                        upgrade: upgrade.clone(),
                    });
                }
            }
        }

        if player.level < self.config.max_level && player.mineral >= player.upgrade_cost {
            legal.push(CommandKind::Upgrade);
        }
        if player.mineral >= self.config.refresh_cost {
            legal.push(CommandKind::Refresh);
        }
        if player.role.kind == RoleKind::Scout && player.role.ability == AbilityState::Ready {
            legal.push(CommandKind::Ability);
        }
        legal.push(CommandKind::Lock);
        legal.push(CommandKind::Done);
        legal
    }
}
