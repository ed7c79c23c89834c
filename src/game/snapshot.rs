//! Serializable view of a game's replicated state
//!
//! Two replicas that processed the same command stream must produce equal
//! snapshots. Presentation state (logger, handler tables) is left out, and
//! so is anything keyed by allocation order that the bus does not observe.

use crate::core::{
    AttributeStore, Belonging, CardKey, ColorTier, DescriptorId, RoleKind, UniqueKey, UnitKey,
    UpgradeKey,
};
use crate::core::{AbilityState, Card, Player};
use crate::game::query::PendingQuery;
use crate::game::Game;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub round: u32,
    pub commands: usize,
    pub players: Vec<PlayerSnapshot>,
    pub pool: BTreeMap<CardKey, u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub seat: usize,
    pub role: RoleKind,
    pub ability: AbilityState,
    pub mineral: i64,
    pub gas: i64,
    pub level: u8,
    pub upgrade_cost: i64,
    pub done: bool,
    pub store: Vec<Option<CardKey>>,
    pub store_locked: bool,
    pub hand: Vec<Option<CardKey>>,
    pub present: Vec<Option<CardSnapshot>>,
    pub round: AttributeStore,
    pub queries: Vec<PendingQuery>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardSnapshot {
    pub key: CardKey,
    pub name: String,
    pub level: u8,
    pub color: ColorTier,
    pub belonging: Belonging,
    pub units: Vec<UnitKey>,
    pub upgrades: Vec<UpgradeKey>,
    pub attributes: AttributeStore,
    pub occupied: Vec<CardKey>,
    pub descriptors: Vec<DescriptorSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DescriptorSnapshot {
    pub id: DescriptorId,
    pub gold: bool,
    pub unique: Option<UniqueKey>,
    pub disabled: bool,
    pub manually_disabled: bool,
}

impl StateSnapshot {
    pub fn capture(game: &Game) -> Self {
        StateSnapshot {
            round: game.round,
            commands: game.log().len(),
            players: game
                .players
                .iter()
                .map(|p| PlayerSnapshot::capture(game, p))
                .collect(),
            pool: game.pool.counts().clone(),
        }
    }
}

impl PlayerSnapshot {
    fn capture(game: &Game, player: &Player) -> Self {
        PlayerSnapshot {
            seat: player.seat,
            role: player.role.kind,
            ability: player.role.ability,
            mineral: player.mineral,
            gas: player.gas,
            level: player.level,
            upgrade_cost: player.upgrade_cost,
            done: player.done,
            store: player.store.clone(),
            store_locked: player.store_locked,
            hand: player.hand.clone(),
            present: player
                .present
                .iter()
                .map(|slot| slot.and_then(|id| game.cards.find(id)).map(CardSnapshot::capture))
                .collect(),
            round: player.round.clone(),
            queries: player.queries.iter().cloned().collect(),
        }
    }
}

impl CardSnapshot {
    fn capture(card: &Card) -> Self {
        CardSnapshot {
            key: card.key.clone(),
            name: card.name.clone(),
            level: card.level,
            color: card.color,
            belonging: card.belonging,
            units: card.units().to_vec(),
            upgrades: card.upgrades().to_vec(),
            attributes: card.attrs().clone(),
            occupied: card.occupied.clone(),
            descriptors: card
                .descriptors
                .iter()
                .map(|d| DescriptorSnapshot {
                    id: d.id,
                    gold: d.gold,
                    unique: d.unique.clone(),
                    disabled: d.disabled,
                    manually_disabled: d.manually_disabled,
                })
                .collect(),
        }
    }
}
