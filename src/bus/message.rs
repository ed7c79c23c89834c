//! Message kinds, routes and payloads carried by the bus

use crate::core::{CardId, GainWay, UnitKey, UpgradeKey};
use crate::game::commands::CommandKind;
use smallvec::SmallVec;
use std::fmt;

/// Every message name the simulation posts
///
/// Event kinds are posted by entity operations; command kinds are posted by
/// [`crate::game::Game::apply`] and carry a [`CommandKind`] payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MsgKind {
    RoundStart,
    RoundEnd,
    CardEntered,
    PostEnter,
    CardCombined,
    CardSold,
    PostSell,
    CardDestroyed,
    PostDestroy,
    CardSeized,
    ObtainUnitPrev,
    ObtainUnitPost,
    ObtainUpgrade,
    StoreRefreshed,
    StoreBought,
    PlayerUpgraded,
    QueryIssued,

    // Player-originated commands
    Upgrade,
    Refresh,
    Lock,
    BuyEnter,
    BuyHand,
    BuyCombine,
    HandEnter,
    HandCombine,
    HandSell,
    PresentSell,
    PresentUpgrade,
    PresentToggle,
    Ability,
    Choose,
    Cancel,
    Done,
}

impl MsgKind {
    pub const COMMANDS: [MsgKind; 16] = [
        MsgKind::Upgrade,
        MsgKind::Refresh,
        MsgKind::Lock,
        MsgKind::BuyEnter,
        MsgKind::BuyHand,
        MsgKind::BuyCombine,
        MsgKind::HandEnter,
        MsgKind::HandCombine,
        MsgKind::HandSell,
        MsgKind::PresentSell,
        MsgKind::PresentUpgrade,
        MsgKind::PresentToggle,
        MsgKind::Ability,
        MsgKind::Choose,
        MsgKind::Cancel,
        MsgKind::Done,
    ];

    pub fn is_command(self) -> bool {
        self.as_str().starts_with('$')
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MsgKind::RoundStart => "round-start",
            MsgKind::RoundEnd => "round-end",
            MsgKind::CardEntered => "card-entered",
            MsgKind::PostEnter => "post-enter",
            MsgKind::CardCombined => "card-combined",
            MsgKind::CardSold => "card-sold",
            MsgKind::PostSell => "post-sell",
            MsgKind::CardDestroyed => "card-destroyed",
            MsgKind::PostDestroy => "post-destroy",
            MsgKind::CardSeized => "card-seized",
            MsgKind::ObtainUnitPrev => "obtain-unit-prev",
            MsgKind::ObtainUnitPost => "obtain-unit-post",
            MsgKind::ObtainUpgrade => "obtain-upgrade",
            MsgKind::StoreRefreshed => "store-refreshed",
            MsgKind::StoreBought => "store-bought",
            MsgKind::PlayerUpgraded => "player-upgraded",
            MsgKind::QueryIssued => "query-issued",
            MsgKind::Upgrade => "$upgrade",
            MsgKind::Refresh => "$refresh",
            MsgKind::Lock => "$lock",
            MsgKind::BuyEnter => "$buy-enter",
            MsgKind::BuyHand => "$buy-hand",
            MsgKind::BuyCombine => "$buy-combine",
            MsgKind::HandEnter => "$hand-enter",
            MsgKind::HandCombine => "$hand-combine",
            MsgKind::HandSell => "$hand-sell",
            MsgKind::PresentSell => "$present-sell",
            MsgKind::PresentUpgrade => "$present-upgrade",
            MsgKind::PresentToggle => "$present-toggle",
            MsgKind::Ability => "$ability",
            MsgKind::Choose => "$choose",
            MsgKind::Cancel => "$cancel",
            MsgKind::Done => "$done",
        }
    }
}

impl fmt::Display for MsgKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which children of a node receive a message after the node's own handlers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Route {
    /// Every non-empty child, in list order
    #[default]
    Broadcast,
    /// One child by index; out of range or empty means nobody
    Index(usize),
    /// One specific card, wherever it currently sits (even detached)
    Handle(CardId),
}

impl Route {
    /// Resolve the route against a child list
    pub fn select<K: Copy>(
        &self,
        slots: &[Option<K>],
        by_handle: impl FnOnce(CardId) -> Option<K>,
    ) -> SmallVec<[K; 8]> {
        match *self {
            Route::Broadcast => slots.iter().flatten().copied().collect(),
            Route::Index(i) => slots.get(i).copied().flatten().into_iter().collect(),
            Route::Handle(card) => by_handle(card).into_iter().collect(),
        }
    }
}

/// Message body
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Payload {
    #[default]
    None,
    /// The card an event is about
    Card(CardId),
    /// Units on their way onto `card`; prev-phase handlers may rewrite `units`
    Units {
        card: CardId,
        units: Vec<UnitKey>,
        way: GainWay,
    },
    Upgrade {
        card: CardId,
        upgrade: UpgradeKey,
    },
    Seized {
        card: CardId,
        target: CardId,
    },
    Level(u8),
    Command(CommandKind),
}

/// A message travelling down the Game → Player → Card tree
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub kind: MsgKind,
    pub player: Route,
    pub card: Route,
    pub payload: Payload,
}

impl Message {
    /// A message flooding every player and every card
    pub fn new(kind: MsgKind) -> Self {
        Message {
            kind,
            player: Route::Broadcast,
            card: Route::Broadcast,
            payload: Payload::None,
        }
    }

    #[must_use]
    pub fn to_player(mut self, seat: usize) -> Self {
        self.player = Route::Index(seat);
        self
    }

    #[must_use]
    pub fn to_card(mut self, route: Route) -> Self {
        self.card = route;
        self
    }

    #[must_use]
    pub fn with(mut self, payload: Payload) -> Self {
        self.payload = payload;
        self
    }

    /// The card this message is about, if it names one
    pub fn subject(&self) -> Option<CardId> {
        match self.payload {
            Payload::Card(card)
            | Payload::Units { card, .. }
            | Payload::Upgrade { card, .. }
            | Payload::Seized { card, .. } => Some(card),
            Payload::None | Payload::Level(_) | Payload::Command(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_index_out_of_range_delivers_nothing() {
        let slots = [Some(1), None, Some(3)];
        assert!(Route::Index(1).select(&slots, |_| None).is_empty());
        assert!(Route::Index(9).select(&slots, |_| None).is_empty());
        assert_eq!(Route::Index(2).select(&slots, |_| None).as_slice(), &[3]);
    }

    #[test]
    fn test_route_broadcast_skips_empty_slots() {
        let slots = [None, Some('a'), None, Some('b')];
        assert_eq!(Route::Broadcast.select(&slots, |_| None).as_slice(), &['a', 'b']);
    }

    #[test]
    fn test_route_handle_ignores_slots() {
        let slots: [Option<u32>; 1] = [Some(1)];
        let picked = Route::Handle(CardId::new(7)).select(&slots, |id| Some(id.as_u32()));
        assert_eq!(picked.as_slice(), &[7]);
    }

    #[test]
    fn test_command_kinds_are_dollar_prefixed() {
        for kind in MsgKind::COMMANDS {
            assert!(kind.is_command(), "{kind}");
        }
        assert!(!MsgKind::RoundStart.is_command());
    }
}
