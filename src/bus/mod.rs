//! Hierarchical message bus
//!
//! Three levels of [`Emitter`] nodes (Game → Player → Card) form a tree. A
//! message posted at a node first runs that node's own handlers, one after
//! the other in registration order, and is then routed to the children
//! selected by its [`Route`]:
//!
//! - at the Game node the `player` route picks players,
//! - at a Player node the `card` route picks grid positions (or a handle),
//! - Card nodes are leaves.
//!
//! The tree itself lives in whatever context owns the emitters; the context
//! describes it through [`Topology`], which keeps the dispatch rules testable
//! without a full simulation.

pub mod emitter;
pub mod message;

pub use emitter::{Emitter, Handler, HandlerId, Subscription, Subscriptions};
pub use message::{Message, MsgKind, Payload, Route};

use crate::core::CardId;
use crate::Result;
use smallvec::SmallVec;

/// Address of one node in the bus tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeRef {
    Root,
    Player(usize),
    Card(CardId),
}

/// The shape of the bus tree, as seen from its owner
pub trait Topology: Sized {
    /// The emitter at `node`, or `None` if the node no longer exists
    fn emitter(&self, node: NodeRef) -> Option<&Emitter<Self>>;

    /// Children of `node` that should receive `msg`, resolved right now
    fn route(&self, node: NodeRef, msg: &Message) -> SmallVec<[NodeRef; 8]>;
}

/// Deliver `msg` at `node` and everything below it
///
/// Handlers run against a snapshot of the node's list; one that an earlier
/// handler unregistered during this same delivery is skipped. The first
/// handler error aborts the whole delivery.
pub fn emit<T: Topology>(ctx: &mut T, node: NodeRef, msg: &mut Message) -> Result<()> {
    let handlers = match ctx.emitter(node) {
        Some(emitter) => emitter.handlers(msg.kind),
        None => return Ok(()),
    };

    for (id, handler) in handlers {
        let live = ctx
            .emitter(node)
            .map_or(false, |e| e.is_registered(msg.kind, id));
        if !live {
            continue;
        }
        handler(ctx, msg)?;
    }

    for child in ctx.route(node, msg) {
        emit(ctx, child, msg)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BattlerError;
    use rustc_hash::FxHashMap;
    use std::sync::Arc;

    #[derive(Default)]
    struct Tree {
        root: Emitter<Tree>,
        players: Vec<Emitter<Tree>>,
        grids: Vec<Vec<Option<CardId>>>,
        cards: FxHashMap<CardId, Emitter<Tree>>,
        log: Vec<String>,
        victim: Option<HandlerId>,
    }

    impl Topology for Tree {
        fn emitter(&self, node: NodeRef) -> Option<&Emitter<Self>> {
            match node {
                NodeRef::Root => Some(&self.root),
                NodeRef::Player(p) => self.players.get(p),
                NodeRef::Card(c) => self.cards.get(&c),
            }
        }

        fn route(&self, node: NodeRef, msg: &Message) -> SmallVec<[NodeRef; 8]> {
            match node {
                NodeRef::Root => {
                    let seats: Vec<Option<usize>> = (0..self.players.len()).map(Some).collect();
                    msg.player
                        .select(&seats, |_| None)
                        .into_iter()
                        .map(NodeRef::Player)
                        .collect()
                }
                NodeRef::Player(p) => msg
                    .card
                    .select(&self.grids[p], |id| self.cards.contains_key(&id).then_some(id))
                    .into_iter()
                    .map(NodeRef::Card)
                    .collect(),
                NodeRef::Card(_) => SmallVec::new(),
            }
        }
    }

    fn logger(tag: &'static str) -> Handler<Tree> {
        Arc::new(move |t: &mut Tree, m: &mut Message| {
            t.log.push(format!("{tag}:{}", m.kind));
            Ok(())
        })
    }

    /// Two players; player 0 has cards #0 and #1 at slots 0 and 2.
    fn tree() -> Tree {
        let mut t = Tree::default();
        t.root.on(MsgKind::RoundStart, logger("game"));
        for p in 0..2 {
            let mut e = Emitter::new();
            e.on(MsgKind::RoundStart, if p == 0 { logger("p0") } else { logger("p1") });
            t.players.push(e);
        }
        for (i, tag) in [(0u32, "c0"), (1, "c1")] {
            let mut e = Emitter::new();
            e.on(MsgKind::RoundStart, logger(tag));
            t.cards.insert(CardId::new(i), e);
        }
        t.grids = vec![
            vec![Some(CardId::new(0)), None, Some(CardId::new(1))],
            vec![None, None, None],
        ];
        t
    }

    #[test]
    fn test_broadcast_floods_depth_first_in_order() {
        let mut t = tree();
        let mut msg = Message::new(MsgKind::RoundStart);
        emit(&mut t, NodeRef::Root, &mut msg).unwrap();
        assert_eq!(
            t.log,
            vec![
                "game:round-start",
                "p0:round-start",
                "c0:round-start",
                "c1:round-start",
                "p1:round-start"
            ]
        );
    }

    #[test]
    fn test_targeted_player_and_card() {
        let mut t = tree();
        let mut msg = Message::new(MsgKind::RoundStart)
            .to_player(0)
            .to_card(Route::Index(2));
        emit(&mut t, NodeRef::Root, &mut msg).unwrap();
        assert_eq!(t.log, vec!["game:round-start", "p0:round-start", "c1:round-start"]);
    }

    #[test]
    fn test_empty_or_missing_target_is_dropped() {
        let mut t = tree();
        let mut msg = Message::new(MsgKind::RoundStart)
            .to_player(0)
            .to_card(Route::Index(1));
        emit(&mut t, NodeRef::Root, &mut msg).unwrap();

        let mut gone = Message::new(MsgKind::RoundStart)
            .to_player(5)
            .to_card(Route::Handle(CardId::new(9)));
        emit(&mut t, NodeRef::Root, &mut gone).unwrap();

        assert_eq!(t.log, vec!["game:round-start", "p0:round-start", "game:round-start"]);
    }

    #[test]
    fn test_handle_reaches_card_outside_grid() {
        let mut t = tree();
        t.grids[0][0] = None;
        let mut msg = Message::new(MsgKind::RoundStart)
            .to_player(0)
            .to_card(Route::Handle(CardId::new(0)));
        emit(&mut t, NodeRef::Root, &mut msg).unwrap();
        assert_eq!(t.log.last().map(String::as_str), Some("c0:round-start"));
    }

    #[test]
    fn test_handler_removed_mid_emit_is_skipped() {
        let mut t = Tree::default();
        t.root.on(
            MsgKind::RoundEnd,
            Arc::new(|t: &mut Tree, _: &mut Message| {
                if let Some(id) = t.victim.take() {
                    t.root.off(MsgKind::RoundEnd, id);
                }
                t.log.push("first".into());
                Ok(())
            }),
        );
        let victim = t.root.on(MsgKind::RoundEnd, logger("victim"));
        t.victim = Some(victim);

        let mut msg = Message::new(MsgKind::RoundEnd);
        emit(&mut t, NodeRef::Root, &mut msg).unwrap();
        assert_eq!(t.log, vec!["first"]);
    }

    #[test]
    fn test_handler_error_stops_delivery() {
        let mut t = tree();
        t.players[0].on(
            MsgKind::RoundStart,
            Arc::new(|_: &mut Tree, _: &mut Message| {
                Err(BattlerError::PoolUnderflow {
                    requested: 3,
                    available: 1,
                })
            }),
        );
        let mut msg = Message::new(MsgKind::RoundStart);
        let err = emit(&mut t, NodeRef::Root, &mut msg).unwrap_err();

        assert!(matches!(err, BattlerError::PoolUnderflow { .. }));
        assert_eq!(t.log, vec!["game:round-start", "p0:round-start"]);
    }

    #[test]
    fn test_handlers_can_rewrite_payload_for_later_handlers() {
        let mut t = Tree::default();
        t.root.on(
            MsgKind::ObtainUnitPrev,
            Arc::new(|_: &mut Tree, m: &mut Message| {
                if let Payload::Units { units, .. } = &mut m.payload {
                    units.truncate(1);
                }
                Ok(())
            }),
        );
        let mut msg = Message::new(MsgKind::ObtainUnitPrev).with(Payload::Units {
            card: CardId::new(0),
            units: vec!["a".into(), "b".into()],
            way: crate::core::GainWay::Normal,
        });
        emit(&mut t, NodeRef::Root, &mut msg).unwrap();
        assert!(matches!(msg.payload, Payload::Units { ref units, .. } if units.len() == 1));
    }
}
