//! One publish/subscribe node of the message bus

use crate::bus::message::{Message, MsgKind};
use crate::Result;
use rustc_hash::FxHashMap;
use std::fmt;
use std::sync::Arc;

/// A subscribed callback. Handlers get the whole simulation context mutably.
pub type Handler<C> = Arc<dyn Fn(&mut C, &mut Message) -> Result<()> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subscription {
    pub kind: MsgKind,
    pub id: HandlerId,
}

/// The subscriptions captured by one `begin`/`end` batch
///
/// Handing this back to [`Emitter::dispose`] removes exactly those handlers
/// and nothing else.
#[derive(Debug, Default, PartialEq, Eq)]
#[must_use]
pub struct Subscriptions(Vec<Subscription>);

impl Subscriptions {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn kinds(&self) -> impl Iterator<Item = MsgKind> + '_ {
        self.0.iter().map(|s| s.kind)
    }
}

pub struct Emitter<C> {
    handlers: FxHashMap<MsgKind, Vec<(HandlerId, Handler<C>)>>,
    next_id: u64,
    batches: Vec<Vec<Subscription>>,
}

impl<C> Emitter<C> {
    pub fn new() -> Self {
        Emitter {
            handlers: FxHashMap::default(),
            next_id: 0,
            batches: Vec::new(),
        }
    }

    /// Register `handler` after every existing handler for `kind`
    ///
    /// Registering the same closure twice makes it run twice.
    pub fn on(&mut self, kind: MsgKind, handler: Handler<C>) -> HandlerId {
        let id = HandlerId(self.next_id);
        self.next_id += 1;
        self.handlers.entry(kind).or_default().push((id, handler));
        if let Some(batch) = self.batches.last_mut() {
            batch.push(Subscription { kind, id });
        }
        id
    }

    pub fn off(&mut self, kind: MsgKind, id: HandlerId) -> bool {
        let Some(list) = self.handlers.get_mut(&kind) else {
            return false;
        };
        let before = list.len();
        list.retain(|(h, _)| *h != id);
        let removed = list.len() != before;
        if list.is_empty() {
            self.handlers.remove(&kind);
        }
        removed
    }

    /// Start capturing subsequent `on` calls
    pub fn begin(&mut self) {
        self.batches.push(Vec::new());
    }

    /// Stop capturing and hand back everything registered since `begin`
    pub fn end(&mut self) -> Subscriptions {
        Subscriptions(self.batches.pop().unwrap_or_default())
    }

    /// Remove exactly the given subscriptions; returns how many were live
    pub fn dispose(&mut self, subs: Subscriptions) -> usize {
        subs.0
            .into_iter()
            .filter(|s| self.off(s.kind, s.id))
            .count()
    }

    /// Snapshot of the handlers for `kind`, in registration order
    pub fn handlers(&self, kind: MsgKind) -> Vec<(HandlerId, Handler<C>)> {
        self.handlers.get(&kind).cloned().unwrap_or_default()
    }

    pub fn is_registered(&self, kind: MsgKind, id: HandlerId) -> bool {
        self.handlers
            .get(&kind)
            .map_or(false, |list| list.iter().any(|(h, _)| *h == id))
    }

    pub fn listens(&self, kind: MsgKind) -> bool {
        self.handlers.contains_key(&kind)
    }

    /// Total number of live handlers across all kinds
    pub fn len(&self) -> usize {
        self.handlers.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl<C> Default for Emitter<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> fmt::Debug for Emitter<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Emitter")
            .field("handlers", &self.len())
            .field("open_batches", &self.batches.len())
            .finish()
    }
}
