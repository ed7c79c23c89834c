//! Descriptors: revocable effect attachments
//!
//! A generator is a stateless recipe. Binding it to a card opens a
//! subscription batch on the card's bus, lets the generator subscribe through
//! a [`Binder`], and closes the batch. The captured [`Subscriptions`] travel
//! with the resulting [`Descriptor`] so unbinding removes every handler the
//! generator ever registered.

use crate::bus::{Emitter, Handler, HandlerId, Message, MsgKind, Subscriptions};
use crate::core::{CardId, DescriptorId, UniqueKey};
use crate::game::Game;
use crate::Result;
use std::sync::Arc;

/// What a generator declares about the descriptor it just wired up
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DescriptorSpec {
    pub unique: Option<UniqueKey>,
    pub unique_ignores_tier: bool,
}

impl DescriptorSpec {
    pub fn unique(key: UniqueKey, ignores_tier: bool) -> Self {
        DescriptorSpec {
            unique: Some(key),
            unique_ignores_tier: ignores_tier,
        }
    }
}

/// Effect recipe: invoked once per binding
pub type Generator = Arc<dyn Fn(&mut Binder<'_>) -> DescriptorSpec + Send + Sync>;

/// One live effect attached to a card
#[derive(Debug)]
pub struct Descriptor {
    pub id: DescriptorId,
    pub gold: bool,
    pub unique: Option<UniqueKey>,
    pub unique_ignores_tier: bool,
    /// Switched off by the owner; sorts last in its unique slot
    pub manually_disabled: bool,
    /// Lost unique-slot arbitration
    pub disabled: bool,
    subscriptions: Subscriptions,
}

impl Descriptor {
    pub fn new(id: DescriptorId, gold: bool, spec: DescriptorSpec, subscriptions: Subscriptions) -> Self {
        Descriptor {
            id,
            gold,
            unique: spec.unique,
            unique_ignores_tier: spec.unique_ignores_tier,
            manually_disabled: false,
            disabled: false,
            subscriptions,
        }
    }

    pub fn is_live(&self) -> bool {
        !self.disabled && !self.manually_disabled
    }

    pub fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }

    /// Hand the subscriptions back for disposal
    pub fn unbind(self) -> Subscriptions {
        self.subscriptions
    }
}

/// The generator's view of the card being bound
pub struct Binder<'a> {
    card: CardId,
    seat: usize,
    descriptor: DescriptorId,
    gold: bool,
    bus: &'a mut Emitter<Game>,
}

impl<'a> Binder<'a> {
    pub fn new(
        card: CardId,
        seat: usize,
        descriptor: DescriptorId,
        gold: bool,
        bus: &'a mut Emitter<Game>,
    ) -> Self {
        Binder {
            card,
            seat,
            descriptor,
            gold,
            bus,
        }
    }

    pub fn card(&self) -> CardId {
        self.card
    }

    pub fn seat(&self) -> usize {
        self.seat
    }

    pub fn descriptor(&self) -> DescriptorId {
        self.descriptor
    }

    pub fn gold(&self) -> bool {
        self.gold
    }

    /// Upgraded tier doubles effect magnitude
    pub fn scale<T: std::ops::Mul<Output = T> + From<u8>>(&self, amount: T) -> T {
        if self.gold {
            amount * T::from(2)
        } else {
            amount
        }
    }

    /// Subscribe unconditionally on the card's bus
    pub fn on(&mut self, kind: MsgKind, handler: Handler<Game>) -> HandlerId {
        self.bus.on(kind, handler)
    }

    /// Subscribe a handler that only acts while this descriptor is live
    pub fn on_live<F>(&mut self, kind: MsgKind, f: F) -> HandlerId
    where
        F: Fn(&mut Game, &mut Message) -> Result<()> + Send + Sync + 'static,
    {
        let (card, id) = (self.card, self.descriptor);
        self.bus.on(
            kind,
            Arc::new(move |game: &mut Game, msg: &mut Message| {
                if game.descriptor_live(card, id) {
                    f(game, msg)
                } else {
                    Ok(())
                }
            }),
        )
    }
}
