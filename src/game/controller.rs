//! Player controller interface
//!
//! Controllers stand in for the external UI: they look at a read-only view
//! of the game and pick one of the commands that would currently be
//! accepted. The self-play driver turns their picks into log entries, so a
//! controller never mutates the game directly.

use crate::core::{CardKey, RoleKind};
use crate::game::commands::CommandKind;
use crate::game::query::PendingQuery;
use crate::game::Game;

/// Read-only view of the game from one seat
pub struct GameView<'a> {
    game: &'a Game,
    seat: usize,
}

impl<'a> GameView<'a> {
    pub fn new(game: &'a Game, seat: usize) -> Self {
        GameView { game, seat }
    }

    pub fn seat(&self) -> usize {
        self.seat
    }

    pub fn round(&self) -> u32 {
        self.game.round
    }

    pub fn role(&self) -> RoleKind {
        self.game.players[self.seat].role.kind
    }

    pub fn mineral(&self) -> i64 {
        self.game.players[self.seat].mineral
    }

    pub fn gas(&self) -> i64 {
        self.game.players[self.seat].gas
    }

    pub fn level(&self) -> u8 {
        self.game.players[self.seat].level
    }

    pub fn store(&self) -> &[Option<CardKey>] {
        &self.game.players[self.seat].store
    }

    pub fn hand(&self) -> &[Option<CardKey>] {
        &self.game.players[self.seat].hand
    }

    /// Names on the present grid, `None` for empty slots
    pub fn present_names(&self) -> Vec<Option<&str>> {
        self.game.players[self.seat]
            .present
            .iter()
            .map(|slot| {
                slot.and_then(|id| self.game.cards.find(id))
                    .map(|c| c.name.as_str())
            })
            .collect()
    }

    pub fn pending_query(&self) -> Option<&PendingQuery> {
        self.game.pending_query(self.seat)
    }

    pub fn power(&self) -> i64 {
        self.game.aggregate_power(self.seat)
    }
}

/// Decision-maker for one seat
pub trait PlayerController {
    fn seat(&self) -> usize;

    /// Short name for logs
    fn name(&self) -> &str;

    /// Pick the next command; `None` ends the seat's round
    fn choose_action(&mut self, view: &GameView, legal: &[CommandKind]) -> Option<CommandKind>;

    /// Answer the oldest pending query; `None` cancels it
    fn choose_option(&mut self, view: &GameView, query: &PendingQuery, legal: &[usize]) -> Option<usize>;
}
