//! Deterministic baseline controller
//!
//! Buys and places whatever sits in the leftmost affordable slot, always
//! takes the first option of a query, and ends the round once nothing is
//! left to buy or place. Useful for reproducible smoke tests.

use crate::game::commands::CommandKind;
use crate::game::controller::{GameView, PlayerController};
use crate::game::query::PendingQuery;

pub struct ZeroController {
    seat: usize,
}

impl ZeroController {
    pub fn new(seat: usize) -> Self {
        ZeroController { seat }
    }
}

impl PlayerController for ZeroController {
    fn seat(&self) -> usize {
        self.seat
    }

    fn name(&self) -> &str {
        "zero"
    }

    fn choose_action(&mut self, _view: &GameView, legal: &[CommandKind]) -> Option<CommandKind> {
        legal
            .iter()
            .find(|c| {
                matches!(
                    c,
                    CommandKind::BuyCombine { .. }
                        | CommandKind::HandCombine { .. }
                        | CommandKind::BuyEnter { .. }
                        | CommandKind::HandEnter { .. }
                )
            })
            .cloned()
    }

    fn choose_option(&mut self, _view: &GameView, _query: &PendingQuery, legal: &[usize]) -> Option<usize> {
        legal.first().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::RoleKind;
    use crate::effects::EffectCatalog;
    use crate::game::{Game, GameConfig};
    use crate::loader::ContentPack;
    use std::sync::Arc;

    #[test]
    fn test_zero_controller_takes_first_placement() {
        let mut controller = ZeroController::new(0);
        let legal = vec![
            CommandKind::Refresh,
            CommandKind::BuyEnter { place: 1 },
            CommandKind::BuyCombine { place: 2 },
            CommandKind::Done,
        ];
        let game = Game::new(
            GameConfig::default(),
            Arc::new(ContentPack::demo().unwrap()),
            Arc::new(EffectCatalog::new()),
            "zero",
            &[RoleKind::Neutral],
        );
        let view = GameView::new(&game, 0);
        assert_eq!(
            controller.choose_action(&view, &legal),
            Some(CommandKind::BuyEnter { place: 1 })
        );
        assert_eq!(controller.choose_action(&view, &[CommandKind::Done]), None);
    }
}
