//! Self-play driver
//!
//! Seats take turns in seat order within each round: a seat keeps issuing
//! commands until it sends `$done` or hits the per-round action cap, then
//! the next seat goes. Pending queries are answered through the seat's
//! controller before any other command. Every pick goes through
//! [`Game::apply`], so the resulting log replays into the same state.

use crate::game::commands::{Command, CommandKind};
use crate::game::controller::{GameView, PlayerController};
use crate::game::Game;
use crate::Result;

pub struct SelfPlay {
    controllers: Vec<Box<dyn PlayerController>>,
    max_actions_per_round: usize,
}

impl SelfPlay {
    pub fn new(controllers: Vec<Box<dyn PlayerController>>) -> Self {
        SelfPlay {
            controllers,
            max_actions_per_round: 40,
        }
    }

    pub fn with_action_cap(mut self, cap: usize) -> Self {
        self.max_actions_per_round = cap;
        self
    }

    /// Play `rounds` full rounds (starting the game first if needed)
    pub fn run(&mut self, game: &mut Game, rounds: u32) -> Result<()> {
        game.start()?;
        let last = game.round + rounds;
        while game.round < last {
            let round = game.round;
            for controller in self.controllers.iter_mut() {
                play_seat(game, controller.as_mut(), round, self.max_actions_per_round)?;
                if game.round != round {
                    break;
                }
            }
        }
        Ok(())
    }
}

/// Drive one seat until it finishes `round`
fn play_seat(
    game: &mut Game,
    controller: &mut dyn PlayerController,
    round: u32,
    cap: usize,
) -> Result<()> {
    let seat = controller.seat();
    let mut actions = 0;
    while game.round == round && game.players.get(seat).map_or(false, |p| !p.done) {
        let frozen = game.players[seat].is_frozen();
        let kind = {
            let view = GameView::new(game, seat);
            match (frozen, actions >= cap) {
                (true, true) => CommandKind::Cancel,
                (false, true) => CommandKind::Done,
                (true, false) => {
                    let legal = game.legal_choices(seat);
                    let pick = game
                        .pending_query(seat)
                        .and_then(|q| controller.choose_option(&view, q, &legal));
                    match pick {
                        Some(index) => CommandKind::Choose { index },
                        None => CommandKind::Cancel,
                    }
                }
                (false, false) => {
                    let legal = game.legal_commands(seat);
                    controller
                        .choose_action(&view, &legal)
                        .unwrap_or(CommandKind::Done)
                }
            }
        };

        game.logger
            .choice(&format!("P{} -> {}", seat, kind.name()));
        game.apply(Command::new(seat, kind))?;
        actions += 1;
    }
    Ok(())
}
