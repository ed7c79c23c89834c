//! Random controller for fuzzing and baseline self-play
//!
//! Picks uniformly among the legal commands, with `$done` weighted down so
//! rounds actually get played. Seeded, so a (seed, controller seeds) pair
//! always produces the same command log.

use crate::game::commands::CommandKind;
use crate::game::controller::{GameView, PlayerController};
use crate::game::query::PendingQuery;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha12Rng;

pub struct RandomController {
    seat: usize,
    rng: ChaCha12Rng,
    /// Chance of ending the round when other commands are available
    done_chance: f64,
}

impl RandomController {
    pub fn with_seed(seat: usize, seed: u64) -> Self {
        RandomController {
            seat,
            rng: ChaCha12Rng::seed_from_u64(seed),
            done_chance: 0.15,
        }
    }

    pub fn with_done_chance(mut self, chance: f64) -> Self {
        self.done_chance = chance.clamp(0.0, 1.0);
        self
    }
}

impl PlayerController for RandomController {
    fn seat(&self) -> usize {
        self.seat
    }

    fn name(&self) -> &str {
        "random"
    }

    fn choose_action(&mut self, _view: &GameView, legal: &[CommandKind]) -> Option<CommandKind> {
        let candidates: Vec<&CommandKind> = legal
            .iter()
            .filter(|c| !matches!(c, CommandKind::Done | CommandKind::Lock))
            .collect();
        if candidates.is_empty() || self.rng.gen_bool(self.done_chance) {
            return None;
        }
        let index = self.rng.gen_range(0..candidates.len());
        Some(candidates[index].clone())
    }

    fn choose_option(&mut self, _view: &GameView, _query: &PendingQuery, legal: &[usize]) -> Option<usize> {
        if legal.is_empty() {
            None
        } else {
            Some(legal[self.rng.gen_range(0..legal.len())])
        }
    }
}
