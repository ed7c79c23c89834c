//! Round state machine
//!
//! A round starts by resetting every seat's per-round state (income, gas,
//! upgrade discount, role ability, store) and posting `round-start`. It ends
//! once every seat has sent `$done`: `round-end` is posted, per-round
//! counters are cleared and the next round starts immediately.

use crate::bus::{Message, MsgKind};
use crate::game::Game;
use crate::Result;

impl Game {
    /// Begin round 1; a no-op once the game is running
    pub fn start(&mut self) -> Result<()> {
        if self.round != 0 {
            return Ok(());
        }
        self.round = 1;
        self.begin_round()
    }

    fn begin_round(&mut self) -> Result<()> {
        let income = self.config.mineral_for_round(self.round);
        let gas = self.config.gas_per_round;
        let discount = self.config.level_up_discount;

        for seat in 0..self.players.len() {
            let first_round = self.round == 1;
            let player = &mut self.players[seat];
            player.done = false;
            player.mineral = income;
            player.gas += gas;
            if !first_round {
                player.upgrade_cost = (player.upgrade_cost - discount).max(0);
            }
            player.role.recharge();
            if player.store_locked {
                player.store_locked = false;
            } else {
                self.refresh_store(seat)?;
            }
        }
        self.done_count = 0;

        self.logger.minimal(&format!("=== Round {} ===", self.round));
        self.post(Message::new(MsgKind::RoundStart))?;
        Ok(())
    }

    /// Record that `seat` finished the round; the last one ends it
    pub fn mark_done(&mut self, seat: usize) -> Result<bool> {
        let Some(player) = self.players.get_mut(seat) else {
            return Ok(false);
        };
        if player.done {
            return Ok(false);
        }
        player.done = true;
        self.done_count += 1;
        if self.done_count == self.players.len() {
            self.end_round()?;
        }
        Ok(true)
    }

    fn end_round(&mut self) -> Result<()> {
        self.post(Message::new(MsgKind::RoundEnd))?;
        for player in &mut self.players {
            player.round.reset();
        }
        self.round += 1;
        self.begin_round()
    }
}
