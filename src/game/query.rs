//! Pending player decisions
//!
//! Effects that need the owner to pick something (where to insert a card,
//! which discovered card to keep, which card receives reinforcements) push a
//! [`PendingQuery`] instead of blocking. While a player has one pending they
//! only accept `$choose` and `$cancel`; other players keep acting. Queries
//! resolve first-in first-out.

use crate::bus::{Message, MsgKind};
use crate::core::{CardId, CardKey, Faction, GainWay, UnitKey};
use crate::game::{log_if_verbose, Game};
use crate::loader::Content;
use crate::Result;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "query", rename_all = "kebab-case")]
pub enum QueryKind {
    /// Pick the grid position for an insert card
    InsertSlot { card: CardKey, occupied: Vec<CardKey> },
    /// Keep one of the offered cards; the rest return to the pool
    Discover { options: Vec<CardKey> },
    /// Pick the present card that receives `units`
    DeployTarget { source: CardId, units: Vec<UnitKey> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingQuery {
    pub id: u32,
    pub kind: QueryKind,
}

/// A player's answer to their oldest pending query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Choose(usize),
    Cancel,
}

fn tier_filter(content: &dyn Content, tier: u8, key: &CardKey) -> bool {
    content.card(key).map_or(false, |c| c.level == tier)
}

impl Game {
    pub fn issue_query(&mut self, seat: usize, kind: QueryKind) -> Result<()> {
        let id = self.next_query_id();
        let Some(player) = self.players.get_mut(seat) else {
            return Ok(());
        };
        log_if_verbose!(self, "P{} query {} {:?}", seat, id, kind);
        player.queries.push_back(PendingQuery { id, kind });
        self.post(Message::new(MsgKind::QueryIssued).to_player(seat))?;
        Ok(())
    }

    /// Draw `discover_count` distinct cards of `tier` and ask the owner to keep one
    ///
    /// A faction filter that cannot fill the offer falls back to every
    /// faction. If even that is short the pool cannot honor the draw and the
    /// error propagates.
    pub fn offer_discover(&mut self, seat: usize, tier: u8, faction: Option<Faction>) -> Result<()> {
        let content = self.content();
        let count = self.config.discover_count;
        let in_tier = |k: &CardKey| tier_filter(content.as_ref(), tier, k);

        let options = match faction {
            Some(f)
                if self
                    .pool
                    .eligible(|k| in_tier(k) && content.in_faction(k, &f))
                    >= count =>
            {
                self.pool.discover(
                    &mut self.rng,
                    |k| in_tier(k) && content.in_faction(k, &f),
                    count,
                    true,
                )?
            }
            _ => self.pool.discover(&mut self.rng, in_tier, count, true)?,
        };
        self.issue_query(seat, QueryKind::Discover { options })
    }

    /// Apply an answer to the seat's oldest query
    ///
    /// An out-of-range choice leaves the query pending and returns `false`.
    pub fn resolve_query(&mut self, seat: usize, resolution: Resolution) -> Result<bool> {
        let Some(player) = self.players.get(seat) else {
            return Ok(false);
        };
        let Some(head) = player.queries.front() else {
            return Ok(false);
        };
        if let Resolution::Choose(index) = resolution {
            let valid = match &head.kind {
                QueryKind::InsertSlot { .. } => index < player.present.len(),
                QueryKind::Discover { options } => index < options.len(),
                QueryKind::DeployTarget { .. } => player.card_at(index).is_some(),
            };
            if !valid {
                log_if_verbose!(self, "P{} choice {} out of range", seat, index);
                return Ok(false);
            }
        }
        let Some(query) = self.players[seat].queries.pop_front() else {
            return Ok(false);
        };

        match (query.kind, resolution) {
            (QueryKind::InsertSlot { card, occupied }, Resolution::Choose(pos)) => {
                self.enter_at(seat, &card, occupied, Some(pos))?;
            }
            (QueryKind::InsertSlot { card, occupied }, Resolution::Cancel) => {
                self.enter_at(seat, &card, occupied, None)?;
            }
            (QueryKind::Discover { mut options }, Resolution::Choose(index)) => {
                let picked = options.remove(index);
                self.pool.drop(options);
                self.deliver_to_hand(seat, picked);
            }
            (QueryKind::Discover { options }, Resolution::Cancel) => {
                self.pool.drop(options);
            }
            (QueryKind::DeployTarget { units, .. }, Resolution::Choose(pos)) => {
                if let Some(target) = self.players[seat].card_at(pos) {
                    self.obtain_units(target, units, GainWay::Deploy)?;
                }
            }
            (QueryKind::DeployTarget { units, .. }, Resolution::Cancel) => {
                let leftmost = self.players[seat].present_cards().next().map(|(_, id)| id);
                if let Some(target) = leftmost {
                    self.obtain_units(target, units, GainWay::Deploy)?;
                }
            }
        }
        Ok(true)
    }

    /// Put a card into the first free hand slot, or back into the pool
    pub fn deliver_to_hand(&mut self, seat: usize, key: CardKey) {
        let slot = self.players.get(seat).and_then(|p| p.free_hand_slot());
        match slot {
            Some(slot) => {
                self.logger.normal(&format!("P{} keeps {}", seat, key));
                self.players[seat].hand[slot] = Some(key);
            }
            None => self.pool.drop([key]),
        }
    }

    /// Cancel every pending query for `seat`, oldest first
    pub fn cancel_all(&mut self, seat: usize) -> Result<usize> {
        let mut cancelled = 0;
        while self.players.get(seat).map_or(false, |p| p.is_frozen()) {
            if !self.resolve_query(seat, Resolution::Cancel)? {
                break;
            }
            cancelled += 1;
        }
        Ok(cancelled)
    }

    pub fn pending_query(&self, seat: usize) -> Option<&PendingQuery> {
        self.players.get(seat).and_then(|p| p.queries.front())
    }

    /// Every `$choose` index the seat's oldest query would accept
    pub fn legal_choices(&self, seat: usize) -> Vec<usize> {
        let Some(player) = self.players.get(seat) else {
            return Vec::new();
        };
        match player.queries.front().map(|q| &q.kind) {
            Some(QueryKind::InsertSlot { .. }) => (0..player.present.len()).collect(),
            Some(QueryKind::Discover { options }) => (0..options.len()).collect(),
            Some(QueryKind::DeployTarget { .. }) => player.present_cards().map(|(pos, _)| pos).collect(),
            None => Vec::new(),
        }
    }
}
