//! Player entity
//!
//! A seat's inventories (present grid, store, hand), resources and
//! per-player bookkeeping. Grid positions are load-bearing: every left/right
//! effect reads adjacency straight off `present`, so all insertions go
//! through [`Player::put`].

use crate::bus::Emitter;
use crate::core::{AttributeStore, CardId, CardKey, MergePolicy, RoleKind, RoleState};
use crate::effects::UniqueTable;
use crate::game::query::PendingQuery;
use crate::game::{Game, GameConfig};
use std::collections::VecDeque;

#[derive(Debug)]
pub struct Player {
    pub seat: usize,
    pub role: RoleState,

    /// Present grid, possibly sparse
    pub present: Vec<Option<CardId>>,
    pub store: Vec<Option<CardKey>>,
    pub store_locked: bool,
    pub hand: Vec<Option<CardKey>>,

    pub mineral: i64,
    pub gas: i64,
    pub level: u8,
    pub upgrade_cost: i64,
    /// Maximum units per card
    pub unit_limit: usize,

    pub unique: UniqueTable,
    /// "This round only" counters, zeroed at round end
    pub round: AttributeStore,
    pub queries: VecDeque<PendingQuery>,
    pub done: bool,

    pub bus: Emitter<Game>,
}

impl Player {
    pub fn new(seat: usize, role: RoleKind, config: &GameConfig) -> Self {
        let mut round = AttributeStore::new();
        round.configure("bought", 0, MergePolicy::Add);
        round.configure("refreshed", 0, MergePolicy::Add);

        Player {
            seat,
            role: RoleState::new(role),
            present: vec![None; config.present_slots],
            store: vec![None; config.store_size(1)],
            store_locked: false,
            hand: vec![None; config.hand_slots],
            mineral: 0,
            gas: 0,
            level: 1,
            upgrade_cost: config.level_up_cost(1),
            unit_limit: config.max_units,
            unique: UniqueTable::new(),
            round,
            queries: VecDeque::new(),
            done: false,
            bus: Emitter::new(),
        }
    }

    /// Lowest free grid slot
    pub fn free_slot(&self) -> Option<usize> {
        self.present.iter().position(Option::is_none)
    }

    pub fn free_hand_slot(&self) -> Option<usize> {
        self.hand.iter().position(Option::is_none)
    }

    pub fn is_frozen(&self) -> bool {
        !self.queries.is_empty()
    }

    /// (position, card) for every occupied grid slot, left to right
    pub fn present_cards(&self) -> impl Iterator<Item = (usize, CardId)> + '_ {
        self.present
            .iter()
            .enumerate()
            .filter_map(|(pos, slot)| slot.map(|id| (pos, id)))
    }

    pub fn card_at(&self, pos: usize) -> Option<CardId> {
        self.present.get(pos).copied().flatten()
    }

    pub fn position_of(&self, card: CardId) -> Option<usize> {
        self.present.iter().position(|slot| *slot == Some(card))
    }

    /// Cards in the slots directly left and right of `pos`
    pub fn neighbors(&self, pos: usize) -> (Option<CardId>, Option<CardId>) {
        let left = pos.checked_sub(1).and_then(|p| self.card_at(p));
        let right = self.card_at(pos + 1);
        (left, right)
    }

    /// Open slot `pos` for an incoming card
    ///
    /// If `pos` is taken, the minimal contiguous run starting at `pos` shifts
    /// one step toward the nearest free slot (the right side wins ties), so
    /// relative order is preserved. Returns the cards that moved with their
    /// new positions, or `None` if the grid is full or `pos` is out of range.
    pub fn put(&mut self, pos: usize) -> Option<Vec<(CardId, usize)>> {
        if pos >= self.present.len() {
            return None;
        }
        if self.present[pos].is_none() {
            return Some(Vec::new());
        }

        let right = (pos + 1..self.present.len()).find(|&i| self.present[i].is_none());
        let left = (0..pos).rev().find(|&i| self.present[i].is_none());

        let shift_right = match (left, right) {
            (None, None) => return None,
            (None, Some(_)) => true,
            (Some(_), None) => false,
            (Some(l), Some(r)) => r - pos <= pos - l,
        };

        let mut moved = Vec::new();
        if let (true, Some(r)) = (shift_right, right) {
            for i in (pos..r).rev() {
                let id = self.present[i].take();
                self.present[i + 1] = id;
                if let Some(id) = id {
                    moved.push((id, i + 1));
                }
            }
        } else if let Some(l) = left {
            for i in l + 1..=pos {
                let id = self.present[i].take();
                self.present[i - 1] = id;
                if let Some(id) = id {
                    moved.push((id, i - 1));
                }
            }
        }
        Some(moved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(n: &[Option<u32>]) -> Vec<Option<CardId>> {
        n.iter().map(|o| o.map(CardId::new)).collect()
    }

    fn player(grid: &[Option<u32>]) -> Player {
        let mut p = Player::new(0, RoleKind::Neutral, &GameConfig::default());
        p.present = ids(grid);
        p
    }

    #[test]
    fn test_put_on_free_slot_moves_nothing() {
        let mut p = player(&[Some(0), None, Some(1), None, None, None, None]);
        assert_eq!(p.put(1), Some(vec![]));
        assert_eq!(p.present, ids(&[Some(0), None, Some(1), None, None, None, None]));
    }

    #[test]
    fn test_put_shifts_toward_nearest_gap_right() {
        let mut p = player(&[Some(0), Some(1), Some(2), None, None, None, None]);
        let moved = p.put(1).unwrap();
        assert_eq!(p.present, ids(&[Some(0), None, Some(1), Some(2), None, None, None]));
        assert_eq!(moved, vec![(CardId::new(2), 3), (CardId::new(1), 2)]);
    }

    #[test]
    fn test_put_shifts_left_when_right_is_full() {
        let mut p = player(&[None, Some(0), Some(1), Some(2), Some(3), Some(4), Some(5)]);
        p.put(4).unwrap();
        assert_eq!(
            p.present,
            ids(&[Some(0), Some(1), Some(2), Some(3), None, Some(4), Some(5)])
        );
    }

    #[test]
    fn test_put_tie_prefers_right() {
        let mut p = player(&[None, Some(0), Some(1), Some(2), None, None, None]);
        // gap at 0 is two steps left of 2, gap at 4 is two steps right
        p.put(2).unwrap();
        assert_eq!(p.present, ids(&[None, Some(0), None, Some(1), Some(2), None, None]));
    }

    #[test]
    fn test_put_nearest_left_beats_far_right() {
        let mut p = player(&[Some(0), None, Some(1), Some(2), Some(3), Some(4), None]);
        p.put(2).unwrap();
        assert_eq!(p.present, ids(&[Some(0), Some(1), None, Some(2), Some(3), Some(4), None]));
    }

    #[test]
    fn test_put_full_grid_fails() {
        let mut p = player(&[Some(0), Some(1), Some(2), Some(3), Some(4), Some(5), Some(6)]);
        assert_eq!(p.put(3), None);
        assert_eq!(p.put(9), None);
    }

    #[test]
    fn test_neighbors_and_free_slot() {
        let p = player(&[Some(0), None, Some(1), Some(2), None, None, None]);
        assert_eq!(p.free_slot(), Some(1));
        assert_eq!(p.neighbors(2), (None, Some(CardId::new(2))));
        assert_eq!(p.neighbors(0), (None, None));
        assert_eq!(p.present_cards().count(), 3);
    }
}
