//! Shared card pool
//!
//! A replenishing multiset of not-currently-owned cards. Every key's remaining
//! count is bounded by the copy limit of its tier. Draws shuffle with the
//! simulation's single generator, so outcomes are reproducible from the seed
//! and the order of calls.

use crate::core::CardKey;
use crate::game::GameConfig;
use crate::loader::Content;
use crate::{BattlerError, Result};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::iter;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardPool {
    remaining: BTreeMap<CardKey, u32>,
    maximum: BTreeMap<CardKey, u32>,
}

impl CardPool {
    /// Fill the pool from content
    ///
    /// Rare keys get a single copy, and only with probability `rare_chance`.
    /// Eggs and unpooled cards never enter the pool.
    pub fn new<R: Rng + ?Sized>(content: &dyn Content, config: &GameConfig, rng: &mut R) -> Self {
        let mut pool = CardPool::default();
        for card in content.cards() {
            if !card.pooled || card.is_egg() {
                continue;
            }
            let copies = if card.rare {
                u32::from(rng.gen_bool(config.rare_chance.clamp(0.0, 1.0)))
            } else {
                config.tier_max(card.level)
            };
            if copies > 0 {
                pool.maximum.insert(card.key.clone(), copies);
                pool.remaining.insert(card.key.clone(), copies);
            }
        }
        pool
    }

    /// A full pool with explicit per-key limits
    pub fn from_counts(counts: impl IntoIterator<Item = (CardKey, u32)>) -> Self {
        let maximum: BTreeMap<CardKey, u32> = counts.into_iter().collect();
        CardPool {
            remaining: maximum.clone(),
            maximum,
        }
    }

    pub fn remaining(&self, key: &CardKey) -> u32 {
        self.remaining.get(key).copied().unwrap_or(0)
    }

    pub fn maximum(&self, key: &CardKey) -> u32 {
        self.maximum.get(key).copied().unwrap_or(0)
    }

    pub fn counts(&self) -> &BTreeMap<CardKey, u32> {
        &self.remaining
    }

    pub fn total(&self) -> u64 {
        self.remaining.values().map(|&n| u64::from(n)).sum()
    }

    /// Copies currently in the pool that satisfy `pred`
    pub fn eligible(&self, pred: impl Fn(&CardKey) -> bool) -> usize {
        self.remaining
            .iter()
            .filter(|(key, _)| pred(key))
            .map(|(_, &n)| n as usize)
            .sum()
    }

    /// Take exactly `count` cards matching `pred` out of the pool
    ///
    /// With `unique`, at most one copy per key goes into the primary candidate
    /// list and surplus copies wait in a secondary list that only tops up a
    /// short primary. Without it every copy is a candidate, which weights
    /// keys by their remaining count. Fails without touching the pool if
    /// fewer than `count` copies are eligible.
    pub fn discover<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        pred: impl Fn(&CardKey) -> bool,
        count: usize,
        unique: bool,
    ) -> Result<Vec<CardKey>> {
        let mut primary = Vec::new();
        let mut secondary = Vec::new();
        for (key, &n) in &self.remaining {
            if n == 0 || !pred(key) {
                continue;
            }
            if unique {
                primary.push(key.clone());
                secondary.extend(iter::repeat(key).take(n as usize - 1).cloned());
            } else {
                primary.extend(iter::repeat(key).take(n as usize).cloned());
            }
        }

        let available = primary.len() + secondary.len();
        if available < count {
            return Err(BattlerError::PoolUnderflow {
                requested: count,
                available,
            });
        }

        primary.shuffle(rng);
        secondary.shuffle(rng);
        if primary.len() < count {
            let short = count - primary.len();
            primary.extend(secondary.drain(..short));
        }
        primary.truncate(count);

        for key in &primary {
            if let Some(n) = self.remaining.get_mut(key) {
                *n -= 1;
            }
        }
        Ok(primary)
    }

    /// Shop refill draw, weighted by remaining copies
    pub fn draw_weighted<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        pred: impl Fn(&CardKey) -> bool,
        count: usize,
    ) -> Result<Vec<CardKey>> {
        self.discover(rng, pred, count, false)
    }

    /// Return cards to the pool, one copy each, clamped at their tier limit
    ///
    /// Keys the pool never held (eggs, unpooled or excluded rares) vanish.
    pub fn drop(&mut self, keys: impl IntoIterator<Item = CardKey>) {
        for key in keys {
            let max = self.maximum(&key);
            if let Some(n) = self.remaining.get_mut(&key) {
                *n = (*n + 1).min(max);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::ContentPack;
    use rand::SeedableRng;
    use rand_chacha::ChaCha12Rng;

    fn key(s: &str) -> CardKey {
        CardKey::new(s)
    }

    fn small_pool() -> CardPool {
        CardPool::from_counts([(key("a"), 3), (key("b"), 2), (key("c"), 1)])
    }

    #[test]
    fn test_unique_discover_prefers_distinct_keys() {
        let mut pool = small_pool();
        let mut rng = ChaCha12Rng::seed_from_u64(7);
        let mut drawn = pool.discover(&mut rng, |_| true, 3, true).unwrap();
        drawn.sort();
        assert_eq!(drawn, vec![key("a"), key("b"), key("c")]);
        assert_eq!(pool.total(), 3);
    }

    #[test]
    fn test_unique_discover_tops_up_from_surplus() {
        let mut pool = small_pool();
        let mut rng = ChaCha12Rng::seed_from_u64(7);
        let drawn = pool
            .discover(&mut rng, |k| k.as_str() != "c", 4, true)
            .unwrap();
        assert_eq!(drawn.len(), 4);
        assert_eq!(pool.remaining(&key("a")) + pool.remaining(&key("b")), 1);
        assert_eq!(pool.remaining(&key("c")), 1);
    }

    #[test]
    fn test_underflow_is_an_error_and_leaves_pool_alone() {
        let mut pool = small_pool();
        let mut rng = ChaCha12Rng::seed_from_u64(1);
        let err = pool
            .discover(&mut rng, |k| k.as_str() == "b", 3, true)
            .unwrap_err();
        assert!(matches!(
            err,
            BattlerError::PoolUnderflow {
                requested: 3,
                available: 2
            }
        ));
        assert_eq!(pool, small_pool());
    }

    #[test]
    fn test_drop_clamps_at_maximum() {
        let mut pool = small_pool();
        pool.drop([key("a"), key("a"), key("zzz")]);
        assert_eq!(pool.remaining(&key("a")), 3);
        assert_eq!(pool.remaining(&key("zzz")), 0);
    }

    #[test]
    fn test_same_seed_same_draws() {
        let mut a = small_pool();
        let mut b = small_pool();
        let mut ra = ChaCha12Rng::seed_from_u64(99);
        let mut rb = ChaCha12Rng::seed_from_u64(99);
        for _ in 0..3 {
            let x = a.draw_weighted(&mut ra, |_| true, 2).unwrap();
            let y = b.draw_weighted(&mut rb, |_| true, 2).unwrap();
            assert_eq!(x, y);
            a.drop(x);
            b.drop(y);
        }
    }

    #[test]
    fn test_conservation_over_draw_and_drop_cycles() {
        let mut pool = small_pool();
        let full = pool.total();
        let mut rng = ChaCha12Rng::seed_from_u64(3);
        let mut held: Vec<CardKey> = Vec::new();

        for round in 0..20 {
            let drawn = pool.discover(&mut rng, |_| true, 1 + round % 2, round % 3 == 0);
            if let Ok(cards) = drawn {
                held.extend(cards);
            }
            if round % 2 == 1 {
                let back: Vec<CardKey> = held.drain(..held.len() / 2).collect();
                pool.drop(back);
            }
            assert_eq!(pool.total() + held.len() as u64, full);
        }
    }

    #[test]
    fn test_new_from_demo_pack() {
        let pack = ContentPack::demo().unwrap();
        let config = GameConfig::default();
        let mut rng = ChaCha12Rng::seed_from_u64(0);
        let pool = CardPool::new(&pack, &config, &mut rng);

        assert_eq!(pool.remaining(&key("marine-squad")), 18);
        assert_eq!(pool.remaining(&key("commander-post")), 11);
        assert!(pool.remaining(&key("mothership")) <= 1);
        assert_eq!(pool.remaining(&key("larva-egg")), 0);
        assert_eq!(pool.remaining(&key("marine-bunker")), 0);
    }
}
