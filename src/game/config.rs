//! Numeric rule constants
//!
//! Everything tunable about a match lives here. A config file only needs to
//! name the fields it changes; the rest fall back to [`GameConfig::default`].

use crate::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub present_slots: usize,
    pub hand_slots: usize,
    /// Store size at each player level, starting at level 1
    pub store_sizes: Vec<usize>,
    pub max_level: u8,
    /// Base cost to leave each level, starting at level 1
    pub level_up_costs: Vec<i64>,
    /// Level-up cost reduction applied at every round start after the first
    pub level_up_discount: i64,

    /// Mineral income is `round + mineral_base`, capped at `mineral_cap`
    pub mineral_base: i64,
    pub mineral_cap: i64,
    pub gas_per_round: i64,

    pub card_cost: i64,
    pub sell_refund: i64,
    pub refresh_cost: i64,
    pub upgrade_gas_cost: i64,

    pub max_units: usize,
    pub max_upgrades: usize,

    /// Pool copies per card key, indexed by tier 1-6
    pub tier_max: Vec<u32>,
    /// Probability that a rare card enters the pool at all
    pub rare_chance: f64,
    pub discover_count: usize,

    /// Cards at or above this level spread heavy darkness when removed
    pub darkness_level: u8,
    pub darkness_low: i64,
    pub darkness_high: i64,
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig {
            present_slots: 7,
            hand_slots: 6,
            store_sizes: vec![3, 4, 4, 5, 5, 6],
            max_level: 6,
            level_up_costs: vec![5, 7, 8, 9, 11],
            level_up_discount: 1,
            mineral_base: 2,
            mineral_cap: 10,
            gas_per_round: 1,
            card_cost: 3,
            sell_refund: 1,
            refresh_cost: 1,
            upgrade_gas_cost: 2,
            max_units: 200,
            max_upgrades: 5,
            tier_max: vec![18, 15, 13, 11, 9, 6],
            rare_chance: 0.5,
            discover_count: 3,
            darkness_level: 4,
            darkness_low: 1,
            darkness_high: 2,
        }
    }
}

impl GameConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    pub fn store_size(&self, level: u8) -> usize {
        let idx = usize::from(level.max(1) - 1);
        self.store_sizes
            .get(idx)
            .or(self.store_sizes.last())
            .copied()
            .unwrap_or(3)
    }

    /// Base cost to go from `level` to `level + 1`; 0 at the top
    pub fn level_up_cost(&self, level: u8) -> i64 {
        if level >= self.max_level {
            return 0;
        }
        let idx = usize::from(level.max(1) - 1);
        self.level_up_costs.get(idx).copied().unwrap_or(0)
    }

    pub fn mineral_for_round(&self, round: u32) -> i64 {
        (i64::from(round) + self.mineral_base).min(self.mineral_cap)
    }

    /// Copies per key for pool tier `level`; eggs and unknown tiers get none
    pub fn tier_max(&self, level: u8) -> u32 {
        if level == 0 {
            return 0;
        }
        self.tier_max
            .get(usize::from(level) - 1)
            .copied()
            .unwrap_or(0)
    }

    pub fn darkness_for(&self, level: u8) -> i64 {
        if level >= self.darkness_level {
            self.darkness_high
        } else {
            self.darkness_low
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let c = GameConfig::default();
        assert_eq!(c.store_size(1), 3);
        assert_eq!(c.store_size(6), 6);
        assert_eq!(c.level_up_cost(1), 5);
        assert_eq!(c.level_up_cost(6), 0);
        assert_eq!(c.mineral_for_round(1), 3);
        assert_eq!(c.mineral_for_round(20), 10);
        assert_eq!(c.tier_max(1), 18);
        assert_eq!(c.tier_max(6), 6);
        assert_eq!(c.tier_max(0), 0);
        assert_eq!(c.darkness_for(3), 1);
        assert_eq!(c.darkness_for(4), 2);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let c: GameConfig = serde_json::from_str(r#"{"card_cost": 4, "present_slots": 5}"#).unwrap();
        assert_eq!(c.card_cost, 4);
        assert_eq!(c.present_slots, 5);
        assert_eq!(c.hand_slots, 6);
    }
}
