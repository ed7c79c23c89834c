//! Seat roles and their once-per-round ability

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RoleKind {
    #[default]
    Neutral,
    /// First card bought each round is one mineral cheaper
    Broker,
    /// Ability: one free store refresh per round
    Scout,
}

impl RoleKind {
    pub fn has_ability(self) -> bool {
        matches!(self, RoleKind::Scout)
    }

    /// Discount on the `nth` purchase of the round (0-based)
    pub fn buy_discount(self, nth: i64) -> i64 {
        match self {
            RoleKind::Broker if nth == 0 => 1,
            _ => 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AbilityState {
    /// The role has no activated ability
    Passive,
    Ready,
    Spent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleState {
    pub kind: RoleKind,
    pub ability: AbilityState,
}

impl RoleState {
    pub fn new(kind: RoleKind) -> Self {
        RoleState {
            kind,
            ability: if kind.has_ability() {
                AbilityState::Ready
            } else {
                AbilityState::Passive
            },
        }
    }

    /// Ready → Spent; false if the ability is not available right now
    pub fn spend(&mut self) -> bool {
        if self.ability == AbilityState::Ready {
            self.ability = AbilityState::Spent;
            true
        } else {
            false
        }
    }

    pub fn recharge(&mut self) {
        if self.ability == AbilityState::Spent {
            self.ability = AbilityState::Ready;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ability_cycle() {
        let mut role = RoleState::new(RoleKind::Scout);
        assert!(role.spend());
        assert!(!role.spend());
        role.recharge();
        assert_eq!(role.ability, AbilityState::Ready);
    }

    #[test]
    fn test_passive_roles_never_spend() {
        let mut role = RoleState::new(RoleKind::Broker);
        assert!(!role.spend());
        role.recharge();
        assert_eq!(role.ability, AbilityState::Passive);
        assert_eq!(RoleKind::Broker.buy_discount(0), 1);
        assert_eq!(RoleKind::Broker.buy_discount(1), 0);
        assert_eq!(RoleKind::Neutral.buy_discount(0), 0);
    }
}
