//! Strongly-typed wrappers for game concepts
//!
//! Content keys, factions and unique-slot names are all strings on the wire.
//! Wrapping each in its own newtype keeps a unit key from ever being looked
//! up in the card table.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! string_key {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(s: impl Into<String>) -> Self {
                $name(s.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                $name(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                $name(s.to_string())
            }
        }
    };
}

string_key!(
    /// Content key of a card definition (e.g. "marine-squad")
    CardKey
);
string_key!(
    /// Content key of a unit definition (e.g. "marine")
    UnitKey
);
string_key!(
    /// Content key of an upgrade definition
    UpgradeKey
);
string_key!(
    /// Faction a card belongs to
    Faction
);
string_key!(
    /// Name of a game-wide singleton ability; only one claim per player is live
    UniqueKey
);

/// Identity of one bound descriptor, unique across the whole simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DescriptorId(pub u32);

/// Color tier of a card
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ColorTier {
    #[default]
    Normal,
    /// Upgraded once (the result of a combine)
    Gold,
    /// Upgraded twice
    Rainbow,
}

impl ColorTier {
    pub fn is_upgraded(self) -> bool {
        self != ColorTier::Normal
    }

    /// Next tier up; rainbow is the ceiling
    pub fn promote(self) -> Self {
        match self {
            ColorTier::Normal => ColorTier::Gold,
            ColorTier::Gold | ColorTier::Rainbow => ColorTier::Rainbow,
        }
    }
}

/// Provenance tag that decides what happens to a card's resources on removal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Belonging {
    #[default]
    #[serde(rename = "none")]
    Ordinary,
    Primal,
    /// Summoned from nothing; never returns content keys to the pool
    Virtual,
    Structure,
}

/// The three mutually exclusive support units a card can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InfraSlot {
    Gas,
    Supply,
    Power,
}

/// Inventory area a selection points into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Area {
    Hand,
    Store,
    Present,
}

/// A typed "current selection": area plus slot index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Selection {
    pub area: Area,
    pub index: usize,
}

impl Selection {
    pub fn new(area: Area, index: usize) -> Self {
        Selection { area, index }
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let area = match self.area {
            Area::Hand => "hand",
            Area::Store => "store",
            Area::Present => "present",
        };
        write!(f, "{}[{}]", area, self.index)
    }
}

/// How a batch of units reached a card
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GainWay {
    Normal,
    Round,
    Seize,
    Deploy,
    Upgrade,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_serialize_as_plain_strings() {
        let key = CardKey::new("marine-squad");
        assert_eq!(serde_json::to_string(&key).unwrap(), "\"marine-squad\"");
        let back: CardKey = serde_json::from_str("\"marine-squad\"").unwrap();
        assert_eq!(back, key);
    }

    #[test]
    fn test_color_tier_promotion_caps_at_rainbow() {
        assert_eq!(ColorTier::Normal.promote(), ColorTier::Gold);
        assert_eq!(ColorTier::Gold.promote(), ColorTier::Rainbow);
        assert_eq!(ColorTier::Rainbow.promote(), ColorTier::Rainbow);
        assert!(!ColorTier::Normal.is_upgraded());
    }

    #[test]
    fn test_belonging_wire_names() {
        let b: Belonging = serde_json::from_str("\"none\"").unwrap();
        assert_eq!(b, Belonging::Ordinary);
        let v: Belonging = serde_json::from_str("\"virtual\"").unwrap();
        assert_eq!(v, Belonging::Virtual);
    }
}
