//! Read-only content definitions and the lookup interface the engine consumes

use crate::core::{Belonging, CardKey, ColorTier, Faction, InfraSlot, MergePolicy, UnitKey, UpgradeKey};
use crate::effects::EffectSpec;
use serde::{Deserialize, Serialize};

fn default_pooled() -> bool {
    true
}

/// Card template as authored in a content pack
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardDef {
    pub key: CardKey,
    pub name: String,
    pub faction: Faction,
    /// Pool tier 1-6. Level 0 marks an egg: a summoned placeholder card.
    pub level: u8,

    /// Included in the pool once, with probability `rare_chance`
    #[serde(default)]
    pub rare: bool,

    /// Entering asks the owner where to place the card
    #[serde(default)]
    pub insert: bool,

    /// Whether copies of this card live in the shared pool at all
    #[serde(default = "default_pooled")]
    pub pooled: bool,

    #[serde(default)]
    pub belonging: Belonging,

    /// Starting units seeded when the card enters
    #[serde(default)]
    pub units: Vec<UnitKey>,

    /// Upgrades a player may buy for this card
    #[serde(default)]
    pub upgrades: Vec<UpgradeKey>,

    /// Descriptor recipes; `None` means nobody wrote effects for this card yet
    #[serde(default)]
    pub effects: Option<Vec<EffectSpec>>,
}

impl CardDef {
    pub fn is_egg(&self) -> bool {
        self.level == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitTag {
    Biological,
    Mechanical,
    Heroic,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitDef {
    pub key: UnitKey,
    pub name: String,
    pub value: i64,
    #[serde(default)]
    pub tags: Vec<UnitTag>,
    #[serde(default)]
    pub infra: Option<InfraSlot>,
    /// Unit this one turns into when elited
    #[serde(default)]
    pub elite: Option<UnitKey>,
}

impl UnitDef {
    pub fn has_tag(&self, tag: UnitTag) -> bool {
        self.tags.contains(&tag)
    }
}

/// Side effect applied when a card receives an upgrade
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum UpgradeEffect {
    #[default]
    None,
    GrantUnits {
        unit: UnitKey,
        count: usize,
    },
    AddAttribute {
        name: String,
        amount: i64,
        policy: MergePolicy,
    },
    Elite {
        max: usize,
    },
    /// Replace the card's identity and its whole descriptor set
    Reskin {
        to: CardKey,
        #[serde(default)]
        color: Option<ColorTier>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpgradeDef {
    pub key: UpgradeKey,
    pub name: String,
    /// May be applied again to a card that already holds it
    #[serde(default)]
    pub overridable: bool,
    #[serde(default)]
    pub effect: UpgradeEffect,
}

/// Content collaborator
///
/// The engine only ever reads through this trait; it never mutates content.
pub trait Content: Send + Sync {
    fn card(&self, key: &CardKey) -> Option<&CardDef>;
    fn unit(&self, key: &UnitKey) -> Option<&UnitDef>;
    fn upgrade(&self, key: &UpgradeKey) -> Option<&UpgradeDef>;

    /// Every card definition, in authoring order
    fn cards(&self) -> &[CardDef];

    fn unit_value(&self, key: &UnitKey) -> i64 {
        self.unit(key).map_or(0, |u| u.value)
    }

    fn is_biological(&self, key: &UnitKey) -> bool {
        self.unit(key).map_or(false, |u| u.has_tag(UnitTag::Biological))
    }

    fn is_mechanical(&self, key: &UnitKey) -> bool {
        self.unit(key).map_or(false, |u| u.has_tag(UnitTag::Mechanical))
    }

    fn is_heroic(&self, key: &UnitKey) -> bool {
        self.unit(key).map_or(false, |u| u.has_tag(UnitTag::Heroic))
    }

    fn infra_of(&self, key: &UnitKey) -> Option<InfraSlot> {
        self.unit(key).and_then(|u| u.infra)
    }

    /// The elite form of `key`, if it can be elited
    fn elite_of(&self, key: &UnitKey) -> Option<UnitKey> {
        self.unit(key).and_then(|u| u.elite.clone())
    }

    /// Upgrades a player may buy for `card`; empty for unknown keys
    fn upgrades_for(&self, card: &CardKey) -> &[UpgradeKey] {
        self.card(card).map_or(&[], |c| c.upgrades.as_slice())
    }

    fn in_faction(&self, card: &CardKey, faction: &Faction) -> bool {
        self.card(card).map_or(false, |c| &c.faction == faction)
    }
}
