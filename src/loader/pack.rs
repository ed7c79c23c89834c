//! JSON content packs
//!
//! A pack is one JSON document with `cards`, `units` and `upgrades` arrays.
//! Every cross reference (starting units, elite forms, re-skin targets, effect
//! parameters) is checked once at load time so the simulation itself can treat
//! a missing key as a content gap rather than a crash.

use crate::core::{CardKey, UnitKey, UpgradeKey};
use crate::effects::EffectSpec;
use crate::loader::content::{CardDef, Content, UnitDef, UpgradeDef, UpgradeEffect};
use crate::{BattlerError, Result};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::path::Path;

const DEMO_PACK: &str = include_str!("../../data/demo_pack.json");

#[derive(Debug, Default)]
struct PackIndex {
    cards: FxHashMap<CardKey, usize>,
    units: FxHashMap<UnitKey, usize>,
    upgrades: FxHashMap<UpgradeKey, usize>,
}

/// In-memory content pack, the reference implementation of [`Content`]
#[derive(Debug, Serialize, Deserialize)]
pub struct ContentPack {
    pub name: String,
    pub cards: Vec<CardDef>,
    pub units: Vec<UnitDef>,
    #[serde(default)]
    pub upgrades: Vec<UpgradeDef>,
    #[serde(skip)]
    index: PackIndex,
}

impl ContentPack {
    /// Parse and validate a pack from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        let mut pack: ContentPack = serde_json::from_str(json)?;
        pack.build_index()?;
        pack.validate()?;
        Ok(pack)
    }

    /// The pack compiled into the binary
    pub fn demo() -> Result<Self> {
        Self::from_json(DEMO_PACK)
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub async fn load_from_file_async(path: &Path) -> Result<Self> {
        let json = tokio::fs::read_to_string(path).await?;
        Self::from_json(&json)
    }

    /// Resolve a pack selector: `"demo"` or a path to a JSON file
    pub async fn resolve(selector: &str) -> Result<Self> {
        if selector == "demo" {
            Self::demo()
        } else {
            Self::load_from_file_async(Path::new(selector)).await
        }
    }

    fn build_index(&mut self) -> Result<()> {
        let mut index = PackIndex::default();
        for (i, card) in self.cards.iter().enumerate() {
            if index.cards.insert(card.key.clone(), i).is_some() {
                return Err(BattlerError::ContentFormat(format!(
                    "duplicate card key {}",
                    card.key
                )));
            }
        }
        for (i, unit) in self.units.iter().enumerate() {
            if index.units.insert(unit.key.clone(), i).is_some() {
                return Err(BattlerError::ContentFormat(format!(
                    "duplicate unit key {}",
                    unit.key
                )));
            }
        }
        for (i, upgrade) in self.upgrades.iter().enumerate() {
            if index.upgrades.insert(upgrade.key.clone(), i).is_some() {
                return Err(BattlerError::ContentFormat(format!(
                    "duplicate upgrade key {}",
                    upgrade.key
                )));
            }
        }
        self.index = index;
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        for unit in &self.units {
            if let Some(elite) = &unit.elite {
                self.require_unit(elite)?;
            }
        }
        for card in &self.cards {
            if card.level > 6 {
                return Err(BattlerError::ContentFormat(format!(
                    "card {} has level {} (expected 0-6)",
                    card.key, card.level
                )));
            }
            for unit in &card.units {
                self.require_unit(unit)?;
            }
            for upgrade in &card.upgrades {
                if self.upgrade(upgrade).is_none() {
                    return Err(BattlerError::UnknownUpgrade(upgrade.to_string()));
                }
            }
            for effect in card.effects.iter().flatten() {
                self.validate_effect(effect)?;
            }
        }
        for upgrade in &self.upgrades {
            match &upgrade.effect {
                UpgradeEffect::GrantUnits { unit, .. } => self.require_unit(unit)?,
                UpgradeEffect::Reskin { to, .. } => self.require_card(to)?,
                UpgradeEffect::None
                | UpgradeEffect::AddAttribute { .. }
                | UpgradeEffect::Elite { .. } => {}
            }
        }
        Ok(())
    }

    fn validate_effect(&self, effect: &EffectSpec) -> Result<()> {
        match effect {
            EffectSpec::RoundGrant { unit, .. }
            | EffectSpec::EnterBuff { unit, .. }
            | EffectSpec::Deploy { unit, .. } => self.require_unit(unit),
            EffectSpec::Summon { card } => self.require_card(card),
            EffectSpec::Income { .. }
            | EffectSpec::Absorb { .. }
            | EffectSpec::Scavenge { .. }
            | EffectSpec::Discover { .. }
            | EffectSpec::SeizeLeft { .. }
            | EffectSpec::Elite { .. } => Ok(()),
        }
    }

    fn require_unit(&self, key: &UnitKey) -> Result<()> {
        self.unit(key)
            .map(|_| ())
            .ok_or_else(|| BattlerError::UnknownUnit(key.to_string()))
    }

    fn require_card(&self, key: &CardKey) -> Result<()> {
        self.card(key)
            .map(|_| ())
            .ok_or_else(|| BattlerError::UnknownCard(key.to_string()))
    }
}

impl Content for ContentPack {
    fn card(&self, key: &CardKey) -> Option<&CardDef> {
        self.index.cards.get(key).map(|&i| &self.cards[i])
    }

    fn unit(&self, key: &UnitKey) -> Option<&UnitDef> {
        self.index.units.get(key).map(|&i| &self.units[i])
    }

    fn upgrade(&self, key: &UpgradeKey) -> Option<&UpgradeDef> {
        self.index.upgrades.get(key).map(|&i| &self.upgrades[i])
    }

    fn cards(&self) -> &[CardDef] {
        &self.cards
    }
}
