//! Built-in effect recipes
//!
//! Content packs name effects by kind with a few parameters; each kind maps
//! to one generator here. Magnitudes double on upgraded-tier cards.

use crate::bus::{Message, MsgKind, Payload};
use crate::core::{CardKey, GainWay, UniqueKey, UnitKey};
use crate::effects::descriptor::{Binder, DescriptorSpec, Generator};
use crate::game::card_ops::SeizeOptions;
use crate::game::query::QueryKind;
use crate::game::Game;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum EffectSpec {
    /// Gain units at every round start
    RoundGrant { unit: UnitKey, count: usize },
    /// Give units to every other card that enters; one live copy per player
    EnterBuff {
        unit: UnitKey,
        count: usize,
        unique: UniqueKey,
        #[serde(default)]
        ignores_tier: bool,
    },
    /// Extra mineral at round start; one live copy per player
    Income {
        mineral: i64,
        unique: UniqueKey,
        #[serde(default)]
        ignores_tier: bool,
    },
    /// Swallow incoming mechanical units and turn them into sacrifice value
    Absorb { per_unit: i64 },
    /// Gain power whenever a sibling is sold or destroyed
    Scavenge { power: i64 },
    /// Ask the owner which card receives reinforcements each round
    Deploy { unit: UnitKey, count: usize },
    /// Offer a discover of the given tier each round
    Discover { tier: u8 },
    /// On entering, swallow the left neighbor
    SeizeLeft {
        #[serde(default)]
        unreal: bool,
        #[serde(default)]
        with_upgrades: bool,
    },
    /// Put a copy of `card` into a free slot at round end
    Summon { card: CardKey },
    /// Elite up to `max` units at round end
    Elite { max: usize },
}

/// Turn an authored effect into its generator
pub fn generator(spec: &EffectSpec) -> Generator {
    match spec.clone() {
        EffectSpec::RoundGrant { unit, count } => Arc::new(move |b: &mut Binder<'_>| {
            let card = b.card();
            let units = vec![unit.clone(); b.scale(count)];
            b.on_live(MsgKind::RoundStart, move |g: &mut Game, _: &mut Message| {
                g.obtain_units(card, units.clone(), GainWay::Round)?;
                Ok(())
            });
            DescriptorSpec::default()
        }),

        EffectSpec::EnterBuff {
            unit,
            count,
            unique,
            ignores_tier,
        } => Arc::new(move |b: &mut Binder<'_>| {
            let card = b.card();
            let units = vec![unit.clone(); b.scale(count)];
            b.on_live(MsgKind::CardEntered, move |g: &mut Game, m: &mut Message| {
                match m.subject() {
                    Some(other) if other != card => {
                        g.obtain_units(other, units.clone(), GainWay::Normal)?;
                    }
                    _ => {}
                }
                Ok(())
            });
            DescriptorSpec::unique(unique.clone(), ignores_tier)
        }),

        EffectSpec::Income {
            mineral,
            unique,
            ignores_tier,
        } => Arc::new(move |b: &mut Binder<'_>| {
            let seat = b.seat();
            let amount = b.scale(mineral);
            b.on_live(MsgKind::RoundStart, move |g: &mut Game, _: &mut Message| {
                if let Some(player) = g.players.get_mut(seat) {
                    player.mineral += amount;
                }
                Ok(())
            });
            DescriptorSpec::unique(unique.clone(), ignores_tier)
        }),

        EffectSpec::Absorb { per_unit } => Arc::new(move |b: &mut Binder<'_>| {
            let card = b.card();
            let per_unit = b.scale(per_unit);
            b.on_live(MsgKind::ObtainUnitPrev, move |g: &mut Game, m: &mut Message| {
                let content = g.content();
                let Payload::Units { card: target, units, .. } = &mut m.payload else {
                    return Ok(());
                };
                if *target != card {
                    return Ok(());
                }
                let before = units.len();
                units.retain(|u| !content.is_mechanical(u));
                let absorbed = (before - units.len()) as i64;
                if absorbed > 0 {
                    if let Some(c) = g.cards.find_mut(card) {
                        c.bump("absorbed", absorbed);
                        c.bump("sacrifice", absorbed * per_unit);
                    }
                }
                Ok(())
            });
            DescriptorSpec::default()
        }),

        EffectSpec::Scavenge { power } => Arc::new(move |b: &mut Binder<'_>| {
            let card = b.card();
            let power = b.scale(power);
            for kind in [MsgKind::CardSold, MsgKind::CardDestroyed] {
                b.on_live(kind, move |g: &mut Game, m: &mut Message| {
                    if m.subject().map_or(false, |other| other != card) {
                        if let Some(c) = g.cards.find_mut(card) {
                            c.bump("power", power);
                        }
                    }
                    Ok(())
                });
            }
            DescriptorSpec::default()
        }),

        EffectSpec::Deploy { unit, count } => Arc::new(move |b: &mut Binder<'_>| {
            let (card, seat) = (b.card(), b.seat());
            let units = vec![unit.clone(); b.scale(count)];
            b.on_live(MsgKind::RoundStart, move |g: &mut Game, _: &mut Message| {
                g.issue_query(
                    seat,
                    QueryKind::DeployTarget {
                        source: card,
                        units: units.clone(),
                    },
                )
            });
            DescriptorSpec::default()
        }),

        EffectSpec::Discover { tier } => Arc::new(move |b: &mut Binder<'_>| {
            let seat = b.seat();
            // Upgraded copies reach one tier higher.
            let tier = if b.gold() { (tier + 1).min(6) } else { tier };
            b.on_live(MsgKind::RoundStart, move |g: &mut Game, _: &mut Message| {
                g.offer_discover(seat, tier, None)
            });
            DescriptorSpec::default()
        }),

        EffectSpec::SeizeLeft {
            unreal,
            with_upgrades,
        } => Arc::new(move |b: &mut Binder<'_>| {
            let card = b.card();
            let opts = SeizeOptions {
                unreal,
                with_upgrades,
            };
            b.on_live(MsgKind::PostEnter, move |g: &mut Game, m: &mut Message| {
                if m.subject() != Some(card) {
                    return Ok(());
                }
                if let (Some(left), _) = g.neighbors_of(card) {
                    g.seize(card, left, opts)?;
                }
                Ok(())
            });
            DescriptorSpec::default()
        }),

        EffectSpec::Summon { card: summoned } => Arc::new(move |b: &mut Binder<'_>| {
            let seat = b.seat();
            let copies = b.scale(1usize);
            let summoned = summoned.clone();
            b.on_live(MsgKind::RoundEnd, move |g: &mut Game, _: &mut Message| {
                for _ in 0..copies {
                    g.enter(seat, &summoned, Vec::new())?;
                }
                Ok(())
            });
            DescriptorSpec::default()
        }),

        EffectSpec::Elite { max } => Arc::new(move |b: &mut Binder<'_>| {
            let card = b.card();
            let max = b.scale(max);
            b.on_live(MsgKind::RoundEnd, move |g: &mut Game, _: &mut Message| {
                g.elite(card, max);
                Ok(())
            });
            DescriptorSpec::default()
        }),
    }
}
