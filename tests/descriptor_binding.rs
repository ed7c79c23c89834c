//! Descriptor binding, unbinding and unique-slot arbitration on a live game

mod common;

use battler_sim::bus::{Handler, Message, MsgKind};
use battler_sim::core::{CardId, GainWay, RoleKind, UniqueKey, UnitKey, UpgradeKey};
use battler_sim::effects::{Binder, DescriptorSpec, Generator};
use battler_sim::game::{Command, CommandKind, Game, SeizeOptions};
use battler_sim::Result;
use common::{key, place, started_game};
use similar_asserts::assert_eq;
use std::sync::{Arc, Mutex};

const TWO: [RoleKind; 2] = [RoleKind::Neutral, RoleKind::Neutral];

/// Every handler on a card's bus belongs to one of its descriptors
fn assert_bus_matches_descriptors(game: &Game, card: CardId) {
    let c = game.card(card).expect("card exists");
    let expected: usize = c.descriptors.iter().map(|d| d.subscription_count()).sum();
    assert_eq!(c.bus.len(), expected);
}

fn live_claims(game: &Game, seat: usize, unique: &str) -> Vec<CardId> {
    let unique = UniqueKey::new(unique);
    game.all_of(seat, |_| true)
        .filter(|c| {
            c.descriptors
                .iter()
                .any(|d| d.unique.as_ref() == Some(&unique) && d.is_live())
        })
        .map(|c| c.id)
        .collect()
}

/// Names of the `kinds` messages that reach a player's bus node, in order
fn record(game: &mut Game, seat: usize, kinds: &[MsgKind]) -> Arc<Mutex<Vec<&'static str>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    for &kind in kinds {
        let seen = Arc::clone(&seen);
        let handler: Handler<Game> = Arc::new(move |_: &mut Game, m: &mut Message| {
            seen.lock().expect("recorder lock").push(m.kind.as_str());
            Ok(())
        });
        game.players[seat].bus.on(kind, handler);
    }
    seen
}

fn unit_names(game: &Game, card: CardId) -> Vec<&str> {
    game.card(card)
        .map(|c| c.units().iter().map(|u| u.as_str()).collect())
        .unwrap_or_default()
}

#[test]
fn test_clear_removes_every_subscription() -> Result<()> {
    let mut game = started_game("unbind", &TWO)?;
    let scrap = place(&mut game, 0, "scrap-yard")?;
    let pack = place(&mut game, 0, "zergling-pack")?;
    assert_bus_matches_descriptors(&game, scrap);
    assert_bus_matches_descriptors(&game, pack);
    // scavenge listens for both sold and destroyed
    assert_eq!(game.card(pack).map(|c| c.bus.len()), Some(2));

    game.clear_descriptors(pack)?;
    let c = game.card(pack).expect("card still present");
    assert!(c.descriptors.is_empty());
    assert!(c.bus.is_empty());
    Ok(())
}

#[test]
fn test_unbound_handlers_stop_firing() -> Result<()> {
    let mut game = started_game("silence", &TWO)?;
    let squad = place(&mut game, 0, "marine-squad")?;
    game.clear_descriptors(squad)?;

    game.post(Message::new(MsgKind::RoundStart))?;
    assert_eq!(game.card(squad).map(|c| c.units().len()), Some(2));
    Ok(())
}

#[test]
fn test_reskin_rebinds_to_new_identity() -> Result<()> {
    let mut game = started_game("rebind", &TWO)?;
    let squad = place(&mut game, 0, "marine-squad")?;
    let before: Vec<_> = game
        .card(squad)
        .map(|c| c.descriptors.iter().map(|d| d.id).collect())
        .unwrap_or_default();

    game.reskin(squad, &key("marine-bunker"), None)?;

    let c = game.card(squad).expect("card exists");
    assert_eq!(c.descriptors.len(), 1);
    assert!(c.descriptors.iter().all(|d| !before.contains(&d.id)));
    assert_bus_matches_descriptors(&game, squad);

    // The bunker grants two marines a round, not one
    game.post(Message::new(MsgKind::RoundStart))?;
    assert_eq!(game.card(squad).map(|c| c.units().len()), Some(4));
    Ok(())
}

#[test]
fn test_only_one_unique_claim_is_live() -> Result<()> {
    let mut game = started_game("unique", &TWO)?;
    let first = place(&mut game, 0, "probe-works")?;
    let second = place(&mut game, 0, "probe-works")?;
    let third = place(&mut game, 0, "probe-works")?;

    assert_eq!(live_claims(&game, 0, "probe-income"), vec![first]);

    // Income applies once, from the head claim only
    let mineral = game.players[0].mineral;
    game.post(Message::new(MsgKind::RoundStart))?;
    assert_eq!(game.players[0].mineral, mineral + 1);

    game.apply(Command::new(0, CommandKind::PresentSell { place: 0 }))?;
    assert_eq!(live_claims(&game, 0, "probe-income"), vec![second]);
    assert!(game.card(third).is_some());
    Ok(())
}

#[test]
fn test_unique_slots_are_per_player() -> Result<()> {
    let mut game = started_game("per-player", &TWO)?;
    let mine = place(&mut game, 0, "probe-works")?;
    let theirs = place(&mut game, 1, "probe-works")?;

    assert_eq!(live_claims(&game, 0, "probe-income"), vec![mine]);
    assert_eq!(live_claims(&game, 1, "probe-income"), vec![theirs]);
    Ok(())
}

#[test]
fn test_manual_toggle_hands_the_slot_over() -> Result<()> {
    let mut game = started_game("toggle", &TWO)?;
    let first = place(&mut game, 0, "probe-works")?;
    let second = place(&mut game, 0, "probe-works")?;

    game.apply(Command::new(
        0,
        CommandKind::PresentToggle {
            place: 0,
            descriptor: 0,
        },
    ))?;
    assert_eq!(live_claims(&game, 0, "probe-income"), vec![second]);

    game.apply(Command::new(
        0,
        CommandKind::PresentToggle {
            place: 0,
            descriptor: 0,
        },
    ))?;
    assert_eq!(live_claims(&game, 0, "probe-income"), vec![first]);
    Ok(())
}

#[test]
fn test_upgraded_claim_outranks_leftmost() -> Result<()> {
    let mut game = started_game("gold", &TWO)?;
    place(&mut game, 0, "zealot-guard")?;
    let gold = place(&mut game, 0, "probe-works")?;
    place(&mut game, 0, "probe-works")?;
    game.players[0].mineral = 100;
    game.players[0].hand[0] = Some(key("probe-works"));

    game.apply(Command::new(0, CommandKind::HandCombine { place: 0 }))?;
    game.apply(Command::new(0, CommandKind::Cancel))?;
    assert!(game.card(gold).map_or(false, |c| c.color.is_upgraded()));

    // A plain copy entering to the left still loses to the upgraded one
    game.apply(Command::new(0, CommandKind::PresentSell { place: 0 }))?;
    let plain = place(&mut game, 0, "probe-works")?;
    assert_eq!(game.card(plain).and_then(|c| c.pos), Some(0));
    assert_eq!(live_claims(&game, 0, "probe-income"), vec![gold]);
    Ok(())
}

#[test]
fn test_hand_written_generator_binds_and_unbinds() -> Result<()> {
    let mut game = started_game("custom", &TWO)?;
    let squad = place(&mut game, 0, "zealot-guard")?;

    let generator: Generator = Arc::new(|b: &mut Binder<'_>| {
        let card = b.card();
        b.on_live(MsgKind::RoundEnd, move |g: &mut Game, _: &mut Message| {
            if let Some(c) = g.cards.find_mut(card) {
                c.bump("rounds-seen", 1);
            }
            Ok(())
        });
        DescriptorSpec::default()
    });
    let id = game.add_descriptor(squad, &generator)?;
    assert!(game.descriptor_live(squad, id));
    assert_bus_matches_descriptors(&game, squad);

    game.post(Message::new(MsgKind::RoundEnd))?;
    game.clear_descriptors(squad)?;
    game.post(Message::new(MsgKind::RoundEnd))?;

    let c = game.card(squad).expect("card exists");
    assert_eq!(c.attrs().get("rounds-seen", 0), 1);
    assert!(!game.descriptor_live(squad, id));
    Ok(())
}

#[test]
fn test_devourer_seizes_its_left_neighbor_on_entry() -> Result<()> {
    let mut game = started_game("devour", &TWO)?;
    let squad = place(&mut game, 0, "marine-squad")?;
    let seen = record(&mut game, 0, &[MsgKind::CardDestroyed, MsgKind::CardSeized]);
    let before = game.pool.remaining(&key("marine-squad"));

    let devourer = place(&mut game, 0, "devourer")?;

    assert!(game.card(squad).is_none());
    assert_eq!(game.players[0].card_at(0), None);
    assert_eq!(game.card(devourer).and_then(|c| c.pos), Some(1));
    assert_eq!(
        unit_names(&game, devourer),
        vec!["zergling", "zergling", "marine", "marine"]
    );
    assert_eq!(game.pool.remaining(&key("marine-squad")), before + 1);
    assert_eq!(*seen.lock().expect("recorder lock"), vec!["card-destroyed", "card-seized"]);
    Ok(())
}

#[test]
fn test_unreal_seize_moves_upgrades_silently() -> Result<()> {
    let mut game = started_game("unreal", &TWO)?;
    let squad = place(&mut game, 0, "marine-squad")?;
    let stim = UpgradeKey::new("stim-pack");
    assert!(game.obtain_upgrade(squad, &stim)?);
    assert_eq!(game.card(squad).map(|c| c.units().len()), Some(4));
    let guard = place(&mut game, 0, "zealot-guard")?;
    let seen = record(&mut game, 0, &[MsgKind::CardDestroyed, MsgKind::CardSeized]);

    let seized = game.seize(
        guard,
        squad,
        SeizeOptions {
            unreal: true,
            with_upgrades: true,
        },
    )?;

    assert!(seized);
    assert!(game.card(squad).is_none());
    let c = game.card(guard).expect("seizer survives");
    assert_eq!(c.upgrades().to_vec(), vec![stim]);
    // The moved upgrade does not grant its marines a second time
    assert_eq!(c.units().len(), 5);
    assert_eq!(*seen.lock().expect("recorder lock"), vec!["card-destroyed"]);
    Ok(())
}

#[test]
fn test_seize_without_upgrades_leaves_them_behind() -> Result<()> {
    let mut game = started_game("plain-seize", &TWO)?;
    let squad = place(&mut game, 0, "marine-squad")?;
    game.obtain_upgrade(squad, &UpgradeKey::new("stim-pack"))?;
    let guard = place(&mut game, 0, "zealot-guard")?;

    assert!(game.seize(guard, squad, SeizeOptions::default())?);
    let c = game.card(guard).expect("seizer survives");
    assert!(c.upgrades().is_empty());
    assert_eq!(c.units().len(), 5);

    // A card cannot seize itself or a card that is gone
    assert!(!game.seize(guard, guard, SeizeOptions::default())?);
    assert!(!game.seize(guard, squad, SeizeOptions::default())?);
    Ok(())
}

#[test]
fn test_absorb_rewrites_incoming_units() -> Result<()> {
    let mut game = started_game("absorb", &TWO)?;
    let yard = place(&mut game, 0, "scrap-yard")?;
    let content = game.content();
    let value_before = game.card(yard).map(|c| c.value(content.as_ref()));

    let added = game.obtain_units(
        yard,
        vec![UnitKey::new("probe"), UnitKey::new("marine")],
        GainWay::Normal,
    )?;

    assert_eq!(added, 1);
    assert_eq!(unit_names(&game, yard), vec!["hellion", "refinery", "marine"]);
    let c = game.card(yard).expect("yard exists");
    assert_eq!(c.attrs().get("absorbed", 0), 1);
    assert_eq!(c.attrs().get("sacrifice", 0), 2);
    // marine value 1 plus the absorbed probe's sacrifice 2
    assert_eq!(Some(c.value(content.as_ref())), value_before.map(|v| v + 3));
    Ok(())
}
