//! Determinism tests
//!
//! A match is fully described by its seed, seats and command log: playing
//! it twice, or rebuilding it from a saved replay, lands on the same state.

mod common;

use battler_sim::core::RoleKind;
use battler_sim::game::{
    format_hash, state::seed_from_str, Game, PlayerController, RandomController, Replay, SelfPlay,
    ZeroController,
};
use battler_sim::Result;
use common::{demo_content, started_game};
use similar_asserts::assert_eq;

const ROLES: [RoleKind; 3] = [RoleKind::Neutral, RoleKind::Broker, RoleKind::Scout];

fn random_seats(seed: &str, seats: usize) -> Vec<Box<dyn PlayerController>> {
    (0..seats)
        .map(|seat| -> Box<dyn PlayerController> {
            Box::new(RandomController::with_seed(
                seat,
                seed_from_str(seed).wrapping_add(seat as u64 + 1),
            ))
        })
        .collect()
}

fn self_play(seed: &str, rounds: u32) -> Result<Game> {
    let mut game = started_game(seed, &ROLES)?;
    SelfPlay::new(random_seats(seed, ROLES.len())).run(&mut game, rounds)?;
    Ok(game)
}

#[test]
fn test_same_seed_same_match() -> Result<()> {
    let a = self_play("determinism", 6)?;
    let b = self_play("determinism", 6)?;

    assert!(!a.log().is_empty());
    assert_eq!(a.log(), b.log());
    assert_eq!(a.snapshot(), b.snapshot());
    assert_eq!(format_hash(a.digest()), format_hash(b.digest()));
    Ok(())
}

#[test]
fn test_different_seed_different_start() -> Result<()> {
    let a = started_game("alpha", &ROLES)?;
    let b = started_game("beta", &ROLES)?;
    assert_ne!(a.digest(), b.digest());
    Ok(())
}

#[test]
fn test_replay_rebuilds_final_state() -> Result<()> {
    let game = self_play("replay", 5)?;
    let replay = Replay::record("demo", &game, &ROLES);

    let rebuilt = replay.run(demo_content()?)?;
    assert_eq!(rebuilt.round, game.round);
    assert_eq!(rebuilt.snapshot(), game.snapshot());
    assert_eq!(rebuilt.digest(), game.digest());
    Ok(())
}

#[test]
fn test_replay_survives_json_round_trip() -> Result<()> {
    let game = self_play("file", 3)?;
    let replay = Replay::record("demo", &game, &ROLES);

    let path = std::env::temp_dir().join(format!("battler-replay-{}.json", std::process::id()));
    replay.save(&path)?;
    let loaded = Replay::load(&path)?;
    std::fs::remove_file(&path)?;

    assert_eq!(loaded, replay);
    assert_eq!(loaded.run(demo_content()?)?.digest(), game.digest());
    Ok(())
}

#[test]
fn test_zero_controllers_are_deterministic() -> Result<()> {
    let play = || -> Result<Game> {
        let mut game = started_game("zero", &ROLES[..2])?;
        let seats: Vec<Box<dyn PlayerController>> =
            vec![Box::new(ZeroController::new(0)), Box::new(ZeroController::new(1))];
        SelfPlay::new(seats).run(&mut game, 4)?;
        Ok(game)
    };
    let a = play()?;
    let b = play()?;
    assert_eq!(a.round, 5);
    assert_eq!(a.digest(), b.digest());
    Ok(())
}

#[test]
fn test_illegal_commands_are_kept_in_the_log() -> Result<()> {
    let mut game = started_game("illegal", &ROLES)?;
    let before = game.digest();

    game.apply(battler_sim::game::Command::new(
        9,
        battler_sim::game::CommandKind::Refresh,
    ))?;

    assert_eq!(game.log().len(), 1);
    assert_ne!(game.digest(), before);
    let rebuilt = Replay::record("demo", &game, &ROLES).run(demo_content()?)?;
    assert_eq!(rebuilt.digest(), game.digest());
    Ok(())
}
