//! Shared setup for integration tests

#![allow(dead_code)]

use battler_sim::core::{CardId, CardKey, RoleKind};
use battler_sim::effects::EffectCatalog;
use battler_sim::game::{Game, GameConfig, VerbosityLevel};
use battler_sim::loader::{Content, ContentPack};
use battler_sim::Result;
use rand::SeedableRng;
use rand_chacha::ChaCha12Rng;
use std::sync::Arc;

pub fn demo_content() -> Result<Arc<dyn Content>> {
    Ok(Arc::new(ContentPack::demo()?))
}

/// A started, silent demo game
pub fn started_game(seed: &str, roles: &[RoleKind]) -> Result<Game> {
    let content = demo_content()?;
    let catalog = Arc::new(EffectCatalog::from_content(content.as_ref()));
    let mut game = Game::new(GameConfig::default(), content, catalog, seed, roles);
    game.logger.set_verbosity(VerbosityLevel::Silent);
    game.start()?;
    Ok(game)
}

/// Put one pool copy of `key` into store slot `place`, returning whatever
/// was there to the pool
pub fn stock(game: &mut Game, seat: usize, place: usize, key: &str) -> Result<()> {
    let key = CardKey::new(key);
    let mut rng = ChaCha12Rng::seed_from_u64(0);
    let mut taken = game.pool.discover(&mut rng, |k| *k == key, 1, true)?;
    let old = game.players[seat].store[place].replace(taken.remove(0));
    game.pool.drop(old);
    Ok(())
}

/// Enter a card at the lowest free slot, paid for out of the pool
pub fn place(game: &mut Game, seat: usize, key: &str) -> Result<CardId> {
    let card = CardKey::new(key);
    let mut rng = ChaCha12Rng::seed_from_u64(0);
    let occupied = game.pool.discover(&mut rng, |k| *k == card, 1, true)?;
    game.enter(seat, &card, occupied)?
        .ok_or_else(|| battler_sim::BattlerError::InvalidCommand(format!("{} did not enter", key)))
}

pub fn key(s: &str) -> CardKey {
    CardKey::new(s)
}
