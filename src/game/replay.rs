//! Replay files
//!
//! A replay is everything needed to rebuild a match: the content pack
//! selector, the seed, the seat roles, the configuration and the ordered
//! command log. Rebuilding feeds the log through [`Game::apply`] on a fresh
//! game, which lands on the same state the recorded game had.

use crate::core::RoleKind;
use crate::effects::EffectCatalog;
use crate::game::commands::Command;
use crate::game::{Game, GameConfig};
use crate::loader::Content;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Replay {
    /// `"demo"` or a path to a content pack
    pub pack: String,
    pub seed: String,
    pub roles: Vec<RoleKind>,
    #[serde(default)]
    pub config: GameConfig,
    pub log: Vec<Command>,
}

impl Replay {
    /// Capture a running game
    pub fn record(pack: &str, game: &Game, roles: &[RoleKind]) -> Self {
        Replay {
            pack: pack.to_string(),
            seed: game.seed().to_string(),
            roles: roles.to_vec(),
            config: game.config.clone(),
            log: game.log().to_vec(),
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    pub async fn load_async(path: &Path) -> Result<Self> {
        let json = tokio::fs::read_to_string(path).await?;
        Ok(serde_json::from_str(&json)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// A started game with this replay's seed and seats, before any command
    pub fn new_game(&self, content: Arc<dyn Content>) -> Result<Game> {
        let catalog = Arc::new(EffectCatalog::from_content(content.as_ref()));
        let mut game = Game::new(self.config.clone(), content, catalog, &self.seed, &self.roles);
        game.start()?;
        Ok(game)
    }

    /// Rebuild the recorded game
    pub fn run(&self, content: Arc<dyn Content>) -> Result<Game> {
        let mut game = self.new_game(content)?;
        for cmd in &self.log {
            game.apply(cmd.clone())?;
        }
        Ok(game)
    }
}
