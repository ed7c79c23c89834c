//! Game entity, rules and drivers

pub mod card_ops;
pub mod commands;
pub mod config;
pub mod controller;
pub mod logger;
pub mod player_ops;
pub mod query;
pub mod random_controller;
pub mod replay;
pub mod round;
pub mod self_play;
pub mod snapshot;
pub mod state;
pub mod state_hash;
pub mod zero_controller;

/// Log at verbose level; compiled out without the `verbose-logging` feature
macro_rules! log_if_verbose {
    ($game:expr, $($arg:tt)*) => {
        #[cfg(feature = "verbose-logging")]
        {
            $game.logger.verbose(&format!($($arg)*));
        }
    };
}
pub(crate) use log_if_verbose;

pub use card_ops::SeizeOptions;
pub use commands::{Command, CommandKind};
pub use config::GameConfig;
pub use controller::{GameView, PlayerController};
pub use logger::{GameLogger, OutputMode, VerbosityLevel};
pub use player_ops::Removal;
pub use query::{PendingQuery, QueryKind, Resolution};
pub use random_controller::RandomController;
pub use replay::Replay;
pub use self_play::SelfPlay;
pub use snapshot::StateSnapshot;
pub use state::Game;
pub use state_hash::{compute_state_hash, format_hash};
pub use zero_controller::ZeroController;
