//! Battler Sim - Main Binary
//!
//! Headless self-play, replay verification and lockstep replication runs

use battler_sim::{
    core::RoleKind,
    effects::EffectCatalog,
    game::{
        format_hash, state::seed_from_str, Game, GameConfig, PlayerController, RandomController,
        Replay, SelfPlay, VerbosityLevel, ZeroController,
    },
    loader::{Content, ContentPack},
    replication::run_lockstep,
    Result,
};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Controller type for self-play seats
#[derive(Debug, Clone, Copy, ValueEnum)]
enum ControllerType {
    /// Always takes the first buy or combine on offer (for testing)
    Zero,
    /// Makes seeded random choices
    Random,
}

/// Seat role as given on the command line
#[derive(Debug, Clone, Copy, ValueEnum)]
enum RoleArg {
    Neutral,
    Broker,
    Scout,
}

impl From<RoleArg> for RoleKind {
    fn from(arg: RoleArg) -> Self {
        match arg {
            RoleArg::Neutral => RoleKind::Neutral,
            RoleArg::Broker => RoleKind::Broker,
            RoleArg::Scout => RoleKind::Scout,
        }
    }
}

/// Verbosity level for game output (custom parser supporting both names and numbers)
#[derive(Debug, Clone, Copy)]
struct VerbosityArg(VerbosityLevel);

impl std::str::FromStr for VerbosityArg {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "silent" | "0" => Ok(VerbosityArg(VerbosityLevel::Silent)),
            "minimal" | "1" => Ok(VerbosityArg(VerbosityLevel::Minimal)),
            "normal" | "2" => Ok(VerbosityArg(VerbosityLevel::Normal)),
            "verbose" | "3" => Ok(VerbosityArg(VerbosityLevel::Verbose)),
            _ => Err(format!(
                "invalid verbosity level '{s}' (expected: silent/0, minimal/1, normal/2, verbose/3)"
            )),
        }
    }
}

impl From<VerbosityArg> for VerbosityLevel {
    fn from(arg: VerbosityArg) -> Self {
        arg.0
    }
}

#[derive(Parser)]
#[command(name = "battler")]
#[command(about = "Battler Sim - deterministic auto-battler simulation core", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a seeded match between controllers and optionally save its replay
    Simulate {
        /// Match seed (any string)
        #[arg(long, default_value = "battler")]
        seed: String,

        /// Seat roles, comma separated (one per seat)
        #[arg(long, value_enum, value_delimiter = ',', default_value = "neutral,neutral")]
        roles: Vec<RoleArg>,

        /// Number of rounds to play
        #[arg(long, short = 'r', default_value_t = 8)]
        rounds: u32,

        /// Controller type for every seat
        #[arg(long, value_enum, default_value = "random")]
        controller: ControllerType,

        /// Content pack: "demo" or a path to a JSON pack
        #[arg(long, default_value = "demo")]
        pack: String,

        /// JSON file overriding rule constants
        #[arg(long, value_name = "CONFIG_FILE")]
        config: Option<PathBuf>,

        /// Commands one seat may issue per round before it is forced to finish
        #[arg(long, default_value_t = 40)]
        action_cap: usize,

        /// Verbosity level for game output (0=silent, 1=minimal, 2=normal, 3=verbose)
        #[arg(long, default_value = "minimal", short = 'v')]
        verbosity: VerbosityArg,

        /// Write the replay (seed, seats, config, command log) here
        #[arg(long, value_name = "REPLAY_FILE")]
        out: Option<PathBuf>,
    },

    /// Rebuild a match from its replay file and print the final state hash
    Replay {
        #[arg(value_name = "REPLAY_FILE")]
        file: PathBuf,

        #[arg(long, default_value = "silent", short = 'v')]
        verbosity: VerbosityArg,
    },

    /// Replay a match through a master and one replica per seat, and check
    /// that every replica ends on the same state hash
    Lockstep {
        #[arg(value_name = "REPLAY_FILE")]
        file: PathBuf,

        /// Extra non-seated replicas
        #[arg(long, default_value_t = 1)]
        spectators: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Simulate {
            seed,
            roles,
            rounds,
            controller,
            pack,
            config,
            action_cap,
            verbosity,
            out,
        } => {
            run_simulate(
                seed, roles, rounds, controller, pack, config, action_cap, verbosity, out,
            )
            .await?
        }
        Commands::Replay { file, verbosity } => run_replay(&file, verbosity).await?,
        Commands::Lockstep { file, spectators } => run_lockstep_cmd(&file, spectators).await?,
    }

    Ok(())
}

async fn load_content(pack: &str) -> Result<Arc<dyn Content>> {
    Ok(Arc::new(ContentPack::resolve(pack).await?))
}

#[allow(clippy::too_many_arguments)]
async fn run_simulate(
    seed: String,
    roles: Vec<RoleArg>,
    rounds: u32,
    controller: ControllerType,
    pack: String,
    config: Option<PathBuf>,
    action_cap: usize,
    verbosity: VerbosityArg,
    out: Option<PathBuf>,
) -> Result<()> {
    let content = load_content(&pack).await?;
    let config = match config {
        Some(path) => GameConfig::from_file(&path)?,
        None => GameConfig::default(),
    };
    let roles: Vec<RoleKind> = roles.into_iter().map(RoleKind::from).collect();

    let catalog = Arc::new(EffectCatalog::from_content(content.as_ref()));
    let mut game = Game::new(config, Arc::clone(&content), catalog, &seed, &roles);
    game.logger.set_verbosity(verbosity.into());

    let controllers: Vec<Box<dyn PlayerController>> = (0..roles.len())
        .map(|seat| -> Box<dyn PlayerController> {
            match controller {
                ControllerType::Zero => Box::new(ZeroController::new(seat)),
                ControllerType::Random => Box::new(RandomController::with_seed(
                    seat,
                    seed_from_str(&seed).wrapping_add(seat as u64 + 1),
                )),
            }
        })
        .collect();

    let start = std::time::Instant::now();
    SelfPlay::new(controllers)
        .with_action_cap(action_cap)
        .run(&mut game, rounds)?;
    let elapsed = start.elapsed();

    println!("=== Simulation Complete ===");
    println!("Seed: {}", seed);
    println!("Rounds played: {}", rounds);
    println!("Commands: {}", game.log().len());
    for seat in 0..game.players.len() {
        println!(
            "  P{}: power {} value {}",
            seat,
            game.aggregate_power(seat),
            game.aggregate_value(seat)
        );
    }
    println!("State hash: {}", format_hash(game.digest()));
    println!("Time: {:.2?}", elapsed);

    if let Some(path) = out {
        Replay::record(&pack, &game, &roles).save(&path)?;
        println!("Replay written to {}", path.display());
    }
    Ok(())
}

async fn run_replay(file: &Path, verbosity: VerbosityArg) -> Result<()> {
    let replay = Replay::load_async(file).await?;
    let content = load_content(&replay.pack).await?;

    let mut game = replay.new_game(content)?;
    game.logger.set_verbosity(verbosity.into());
    for cmd in &replay.log {
        game.apply(cmd.clone())?;
    }

    println!("Commands: {}", replay.log.len());
    println!("Round: {}", game.round);
    println!("State hash: {}", format_hash(game.digest()));
    Ok(())
}

async fn run_lockstep_cmd(file: &Path, spectators: usize) -> Result<()> {
    let replay = Replay::load_async(file).await?;
    let content = load_content(&replay.pack).await?;

    let report = run_lockstep(&replay, content, spectators).await?;
    println!("Commands: {}", report.commands);
    println!("Replicas: {}", report.summary());
    if report.agree() {
        println!("All replicas agree");
        Ok(())
    } else {
        println!("Replicas DIVERGED");
        std::process::exit(1);
    }
}
