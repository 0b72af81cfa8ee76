//! Reversi-MCTS: an 8x8 Reversi engine.
//!
//! ## Usage
//!
//! - `reversi-mcts` - Show a demo game
//! - `reversi-mcts protocol` - Start the text protocol server on stdin/stdout
//! - `reversi-mcts demo` - Play the engine against a random opponent

use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;

use reversi_mcts::board::Player;
use reversi_mcts::constants::N_ITERATIONS;
use reversi_mcts::mcts::{LeafRule, SearchConfig, SearchEngine};
use reversi_mcts::position::{GameState, Move};
use reversi_mcts::protocol::{TextEngine, render};

/// Reversi-MCTS: an 8x8 Reversi engine with UCT tree search
#[derive(Parser)]
#[command(name = "reversi-mcts")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log level when RUST_LOG is not set
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Simulate passes per engine move
    #[arg(long, global = true, default_value_t = N_ITERATIONS)]
    iterations: usize,

    /// Stop each search after this many milliseconds
    #[arg(long, global = true)]
    time_limit_ms: Option<u64>,

    /// Which positions end a simulate pass
    #[arg(long, global = true, value_enum, default_value_t = LeafArg::GameOver)]
    leaf_rule: LeafArg,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the text protocol server for use with a front end
    Protocol,
    /// Play the engine (black) against a random opponent
    Demo {
        /// Seed for the random opponent
        #[arg(long, default_value_t = 1)]
        seed: u64,
    },
}

#[derive(Copy, Clone, ValueEnum)]
enum LeafArg {
    GameOver,
    MoverBlocked,
}

impl From<LeafArg> for LeafRule {
    fn from(arg: LeafArg) -> Self {
        match arg {
            LeafArg::GameOver => LeafRule::GameOver,
            LeafArg::MoverBlocked => LeafRule::MoverBlocked,
        }
    }
}

fn init_tracing(level: &str) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    let mut config = SearchConfig::default()
        .with_iterations(cli.iterations)
        .with_leaf_rule(cli.leaf_rule.into());
    if let Some(ms) = cli.time_limit_ms {
        config = config.with_time_limit(Duration::from_millis(ms));
    }

    match cli.command {
        Some(Commands::Protocol) => {
            let mut engine = TextEngine::with_config(config);
            engine.run().context("protocol I/O failed")?;
        }
        Some(Commands::Demo { seed }) => run_demo(config, seed)?,
        None => run_demo(config, 1)?,
    }
    Ok(())
}

fn run_demo(config: SearchConfig, seed: u64) -> Result<()> {
    println!("Reversi-MCTS: engine (black) vs random (white)\n");

    let mut rng = fastrand::Rng::with_seed(seed);
    let mut game = GameState::new();

    while !game.is_terminal() {
        let player = game.to_move();
        let mv = if game.is_blocked() {
            Move::Pass
        } else if player == Player::Black {
            let mut engine = SearchEngine::with_config(game.clone(), config.clone());
            let report = engine.run();
            engine.dump_children();
            report.best_move.map_or(Move::Pass, Move::Place)
        } else {
            let moves = game.valid_moves();
            Move::Place(moves[rng.usize(..moves.len())])
        };

        game.apply_move(mv)
            .with_context(|| format!("{player} produced an illegal move {mv}"))?;
        info!(%player, %mv, "move");
        println!("{player} plays {mv}");
        println!("{}\n", render(&game));
    }

    let (black, white) = game.score();
    println!("Final score: black {black} white {white}");
    println!("Result: {}", game.result());
    Ok(())
}
