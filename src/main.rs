//! Infinite Go: a lock-based Go variant on an unbounded board.
//!
//! ## Usage
//!
//! - `infinite-go` - Show a demo
//! - `infinite-go serve` - Start the command protocol on stdin/stdout
//! - `infinite-go demo` - Run a random self-play game and draw the result

use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use infinite_go::clock::SystemClock;
use infinite_go::config::RulesConfig;
use infinite_go::constants::{DEFAULT_LOCK_TIMEOUT_SECS, ORIGIN};
use infinite_go::engine::Engine;
use infinite_go::playout::random_playout;
use infinite_go::protocol::CommandServer;
use infinite_go::render::RegionView;
use infinite_go::stone::{Coord, PlayerId};
use infinite_go::store::{BoardStore, MemoryStore, SqliteStore};

/// Infinite Go: placement governed by stone locks instead of turns
#[derive(Parser)]
#[command(name = "infinite-go")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Seconds a time-limited stone keeps its region reserved
    #[arg(long, global = true, default_value_t = DEFAULT_LOCK_TIMEOUT_SECS)]
    timeout_secs: u64,

    /// SQLite database file (in-memory board if omitted)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Owner recorded for the origin stone of an empty board
    #[arg(long, global = true, default_value = "origin")]
    origin_owner: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Read commands from stdin and answer on stdout
    Serve,
    /// Play a random game and draw the board around the origin
    Demo {
        /// Number of move attempts
        #[arg(long, default_value_t = 300)]
        moves: usize,
        /// Random seed
        #[arg(long, default_value_t = 42)]
        seed: u64,
        /// Number of players
        #[arg(long, default_value_t = 3)]
        players: usize,
    },
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    // stdout carries protocol responses, so logs go to stderr.
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(env_filter)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let config = RulesConfig::with_timeout_secs(cli.timeout_secs);
    let origin_owner = PlayerId::new(cli.origin_owner.clone());
    let command = cli.command.unwrap_or(Commands::Demo {
        moves: 300,
        seed: 42,
        players: 3,
    });

    match &cli.db {
        Some(path) => {
            let store = SqliteStore::open(path)
                .with_context(|| format!("opening board database {}", path.display()))?;
            run(Engine::new(store, SystemClock, config), &origin_owner, command)
        }
        None => run(
            Engine::new(MemoryStore::new(), SystemClock, config),
            &origin_owner,
            command,
        ),
    }
}

fn run<S: BoardStore>(
    engine: Engine<S>,
    origin_owner: &PlayerId,
    command: Commands,
) -> Result<()> {
    engine
        .bootstrap(origin_owner)
        .context("seeding the origin stone")?;

    match command {
        Commands::Serve => {
            tracing::info!(timeout = ?engine.config().lock_timeout, "serving commands on stdin");
            let mut server = CommandServer::new(engine);
            server.run(io::stdin().lock(), io::stdout().lock())
        }
        Commands::Demo {
            moves,
            seed,
            players,
        } => run_demo(&engine, moves, seed, players),
    }
}

fn run_demo<S: BoardStore>(
    engine: &Engine<S>,
    moves: usize,
    seed: u64,
    players: usize,
) -> Result<()> {
    println!("Infinite Go: random self-play\n");

    let players: Vec<PlayerId> = ["alice", "bob", "carol", "dave", "erin", "frank"]
        .iter()
        .take(players.max(1))
        .map(|&name| PlayerId::from(name))
        .collect();
    let mut rng = fastrand::Rng::with_seed(seed);
    let stats =
        random_playout(engine, &players, moves, &mut rng).context("running random playout")?;

    println!(
        "{} attempts: {} played, {} rejected, {} stones captured, {} suicides\n",
        stats.attempts, stats.played, stats.rejected, stats.captured, stats.suicides
    );

    let region = engine
        .region(Coord::from(ORIGIN))
        .context("reading the origin region")?;
    println!("{}", RegionView::new(&region, None));

    for player in &players {
        let score = engine.score(player).context("counting stones")?;
        println!("{player}: {score}");
    }
    Ok(())
}
