//! Headless tactics match runner.
//!
//! This binary runs matches without graphics, controlled via JSON on
//! stdin/stdout. Designed for scripted controllers and CI checks.
//!
//! # Usage
//!
//! ```bash
//! # Interactive mode - read inputs from stdin
//! cargo run -p tactics_headless
//!
//! # Automated match, events and summary as JSON lines on stdout
//! cargo run -p tactics_headless -- run --scenario scenarios/skirmish.ron --ascii
//!
//! # Determinism check
//! cargo run -p tactics_headless -- verify --runs 10
//! ```
//!
//! # Protocol
//!
//! Input (stdin): JSON requests, one per line
//! Output (stdout): JSON responses, one per line
//! Logs (stderr): Debug information

use std::io::Write;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tactics_core::prelude::BattleEvent;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use tactics_headless::{
    ascii::{render_board, render_roster},
    protocol::Response,
    runner::{play, run_match, verify, RunConfig},
    scenario::Scenario,
};

#[derive(Parser)]
#[command(name = "tactics_headless")]
#[command(about = "Headless tactics match runner for scripted play and CI")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Play interactively over stdin/stdout
    Play {
        /// Scenario file to load (built-in skirmish if omitted)
        #[arg(short, long)]
        scenario: Option<PathBuf>,
    },

    /// Play a match to the end with every side automated, printing events
    /// and a final summary as JSON lines
    Run {
        /// Scenario file to load (built-in skirmish if omitted)
        #[arg(short, long)]
        scenario: Option<PathBuf>,

        /// Override the scenario's turn cap
        #[arg(long)]
        max_turns: Option<u32>,

        /// Print the board to stderr after every turn
        #[arg(long)]
        ascii: bool,
    },

    /// Run the same match several times and compare final hashes
    Verify {
        /// Scenario file to load (built-in skirmish if omitted)
        #[arg(short, long)]
        scenario: Option<PathBuf>,

        /// Number of runs to compare
        #[arg(short, long, default_value = "3")]
        runs: usize,
    },

    /// Print a scenario's starting board
    Board {
        /// Scenario file to load (built-in skirmish if omitted)
        #[arg(short, long)]
        scenario: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging to stderr (stdout is for protocol)
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true),
        )
        .with(filter)
        .init();

    match cli.command {
        Some(Commands::Play { scenario }) => cmd_play(scenario),
        Some(Commands::Run {
            scenario,
            max_turns,
            ascii,
        }) => cmd_run(scenario, max_turns, ascii),
        Some(Commands::Verify { scenario, runs }) => cmd_verify(scenario, runs),
        Some(Commands::Board { scenario }) => cmd_board(scenario),
        None => {
            // Default: interactive mode
            cmd_play(None);
        }
    }
}

/// Load a scenario file, or the built-in skirmish.
fn load_scenario(path: Option<PathBuf>) -> Scenario {
    let Some(path) = path else {
        return Scenario::skirmish();
    };
    match Scenario::load(&path) {
        Ok(scenario) => {
            tracing::info!("Loaded scenario '{}' from {}", scenario.name, path.display());
            scenario
        }
        Err(e) => {
            eprintln!("Failed to load scenario: {e}");
            std::process::exit(1);
        }
    }
}

/// Interactive session on stdin/stdout
fn cmd_play(scenario: Option<PathBuf>) {
    let scenario = load_scenario(scenario);
    tracing::info!("Starting interactive session: {}", scenario.name);

    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    if let Err(e) = play(&scenario, stdin.lock(), stdout.lock()) {
        eprintln!("Session failed: {e}");
        std::process::exit(1);
    }
}

/// Automated match
fn cmd_run(scenario: Option<PathBuf>, max_turns: Option<u32>, ascii: bool) {
    let scenario = load_scenario(scenario);
    let config = RunConfig {
        max_turns,
        ..RunConfig::default()
    };

    let mut stdout = std::io::stdout().lock();
    let result = run_match(&scenario, &config, |event, orchestrator| {
        let line = Response::Event { event: event.clone() }.to_json_line();
        if let Err(e) = stdout.write_all(line.as_bytes()) {
            tracing::warn!("Failed to write event: {e}");
        }
        if !ascii {
            return;
        }
        match event {
            BattleEvent::TurnStarted { side, turn } => {
                eprintln!("-- turn {turn}: side {} --", side.0);
                eprint!("{}", render_board(orchestrator.battle(), None));
            }
            BattleEvent::MatchOver { .. } => {
                eprint!("{}", render_board(orchestrator.battle(), None));
                eprint!("{}", render_roster(orchestrator.battle()));
            }
            _ => {}
        }
    });

    let summary = match result {
        Ok(summary) => summary,
        Err(e) => {
            eprintln!("Failed to run scenario: {e}");
            std::process::exit(1);
        }
    };

    match serde_json::to_string(&summary) {
        Ok(json) => {
            if let Err(e) = writeln!(stdout, "{json}") {
                eprintln!("Failed to write summary: {e}");
                std::process::exit(1);
            }
        }
        Err(e) => {
            eprintln!("Failed to serialize summary: {e}");
            std::process::exit(1);
        }
    }

    if !summary.finished {
        eprintln!("FAIL: match did not finish within {} turns", summary.turns);
        std::process::exit(1);
    }
}

/// Determinism check
fn cmd_verify(scenario: Option<PathBuf>, runs: usize) {
    let scenario = load_scenario(scenario);
    tracing::info!("Verifying determinism: {} ({} runs)", scenario.name, runs);

    let hashes = match verify(&scenario, &RunConfig::default(), runs) {
        Ok(hashes) => hashes,
        Err(e) => {
            eprintln!("Failed to run scenario: {e}");
            std::process::exit(1);
        }
    };

    if hashes.windows(2).all(|w| w[0] == w[1]) {
        eprintln!("PASS: All {runs} runs produced identical results");
        if let Some(hash) = hashes.first() {
            eprintln!("  Final hash: {hash:016x}");
        }
    } else {
        eprintln!("FAIL: Non-determinism detected!");
        for (run, hash) in hashes.iter().enumerate() {
            eprintln!("  run {run}: {hash:016x}");
        }
        std::process::exit(1);
    }
}

/// Starting board
fn cmd_board(scenario: Option<PathBuf>) {
    let scenario = load_scenario(scenario);
    match scenario.orchestrator() {
        Ok(orchestrator) => {
            print!("{}", render_board(orchestrator.battle(), Some(orchestrator.cursor())));
            print!("{}", render_roster(orchestrator.battle()));
        }
        Err(e) => {
            eprintln!("Failed to build scenario: {e}");
            std::process::exit(1);
        }
    }
}
