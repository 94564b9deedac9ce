//! Headless match runner for scripted play and CI verification.
//!
//! This crate drives a [`tactics_core::orchestrator::Orchestrator`] without a
//! renderer. It supports:
//!
//! - **Scripted play**: a controller sends inputs as JSON lines on stdin and
//!   reads battle events back on stdout
//! - **Automated matches**: every side played by the built-in policy
//! - **Determinism checks**: the same scenario run repeatedly must end on
//!   the same state hash
//!
//! # Protocol
//!
//! Communication uses JSON lines (one JSON object per line):
//!
//! - **stdin**: Inputs from the controller (confirm, direction, choose, ...)
//! - **stdout**: Battle events and responses (JSON)
//! - **stderr**: Logs (human-readable)
//!
//! See the [`protocol`] module for the full request/response format.
//!
//! # Example
//!
//! ```bash
//! # Play interactively
//! echo '{"input":"confirm"}' | cargo run -p tactics_headless
//!
//! # Play a scenario to the end with every side automated
//! cargo run -p tactics_headless -- run --scenario scenarios/skirmish.ron
//!
//! # Verify determinism
//! cargo run -p tactics_headless -- verify --runs 5
//! ```

pub mod ascii;
pub mod protocol;
pub mod runner;
pub mod scenario;

pub use ascii::{render_board, render_roster};
pub use protocol::{Request, Response, StateReport};
pub use runner::{play, run_match, verify, MatchSummary, PlaySession, RunConfig};
pub use scenario::{Scenario, ScenarioError};
