//! Headless match runner.
//!
//! Two ways to drive a match without a renderer:
//!
//! - [`run_match`] plays a scenario to the end with every side automated,
//!   signalling presentation completion itself when the timing asks for it.
//! - [`PlaySession`] / [`play`] apply [`Request`]s one at a time and answer
//!   with [`Response`]s, for a controller on the other end of a pipe.

use std::io::{self, BufRead, Write};

use serde::{Deserialize, Serialize};
use tactics_core::prelude::*;

use crate::ascii::render_board;
use crate::protocol::{Request, Response, StateReport};
use crate::scenario::{Scenario, ScenarioError};

/// Limits for an automated run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunConfig {
    /// Abandon the run once this turn number is passed. Overrides the
    /// scenario's own cap when set.
    pub max_turns: Option<u32>,
    /// Hard tick cap.
    pub max_ticks: u64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            max_turns: None,
            max_ticks: 100_000,
        }
    }
}

/// Result of an automated run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchSummary {
    /// Scenario name.
    pub scenario: String,
    /// True if the match reached an outcome before a cap.
    pub finished: bool,
    /// Surviving side, if the match finished with one.
    pub winner: Option<SideId>,
    /// Turn number at the end.
    pub turns: u32,
    /// Turn handoffs performed.
    pub handoffs: u32,
    /// Ticks simulated.
    pub ticks: u64,
    /// Final state hash.
    pub hash: u64,
}

/// Play `scenario` with every side automated until it ends or hits a cap.
///
/// `on_event` sees every [`BattleEvent`] in the order it was raised, along
/// with the orchestrator as it stands after the tick that raised it.
pub fn run_match<F>(scenario: &Scenario, config: &RunConfig, mut on_event: F) -> Result<MatchSummary, ScenarioError>
where
    F: FnMut(&BattleEvent, &Orchestrator),
{
    let max_turns = config.max_turns.unwrap_or(scenario.max_turns);
    let signalled = scenario.config.timing.presentation == PresentationMode::Signalled;
    let mut orchestrator = scenario.automated().orchestrator()?;

    tracing::info!(scenario = %scenario.name, max_turns, "starting automated run");
    loop {
        for event in orchestrator.drain_events() {
            on_event(&event, &orchestrator);
        }
        if orchestrator.outcome().is_some()
            || orchestrator.battle().turns().turn() > max_turns
            || orchestrator.ticks() >= config.max_ticks
        {
            break;
        }
        let waiting = matches!(
            orchestrator.activity(),
            ActivityKind::AwaitingAttack | ActivityKind::PassingTurn
        );
        if signalled && waiting {
            orchestrator.presentation_complete();
        }
        orchestrator.tick(None);
    }

    let turns = orchestrator.battle().turns();
    let summary = MatchSummary {
        scenario: scenario.name.clone(),
        finished: orchestrator.outcome().is_some(),
        winner: orchestrator.outcome().flatten(),
        turns: turns.turn(),
        handoffs: turns.handoffs(),
        ticks: orchestrator.ticks(),
        hash: orchestrator.state_hash(),
    };
    if summary.finished {
        tracing::info!(winner = ?summary.winner, turns = summary.turns, ticks = summary.ticks, "match finished");
    } else {
        tracing::warn!(turns = summary.turns, ticks = summary.ticks, "run hit its cap before an outcome");
    }
    Ok(summary)
}

/// Run `scenario` `runs` times and return each final hash.
pub fn verify(scenario: &Scenario, config: &RunConfig, runs: usize) -> Result<Vec<u64>, ScenarioError> {
    let mut hashes = Vec::with_capacity(runs);
    for run in 0..runs {
        let summary = run_match(scenario, config, |_, _| {})?;
        tracing::debug!(run, hash = summary.hash, "verification run complete");
        hashes.push(summary.hash);
    }
    Ok(hashes)
}

// ============================================================================
// Interactive play
// ============================================================================

/// One interactive match driven by [`Request`]s.
pub struct PlaySession {
    orchestrator: Orchestrator,
    reported_outcome: bool,
}

impl PlaySession {
    /// Start a session for `scenario` with its configured controllers.
    pub fn new(scenario: &Scenario) -> Result<Self, ScenarioError> {
        Ok(Self {
            orchestrator: scenario.orchestrator()?,
            reported_outcome: false,
        })
    }

    /// The orchestrator being driven.
    #[must_use]
    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }

    /// Apply one request.
    ///
    /// Returns the responses in output order and whether the session should
    /// end.
    pub fn handle(&mut self, request: &Request) -> (Vec<Response>, bool) {
        let name = request.name();
        let mut responses = Vec::new();
        let mut quit = false;

        let reply = if let Some(input) = request.input_event() {
            self.orchestrator.tick(Some(input));
            Response::ack(name)
        } else {
            match request {
                Request::Choose { action } => {
                    let accepted = self.orchestrator.choose((*action).into());
                    self.accepted(name, accepted)
                }
                Request::PresentationComplete => {
                    let accepted = self.orchestrator.presentation_complete();
                    self.accepted(name, accepted)
                }
                Request::Tick { count } => {
                    for _ in 0..*count {
                        if self.orchestrator.outcome().is_some() {
                            break;
                        }
                        self.orchestrator.tick(None);
                    }
                    Response::ack(name)
                }
                Request::Query => Response::State(StateReport::capture(&self.orchestrator)),
                Request::Hash => Response::StateHash {
                    tick: self.orchestrator.ticks(),
                    hash: self.orchestrator.state_hash(),
                },
                Request::Board => Response::Board {
                    text: render_board(self.orchestrator.battle(), Some(self.orchestrator.cursor())),
                },
                Request::Quit => {
                    quit = true;
                    Response::Bye
                }
                Request::Confirm
                | Request::Reverse
                | Request::OpenMenu
                | Request::Rotate { .. }
                | Request::Direction { .. } => Response::error(format!("unhandled input: {name}")),
            }
        };

        responses.extend(
            self.orchestrator
                .drain_events()
                .into_iter()
                .map(|event| Response::Event { event }),
        );
        responses.push(reply);

        if !self.reported_outcome {
            if let Some(winner) = self.orchestrator.outcome() {
                self.reported_outcome = true;
                responses.push(Response::MatchOver {
                    winner,
                    turn: self.orchestrator.battle().turns().turn(),
                    ticks: self.orchestrator.ticks(),
                });
            }
        }
        (responses, quit)
    }

    fn accepted(&self, name: &str, accepted: bool) -> Response {
        if accepted {
            Response::ack(name)
        } else {
            tracing::debug!(input = name, tick = self.orchestrator.ticks(), "request rejected");
            Response::rejected(name)
        }
    }
}

/// Run an interactive session over `reader` and `writer` until `quit` or
/// end of input.
pub fn play<R: BufRead, W: Write>(scenario: &Scenario, reader: R, mut writer: W) -> Result<(), ScenarioError> {
    let mut session = PlaySession::new(scenario)?;

    // Events raised while opening the match (the first turn banner).
    let opening: Vec<Response> = session
        .orchestrator
        .drain_events()
        .into_iter()
        .map(|event| Response::Event { event })
        .collect();
    writer.write_all(Response::ready(session.orchestrator.ticks()).to_json_line().as_bytes())?;
    write_all(&mut writer, &opening)?;

    for line in reader.lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let (responses, quit) = match Request::from_json(line) {
            Ok(request) => {
                tracing::trace!(input = request.name(), "request");
                session.handle(&request)
            }
            Err(e) => (vec![Response::error(format!("Invalid request: {e}"))], false),
        };
        write_all(&mut writer, &responses)?;
        if quit {
            break;
        }
    }
    Ok(())
}

fn write_all<W: Write>(writer: &mut W, responses: &[Response]) -> io::Result<()> {
    for response in responses {
        writer.write_all(response.to_json_line().as_bytes())?;
    }
    writer.flush()
}
