//! JSON-lines protocol for interactive headless play.
//!
//! **Input (stdin):** one [`Request`] per line, tagged by `input`
//! **Output (stdout):** one [`Response`] per line, tagged by `type`
//!
//! # Protocol Flow
//!
//! 1. Runner starts, outputs `{"type":"ready","version":"1.0","tick":0}`
//! 2. Controller sends inputs; each is applied as one tick (or answered
//!    directly for menu choices, presentation signals and queries)
//! 3. Runner echoes every [`BattleEvent`] raised, then acknowledges
//! 4. When the match ends it outputs `{"type":"match_over",...}`
//!
//! # Example Session
//!
//! ```text
//! <- {"type":"ready","version":"1.0","tick":0}
//! -> {"input":"confirm"}
//! <- {"type":"event","event":{"event":"selection_changed","actor":0}}
//! <- {"type":"event","event":{"event":"decision_pending","actor":0,"available":["move"]}}
//! <- {"type":"ack","input":"confirm"}
//! -> {"input":"choose","action":"move"}
//! -> {"input":"direction","dir":"right"}
//! -> {"input":"confirm"}
//! -> {"input":"tick","count":12}
//! ```

use serde::{Deserialize, Serialize};
use tactics_core::prelude::*;

// ============================================================================
// Input (controller -> runner)
// ============================================================================

/// One line of controller input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "input", rename_all = "snake_case")]
pub enum Request {
    /// Accept.
    Confirm,
    /// Back out.
    Reverse,
    /// Open the menu.
    OpenMenu,
    /// Turn in place; positive is clockwise.
    Rotate {
        #[serde(default = "default_sign")]
        sign: i8,
    },
    /// Move the cursor or extend a path.
    Direction { dir: Direction },
    /// Answer the pending menu decision.
    Choose { action: ChoiceName },
    /// Signal that an attack presentation or turn banner finished.
    PresentationComplete,
    /// Advance without input.
    Tick {
        #[serde(default = "default_tick_count")]
        count: u32,
    },
    /// Report the current state.
    Query,
    /// Report the state hash.
    Hash,
    /// Render the board as text.
    Board,
    /// End the session.
    Quit,
}

/// Menu entries by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChoiceName {
    /// Start moving.
    Move,
    /// Start attacking.
    Attack,
    /// Skip the rest of the turn.
    Wait,
}

impl From<ChoiceName> for MenuChoice {
    fn from(name: ChoiceName) -> Self {
        match name {
            ChoiceName::Move => Self::Action(ActionKind::Move),
            ChoiceName::Attack => Self::Action(ActionKind::Attack),
            ChoiceName::Wait => Self::Wait,
        }
    }
}

fn default_sign() -> i8 {
    1
}

fn default_tick_count() -> u32 {
    1
}

impl Request {
    /// Parse from a JSON line.
    ///
    /// # Errors
    /// Returns the JSON error if the line is not a valid request.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Request name for acknowledgment.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Confirm => "confirm",
            Self::Reverse => "reverse",
            Self::OpenMenu => "open_menu",
            Self::Rotate { .. } => "rotate",
            Self::Direction { .. } => "direction",
            Self::Choose { .. } => "choose",
            Self::PresentationComplete => "presentation_complete",
            Self::Tick { .. } => "tick",
            Self::Query => "query",
            Self::Hash => "hash",
            Self::Board => "board",
            Self::Quit => "quit",
        }
    }

    /// The input event this request feeds to a tick, if it is one.
    #[must_use]
    pub fn input_event(&self) -> Option<InputEvent> {
        match self {
            Self::Confirm => Some(InputEvent::button(Button::Confirm)),
            Self::Reverse => Some(InputEvent::button(Button::Reverse)),
            Self::OpenMenu => Some(InputEvent::button(Button::OpenMenu)),
            Self::Rotate { sign } => Some(InputEvent::button(Button::Rotate(*sign))),
            Self::Direction { dir } => Some(InputEvent::direction(*dir)),
            _ => None,
        }
    }
}

// ============================================================================
// Output (runner -> controller)
// ============================================================================

/// One line of runner output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    /// Runner is ready to accept input.
    Ready { version: String, tick: u64 },
    /// A battle event raised while handling the last request.
    Event { event: BattleEvent },
    /// Request handled.
    Ack { input: String },
    /// Request understood but refused by the engine.
    Rejected { input: String },
    /// Request could not be parsed or handled.
    Error { message: String },
    /// Current state.
    State(StateReport),
    /// State hash for determinism checks.
    StateHash { tick: u64, hash: u64 },
    /// Text rendering of the board.
    Board { text: String },
    /// The match ended.
    MatchOver { winner: Option<SideId>, turn: u32, ticks: u64 },
    /// Goodbye message before shutdown.
    Bye,
}

/// Snapshot of orchestrator and actor state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateReport {
    /// Ticks processed.
    pub tick: u64,
    /// Turn number.
    pub turn: u32,
    /// Side whose turn it is.
    pub active_side: SideId,
    /// What owns input.
    pub focus: FocusKind,
    /// What the orchestrator is busy with.
    pub activity: ActivityKind,
    /// Cursor cell.
    pub cursor: CellCoord,
    /// Selected actor.
    pub selection: Option<ActorId>,
    /// Every actor.
    pub actors: Vec<ActorReport>,
    /// State hash.
    pub hash: u64,
}

/// One actor in a [`StateReport`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorReport {
    /// Actor id.
    pub id: ActorId,
    /// Display name.
    pub name: String,
    /// Owning side.
    pub side: SideId,
    /// Pivot cell.
    pub cell: CellCoord,
    /// Quarter turns clockwise.
    pub rotation: u8,
    /// Current health.
    pub health: u32,
    /// Removed from play.
    pub dead: bool,
    /// No actions left this turn.
    pub spent: bool,
}

impl StateReport {
    /// Snapshot `orchestrator`.
    #[must_use]
    pub fn capture(orchestrator: &Orchestrator) -> Self {
        let battle = orchestrator.battle();
        Self {
            tick: orchestrator.ticks(),
            turn: battle.turns().turn(),
            active_side: battle.turns().active_side(),
            focus: orchestrator.focus().kind(),
            activity: orchestrator.activity(),
            cursor: orchestrator.cursor(),
            selection: orchestrator.selection(),
            actors: battle
                .actors()
                .iter()
                .map(|actor| ActorReport {
                    id: actor.id,
                    name: actor.name.clone(),
                    side: actor.side,
                    cell: actor.pose.cell,
                    rotation: actor.pose.rotation.quarter_turns(),
                    health: actor.health,
                    dead: !actor.is_alive(),
                    spent: actor.actions.is_spent(),
                })
                .collect(),
            hash: orchestrator.state_hash(),
        }
    }
}

impl Response {
    /// Create a ready response.
    #[must_use]
    pub fn ready(tick: u64) -> Self {
        Self::Ready {
            version: "1.0".to_string(),
            tick,
        }
    }

    /// Create an acknowledgment.
    #[must_use]
    pub fn ack(input: &str) -> Self {
        Self::Ack {
            input: input.to_string(),
        }
    }

    /// Create a rejection.
    #[must_use]
    pub fn rejected(input: &str) -> Self {
        Self::Rejected {
            input: input.to_string(),
        }
    }

    /// Create an error response.
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    /// Serialize to JSON line (with newline).
    #[must_use]
    pub fn to_json_line(&self) -> String {
        let mut json = serde_json::to_string(self)
            .unwrap_or_else(|e| format!(r#"{{"type":"error","message":"Serialization failed: {e}"}}"#));
        json.push('\n');
        json
    }
}
