//! Decision delegates: who picks a command for a selected actor.
//!
//! The orchestrator hands a [`DecisionRequest`] to the delegate registered
//! for the actor's side. A delegate either answers at once with a payload or
//! defers to a menu, which later answers through
//! [`crate::orchestrator::Orchestrator::choose`].

use serde::{Deserialize, Serialize};

use crate::action_state::ActionKind;
use crate::actor::ActorId;
use crate::battle::Battle;
use crate::command::{Command, CommandPayload};
use crate::grid::CellCoord;

/// What the delegate is asked to decide about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecisionRequest {
    /// Actor to act.
    pub actor: ActorId,
    /// Cell the selection was made on.
    pub target: CellCoord,
    /// Actions currently available, in menu order.
    pub available: Vec<ActionKind>,
}

/// A delegate's answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Dispatch this payload now.
    Command(CommandPayload),
    /// A menu will answer later.
    Deferred,
}

/// Source of commands for one side.
pub trait DecisionDelegate {
    /// Pick a command for the requested actor.
    fn decide(&mut self, request: &DecisionRequest, battle: &Battle) -> Decision;

    /// True if the orchestrator should drive this side's turn by polling the
    /// delegate whenever it is idle.
    fn drives_turn(&self) -> bool {
        false
    }
}

/// Human control: every decision goes through the menu.
#[derive(Debug, Clone, Copy, Default)]
pub struct MenuDelegate;

impl DecisionDelegate for MenuDelegate {
    fn decide(&mut self, request: &DecisionRequest, _battle: &Battle) -> Decision {
        tracing::debug!(actor = %request.actor, available = ?request.available, "decision deferred to menu");
        Decision::Deferred
    }
}

/// An entry picked from the action menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MenuChoice {
    /// Start one of the available actions.
    Action(ActionKind),
    /// Skip the rest of this actor's turn.
    Wait,
}

impl MenuChoice {
    /// Command the choice dispatches.
    #[must_use]
    pub const fn command(self) -> Command {
        match self {
            Self::Action(kind) => Command::initialize(kind),
            Self::Wait => Command::EndTurn,
        }
    }
}
