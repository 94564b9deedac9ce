//! Commands and the payloads that carry them.
//!
//! Every battlefield interaction goes through a [`CommandPayload`]: who acts,
//! optionally on which cell, what they do, and what should happen after the
//! command completes. Payloads are built per dispatch and consumed once by
//! the orchestrator.

use serde::{Deserialize, Serialize};

use crate::action_state::ActionKind;
use crate::actor::ActorId;
use crate::grid::CellCoord;
use crate::path::Path;

/// The closed set of commands an actor can be given.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    /// Surface reachable pivot cells for display.
    GenerateMoveSpaces,
    /// Open a path construction session.
    InitializeMove,
    /// Replay a committed path, then mark Move performed.
    Move {
        /// Path produced by a committed session.
        path: Path,
    },
    /// Preview cells within attack range. Every space is flagged invalid.
    GenerateAttackSpaces,
    /// Surface attack targets; hostile-occupied cells are valid.
    InitializeAttack,
    /// Damage the occupant of the payload's target cell.
    Attack,
    /// Drop the actor's action-space display or open session.
    Cancel,
    /// Cancel and also drop the selection.
    Revert,
    /// Force every action performed.
    EndTurn,
}

impl Command {
    /// Fieldless tag of this command.
    #[must_use]
    pub const fn kind(&self) -> CommandKind {
        match self {
            Self::GenerateMoveSpaces => CommandKind::GenerateMoveSpaces,
            Self::InitializeMove => CommandKind::InitializeMove,
            Self::Move { .. } => CommandKind::Move,
            Self::GenerateAttackSpaces => CommandKind::GenerateAttackSpaces,
            Self::InitializeAttack => CommandKind::InitializeAttack,
            Self::Attack => CommandKind::Attack,
            Self::Cancel => CommandKind::Cancel,
            Self::Revert => CommandKind::Revert,
            Self::EndTurn => CommandKind::EndTurn,
        }
    }

    /// Command that opens `action` for a freshly selected actor.
    #[must_use]
    pub const fn initialize(action: ActionKind) -> Self {
        match action {
            ActionKind::Move => Self::InitializeMove,
            ActionKind::Attack => Self::InitializeAttack,
        }
    }
}

/// Tag of a [`Command`] without its data. Used in events and action spaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandKind {
    /// See [`Command::GenerateMoveSpaces`].
    GenerateMoveSpaces,
    /// See [`Command::InitializeMove`].
    InitializeMove,
    /// See [`Command::Move`].
    Move,
    /// See [`Command::GenerateAttackSpaces`].
    GenerateAttackSpaces,
    /// See [`Command::InitializeAttack`].
    InitializeAttack,
    /// See [`Command::Attack`].
    Attack,
    /// See [`Command::Cancel`].
    Cancel,
    /// See [`Command::Revert`].
    Revert,
    /// See [`Command::EndTurn`].
    EndTurn,
}

/// Work to run after a command completes, in registration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Continuation {
    /// Drop the current selection.
    ClearSelection,
    /// Offer the actor's remaining actions again.
    Reselect,
    /// Surface a marker event to the frame loop.
    Signal(u32),
    /// Dispatch a follow-up payload.
    Then(Box<CommandPayload>),
}

/// One dispatch: actor, optional target cell, command and continuations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandPayload {
    /// Acting actor.
    pub actor: ActorId,
    /// Target cell, where the command needs one.
    pub target: Option<CellCoord>,
    /// What to do.
    pub command: Command,
    /// Run in order after completion.
    #[serde(default)]
    pub continuations: Vec<Continuation>,
}

impl CommandPayload {
    /// Payload with no target and no continuations.
    #[must_use]
    pub const fn new(actor: ActorId, command: Command) -> Self {
        Self {
            actor,
            target: None,
            command,
            continuations: Vec::new(),
        }
    }

    /// Set the target cell.
    #[must_use]
    pub fn with_target(mut self, target: CellCoord) -> Self {
        self.target = Some(target);
        self
    }

    /// Append a continuation.
    #[must_use]
    pub fn then(mut self, continuation: Continuation) -> Self {
        self.continuations.push(continuation);
        self
    }

    /// Tag of the carried command.
    #[must_use]
    pub const fn kind(&self) -> CommandKind {
        self.command.kind()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_keeps_order() {
        let payload = CommandPayload::new(ActorId(1), Command::Attack)
            .with_target(CellCoord::new(2, 3))
            .then(Continuation::Signal(7))
            .then(Continuation::ClearSelection);
        assert_eq!(payload.target, Some(CellCoord::new(2, 3)));
        assert_eq!(
            payload.continuations,
            vec![Continuation::Signal(7), Continuation::ClearSelection]
        );
        assert_eq!(payload.kind(), CommandKind::Attack);
    }

    #[test]
    fn test_initialize_maps_actions() {
        assert_eq!(Command::initialize(ActionKind::Move), Command::InitializeMove);
        assert_eq!(Command::initialize(ActionKind::Attack), Command::InitializeAttack);
    }

    #[test]
    fn test_payload_ron_defaults_continuations() {
        let payload: CommandPayload =
            ron::from_str("(actor: (4), target: None, command: end_turn)").unwrap();
        assert_eq!(payload, CommandPayload::new(ActorId(4), Command::EndTurn));
    }
}
