//! Outbound events for the presentation layer.
//!
//! The orchestrator never calls into rendering code. It pushes
//! [`BattleEvent`]s onto a queue that the frame loop drains once per tick.

use serde::{Deserialize, Serialize};

use crate::action_state::ActionKind;
use crate::actor::{ActorId, SideId};
use crate::command::CommandKind;
use crate::footprint::Pose;
use crate::grid::CellCoord;
use crate::replay::VisualPose;

/// A cell offered as a target for a pending action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActionSpace {
    /// Target cell.
    pub cell: CellCoord,
    /// Command confirming this space dispatches.
    pub command: CommandKind,
    /// Shown but not selectable.
    pub invalid: bool,
}

/// Coarse focus state, for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FocusKind {
    /// Free cursor.
    Neutral,
    /// A menu owns navigation.
    Menu,
    /// An actor is building a path.
    PathConstruction,
}

/// Something the presentation layer may want to show.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum BattleEvent {
    /// Cursor moved.
    CursorMoved {
        /// New cursor cell.
        cell: CellCoord,
    },
    /// Selection changed.
    SelectionChanged {
        /// Newly selected actor, if any.
        actor: Option<ActorId>,
    },
    /// Action spaces for an actor should be highlighted.
    ActionSpacesShown {
        /// Owner of the spaces.
        actor: ActorId,
        /// Spaces in deterministic order.
        spaces: Vec<ActionSpace>,
    },
    /// Any highlighted spaces for an actor should be removed.
    ActionSpacesCleared {
        /// Owner of the spaces.
        actor: ActorId,
    },
    /// A human-controlled actor awaits a menu choice.
    DecisionPending {
        /// Actor to decide for.
        actor: ActorId,
        /// Actions currently available.
        available: Vec<ActionKind>,
    },
    /// The path being built changed.
    PathUpdated {
        /// Actor building the path.
        actor: ActorId,
        /// Pose at the end of the path so far.
        destination: Pose,
        /// Steps excluding the origin.
        steps: usize,
        /// Movement budget still available.
        remaining: u32,
    },
    /// Interpolated pose of a replaying actor.
    ActorPose {
        /// Moving actor.
        actor: ActorId,
        /// Pose to draw this tick.
        pose: VisualPose,
    },
    /// A replay finished and the actor rests at its destination.
    MoveFinished {
        /// Moved actor.
        actor: ActorId,
        /// Final authoritative pose.
        destination: Pose,
    },
    /// An attack landed.
    AttackResolved {
        /// Attacking actor.
        attacker: ActorId,
        /// Damaged actor.
        target: ActorId,
        /// Damage dealt.
        damage: u32,
        /// Target health afterwards.
        remaining_health: u32,
    },
    /// An actor died and left the grid.
    ActorDefeated {
        /// Dead actor.
        actor: ActorId,
    },
    /// A command finished and its continuations ran.
    CommandCompleted {
        /// Acting actor.
        actor: ActorId,
        /// Which command.
        command: CommandKind,
    },
    /// Marker raised by a `Signal` continuation.
    Signal {
        /// Actor of the originating payload.
        actor: ActorId,
        /// Caller-chosen marker.
        marker: u32,
    },
    /// Focus state changed.
    FocusChanged {
        /// New focus.
        focus: FocusKind,
    },
    /// Turn announcement. Input stays locked until it completes.
    TurnBanner {
        /// Incoming side.
        side: SideId,
        /// Incoming side's label.
        label: String,
        /// Turn number.
        turn: u32,
    },
    /// The new side may act.
    TurnStarted {
        /// Active side.
        side: SideId,
        /// Turn number.
        turn: u32,
    },
    /// Only one side (or none) has live actors left.
    MatchOver {
        /// Surviving side.
        winner: Option<SideId>,
    },
}
