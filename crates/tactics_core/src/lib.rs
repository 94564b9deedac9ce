//! # Tactics Core
//!
//! Deterministic turn-based grid tactics engine.
//!
//! This crate contains **only** game logic:
//! - No rendering
//! - No input polling (inputs arrive as [`orchestrator::InputEvent`]s)
//! - No randomness
//! - No floating-point math (visual poses use fixed-point)
//!
//! The same inputs always produce the same state, so matches can be run
//! headless, replayed and checked for determinism.
//!
//! ## Crate Structure
//!
//! - [`grid`] - Cells, terrain weights and occupancy
//! - [`footprint`] - Rotation-aware multi-cell bodies
//! - [`path`] - Interactive path construction with undo
//! - [`replay`] - Tick-driven playback of committed paths
//! - [`battle`] - Grid, actors and turn order in one context
//! - [`orchestrator`] - Input, commands, continuations and turn handoff
//! - [`ai`] - Built-in automated policy

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod action_state;
pub mod actor;
pub mod ai;
pub mod battle;
pub mod command;
pub mod config;
pub mod decision;
pub mod error;
pub mod events;
pub mod footprint;
pub mod grid;
pub mod math;
pub mod orchestrator;
pub mod path;
pub mod replay;
pub mod turn;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::action_state::{ActionKind, ActionState};
    pub use crate::actor::{Actor, ActorId, ActorStats, SideId};
    pub use crate::ai::AdvancePolicy;
    pub use crate::battle::{ActorSpawn, AttackOutcome, Battle, MoveSpaces};
    pub use crate::command::{Command, CommandKind, CommandPayload, Continuation};
    pub use crate::config::{
        ActorConfig, Controller, GridConfig, MatchConfig, PresentationMode, SideConfig,
        TimingConfig,
    };
    pub use crate::decision::{Decision, DecisionDelegate, DecisionRequest, MenuChoice, MenuDelegate};
    pub use crate::error::{Result, TacticsError};
    pub use crate::events::{ActionSpace, BattleEvent, FocusKind};
    pub use crate::footprint::{Footprint, Pose, Rotation};
    pub use crate::grid::{CellCoord, Direction, Grid, MovementClass, Passability, TraversalWeights};
    pub use crate::math::{Fixed, Vec2Fixed};
    pub use crate::orchestrator::{ActivityKind, Button, Focus, InputEvent, Orchestrator};
    pub use crate::path::{Path, PathSession, PathStep, StepKind};
    pub use crate::replay::{PathReplay, ReplayTick, VisualPose};
    pub use crate::turn::{Handoff, SideRoster, TurnTracker};
}
