//! Tick-driven playback of a committed path.
//!
//! A [`PathReplay`] walks the steps of a [`Path`] one at a time, spending
//! `step_ticks` ticks on each. Between ticks it reports an interpolated
//! [`VisualPose`] for the presentation layer; the authoritative pose only
//! changes when a step completes, and the caller applies that change to the
//! grid in one piece. Playback cannot be cancelled once started.

use serde::{Deserialize, Serialize};

use crate::actor::ActorId;
use crate::footprint::Pose;
use crate::math::{fixed_serde, lerp, progress, Fixed, Vec2Fixed};
use crate::path::{Path, PathStep, StepKind};

/// Interpolated pose for drawing a moving actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VisualPose {
    /// Pivot position in board space.
    pub position: Vec2Fixed,
    /// Facing in quarter turns. May leave `0..4` mid-turn (3 to 4, say).
    #[serde(with = "fixed_serde")]
    pub facing: Fixed,
}

impl VisualPose {
    /// Resting visual pose for an authoritative pose.
    #[must_use]
    pub fn at_rest(pose: Pose) -> Self {
        Self {
            position: Vec2Fixed::from_cell(pose.cell),
            facing: Fixed::from_num(pose.rotation.quarter_turns()),
        }
    }

    fn between(step: &PathStep, t: Fixed) -> Self {
        let from = Self::at_rest(step.from);
        let turn = match step.kind {
            StepKind::Rotate(delta) => Fixed::from_num(delta),
            StepKind::Origin | StepKind::Translate(_) => Fixed::ZERO,
        };
        Self {
            position: from.position.lerp(Vec2Fixed::from_cell(step.to.cell), t),
            facing: lerp(from.facing, from.facing + turn, t),
        }
    }
}

/// Result of advancing playback by one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplayTick {
    /// Mid-step; only the visual pose moved.
    InProgress(VisualPose),
    /// A step finished; its `to` pose is now authoritative.
    StepCompleted(PathStep),
    /// Nothing left to play.
    Finished,
}

/// Playback cursor over a committed path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathReplay {
    actor: ActorId,
    path: Path,
    step_ticks: u32,
    index: usize,
    elapsed: u32,
}

impl PathReplay {
    /// Start playback of `path` for `actor`.
    #[must_use]
    pub fn new(actor: ActorId, path: Path, step_ticks: u32) -> Self {
        Self {
            actor,
            path,
            step_ticks,
            index: 0,
            elapsed: 0,
        }
    }

    /// Actor being moved.
    #[must_use]
    pub const fn actor(&self) -> ActorId {
        self.actor
    }

    /// The path being played.
    #[must_use]
    pub const fn path(&self) -> &Path {
        &self.path
    }

    /// Steps completed so far.
    #[must_use]
    pub const fn completed_steps(&self) -> usize {
        self.index
    }

    /// True once every step has been applied.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.index >= self.path.len()
    }

    /// Current interpolated pose.
    #[must_use]
    pub fn visual_pose(&self) -> VisualPose {
        match self.path.steps().get(self.index) {
            Some(step) => VisualPose::between(step, progress(self.elapsed, self.step_ticks)),
            None => VisualPose::at_rest(self.path.destination()),
        }
    }

    /// Advance one tick.
    pub fn advance(&mut self) -> ReplayTick {
        let Some(step) = self.path.steps().get(self.index).copied() else {
            return ReplayTick::Finished;
        };
        self.elapsed += 1;
        if self.elapsed >= self.step_ticks {
            self.index += 1;
            self.elapsed = 0;
            tracing::trace!(actor = %self.actor, step = self.index, cell = %step.to.cell, "replay step completed");
            return ReplayTick::StepCompleted(step);
        }
        ReplayTick::InProgress(self.visual_pose())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action_state::ActionState;
    use crate::actor::{Actor, ActorStats, SideId};
    use crate::footprint::{Footprint, Rotation};
    use crate::grid::{CellCoord, Direction, Grid, MovementClass, TraversalWeights};
    use crate::path::PathSession;

    fn walker() -> Actor {
        Actor {
            id: ActorId(3),
            side: SideId(0),
            name: "walker".to_string(),
            pose: Pose::new(CellCoord::new(1, 1), Rotation::IDENTITY),
            footprint: Footprint::single(),
            movement_class: MovementClass::Ground,
            stats: ActorStats::default(),
            health: 10,
            dead: false,
            actions: ActionState::default(),
        }
    }

    fn two_step_path() -> Path {
        let grid = Grid::new(6, 6, TraversalWeights::default()).unwrap();
        let mut session = PathSession::begin(&walker());
        assert!(session.append_translate(&grid, Direction::Right));
        assert!(session.append_rotate(&grid, false));
        session.commit()
    }

    #[test]
    fn test_steps_complete_every_step_ticks() {
        let mut replay = PathReplay::new(ActorId(3), two_step_path(), 4);
        let mut completed = Vec::new();
        for _ in 0..8 {
            if let ReplayTick::StepCompleted(step) = replay.advance() {
                completed.push(step.to);
            }
        }
        assert_eq!(completed.len(), 2);
        assert_eq!(completed[0].cell, CellCoord::new(2, 1));
        assert_eq!(completed[1].rotation, Rotation::from_quarter_turns(3));
        assert!(replay.is_finished());
        assert_eq!(replay.advance(), ReplayTick::Finished);
    }

    #[test]
    fn test_midpoint_interpolation() {
        let mut replay = PathReplay::new(ActorId(3), two_step_path(), 4);
        replay.advance();
        let ReplayTick::InProgress(pose) = replay.advance() else {
            panic!("expected in-progress tick");
        };
        assert_eq!(pose.position.x, Fixed::from_num(1.5));
        assert_eq!(pose.position.y, Fixed::ONE);
        assert_eq!(pose.facing, Fixed::ZERO);
    }

    #[test]
    fn test_rotation_interpolates_facing() {
        let mut replay = PathReplay::new(ActorId(3), two_step_path(), 2);
        replay.advance();
        replay.advance();
        let ReplayTick::InProgress(pose) = replay.advance() else {
            panic!("expected in-progress tick");
        };
        assert_eq!(pose.facing, Fixed::from_num(-0.5));
    }

    #[test]
    fn test_zero_step_ticks_completes_each_advance() {
        let mut replay = PathReplay::new(ActorId(3), two_step_path(), 0);
        assert!(matches!(replay.advance(), ReplayTick::StepCompleted(_)));
        assert!(matches!(replay.advance(), ReplayTick::StepCompleted(_)));
        assert_eq!(replay.advance(), ReplayTick::Finished);
    }

    #[test]
    fn test_empty_path_is_finished() {
        let origin = Pose::new(CellCoord::new(2, 2), Rotation::IDENTITY);
        let mut replay = PathReplay::new(ActorId(0), Path::stationary(origin), 3);
        assert!(replay.is_finished());
        assert_eq!(replay.visual_pose(), VisualPose::at_rest(origin));
        assert_eq!(replay.advance(), ReplayTick::Finished);
    }
}
