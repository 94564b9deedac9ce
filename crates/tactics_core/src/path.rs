//! Interactive path construction.
//!
//! A [`PathSession`] builds a move one step at a time. Each append is
//! validated against the footprint model and the remaining movement budget;
//! a rejected append leaves the session untouched and returns `false` so the
//! input layer can refuse the key press. Pressing the exact opposite of the
//! previous step undoes it instead of appending.
//!
//! The first step of every session is a zero-cost `Origin` sentinel at the
//! actor's pose, so "the last step" is always defined. [`PathSession::commit`]
//! drops the sentinel and hands back a [`Path`] for replay.

use serde::{Deserialize, Serialize};

use crate::actor::{Actor, ActorId};
use crate::footprint::{Footprint, Pose};
use crate::grid::{Direction, Grid, MovementClass};

/// What a single path step does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    /// Session start; never part of a committed path.
    Origin,
    /// Move the pivot one cell.
    Translate(Direction),
    /// Turn in place by +1 (clockwise) or -1 quarter turn.
    Rotate(i8),
}

/// One discrete step with its before/after poses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PathStep {
    /// Translation, rotation or origin.
    pub kind: StepKind,
    /// Pose before the step.
    pub from: Pose,
    /// Pose after the step.
    pub to: Pose,
    /// Movement cost consumed through this step, inclusive.
    pub cumulative_cost: u32,
}

impl PathStep {
    fn origin(pose: Pose) -> Self {
        Self {
            kind: StepKind::Origin,
            from: pose,
            to: pose,
            cumulative_cost: 0,
        }
    }

    /// True if this step exactly cancels `kind`.
    fn undoes(&self, kind: StepKind) -> bool {
        match (self.kind, kind) {
            (StepKind::Translate(previous), StepKind::Translate(next)) => previous.reverse() == next,
            (StepKind::Rotate(previous), StepKind::Rotate(next)) => previous == -next,
            _ => false,
        }
    }
}

/// A committed, replayable step sequence.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Path {
    origin: Pose,
    steps: Vec<PathStep>,
}

impl Path {
    /// A path with no steps, standing still at `origin`.
    #[must_use]
    pub fn stationary(origin: Pose) -> Self {
        Self {
            origin,
            steps: Vec::new(),
        }
    }

    /// Pose the path starts from.
    #[must_use]
    pub const fn origin(&self) -> Pose {
        self.origin
    }

    /// Steps in replay order, sentinel excluded.
    #[must_use]
    pub fn steps(&self) -> &[PathStep] {
        &self.steps
    }

    /// Pose after the final step.
    #[must_use]
    pub fn destination(&self) -> Pose {
        self.steps.last().map_or(self.origin, |step| step.to)
    }

    /// Movement cost of the whole path.
    #[must_use]
    pub fn total_cost(&self) -> u32 {
        self.steps.last().map_or(0, |step| step.cumulative_cost)
    }

    /// Number of steps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// True if the path has no steps.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// True if `actor` could have built exactly this path on `grid`.
    ///
    /// The steps are fed through a fresh [`PathSession`], so every step must
    /// be adjacent, fit the footprint, stay within the move budget and carry
    /// the cumulative cost the session would have recorded.
    #[must_use]
    pub fn is_legal_for(&self, actor: &Actor, grid: &Grid) -> bool {
        if self.origin != actor.pose {
            return false;
        }
        let mut session = PathSession::begin(actor);
        for step in &self.steps {
            let accepted = match step.kind {
                StepKind::Translate(direction) => session.append_translate(grid, direction),
                StepKind::Rotate(1) => session.append_rotate(grid, true),
                StepKind::Rotate(-1) => session.append_rotate(grid, false),
                StepKind::Origin | StepKind::Rotate(_) => false,
            };
            if !accepted {
                return false;
            }
        }
        session.steps.len() == self.steps.len() + 1 && session.steps[1..] == self.steps[..]
    }
}

/// An in-progress move being built by one actor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathSession {
    actor: ActorId,
    footprint: Footprint,
    movement_class: MovementClass,
    budget: u32,
    steps: Vec<PathStep>,
}

impl PathSession {
    /// Start a session at the actor's current pose with its full move budget.
    #[must_use]
    pub fn begin(actor: &Actor) -> Self {
        tracing::trace!(actor = %actor.id, cell = %actor.pose.cell, "path session started");
        Self {
            actor: actor.id,
            footprint: actor.footprint.clone(),
            movement_class: actor.movement_class,
            budget: actor.stats.move_budget,
            steps: vec![PathStep::origin(actor.pose)],
        }
    }

    /// Actor building this path.
    #[must_use]
    pub const fn actor(&self) -> ActorId {
        self.actor
    }

    /// Total movement allowance.
    #[must_use]
    pub const fn budget(&self) -> u32 {
        self.budget
    }

    /// All steps including the origin sentinel.
    #[must_use]
    pub fn steps(&self) -> &[PathStep] {
        &self.steps
    }

    /// Most recent step. The sentinel guarantees there is one.
    #[must_use]
    pub fn last(&self) -> &PathStep {
        let Some(last) = self.steps.last() else {
            unreachable!("path session lost its origin sentinel");
        };
        last
    }

    /// Cost consumed so far.
    #[must_use]
    pub fn cumulative_cost(&self) -> u32 {
        self.last().cumulative_cost
    }

    /// Budget still available.
    #[must_use]
    pub fn remaining_budget(&self) -> u32 {
        self.budget.saturating_sub(self.cumulative_cost())
    }

    /// Pose at the end of the path so far.
    #[must_use]
    pub fn current_pose(&self) -> Pose {
        self.last().to
    }

    /// Append a one-cell translation, or undo the previous one if
    /// `direction` reverses it.
    ///
    /// Fails without side effects if the neighbor is off the grid, the
    /// footprint does not fit there, or the placement's weight exceeds the
    /// remaining budget.
    pub fn append_translate(&mut self, grid: &Grid, direction: Direction) -> bool {
        let kind = StepKind::Translate(direction);
        if self.last().undoes(kind) {
            self.steps.pop();
            tracing::trace!(actor = %self.actor, ?direction, "translation undone");
            return true;
        }

        let last = *self.last();
        let Some(candidate) = grid.neighbor(last.to.cell, direction) else {
            return false;
        };
        let rotation = last.to.rotation;
        if !self.footprint.fits_for(grid, candidate, rotation, self.actor) {
            tracing::trace!(actor = %self.actor, cell = %candidate, "translation obstructed");
            return false;
        }
        let Some(cost) = self
            .footprint
            .weight_at(grid, candidate, rotation, self.movement_class)
        else {
            return false;
        };
        let cumulative_cost = last.cumulative_cost.saturating_add(cost);
        if cumulative_cost > self.budget {
            tracing::trace!(actor = %self.actor, cumulative_cost, budget = self.budget, "translation over budget");
            return false;
        }

        self.steps.push(PathStep {
            kind,
            from: last.to,
            to: Pose::new(candidate, rotation),
            cumulative_cost,
        });
        true
    }

    /// Append a quarter turn in place, or undo the previous turn if this one
    /// reverses it. Turning costs no movement.
    pub fn append_rotate(&mut self, grid: &Grid, clockwise: bool) -> bool {
        let delta: i8 = if clockwise { 1 } else { -1 };
        let kind = StepKind::Rotate(delta);
        if self.last().undoes(kind) {
            self.steps.pop();
            tracing::trace!(actor = %self.actor, delta, "rotation undone");
            return true;
        }

        let last = *self.last();
        if last.cumulative_cost > self.budget {
            return false;
        }
        if !self
            .footprint
            .can_rotate_in_place_for(grid, last.to.cell, last.to.rotation, delta, self.actor)
        {
            tracing::trace!(actor = %self.actor, delta, "rotation sweep obstructed");
            return false;
        }

        self.steps.push(PathStep {
            kind,
            from: last.to,
            to: Pose::new(last.to.cell, last.to.rotation.turned(delta)),
            cumulative_cost: last.cumulative_cost,
        });
        true
    }

    /// Finish the session and return the replayable path.
    #[must_use]
    pub fn commit(self) -> Path {
        let mut steps = self.steps;
        let origin = steps.remove(0);
        debug_assert_eq!(origin.kind, StepKind::Origin);
        tracing::debug!(actor = %self.actor, steps = steps.len(), "path committed");
        Path {
            origin: origin.to,
            steps,
        }
    }

    /// Discard the session.
    pub fn abort(self) {
        tracing::debug!(actor = %self.actor, "path session aborted");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action_state::ActionState;
    use crate::actor::{ActorStats, SideId};
    use crate::footprint::Rotation;
    use crate::grid::{CellCoord, Passability, TraversalWeights};

    fn grid(width: u32, height: u32) -> Grid {
        Grid::new(width, height, TraversalWeights::default()).unwrap()
    }

    fn actor_at(x: i32, y: i32, footprint: Footprint, budget: u32) -> Actor {
        Actor {
            id: ActorId(0),
            side: SideId(0),
            name: "walker".to_string(),
            pose: Pose::new(CellCoord::new(x, y), Rotation::IDENTITY),
            footprint,
            movement_class: MovementClass::Ground,
            stats: ActorStats {
                move_budget: budget,
                ..ActorStats::default()
            },
            health: 10,
            dead: false,
            actions: ActionState::default(),
        }
    }

    #[test]
    fn test_committed_path_is_legal() {
        let grid = grid(8, 8);
        let walker = actor_at(1, 1, Footprint::single(), 4);
        let mut session = PathSession::begin(&walker);
        assert!(session.append_translate(&grid, Direction::Right));
        assert!(session.append_rotate(&grid, true));
        let path = session.commit();
        assert!(path.is_legal_for(&walker, &grid));
    }

    #[test]
    fn test_skipping_path_is_not_legal() {
        let grid = grid(10, 4);
        let walker = actor_at(1, 1, Footprint::single(), 4);
        let start = walker.pose;
        let path = Path {
            origin: start,
            steps: vec![PathStep {
                kind: StepKind::Translate(Direction::Right),
                from: start,
                to: Pose::new(CellCoord::new(8, 1), Rotation::IDENTITY),
                cumulative_cost: 1,
            }],
        };
        assert!(!path.is_legal_for(&walker, &grid));
    }

    #[test]
    fn test_over_budget_path_is_not_legal() {
        let grid = grid(10, 4);
        let strider = actor_at(1, 1, Footprint::single(), 8);
        let mut session = PathSession::begin(&strider);
        for _ in 0..6 {
            assert!(session.append_translate(&grid, Direction::Right));
        }
        let path = session.commit();

        let walker = actor_at(1, 1, Footprint::single(), 4);
        assert!(!path.is_legal_for(&walker, &grid));
        assert!(path.is_legal_for(&strider, &grid));
    }

    #[test]
    fn test_path_from_elsewhere_is_not_legal() {
        let grid = grid(8, 8);
        let walker = actor_at(1, 1, Footprint::single(), 4);
        let path = Path::stationary(Pose::new(CellCoord::new(2, 2), Rotation::IDENTITY));
        assert!(!path.is_legal_for(&walker, &grid));
        assert!(Path::stationary(walker.pose).is_legal_for(&walker, &grid));
    }

    #[test]
    fn test_budget_two_allows_two_steps() {
        let grid = grid(12, 12);
        let mut session = PathSession::begin(&actor_at(1, 1, Footprint::single(), 2));
        assert!(session.append_translate(&grid, Direction::Right));
        assert!(session.append_translate(&grid, Direction::Right));
        assert!(!session.append_translate(&grid, Direction::Right));
        assert_eq!(session.current_pose().cell, CellCoord::new(3, 1));
        assert_eq!(session.cumulative_cost(), 2);
        assert_eq!(session.remaining_budget(), 0);
    }

    #[test]
    fn test_reverse_translate_undoes() {
        let grid = grid(8, 8);
        let mut session = PathSession::begin(&actor_at(3, 3, Footprint::single(), 5));
        assert!(session.append_translate(&grid, Direction::Up));
        let before = session.steps().to_vec();
        assert!(session.append_translate(&grid, Direction::Right));
        assert!(session.append_translate(&grid, Direction::Left));
        assert_eq!(session.steps(), before.as_slice());
        assert_eq!(session.cumulative_cost(), 1);
    }

    #[test]
    fn test_reverse_from_origin_is_a_real_step() {
        let grid = grid(8, 8);
        let mut session = PathSession::begin(&actor_at(3, 3, Footprint::single(), 5));
        assert!(session.append_translate(&grid, Direction::Left));
        assert_eq!(session.steps().len(), 2);
    }

    #[test]
    fn test_budget_boundary_exact_and_over() {
        let mut g = grid(8, 8);
        g.set_weights(CellCoord::new(2, 1), TraversalWeights::uniform(3));
        g.set_weights(CellCoord::new(1, 2), TraversalWeights::uniform(4));

        let mut session = PathSession::begin(&actor_at(1, 1, Footprint::single(), 3));
        assert!(!session.append_translate(&g, Direction::Up));
        assert!(session.append_translate(&g, Direction::Right));
        assert_eq!(session.cumulative_cost(), 3);
    }

    #[test]
    fn test_failed_append_leaves_state() {
        let mut g = grid(5, 5);
        g.set_passability(CellCoord::new(2, 1), Passability::Blocked);
        let mut session = PathSession::begin(&actor_at(1, 1, Footprint::single(), 5));
        let before = session.clone();
        assert!(!session.append_translate(&g, Direction::Right));
        assert_eq!(session, before);

        let mut edge = PathSession::begin(&actor_at(0, 0, Footprint::single(), 5));
        let before = edge.clone();
        assert!(!edge.append_translate(&g, Direction::Left));
        assert_eq!(edge, before);
    }

    #[test]
    fn test_four_clockwise_turns_return_home() {
        let g = grid(9, 9);
        let bar = Footprint::new(1, 3).unwrap();
        let mut session = PathSession::begin(&actor_at(4, 4, bar, 3));
        for _ in 0..4 {
            assert!(session.append_rotate(&g, true));
        }
        assert_eq!(session.current_pose().rotation, Rotation::IDENTITY);
        assert_eq!(session.cumulative_cost(), 0);
        assert_eq!(session.steps().len(), 5);
    }

    #[test]
    fn test_opposite_turn_undoes() {
        let g = grid(9, 9);
        let bar = Footprint::new(1, 3).unwrap();
        let mut session = PathSession::begin(&actor_at(4, 4, bar, 3));
        assert!(session.append_rotate(&g, true));
        assert!(session.append_rotate(&g, false));
        assert_eq!(session.steps().len(), 1);
    }

    #[test]
    fn test_rotation_blocked_by_sweep() {
        let mut g = grid(9, 9);
        g.set_passability(CellCoord::new(5, 4), Passability::Blocked);
        let bar = Footprint::new(1, 3).unwrap();
        let mut session = PathSession::begin(&actor_at(4, 4, bar, 3));
        assert!(!session.append_rotate(&g, true));
        assert!(!session.append_rotate(&g, false));
        assert_eq!(session.steps().len(), 1);
    }

    #[test]
    fn test_translate_uses_current_rotation() {
        let mut g = grid(9, 9);
        // Blocks the vertical bar moving right, not the horizontal one.
        g.set_passability(CellCoord::new(5, 5), Passability::Blocked);
        let bar = Footprint::new(1, 3).unwrap();
        let mut session = PathSession::begin(&actor_at(4, 4, bar, 3));
        assert!(!session.append_translate(&g, Direction::Right));
        assert!(session.append_rotate(&g, true));
        assert!(session.append_translate(&g, Direction::Down));
        assert_eq!(session.current_pose(), Pose::new(CellCoord::new(4, 3), Rotation::from_quarter_turns(1)));
    }

    #[test]
    fn test_weight_gates_large_footprint() {
        let mut g = grid(9, 9);
        g.set_weights(CellCoord::new(5, 5), TraversalWeights::uniform(4));
        let bar = Footprint::new(1, 3).unwrap();
        let mut session = PathSession::begin(&actor_at(5, 3, bar, 3));
        // Moving up puts the top of the bar on the weight-4 cell.
        assert!(!session.append_translate(&g, Direction::Up));
        assert!(session.append_translate(&g, Direction::Right));
    }

    #[test]
    fn test_commit_drops_sentinel() {
        let g = grid(6, 6);
        let mut session = PathSession::begin(&actor_at(1, 1, Footprint::single(), 3));
        assert!(session.append_translate(&g, Direction::Up));
        assert!(session.append_rotate(&g, true));
        let path = session.commit();
        assert_eq!(path.len(), 2);
        assert_eq!(path.origin().cell, CellCoord::new(1, 1));
        assert_eq!(path.destination().cell, CellCoord::new(1, 2));
        assert_eq!(path.total_cost(), 1);
        assert!(path.steps().iter().all(|s| s.kind != StepKind::Origin));
    }

    #[test]
    fn test_empty_commit() {
        let session = PathSession::begin(&actor_at(1, 1, Footprint::single(), 3));
        let path = session.commit();
        assert!(path.is_empty());
        assert_eq!(path.destination(), path.origin());
        assert_eq!(path, Path::stationary(path.origin()));
    }
}
