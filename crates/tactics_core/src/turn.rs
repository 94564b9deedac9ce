//! Side rosters and turn order.
//!
//! Each side keeps its full actor list and a *pending* list of actors that
//! still owe an action this turn. When the active side's pending list runs
//! dry the orchestrator calls [`TurnTracker::pass_turn`] exactly once.

use serde::{Deserialize, Serialize};

use crate::actor::{ActorId, SideId};

/// One side's actors for the current match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SideRoster {
    side: SideId,
    label: String,
    actors: Vec<ActorId>,
    pending: Vec<ActorId>,
    cursor: usize,
}

impl SideRoster {
    /// Empty roster for `side`.
    #[must_use]
    pub fn new(side: SideId, label: impl Into<String>) -> Self {
        Self {
            side,
            label: label.into(),
            actors: Vec::new(),
            pending: Vec::new(),
            cursor: 0,
        }
    }

    /// Side this roster belongs to.
    #[must_use]
    pub const fn side(&self) -> SideId {
        self.side
    }

    /// Display label.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Live actors on this side, in spawn order.
    #[must_use]
    pub fn actors(&self) -> &[ActorId] {
        &self.actors
    }

    /// Actors that still owe an action this turn.
    #[must_use]
    pub fn pending(&self) -> &[ActorId] {
        &self.pending
    }

    /// True if the side has any live actor.
    #[must_use]
    pub fn has_actors(&self) -> bool {
        !self.actors.is_empty()
    }

    /// True once every actor has been retired this turn.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.pending.is_empty()
    }

    /// Add an actor to the side.
    pub fn enlist(&mut self, actor: ActorId) {
        if !self.actors.contains(&actor) {
            self.actors.push(actor);
        }
    }

    /// Refill pending with every live actor and rewind the cursor.
    pub fn begin_turn(&mut self) {
        self.pending.clone_from(&self.actors);
        self.cursor = 0;
    }

    /// Remove an actor from pending. Returns `false` if it was not pending.
    pub fn retire(&mut self, actor: ActorId) -> bool {
        let Some(position) = self.pending.iter().position(|id| *id == actor) else {
            return false;
        };
        self.pending.remove(position);
        if position < self.cursor {
            self.cursor -= 1;
        }
        true
    }

    /// Drop a dead actor from the side entirely.
    pub fn remove(&mut self, actor: ActorId) {
        self.actors.retain(|id| *id != actor);
        self.retire(actor);
    }

    /// Next pending actor in round-robin order, advancing the cursor.
    pub fn next_pending(&mut self) -> Option<ActorId> {
        if self.pending.is_empty() {
            return None;
        }
        if self.cursor >= self.pending.len() {
            self.cursor = 0;
        }
        let actor = self.pending[self.cursor];
        self.cursor += 1;
        Some(actor)
    }

    /// First pending actor without moving the cursor.
    #[must_use]
    pub fn first_pending(&self) -> Option<ActorId> {
        self.pending.first().copied()
    }

    /// Empty pending without touching the actor list.
    pub fn clear_pending(&mut self) {
        self.pending.clear();
        self.cursor = 0;
    }
}

/// Result of a turn handoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handoff {
    /// Play continues with this side.
    Next(SideId),
    /// At most one side has live actors.
    MatchOver(Option<SideId>),
}

/// Turn order over all sides.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TurnTracker {
    sides: Vec<SideRoster>,
    active: usize,
    turn: u32,
    handoffs: u32,
}

impl TurnTracker {
    /// Tracker starting with the first side on turn 1.
    #[must_use]
    pub fn new(sides: Vec<SideRoster>) -> Self {
        Self {
            sides,
            active: 0,
            turn: 1,
            handoffs: 0,
        }
    }

    /// All rosters in turn order.
    #[must_use]
    pub fn sides(&self) -> &[SideRoster] {
        &self.sides
    }

    /// Roster of `side`.
    #[must_use]
    pub fn roster(&self, side: SideId) -> Option<&SideRoster> {
        self.sides.get(usize::from(side.0))
    }

    /// Mutable roster of `side`.
    pub fn roster_mut(&mut self, side: SideId) -> Option<&mut SideRoster> {
        self.sides.get_mut(usize::from(side.0))
    }

    /// Side whose turn it is.
    #[must_use]
    pub fn active_side(&self) -> SideId {
        self.sides[self.active].side()
    }

    /// Roster of the active side.
    #[must_use]
    pub fn active_roster(&self) -> &SideRoster {
        &self.sides[self.active]
    }

    /// Mutable roster of the active side.
    pub fn active_roster_mut(&mut self) -> &mut SideRoster {
        &mut self.sides[self.active]
    }

    /// Current turn number, starting at 1.
    #[must_use]
    pub const fn turn(&self) -> u32 {
        self.turn
    }

    /// Handoffs performed so far.
    #[must_use]
    pub const fn handoffs(&self) -> u32 {
        self.handoffs
    }

    /// Sides that still have live actors.
    pub fn living_sides(&self) -> impl Iterator<Item = SideId> + '_ {
        self.sides
            .iter()
            .filter(|roster| roster.has_actors())
            .map(SideRoster::side)
    }

    /// `Some(winner)` once at most one side has live actors.
    #[must_use]
    pub fn outcome(&self) -> Option<Option<SideId>> {
        let mut living = self.living_sides();
        let first = living.next();
        if living.next().is_some() {
            return None;
        }
        Some(first)
    }

    /// Hand the turn to the next side that still has live actors.
    ///
    /// The outgoing roster is left empty; the caller resets the incoming
    /// side's actors and then calls [`SideRoster::begin_turn`].
    pub fn pass_turn(&mut self) -> Handoff {
        if let Some(winner) = self.outcome() {
            return Handoff::MatchOver(winner);
        }
        self.sides[self.active].clear_pending();
        let count = self.sides.len();
        for step in 1..=count {
            let candidate = (self.active + step) % count;
            if self.sides[candidate].has_actors() {
                self.active = candidate;
                break;
            }
        }
        self.turn += 1;
        self.handoffs += 1;
        let side = self.active_side();
        tracing::info!(%side, turn = self.turn, "turn passed");
        Handoff::Next(side)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roster(side: u8, actors: &[u32]) -> SideRoster {
        let mut roster = SideRoster::new(SideId(side), format!("side {side}"));
        for id in actors {
            roster.enlist(ActorId(*id));
        }
        roster.begin_turn();
        roster
    }

    #[test]
    fn test_retire_until_exhausted() {
        let mut r = roster(0, &[1, 2]);
        assert!(!r.is_exhausted());
        assert!(r.retire(ActorId(1)));
        assert!(!r.retire(ActorId(1)));
        assert!(r.retire(ActorId(2)));
        assert!(r.is_exhausted());
        assert_eq!(r.actors().len(), 2);
    }

    #[test]
    fn test_next_pending_wraps() {
        let mut r = roster(0, &[1, 2, 3]);
        assert_eq!(r.next_pending(), Some(ActorId(1)));
        assert_eq!(r.next_pending(), Some(ActorId(2)));
        r.retire(ActorId(1));
        assert_eq!(r.next_pending(), Some(ActorId(3)));
        assert_eq!(r.next_pending(), Some(ActorId(2)));
    }

    #[test]
    fn test_remove_drops_from_both_lists() {
        let mut r = roster(0, &[1, 2]);
        r.remove(ActorId(1));
        assert_eq!(r.actors(), &[ActorId(2)]);
        assert_eq!(r.pending(), &[ActorId(2)]);
    }

    #[test]
    fn test_pass_turn_alternates() {
        let mut tracker = TurnTracker::new(vec![roster(0, &[1]), roster(1, &[2])]);
        assert_eq!(tracker.pass_turn(), Handoff::Next(SideId(1)));
        assert_eq!(tracker.pass_turn(), Handoff::Next(SideId(0)));
        assert_eq!(tracker.turn(), 3);
        assert_eq!(tracker.handoffs(), 2);
    }

    #[test]
    fn test_pass_turn_skips_wiped_side() {
        let mut tracker = TurnTracker::new(vec![roster(0, &[1]), roster(1, &[]), roster(2, &[3])]);
        assert_eq!(tracker.pass_turn(), Handoff::Next(SideId(2)));
    }

    #[test]
    fn test_outcome_with_one_side_left() {
        let mut tracker = TurnTracker::new(vec![roster(0, &[1]), roster(1, &[2])]);
        assert_eq!(tracker.outcome(), None);
        tracker.roster_mut(SideId(1)).unwrap().remove(ActorId(2));
        assert_eq!(tracker.outcome(), Some(Some(SideId(0))));
        assert_eq!(tracker.pass_turn(), Handoff::MatchOver(Some(SideId(0))));
        assert_eq!(tracker.handoffs(), 0);
    }
}
