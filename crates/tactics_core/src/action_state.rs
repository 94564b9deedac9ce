//! Per-actor action bookkeeping.
//!
//! Each action kind carries two flags: *performed* this turn and currently
//! *performing*. An actor with any performing flag set blocks every other
//! command in the battle. Queries that need the grid (is an enemy in range?)
//! live on [`crate::battle::Battle`].

use serde::{Deserialize, Serialize};

/// Actions an actor may take once per turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    /// Relocate along a constructed path.
    Move,
    /// Damage a hostile actor in range.
    Attack,
}

impl ActionKind {
    /// All action kinds, in menu order.
    pub const ALL: [Self; 2] = [Self::Move, Self::Attack];

    const fn slot(self) -> usize {
        match self {
            Self::Move => 0,
            Self::Attack => 1,
        }
    }
}

/// Flags for one action kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ActionFlags {
    /// Already done this turn.
    pub performed: bool,
    /// In progress right now.
    pub performing: bool,
}

/// Action-state record of one actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ActionState {
    flags: [ActionFlags; 2],
    spent: bool,
}

impl ActionState {
    /// Flags for one action kind.
    #[must_use]
    pub const fn flags(&self, kind: ActionKind) -> ActionFlags {
        self.flags[kind.slot()]
    }

    /// True if `kind` was already performed this turn.
    #[must_use]
    pub const fn performed(&self, kind: ActionKind) -> bool {
        self.flags[kind.slot()].performed
    }

    /// True if any action is in progress.
    #[must_use]
    pub fn is_performing_action(&self) -> bool {
        self.flags.iter().any(|flags| flags.performing)
    }

    /// True once the actor has nothing left to do this turn.
    #[must_use]
    pub const fn is_spent(&self) -> bool {
        self.spent
    }

    /// Action kinds not yet performed, in menu order.
    pub fn unperformed(&self) -> impl Iterator<Item = ActionKind> + '_ {
        ActionKind::ALL.into_iter().filter(|kind| !self.performed(*kind))
    }

    /// Mark `kind` as in progress.
    pub fn begin(&mut self, kind: ActionKind) {
        self.flags[kind.slot()].performing = true;
    }

    /// Clear the in-progress flag of `kind` without marking it performed.
    pub fn abandon(&mut self, kind: ActionKind) {
        self.flags[kind.slot()].performing = false;
    }

    /// Mark `kind` performed and no longer in progress.
    pub fn complete(&mut self, kind: ActionKind) {
        let flags = &mut self.flags[kind.slot()];
        flags.performing = false;
        flags.performed = true;
    }

    /// Lock the actor out for the rest of the turn.
    pub fn mark_spent(&mut self) {
        self.spent = true;
    }

    /// Force every action performed, clear in-progress flags, mark spent.
    pub fn end_actions(&mut self) {
        for flags in &mut self.flags {
            flags.performed = true;
            flags.performing = false;
        }
        self.spent = true;
    }

    /// Turn-start reset. Dead actors keep their state.
    pub fn reset(&mut self, dead: bool) {
        if dead {
            return;
        }
        *self = Self::default();
    }
}
