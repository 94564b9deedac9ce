//! Actors: the units that stand on the grid and take turns.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::action_state::ActionState;
use crate::footprint::{Footprint, Pose};
use crate::grid::MovementClass;

/// Index of an actor in the battle's actor arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActorId(pub u32);

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "actor#{}", self.0)
    }
}

/// Index of a side in the turn order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SideId(pub u8);

impl fmt::Display for SideId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "side#{}", self.0)
    }
}

/// Combat and movement numbers for an actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActorStats {
    /// Movement allowance per turn, in traversal weight.
    pub move_budget: u32,
    /// Manhattan radius of attacks.
    pub attack_range: u32,
    /// Damage dealt per attack.
    pub attack_power: u32,
    /// Health at spawn.
    pub max_health: u32,
}

impl Default for ActorStats {
    fn default() -> Self {
        Self {
            move_budget: 4,
            attack_range: 1,
            attack_power: 3,
            max_health: 10,
        }
    }
}

/// A unit on the battlefield.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Actor {
    /// Arena index.
    pub id: ActorId,
    /// Owning side.
    pub side: SideId,
    /// Display name.
    pub name: String,
    /// Authoritative pivot cell and facing.
    pub pose: Pose,
    /// Body shape.
    pub footprint: Footprint,
    /// Which traversal weight applies.
    pub movement_class: MovementClass,
    /// Movement and combat numbers.
    pub stats: ActorStats,
    /// Remaining health.
    pub health: u32,
    /// Dead actors stay in the arena but leave the grid and every roster.
    pub dead: bool,
    /// Per-turn action bookkeeping.
    pub actions: ActionState,
}

impl Actor {
    /// True if the actor can still take part in the match.
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        !self.dead
    }

    /// True if `other` belongs to a different side.
    #[must_use]
    pub fn is_hostile_to(&self, other: &Actor) -> bool {
        self.side != other.side
    }

    /// Apply damage. Returns `true` if this blow killed the actor.
    pub fn take_damage(&mut self, amount: u32) -> bool {
        if self.dead {
            return false;
        }
        self.health = self.health.saturating_sub(amount);
        if self.health == 0 {
            self.dead = true;
            return true;
        }
        false
    }
}
