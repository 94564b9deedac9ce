//! Built-in automated policy.
//!
//! [`AdvancePolicy`] attacks the nearest hostile in range, otherwise walks
//! toward the nearest hostile through the same path construction engine the
//! player uses, otherwise waits.

use crate::action_state::ActionKind;
use crate::actor::Actor;
use crate::battle::Battle;
use crate::command::{Command, CommandPayload};
use crate::decision::{Decision, DecisionDelegate, DecisionRequest};
use crate::grid::CellCoord;
use crate::path::{Path, PathSession};

/// Advance toward the enemy and attack when in range.
#[derive(Debug, Clone, Copy, Default)]
pub struct AdvancePolicy;

impl AdvancePolicy {
    /// Pivot of the live hostile nearest to `actor`, ties broken by id.
    fn nearest_hostile(battle: &Battle, actor: &Actor) -> Option<CellCoord> {
        battle
            .actors()
            .iter()
            .filter(|other| other.is_alive() && other.is_hostile_to(actor))
            .min_by_key(|other| (actor.pose.cell.manhattan(other.pose.cell), other.id))
            .map(|other| other.pose.cell)
    }

    /// Path to the reachable cell closest to the nearest hostile.
    ///
    /// Returns `None` when no reachable cell is closer than where the actor
    /// already stands.
    pub fn plan_advance(battle: &Battle, actor: &Actor) -> Option<Path> {
        let goal = Self::nearest_hostile(battle, actor)?;
        let spaces = battle.move_spaces(actor.id)?;
        let here = actor.pose.cell.manhattan(goal);
        let destination = spaces
            .destinations()
            .filter(|cell| cell.manhattan(goal) < here)
            .min_by_key(|cell| (cell.manhattan(goal), spaces.cost(*cell).unwrap_or(u32::MAX), *cell))?;
        let directions = spaces.directions_to(destination)?;

        let mut session = PathSession::begin(actor);
        for direction in directions {
            if !session.append_translate(battle.grid(), direction) {
                tracing::debug!(actor = %actor.id, ?direction, "planned step refused, truncating path");
                break;
            }
        }
        Some(session.commit())
    }
}

impl DecisionDelegate for AdvancePolicy {
    fn decide(&mut self, request: &DecisionRequest, battle: &Battle) -> Decision {
        let wait = CommandPayload::new(request.actor, Command::EndTurn);
        let Some(actor) = battle.actor(request.actor) else {
            return Decision::Command(wait);
        };

        if request.available.contains(&ActionKind::Attack) {
            if let Some(target) = battle.hostile_in_range(actor.id) {
                tracing::debug!(actor = %actor.id, %target, "policy attacks");
                return Decision::Command(CommandPayload::new(actor.id, Command::Attack).with_target(target));
            }
        }

        if request.available.contains(&ActionKind::Move) {
            if let Some(path) = Self::plan_advance(battle, actor).filter(|path| !path.is_empty()) {
                let destination = path.destination().cell;
                tracing::debug!(actor = %actor.id, %destination, steps = path.len(), "policy advances");
                return Decision::Command(
                    CommandPayload::new(actor.id, Command::Move { path }).with_target(destination),
                );
            }
        }

        Decision::Command(wait)
    }

    fn drives_turn(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::{ActorId, ActorStats, SideId};
    use crate::battle::ActorSpawn;
    use crate::config::TimingConfig;
    use crate::footprint::{Footprint, Pose, Rotation};
    use crate::grid::{Grid, MovementClass, Passability, TraversalWeights};

    fn battle_with(positions: &[(u8, i32, i32)]) -> Battle {
        let grid = Grid::new(10, 10, TraversalWeights::default()).unwrap();
        let mut battle = Battle::new(grid, ["Blue", "Red"], TimingConfig::instant()).unwrap();
        for (side, x, y) in positions {
            battle
                .spawn_actor(ActorSpawn {
                    side: SideId(*side),
                    name: format!("{side}-{x}-{y}"),
                    pose: Pose::new(CellCoord::new(*x, *y), Rotation::IDENTITY),
                    footprint: Footprint::single(),
                    movement_class: MovementClass::Ground,
                    stats: ActorStats::default(),
                })
                .unwrap();
        }
        battle
    }

    fn request(battle: &Battle, id: u32) -> DecisionRequest {
        let actor = battle.actor(ActorId(id)).unwrap();
        DecisionRequest {
            actor: actor.id,
            target: actor.pose.cell,
            available: battle.available_actions(actor.id),
        }
    }

    #[test]
    fn test_attacks_adjacent_hostile() {
        let battle = battle_with(&[(0, 2, 2), (1, 2, 3)]);
        let decision = AdvancePolicy.decide(&request(&battle, 1), &battle);
        let Decision::Command(payload) = decision else {
            panic!("policy never defers");
        };
        assert_eq!(payload.command, Command::Attack);
        assert_eq!(payload.target, Some(CellCoord::new(2, 2)));
    }

    #[test]
    fn test_advances_toward_nearest() {
        let battle = battle_with(&[(0, 1, 1), (1, 8, 1)]);
        let Decision::Command(payload) = AdvancePolicy.decide(&request(&battle, 1), &battle) else {
            panic!("policy never defers");
        };
        let Command::Move { path } = payload.command else {
            panic!("expected a move, got {:?}", payload.command);
        };
        assert_eq!(path.total_cost(), 4);
        assert_eq!(path.destination().cell, CellCoord::new(4, 1));
    }

    #[test]
    fn test_waits_when_boxed_in() {
        let mut battle = battle_with(&[(0, 1, 1), (1, 8, 8)]);
        for cell in [(7, 8), (9, 8), (8, 7), (8, 9)] {
            battle
                .grid_mut()
                .set_passability(CellCoord::new(cell.0, cell.1), Passability::Blocked);
        }
        let Decision::Command(payload) = AdvancePolicy.decide(&request(&battle, 1), &battle) else {
            panic!("policy never defers");
        };
        assert_eq!(payload.command, Command::EndTurn);
    }

    #[test]
    fn test_drives_turn() {
        assert!(AdvancePolicy.drives_turn());
    }
}
