//! The world context: grid, actors and turn order in one value.
//!
//! Everything that reads or writes battlefield state takes a `Battle`
//! explicitly. Occupancy is only ever written here, and always together with
//! the actor's own pose, so the grid's pivot back-references and body cover
//! never disagree with the actor arena.

use std::cmp::Reverse;
use std::collections::{BTreeMap, BinaryHeap};
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::action_state::ActionKind;
use crate::actor::{Actor, ActorId, ActorStats, SideId};
use crate::command::CommandKind;
use crate::config::{MatchConfig, TimingConfig};
use crate::error::{Result, TacticsError};
use crate::events::ActionSpace;
use crate::footprint::{Footprint, Pose};
use crate::grid::{CellCoord, Direction, Grid, MovementClass, Passability};
use crate::turn::{SideRoster, TurnTracker};

/// Everything needed to put a new actor on the field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActorSpawn {
    /// Owning side.
    pub side: SideId,
    /// Display name.
    pub name: String,
    /// Starting pivot and facing.
    pub pose: Pose,
    /// Body shape.
    pub footprint: Footprint,
    /// Traversal weight class.
    pub movement_class: MovementClass,
    /// Movement and combat numbers.
    pub stats: ActorStats,
}

/// Cheapest known way to reach a pivot cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reach {
    /// Cumulative movement cost.
    pub cost: u32,
    /// Direction of the final step, `None` for the origin.
    pub via: Option<Direction>,
}

/// Pivot cells an actor can reach this turn at its current facing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveSpaces {
    origin: CellCoord,
    reach: BTreeMap<CellCoord, Reach>,
}

impl MoveSpaces {
    /// Where the expansion started.
    #[must_use]
    pub const fn origin(&self) -> CellCoord {
        self.origin
    }

    /// True if `cell` is reachable. The origin counts.
    #[must_use]
    pub fn contains(&self, cell: CellCoord) -> bool {
        self.reach.contains_key(&cell)
    }

    /// Cheapest cost to `cell`.
    #[must_use]
    pub fn cost(&self, cell: CellCoord) -> Option<u32> {
        self.reach.get(&cell).map(|reach| reach.cost)
    }

    /// Reachable cells other than the origin, in coordinate order.
    pub fn destinations(&self) -> impl Iterator<Item = CellCoord> + '_ {
        self.reach.keys().copied().filter(move |cell| *cell != self.origin)
    }

    /// Number of reachable cells other than the origin.
    #[must_use]
    pub fn len(&self) -> usize {
        self.reach.len().saturating_sub(1)
    }

    /// True if the actor cannot move anywhere.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Translation sequence from the origin to `target`.
    #[must_use]
    pub fn directions_to(&self, target: CellCoord) -> Option<Vec<Direction>> {
        let mut directions = Vec::new();
        let mut cell = target;
        loop {
            let reach = self.reach.get(&cell)?;
            let Some(via) = reach.via else {
                break;
            };
            directions.push(via);
            cell = cell.step(via.reverse());
        }
        directions.reverse();
        Some(directions)
    }
}

/// What an attack did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttackOutcome {
    /// Attacking actor.
    pub attacker: ActorId,
    /// Damaged actor.
    pub target: ActorId,
    /// Damage dealt.
    pub damage: u32,
    /// Target health afterwards.
    pub remaining_health: u32,
    /// The blow was lethal.
    pub killed: bool,
}

/// Grid, actors and turn order.
#[derive(Debug, Clone)]
pub struct Battle {
    grid: Grid,
    actors: Vec<Actor>,
    turns: TurnTracker,
    timing: TimingConfig,
}

impl Battle {
    /// Empty battle with one roster per label, in turn order.
    ///
    /// # Errors
    /// Returns [`TacticsError::InvalidSideCount`] unless there are 2 to 255
    /// labels.
    pub fn new<I, S>(grid: Grid, labels: I, timing: TimingConfig) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let labels: Vec<String> = labels.into_iter().map(Into::into).collect();
        if labels.len() < 2 || labels.len() > usize::from(u8::MAX) {
            return Err(TacticsError::InvalidSideCount(labels.len()));
        }
        let sides = labels
            .into_iter()
            .zip(0u8..)
            .map(|(label, index)| SideRoster::new(SideId(index), label))
            .collect();
        Ok(Self {
            grid,
            actors: Vec::new(),
            turns: TurnTracker::new(sides),
            timing,
        })
    }

    /// Build terrain and spawn every configured actor.
    ///
    /// # Errors
    /// Fails on bad dimensions, terrain outside the grid, bad footprints, or
    /// placements that are out of bounds, blocked or overlapping.
    pub fn from_config(config: &MatchConfig) -> Result<Self> {
        let mut grid = Grid::new(config.grid.width, config.grid.height, config.grid.default_weights)?;
        for cell in &config.grid.blocked {
            if !grid.set_passability(*cell, Passability::Blocked) {
                return Err(TacticsError::OutOfBounds(*cell));
            }
        }
        for weighted in &config.grid.weighted {
            if !grid.set_weights(weighted.cell, weighted.weights) {
                return Err(TacticsError::OutOfBounds(weighted.cell));
            }
        }

        let labels = config.sides.iter().map(|side| side.label.clone());
        let mut battle = Self::new(grid, labels, config.timing)?;
        for (side_config, side) in config.sides.iter().zip(0u8..) {
            for actor in &side_config.actors {
                battle.spawn_actor(ActorSpawn {
                    side: SideId(side),
                    name: actor.name.clone(),
                    pose: Pose::new(actor.cell(), actor.rotation),
                    footprint: Footprint::new(actor.width, actor.height)?,
                    movement_class: actor.movement_class,
                    stats: actor.stats(),
                })?;
            }
        }
        tracing::debug!(
            width = config.grid.width,
            height = config.grid.height,
            actors = battle.actors.len(),
            "battle built from config"
        );
        Ok(battle)
    }

    /// Place a new actor on the grid and enlist it with its side.
    ///
    /// # Errors
    /// Fails if the side is unknown or the footprint does not fit.
    pub fn spawn_actor(&mut self, spawn: ActorSpawn) -> Result<ActorId> {
        let id = ActorId(u32::try_from(self.actors.len()).map_err(|_| TacticsError::InvalidPlacement {
            name: spawn.name.clone(),
            cell: spawn.pose.cell,
            reason: "actor arena is full".to_string(),
        })?);
        if self.turns.roster(spawn.side).is_none() {
            return Err(TacticsError::UnknownSide(spawn.side.0));
        }
        let Pose { cell, rotation } = spawn.pose;
        if !spawn.footprint.fits(&self.grid, cell, rotation) {
            return Err(TacticsError::InvalidPlacement {
                name: spawn.name,
                cell,
                reason: "footprint leaves the grid or covers a blocked cell".to_string(),
            });
        }
        if !spawn.footprint.fits_for(&self.grid, cell, rotation, id) {
            return Err(TacticsError::InvalidPlacement {
                name: spawn.name,
                cell,
                reason: "footprint overlaps another actor".to_string(),
            });
        }

        self.grid.place_occupant(cell, id);
        let covered: Vec<CellCoord> = spawn.footprint.covered_cells(cell, rotation).collect();
        self.grid.cover_cells(covered, id);
        if let Some(roster) = self.turns.roster_mut(spawn.side) {
            roster.enlist(id);
        }

        tracing::debug!(actor = %id, name = %spawn.name, %cell, side = %spawn.side, "actor spawned");
        self.actors.push(Actor {
            id,
            side: spawn.side,
            name: spawn.name,
            pose: spawn.pose,
            footprint: spawn.footprint,
            movement_class: spawn.movement_class,
            stats: spawn.stats,
            health: spawn.stats.max_health,
            dead: false,
            actions: Default::default(),
        });
        Ok(id)
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    /// The battlefield.
    #[must_use]
    pub const fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Terrain edits. Occupancy stays private to the battle.
    pub fn grid_mut(&mut self) -> &mut Grid {
        &mut self.grid
    }

    /// Every actor ever spawned, dead ones included, in id order.
    #[must_use]
    pub fn actors(&self) -> &[Actor] {
        &self.actors
    }

    /// Look up an actor.
    #[must_use]
    pub fn actor(&self, id: ActorId) -> Option<&Actor> {
        self.actors.get(usize::try_from(id.0).ok()?)
    }

    fn actor_mut(&mut self, id: ActorId) -> Option<&mut Actor> {
        self.actors.get_mut(usize::try_from(id.0).ok()?)
    }

    /// Live actor whose body covers `cell`.
    #[must_use]
    pub fn actor_at(&self, cell: CellCoord) -> Option<&Actor> {
        self.grid
            .cover(cell)
            .and_then(|id| self.actor(id))
            .filter(|actor| actor.is_alive())
    }

    /// Turn order and rosters.
    #[must_use]
    pub const fn turns(&self) -> &TurnTracker {
        &self.turns
    }

    pub(crate) fn turns_mut(&mut self) -> &mut TurnTracker {
        &mut self.turns
    }

    /// Presentation timing.
    #[must_use]
    pub const fn timing(&self) -> &TimingConfig {
        &self.timing
    }

    /// True if both actors exist and are on different sides.
    #[must_use]
    pub fn are_hostile(&self, a: ActorId, b: ActorId) -> bool {
        match (self.actor(a), self.actor(b)) {
            (Some(a), Some(b)) => a.is_hostile_to(b),
            _ => false,
        }
    }

    // ------------------------------------------------------------------
    // Occupancy
    // ------------------------------------------------------------------

    /// Move an actor to `pose`, updating pivot occupancy, body cover and the
    /// actor's pose together.
    ///
    /// Returns `false` (and changes nothing) if the actor is unknown or dead
    /// or the footprint does not fit at `pose`.
    pub fn relocate_actor(&mut self, id: ActorId, pose: Pose) -> bool {
        let Some(actor) = self.actor(id).filter(|actor| actor.is_alive()) else {
            return false;
        };
        if !actor.footprint.fits_for(&self.grid, pose.cell, pose.rotation, id) {
            tracing::debug!(actor = %id, cell = %pose.cell, "relocation refused");
            return false;
        }
        let old = actor.pose;
        let vacated: Vec<CellCoord> = actor.footprint.covered_cells(old.cell, old.rotation).collect();
        let entered: Vec<CellCoord> = actor.footprint.covered_cells(pose.cell, pose.rotation).collect();

        self.grid.uncover_cells(vacated, id);
        self.grid.clear_occupant(old.cell, id);
        self.grid.place_occupant(pose.cell, id);
        self.grid.cover_cells(entered, id);
        if let Some(actor) = self.actor_mut(id) {
            actor.pose = pose;
        }
        true
    }

    fn withdraw_from_grid(&mut self, id: ActorId) {
        let Some(actor) = self.actor(id) else {
            return;
        };
        let pose = actor.pose;
        let covered: Vec<CellCoord> = actor.footprint.covered_cells(pose.cell, pose.rotation).collect();
        self.grid.uncover_cells(covered, id);
        self.grid.clear_occupant(pose.cell, id);
    }

    /// Cross-check the grid against the actor arena.
    ///
    /// Returns one message per inconsistency; empty means consistent.
    #[must_use]
    pub fn validate_occupancy(&self) -> Vec<String> {
        let mut problems = Vec::new();
        for cell in self.grid.cells() {
            if let Some(id) = cell.occupant() {
                match self.actor(id) {
                    Some(actor) if actor.is_alive() && actor.pose.cell == cell.coord() => {}
                    _ => problems.push(format!("cell {} names {id} as occupant", cell.coord())),
                }
            }
            if let Some(id) = cell.cover() {
                let covers = self.actor(id).is_some_and(|actor| {
                    actor.is_alive()
                        && actor
                            .footprint
                            .covered_cells(actor.pose.cell, actor.pose.rotation)
                            .any(|covered| covered == cell.coord())
                });
                if !covers {
                    problems.push(format!("cell {} is covered by {id} but outside its body", cell.coord()));
                }
            }
        }
        for actor in self.actors.iter().filter(|actor| actor.is_alive()) {
            if self.grid.occupant(actor.pose.cell) != Some(actor.id) {
                problems.push(format!("{} stands on {} without a back-reference", actor.id, actor.pose.cell));
            }
            for covered in actor.footprint.covered_cells(actor.pose.cell, actor.pose.rotation) {
                if self.grid.cover(covered) != Some(actor.id) {
                    problems.push(format!("{} body cell {covered} not covered", actor.id));
                }
            }
        }
        problems
    }

    // ------------------------------------------------------------------
    // Action state
    // ------------------------------------------------------------------

    /// Nearest cell within attack range covered by a live hostile.
    #[must_use]
    pub fn hostile_in_range(&self, id: ActorId) -> Option<CellCoord> {
        let actor = self.actor(id).filter(|actor| actor.is_alive())?;
        self.grid
            .find_in_diamond(actor.pose.cell, actor.stats.attack_range, |cell| {
                cell.cover()
                    .and_then(|other| self.actor(other))
                    .is_some_and(|other| other.is_alive() && other.is_hostile_to(actor))
            })
    }

    /// Actions the actor can still take, in menu order.
    ///
    /// Attack is only offered with a hostile in range.
    #[must_use]
    pub fn available_actions(&self, id: ActorId) -> Vec<ActionKind> {
        let Some(actor) = self.actor(id) else {
            return Vec::new();
        };
        if !actor.is_alive() || actor.actions.is_spent() {
            return Vec::new();
        }
        actor
            .actions
            .unperformed()
            .filter(|kind| match kind {
                ActionKind::Move => true,
                ActionKind::Attack => self.hostile_in_range(id).is_some(),
            })
            .collect()
    }

    /// If the actor has nothing left to do, mark it spent and retire it from
    /// its side's roster.
    pub fn query_end_of_turn(&mut self, id: ActorId) -> bool {
        if !self.available_actions(id).is_empty() {
            return false;
        }
        let Some(actor) = self.actor_mut(id) else {
            return false;
        };
        actor.actions.mark_spent();
        let side = actor.side;
        if let Some(roster) = self.turns.roster_mut(side) {
            if roster.retire(id) {
                tracing::debug!(actor = %id, %side, "actor retired for the turn");
            }
        }
        true
    }

    /// Force every action performed and mark the actor spent.
    pub fn end_actions(&mut self, id: ActorId) {
        if let Some(actor) = self.actor_mut(id) {
            actor.actions.end_actions();
        }
    }

    /// Turn-start reset of one actor's flags. Dead actors are left alone.
    pub fn reset_states(&mut self, id: ActorId) {
        if let Some(actor) = self.actor_mut(id) {
            let dead = actor.dead;
            actor.actions.reset(dead);
        }
    }

    /// True if the actor has an action in progress.
    #[must_use]
    pub fn is_performing_action(&self, id: ActorId) -> bool {
        self.actor(id).is_some_and(|actor| actor.actions.is_performing_action())
    }

    /// The actor currently performing, if any.
    #[must_use]
    pub fn performing_actor(&self) -> Option<ActorId> {
        self.actors
            .iter()
            .find(|actor| actor.actions.is_performing_action())
            .map(|actor| actor.id)
    }

    pub(crate) fn begin_action(&mut self, id: ActorId, kind: ActionKind) {
        if let Some(actor) = self.actor_mut(id) {
            actor.actions.begin(kind);
        }
    }

    pub(crate) fn complete_action(&mut self, id: ActorId, kind: ActionKind) {
        if let Some(actor) = self.actor_mut(id) {
            actor.actions.complete(kind);
        }
    }

    pub(crate) fn abandon_action(&mut self, id: ActorId, kind: ActionKind) {
        if let Some(actor) = self.actor_mut(id) {
            actor.actions.abandon(kind);
        }
    }

    /// Reset every actor of `side` and refill its roster.
    pub fn begin_side_turn(&mut self, side: SideId) {
        let Some(members) = self.turns.roster(side).map(|roster| roster.actors().to_vec()) else {
            return;
        };
        for id in members {
            self.reset_states(id);
        }
        if let Some(roster) = self.turns.roster_mut(side) {
            roster.begin_turn();
        }
    }

    // ------------------------------------------------------------------
    // Spaces
    // ------------------------------------------------------------------

    /// Budget-bounded cheapest-cost expansion over pivot cells at the actor's
    /// current facing.
    ///
    /// Uses the same fit and weight rules as path construction, so every
    /// destination can be reached by a session built from
    /// [`MoveSpaces::directions_to`].
    #[must_use]
    pub fn move_spaces(&self, id: ActorId) -> Option<MoveSpaces> {
        let actor = self.actor(id).filter(|actor| actor.is_alive())?;
        let origin = actor.pose.cell;
        let rotation = actor.pose.rotation;
        let budget = actor.stats.move_budget;

        let mut reach = BTreeMap::from([(origin, Reach { cost: 0, via: None })]);
        let mut frontier = BinaryHeap::from([Reverse((0u32, origin))]);

        while let Some(Reverse((cost, cell))) = frontier.pop() {
            if reach.get(&cell).is_some_and(|known| known.cost < cost) {
                continue;
            }
            for direction in Direction::ALL {
                let Some(next) = self.grid.neighbor(cell, direction) else {
                    continue;
                };
                if !actor.footprint.fits_for(&self.grid, next, rotation, id) {
                    continue;
                }
                let Some(weight) = actor
                    .footprint
                    .weight_at(&self.grid, next, rotation, actor.movement_class)
                else {
                    continue;
                };
                let total = cost.saturating_add(weight);
                if total > budget {
                    continue;
                }
                if reach.get(&next).map_or(true, |known| total < known.cost) {
                    reach.insert(
                        next,
                        Reach {
                            cost: total,
                            via: Some(direction),
                        },
                    );
                    frontier.push(Reverse((total, next)));
                }
            }
        }

        Some(MoveSpaces { origin, reach })
    }

    /// Move spaces as displayable action spaces.
    #[must_use]
    pub fn move_action_spaces(&self, id: ActorId, invalid: bool) -> Vec<ActionSpace> {
        self.move_spaces(id)
            .map(|spaces| {
                spaces
                    .destinations()
                    .map(|cell| ActionSpace {
                        cell,
                        command: CommandKind::Move,
                        invalid,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Cells within attack range, excluding the actor's own body.
    ///
    /// A space is valid only when a live hostile covers it and `preview` is
    /// false.
    #[must_use]
    pub fn attack_spaces(&self, id: ActorId, preview: bool) -> Vec<ActionSpace> {
        let Some(actor) = self.actor(id).filter(|actor| actor.is_alive()) else {
            return Vec::new();
        };
        self.grid
            .diamond(actor.pose.cell, actor.stats.attack_range)
            .into_iter()
            .filter(|cell| self.grid.cover(*cell) != Some(id))
            .map(|cell| {
                let hostile = self
                    .actor_at(cell)
                    .is_some_and(|other| other.is_hostile_to(actor));
                ActionSpace {
                    cell,
                    command: CommandKind::Attack,
                    invalid: preview || !hostile,
                }
            })
            .collect()
    }

    // ------------------------------------------------------------------
    // Combat
    // ------------------------------------------------------------------

    /// Damage the live hostile covering `target`.
    ///
    /// Returns `None` if there is no such hostile within range. A lethal blow
    /// withdraws the target from the grid and from its side's roster.
    pub fn resolve_attack(&mut self, attacker: ActorId, target: CellCoord) -> Option<AttackOutcome> {
        let source = self.actor(attacker).filter(|actor| actor.is_alive())?;
        if source.pose.cell.manhattan(target) > source.stats.attack_range {
            return None;
        }
        let damage = source.stats.attack_power;
        let victim = self.actor_at(target).filter(|victim| victim.is_hostile_to(source))?.id;

        let victim_actor = self.actor_mut(victim)?;
        let killed = victim_actor.take_damage(damage);
        let remaining_health = victim_actor.health;
        let side = victim_actor.side;
        if killed {
            self.withdraw_from_grid(victim);
            if let Some(roster) = self.turns.roster_mut(side) {
                roster.remove(victim);
            }
            tracing::info!(%attacker, target = %victim, "actor defeated");
        }
        Some(AttackOutcome {
            attacker,
            target: victim,
            damage,
            remaining_health,
            killed,
        })
    }

    /// Feed all gameplay state into `state`, in id order.
    pub fn hash_state<H: Hasher>(&self, state: &mut H) {
        self.actors.len().hash(state);
        for actor in &self.actors {
            actor.hash(state);
        }
        self.turns.hash(state);
    }
}
