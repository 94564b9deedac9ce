//! Test fixtures for battles, orchestrators and scripted input.

use std::collections::VecDeque;

use fixed::types::I32F32;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tactics_core::prelude::*;

/// Create a fixed-point number from an integer.
#[must_use]
pub fn fixed(n: i32) -> I32F32 {
    I32F32::from_num(n)
}

/// Serialize to RON and back.
///
/// # Panics
///
/// Panics if either direction fails.
pub fn ron_roundtrip<T: Serialize + DeserializeOwned>(value: &T) -> T {
    let text = ron::to_string(value).expect("value serializes to RON");
    ron::from_str(&text).expect("RON output parses back")
}

/// Open grid with weight 1 everywhere.
///
/// # Panics
///
/// Panics on zero dimensions.
#[must_use]
pub fn open_grid(width: u32, height: u32) -> Grid {
    Grid::new(width, height, TraversalWeights::default()).expect("non-zero grid dimensions")
}

/// A 1x1 actor that can be tucked into an [`ActorSpawn`] quickly.
#[must_use]
pub fn spawn_at(side: u8, x: i32, y: i32) -> ActorSpawn {
    ActorSpawn {
        side: SideId(side),
        name: format!("s{side}@{x},{y}"),
        pose: Pose::new(CellCoord::new(x, y), Rotation::IDENTITY),
        footprint: Footprint::single(),
        movement_class: MovementClass::Ground,
        stats: ActorStats::default(),
    }
}

/// Builder for small test battles.
#[derive(Debug, Clone)]
pub struct BattleBuilder {
    width: u32,
    height: u32,
    labels: Vec<String>,
    timing: TimingConfig,
    blocked: Vec<CellCoord>,
    weighted: Vec<(CellCoord, TraversalWeights)>,
    spawns: Vec<ActorSpawn>,
}

impl BattleBuilder {
    /// Two sides, "Blue" and "Red", on an open grid with instant timing.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            labels: vec!["Blue".to_string(), "Red".to_string()],
            timing: TimingConfig::instant(),
            blocked: Vec::new(),
            weighted: Vec::new(),
            spawns: Vec::new(),
        }
    }

    /// Replace the side labels.
    #[must_use]
    pub fn sides(mut self, labels: &[&str]) -> Self {
        self.labels = labels.iter().map(ToString::to_string).collect();
        self
    }

    /// Replace the timing.
    #[must_use]
    pub fn timing(mut self, timing: TimingConfig) -> Self {
        self.timing = timing;
        self
    }

    /// Mark a cell blocked.
    #[must_use]
    pub fn block(mut self, x: i32, y: i32) -> Self {
        self.blocked.push(CellCoord::new(x, y));
        self
    }

    /// Give a cell its own weights.
    #[must_use]
    pub fn weight(mut self, x: i32, y: i32, ground: u32, flying: u32) -> Self {
        self.weighted
            .push((CellCoord::new(x, y), TraversalWeights { ground, flying }));
        self
    }

    /// Add a 1x1 actor with default stats.
    #[must_use]
    pub fn actor(self, side: u8, x: i32, y: i32) -> Self {
        self.spawn(spawn_at(side, x, y))
    }

    /// Add a fully specified actor.
    #[must_use]
    pub fn spawn(mut self, spawn: ActorSpawn) -> Self {
        self.spawns.push(spawn);
        self
    }

    /// Build the battle. Actors get ids in the order they were added.
    ///
    /// # Panics
    ///
    /// Panics if the setup is invalid.
    #[must_use]
    pub fn build(self) -> Battle {
        let mut grid = Grid::new(self.width, self.height, TraversalWeights::default())
            .expect("non-zero grid dimensions");
        for cell in self.blocked {
            assert!(grid.set_passability(cell, Passability::Blocked), "blocked cell {cell} out of bounds");
        }
        for (cell, weights) in self.weighted {
            assert!(grid.set_weights(cell, weights), "weighted cell {cell} out of bounds");
        }
        let mut battle = Battle::new(grid, self.labels, self.timing).expect("valid side count");
        for spawn in self.spawns {
            battle.spawn_actor(spawn).expect("valid placement");
        }
        battle
    }

    /// Build and hand to an orchestrator with the given delegates; missing
    /// sides are menu-driven.
    #[must_use]
    pub fn orchestrate(self, delegates: Vec<Box<dyn DecisionDelegate>>) -> Orchestrator {
        Orchestrator::new(self.build(), delegates)
    }
}

/// Copy of `config` with every side driven by [`AdvancePolicy`].
#[must_use]
pub fn all_auto(config: &MatchConfig) -> MatchConfig {
    let mut config = config.clone();
    for side in &mut config.sides {
        side.controller = Controller::Auto;
    }
    config
}

/// Queue of per-tick inputs fed to an orchestrator.
#[derive(Debug, Clone, Default)]
pub struct InputScript {
    inputs: VecDeque<Option<InputEvent>>,
}

impl InputScript {
    /// Empty script.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Press a button for one tick.
    #[must_use]
    pub fn press(mut self, button: Button) -> Self {
        self.inputs.push_back(Some(InputEvent::button(button)));
        self
    }

    /// Push a direction for one tick.
    #[must_use]
    pub fn dir(mut self, direction: Direction) -> Self {
        self.inputs.push_back(Some(InputEvent::direction(direction)));
        self
    }

    /// Push the same direction `count` times.
    #[must_use]
    pub fn repeat(mut self, direction: Direction, count: usize) -> Self {
        for _ in 0..count {
            self.inputs.push_back(Some(InputEvent::direction(direction)));
        }
        self
    }

    /// Let `ticks` pass without input.
    #[must_use]
    pub fn idle(mut self, ticks: usize) -> Self {
        self.inputs.extend(std::iter::repeat(None).take(ticks));
        self
    }

    /// Remaining ticks in the script.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inputs.len()
    }

    /// True if the script is used up.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }

    /// Feed every input, one per tick.
    pub fn run(mut self, orchestrator: &mut Orchestrator) {
        while let Some(input) = self.inputs.pop_front() {
            orchestrator.tick(input);
        }
    }
}

impl FromIterator<Option<InputEvent>> for InputScript {
    fn from_iter<I: IntoIterator<Item = Option<InputEvent>>>(iter: I) -> Self {
        Self {
            inputs: iter.into_iter().collect(),
        }
    }
}

/// Tick without input until the orchestrator is idle, or `max_ticks` pass.
///
/// Returns the number of ticks spent.
pub fn run_until_idle(orchestrator: &mut Orchestrator, max_ticks: u64) -> u64 {
    let mut spent = 0;
    while spent < max_ticks && orchestrator.activity() != ActivityKind::Idle {
        orchestrator.tick(None);
        spent += 1;
    }
    spent
}

/// Tick without input until the match ends, or `max_ticks` pass.
///
/// Returns the outcome if the match ended.
pub fn run_to_outcome(orchestrator: &mut Orchestrator, max_ticks: u64) -> Option<Option<SideId>> {
    for _ in 0..max_ticks {
        if let Some(outcome) = orchestrator.outcome() {
            return Some(outcome);
        }
        orchestrator.tick(None);
    }
    orchestrator.outcome()
}
