//! Match setup loaded from RON.
//!
//! A [`MatchConfig`] describes everything needed to build a
//! [`crate::battle::Battle`]: terrain, presentation timing and the sides with
//! their starting actors. It is plain data; validation happens in
//! [`crate::battle::Battle::from_config`].
//!
//! # Example RON
//!
//! ```ron
//! MatchConfig(
//!     grid: (width: 8, height: 8, blocked: [(x: 3, y: 3)]),
//!     sides: [
//!         (label: "Blue", controller: Human, actors: [(name: "scout", x: 1, y: 1)]),
//!         (label: "Red", controller: Auto, actors: [(name: "raider", x: 6, y: 6)]),
//!     ],
//! )
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::actor::ActorStats;
use crate::error::{Result, TacticsError};
use crate::footprint::Rotation;
use crate::grid::{CellCoord, MovementClass, TraversalWeights};

/// Complete match description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchConfig {
    /// Terrain.
    pub grid: GridConfig,
    /// Presentation timing.
    #[serde(default)]
    pub timing: TimingConfig,
    /// Sides in turn order.
    pub sides: Vec<SideConfig>,
}

/// Grid dimensions and terrain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridConfig {
    /// Cells along x.
    pub width: u32,
    /// Cells along y.
    pub height: u32,
    /// Weights for cells not listed in `weighted`.
    #[serde(default)]
    pub default_weights: TraversalWeights,
    /// Impassable cells.
    #[serde(default)]
    pub blocked: Vec<CellCoord>,
    /// Cells with non-default weights.
    #[serde(default)]
    pub weighted: Vec<WeightedCell>,
}

/// A cell with its own traversal weights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeightedCell {
    /// The cell.
    pub cell: CellCoord,
    /// Its weights.
    pub weights: TraversalWeights,
}

/// How presentation delays complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PresentationMode {
    /// Delays elapse after a fixed number of ticks.
    #[default]
    Headless,
    /// Delays end when the presentation layer signals completion.
    Signalled,
}

/// Tick counts for presentation delays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimingConfig {
    /// Ticks spent replaying each path step.
    pub step_ticks: u32,
    /// Ticks the turn banner stays up in headless mode.
    pub banner_ticks: u32,
    /// Ticks an attack presentation lasts in headless mode.
    pub attack_ticks: u32,
    /// Who ends presentation delays.
    #[serde(default)]
    pub presentation: PresentationMode,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            step_ticks: 6,
            banner_ticks: 30,
            attack_ticks: 12,
            presentation: PresentationMode::Headless,
        }
    }
}

impl TimingConfig {
    /// Every delay completes within the tick it starts.
    #[must_use]
    pub const fn instant() -> Self {
        Self {
            step_ticks: 1,
            banner_ticks: 0,
            attack_ticks: 0,
            presentation: PresentationMode::Headless,
        }
    }
}

/// Who decides for a side's actors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Controller {
    /// Menu-driven player input.
    #[default]
    Human,
    /// Built-in advance-and-attack policy.
    Auto,
}

/// One side and its starting actors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SideConfig {
    /// Display label, shown on the turn banner.
    pub label: String,
    /// Decision source.
    #[serde(default)]
    pub controller: Controller,
    /// Starting actors.
    pub actors: Vec<ActorConfig>,
}

/// Starting placement and numbers for one actor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorConfig {
    /// Display name.
    pub name: String,
    /// Pivot x.
    pub x: i32,
    /// Pivot y.
    pub y: i32,
    /// Footprint extent along x at rotation 0.
    #[serde(default = "one")]
    pub width: u32,
    /// Footprint extent along y at rotation 0.
    #[serde(default = "one")]
    pub height: u32,
    /// Starting facing.
    #[serde(default)]
    pub rotation: Rotation,
    /// Traversal weight class.
    #[serde(default)]
    pub movement_class: MovementClass,
    /// Movement allowance per turn.
    #[serde(default = "default_move_budget")]
    pub move_budget: u32,
    /// Manhattan attack radius.
    #[serde(default = "default_attack_range")]
    pub attack_range: u32,
    /// Damage per attack.
    #[serde(default = "default_attack_power")]
    pub attack_power: u32,
    /// Starting health.
    #[serde(default = "default_health")]
    pub health: u32,
}

const fn one() -> u32 {
    1
}

fn default_move_budget() -> u32 {
    ActorStats::default().move_budget
}

fn default_attack_range() -> u32 {
    ActorStats::default().attack_range
}

fn default_attack_power() -> u32 {
    ActorStats::default().attack_power
}

fn default_health() -> u32 {
    ActorStats::default().max_health
}

impl ActorConfig {
    /// A 1x1 actor at `(x, y)` with default numbers.
    #[must_use]
    pub fn new(name: impl Into<String>, x: i32, y: i32) -> Self {
        let stats = ActorStats::default();
        Self {
            name: name.into(),
            x,
            y,
            width: 1,
            height: 1,
            rotation: Rotation::IDENTITY,
            movement_class: MovementClass::Ground,
            move_budget: stats.move_budget,
            attack_range: stats.attack_range,
            attack_power: stats.attack_power,
            health: stats.max_health,
        }
    }

    /// Set the footprint dimensions.
    #[must_use]
    pub fn with_footprint(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Pivot cell.
    #[must_use]
    pub const fn cell(&self) -> CellCoord {
        CellCoord::new(self.x, self.y)
    }

    /// Numbers as [`ActorStats`].
    #[must_use]
    pub const fn stats(&self) -> ActorStats {
        ActorStats {
            move_budget: self.move_budget,
            attack_range: self.attack_range,
            attack_power: self.attack_power,
            max_health: self.health,
        }
    }
}

impl MatchConfig {
    /// Parse from a RON string.
    ///
    /// # Errors
    /// Returns [`TacticsError::ConfigParse`] if the text is not a valid config.
    pub fn from_ron_str(ron: &str) -> Result<Self> {
        Ok(ron::from_str(ron)?)
    }

    /// Read and parse a RON file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| TacticsError::ConfigRead {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_ron_str(&contents)
    }

    /// Small two-side skirmish on a 12x10 field with a wall and some rough
    /// ground.
    #[must_use]
    pub fn skirmish() -> Self {
        let rough = TraversalWeights {
            ground: 2,
            flying: 1,
        };
        Self {
            grid: GridConfig {
                width: 12,
                height: 10,
                default_weights: TraversalWeights::default(),
                blocked: vec![
                    CellCoord::new(5, 3),
                    CellCoord::new(5, 4),
                    CellCoord::new(6, 5),
                    CellCoord::new(6, 6),
                ],
                weighted: [(4, 7), (5, 7), (7, 2), (7, 3)]
                    .into_iter()
                    .map(|(x, y)| WeightedCell {
                        cell: CellCoord::new(x, y),
                        weights: rough,
                    })
                    .collect(),
            },
            timing: TimingConfig::default(),
            sides: vec![
                SideConfig {
                    label: "Blue".to_string(),
                    controller: Controller::Human,
                    actors: vec![
                        ActorConfig::new("lancer", 1, 2),
                        ActorConfig::new("warden", 2, 5).with_footprint(1, 3),
                        ActorConfig {
                            movement_class: MovementClass::Flying,
                            move_budget: 6,
                            ..ActorConfig::new("kite", 1, 8)
                        },
                    ],
                },
                SideConfig {
                    label: "Red".to_string(),
                    controller: Controller::Auto,
                    actors: vec![
                        ActorConfig::new("raider", 10, 2),
                        ActorConfig {
                            attack_range: 2,
                            attack_power: 2,
                            ..ActorConfig::new("slinger", 10, 5)
                        },
                        ActorConfig::new("brute", 9, 8).with_footprint(3, 1),
                    ],
                },
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_ron_fills_defaults() {
        let config = MatchConfig::from_ron_str(
            r#"MatchConfig(
                grid: (width: 8, height: 8, blocked: [(x: 3, y: 3)]),
                sides: [
                    (label: "Blue", controller: Human, actors: [(name: "scout", x: 1, y: 1)]),
                    (label: "Red", controller: Auto, actors: [(name: "bar", x: 6, y: 6, height: 3, rotation: 1)]),
                ],
            )"#,
        )
        .unwrap();
        assert_eq!(config.timing, TimingConfig::default());
        assert_eq!(config.grid.default_weights, TraversalWeights::uniform(1));
        assert_eq!(config.sides[0].actors[0], ActorConfig::new("scout", 1, 1));
        let bar = &config.sides[1].actors[0];
        assert_eq!((bar.width, bar.height), (1, 3));
        assert_eq!(bar.rotation, Rotation::from_quarter_turns(1));
    }

    #[test]
    fn test_parse_error_is_reported() {
        let err = MatchConfig::from_ron_str("MatchConfig(grid: ").unwrap_err();
        assert!(matches!(err, TacticsError::ConfigParse(_)));
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let err = MatchConfig::load("/definitely/not/here.ron").unwrap_err();
        assert!(matches!(err, TacticsError::ConfigRead { .. }));
    }

    #[test]
    fn test_skirmish_roundtrips_through_ron() {
        let config = MatchConfig::skirmish();
        let text = ron::ser::to_string_pretty(&config, ron::ser::PrettyConfig::default()).unwrap();
        assert_eq!(MatchConfig::from_ron_str(&text).unwrap(), config);
    }
}
