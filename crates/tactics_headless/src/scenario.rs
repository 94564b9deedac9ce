//! Scenario loading and configuration.
//!
//! A scenario is a [`MatchConfig`] plus the metadata a headless run needs:
//! a name for logs and a turn cap so stalled automated matches terminate.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tactics_core::prelude::*;
use thiserror::Error;

/// Error type for scenario operations.
#[derive(Error, Debug)]
pub enum ScenarioError {
    /// File not found.
    #[error("Scenario file not found: {0}")]
    FileNotFound(String),
    /// Failed to read file.
    #[error("Failed to read scenario file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse RON.
    #[error("Failed to parse scenario: {0}")]
    ParseError(#[from] ron::error::SpannedError),
    /// The match described cannot be built.
    #[error("Invalid scenario setup: {0}")]
    Setup(#[from] TacticsError),
}

/// A complete scenario configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    /// Scenario name.
    pub name: String,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
    /// Turn number after which an unfinished run is abandoned.
    #[serde(default = "default_max_turns")]
    pub max_turns: u32,
    /// The match itself.
    pub config: MatchConfig,
}

fn default_max_turns() -> u32 {
    40
}

impl Default for Scenario {
    fn default() -> Self {
        Self::skirmish()
    }
}

impl Scenario {
    /// Load a scenario from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ScenarioError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ScenarioError::FileNotFound(path.display().to_string()));
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_ron_str(&contents)
    }

    /// Parse a scenario from RON text.
    pub fn from_ron_str(ron: &str) -> Result<Self, ScenarioError> {
        let scenario: Scenario = ron::from_str(ron)?;
        Ok(scenario)
    }

    /// The built-in skirmish with its configured controllers.
    #[must_use]
    pub fn skirmish() -> Self {
        Self {
            name: "Skirmish".to_string(),
            description: "Two small squads across a broken wall".to_string(),
            max_turns: default_max_turns(),
            config: MatchConfig::skirmish(),
        }
    }

    /// Copy of this scenario with every side automated.
    #[must_use]
    pub fn automated(&self) -> Self {
        let mut scenario = self.clone();
        for side in &mut scenario.config.sides {
            side.controller = Controller::Auto;
        }
        scenario
    }

    /// Copy of this scenario whose presentation delays finish immediately.
    #[must_use]
    pub fn instant(&self) -> Self {
        let mut scenario = self.clone();
        scenario.config.timing = TimingConfig {
            presentation: scenario.config.timing.presentation,
            ..TimingConfig::instant()
        };
        scenario
    }

    /// Build an orchestrator for this scenario.
    pub fn orchestrator(&self) -> Result<Orchestrator, ScenarioError> {
        Ok(Orchestrator::from_config(&self.config)?)
    }
}
