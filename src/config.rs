//! Typed simulation settings. Every section defaults to the values in
//! [`crate::constants`], so a config file only needs the fields it overrides.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_ACCURACY, DEFAULT_AWARENESS_RANGE, DEFAULT_OBSERVE_CADENCE, DEFAULT_POPULATION,
    FLEE_REACTION_PENALTY, LEVEL_UP_FACTOR, MAX_DOMINANCE, MOVE_DISTURBANCE, OCEAN_DECAY,
    PATH_REPLAN_THRESHOLD, PREY_PRIORITY, STUN_PER_DOMINANCE, TICK_MS, VIEWPORT_MARGIN,
    WATER_CADENCE_DELTA, WATER_DECAY,
};
use crate::error::ConfigError;

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct SimConfig {
    #[serde(default)]
    pub tick: TickConfig,
    #[serde(default)]
    pub population: PopulationConfig,
    #[serde(default)]
    pub behavior: BehaviorConfig,
    #[serde(default)]
    pub displacement: DisplacementConfig,
}

impl SimConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(raw)?)
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct TickConfig {
    pub tick_ms: u64,
    /// Cells around the viewport whose actors still act each tick.
    pub viewport_margin: i32,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            tick_ms: TICK_MS,
            viewport_margin: VIEWPORT_MARGIN,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PopulationConfig {
    pub count: usize,
    pub max_dominance: u8,
    pub awareness_range: u32,
    pub accuracy: u32,
    pub observe_cadence: u32,
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            count: DEFAULT_POPULATION,
            max_dominance: MAX_DOMINANCE,
            awareness_range: DEFAULT_AWARENESS_RANGE,
            accuracy: DEFAULT_ACCURACY,
            observe_cadence: DEFAULT_OBSERVE_CADENCE,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct BehaviorConfig {
    pub prey_priority: i32,
    pub stun_per_dominance: u32,
    pub flee_reaction_penalty: u32,
    pub path_replan_threshold: usize,
    pub water_cadence_delta: u32,
    pub level_up_factor: u32,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            prey_priority: PREY_PRIORITY,
            stun_per_dominance: STUN_PER_DOMINANCE,
            flee_reaction_penalty: FLEE_REACTION_PENALTY,
            path_replan_threshold: PATH_REPLAN_THRESHOLD,
            water_cadence_delta: WATER_CADENCE_DELTA,
            level_up_factor: LEVEL_UP_FACTOR,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DisplacementConfig {
    pub move_magnitude: u32,
    pub water_decay: u32,
    pub ocean_decay: u32,
}

impl Default for DisplacementConfig {
    fn default() -> Self {
        Self {
            move_magnitude: MOVE_DISTURBANCE,
            water_decay: WATER_DECAY,
            ocean_decay: OCEAN_DECAY,
        }
    }
}
