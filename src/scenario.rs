use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{rng::RngManager, scheduler::Cadence, world::World};

pub const MIN_GRID_SIZE: usize = 10;
pub const MAX_GRID_SIZE: usize = 100;
pub const GRID_STEP: usize = 10;

fn default_grid_size() -> usize {
    50
}

fn default_agents() -> usize {
    5
}

fn default_faction_colors() -> Vec<String> {
    ["red", "green", "blue", "yellow"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_tick_interval_ms() -> u64 {
    1_000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_capacity() -> usize {
    500
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub seed: u64,
    #[serde(default = "default_grid_size")]
    pub grid_size: usize,
    #[serde(default = "default_agents")]
    pub agents: usize,
    #[serde(default = "default_faction_colors")]
    pub faction_colors: Vec<String>,
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    #[serde(default)]
    pub cadence: Cadence,
    #[serde(default)]
    pub ticks: Option<u64>,
    /// Registers tile regrowth in the tick loop. Off unless asked for.
    #[serde(default)]
    pub regrowth_enabled: bool,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Action log entries kept before the oldest are dropped.
    #[serde(default = "default_log_capacity")]
    pub max_entries: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            max_entries: default_log_capacity(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read scenario file {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse scenario file {}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("invalid scenario: {0}")]
    Validation(String),
}

pub struct ScenarioLoader {
    base_dir: PathBuf,
}

impl ScenarioLoader {
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    pub fn load(&self, file: impl AsRef<Path>) -> Result<Scenario, ConfigError> {
        let path = self.base_dir.join(file);
        let data = fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;
        let scenario: Scenario =
            serde_yaml::from_str(&data).map_err(|source| ConfigError::Parse {
                path: path.clone(),
                source,
            })?;
        scenario.validate()?;
        Ok(scenario)
    }
}

impl Default for Scenario {
    fn default() -> Self {
        Self::frontier()
    }
}

impl Scenario {
    /// The stock world: a 50x50 grid, five agents and four factions.
    pub fn frontier() -> Self {
        Self {
            name: "frontier".to_string(),
            description: None,
            seed: 7,
            grid_size: default_grid_size(),
            agents: default_agents(),
            faction_colors: default_faction_colors(),
            tick_interval_ms: default_tick_interval_ms(),
            cadence: Cadence::default(),
            ticks: None,
            regrowth_enabled: false,
            logging: LoggingConfig::default(),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_GRID_SIZE..=MAX_GRID_SIZE).contains(&self.grid_size)
            || self.grid_size % GRID_STEP != 0
        {
            return Err(ConfigError::Validation(format!(
                "grid_size must be a multiple of {GRID_STEP} between {MIN_GRID_SIZE} and {MAX_GRID_SIZE}, got {}",
                self.grid_size
            )));
        }
        if self.tick_interval_ms == 0 {
            return Err(ConfigError::Validation(
                "tick_interval_ms must be greater than zero".into(),
            ));
        }
        if self.faction_colors.is_empty() {
            return Err(ConfigError::Validation(
                "at least one faction colour is required".into(),
            ));
        }
        if self.logging.max_entries == 0 {
            return Err(ConfigError::Validation(
                "logging.max_entries must be greater than zero".into(),
            ));
        }
        Ok(())
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn ticks(&self, override_ticks: Option<u64>) -> Option<u64> {
        override_ticks.or(self.ticks)
    }

    pub fn build_world(&self, rng: &mut RngManager) -> World {
        World::generate(
            self.grid_size,
            self.agents,
            &self.faction_colors,
            self.logging.max_entries,
            &mut rng.stream("setup"),
        )
    }
}
