use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("Invalid parameter {field}: {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("Failed to parse configuration: {0}")]
    Parse(String),

    #[error("Failed to read configuration file: {0}")]
    Read(String),
}

/// How the selector draws the first base node of a candidate edge.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum SelectionMode {
    /// Uniform over all base nodes.
    Random,
    /// Exponential decay of weight with distance from the box centre.
    Weighted { decay: f64 },
}

/// Which move the driver attempts each step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveType {
    Switch,
    Mix,
}

/// The annealing schedule. Temperatures are powers of ten: a stage at
/// `log10_temperature = t` runs at temperature `10^t`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TemperatureSchedule {
    pub start_log10: f64,
    pub end_log10: f64,
    pub increment_log10: f64,
    pub thermalisation_log10: f64,
    pub steps_per_temperature: usize,
    pub thermalisation_steps: usize,
}

impl Default for TemperatureSchedule {
    fn default() -> Self {
        Self {
            start_log10: -1.0,
            end_log10: -4.0,
            increment_log10: -0.5,
            thermalisation_log10: 1.0,
            steps_per_temperature: 100,
            thermalisation_steps: 100,
        }
    }
}

/// Immutable snapshot of every tunable the engine consumes, taken once at
/// startup.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct SimulationConfig {
    /// Crystal size when starting from scratch (ring rows must be even).
    pub ring_rows: usize,
    pub ring_cols: usize,
    pub min_coordination: usize,
    pub max_coordination: usize,
    pub min_ring_size: usize,
    pub max_ring_size: usize,
    pub selection: SelectionMode,
    pub move_type: MoveType,
    pub temperature: TemperatureSchedule,
    /// Longest admissible bond, in units of the crystal bond length.
    pub max_bond_length: f64,
    /// Widest admissible angle between consecutive neighbours, degrees.
    pub max_angle_degrees: f64,
    pub maintain_convexity: bool,
    pub random_seed: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            ring_rows: 4,
            ring_cols: 6,
            min_coordination: 3,
            max_coordination: 4,
            min_ring_size: 4,
            max_ring_size: 12,
            selection: SelectionMode::Random,
            move_type: MoveType::Switch,
            temperature: TemperatureSchedule::default(),
            max_bond_length: 2.0,
            max_angle_degrees: 180.0,
            maintain_convexity: false,
            random_seed: 0,
        }
    }
}

impl SimulationConfig {
    pub fn builder() -> SimulationConfigBuilder {
        SimulationConfigBuilder::default()
    }

    /// Parses a TOML document and validates the result.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads and validates a TOML configuration file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text =
            std::fs::read_to_string(path).map_err(|e| ConfigError::Read(e.to_string()))?;
        Self::from_toml_str(&text)
    }

    pub fn max_angle_radians(&self) -> f64 {
        self.max_angle_degrees.to_radians()
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.min_coordination < 2 {
            return Err(ConfigError::Invalid {
                field: "min_coordination",
                reason: "must be at least 2".into(),
            });
        }
        if self.max_coordination < self.min_coordination {
            return Err(ConfigError::Invalid {
                field: "max_coordination",
                reason: "must be >= min_coordination".into(),
            });
        }
        if self.min_ring_size < 3 {
            return Err(ConfigError::Invalid {
                field: "min_ring_size",
                reason: "rings cannot have fewer than 3 sides".into(),
            });
        }
        if self.max_ring_size < self.min_ring_size {
            return Err(ConfigError::Invalid {
                field: "max_ring_size",
                reason: "must be >= min_ring_size".into(),
            });
        }
        if self.max_bond_length <= 0.0 {
            return Err(ConfigError::Invalid {
                field: "max_bond_length",
                reason: "must be positive".into(),
            });
        }
        if self.max_angle_degrees <= 0.0 || self.max_angle_degrees > 360.0 {
            return Err(ConfigError::Invalid {
                field: "max_angle_degrees",
                reason: "must lie in (0, 360]".into(),
            });
        }
        if let SelectionMode::Weighted { decay } = self.selection {
            if decay < 0.0 {
                return Err(ConfigError::Invalid {
                    field: "selection.decay",
                    reason: "must be non-negative".into(),
                });
            }
        }
        Ok(())
    }
}

/// Builder for programmatic construction, mirroring the TOML surface.
#[derive(Debug, Default)]
pub struct SimulationConfigBuilder {
    config: Option<SimulationConfig>,
}

impl SimulationConfigBuilder {
    fn config(&mut self) -> &mut SimulationConfig {
        self.config.get_or_insert_with(SimulationConfig::default)
    }

    pub fn crystal(mut self, ring_rows: usize, ring_cols: usize) -> Self {
        self.config().ring_rows = ring_rows;
        self.config().ring_cols = ring_cols;
        self
    }

    pub fn coordination_bounds(mut self, min: usize, max: usize) -> Self {
        self.config().min_coordination = min;
        self.config().max_coordination = max;
        self
    }

    pub fn ring_size_bounds(mut self, min: usize, max: usize) -> Self {
        self.config().min_ring_size = min;
        self.config().max_ring_size = max;
        self
    }

    pub fn selection(mut self, mode: SelectionMode) -> Self {
        self.config().selection = mode;
        self
    }

    pub fn move_type(mut self, move_type: MoveType) -> Self {
        self.config().move_type = move_type;
        self
    }

    pub fn temperature(mut self, schedule: TemperatureSchedule) -> Self {
        self.config().temperature = schedule;
        self
    }

    pub fn max_bond_length(mut self, length: f64) -> Self {
        self.config().max_bond_length = length;
        self
    }

    pub fn max_angle_degrees(mut self, degrees: f64) -> Self {
        self.config().max_angle_degrees = degrees;
        self
    }

    pub fn maintain_convexity(mut self, enabled: bool) -> Self {
        self.config().maintain_convexity = enabled;
        self
    }

    pub fn random_seed(mut self, seed: u64) -> Self {
        self.config().random_seed = seed;
        self
    }

    pub fn build(mut self) -> Result<SimulationConfig, ConfigError> {
        let config = self.config().clone();
        config.validate()?;
        Ok(config)
    }
}
