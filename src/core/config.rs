//! Simulation configuration with documented defaults
//!
//! The configuration is read once when a [`World`](crate::simulation::World)
//! is constructed. Nothing here is reconfigurable mid-run.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::error::{Result, StageError};

/// Configuration for the simulation core
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    // === SCHEDULER ===
    /// Number of worker threads that run thread-safe model updates
    ///
    /// Thread-unsafe models always run on the thread calling `step`,
    /// so the effective parallelism is `worker_threads + 1` at most.
    pub worker_threads: usize,

    /// Simulated time advanced by each tick, in milliseconds
    ///
    /// Only the physics phase reads this: velocities are integrated over
    /// one interval before the sensing phase starts.
    pub interval_sim_ms: u64,

    // === SPATIAL INDEX ===
    /// Side of each cell in the spatial hash grid (meters)
    ///
    /// Smaller = fewer candidates per cell but more cells per ray.
    /// Roughly the size of a typical robot works well.
    pub cell_size: f64,

    // === VISUALIZATION ===
    /// Initial state of every sensor data toggle (`show_bumper`, ...)
    pub show_data: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            worker_threads: 4,
            interval_sim_ms: 100,
            cell_size: 1.0,
            show_data: true,
        }
    }
}

impl SimulationConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Default config with a specific worker pool size
    pub fn with_workers(worker_threads: usize) -> Self {
        Self {
            worker_threads,
            ..Self::default()
        }
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_sim_ms)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        if self.worker_threads == 0 {
            return Err(StageError::InvalidSimulationConfig(
                "worker_threads must be at least 1".into(),
            ));
        }

        if !(self.cell_size.is_finite() && self.cell_size > 0.0) {
            return Err(StageError::InvalidSimulationConfig(format!(
                "cell_size ({}) must be a positive length",
                self.cell_size
            )));
        }

        if self.interval_sim_ms == 0 {
            return Err(StageError::InvalidSimulationConfig(
                "interval_sim_ms must be positive".into(),
            ));
        }

        Ok(())
    }

    /// Parse and validate a TOML document
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: SimulationConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(SimulationConfig::default().validate().is_ok());
    }

    #[test]
    fn test_zero_workers_rejected() {
        let config = SimulationConfig::with_workers(0);
        assert!(matches!(
            config.validate(),
            Err(StageError::InvalidSimulationConfig(_))
        ));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = SimulationConfig::from_toml_str("worker_threads = 16\n").unwrap();
        assert_eq!(config.worker_threads, 16);
        assert_eq!(config.cell_size, 1.0);
        assert_eq!(config.interval(), Duration::from_millis(100));
    }

    #[test]
    fn test_negative_cell_size_rejected() {
        assert!(SimulationConfig::from_toml_str("cell_size = -2.0\n").is_err());
    }

    #[test]
    fn test_garbage_toml_is_parse_error() {
        assert!(matches!(
            SimulationConfig::from_toml_str("worker_threads = \"many\""),
            Err(StageError::TomlError(_))
        ));
    }
}
