pub mod config;
pub mod error;
pub mod types;

pub use config::SimulationConfig;
pub use error::{ConfigError, Result, StageError, UpdateError};
pub use types::{Geom, Meters, ModelId, Pose, Radians, Size, Tick, Velocity, Watts};
