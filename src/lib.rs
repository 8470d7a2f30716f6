//! Swarm Stage - multi-robot simulation core
//!
//! A world of hierarchically attached models, a spatial index for ray
//! queries, transducer-array sensors and a tick scheduler that runs model
//! updates across a fixed worker pool.

pub mod core;
pub mod raytrace;
pub mod render;
pub mod scene;
pub mod sensor;
pub mod simulation;
pub mod spatial;

pub use crate::core::{
    ConfigError, Geom, ModelId, Pose, Result, SimulationConfig, Size, StageError, Tick,
    UpdateError, Velocity, Watts,
};
pub use crate::raytrace::{raytrace, raytrace_global, RaytraceResult};
pub use crate::scene::{Flag, ModelNode, ModelSpec, Scene, Visibility};
pub use crate::sensor::{ArraySensor, Sample, SensorKind, TransducerArray, TransducerArrayConfig};
pub use crate::simulation::{
    CallbackArgs, CallbackControl, ModelBehaviour, PowerLog, PowerSink, TickReport, UpdateContext,
    World,
};
