//! Tick-driven simulation: world, scheduler and per-model behaviours

pub mod behaviour;
pub mod callback;
pub mod power;
pub mod scheduler;
pub(crate) mod slot;
pub mod tick;
pub mod world;

pub use behaviour::{DrawFrame, ModelBehaviour, UpdateContext};
pub use callback::{CallbackArgs, CallbackControl, UpdateCallback};
pub use power::{NullPower, PowerLog, PowerSink};
pub use scheduler::Scheduler;
pub use tick::{TickReport, TickSummary, UpdateFailure};
pub use world::World;
