//! Transducer-array sensors: bumpers, sonars, lasers and fiducial finders

pub mod array;
pub mod kind;
pub mod sample;
pub mod transducer;

pub use array::{ArraySensor, SensorState};
pub use kind::{Probe, SensorKind};
pub use sample::{Contact, Sample};
pub use transducer::{
    LengthOverride, PoseOverride, Transducer, TransducerArray, TransducerArrayConfig,
    MAX_TRANSDUCERS,
};
