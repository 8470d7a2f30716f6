//! Tick outcome reporting

use serde::Serialize;

use crate::core::error::UpdateError;
use crate::core::types::{ModelId, Tick};

/// One model's update that did not complete
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateFailure {
    pub model: ModelId,
    pub error: UpdateError,
}

/// Summary of one completed tick
///
/// Returned only after the end-of-tick barrier, so every update it counts
/// has already returned.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    pub tick: Tick,
    /// Updates dispatched to the worker pool
    pub parallel: usize,
    /// Updates run one at a time on the calling thread
    pub serial: usize,
    /// Failures in model handle order
    pub failures: Vec<UpdateFailure>,
}

impl TickReport {
    pub fn updated(&self) -> usize {
        self.parallel + self.serial
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn summary(&self) -> TickSummary {
        TickSummary {
            tick: self.tick,
            parallel: self.parallel,
            serial: self.serial,
            failures: self.failures.len(),
        }
    }
}

/// Serializable digest of a [`TickReport`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TickSummary {
    pub tick: Tick,
    pub parallel: usize,
    pub serial: usize,
    pub failures: usize,
}
