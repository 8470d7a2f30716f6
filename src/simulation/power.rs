//! Power draw notifications
//!
//! Startup and shutdown report a model's watt draw to a sink. The world never
//! reads anything back from the sink.

use std::sync::Mutex;

use ahash::AHashMap;

use crate::core::types::{ModelId, Watts};

pub trait PowerSink: Send + Sync {
    fn report(&self, model: ModelId, watts: Watts);
}

/// Discards reports after logging them
#[derive(Debug, Default, Clone, Copy)]
pub struct NullPower;

impl PowerSink for NullPower {
    fn report(&self, model: ModelId, watts: Watts) {
        tracing::trace!(%model, watts, "power draw");
    }
}

/// Keeps the latest draw reported for each model
#[derive(Debug, Default)]
pub struct PowerLog {
    draws: Mutex<AHashMap<ModelId, Watts>>,
}

impl PowerLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn draw(&self, model: ModelId) -> Option<Watts> {
        self.draws
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(&model)
            .copied()
    }

    pub fn total(&self) -> Watts {
        self.draws
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .values()
            .sum()
    }
}

impl PowerSink for PowerLog {
    fn report(&self, model: ModelId, watts: Watts) {
        self.draws
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(model, watts);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_power_log_keeps_latest() {
        let log = PowerLog::new();
        log.report(ModelId(1), 0.1);
        log.report(ModelId(2), 2.0);
        log.report(ModelId(1), 0.0);
        assert_eq!(log.draw(ModelId(1)), Some(0.0));
        assert_eq!(log.draw(ModelId(3)), None);
        assert!((log.total() - 2.0).abs() < 1e-12);
    }
}
