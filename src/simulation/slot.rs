//! Per-model mutable state, exclusively owned by its model

use std::panic::{self, AssertUnwindSafe};

use crate::core::error::UpdateError;
use crate::core::types::{ModelId, Tick, Watts};
use crate::scene::{Flag, Scene};
use crate::simulation::behaviour::{ModelBehaviour, UpdateContext};
use crate::simulation::callback::{run_callbacks, UpdateCallback};
use crate::simulation::tick::UpdateFailure;

pub(crate) struct ModelSlot {
    pub(crate) id: ModelId,
    pub(crate) behaviour: Option<Box<dyn ModelBehaviour>>,
    pub(crate) thread_safe: bool,
    pub(crate) running: bool,
    pub(crate) watts: Watts,
    pub(crate) flags: Vec<Flag>,
    pub(crate) callbacks: Vec<UpdateCallback>,
}

impl ModelSlot {
    pub(crate) fn new(id: ModelId, behaviour: Option<Box<dyn ModelBehaviour>>) -> Self {
        let thread_safe = behaviour.as_ref().map_or(true, |b| b.thread_safe());
        Self {
            id,
            behaviour,
            thread_safe,
            running: false,
            watts: 0.0,
            flags: Vec::new(),
            callbacks: Vec::new(),
        }
    }

    pub(crate) fn startup(&mut self) -> Watts {
        self.watts = self.behaviour.as_mut().map_or(0.0, |b| b.startup());
        self.running = true;
        self.watts
    }

    pub(crate) fn shutdown(&mut self) {
        if let Some(behaviour) = self.behaviour.as_mut() {
            behaviour.shutdown();
        }
        self.watts = 0.0;
        self.running = false;
    }

    pub(crate) fn destroy(&mut self) {
        if let Some(behaviour) = self.behaviour.as_mut() {
            behaviour.destroy();
        }
        self.watts = 0.0;
        self.running = false;
        self.callbacks.clear();
        self.flags.clear();
    }

    /// Run this model's update and callbacks for one tick
    ///
    /// A failure or panic is contained here: it aborts only this model's
    /// contribution to the tick.
    pub(crate) fn run_update(&mut self, scene: &Scene, tick: Tick) -> Option<UpdateFailure> {
        let ctx = UpdateContext::new(scene, self.id, tick);
        let behaviour = &mut self.behaviour;
        let callbacks = &mut self.callbacks;
        let flags = &mut self.flags;
        let id = self.id;

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| -> Result<(), UpdateError> {
            if let Some(behaviour) = behaviour.as_mut() {
                behaviour.update(&ctx)?;
            }
            run_callbacks(callbacks, id, tick, flags);
            Ok(())
        }));

        let error = match outcome {
            Ok(Ok(())) => return None,
            Ok(Err(error)) => error,
            Err(payload) => UpdateError::Panicked(panic_message(payload.as_ref())),
        };

        tracing::warn!(model = %self.id, tick, %error, "model update failed");
        Some(UpdateFailure {
            model: self.id,
            error,
        })
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
