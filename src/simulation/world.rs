//! World - the explicitly constructed simulation context
//!
//! Owns the scene (models, hierarchy, spatial index), every model's private
//! state, the tick counter and the worker pool. Each `step` runs:
//! 1. Advance the tick counter
//! 2. Physics phase: integrate velocities, refreshing the spatial index
//! 3. Update phase: every running model's update, parallel where safe
//! 4. Barrier: `step` returns only after every update has returned

use std::sync::Arc;

use crate::core::config::SimulationConfig;
use crate::core::error::{Result, StageError};
use crate::core::types::{Geom, ModelId, Pose, Tick, Velocity, Watts};
use crate::render::{DisplayOptions, DrawCommand};
use crate::scene::{Flag, ModelSpec, Scene, Visibility};
use crate::sensor::{ArraySensor, Sample, SensorKind, TransducerArray, TransducerArrayConfig};
use crate::simulation::behaviour::{DrawFrame, ModelBehaviour};
use crate::simulation::callback::{CallbackArgs, CallbackControl};
use crate::simulation::power::{NullPower, PowerSink};
use crate::simulation::scheduler::Scheduler;
use crate::simulation::slot::ModelSlot;
use crate::simulation::tick::TickReport;

pub struct World {
    config: SimulationConfig,
    scene: Scene,
    slots: Vec<Option<ModelSlot>>,
    scheduler: Scheduler,
    power: Arc<dyn PowerSink>,
    display: DisplayOptions,
    tick: Tick,
}

impl World {
    /// Validate the config and bring up the worker pool
    pub fn new(config: SimulationConfig) -> Result<Self> {
        config.validate()?;
        let scheduler = Scheduler::new(config.worker_threads)?;
        tracing::debug!(
            workers = config.worker_threads,
            cell_size = config.cell_size,
            "world created"
        );
        Ok(Self {
            scene: Scene::new(config.cell_size),
            slots: Vec::new(),
            scheduler,
            power: Arc::new(NullPower),
            display: DisplayOptions::new(config.show_data),
            tick: 0,
            config,
        })
    }

    /// Report power draws to `sink` instead of discarding them
    pub fn with_power_sink(mut self, sink: Arc<dyn PowerSink>) -> Self {
        self.power = sink;
        self
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Ticks started so far
    pub fn tick(&self) -> Tick {
        self.tick
    }

    pub fn workers(&self) -> usize {
        self.scheduler.workers()
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    // === MODEL REGISTRATION ===

    /// Add a model with no behaviour of its own (bodies, walls, ...)
    pub fn add_model(&mut self, spec: ModelSpec) -> Result<ModelId> {
        self.register(spec, None)
    }

    pub fn add_behaviour(
        &mut self,
        spec: ModelSpec,
        behaviour: Box<dyn ModelBehaviour>,
    ) -> Result<ModelId> {
        if let Some((name, token)) = behaviour.display_option() {
            self.display.register(name, token);
        }
        self.register(spec, Some(behaviour))
    }

    /// Add a transducer-array sensor
    ///
    /// An invalid configuration fails here and nothing is registered.
    pub fn add_sensor(
        &mut self,
        spec: ModelSpec,
        kind: SensorKind,
        config: &TransducerArrayConfig,
    ) -> Result<ModelId> {
        let sensor = ArraySensor::with_config(kind, config).map_err(|source| {
            StageError::Config {
                model: ModelId(self.scene.capacity() as u32),
                source,
            }
        })?;
        self.add_behaviour(spec, Box::new(sensor))
    }

    /// Add a sensor with a ready-made array (rings, fans, ...)
    pub fn add_sensor_array(
        &mut self,
        spec: ModelSpec,
        kind: SensorKind,
        array: TransducerArray,
    ) -> Result<ModelId> {
        let mut sensor = ArraySensor::new(kind);
        sensor.set_transducers(array).map_err(|source| StageError::Config {
            model: ModelId(self.scene.capacity() as u32),
            source,
        })?;
        self.add_behaviour(spec, Box::new(sensor))
    }

    fn register(
        &mut self,
        spec: ModelSpec,
        behaviour: Option<Box<dyn ModelBehaviour>>,
    ) -> Result<ModelId> {
        let name = spec.name.clone();
        let id = self.scene.add(spec)?;
        debug_assert_eq!(id.index(), self.slots.len());
        tracing::debug!(
            %id,
            name = %name,
            behaviour = behaviour.as_ref().map(|b| b.name()),
            "model registered"
        );
        self.slots.push(Some(ModelSlot::new(id, behaviour)));
        Ok(id)
    }

    /// Remove a model and its whole subtree, children first
    pub fn remove_model(&mut self, id: ModelId) -> Result<Vec<ModelId>> {
        let removed = self.scene.remove_subtree(id)?;
        for &gone in &removed {
            if let Some(mut slot) = self.slots[gone.index()].take() {
                slot.destroy();
                self.power.report(gone, 0.0);
            }
        }
        tracing::debug!(%id, count = removed.len(), "model subtree removed");
        Ok(removed)
    }

    /// Remove every model
    pub fn teardown(&mut self) {
        let count = self.scene.len();
        // later registrations are never ancestors of earlier ones
        for slot in self.slots.iter_mut().rev() {
            if let Some(mut slot) = slot.take() {
                slot.destroy();
                self.power.report(slot.id, 0.0);
            }
        }
        self.scene.clear();
        tracing::debug!(count, "world torn down");
    }

    // === LIFECYCLE ===

    pub fn startup(&mut self, id: ModelId) -> Result<Watts> {
        let watts = self.slot_mut(id)?.startup();
        self.power.report(id, watts);
        Ok(watts)
    }

    pub fn shutdown(&mut self, id: ModelId) -> Result<()> {
        self.slot_mut(id)?.shutdown();
        self.power.report(id, 0.0);
        Ok(())
    }

    pub fn startup_all(&mut self) {
        for slot in self.slots.iter_mut().flatten() {
            let watts = slot.startup();
            self.power.report(slot.id, watts);
        }
    }

    pub fn shutdown_all(&mut self) {
        for slot in self.slots.iter_mut().flatten() {
            slot.shutdown();
            self.power.report(slot.id, 0.0);
        }
    }

    pub fn is_running(&self, id: ModelId) -> bool {
        self.slot(id).is_ok_and(|s| s.running)
    }

    pub fn watts(&self, id: ModelId) -> Result<Watts> {
        Ok(self.slot(id)?.watts)
    }

    /// Override whether a model's update may run on the worker pool
    pub fn set_thread_safe(&mut self, id: ModelId, thread_safe: bool) -> Result<()> {
        self.slot_mut(id)?.thread_safe = thread_safe;
        Ok(())
    }

    pub fn is_thread_safe(&self, id: ModelId) -> Result<bool> {
        Ok(self.slot(id)?.thread_safe)
    }

    // === TICKING ===

    /// Advance the simulation by one tick
    pub fn step(&mut self) -> TickReport {
        self.tick += 1;
        self.scene.integrate(self.config.interval().as_secs_f64());
        let report = self.scheduler.run(&self.scene, self.tick, &mut self.slots);
        self.trace_report(&report);
        report
    }

    /// Like [`step`](Self::step) but with every update on the calling thread
    ///
    /// Produces the reference result the parallel schedule must match.
    pub fn step_serial(&mut self) -> TickReport {
        self.tick += 1;
        self.scene.integrate(self.config.interval().as_secs_f64());
        let report = Scheduler::run_serial(&self.scene, self.tick, &mut self.slots);
        self.trace_report(&report);
        report
    }

    pub fn run(&mut self, ticks: u64) -> Vec<TickReport> {
        (0..ticks).map(|_| self.step()).collect()
    }

    fn trace_report(&self, report: &TickReport) {
        tracing::trace!(
            tick = report.tick,
            parallel = report.parallel,
            serial = report.serial,
            failures = report.failures.len(),
            "tick complete"
        );
    }

    // === POSES AND GEOMETRY ===

    pub fn pose(&self, id: ModelId) -> Result<Pose> {
        self.scene.pose(id)
    }

    pub fn global_pose(&self, id: ModelId) -> Result<Pose> {
        self.scene.global_pose(id)
    }

    pub fn set_pose(&mut self, id: ModelId, pose: Pose) -> Result<()> {
        self.scene.set_pose(id, pose)
    }

    pub fn set_geom(&mut self, id: ModelId, geom: Geom) -> Result<()> {
        self.scene.set_geom(id, geom)
    }

    pub fn set_visibility(&mut self, id: ModelId, vis: Visibility) -> Result<()> {
        self.scene.set_visibility(id, vis)
    }

    pub fn set_velocity(&mut self, id: ModelId, velocity: Velocity) -> Result<()> {
        self.scene.set_velocity(id, velocity)
    }

    // === BEHAVIOURS AND SENSORS ===

    pub fn behaviour<T: ModelBehaviour>(&self, id: ModelId) -> Option<&T> {
        self.slot(id)
            .ok()?
            .behaviour
            .as_ref()?
            .as_any()
            .downcast_ref::<T>()
    }

    pub fn behaviour_mut<T: ModelBehaviour>(&mut self, id: ModelId) -> Option<&mut T> {
        self.slot_mut(id)
            .ok()?
            .behaviour
            .as_mut()?
            .as_any_mut()
            .downcast_mut::<T>()
    }

    pub fn sensor(&self, id: ModelId) -> Option<&ArraySensor> {
        self.behaviour::<ArraySensor>(id)
    }

    pub fn samples(&self, id: ModelId) -> Option<&[Sample]> {
        self.sensor(id)?.samples()
    }

    /// Replace a sensor's transducer array between ticks
    pub fn configure_sensor(&mut self, id: ModelId, config: &TransducerArrayConfig) -> Result<()> {
        let sensor = self
            .behaviour_mut::<ArraySensor>(id)
            .ok_or(StageError::NotASensor(id))?;
        sensor
            .configure(config)
            .map_err(|source| StageError::Config { model: id, source })
    }

    // === CALLBACKS AND FLAGS ===

    pub fn add_update_callback<F>(&mut self, id: ModelId, callback: F) -> Result<()>
    where
        F: FnMut(&mut CallbackArgs<'_>) -> CallbackControl + Send + 'static,
    {
        self.slot_mut(id)?.callbacks.push(Box::new(callback));
        Ok(())
    }

    pub fn callback_count(&self, id: ModelId) -> Result<usize> {
        Ok(self.slot(id)?.callbacks.len())
    }

    pub fn push_flag(&mut self, id: ModelId, flag: Flag) -> Result<()> {
        self.slot_mut(id)?.flags.push(flag);
        Ok(())
    }

    pub fn pop_flag(&mut self, id: ModelId) -> Result<Option<Flag>> {
        Ok(self.slot_mut(id)?.flags.pop())
    }

    pub fn flags(&self, id: ModelId) -> Result<&[Flag]> {
        Ok(&self.slot(id)?.flags)
    }

    // === VISUALIZATION ===

    pub fn display_options(&self) -> &DisplayOptions {
        &self.display
    }

    pub fn display_options_mut(&mut self) -> &mut DisplayOptions {
        &mut self.display
    }

    /// Draw commands for every model, in registration order
    pub fn visualize(&self) -> Vec<DrawCommand> {
        let mut out = Vec::new();
        self.visualize_into(&mut out);
        out
    }

    pub(crate) fn visualize_into(&self, out: &mut Vec<DrawCommand>) {
        for slot in self.slots.iter().flatten() {
            let (Some(behaviour), Some(node)) = (slot.behaviour.as_ref(), self.scene.get(slot.id))
            else {
                continue;
            };
            let frame = DrawFrame {
                model: slot.id,
                pose: node.global_pose(),
            };
            behaviour.visualize(frame, &self.display, out);
        }
    }

    fn slot(&self, id: ModelId) -> Result<&ModelSlot> {
        self.slots
            .get(id.index())
            .and_then(Option::as_ref)
            .ok_or(StageError::ModelNotFound(id))
    }

    fn slot_mut(&mut self, id: ModelId) -> Result<&mut ModelSlot> {
        self.slots
            .get_mut(id.index())
            .and_then(Option::as_mut)
            .ok_or(StageError::ModelNotFound(id))
    }
}
