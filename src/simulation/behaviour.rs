//! Per-model behaviour driven by the tick scheduler

use std::any::Any;

use crate::core::error::UpdateError;
use crate::core::types::{Meters, ModelId, Pose, Tick, Watts};
use crate::raytrace::{self, RaytraceResult};
use crate::render::{DisplayOptions, DrawCommand};
use crate::scene::{hierarchy, ModelNode, Scene};

/// Read-only view of the world handed to one model's update
///
/// Everything reachable from here is shared with every other model updating
/// in the same tick, so none of it can be mutated.
#[derive(Clone, Copy)]
pub struct UpdateContext<'w> {
    scene: &'w Scene,
    model: ModelId,
    tick: Tick,
}

impl<'w> UpdateContext<'w> {
    pub fn new(scene: &'w Scene, model: ModelId, tick: Tick) -> Self {
        Self { scene, model, tick }
    }

    pub fn scene(&self) -> &'w Scene {
        self.scene
    }

    /// The model being updated
    pub fn model(&self) -> ModelId {
        self.model
    }

    pub fn tick(&self) -> Tick {
        self.tick
    }

    pub fn global_pose(&self) -> Pose {
        self.scene
            .get(self.model)
            .map(ModelNode::global_pose)
            .unwrap_or_default()
    }

    pub fn related(&self, other: ModelId) -> bool {
        hierarchy::related(self.scene, self.model, other)
    }

    /// Cast a ray from a pose in this model's frame
    pub fn raytrace(
        &self,
        local: Pose,
        max_range: Meters,
        accept: impl Fn(&ModelNode) -> bool,
    ) -> RaytraceResult {
        raytrace::raytrace(self.scene, self.model, local, max_range, accept)
    }
}

/// Where a model's visualization lands
#[derive(Debug, Clone, Copy)]
pub struct DrawFrame {
    pub model: ModelId,
    pub pose: Pose,
}

/// Startup/update/shutdown capability shared by every behaviour a model
/// can carry
///
/// `update` must be a bounded computation: it never waits on another model
/// and only writes state owned by `self`.
pub trait ModelBehaviour: Send + Any {
    fn name(&self) -> &'static str;

    /// Whether `update` may run concurrently with other models' updates
    fn thread_safe(&self) -> bool {
        true
    }

    /// Start operating; returns the power draw to report
    fn startup(&mut self) -> Watts;

    fn update(&mut self, ctx: &UpdateContext<'_>) -> Result<(), UpdateError>;

    /// Stop operating; power drops to zero
    fn shutdown(&mut self);

    /// Release everything before the model leaves the world
    fn destroy(&mut self) {
        self.shutdown();
    }

    fn visualize(&self, _frame: DrawFrame, _options: &DisplayOptions, _out: &mut Vec<DrawCommand>) {}

    /// Toggle to register for this behaviour's data, as (name, token)
    fn display_option(&self) -> Option<(&'static str, &'static str)> {
        None
    }

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}
