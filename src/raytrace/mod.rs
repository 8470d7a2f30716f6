//! Raytrace engine: bounded nearest-intersection queries
//!
//! Queries only read the scene, so any number of them may run in parallel
//! as long as nobody mutates the scene meanwhile. Threading flags are not
//! consulted here.

pub mod matcher;

pub use matcher::{fiducial_visible, obstacle_visible, ranger_visible, Matcher};

use glam::DVec2;

use crate::core::types::{Meters, ModelId, Pose};
use crate::scene::{ModelNode, Scene};

/// Outcome of one ray cast
///
/// Without a hit, `range` is the full ray length and `pose` its far end.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RaytraceResult {
    pub model: Option<ModelId>,
    pub pose: Pose,
    pub range: Meters,
}

impl RaytraceResult {
    pub fn is_hit(&self) -> bool {
        self.model.is_some()
    }

    pub fn point(&self) -> DVec2 {
        self.pose.position()
    }
}

/// Cast a ray from a world-frame pose
pub fn raytrace_global(
    scene: &Scene,
    origin: Pose,
    max_range: Meters,
    accept: impl Fn(&ModelNode) -> bool,
) -> RaytraceResult {
    let hit = scene
        .index()
        .query_nearest(origin.position(), origin.a, max_range, |candidate| {
            scene.get(candidate).is_some_and(&accept)
        });

    match hit {
        Some(hit) => RaytraceResult {
            model: Some(hit.model),
            pose: Pose::new(hit.point.x, hit.point.y, origin.z, origin.a),
            range: hit.range,
        },
        None => RaytraceResult {
            model: None,
            pose: origin.advance(max_range.max(0.0)),
            range: max_range,
        },
    }
}

/// Cast a ray from a pose expressed in `finder`'s frame
///
/// An unknown finder casts from the world origin frame.
pub fn raytrace(
    scene: &Scene,
    finder: ModelId,
    local: Pose,
    max_range: Meters,
    accept: impl Fn(&ModelNode) -> bool,
) -> RaytraceResult {
    let frame = scene.get(finder).map(|n| n.global_pose()).unwrap_or_default();
    raytrace_global(scene, frame.compose(&local), max_range, accept)
}
