//! Model nodes as stored in the scene arena

use serde::{Deserialize, Serialize};

use crate::core::types::{Geom, ModelId, Pose, Size, Velocity};
use crate::render::colors::Color;

/// What other models' sensors can perceive of this model
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Visibility {
    /// Blocks bumpers (and anything else using the obstacle test)
    pub obstacle_return: bool,
    /// Reflectance seen by sonar and laser; zero or less is invisible
    pub ranger_return: f64,
    /// Fiducial id reported to fiducial finders; 0 means not a fiducial
    pub fiducial_return: i32,
    /// Only fiducial finders with a matching key (or no key) see this model
    pub fiducial_key: i32,
}

impl Default for Visibility {
    fn default() -> Self {
        Self {
            obstacle_return: true,
            ranger_return: 1.0,
            fiducial_return: 0,
            fiducial_key: 0,
        }
    }
}

impl Visibility {
    /// Seen by nothing
    pub fn invisible() -> Self {
        Self {
            obstacle_return: false,
            ranger_return: 0.0,
            fiducial_return: 0,
            fiducial_key: 0,
        }
    }
}

/// Construction parameters for a model
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSpec {
    pub name: String,
    pub parent: Option<ModelId>,
    /// Pose relative to the parent (or the world when there is none)
    pub pose: Pose,
    pub geom: Geom,
    pub vis: Visibility,
    pub velocity: Velocity,
}

impl ModelSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: None,
            pose: Pose::default(),
            geom: Geom::new(Pose::default(), Size::new(1.0, 1.0, 1.0)),
            vis: Visibility::default(),
            velocity: Velocity::default(),
        }
    }

    pub fn parent(mut self, parent: ModelId) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn pose(mut self, pose: Pose) -> Self {
        self.pose = pose;
        self
    }

    pub fn size(mut self, size: Size) -> Self {
        self.geom.size = size;
        self
    }

    pub fn geom(mut self, geom: Geom) -> Self {
        self.geom = geom;
        self
    }

    pub fn visibility(mut self, vis: Visibility) -> Self {
        self.vis = vis;
        self
    }

    pub fn velocity(mut self, velocity: Velocity) -> Self {
        self.velocity = velocity;
        self
    }
}

/// A node of the world's ownership tree
#[derive(Debug, Clone)]
pub struct ModelNode {
    pub(crate) id: ModelId,
    pub(crate) name: String,
    pub(crate) parent: Option<ModelId>,
    pub(crate) children: Vec<ModelId>,
    pub(crate) pose: Pose,
    pub(crate) global: Pose,
    pub(crate) geom: Geom,
    pub(crate) vis: Visibility,
    pub(crate) velocity: Velocity,
}

impl ModelNode {
    pub fn id(&self) -> ModelId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<ModelId> {
        self.parent
    }

    /// Children in the order they were added
    pub fn children(&self) -> &[ModelId] {
        &self.children
    }

    /// Pose relative to the parent
    pub fn pose(&self) -> Pose {
        self.pose
    }

    /// Pose in the world frame
    pub fn global_pose(&self) -> Pose {
        self.global
    }

    pub fn geom(&self) -> Geom {
        self.geom
    }

    pub fn vis(&self) -> &Visibility {
        &self.vis
    }

    pub fn velocity(&self) -> Velocity {
        self.velocity
    }
}

/// A colored marker a model can carry around
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Flag {
    pub color: Color,
    pub size: f64,
}

impl Flag {
    pub fn new(color: Color, size: f64) -> Self {
        Self { color, size }
    }
}
