//! Acceptance predicates for ray casts
//!
//! A matcher decides whether a candidate model intersecting a ray counts as
//! a hit. The standard matchers AND a visibility test with relatedness
//! exclusion, so a sensor never detects its own model tree.

use crate::core::types::ModelId;
use crate::scene::hierarchy::related;
use crate::scene::{ModelNode, Scene, Visibility};

/// Visibility test on a candidate's return flags
pub type VisibilityTest = fn(&Visibility) -> bool;

pub fn obstacle_visible(vis: &Visibility) -> bool {
    vis.obstacle_return
}

pub fn ranger_visible(vis: &Visibility) -> bool {
    vis.ranger_return > 0.0
}

pub fn fiducial_visible(vis: &Visibility) -> bool {
    vis.fiducial_return != 0
}

/// Composable candidate predicate bound to the model casting the ray
#[derive(Clone, Copy)]
pub struct Matcher<'s> {
    scene: &'s Scene,
    finder: ModelId,
    visible: VisibilityTest,
    fiducial_key: Option<i32>,
}

impl<'s> Matcher<'s> {
    /// Visibility via `visible`, excluding the finder's own lineage
    pub fn new(scene: &'s Scene, finder: ModelId, visible: VisibilityTest) -> Self {
        Self {
            scene,
            finder,
            visible,
            fiducial_key: None,
        }
    }

    /// Obstacle-visible and unrelated to the finder
    pub fn obstacles(scene: &'s Scene, finder: ModelId) -> Self {
        Self::new(scene, finder, obstacle_visible)
    }

    /// Additionally require a matching fiducial key
    pub fn with_fiducial_key(mut self, key: i32) -> Self {
        self.fiducial_key = Some(key);
        self
    }

    pub fn finder(&self) -> ModelId {
        self.finder
    }

    pub fn accepts(&self, candidate: &ModelNode) -> bool {
        (self.visible)(&candidate.vis)
            && self
                .fiducial_key
                .map_or(true, |key| candidate.vis.fiducial_key == key)
            && !related(self.scene, candidate.id, self.finder)
    }

    /// AND an arbitrary extra term onto this matcher
    pub fn and<F>(self, extra: F) -> impl Fn(&ModelNode) -> bool + 's
    where
        F: Fn(&ModelNode) -> bool + 's,
    {
        move |candidate| self.accepts(candidate) && extra(candidate)
    }
}
