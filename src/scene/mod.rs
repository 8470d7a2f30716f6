//! Scene: the model arena, the ownership tree and the spatial index
//!
//! The scene is the single owner of every model's canonical pose. All pose
//! and geometry writes go through it so the spatial index never lags behind.

pub mod hierarchy;
pub mod model;

pub use model::{Flag, ModelNode, ModelSpec, Visibility};

use crate::core::error::{Result, StageError};
use crate::core::types::{Geom, ModelId, Pose, Velocity};
use crate::spatial::{Footprint, SparseHashGrid};

pub struct Scene {
    nodes: Vec<Option<ModelNode>>,
    index: SparseHashGrid,
}

impl Scene {
    pub fn new(cell_size: f64) -> Self {
        Self {
            nodes: Vec::new(),
            index: SparseHashGrid::new(cell_size),
        }
    }

    /// Register a model under its parent and index its footprint
    pub fn add(&mut self, spec: ModelSpec) -> Result<ModelId> {
        let parent_global = match spec.parent {
            Some(parent) => self.node(parent)?.global,
            None => Pose::default(),
        };

        let id = ModelId(self.nodes.len() as u32);
        let global = parent_global.compose(&spec.pose);
        let node = ModelNode {
            id,
            name: spec.name,
            parent: spec.parent,
            children: Vec::new(),
            pose: spec.pose,
            global,
            geom: spec.geom,
            vis: spec.vis,
            velocity: spec.velocity,
        };

        if let Some(parent) = spec.parent {
            if let Some(p) = self.nodes[parent.index()].as_mut() {
                p.children.push(id);
            }
        }

        self.reindex(&node);
        self.nodes.push(Some(node));
        Ok(id)
    }

    /// Remove a model and everything below it
    ///
    /// Returns the removed handles, deepest first, so callers can tear down
    /// children before their parents.
    pub fn remove_subtree(&mut self, id: ModelId) -> Result<Vec<ModelId>> {
        let parent = self.node(id)?.parent;

        let mut removed = hierarchy::descendants(self, id);
        removed.insert(0, id);
        removed.reverse();

        for &gone in &removed {
            self.index.remove(gone);
            self.nodes[gone.index()] = None;
        }

        if let Some(parent) = parent {
            if let Some(p) = self.nodes.get_mut(parent.index()).and_then(Option::as_mut) {
                p.children.retain(|&c| c != id);
            }
        }
        Ok(removed)
    }

    /// Drop every model; issued handles stay retired
    pub fn clear(&mut self) {
        self.nodes.iter_mut().for_each(|node| *node = None);
        self.index.clear();
    }

    pub fn get(&self, id: ModelId) -> Option<&ModelNode> {
        self.nodes.get(id.index()).and_then(Option::as_ref)
    }

    pub fn node(&self, id: ModelId) -> Result<&ModelNode> {
        self.get(id).ok_or(StageError::ModelNotFound(id))
    }

    pub fn contains(&self, id: ModelId) -> bool {
        self.get(id).is_some()
    }

    /// Live models in registration order
    pub fn iter(&self) -> impl Iterator<Item = &ModelNode> + '_ {
        self.nodes.iter().flatten()
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of handles ever issued
    pub fn capacity(&self) -> usize {
        self.nodes.len()
    }

    pub fn index(&self) -> &SparseHashGrid {
        &self.index
    }

    pub fn pose(&self, id: ModelId) -> Result<Pose> {
        Ok(self.node(id)?.pose)
    }

    pub fn global_pose(&self, id: ModelId) -> Result<Pose> {
        Ok(self.node(id)?.global)
    }

    /// Set a model's pose relative to its parent; moves its whole subtree
    pub fn set_pose(&mut self, id: ModelId, pose: Pose) -> Result<()> {
        self.node_mut(id)?.pose = pose;
        self.refresh_subtree(id);
        Ok(())
    }

    pub fn set_geom(&mut self, id: ModelId, geom: Geom) -> Result<()> {
        self.node_mut(id)?.geom = geom;
        if let Some(node) = self.nodes[id.index()].take() {
            self.reindex(&node);
            self.nodes[id.index()] = Some(node);
        }
        Ok(())
    }

    pub fn set_visibility(&mut self, id: ModelId, vis: Visibility) -> Result<()> {
        self.node_mut(id)?.vis = vis;
        Ok(())
    }

    pub fn set_velocity(&mut self, id: ModelId, velocity: Velocity) -> Result<()> {
        self.node_mut(id)?.velocity = velocity;
        Ok(())
    }

    /// Integrate every model's velocity over `dt` seconds
    ///
    /// Velocities are world-frame; the change is applied to the local pose
    /// after rotating it into the parent's frame.
    pub fn integrate(&mut self, dt: f64) {
        let moving: Vec<ModelId> = self
            .iter()
            .filter(|n| !n.velocity.is_zero())
            .map(|n| n.id)
            .collect();

        for id in moving {
            let Some(node) = self.get(id) else { continue };
            let parent_heading = node
                .parent
                .and_then(|p| self.get(p))
                .map(|p| p.global.a)
                .unwrap_or(0.0);
            let v = node.velocity;
            let (sin, cos) = (-parent_heading).sin_cos();
            let mut pose = node.pose;
            pose.x += (v.x * cos - v.y * sin) * dt;
            pose.y += (v.x * sin + v.y * cos) * dt;
            pose.a = crate::core::types::normalize_angle(pose.a + v.a * dt);

            if let Some(node) = self.nodes[id.index()].as_mut() {
                node.pose = pose;
            }
            self.refresh_subtree(id);
        }
    }

    fn node_mut(&mut self, id: ModelId) -> Result<&mut ModelNode> {
        self.nodes
            .get_mut(id.index())
            .and_then(Option::as_mut)
            .ok_or(StageError::ModelNotFound(id))
    }

    /// Recompute global poses and footprints for `id` and its descendants
    fn refresh_subtree(&mut self, id: ModelId) {
        let mut pending = vec![id];
        while let Some(current) = pending.pop() {
            let Some(mut node) = self.nodes[current.index()].take() else {
                continue;
            };
            let parent_global = node
                .parent
                .and_then(|p| self.get(p))
                .map(|p| p.global)
                .unwrap_or_default();
            node.global = parent_global.compose(&node.pose);
            self.reindex(&node);
            pending.extend(node.children.iter().copied());
            self.nodes[current.index()] = Some(node);
        }
    }

    fn reindex(&mut self, node: &ModelNode) {
        if node.geom.size.has_area() {
            self.index
                .insert(node.id, Footprint::from_geom(&node.global, &node.geom));
        } else {
            self.index.remove(node.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Size;

    #[test]
    fn test_child_follows_parent_pose() {
        let mut scene = Scene::new(1.0);
        let robot = scene.add(ModelSpec::new("robot")).unwrap();
        let arm = scene
            .add(
                ModelSpec::new("arm")
                    .parent(robot)
                    .pose(Pose::new(1.0, 0.0, 0.0, 0.0)),
            )
            .unwrap();

        scene
            .set_pose(robot, Pose::new(5.0, 5.0, 0.0, std::f64::consts::FRAC_PI_2))
            .unwrap();

        let g = scene.global_pose(arm).unwrap();
        assert!((g.x - 5.0).abs() < 1e-12);
        assert!((g.y - 6.0).abs() < 1e-12);
        let fp = scene.index().footprint(arm).unwrap();
        assert!((fp.center.y - 6.0).abs() < 1e-12);
    }

    #[test]
    fn test_zero_area_models_are_not_indexed() {
        let mut scene = Scene::new(1.0);
        let ghost = scene
            .add(ModelSpec::new("ghost").size(Size::new(0.0, 0.0, 0.0)))
            .unwrap();
        assert!(!scene.index().contains(ghost));

        scene
            .set_geom(ghost, Geom::new(Pose::default(), Size::new(1.0, 1.0, 1.0)))
            .unwrap();
        assert!(scene.index().contains(ghost));
    }

    #[test]
    fn test_remove_subtree_detaches_and_unindexes() {
        let mut scene = Scene::new(1.0);
        let robot = scene.add(ModelSpec::new("robot")).unwrap();
        let body = scene.add(ModelSpec::new("body").parent(robot)).unwrap();
        let bumper = scene.add(ModelSpec::new("bumper").parent(body)).unwrap();

        let removed = scene.remove_subtree(body).unwrap();
        assert_eq!(removed, vec![bumper, body]);
        assert!(scene.node(robot).unwrap().children().is_empty());
        assert!(!scene.index().contains(bumper));
        assert!(matches!(
            scene.node(body),
            Err(StageError::ModelNotFound(id)) if id == body
        ));
        // handles are never reused
        let next = scene.add(ModelSpec::new("new")).unwrap();
        assert_eq!(next, ModelId(3));
    }

    #[test]
    fn test_integrate_moves_models_with_velocity() {
        let mut scene = Scene::new(1.0);
        let robot = scene
            .add(ModelSpec::new("robot").velocity(Velocity::new(1.0, 0.0, 0.0)))
            .unwrap();
        let still = scene.add(ModelSpec::new("still")).unwrap();

        scene.integrate(0.5);
        assert!((scene.pose(robot).unwrap().x - 0.5).abs() < 1e-12);
        assert_eq!(scene.pose(still).unwrap(), Pose::default());
    }

    #[test]
    fn test_unknown_parent_rejected() {
        let mut scene = Scene::new(1.0);
        assert!(scene.add(ModelSpec::new("orphan").parent(ModelId(42))).is_err());
    }
}
