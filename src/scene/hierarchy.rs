//! Hierarchy operations for model parent-child relationships
//!
//! Models form a forest (collection of trees) where each tree is rooted at
//! a top-level model. Links are handles into the scene arena, so walking the
//! tree never needs owning back-pointers.

use crate::core::types::ModelId;
use crate::scene::Scene;

/// Iterate the ancestors of `id`, nearest first
pub fn ancestors(scene: &Scene, id: ModelId) -> impl Iterator<Item = ModelId> + '_ {
    let mut next = scene.get(id).and_then(|n| n.parent);
    std::iter::from_fn(move || {
        let current = next?;
        next = scene.get(current).and_then(|n| n.parent);
        Some(current)
    })
}

/// Get the top-level model that owns `id` (itself when it has no parent)
pub fn root_of(scene: &Scene, id: ModelId) -> ModelId {
    ancestors(scene, id).last().unwrap_or(id)
}

/// Check if `ancestor` lies strictly above `id` in the tree
pub fn is_ancestor(scene: &Scene, ancestor: ModelId, id: ModelId) -> bool {
    ancestors(scene, id).any(|a| a == ancestor)
}

/// Check if `descendant` lies strictly below `id` in the tree
pub fn is_descendant(scene: &Scene, descendant: ModelId, id: ModelId) -> bool {
    is_ancestor(scene, id, descendant)
}

/// True if `a` is `b`, an ancestor of `b`, or a descendant of `b`
///
/// O(depth): one ancestor walk from each side.
pub fn related(scene: &Scene, a: ModelId, b: ModelId) -> bool {
    a == b || is_ancestor(scene, a, b) || is_ancestor(scene, b, a)
}

/// All models below `id`, depth-first pre-order, children in insertion order
pub fn descendants(scene: &Scene, id: ModelId) -> Vec<ModelId> {
    let mut out = Vec::new();
    let mut stack: Vec<ModelId> = scene
        .get(id)
        .map(|n| n.children.iter().rev().copied().collect())
        .unwrap_or_default();

    while let Some(current) = stack.pop() {
        out.push(current);
        if let Some(node) = scene.get(current) {
            stack.extend(node.children.iter().rev().copied());
        }
    }
    out
}

/// Nesting depth, 0 for top-level models
pub fn depth(scene: &Scene, id: ModelId) -> usize {
    ancestors(scene, id).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::model::ModelSpec;

    /// robot(0) -> body(1) -> bumper(2)
    ///          -> sonar(3)
    /// wall(4)
    fn build() -> (Scene, [ModelId; 5]) {
        let mut scene = Scene::new(1.0);
        let robot = scene.add(ModelSpec::new("robot")).unwrap();
        let body = scene.add(ModelSpec::new("body").parent(robot)).unwrap();
        let bumper = scene.add(ModelSpec::new("bumper").parent(body)).unwrap();
        let sonar = scene.add(ModelSpec::new("sonar").parent(robot)).unwrap();
        let wall = scene.add(ModelSpec::new("wall")).unwrap();
        (scene, [robot, body, bumper, sonar, wall])
    }

    #[test]
    fn test_ancestors_nearest_first() {
        let (scene, [robot, body, bumper, ..]) = build();
        let chain: Vec<_> = ancestors(&scene, bumper).collect();
        assert_eq!(chain, vec![body, robot]);
        assert_eq!(root_of(&scene, bumper), robot);
        assert_eq!(depth(&scene, bumper), 2);
    }

    #[test]
    fn test_related_is_symmetric_over_lineage() {
        let (scene, [robot, body, bumper, sonar, wall]) = build();
        assert!(related(&scene, bumper, bumper));
        assert!(related(&scene, robot, bumper));
        assert!(related(&scene, bumper, robot));
        assert!(related(&scene, body, bumper));
        // siblings and cousins are not related
        assert!(!related(&scene, sonar, bumper));
        assert!(!related(&scene, sonar, body));
        assert!(!related(&scene, wall, robot));
    }

    #[test]
    fn test_descendants_pre_order() {
        let (scene, [robot, body, bumper, sonar, _]) = build();
        assert_eq!(descendants(&scene, robot), vec![body, bumper, sonar]);
        assert!(is_descendant(&scene, bumper, robot));
        assert!(!is_descendant(&scene, robot, bumper));
    }
}
