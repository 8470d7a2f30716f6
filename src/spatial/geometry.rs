//! Planar footprint geometry and ray intersection

use glam::DVec2;

use crate::core::types::{Geom, Meters, Pose};

/// Directions closer to axis-parallel than this are treated as parallel
const PARALLEL_EPSILON: f64 = 1e-12;

/// Oriented rectangle occupied by a model in the world frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Footprint {
    pub center: DVec2,
    pub half_extents: DVec2,
    pub heading: f64,
}

impl Footprint {
    /// Footprint of `geom` for a model whose global pose is `global`
    pub fn from_geom(global: &Pose, geom: &Geom) -> Self {
        let placed = global.compose(&geom.pose);
        Self {
            center: placed.position(),
            half_extents: DVec2::new(geom.size.x / 2.0, geom.size.y / 2.0),
            heading: placed.a,
        }
    }

    /// Axis-aligned bounds as (min, max)
    pub fn aabb(&self) -> (DVec2, DVec2) {
        let axis_x = DVec2::from_angle(self.heading);
        let axis_y = axis_x.perp();
        let reach = (axis_x * self.half_extents.x).abs() + (axis_y * self.half_extents.y).abs();
        (self.center - reach, self.center + reach)
    }

    /// Distance along the ray to the first point inside this footprint
    ///
    /// A ray starting inside the footprint hits it at range 0. `dir` must be
    /// a unit vector.
    pub fn ray_distance(&self, origin: DVec2, dir: DVec2, max_range: Meters) -> Option<Meters> {
        // Work in the rectangle's own frame, where it is axis-aligned.
        let unrotate = DVec2::from_angle(-self.heading);
        let o = unrotate.rotate(origin - self.center);
        let d = unrotate.rotate(dir);

        let mut t_min = f64::NEG_INFINITY;
        let mut t_max = f64::INFINITY;

        for (o, d, h) in [
            (o.x, d.x, self.half_extents.x),
            (o.y, d.y, self.half_extents.y),
        ] {
            if d.abs() < PARALLEL_EPSILON {
                if o.abs() > h {
                    return None;
                }
                continue;
            }
            let t1 = (-h - o) / d;
            let t2 = (h - o) / d;
            let (near, far) = if t1 <= t2 { (t1, t2) } else { (t2, t1) };
            t_min = t_min.max(near);
            t_max = t_max.min(far);
            if t_min > t_max {
                return None;
            }
        }

        if t_max < 0.0 {
            return None;
        }
        let t = t_min.max(0.0);
        (t <= max_range).then_some(t)
    }
}
