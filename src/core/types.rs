//! Core type definitions used throughout the codebase

use derive_more::{Display, From};
use glam::DVec2;
use serde::{Deserialize, Serialize};

/// Stable handle of a model in the world arena
///
/// Handles are handed out in registration order and never reused, so the
/// numeric order doubles as registration order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display, From,
)]
#[display(fmt = "model#{}", _0)]
pub struct ModelId(pub u32);

impl ModelId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Simulation tick counter (simulation time unit)
pub type Tick = u64;

/// Length in meters
pub type Meters = f64;

/// Power draw in watts
pub type Watts = f64;

/// Angle in radians
pub type Radians = f64;

/// Wrap an angle into (-PI, PI]
pub fn normalize_angle(a: Radians) -> Radians {
    let wrapped = a.sin().atan2(a.cos());
    if wrapped <= -std::f64::consts::PI {
        std::f64::consts::PI
    } else {
        wrapped
    }
}

/// 2D pose with a height component
///
/// `a` is the heading in radians. `z` is carried for configuration fidelity
/// but plays no part in the planar raytrace.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub x: Meters,
    pub y: Meters,
    pub z: Meters,
    pub a: Radians,
}

impl Pose {
    pub const fn new(x: Meters, y: Meters, z: Meters, a: Radians) -> Self {
        Self { x, y, z, a }
    }

    /// Pose from a world-file style tuple `[x, y, z, heading_degrees]`
    pub fn from_degrees(tuple: [f64; 4]) -> Self {
        Self::new(tuple[0], tuple[1], tuple[2], tuple[3].to_radians())
    }

    pub fn position(&self) -> DVec2 {
        DVec2::new(self.x, self.y)
    }

    /// Compose `local`, expressed in this pose's frame, into the outer frame
    pub fn compose(&self, local: &Pose) -> Pose {
        let (sin, cos) = self.a.sin_cos();
        Pose {
            x: self.x + local.x * cos - local.y * sin,
            y: self.y + local.x * sin + local.y * cos,
            z: self.z + local.z,
            a: normalize_angle(self.a + local.a),
        }
    }

    /// Point reached after travelling `range` along this pose's heading
    pub fn advance(&self, range: Meters) -> Pose {
        let (sin, cos) = self.a.sin_cos();
        Pose {
            x: self.x + range * cos,
            y: self.y + range * sin,
            ..*self
        }
    }
}

/// Extent of a model's bounding box
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub x: Meters,
    pub y: Meters,
    pub z: Meters,
}

impl Size {
    pub const fn new(x: Meters, y: Meters, z: Meters) -> Self {
        Self { x, y, z }
    }

    /// True when the planar footprint encloses some area
    pub fn has_area(&self) -> bool {
        self.x > 0.0 && self.y > 0.0
    }
}

/// Bounding geometry: a box of `size` centred at `pose` in the model frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Geom {
    pub pose: Pose,
    pub size: Size,
}

impl Geom {
    pub const fn new(pose: Pose, size: Size) -> Self {
        Self { pose, size }
    }
}

/// Velocity in the world frame, integrated during the physics phase
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Velocity {
    pub x: f64,
    pub y: f64,
    pub a: f64,
}

impl Velocity {
    pub const fn new(x: f64, y: f64, a: f64) -> Self {
        Self { x, y, a }
    }

    pub fn is_zero(&self) -> bool {
        self.x == 0.0 && self.y == 0.0 && self.a == 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_model_id_ordering_follows_registration() {
        let a = ModelId(1);
        let b = ModelId(2);
        assert!(a < b);
        assert_eq!(a.to_string(), "model#1");
    }

    #[test]
    fn test_compose_rotates_local_offset() {
        let parent = Pose::new(1.0, 1.0, 0.0, FRAC_PI_2);
        let child = parent.compose(&Pose::new(1.0, 0.0, 0.0, 0.0));
        assert!((child.x - 1.0).abs() < 1e-12);
        assert!((child.y - 2.0).abs() < 1e-12);
        assert!((child.a - FRAC_PI_2).abs() < 1e-12);
    }

    #[test]
    fn test_normalize_angle_wraps() {
        let a = normalize_angle(3.0 * std::f64::consts::PI);
        assert!((a - std::f64::consts::PI).abs() < 1e-9);
        assert!((normalize_angle(-FRAC_PI_2) + FRAC_PI_2).abs() < 1e-12);
    }

    #[test]
    fn test_from_degrees_converts_heading() {
        let p = Pose::from_degrees([0.5, 0.0, 0.1, 90.0]);
        assert!((p.a - FRAC_PI_2).abs() < 1e-12);
        assert_eq!(p.z, 0.1);
    }
}
