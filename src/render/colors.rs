//! Color definitions for sensor data and flags

use serde::{Deserialize, Serialize};

/// RGBA color (0.0 to 1.0 per channel)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }
}

pub const RED: Color = Color::new(1.0, 0.0, 0.0, 1.0);
pub const GREEN: Color = Color::new(0.0, 1.0, 0.0, 1.0);
pub const YELLOW: Color = Color::new(1.0, 1.0, 0.0, 1.0);

/// Translucent sonar cone colors
pub const SONAR_HIT: Color = Color::new(0.9, 0.3, 0.1, 0.6);
pub const SONAR_CLEAR: Color = Color::new(0.3, 0.3, 0.9, 0.3);

/// Laser beams
pub const LASER_HIT: Color = Color::new(0.0, 0.0, 1.0, 0.8);
pub const LASER_CLEAR: Color = Color::new(0.6, 0.6, 1.0, 0.2);

/// Fiducial lines of sight
pub const FIDUCIAL_HIT: Color = Color::new(0.9, 0.0, 0.9, 0.9);
pub const FIDUCIAL_CLEAR: Color = Color::new(0.9, 0.6, 0.9, 0.2);
