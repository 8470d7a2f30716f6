//! The fixed set of transducer-array sensor variants
//!
//! Every variant shares the array/sample machinery in
//! [`ArraySensor`](super::ArraySensor) and differs only in how a transducer
//! becomes a probe ray, what counts as visible, and its power draw.

use std::f64::consts::FRAC_PI_2;

use serde::{Deserialize, Serialize};

use crate::core::types::{Meters, ModelId, Pose, Watts};
use crate::raytrace::{fiducial_visible, obstacle_visible, ranger_visible, Matcher};
use crate::render::colors::{self, Color};
use crate::scene::Scene;
use crate::sensor::transducer::Transducer;

pub const BUMPER_WATTS: Watts = 0.1;
pub const SONAR_WATTS: Watts = 2.0;
pub const LASER_WATTS: Watts = 17.5;
pub const FIDUCIAL_WATTS: Watts = 0.0;

pub const BUMPER_HIT_THICKNESS: Meters = 0.02;
pub const BUMPER_NOHIT_THICKNESS: Meters = 0.01;
const BEAM_THICKNESS: Meters = 0.01;

/// A ray to cast, in the owning model's frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Probe {
    pub pose: Pose,
    pub range: Meters,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorKind {
    /// Binary touch strips
    Bumper,
    /// Range finders, one beam per transducer
    Sonar,
    /// Scanning range finder; transducers are the beams of one scan
    Laser,
    /// Fiducial finder, optionally restricted to one key
    Fiducial { key: Option<i32> },
}

impl SensorKind {
    pub fn name(&self) -> &'static str {
        match self {
            SensorKind::Bumper => "bumper",
            SensorKind::Sonar => "sonar",
            SensorKind::Laser => "laser",
            SensorKind::Fiducial { .. } => "fiducial",
        }
    }

    /// Operating power draw while started
    pub fn watts(&self) -> Watts {
        match self {
            SensorKind::Bumper => BUMPER_WATTS,
            SensorKind::Sonar => SONAR_WATTS,
            SensorKind::Laser => LASER_WATTS,
            SensorKind::Fiducial { .. } => FIDUCIAL_WATTS,
        }
    }

    /// Turn a transducer into the ray that senses for it
    ///
    /// A bumper is a contact strip rather than a point: its ray is turned
    /// a quarter circle and starts at one end of the strip, so it sweeps
    /// exactly the strip's length. Beam sensors cast straight along the
    /// transducer heading.
    pub fn probe(&self, transducer: &Transducer) -> Probe {
        match self {
            SensorKind::Bumper => {
                let half = transducer.length / 2.0;
                let a = transducer.pose.a + FRAC_PI_2;
                Probe {
                    pose: Pose::new(
                        transducer.pose.x - half * a.cos(),
                        transducer.pose.y - half * a.sin(),
                        transducer.pose.z,
                        a,
                    ),
                    range: transducer.length,
                }
            }
            SensorKind::Sonar | SensorKind::Laser | SensorKind::Fiducial { .. } => Probe {
                pose: transducer.pose,
                range: transducer.length,
            },
        }
    }

    /// Visibility plus relatedness exclusion, plus the key filter for fiducials
    pub fn matcher<'s>(&self, scene: &'s Scene, finder: ModelId) -> Matcher<'s> {
        match self {
            SensorKind::Bumper => Matcher::new(scene, finder, obstacle_visible),
            SensorKind::Sonar | SensorKind::Laser => Matcher::new(scene, finder, ranger_visible),
            SensorKind::Fiducial { key } => {
                let matcher = Matcher::new(scene, finder, fiducial_visible);
                match key {
                    Some(key) => matcher.with_fiducial_key(*key),
                    None => matcher,
                }
            }
        }
    }

    /// (name, token) of the show/hide toggle for this kind's data
    pub fn display_option(&self) -> (&'static str, &'static str) {
        match self {
            SensorKind::Bumper => ("Show Bumper Data", "show_bumper"),
            SensorKind::Sonar => ("Show Sonar Data", "show_sonar"),
            SensorKind::Laser => ("Show Laser Data", "show_laser"),
            SensorKind::Fiducial { .. } => ("Show Fiducial Data", "show_fiducial"),
        }
    }

    /// Color and thickness of one transducer's rectangle
    pub fn style(&self, hit: bool) -> (Color, Meters) {
        match (self, hit) {
            (SensorKind::Bumper, true) => (colors::RED, BUMPER_HIT_THICKNESS),
            (SensorKind::Bumper, false) => (colors::GREEN, BUMPER_NOHIT_THICKNESS),
            (SensorKind::Sonar, true) => (colors::SONAR_HIT, BEAM_THICKNESS),
            (SensorKind::Sonar, false) => (colors::SONAR_CLEAR, BEAM_THICKNESS),
            (SensorKind::Laser, true) => (colors::LASER_HIT, BEAM_THICKNESS),
            (SensorKind::Laser, false) => (colors::LASER_CLEAR, BEAM_THICKNESS),
            (SensorKind::Fiducial { .. }, true) => (colors::FIDUCIAL_HIT, BEAM_THICKNESS),
            (SensorKind::Fiducial { .. }, false) => (colors::FIDUCIAL_CLEAR, BEAM_THICKNESS),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bumper_probe_is_perpendicular_from_strip_end() {
        let t = Transducer::new(Pose::default(), 0.2);
        let probe = SensorKind::Bumper.probe(&t);
        assert!((probe.pose.a - FRAC_PI_2).abs() < 1e-12);
        assert!(probe.pose.x.abs() < 1e-12);
        assert!((probe.pose.y + 0.1).abs() < 1e-12);
        assert_eq!(probe.range, 0.2);
    }

    #[test]
    fn test_bumper_probe_on_rotated_transducer() {
        // strip facing +y: the ray runs along -x .. +x
        let t = Transducer::new(Pose::new(0.0, 0.3, 0.0, FRAC_PI_2), 0.4);
        let probe = SensorKind::Bumper.probe(&t);
        assert!((probe.pose.x - 0.2).abs() < 1e-12);
        assert!((probe.pose.y - 0.3).abs() < 1e-12);
        assert!((probe.pose.a - std::f64::consts::PI).abs() < 1e-12);
    }

    #[test]
    fn test_beam_probe_follows_transducer() {
        let t = Transducer::new(Pose::new(0.1, 0.0, 0.0, 0.5), 5.0);
        for kind in [SensorKind::Sonar, SensorKind::Laser, SensorKind::Fiducial { key: None }] {
            let probe = kind.probe(&t);
            assert_eq!(probe.pose, t.pose);
            assert_eq!(probe.range, 5.0);
        }
    }

    #[test]
    fn test_bumper_style_keyed_on_hit() {
        assert_eq!(SensorKind::Bumper.style(true), (colors::RED, 0.02));
        assert_eq!(SensorKind::Bumper.style(false), (colors::GREEN, 0.01));
    }
}
