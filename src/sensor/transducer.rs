//! Transducer arrays and their override-after-default configuration
//!
//! Configuration arrives already parsed: a count, a length applied to every
//! element, then sparse per-index pose and length overrides. Overrides are
//! keyed by index, so the order in which they are supplied never changes the
//! resulting array.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::core::error::ConfigError;
use crate::core::types::{Meters, Pose, Radians};

/// Largest array a single sensor may be configured with
pub const MAX_TRANSDUCERS: usize = 65_536;

/// One sensing element: a pose offset in the owning model's frame and a length
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Transducer {
    pub pose: Pose,
    pub length: Meters,
}

impl Transducer {
    pub const fn new(pose: Pose, length: Meters) -> Self {
        Self { pose, length }
    }
}

/// Ordered, fixed-size set of transducers
///
/// An empty array means "unconfigured": updates over it do nothing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransducerArray {
    transducers: Vec<Transducer>,
}

impl TransducerArray {
    pub fn new(transducers: Vec<Transducer>) -> Self {
        Self { transducers }
    }

    /// `count` rays spread evenly across `fov`, centred on heading 0
    ///
    /// A single ray points straight ahead.
    pub fn fan(count: usize, fov: Radians, range: Meters) -> Self {
        let transducers = (0..count)
            .map(|i| {
                let heading = if count > 1 {
                    -fov / 2.0 + fov * i as f64 / (count - 1) as f64
                } else {
                    0.0
                };
                Transducer::new(Pose::new(0.0, 0.0, 0.0, heading), range)
            })
            .collect();
        Self { transducers }
    }

    /// `count` outward-facing transducers on a circle of `radius`
    pub fn ring(count: usize, radius: Meters, length: Meters) -> Self {
        let transducers = (0..count)
            .map(|i| {
                let heading = std::f64::consts::TAU * i as f64 / count as f64;
                let (sin, cos) = heading.sin_cos();
                Transducer::new(Pose::new(radius * cos, radius * sin, 0.0, heading), length)
            })
            .collect();
        Self { transducers }
    }

    pub fn len(&self) -> usize {
        self.transducers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transducers.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Transducer> {
        self.transducers.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Transducer> {
        self.transducers.iter()
    }

    pub fn as_slice(&self) -> &[Transducer] {
        &self.transducers
    }
}

impl<'a> IntoIterator for &'a TransducerArray {
    type Item = &'a Transducer;
    type IntoIter = std::slice::Iter<'a, Transducer>;

    fn into_iter(self) -> Self::IntoIter {
        self.transducers.iter()
    }
}

/// `pose[index] = [x, y, z, heading_degrees]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PoseOverride {
    pub index: usize,
    pub pose: [f64; 4],
}

/// `length[index] = meters`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LengthOverride {
    pub index: usize,
    pub length: Meters,
}

/// Flat configuration of a transducer array
///
/// `count = None` leaves the array unconfigured. Overrides for indices that
/// are not mentioned keep the default pose (all zeros) and `default_length`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransducerArrayConfig {
    pub count: Option<i64>,
    pub default_length: Meters,
    pub poses: Vec<PoseOverride>,
    pub lengths: Vec<LengthOverride>,
}

impl TransducerArrayConfig {
    pub fn new(count: i64, default_length: Meters) -> Self {
        Self {
            count: Some(count),
            default_length,
            ..Self::default()
        }
    }

    pub fn pose(mut self, index: usize, pose: [f64; 4]) -> Self {
        self.poses.push(PoseOverride { index, pose });
        self
    }

    pub fn length(mut self, index: usize, length: Meters) -> Self {
        self.lengths.push(LengthOverride { index, length });
        self
    }

    /// Build the array: default length first, then overrides in index order
    pub fn build(&self) -> Result<TransducerArray, ConfigError> {
        let Some(count) = self.count else {
            return Ok(TransducerArray::default());
        };
        let count = usize::try_from(count)
            .ok()
            .filter(|n| (1..=MAX_TRANSDUCERS).contains(n))
            .ok_or(ConfigError::InvalidCount(count))?;

        check_length("length", self.default_length)?;

        let poses = keyed("pose", count, self.poses.iter().map(|o| (o.index, o.pose)))?;
        let lengths = keyed(
            "length",
            count,
            self.lengths.iter().map(|o| (o.index, o.length)),
        )?;

        let mut transducers = vec![Transducer::new(Pose::default(), self.default_length); count];
        for (index, transducer) in transducers.iter_mut().enumerate() {
            if let Some(tuple) = poses.get(&index) {
                if tuple.iter().any(|v| !v.is_finite()) {
                    return Err(ConfigError::MalformedField {
                        key: format!("pose[{index}]"),
                        reason: "non-finite component".into(),
                    });
                }
                transducer.pose = Pose::from_degrees(*tuple);
            }
            if let Some(&length) = lengths.get(&index) {
                check_length(&format!("length[{index}]"), length)?;
                transducer.length = length;
            }
        }

        Ok(TransducerArray::new(transducers))
    }
}

fn check_length(key: &str, length: Meters) -> Result<(), ConfigError> {
    if length.is_finite() && length >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::MalformedField {
            key: key.to_string(),
            reason: format!("length must be a non-negative number, got {length}"),
        })
    }
}

fn keyed<T>(
    key: &'static str,
    count: usize,
    overrides: impl Iterator<Item = (usize, T)>,
) -> Result<AHashMap<usize, T>, ConfigError> {
    let mut map = AHashMap::new();
    for (index, value) in overrides {
        if index >= count {
            return Err(ConfigError::IndexOutOfRange { key, index, count });
        }
        if map.insert(index, value).is_some() {
            return Err(ConfigError::DuplicateOverride { key, index });
        }
    }
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_length_applies_to_all() {
        let array = TransducerArrayConfig::new(3, 0.1).build().unwrap();
        assert_eq!(array.len(), 3);
        assert!(array.iter().all(|t| t.length == 0.1 && t.pose == Pose::default()));
    }

    #[test]
    fn test_index_override_wins_over_default() {
        let array = TransducerArrayConfig::new(3, 0.1)
            .length(1, 0.5)
            .pose(2, [0.2, 0.0, 0.0, 90.0])
            .build()
            .unwrap();
        assert_eq!(array.get(0).unwrap().length, 0.1);
        assert_eq!(array.get(1).unwrap().length, 0.5);
        let t2 = array.get(2).unwrap();
        assert_eq!(t2.pose.x, 0.2);
        assert!((t2.pose.a - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
        assert_eq!(t2.length, 0.1);
    }

    #[test]
    fn test_count_above_limit_is_rejected() {
        let huge = i64::MAX / 64;
        assert_eq!(
            TransducerArrayConfig::new(huge, 0.1).build(),
            Err(ConfigError::InvalidCount(huge))
        );
        let over = MAX_TRANSDUCERS as i64 + 1;
        assert_eq!(
            TransducerArrayConfig::new(over, 0.1).build(),
            Err(ConfigError::InvalidCount(over))
        );
        assert_eq!(
            TransducerArrayConfig::new(MAX_TRANSDUCERS as i64, 0.1)
                .build()
                .map(|a| a.len()),
            Ok(MAX_TRANSDUCERS)
        );
    }

    #[test]
    fn test_absent_count_is_unconfigured() {
        let array = TransducerArrayConfig::default().build().unwrap();
        assert!(array.is_empty());
    }

    #[test]
    fn test_non_positive_count_rejected() {
        assert_eq!(
            TransducerArrayConfig::new(0, 0.1).build(),
            Err(ConfigError::InvalidCount(0))
        );
        assert_eq!(
            TransducerArrayConfig::new(-2, 0.1).build(),
            Err(ConfigError::InvalidCount(-2))
        );
    }

    #[test]
    fn test_out_of_range_and_duplicate_overrides_rejected() {
        assert!(matches!(
            TransducerArrayConfig::new(2, 0.1).length(2, 0.3).build(),
            Err(ConfigError::IndexOutOfRange { index: 2, count: 2, .. })
        ));
        assert!(matches!(
            TransducerArrayConfig::new(2, 0.1)
                .pose(0, [0.0; 4])
                .pose(0, [1.0, 0.0, 0.0, 0.0])
                .build(),
            Err(ConfigError::DuplicateOverride { key: "pose", index: 0 })
        ));
    }

    #[test]
    fn test_malformed_numbers_rejected() {
        assert!(matches!(
            TransducerArrayConfig::new(1, f64::NAN).build(),
            Err(ConfigError::MalformedField { .. })
        ));
        assert!(matches!(
            TransducerArrayConfig::new(1, 0.1).length(0, -1.0).build(),
            Err(ConfigError::MalformedField { .. })
        ));
        assert!(matches!(
            TransducerArrayConfig::new(1, 0.1)
                .pose(0, [0.0, f64::INFINITY, 0.0, 0.0])
                .build(),
            Err(ConfigError::MalformedField { .. })
        ));
    }

    #[test]
    fn test_fan_spans_field_of_view() {
        let fan = TransducerArray::fan(3, std::f64::consts::PI, 8.0);
        let headings: Vec<f64> = fan.iter().map(|t| t.pose.a).collect();
        assert!((headings[0] + std::f64::consts::FRAC_PI_2).abs() < 1e-12);
        assert!(headings[1].abs() < 1e-12);
        assert!((headings[2] - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
        assert_eq!(TransducerArray::fan(1, 1.0, 2.0).get(0).unwrap().pose.a, 0.0);
    }

    #[test]
    fn test_config_deserializes_from_toml() {
        let config: TransducerArrayConfig = toml::from_str(
            r#"
            count = 2
            default_length = 0.1
            poses = [{ index = 1, pose = [0.1, 0.0, 0.0, 45.0] }]
            lengths = [{ index = 0, length = 0.3 }]
            "#,
        )
        .unwrap();
        let array = config.build().unwrap();
        assert_eq!(array.get(0).unwrap().length, 0.3);
        assert_eq!(array.get(1).unwrap().pose.x, 0.1);
    }
}
