use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::core::types::{Meters, ModelId};
use crate::raytrace::RaytraceResult;

/// Where and what a transducer touched
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    /// World-frame intersection point
    pub point: DVec2,
    /// Distance from the probe origin
    pub range: Meters,
    pub model: ModelId,
}

/// One transducer's reading for the latest tick
///
/// The hit point exists exactly when the transducer hit something.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub contact: Option<Contact>,
}

impl Sample {
    pub fn from_ray(ray: &RaytraceResult) -> Self {
        Self {
            contact: ray.model.map(|model| Contact {
                point: ray.point(),
                range: ray.range,
                model,
            }),
        }
    }

    pub fn hit(&self) -> bool {
        self.contact.is_some()
    }

    pub fn hit_point(&self) -> Option<DVec2> {
        self.contact.map(|c| c.point)
    }

    pub fn range(&self) -> Option<Meters> {
        self.contact.map(|c| c.range)
    }
}
