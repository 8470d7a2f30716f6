//! Transducer-array sensor model
//!
//! Lifecycle: `Unconfigured -> Configured -> Started <-> Stopped -> Destroyed`.
//! The sample buffer is allocated lazily by the first update after startup
//! and dropped by shutdown or reconfiguration; it never exists while the
//! array is empty.

use std::any::Any;
use std::fmt;

use glam::DVec2;

use crate::core::error::{ConfigError, UpdateError};
use crate::core::types::Watts;
use crate::raytrace::raytrace;
use crate::render::{DisplayOptions, DrawCommand};
use crate::sensor::kind::SensorKind;
use crate::sensor::sample::Sample;
use crate::sensor::transducer::{TransducerArray, TransducerArrayConfig};
use crate::simulation::behaviour::{DrawFrame, ModelBehaviour, UpdateContext};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorState {
    Unconfigured,
    Configured,
    Started,
    Stopped,
    Destroyed,
}

impl SensorState {
    pub fn name(&self) -> &'static str {
        match self {
            SensorState::Unconfigured => "unconfigured",
            SensorState::Configured => "configured",
            SensorState::Started => "started",
            SensorState::Stopped => "stopped",
            SensorState::Destroyed => "destroyed",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ArraySensor {
    kind: SensorKind,
    state: SensorState,
    transducers: TransducerArray,
    samples: Option<Vec<Sample>>,
    watts: Watts,
}

impl ArraySensor {
    pub fn new(kind: SensorKind) -> Self {
        Self {
            kind,
            state: SensorState::Unconfigured,
            transducers: TransducerArray::default(),
            samples: None,
            watts: 0.0,
        }
    }

    /// Build a sensor and configure it, failing fast on a bad configuration
    pub fn with_config(
        kind: SensorKind,
        config: &TransducerArrayConfig,
    ) -> Result<Self, ConfigError> {
        let mut sensor = Self::new(kind);
        sensor.configure(config)?;
        Ok(sensor)
    }

    pub fn kind(&self) -> SensorKind {
        self.kind
    }

    pub fn state(&self) -> SensorState {
        self.state
    }

    pub fn watts(&self) -> Watts {
        self.watts
    }

    pub fn transducers(&self) -> &TransducerArray {
        &self.transducers
    }

    /// Latest samples; `None` until the first update after startup
    pub fn samples(&self) -> Option<&[Sample]> {
        self.samples.as_deref()
    }

    /// Replace the whole array from a flat configuration
    ///
    /// On error the previous array stays in place untouched.
    pub fn configure(&mut self, config: &TransducerArrayConfig) -> Result<(), ConfigError> {
        let array = config.build()?;
        self.set_transducers(array)
    }

    /// Replace the whole array; the sample buffer is discarded
    pub fn set_transducers(&mut self, array: TransducerArray) -> Result<(), ConfigError> {
        if self.state == SensorState::Destroyed {
            return Err(ConfigError::Destroyed(self.kind.name()));
        }

        tracing::debug!(
            kind = self.kind.name(),
            count = array.len(),
            "configured transducer array"
        );
        self.transducers = array;
        self.samples = None;
        if matches!(self.state, SensorState::Unconfigured | SensorState::Configured) {
            self.state = if self.transducers.is_empty() {
                SensorState::Unconfigured
            } else {
                SensorState::Configured
            };
        }
        Ok(())
    }

    /// Number of transducers currently reporting a hit
    pub fn hit_count(&self) -> usize {
        self.samples
            .as_ref()
            .map_or(0, |s| s.iter().filter(|s| s.hit()).count())
    }

    fn sense(&mut self, ctx: &UpdateContext<'_>) {
        if self.transducers.is_empty() {
            return;
        }

        let scene = ctx.scene();
        let matcher = self.kind.matcher(scene, ctx.model());
        let count = self.transducers.len();
        let samples = self
            .samples
            .get_or_insert_with(|| vec![Sample::default(); count]);

        for (transducer, sample) in self.transducers.iter().zip(samples.iter_mut()) {
            let probe = self.kind.probe(transducer);
            let ray = raytrace(scene, ctx.model(), probe.pose, probe.range, |c| {
                matcher.accepts(c)
            });
            *sample = Sample::from_ray(&ray);
        }
    }
}

impl ModelBehaviour for ArraySensor {
    fn name(&self) -> &'static str {
        self.kind.name()
    }

    fn startup(&mut self) -> Watts {
        match self.state {
            SensorState::Started | SensorState::Destroyed => {}
            _ => {
                tracing::debug!(kind = self.kind.name(), "sensor startup");
                self.watts = self.kind.watts();
                self.state = SensorState::Started;
            }
        }
        self.watts
    }

    fn update(&mut self, ctx: &UpdateContext<'_>) -> Result<(), UpdateError> {
        if self.state != SensorState::Started {
            return Err(UpdateError::NotRunning(self.state.name()));
        }
        self.sense(ctx);
        Ok(())
    }

    fn shutdown(&mut self) {
        if self.state == SensorState::Destroyed {
            return;
        }
        if self.state == SensorState::Started {
            tracing::debug!(kind = self.kind.name(), "sensor shutdown");
        }
        self.watts = 0.0;
        self.samples = None;
        self.state = SensorState::Stopped;
    }

    fn destroy(&mut self) {
        self.watts = 0.0;
        self.samples = None;
        self.transducers = TransducerArray::default();
        self.state = SensorState::Destroyed;
    }

    fn visualize(&self, frame: DrawFrame, options: &DisplayOptions, out: &mut Vec<DrawCommand>) {
        let (_, token) = self.kind.display_option();
        if !options.enabled(token) {
            return;
        }
        let Some(samples) = self.samples.as_ref() else {
            return;
        };

        for (transducer, sample) in self.transducers.iter().zip(samples) {
            let (color, thickness) = self.kind.style(sample.hit());
            out.push(DrawCommand {
                model: frame.model,
                frame: frame.pose,
                pose: transducer.pose,
                size: DVec2::new(transducer.length, thickness),
                color,
            });
        }
    }

    fn display_option(&self) -> Option<(&'static str, &'static str)> {
        Some(self.kind.display_option())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl fmt::Display for ArraySensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]:", self.kind.name(), self.transducers.len())?;
        match &self.samples {
            Some(samples) => {
                for sample in samples {
                    write!(f, " {}", u8::from(sample.hit()))?;
                }
                Ok(())
            }
            None => write!(f, " -"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{Pose, Size};
    use crate::sensor::kind::BUMPER_WATTS;
    use crate::scene::{ModelSpec, Scene};

    fn bumper(count: i64) -> ArraySensor {
        ArraySensor::with_config(SensorKind::Bumper, &TransducerArrayConfig::new(count, 0.2))
            .unwrap()
    }

    #[test]
    fn test_state_machine() {
        let mut sensor = ArraySensor::new(SensorKind::Bumper);
        assert_eq!(sensor.state(), SensorState::Unconfigured);

        sensor.configure(&TransducerArrayConfig::new(2, 0.1)).unwrap();
        assert_eq!(sensor.state(), SensorState::Configured);

        assert_eq!(sensor.startup(), BUMPER_WATTS);
        assert_eq!(sensor.state(), SensorState::Started);
        // startup twice is a no-op
        assert_eq!(sensor.startup(), BUMPER_WATTS);

        sensor.shutdown();
        assert_eq!(sensor.state(), SensorState::Stopped);
        assert_eq!(sensor.watts(), 0.0);
        sensor.shutdown();
        assert_eq!(sensor.state(), SensorState::Stopped);
        // configuration survives shutdown
        assert_eq!(sensor.transducers().len(), 2);

        sensor.destroy();
        assert_eq!(sensor.state(), SensorState::Destroyed);
        assert!(sensor.transducers().is_empty());
        assert_eq!(
            sensor.configure(&TransducerArrayConfig::new(1, 0.1)),
            Err(ConfigError::Destroyed("bumper"))
        );
    }

    #[test]
    fn test_shutdown_before_startup_stops() {
        let mut sensor = bumper(2);
        assert_eq!(sensor.state(), SensorState::Configured);
        sensor.shutdown();
        assert_eq!(sensor.state(), SensorState::Stopped);
        assert_eq!(sensor.watts(), 0.0);

        // a stopped sensor can still be reconfigured and started
        sensor.configure(&TransducerArrayConfig::new(3, 0.1)).unwrap();
        assert_eq!(sensor.state(), SensorState::Stopped);
        assert_eq!(sensor.startup(), BUMPER_WATTS);
        assert_eq!(sensor.state(), SensorState::Started);
    }

    #[test]
    fn test_update_before_startup_is_rejected() {
        let scene = Scene::new(1.0);
        let mut sensor = bumper(1);
        let ctx = UpdateContext::new(&scene, crate::core::types::ModelId(0), 1);
        assert_eq!(
            sensor.update(&ctx),
            Err(UpdateError::NotRunning("configured"))
        );
        assert!(sensor.samples().is_none());
    }

    #[test]
    fn test_unconfigured_update_is_noop() {
        let mut scene = Scene::new(1.0);
        let me = scene.add(ModelSpec::new("me")).unwrap();
        let mut sensor = ArraySensor::new(SensorKind::Bumper);
        sensor.startup();
        sensor.update(&UpdateContext::new(&scene, me, 1)).unwrap();
        assert!(sensor.samples().is_none());
    }

    #[test]
    fn test_failed_configure_keeps_previous_array() {
        let mut sensor = bumper(2);
        assert!(sensor.configure(&TransducerArrayConfig::new(0, 0.1)).is_err());
        assert_eq!(sensor.transducers().len(), 2);
    }

    #[test]
    fn test_summary_and_visualization() {
        let mut scene = Scene::new(1.0);
        let me = scene
            .add(ModelSpec::new("me").size(Size::new(0.1, 0.1, 0.1)))
            .unwrap();
        scene
            .add(
                ModelSpec::new("wall")
                    .pose(Pose::new(0.0, 0.08, 0.0, 0.0))
                    .size(Size::new(1.0, 0.05, 0.5)),
            )
            .unwrap();

        let mut sensor = ArraySensor::with_config(
            SensorKind::Bumper,
            &TransducerArrayConfig::new(2, 0.2).pose(1, [0.0, 0.5, 0.0, 0.0]),
        )
        .unwrap();
        assert_eq!(sensor.to_string(), "bumper[2]: -");

        sensor.startup();
        sensor.update(&UpdateContext::new(&scene, me, 1)).unwrap();
        assert_eq!(sensor.to_string(), "bumper[2]: 1 0");
        assert_eq!(sensor.hit_count(), 1);

        let mut options = DisplayOptions::default();
        let frame = DrawFrame {
            model: me,
            pose: Pose::default(),
        };
        let mut out = Vec::new();
        sensor.visualize(frame, &options, &mut out);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].size, DVec2::new(0.2, 0.02));
        assert_eq!(out[1].size, DVec2::new(0.2, 0.01));

        options.set("show_bumper", false);
        out.clear();
        sensor.visualize(frame, &options, &mut out);
        assert!(out.is_empty());
        // projection never touches the samples
        assert_eq!(sensor.hit_count(), 1);
    }
}
