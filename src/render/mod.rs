//! Visualization output for an external renderer
//!
//! This module is READ-ONLY - it never modifies simulation state. Sensors
//! project their latest samples into draw commands; the renderer decides how
//! to put them on screen.

pub mod colors;
pub mod options;

pub use colors::Color;
pub use options::{DisplayOption, DisplayOptions};

use glam::DVec2;
use serde::Serialize;

use crate::core::types::{ModelId, Pose};
use crate::simulation::World;

/// A filled rectangle centred on `pose`, in the frame of `model`
///
/// `frame` is the model's global pose when the command was produced, so the
/// renderer can place the rectangle without querying the world.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DrawCommand {
    pub model: ModelId,
    pub frame: Pose,
    pub pose: Pose,
    /// Extent along the pose heading, then across it
    pub size: DVec2,
    pub color: Color,
}

/// Collects all draw commands from the world into a reusable buffer.
/// Call this once per frame, passing the same buffer to avoid allocations.
pub fn collect_draw_commands(world: &World, buffer: &mut Vec<DrawCommand>) {
    buffer.clear();
    world.visualize_into(buffer);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::SimulationConfig;
    use crate::core::types::Size;
    use crate::scene::{ModelSpec, Visibility};
    use crate::sensor::{SensorKind, TransducerArrayConfig};

    #[test]
    fn test_collect_reuses_buffer_and_honours_toggle() {
        let mut world = World::new(SimulationConfig::with_workers(1)).unwrap();
        let bumper = world
            .add_sensor(
                ModelSpec::new("bumper")
                    .size(Size::default())
                    .visibility(Visibility::invisible()),
                SensorKind::Bumper,
                &TransducerArrayConfig::new(2, 0.1),
            )
            .unwrap();
        world.startup(bumper).unwrap();
        world.step();

        let stale = DrawCommand {
            model: bumper,
            frame: Pose::default(),
            pose: Pose::default(),
            size: DVec2::ONE,
            color: colors::YELLOW,
        };
        let mut buffer = vec![stale; 5];
        collect_draw_commands(&world, &mut buffer);
        assert_eq!(buffer.len(), 2);
        assert!(buffer.iter().all(|c| c.model == bumper && c.color == colors::GREEN));

        world.display_options_mut().set("show_bumper", false);
        collect_draw_commands(&world, &mut buffer);
        assert!(buffer.is_empty());
    }
}
