//! Update callbacks and the flag stack they can manipulate

use crate::core::types::{ModelId, Tick};
use crate::scene::Flag;

/// What a callback wants after it ran
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackControl {
    /// Run again next tick
    Continue,
    /// Unregister this callback
    Remove,
}

/// State a callback may touch: only its own model's
pub struct CallbackArgs<'a> {
    model: ModelId,
    tick: Tick,
    flags: &'a mut Vec<Flag>,
}

impl<'a> CallbackArgs<'a> {
    pub(crate) fn new(model: ModelId, tick: Tick, flags: &'a mut Vec<Flag>) -> Self {
        Self { model, tick, flags }
    }

    pub fn model(&self) -> ModelId {
        self.model
    }

    /// Number of ticks the world has started so far
    pub fn tick(&self) -> Tick {
        self.tick
    }

    pub fn push_flag(&mut self, flag: Flag) {
        self.flags.push(flag);
    }

    pub fn pop_flag(&mut self) -> Option<Flag> {
        self.flags.pop()
    }

    pub fn flag_count(&self) -> usize {
        self.flags.len()
    }
}

/// Runs after its model's own update, on the same thread
pub type UpdateCallback = Box<dyn FnMut(&mut CallbackArgs<'_>) -> CallbackControl + Send>;

/// Run every callback once, dropping those that ask to be removed
pub(crate) fn run_callbacks(
    callbacks: &mut Vec<UpdateCallback>,
    model: ModelId,
    tick: Tick,
    flags: &mut Vec<Flag>,
) {
    callbacks.retain_mut(|callback| {
        let mut args = CallbackArgs::new(model, tick, flags);
        callback(&mut args) == CallbackControl::Continue
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::colors;

    #[test]
    fn test_removed_callbacks_do_not_run_again() {
        let mut flags = Vec::new();
        let mut callbacks: Vec<UpdateCallback> = vec![
            Box::new(|args| {
                args.push_flag(Flag::new(colors::YELLOW, 0.4));
                CallbackControl::Remove
            }),
            Box::new(|args| {
                if args.tick() % 2 == 0 {
                    args.push_flag(Flag::new(colors::RED, 0.2));
                }
                CallbackControl::Continue
            }),
        ];

        for tick in 1..=4 {
            run_callbacks(&mut callbacks, ModelId(0), tick, &mut flags);
        }
        assert_eq!(callbacks.len(), 1);
        // one yellow on tick 1, red on ticks 2 and 4
        assert_eq!(flags.len(), 3);
        assert_eq!(flags[0].color, colors::YELLOW);
    }
}
