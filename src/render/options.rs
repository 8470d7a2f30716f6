//! Runtime show/hide toggles for sensor data visualization

use ahash::AHashMap;

/// A named boolean toggle, e.g. "Show Bumper Data" / `show_bumper`
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayOption {
    pub name: &'static str,
    pub token: &'static str,
    pub enabled: bool,
}

/// Toggles keyed by token
///
/// Tokens nobody registered fall back to `default_enabled`.
#[derive(Debug, Clone)]
pub struct DisplayOptions {
    options: AHashMap<&'static str, DisplayOption>,
    default_enabled: bool,
}

impl DisplayOptions {
    pub fn new(default_enabled: bool) -> Self {
        Self {
            options: AHashMap::new(),
            default_enabled,
        }
    }

    /// Register a toggle; an existing registration keeps its current value
    pub fn register(&mut self, name: &'static str, token: &'static str) {
        let enabled = self.default_enabled;
        self.options.entry(token).or_insert(DisplayOption {
            name,
            token,
            enabled,
        });
    }

    pub fn enabled(&self, token: &str) -> bool {
        self.options
            .get(token)
            .map_or(self.default_enabled, |o| o.enabled)
    }

    /// Set a toggle, registering it under its token if needed
    pub fn set(&mut self, token: &'static str, enabled: bool) {
        self.options
            .entry(token)
            .or_insert(DisplayOption {
                name: token,
                token,
                enabled,
            })
            .enabled = enabled;
    }

    pub fn toggle(&mut self, token: &'static str) -> bool {
        let next = !self.enabled(token);
        self.set(token, next);
        next
    }

    /// Registered toggles sorted by token
    pub fn iter(&self) -> impl Iterator<Item = &DisplayOption> {
        let mut all: Vec<_> = self.options.values().collect();
        all.sort_by_key(|o| o.token);
        all.into_iter()
    }
}

impl Default for DisplayOptions {
    fn default() -> Self {
        Self::new(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_then_toggle() {
        let mut options = DisplayOptions::default();
        options.register("Show Bumper Data", "show_bumper");
        assert!(options.enabled("show_bumper"));
        assert!(!options.toggle("show_bumper"));
        assert!(!options.enabled("show_bumper"));

        // re-registering keeps the user's choice
        options.register("Show Bumper Data", "show_bumper");
        assert!(!options.enabled("show_bumper"));
    }

    #[test]
    fn test_unknown_token_uses_default() {
        let options = DisplayOptions::new(false);
        assert!(!options.enabled("show_laser"));
    }
}
