//! The stage backdrop screen.
//!
//! The screen shows one texture at a time out of a fixed set registered at
//! setup. Besides per-song artwork it always knows the `none` (blank),
//! `ready` and `finished` textures used by the show sequence.

use std::collections::HashSet;

use crate::sinks::{ScreenSink, SCREEN_NONE};

pub const SCREEN_READY: &str = "ready";
pub const SCREEN_FINISHED: &str = "finished";

#[derive(Clone, Debug)]
pub struct Screen {
    textures: HashSet<String>,
    current: String,
    warned_unknown: HashSet<String>,
}

impl Default for Screen {
    fn default() -> Self {
        Self::new()
    }
}

impl Screen {
    pub fn new() -> Self {
        let textures = [SCREEN_NONE, SCREEN_READY, SCREEN_FINISHED]
            .into_iter()
            .map(str::to_string)
            .collect();
        Self {
            textures,
            current: SCREEN_NONE.to_string(),
            warned_unknown: HashSet::new(),
        }
    }

    pub fn register(&mut self, key: &str) {
        self.textures.insert(key.to_string());
    }

    pub fn current(&self) -> &str {
        &self.current
    }
}

impl ScreenSink for Screen {
    fn switch_texture(&mut self, key: &str) {
        if self.current == key {
            return;
        }
        if !self.textures.contains(key) {
            if self.warned_unknown.insert(key.to_string()) {
                log::warn!("Screen texture '{}' is not loaded - ignoring", key);
            }
            return;
        }
        log::debug!("Screen {} -> {}", self.current, key);
        self.current = key.to_string();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reserved_textures() {
        let mut screen = Screen::new();
        assert_eq!(screen.current(), SCREEN_NONE);
        screen.switch_texture(SCREEN_READY);
        assert_eq!(screen.current(), SCREEN_READY);
        screen.switch_texture(SCREEN_FINISHED);
        assert_eq!(screen.current(), SCREEN_FINISHED);
    }

    #[test]
    fn test_unknown_texture_is_ignored() {
        let mut screen = Screen::new();
        screen.register("mm2013");
        screen.switch_texture("mm2013");
        screen.switch_texture("mm1999");
        assert_eq!(screen.current(), "mm2013");
        assert!(!screen.textures.contains("mm1999"));
        assert!(screen.warned_unknown.contains("mm1999"));
    }
}
