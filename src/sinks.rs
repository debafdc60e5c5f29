//! Effect sinks driven by the cue evaluator.
//!
//! Each sink is a one-way command interface: the evaluator never reads sink
//! state back, so when two cues write the same sink in one frame the later
//! call wins.

use serde::{Deserialize, Serialize};

use crate::color::Color;

/// Reserved screen texture key that shows the plain screen.
pub const SCREEN_NONE: &str = "none";

/// Post-processing filter selector.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterKind {
    /// No colour filter.
    #[default]
    None,
    /// Fade to black; its intensity lives in `[-1, 0]`.
    Blackout,
    Sepia,
}

pub trait FilterSink {
    fn set_filter_kind(&mut self, kind: FilterKind);

    /// Blend between the unfiltered and filtered image, `[0, 1]`.
    fn set_filter_mix_ratio(&mut self, ratio: f32);

    /// White-out (positive) or black-out (negative) intensity, `[-1, 1]`.
    fn set_white_out_intensity(&mut self, intensity: f32);
}

pub trait ScreenSink {
    /// Show the texture registered under `key`, or [`SCREEN_NONE`].
    fn switch_texture(&mut self, key: &str);
}

pub trait ParticleSink {
    /// Paint particles round-robin from `colors`.
    fn set_particle_colors(&mut self, colors: &[Color]);

    /// Return every particle to the colour it was created with.
    fn reset_particle_colors(&mut self);

    /// One-shot dispersal. Repeat calls are the sink's to ignore.
    fn spread_particles(&mut self);
}

pub trait MotionSink {
    /// Names of the managed characters, in a stable order.
    fn character_names(&self) -> Vec<String>;

    /// Replace the motions `character` is playing with `motions`.
    fn play_motions(&mut self, character: &str, motions: &[String]);
}

/// The four sinks a directing pass writes to, borrowed for one frame.
pub struct StageTargets<'a> {
    pub filter: &'a mut dyn FilterSink,
    pub screen: &'a mut dyn ScreenSink,
    pub particles: &'a mut dyn ParticleSink,
    pub characters: &'a mut dyn MotionSink,
}
