//! Cue data model.
//!
//! A cue pairs a trigger with an effect. The five kinds differ in how they
//! trigger (phrase index or absolute time, single point or range), so they
//! are separate types gathered under [`Cue`] rather than sharing a base.
//!
//! Authored configuration is immutable once built. The runtime progress of
//! the interpolating kinds lives in a separate [`CueWorking`] record, which is
//! all a restart needs to reset.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::color::Color;
use crate::math::{clamp01, inverse_lerp};
use crate::sinks::FilterKind;

/// Runtime progress of a filter or vocal-amplitude cue.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CueWorking {
    /// Playback time (ms) the cue started at. Captured on the first frame the
    /// cue is eligible and kept until restart.
    pub start_time: Option<f32>,
    /// One-shot completion latch.
    pub is_finished: bool,
}

impl CueWorking {
    /// Capture `time` as the start unless one is already held; returns the
    /// start in effect.
    pub fn capture_start(&mut self, time: f32) -> f32 {
        *self.start_time.get_or_insert(time)
    }

    pub fn reset(&mut self) {
        *self = CueWorking::default();
    }
}

/// Filter start keyframe: the phrase index it begins at and the initial value.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterStart {
    pub phrase_index: usize,
    pub value: f32,
}

/// Filter end keyframe: animation length in ms and the final value.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterDuration {
    pub time: f32,
    pub value: f32,
}

/// Animates the filter mix ratio over a fixed time from a phrase start.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterCue {
    pub start: FilterStart,
    pub duration: FilterDuration,
    pub filter: FilterKind,
    #[serde(skip)]
    pub working: CueWorking,
}

impl FilterCue {
    pub fn new(start: FilterStart, duration: FilterDuration, filter: FilterKind) -> Self {
        Self {
            start,
            duration,
            filter,
            working: CueWorking::default(),
        }
    }
}

/// Drives white-out intensity from the vocal loudness between two absolute
/// playback times.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VocalAmplitudeCue {
    pub start_time: f32,
    pub end_time: f32,
    pub filter: FilterKind,
    /// Loudness at or below this maps to 0.
    pub min: f32,
    /// Loudness at or above this maps to 1.
    pub max: f32,
    #[serde(skip)]
    pub working: CueWorking,
}

impl VocalAmplitudeCue {
    pub fn new(start_time: f32, end_time: f32, filter: FilterKind, min: f32, max: f32) -> Self {
        Self {
            start_time,
            end_time,
            filter,
            min,
            max,
            working: CueWorking::default(),
        }
    }

    /// Blackout cues fade to black, so their intensity is shifted to `[-1, 0]`.
    pub fn is_mirrored(&self) -> bool {
        self.filter == FilterKind::Blackout
    }

    /// Where `amplitude` sits in the `[min, max]` window, clamped to `[0, 1]`.
    pub fn amplitude_fraction(&self, amplitude: f32) -> f32 {
        clamp01(inverse_lerp(self.min, self.max, amplitude))
    }

    /// Intensity pushed to the filter for `amplitude`.
    pub fn intensity(&self, amplitude: f32) -> f32 {
        let t = self.amplitude_fraction(amplitude);
        if self.is_mirrored() {
            t - 1.0
        } else {
            t
        }
    }
}

/// Inclusive phrase index range.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhraseRange {
    pub start_phrase_index: usize,
    pub end_phrase_index: usize,
}

impl PhraseRange {
    pub fn new(start_phrase_index: usize, end_phrase_index: usize) -> Self {
        Self {
            start_phrase_index,
            end_phrase_index,
        }
    }

    pub fn contains(&self, index: usize) -> bool {
        (self.start_phrase_index..=self.end_phrase_index).contains(&index)
    }
}

/// Shows a texture on the stage screen for a phrase range.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenCue {
    pub range: PhraseRange,
    pub texture_key: String,
}

impl ScreenCue {
    pub fn new(range: PhraseRange, texture_key: impl Into<String>) -> Self {
        Self {
            range,
            texture_key: texture_key.into(),
        }
    }
}

/// Paints particles while the phrase index is within a range. Without a
/// colour list the particles go back to their original colour.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticleColorCue {
    pub range: PhraseRange,
    #[serde(default)]
    pub colors: Option<Vec<Color>>,
}

impl ParticleColorCue {
    pub fn new(range: PhraseRange, colors: Vec<Color>) -> Self {
        Self {
            range,
            colors: Some(colors),
        }
    }

    pub fn origin(range: PhraseRange) -> Self {
        Self {
            range,
            colors: None,
        }
    }
}

/// Switches every non-singing character's motion at a phrase index.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MotionCue {
    pub start_phrase_index: usize,
    pub play_motion_names: Vec<String>,
}

impl MotionCue {
    pub fn new<S: Into<String>>(start_phrase_index: usize, names: impl IntoIterator<Item = S>) -> Self {
        Self {
            start_phrase_index,
            play_motion_names: names.into_iter().map(Into::into).collect(),
        }
    }
}

/// Any cue kind.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Cue {
    Filter(FilterCue),
    VocalAmplitude(VocalAmplitudeCue),
    Screen(ScreenCue),
    ParticleColor(ParticleColorCue),
    Motion(MotionCue),
}

/// All cues for one song, grouped by kind in authoring order.
///
/// Kinds are evaluated in a fixed order each frame; within a kind, in the
/// order the cues were added.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CueSheet {
    #[serde(default)]
    pub filters: Vec<FilterCue>,
    #[serde(default)]
    pub vocal_amplitudes: Vec<VocalAmplitudeCue>,
    #[serde(default)]
    pub screens: Vec<ScreenCue>,
    #[serde(default)]
    pub particle_colors: Vec<ParticleColorCue>,
    #[serde(default)]
    pub motions: Vec<MotionCue>,
}

impl CueSheet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse cue sheet")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read cue sheet {}", path.display()))?;
        Self::from_json(&contents)
            .with_context(|| format!("Invalid cue sheet {}", path.display()))
    }

    /// Append a cue to the list for its kind.
    pub fn push(&mut self, cue: Cue) {
        match cue {
            Cue::Filter(cue) => self.filters.push(cue),
            Cue::VocalAmplitude(cue) => self.vocal_amplitudes.push(cue),
            Cue::Screen(cue) => self.screens.push(cue),
            Cue::ParticleColor(cue) => self.particle_colors.push(cue),
            Cue::Motion(cue) => self.motions.push(cue),
        }
    }

    pub fn with(mut self, cue: Cue) -> Self {
        self.push(cue);
        self
    }

    pub fn len(&self) -> usize {
        self.filters.len()
            + self.vocal_amplitudes.len()
            + self.screens.len()
            + self.particle_colors.len()
            + self.motions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Clear the working state of every cue. Authored fields are untouched.
    pub fn reset_working(&mut self) {
        for cue in &mut self.filters {
            cue.working.reset();
        }
        for cue in &mut self.vocal_amplitudes {
            cue.working.reset();
        }
    }
}

impl FromIterator<Cue> for CueSheet {
    fn from_iter<I: IntoIterator<Item = Cue>>(iter: I) -> Self {
        let mut sheet = CueSheet::new();
        for cue in iter {
            sheet.push(cue);
        }
        sheet
    }
}
