//! Pop-out lyrics.
//!
//! Each phrase gets one lyric object the first time playback enters it. Its
//! characters start stacked at a home point above the stage, are lined up
//! side by side, and over the span of the phrase fan out toward the audience
//! while turning to face the centre. Objects retire once their phrase is
//! over.

use std::collections::HashSet;

use glam::Vec3;

use crate::math::{clamp01, ease_out_expo, inverse_lerp};
use crate::timeline::{CurrentPhrase, ScriptedTimeline, TimelineSource};

/// Where every character starts: three quarters up the screen, mid stage.
pub const LYRIC_HOME: Vec3 = Vec3::new(0.0, 60.5 * 0.775, -50.0);
/// Horizontal distance between neighbouring characters.
const CHAR_SPACING: f32 = 2.0;

/// One character of a pop-out lyric.
#[derive(Clone, Debug)]
pub struct LyricGlyph {
    pub text: String,
    pub position: Vec3,
    /// Rotation about the y axis, radians.
    pub angle: f32,
    target: Vec3,
    target_angle: f32,
}

impl LyricGlyph {
    /// `offset` is the x offset of the character once lined up.
    fn new(text: &str, offset: f32) -> Self {
        let lined = LYRIC_HOME + Vec3::new(offset, 0.0, 0.0);
        let depth = offset.abs() / 1.5;
        let spread = Vec3::new(-offset * 0.1, -depth / 4.0, depth);
        Self {
            text: text.to_string(),
            position: LYRIC_HOME,
            angle: 0.0,
            target: lined + spread,
            target_angle: (-lined.x).atan2(-lined.z),
        }
    }

    fn animate(&mut self, t: f32) {
        let eased = ease_out_expo(t);
        self.position = LYRIC_HOME.lerp(self.target, eased);
        self.angle = self.target_angle * eased;
    }
}

/// The lyric object of one phrase.
#[derive(Clone, Debug)]
pub struct PopoutLyric {
    pub phrase_index: usize,
    pub start_time: f32,
    pub end_time: f32,
    pub visible: bool,
    pub glyphs: Vec<LyricGlyph>,
}

impl PopoutLyric {
    fn new(current: &CurrentPhrase, chars: &[&str]) -> Self {
        let centre = (chars.len() as f32 - 1.0) / 2.0;
        let glyphs = chars
            .iter()
            .enumerate()
            .map(|(i, text)| LyricGlyph::new(text, (i as f32 - centre) * CHAR_SPACING))
            .collect();
        Self {
            phrase_index: current.index,
            start_time: current.phrase.start_time,
            end_time: current.phrase.end_time,
            visible: false,
            glyphs,
        }
    }

    pub fn text(&self) -> String {
        self.glyphs.iter().map(|g| g.text.as_str()).collect()
    }

    fn update(&mut self, position: f32) {
        self.visible = position >= self.start_time && position <= self.end_time;
        let t = clamp01(inverse_lerp(self.start_time, self.end_time, position));
        for glyph in &mut self.glyphs {
            glyph.animate(t);
        }
    }

    fn is_over(&self, position: f32) -> bool {
        position >= self.end_time
    }
}

/// Spawns, animates and retires the pop-out lyrics.
#[derive(Clone, Debug, Default)]
pub struct LyricManager {
    objects: Vec<PopoutLyric>,
    /// Phrase indices that already had an object this performance.
    created: HashSet<usize>,
}

impl LyricManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Live lyric objects, oldest first.
    pub fn objects(&self) -> &[PopoutLyric] {
        &self.objects
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// True once every spawned lyric has played out.
    pub fn is_finished(&self) -> bool {
        self.objects.is_empty()
    }

    /// Run one frame against the timeline.
    pub fn update(&mut self, timeline: &ScriptedTimeline) {
        if timeline.is_playing() {
            if let Some(current) = timeline.current_phrase() {
                if self.created.insert(current.index) {
                    let chars: Vec<&str> = timeline
                        .phrase_chars(&current.phrase)
                        .map(|c| c.text.as_str())
                        .collect();
                    log::debug!("Lyric for phrase {}: {:?}", current.index, chars.concat());
                    self.objects.push(PopoutLyric::new(&current, &chars));
                }
            }
        }

        let position = timeline.position();
        for object in &mut self.objects {
            object.update(position);
        }
        // A stopped timeline never reaches phrases that run past the song.
        let stopped = timeline.is_finished();
        self.objects.retain(|object| !stopped && !object.is_over(position));
    }

    /// Drop every lyric and forget which phrases were shown.
    pub fn restart(&mut self) {
        self.objects.clear();
        self.created.clear();
    }
}
