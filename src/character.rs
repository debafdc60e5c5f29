//! On-stage characters and the motions they play.
//!
//! A character plays a set of named motion clips at once. Playing a new set
//! starts only the clips that are not running and stops the ones no longer
//! wanted, so re-sending the same set every frame is harmless.

use std::collections::HashSet;

use crate::sinks::MotionSink;
use crate::timeline::Beat;

/// Motion the song's own singers play instead of a cue's motions.
pub const SING_MOTION: &str = "sing_1";
/// Clap motion; it lasts one beat where every other motion lasts a bar.
pub const CLAP_MOTION: &str = "clap_1";

/// Motion clips every character is created with.
pub const DEFAULT_MOTIONS: [&str; 7] = [
    "shake_rightarm_2",
    "shake_rightarm",
    "shake_upperbody_x",
    "shake_upperbody_z",
    "shake_upperbody_z2",
    SING_MOTION,
    CLAP_MOTION,
];

/// A named motion clip and its current playback length.
#[derive(Clone, Debug, PartialEq)]
pub struct MotionClip {
    pub name: String,
    /// Seconds per loop.
    pub duration: f32,
}

#[derive(Clone, Debug)]
pub struct Character {
    name: String,
    clips: Vec<MotionClip>,
    /// Playing clips, in start order.
    playing: Vec<String>,
    warned_unknown_motions: HashSet<String>,
}

impl Character {
    pub fn new<S: AsRef<str>>(name: impl Into<String>, motions: &[S]) -> Self {
        Self {
            name: name.into(),
            clips: motions
                .iter()
                .map(|m| MotionClip {
                    name: m.as_ref().to_string(),
                    duration: 1.0,
                })
                .collect(),
            playing: Vec::new(),
            warned_unknown_motions: HashSet::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn playing(&self) -> &[String] {
        &self.playing
    }

    pub fn clip(&self, name: &str) -> Option<&MotionClip> {
        self.clips.iter().find(|clip| clip.name == name)
    }

    /// Play exactly `names`: start the missing ones, stop the rest.
    pub fn play<S: AsRef<str>>(&mut self, names: &[S]) {
        for name in names {
            let name = name.as_ref();
            if self.playing.iter().any(|p| p == name) {
                continue;
            }
            if self.clip(name).is_none() {
                if self.warned_unknown_motions.insert(name.to_string()) {
                    log::warn!("Character '{}' has no motion '{}'", self.name, name);
                }
                continue;
            }
            log::debug!("{}: start {}", self.name, name);
            self.playing.push(name.to_string());
        }

        let character = &self.name;
        self.playing.retain(|playing| {
            let keep = names.iter().any(|n| n.as_ref() == playing);
            if !keep {
                log::debug!("{}: stop {}", character, playing);
            }
            keep
        });
    }

    /// Fit motion lengths to the beat: claps to one beat, the rest to a bar.
    pub fn set_duration_by_beat(&mut self, beat_duration: f32, beats_per_bar: u32) {
        for clip in &mut self.clips {
            clip.duration = if clip.name == CLAP_MOTION {
                beat_duration
            } else {
                beat_duration * beats_per_bar as f32
            };
        }
    }
}

/// All characters on stage, in creation order.
#[derive(Clone, Debug, Default)]
pub struct CharacterManager {
    characters: Vec<Character>,
    warned_unknown_characters: HashSet<String>,
}

impl CharacterManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create one character per name, each with [`DEFAULT_MOTIONS`].
    pub fn with_roster<S: AsRef<str>>(names: &[S]) -> Self {
        let mut manager = Self::new();
        for name in names {
            manager.add(Character::new(name.as_ref(), &DEFAULT_MOTIONS));
        }
        manager
    }

    /// Add a character, replacing any with the same name.
    pub fn add(&mut self, character: Character) {
        match self.characters.iter_mut().find(|c| c.name == character.name) {
            Some(existing) => *existing = character,
            None => self.characters.push(character),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Character> {
        self.characters.iter().find(|c| c.name == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.characters.iter().map(|c| c.name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Character> {
        self.characters.iter()
    }

    pub fn len(&self) -> usize {
        self.characters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.characters.is_empty()
    }

    /// Stop every motion on every character.
    pub fn stop_all(&mut self) {
        for character in &mut self.characters {
            character.play::<&str>(&[]);
        }
    }

    pub fn set_duration_by_beat(&mut self, beat: &Beat) {
        let beat_seconds = beat.duration / 1000.0;
        for character in &mut self.characters {
            character.set_duration_by_beat(beat_seconds, beat.length);
        }
    }

    /// Per-frame update: keep motion lengths in step with the current beat.
    pub fn update(&mut self, beat: Option<Beat>) {
        if let Some(beat) = beat {
            self.set_duration_by_beat(&beat);
        }
    }
}

impl MotionSink for CharacterManager {
    fn character_names(&self) -> Vec<String> {
        self.names().map(str::to_string).collect()
    }

    fn play_motions(&mut self, character: &str, motions: &[String]) {
        match self.characters.iter_mut().find(|c| c.name == character) {
            Some(c) => c.play(motions),
            None => {
                if self.warned_unknown_characters.insert(character.to_string()) {
                    log::warn!("No character named '{}' on stage", character);
                }
            }
        }
    }
}
