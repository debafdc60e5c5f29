//! Playback timeline as seen by the directing code.
//!
//! A [`TimelineSource`] answers "where are we in the song": playback position
//! in milliseconds, the lyric phrase currently being sung, the beat, the
//! vocal loudness and whether the repeated last-chorus segment has begun.
//!
//! [`ScriptedTimeline`] is a self-contained implementation driven from a
//! JSON script, used for headless runs and tests.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::song::{find_song, SongId, SongInfo};

/// A contiguous lyric unit, in milliseconds.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Phrase {
    /// Phrase start (inclusive).
    pub start_time: f32,
    /// Phrase end (exclusive).
    pub end_time: f32,
}

impl Phrase {
    pub fn new(start_time: f32, end_time: f32) -> Self {
        Self { start_time, end_time }
    }

    pub fn contains(&self, position: f32) -> bool {
        position >= self.start_time && position < self.end_time
    }
}

/// One sung character of the lyrics, in milliseconds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LyricChar {
    pub text: String,
    pub start_time: f32,
    pub end_time: f32,
}

/// The phrase active at the current position, with its ordinal index.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CurrentPhrase {
    pub index: usize,
    pub phrase: Phrase,
}

/// The beat active at the current position.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Beat {
    /// Beat start in milliseconds.
    pub start_time: f32,
    /// Beat duration in milliseconds.
    pub duration: f32,
    /// Beats per bar.
    pub length: u32,
}

/// Read-only view of playback state consumed once per frame.
pub trait TimelineSource {
    /// Whether playback is running. Cue evaluation is skipped otherwise.
    fn is_playing(&self) -> bool;

    /// Playback position in milliseconds. Monotonic; 0 after a restart.
    fn position(&self) -> f32;

    /// The phrase at the current position, or `None` between phrases.
    fn current_phrase(&self) -> Option<CurrentPhrase>;

    /// Whether the repeated last-chorus segment has begun.
    fn is_started_last_chorus(&self) -> bool;

    /// Vocal loudness at `position` (milliseconds).
    fn vocal_amplitude(&self, position: f32) -> f32;

    /// Largest vocal loudness in the song.
    fn max_vocal_amplitude(&self) -> f32;

    /// The beat at the current position, if the song has a beat grid.
    fn current_beat(&self) -> Option<Beat>;

    /// Static metadata of the song being played.
    fn song(&self) -> &SongInfo;
}

/// Vocal loudness sampled at a fixed rate.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VocalEnvelope {
    pub samples: Vec<f32>,
    /// Samples per second.
    pub sample_rate: f32,
}

impl VocalEnvelope {
    pub fn new(samples: Vec<f32>, sample_rate: f32) -> Self {
        Self { samples, sample_rate }
    }

    /// Sample the envelope at `position` milliseconds with linear
    /// interpolation. Outside the envelope the vocal is silent.
    pub fn sample(&self, position: f32) -> f32 {
        if self.samples.is_empty() || self.sample_rate <= 0.0 || position < 0.0 {
            return 0.0;
        }
        let index = position / 1000.0 * self.sample_rate;
        let i = index as usize;
        let frac = index.fract();

        if i >= self.samples.len() {
            return 0.0;
        }

        let v0 = self.samples[i];
        let v1 = self.samples.get(i + 1).copied().unwrap_or(v0);
        v0 + (v1 - v0) * frac
    }

    pub fn max(&self) -> f32 {
        self.samples.iter().copied().fold(0.0, f32::max)
    }
}

/// Regular beat grid.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BeatGrid {
    pub bpm: f32,
    /// Time of the first beat in milliseconds.
    #[serde(default)]
    pub offset: f32,
    #[serde(default = "default_beats_per_bar")]
    pub beats_per_bar: u32,
}

fn default_beats_per_bar() -> u32 {
    4
}

impl BeatGrid {
    pub fn beat_duration(&self) -> f32 {
        60_000.0 / self.bpm
    }

    /// The beat containing `position`, or `None` before the first beat.
    pub fn beat_at(&self, position: f32) -> Option<Beat> {
        if self.bpm <= 0.0 || position < self.offset {
            return None;
        }
        let duration = self.beat_duration();
        let index = ((position - self.offset) / duration).floor();
        Some(Beat {
            start_time: self.offset + index * duration,
            duration,
            length: self.beats_per_bar,
        })
    }
}

/// On-disk description of a song's timeline.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineScript {
    pub song_id: SongId,
    /// Song length in milliseconds.
    pub duration: f32,
    pub phrases: Vec<Phrase>,
    /// Start of the repeated last-chorus segment in milliseconds.
    #[serde(default)]
    pub last_chorus_start: Option<f32>,
    #[serde(default)]
    pub beat_grid: Option<BeatGrid>,
    #[serde(default)]
    pub vocal_amplitude: VocalEnvelope,
    /// Overrides the envelope maximum when the analysis service reports one.
    #[serde(default)]
    pub max_vocal_amplitude: Option<f32>,
    /// Sung characters, in any order.
    #[serde(default)]
    pub chars: Vec<LyricChar>,
}

/// A timeline that plays back a [`TimelineScript`].
#[derive(Clone, Debug)]
pub struct ScriptedTimeline {
    script: TimelineScript,
    song: &'static SongInfo,
    position: f32,
    playing: bool,
    finished: bool,
}

impl ScriptedTimeline {
    pub fn new(mut script: TimelineScript) -> Result<Self> {
        let song = find_song(script.song_id)
            .ok_or_else(|| anyhow::anyhow!("Song not found: id {}", script.song_id))?;

        script.phrases.sort_by(|a, b| {
            a.start_time
                .partial_cmp(&b.start_time)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        script.chars.sort_by(|a, b| {
            a.start_time
                .partial_cmp(&b.start_time)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        log::info!(
            "Timeline for '{}': {} phrases, {:.0} ms",
            song.title,
            script.phrases.len(),
            script.duration
        );

        Ok(Self {
            script,
            song,
            position: 0.0,
            playing: false,
            finished: false,
        })
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let script: TimelineScript =
            serde_json::from_str(json).context("Failed to parse timeline script")?;
        Self::new(script)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read timeline {}", path.display()))?;
        Self::from_json(&contents)
            .with_context(|| format!("Invalid timeline {}", path.display()))
    }

    pub fn script(&self) -> &TimelineScript {
        &self.script
    }

    pub fn duration(&self) -> f32 {
        self.script.duration
    }

    /// Characters sung within `phrase`, in order.
    pub fn phrase_chars(&self, phrase: &Phrase) -> impl Iterator<Item = &LyricChar> {
        let phrase = *phrase;
        self.script
            .chars
            .iter()
            .filter(move |c| phrase.contains(c.start_time))
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Start playback. Returns false if already playing or finished.
    pub fn request_play(&mut self) -> bool {
        if self.playing || self.finished {
            return false;
        }
        self.playing = true;
        true
    }

    pub fn pause(&mut self) {
        self.playing = false;
    }

    /// Stop and rewind to the start of the song.
    pub fn restart(&mut self) {
        self.position = 0.0;
        self.playing = false;
        self.finished = false;
    }

    pub fn seek(&mut self, position: f32) {
        self.position = position.clamp(0.0, self.script.duration);
    }

    /// Move playback forward by `dt` seconds.
    pub fn advance(&mut self, dt: f32) {
        if !self.playing {
            return;
        }
        self.position += dt * 1000.0;
        if self.position >= self.script.duration {
            self.position = self.script.duration;
            self.playing = false;
            self.finished = true;
            log::info!("Playback of '{}' finished", self.song.title);
        }
    }
}

impl TimelineSource for ScriptedTimeline {
    fn is_playing(&self) -> bool {
        self.playing
    }

    fn position(&self) -> f32 {
        self.position
    }

    fn current_phrase(&self) -> Option<CurrentPhrase> {
        self.script
            .phrases
            .iter()
            .enumerate()
            .find(|(_, phrase)| phrase.contains(self.position))
            .map(|(index, phrase)| CurrentPhrase {
                index,
                phrase: *phrase,
            })
    }

    fn is_started_last_chorus(&self) -> bool {
        self.script
            .last_chorus_start
            .is_some_and(|start| self.position >= start)
    }

    fn vocal_amplitude(&self, position: f32) -> f32 {
        self.script.vocal_amplitude.sample(position)
    }

    fn max_vocal_amplitude(&self) -> f32 {
        self.script
            .max_vocal_amplitude
            .unwrap_or_else(|| self.script.vocal_amplitude.max())
    }

    fn current_beat(&self) -> Option<Beat> {
        self.script.beat_grid.and_then(|grid| grid.beat_at(self.position))
    }

    fn song(&self) -> &SongInfo {
        self.song
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_test_script() -> TimelineScript {
        TimelineScript {
            song_id: 0,
            duration: 5000.0,
            phrases: vec![
                Phrase::new(2000.0, 3000.0),
                Phrase::new(500.0, 1500.0),
            ],
            last_chorus_start: Some(4000.0),
            beat_grid: Some(BeatGrid {
                bpm: 120.0,
                offset: 100.0,
                beats_per_bar: 4,
            }),
            vocal_amplitude: VocalEnvelope::new(vec![0.0, 10.0, 20.0], 1.0),
            max_vocal_amplitude: None,
            chars: vec![
                LyricChar { text: "b".into(), start_time: 900.0, end_time: 1000.0 },
                LyricChar { text: "a".into(), start_time: 500.0, end_time: 700.0 },
                LyricChar { text: "c".into(), start_time: 2100.0, end_time: 2400.0 },
            ],
        }
    }

    #[test]
    fn test_phrases_are_sorted_and_indexed() {
        let mut timeline = ScriptedTimeline::new(make_test_script()).unwrap();

        timeline.seek(600.0);
        let current = timeline.current_phrase().unwrap();
        assert_eq!(current.index, 0);
        assert_eq!(current.phrase.start_time, 500.0);

        // Between phrases
        timeline.seek(1500.0);
        assert!(timeline.current_phrase().is_none());

        timeline.seek(2999.0);
        assert_eq!(timeline.current_phrase().unwrap().index, 1);
    }

    #[test]
    fn test_phrase_chars() {
        let timeline = ScriptedTimeline::new(make_test_script()).unwrap();
        let first = timeline.script().phrases[0];
        let text: String = timeline.phrase_chars(&first).map(|c| c.text.as_str()).collect();
        assert_eq!(text, "ab");

        let gap = Phrase::new(1500.0, 2000.0);
        assert_eq!(timeline.phrase_chars(&gap).count(), 0);
    }

    #[test]
    fn test_unknown_song_is_an_error() {
        let mut script = make_test_script();
        script.song_id = 99;
        assert!(ScriptedTimeline::new(script).is_err());
    }

    #[test]
    fn test_transport() {
        let mut timeline = ScriptedTimeline::new(make_test_script()).unwrap();
        assert!(!timeline.is_playing());

        // Not playing: advance does nothing
        timeline.advance(1.0);
        assert_eq!(timeline.position(), 0.0);

        assert!(timeline.request_play());
        assert!(!timeline.request_play());

        timeline.advance(0.5);
        assert!((timeline.position() - 500.0).abs() < 0.001);

        timeline.advance(10.0);
        assert!(timeline.is_finished());
        assert!(!timeline.is_playing());
        assert_eq!(timeline.position(), 5000.0);
        assert!(!timeline.request_play());

        timeline.restart();
        assert_eq!(timeline.position(), 0.0);
        assert!(!timeline.is_finished());
        assert!(timeline.request_play());
    }

    #[test]
    fn test_last_chorus_flag() {
        let mut timeline = ScriptedTimeline::new(make_test_script()).unwrap();
        timeline.seek(3999.0);
        assert!(!timeline.is_started_last_chorus());
        timeline.seek(4000.0);
        assert!(timeline.is_started_last_chorus());
    }

    #[test]
    fn test_vocal_envelope_sampling() {
        let envelope = VocalEnvelope::new(vec![0.0, 10.0, 20.0], 1.0);
        assert!((envelope.sample(500.0) - 5.0).abs() < 0.001);
        assert!((envelope.sample(2000.0) - 20.0).abs() < 0.001);
        assert_eq!(envelope.sample(-1.0), 0.0);
        assert_eq!(envelope.sample(5000.0), 0.0);
        assert_eq!(envelope.max(), 20.0);
    }

    #[test]
    fn test_beat_grid() {
        let grid = BeatGrid {
            bpm: 120.0,
            offset: 100.0,
            beats_per_bar: 4,
        };
        assert!(grid.beat_at(50.0).is_none());

        let beat = grid.beat_at(700.0).unwrap();
        assert!((beat.duration - 500.0).abs() < 0.001);
        assert!((beat.start_time - 600.0).abs() < 0.001);
        assert_eq!(beat.length, 4);
    }

    #[test]
    fn test_deserialize_from_json() {
        let json = r#"{
            "songId": 2,
            "duration": 180000,
            "phrases": [
                { "startTime": 1000, "endTime": 2500 },
                { "startTime": 3000, "endTime": 4200 }
            ],
            "lastChorusStart": 150000,
            "beatGrid": { "bpm": 150 },
            "vocalAmplitude": { "samples": [0, 40, 80], "sampleRate": 10 },
            "maxVocalAmplitude": 90000
        }"#;

        let mut timeline = ScriptedTimeline::from_json(json).unwrap();
        assert_eq!(timeline.song().id, 2);
        assert_eq!(timeline.script().phrases.len(), 2);
        assert_eq!(timeline.max_vocal_amplitude(), 90000.0);
        assert_eq!(timeline.script().beat_grid.unwrap().beats_per_bar, 4);

        timeline.seek(3500.0);
        assert_eq!(timeline.current_phrase().unwrap().index, 1);
    }
}
