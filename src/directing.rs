//! Per-frame cue evaluation.
//!
//! [`DirectingManager`] maps the timeline's playback position and current
//! phrase onto stage effects. Each frame it reads the timeline once, walks
//! every cue list of its [`CueSheet`] in a fixed order, and issues "set state"
//! commands to the sinks in [`StageTargets`]:
//!
//! 1. filter cues: interpolate the filter mix ratio from a phrase start
//! 2. vocal-amplitude cues: white-out intensity follows the vocal
//! 3. screen cues: texture on at the range start, off after the range end
//! 4. particle-colour cues: paint particles while inside the range
//! 5. motion cues: switch character motions at a phrase
//! 6. last chorus: disperse the particles
//!
//! and finally remembers the phrase index for next frame's screen switch-off.

use crate::character::SING_MOTION;
use crate::cue::{CueSheet, FilterCue, ScreenCue, VocalAmplitudeCue};
use crate::cue_sheets::{self, phrase_index};
use crate::math::{inverse_lerp, lerp};
use crate::sinks::{FilterSink, MotionSink, ScreenSink, StageTargets, SCREEN_NONE};
use crate::song::{SongId, SongInfo, LOADING_MEMORIES};
use crate::timeline::{CurrentPhrase, TimelineSource};

/// Phrase whose cues are held back until the repeated last-chorus segment
/// has started, for songs that need it.
///
/// The lyric phrase of the last chorus in "Loading Memories" begins
/// noticeably before the detected repeated segment, and the segment boundary
/// is the one that matches the music.
pub fn last_chorus_hold(song_id: SongId) -> Option<usize> {
    match song_id {
        LOADING_MEMORIES => Some(phrase_index::LAST_CHORUS),
        _ => None,
    }
}

/// Whether cues firing on `phrase_index` must wait for the last chorus.
pub fn is_waiting_last_chorus(timeline: &dyn TimelineSource, phrase_index: Option<usize>) -> bool {
    match (last_chorus_hold(timeline.song().id), phrase_index) {
        (Some(held), Some(index)) if held == index => !timeline.is_started_last_chorus(),
        _ => false,
    }
}

/// Evaluates a song's cue sheet once per rendered frame.
#[derive(Clone, Debug, Default)]
pub struct DirectingManager {
    sheet: CueSheet,
    /// Last phrase index seen while a phrase was active.
    last_phrase_index: Option<usize>,
}

impl DirectingManager {
    pub fn new(sheet: CueSheet) -> Self {
        Self {
            sheet,
            last_phrase_index: None,
        }
    }

    /// Directing with the built-in cue sheet for the timeline's song. The
    /// blackout level is scaled to the timeline's vocal peak.
    pub fn for_timeline(timeline: &dyn TimelineSource) -> Self {
        let song = timeline.song();
        let sheet = cue_sheets::for_song(song.id, Some(timeline.max_vocal_amplitude()));
        log::info!(
            "Directing '{}': {} filter, {} vocal, {} screen, {} particle, {} motion cues",
            song.title,
            sheet.filters.len(),
            sheet.vocal_amplitudes.len(),
            sheet.screens.len(),
            sheet.particle_colors.len(),
            sheet.motions.len()
        );
        Self::new(sheet)
    }

    pub fn sheet(&self) -> &CueSheet {
        &self.sheet
    }

    pub fn last_phrase_index(&self) -> Option<usize> {
        self.last_phrase_index
    }

    /// Rearm every cue for a new performance.
    ///
    /// Clears the working state of all cues and the phrase memory; the
    /// authored cue configuration is kept.
    pub fn restart(&mut self) {
        self.sheet.reset_working();
        self.last_phrase_index = None;
        log::info!("Directing restarted");
    }

    /// Run one frame. Does nothing while the timeline is not playing.
    pub fn update(&mut self, timeline: &dyn TimelineSource, targets: &mut StageTargets<'_>) {
        if !timeline.is_playing() {
            return;
        }

        let current = timeline.current_phrase();
        let index = current.map(|c| c.index);
        let waiting = is_waiting_last_chorus(timeline, index);

        for cue in &mut self.sheet.filters {
            update_filter(cue, current, waiting, timeline.position(), targets.filter);
        }
        for cue in &mut self.sheet.vocal_amplitudes {
            update_vocal_amplitude(cue, timeline, targets.filter);
        }
        for cue in &self.sheet.screens {
            update_screen(cue, index, self.last_phrase_index, waiting, targets.screen);
        }

        if let Some(index) = index {
            for cue in &self.sheet.particle_colors {
                if !cue.range.contains(index) {
                    continue;
                }
                match &cue.colors {
                    Some(colors) => targets.particles.set_particle_colors(colors),
                    None => targets.particles.reset_particle_colors(),
                }
            }

            for cue in &self.sheet.motions {
                if cue.start_phrase_index == index {
                    play_motion_cue(&cue.play_motion_names, timeline.song(), targets.characters);
                }
            }
        }

        if timeline.is_started_last_chorus() {
            targets.particles.spread_particles();
        }

        if index.is_some() {
            self.last_phrase_index = index;
        }
    }
}

fn update_filter(
    cue: &mut FilterCue,
    current: Option<CurrentPhrase>,
    waiting: bool,
    position: f32,
    filter: &mut dyn FilterSink,
) {
    let Some(current) = current else {
        return;
    };
    if current.index < cue.start.phrase_index || cue.working.is_finished || waiting {
        return;
    }

    if cue.working.start_time.is_none() {
        log::debug!(
            "Filter cue {:?} started at phrase {} ({:.0} ms)",
            cue.filter,
            current.index,
            current.phrase.start_time
        );
    }
    let start_time = cue.working.capture_start(current.phrase.start_time);
    let end_time = start_time + cue.duration.time;

    // Progress is not clamped: a frame landing past the end overshoots once
    // before the latch below trips.
    let t = inverse_lerp(start_time, end_time, position);
    filter.set_filter_kind(cue.filter);
    filter.set_filter_mix_ratio(lerp(cue.start.value, cue.duration.value, t));

    if position >= end_time {
        cue.working.is_finished = true;
        log::debug!("Filter cue {:?} finished at {:.0} ms", cue.filter, position);
    }
}

fn update_vocal_amplitude(
    cue: &mut VocalAmplitudeCue,
    timeline: &dyn TimelineSource,
    filter: &mut dyn FilterSink,
) {
    let position = timeline.position();
    if position < cue.start_time || cue.working.is_finished {
        return;
    }
    cue.working.capture_start(cue.start_time);

    filter.set_white_out_intensity(cue.intensity(timeline.vocal_amplitude(position)));

    if position > cue.end_time {
        filter.set_white_out_intensity(0.0);
        cue.working.is_finished = true;
        log::debug!("Vocal cue {:?} finished at {:.0} ms", cue.filter, position);
    }
}

fn update_screen(
    cue: &ScreenCue,
    index: Option<usize>,
    last_index: Option<usize>,
    waiting: bool,
    screen: &mut dyn ScreenSink,
) {
    if index == Some(cue.range.start_phrase_index) && !waiting {
        screen.switch_texture(&cue.texture_key);
    }
    // Switch-off keys on the last phrase seen, so it happens in the gap after
    // the range rather than on its final phrase.
    if index.is_none() && last_index == Some(cue.range.end_phrase_index) {
        screen.switch_texture(SCREEN_NONE);
    }
}

fn play_motion_cue(motions: &[String], song: &SongInfo, characters: &mut dyn MotionSink) {
    let sing = [SING_MOTION.to_string()];
    for name in characters.character_names() {
        let play: &[String] = if song.is_singer(&name) { &sing } else { motions };
        characters.play_motions(&name, play);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cue::{Cue, FilterDuration, FilterStart, PhraseRange};
    use crate::sinks::FilterKind;
    use crate::song::find_song;
    use crate::timeline::{Beat, Phrase};
    use crate::trace::CommandRecorder;

    /// Timeline stepped by hand: one phrase index and position per frame.
    struct Frame {
        song: &'static SongInfo,
        playing: bool,
        position: f32,
        phrase: Option<CurrentPhrase>,
        last_chorus: bool,
        max_vocal: f32,
    }

    impl Frame {
        fn new(song_id: SongId) -> Self {
            Self {
                song: find_song(song_id).unwrap(),
                playing: true,
                position: 0.0,
                phrase: None,
                last_chorus: false,
                max_vocal: 0.0,
            }
        }

        fn at(&mut self, position: f32, index: Option<usize>) -> &mut Self {
            self.position = position;
            self.phrase = index.map(|index| CurrentPhrase {
                index,
                phrase: Phrase::new(position, position + 1000.0),
            });
            self
        }
    }

    impl TimelineSource for Frame {
        fn is_playing(&self) -> bool {
            self.playing
        }
        fn position(&self) -> f32 {
            self.position
        }
        fn current_phrase(&self) -> Option<CurrentPhrase> {
            self.phrase
        }
        fn is_started_last_chorus(&self) -> bool {
            self.last_chorus
        }
        fn vocal_amplitude(&self, _position: f32) -> f32 {
            0.0
        }
        fn max_vocal_amplitude(&self) -> f32 {
            self.max_vocal
        }
        fn current_beat(&self) -> Option<Beat> {
            None
        }
        fn song(&self) -> &SongInfo {
            self.song
        }
    }

    fn run(directing: &mut DirectingManager, frame: &Frame, recorder: &mut CommandRecorder) {
        recorder.set_position(frame.position);
        directing.update(frame, &mut recorder.targets());
    }

    #[test]
    fn test_built_in_sheet_scales_blackout_to_vocal_peak() {
        let mut frame = Frame::new(LOADING_MEMORIES);
        frame.max_vocal = 7800.0;
        let directing = DirectingManager::for_timeline(&frame);
        assert!((directing.sheet().vocal_amplitudes[0].max - 2000.0).abs() < 0.01);

        // No envelope: the song's known peak
        frame.max_vocal = 0.0;
        let directing = DirectingManager::for_timeline(&frame);
        assert!((directing.sheet().vocal_amplitudes[0].max - 81_615.0 / 3.9).abs() < 0.1);

        assert!(DirectingManager::for_timeline(&Frame::new(2)).sheet().is_empty());
    }

    #[test]
    fn test_not_playing_is_a_no_op() {
        let mut directing = DirectingManager::new(CueSheet::new().with(Cue::Screen(ScreenCue::new(
            PhraseRange::new(0, 0),
            "a",
        ))));
        let mut recorder = CommandRecorder::new(["Miku"]);
        let mut frame = Frame::new(1);
        frame.playing = false;
        frame.at(0.0, Some(0));

        run(&mut directing, &frame, &mut recorder);
        assert!(recorder.commands().is_empty());
        assert_eq!(directing.last_phrase_index(), None);
    }

    #[test]
    fn test_gate_only_applies_to_held_phrase() {
        let mut frame = Frame::new(LOADING_MEMORIES);
        assert!(is_waiting_last_chorus(&frame, Some(phrase_index::LAST_CHORUS)));
        assert!(!is_waiting_last_chorus(&frame, Some(phrase_index::LAST_CHORUS - 1)));
        assert!(!is_waiting_last_chorus(&frame, None));

        frame.last_chorus = true;
        assert!(!is_waiting_last_chorus(&frame, Some(phrase_index::LAST_CHORUS)));

        let other = Frame::new(3);
        assert!(!is_waiting_last_chorus(&other, Some(phrase_index::LAST_CHORUS)));
    }

    #[test]
    fn test_filter_catches_up_on_later_phrase() {
        let mut directing = DirectingManager::new(CueSheet::new().with(Cue::Filter(FilterCue::new(
            FilterStart { phrase_index: 2, value: 0.0 },
            FilterDuration { time: 100.0, value: 1.0 },
            FilterKind::Sepia,
        ))));
        let mut recorder = CommandRecorder::new(["Miku"]);
        let mut frame = Frame::new(1);

        // Playback lands on phrase 3 without ever reporting phrase 2
        frame.at(5000.0, Some(3));
        run(&mut directing, &frame, &mut recorder);

        assert_eq!(directing.sheet().filters[0].working.start_time, Some(5000.0));
        assert!(recorder.last_filter_mix_ratio().is_some());
    }

    #[test]
    fn test_filter_pauses_between_phrases() {
        let mut directing = DirectingManager::new(CueSheet::new().with(Cue::Filter(FilterCue::new(
            FilterStart { phrase_index: 0, value: 0.0 },
            FilterDuration { time: 1000.0, value: 1.0 },
            FilterKind::Sepia,
        ))));
        let mut recorder = CommandRecorder::new(["Miku"]);
        let mut frame = Frame::new(1);

        frame.at(0.0, Some(0));
        run(&mut directing, &frame, &mut recorder);
        let calls = recorder.commands().len();

        frame.at(500.0, None);
        run(&mut directing, &frame, &mut recorder);
        assert_eq!(recorder.commands().len(), calls);
        assert!(!directing.sheet().filters[0].working.is_finished);
    }

    #[test]
    fn test_last_phrase_index_tracks_active_phrases_only() {
        let mut directing = DirectingManager::default();
        let mut recorder = CommandRecorder::new(["Miku"]);
        let mut frame = Frame::new(1);

        frame.at(0.0, Some(4));
        run(&mut directing, &frame, &mut recorder);
        assert_eq!(directing.last_phrase_index(), Some(4));

        frame.at(100.0, None);
        run(&mut directing, &frame, &mut recorder);
        assert_eq!(directing.last_phrase_index(), Some(4));

        directing.restart();
        assert_eq!(directing.last_phrase_index(), None);
    }

    #[test]
    fn test_spread_on_last_chorus() {
        let mut directing = DirectingManager::default();
        let mut recorder = CommandRecorder::new(["Miku"]);
        let mut frame = Frame::new(1);

        frame.at(0.0, None);
        run(&mut directing, &frame, &mut recorder);
        assert_eq!(recorder.spread_count(), 0);

        frame.last_chorus = true;
        run(&mut directing, &frame, &mut recorder);
        run(&mut directing, &frame, &mut recorder);
        // Sent every frame; the particle field latches it
        assert_eq!(recorder.spread_count(), 2);
    }
}
