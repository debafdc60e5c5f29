//! Built-in cue sheets.
//!
//! "Loading Memories" looks back over past Magical Mirai years: each verse
//! block shows that year's key visual on the screen and paints the particles
//! in the colours of that year's headliners, a sepia filter sweeps in before
//! the last chorus, and the screen blacks out with the vocal just before it.

use crate::color::palette;
use crate::cue::{
    Cue, CueSheet, FilterCue, FilterDuration, FilterStart, MotionCue, ParticleColorCue,
    PhraseRange, ScreenCue, VocalAmplitudeCue,
};
use crate::sinks::FilterKind;
use crate::song::{SongId, LOADING_MEMORIES};

/// Phrase index landmarks of "Loading Memories".
pub mod phrase_index {
    use crate::cue::PhraseRange;

    pub const MM2013: PhraseRange = PhraseRange { start_phrase_index: 2, end_phrase_index: 4 };
    pub const MM2014: PhraseRange = PhraseRange { start_phrase_index: 12, end_phrase_index: 15 };
    pub const MM2015: PhraseRange = PhraseRange { start_phrase_index: 5, end_phrase_index: 11 };
    pub const MM2016: PhraseRange = PhraseRange { start_phrase_index: 22, end_phrase_index: 26 };
    pub const MM2017: PhraseRange = PhraseRange { start_phrase_index: 27, end_phrase_index: 30 };
    pub const MM2018: PhraseRange = PhraseRange { start_phrase_index: 31, end_phrase_index: 32 };
    pub const MM2019: PhraseRange = PhraseRange { start_phrase_index: 33, end_phrase_index: 34 };
    pub const MM2020: PhraseRange = PhraseRange { start_phrase_index: 35, end_phrase_index: 36 };
    pub const MM2021: PhraseRange = PhraseRange { start_phrase_index: 37, end_phrase_index: 38 };

    pub const START_SEPIA_FILTER: usize = 42;
    pub const LAST_CHORUS: usize = 44;
    pub const END: usize = 49;
}

/// End of the phrase before the last chorus (ms).
const BLACKOUT_START_TIME: f32 = 207_433.0;
/// Start of the repeated last-chorus segment (ms).
const BLACKOUT_END_TIME: f32 = 210_133.0;
/// Peak vocal amplitude of "Loading Memories", used when the timeline
/// carries no envelope.
pub const LOADING_MEMORIES_PEAK_AMPLITUDE: f32 = 81_615.0;
/// Full blackout is reached at the peak vocal amplitude divided by this.
const BLACKOUT_AMPLITUDE_DIVISOR: f32 = 3.9;

/// The built-in cue sheet for `song_id`. Songs without one get an empty sheet.
///
/// `max_vocal_amplitude` is the peak of the song's vocal envelope; `None` or
/// a non-positive value falls back to the song's known peak.
pub fn for_song(song_id: SongId, max_vocal_amplitude: Option<f32>) -> CueSheet {
    match song_id {
        LOADING_MEMORIES => loading_memories(max_vocal_amplitude),
        _ => CueSheet::new(),
    }
}

pub fn loading_memories(max_vocal_amplitude: Option<f32>) -> CueSheet {
    use phrase_index::*;

    let peak = max_vocal_amplitude
        .filter(|max| max.is_finite() && *max > 0.0)
        .unwrap_or(LOADING_MEMORIES_PEAK_AMPLITUDE);

    let mut sheet = CueSheet::new();

    // Filters
    sheet.push(Cue::Filter(FilterCue::new(
        FilterStart { phrase_index: START_SEPIA_FILTER, value: 0.0 },
        FilterDuration { time: 200.0, value: 1.0 },
        FilterKind::Sepia,
    )));
    sheet.push(Cue::Filter(FilterCue::new(
        FilterStart { phrase_index: LAST_CHORUS, value: 0.0 },
        FilterDuration { time: 10.0, value: 0.0 },
        FilterKind::None,
    )));
    sheet.push(Cue::VocalAmplitude(VocalAmplitudeCue::new(
        BLACKOUT_START_TIME,
        BLACKOUT_END_TIME,
        FilterKind::Blackout,
        0.0,
        peak / BLACKOUT_AMPLITUDE_DIVISOR,
    )));

    // Screen. 2017-2020 hold their texture through to the end of 2021 so the
    // screen does not drop back to blank in the gaps between phrases.
    let until_2021 = |range: PhraseRange| PhraseRange::new(range.start_phrase_index, MM2021.end_phrase_index);
    let screens = [
        (MM2013, "mm2013"),
        (MM2014, "mm2014"),
        (MM2015, "mm2015"),
        (MM2016, "mm2016"),
        (until_2021(MM2017), "mm2017"),
        (until_2021(MM2018), "mm2018"),
        (until_2021(MM2019), "mm2019"),
        (until_2021(MM2020), "mm2020"),
        (MM2021, "mm2021"),
        (PhraseRange::new(LAST_CHORUS, END), "mm10th"),
    ];
    for (range, key) in screens {
        sheet.push(Cue::Screen(ScreenCue::new(range, key)));
    }

    // Particle colours
    sheet.push(Cue::ParticleColor(ParticleColorCue::new(MM2017, vec![palette::MIKU])));
    sheet.push(Cue::ParticleColor(ParticleColorCue::new(MM2018, vec![palette::RIN, palette::LEN])));
    sheet.push(Cue::ParticleColor(ParticleColorCue::new(MM2019, vec![palette::LUKA, palette::MIKU])));
    sheet.push(Cue::ParticleColor(ParticleColorCue::new(MM2020, vec![palette::MEIKO])));
    sheet.push(Cue::ParticleColor(ParticleColorCue::new(MM2021, vec![palette::KAITO])));
    let after_2021 = MM2021.end_phrase_index + 1;
    sheet.push(Cue::ParticleColor(ParticleColorCue::origin(PhraseRange::new(after_2021, after_2021))));

    // Motions: clap along through the 2015 block ("Hand in Hand"), then back
    // to waving.
    sheet.push(Cue::Motion(MotionCue::new(MM2015.start_phrase_index, ["clap_1"])));
    sheet.push(Cue::Motion(MotionCue::new(MM2015.end_phrase_index + 1, ["shake_rightarm_2"])));

    sheet
}
