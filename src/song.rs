//! Catalog of the songs a show can be staged for.
//!
//! Each entry carries the identifiers the lyric/beat analysis service needs to
//! load the song, plus the names of the characters who sing it. Singers play
//! the `sing_1` motion instead of whatever a motion cue asks for.

use serde::Serialize;

/// Numeric song identifier, stable across the catalog.
pub type SongId = u32;

/// Song whose cue sheet and last-chorus correction are built in.
pub const LOADING_MEMORIES: SongId = 0;

/// Analysis data revisions used for a song.
#[derive(Clone, Copy, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisIds {
    pub beat_id: u32,
    pub chord_id: u32,
    pub repetitive_segment_id: u32,
    pub lyric_id: u32,
    pub lyric_diff_id: u32,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SongInfo {
    pub id: SongId,
    pub title: &'static str,
    pub artist: &'static str,
    pub song_url: &'static str,
    pub music_video_url: Option<&'static str>,
    pub analysis: AnalysisIds,
    pub singer_names: &'static [&'static str],
}

impl SongInfo {
    pub fn is_singer(&self, name: &str) -> bool {
        self.singer_names.contains(&name)
    }
}

static CATALOG: [SongInfo; 6] = [
    SongInfo {
        id: 0,
        title: "Loading Memories",
        artist: "せきこみごはん feat. 初音ミク",
        song_url: "https://piapro.jp/t/RoPB/20220122172830",
        music_video_url: Some("https://www.youtube.com/watch?v=ZOTJgXBkJpc"),
        analysis: AnalysisIds {
            beat_id: 4086301,
            chord_id: 2221797,
            repetitive_segment_id: 2247682,
            lyric_id: 53718,
            lyric_diff_id: 7076,
        },
        singer_names: &["Miku"],
    },
    SongInfo {
        id: 1,
        title: "青に溶けた風船",
        artist: "シアン・キノ feat. 初音ミク",
        song_url: "https://piapro.jp/t/9cSd/20220205030039",
        music_video_url: None,
        analysis: AnalysisIds {
            beat_id: 4083452,
            chord_id: 2221996,
            repetitive_segment_id: 2247861,
            lyric_id: 53745,
            lyric_diff_id: 7080,
        },
        singer_names: &["Miku"],
    },
    SongInfo {
        id: 2,
        title: "歌の欠片と",
        artist: "imo feat. MEIKO",
        song_url: "https://piapro.jp/t/Yvi-/20220207132910",
        music_video_url: Some("https://www.youtube.com/watch?v=CkIy0PdUGjk"),
        analysis: AnalysisIds {
            beat_id: 4086832,
            chord_id: 2222074,
            repetitive_segment_id: 2247935,
            lyric_id: 53746,
            lyric_diff_id: 7082,
        },
        singer_names: &["Meiko"],
    },
    SongInfo {
        id: 3,
        title: "未完のストーリー",
        artist: "加賀（ネギシャワーP） feat. 初音ミク",
        song_url: "https://piapro.jp/t/ehtN/20220207101534",
        music_video_url: None,
        analysis: AnalysisIds {
            beat_id: 4083459,
            chord_id: 2222147,
            repetitive_segment_id: 2248008,
            lyric_id: 53747,
            lyric_diff_id: 7083,
        },
        singer_names: &["Miku"],
    },
    SongInfo {
        id: 4,
        title: "みはるかす",
        artist: "ねこむら（cat nap） feat. 初音ミク",
        song_url: "https://piapro.jp/t/QtjE/20220207164031",
        music_video_url: Some("https://www.youtube.com/watch?v=qVTavYjd9Ek"),
        analysis: AnalysisIds {
            beat_id: 4083470,
            chord_id: 2222187,
            repetitive_segment_id: 2248075,
            lyric_id: 53748,
            lyric_diff_id: 7084,
        },
        singer_names: &["Miku"],
    },
    SongInfo {
        id: 5,
        title: "fear",
        artist: "201 feat. 初音ミク",
        song_url: "https://piapro.jp/t/GqT2/20220129182012",
        music_video_url: Some("https://www.youtube.com/watch?v=ZK2rp1VdNy4"),
        analysis: AnalysisIds {
            beat_id: 4083475,
            chord_id: 2222294,
            repetitive_segment_id: 2248170,
            lyric_id: 53749,
            lyric_diff_id: 7085,
        },
        singer_names: &["Miku"],
    },
];

/// Every song in the catalog, in id order.
pub fn catalog() -> &'static [SongInfo] {
    &CATALOG
}

/// Find a song by id.
pub fn find_song(id: SongId) -> Option<&'static SongInfo> {
    CATALOG.iter().find(|song| song.id == id)
}
