pub mod math;
pub mod color;
pub mod song;
pub mod timeline;

// Cue model and evaluation
pub mod sinks;
pub mod cue;
pub mod cue_sheets;
pub mod directing;

// Stage models driven by the cues
pub mod post_processing;
pub mod screen;
pub mod particle;
pub mod character;
pub mod penlight;
pub mod lyric;
pub mod show;

pub mod trace;
pub mod config;
pub mod cli;
