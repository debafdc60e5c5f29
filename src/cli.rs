use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use crate::config::{check_fps, StageConfig};
use crate::cue::CueSheet;
use crate::cue_sheets;
use crate::directing::DirectingManager;
use crate::show::{ShowSequence, ShowStatus};
use crate::song::{catalog, find_song, SongId};
use crate::timeline::{ScriptedTimeline, TimelineSource};
use crate::trace::CommandRecorder;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a whole show headlessly and print the final stage state
    Simulate {
        /// Timeline script (JSON)
        #[arg(long)]
        timeline: PathBuf,

        /// Cue sheet (JSON); defaults to the built-in sheet for the song
        #[arg(long)]
        cues: Option<PathBuf>,

        /// Stage config (JSON)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Frames per second (overrides the config)
        #[arg(long)]
        fps: Option<f32>,

        /// Click the stage at this playback position in ms (repeatable)
        #[arg(long = "shake-at")]
        shake_at: Vec<f32>,
    },
    /// Print every stage command issued while playing a timeline
    Trace {
        /// Timeline script (JSON)
        #[arg(long)]
        timeline: PathBuf,

        /// Cue sheet (JSON); defaults to the built-in sheet for the song
        #[arg(long)]
        cues: Option<PathBuf>,

        /// Frames per second
        #[arg(long, default_value_t = 60.0)]
        fps: f32,
    },
    /// List the song catalog
    Songs,
    /// Print the built-in cue sheet of a song
    Cues {
        #[arg(long)]
        song: SongId,
    },
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Simulate { timeline, cues, config, fps, shake_at } => {
            simulate(&timeline, cues.as_deref(), config.as_deref(), fps, shake_at)?;
        }
        Commands::Trace { timeline, cues, fps } => {
            trace(&timeline, cues.as_deref(), fps)?;
        }
        Commands::Songs => {
            println!("{}", serde_json::to_string_pretty(catalog())?);
        }
        Commands::Cues { song } => {
            let info = find_song(song).ok_or_else(|| anyhow::anyhow!("Song not found: id {}", song))?;
            let sheet = cue_sheets::for_song(info.id, None);
            println!("{}", serde_json::to_string_pretty(&sheet)?);
        }
    }
    Ok(())
}

fn load_directing(timeline: &ScriptedTimeline, cues: Option<&Path>) -> Result<DirectingManager> {
    match cues {
        Some(path) => Ok(DirectingManager::new(CueSheet::load(path)?)),
        None => Ok(DirectingManager::for_timeline(timeline)),
    }
}

/// Number of fixed steps needed to cover `duration_ms` plus a second of
/// slack for the finish transition.
fn frame_budget(duration_ms: f32, dt: f32) -> usize {
    ((duration_ms / 1000.0 + 1.0) / dt).ceil() as usize
}

fn simulate(
    timeline_path: &Path,
    cues: Option<&Path>,
    config_path: Option<&Path>,
    fps: Option<f32>,
    mut shake_at: Vec<f32>,
) -> Result<()> {
    let mut config = match config_path {
        Some(path) => StageConfig::load(path)?,
        None => StageConfig::default(),
    };
    if let Some(fps) = fps {
        check_fps(fps)?;
        config.fps = fps;
    }

    let timeline = ScriptedTimeline::load(timeline_path)?;
    if config_path.is_some() && config.song_id != timeline.song().id {
        log::warn!(
            "Config song id {} differs from timeline song id {} - using the timeline",
            config.song_id,
            timeline.song().id
        );
    }
    let directing = load_directing(&timeline, cues)?;
    let total_frames = frame_budget(timeline.duration(), config.frame_step());

    let mut show = ShowSequence::new(timeline, directing, &config);
    show.initialize();
    show.mark_initialized();

    let dt = config.frame_step();
    show.update(0.0);
    if show.status() != ShowStatus::Ready {
        anyhow::bail!("Show did not become ready");
    }
    show.click();

    shake_at.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mut shakes = shake_at.into_iter().peekable();

    log::info!("Simulating up to {} frames at {} fps", total_frames, config.fps);

    for _ in 0..total_frames {
        show.update(dt);

        let position = show.timeline().position();
        while shakes.next_if(|&at| at <= position).is_some() {
            show.click();
        }

        if show.status() == ShowStatus::Finished {
            break;
        }
    }

    let snapshot = show.snapshot();
    println!(
        "{}",
        serde_json::to_string_pretty(&snapshot).context("Failed to serialize show state")?
    );
    Ok(())
}

fn trace(timeline_path: &Path, cues: Option<&Path>, fps: f32) -> Result<()> {
    check_fps(fps)?;
    let mut timeline = ScriptedTimeline::load(timeline_path)?;
    let mut directing = load_directing(&timeline, cues)?;
    let mut recorder = CommandRecorder::new(StageConfig::default().roster);

    let dt = 1.0 / fps;
    let total_frames = frame_budget(timeline.duration(), dt);
    timeline.request_play();

    for _ in 0..total_frames {
        timeline.advance(dt);
        recorder.set_position(timeline.position());
        directing.update(&timeline, &mut recorder.targets());

        for record in recorder.take_commands() {
            println!("{}", serde_json::to_string(&record)?);
        }

        if timeline.is_finished() {
            break;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_budget() {
        assert_eq!(frame_budget(1000.0, 0.5), 4);
        assert_eq!(frame_budget(0.0, 0.25), 4);
    }

    #[test]
    fn test_parse_simulate_args() {
        let cli = Cli::try_parse_from([
            "stagecue", "simulate", "--timeline", "t.json", "--shake-at", "100", "--shake-at", "250.5",
        ])
        .unwrap();
        match cli.command {
            Commands::Simulate { shake_at, fps, cues, .. } => {
                assert_eq!(shake_at, vec![100.0, 250.5]);
                assert!(fps.is_none());
                assert!(cues.is_none());
            }
            _ => panic!("expected simulate"),
        }
    }

    #[test]
    fn test_infinite_fps_is_rejected_before_running() {
        let missing = Path::new("missing-timeline.json");
        let err = trace(missing, None, f32::INFINITY).unwrap_err();
        assert!(err.to_string().contains("fps"));
        let err = simulate(missing, None, None, Some(f32::INFINITY), Vec::new()).unwrap_err();
        assert!(err.to_string().contains("fps"));
    }
}
