//! Top-level show state machine.
//!
//! [`ShowSequence`] owns the timeline, the directing manager and every stage
//! model, and runs them in a fixed order once per frame. User clicks start
//! the song, restart a finished show, and always swing the penlight.

use glam::Vec3;
use serde::Serialize;

use crate::character::{CharacterManager, SING_MOTION};
use crate::color::{palette, Color};
use crate::config::StageConfig;
use crate::directing::DirectingManager;
use crate::lyric::LyricManager;
use crate::particle::ParticleField;
use crate::penlight::Penlight;
use crate::post_processing::FilterState;
use crate::screen::{Screen, SCREEN_FINISHED, SCREEN_READY};
use crate::sinks::{FilterKind, MotionSink, ScreenSink, StageTargets, SCREEN_NONE};
use crate::timeline::{ScriptedTimeline, TimelineSource};

/// Motion for characters that are not singing the current song.
pub const AUDIENCE_MOTION: &str = "shake_rightarm_2";

const SCREEN_WIDTH: f32 = 1920.0 * 0.075;
const SCREEN_HEIGHT: f32 = 1080.0 * 0.075;
const SCREEN_Y: f32 = SCREEN_HEIGHT / 2.0 + 20.0;
const FLOOR_DEPTH: f32 = 150.0;

/// Orbit targets: one above the centre of the screen, one at each side.
pub fn orbit_targets() -> [Vec3; 3] {
    let y = SCREEN_Y + SCREEN_HEIGHT / 2.0;
    let z = -FLOOR_DEPTH / 2.0 - 30.0;
    let side = SCREEN_WIDTH / 2.0 * 1.8;
    [
        Vec3::new(0.0, y * 1.5, z),
        Vec3::new(-side, y, z),
        Vec3::new(side, y, z),
    ]
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ShowStatus {
    New,
    Initializing,
    Ready,
    Playing,
    Finished,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterSnapshot {
    pub name: String,
    pub motions: Vec<String>,
}

/// Stage state at one instant, for reporting.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShowSnapshot {
    pub status: ShowStatus,
    pub position: f32,
    pub phrase_index: Option<usize>,
    pub screen: String,
    pub filter_kind: FilterKind,
    pub filter_mix_ratio: f32,
    pub white_out_intensity: f32,
    pub particle_count: usize,
    pub particle_colors: Vec<Color>,
    pub can_spread: bool,
    /// Text of the lyrics currently on stage.
    pub lyrics: Vec<String>,
    pub characters: Vec<CharacterSnapshot>,
}

pub struct ShowSequence {
    status: ShowStatus,
    assets_loaded: bool,
    timeline: ScriptedTimeline,
    directing: DirectingManager,
    filter: FilterState,
    screen: Screen,
    particles: ParticleField,
    characters: CharacterManager,
    penlight: Penlight,
    lyrics: LyricManager,
}

impl ShowSequence {
    pub fn new(timeline: ScriptedTimeline, directing: DirectingManager, config: &StageConfig) -> Self {
        let mut penlight = Penlight::default().with_swing_seconds(config.penlight_swing_seconds);
        if let Some(name) = &config.penlight_color {
            match palette::image_color(name) {
                Some(color) => penlight.set_light_color(color),
                None => log::warn!("No image colour for '{}' - keeping the default penlight", name),
            }
        }
        Self {
            status: ShowStatus::New,
            assets_loaded: false,
            timeline,
            directing,
            filter: FilterState::new(),
            screen: Screen::new(),
            particles: ParticleField::new(config.particles.clone()),
            characters: CharacterManager::with_roster(&config.roster),
            penlight,
            lyrics: LyricManager::new(),
        }
    }

    /// Build the stage: orbit targets and the screen textures the cue sheet
    /// needs. Assets are then loading until [`Self::mark_initialized`].
    pub fn initialize(&mut self) {
        if self.status != ShowStatus::New {
            log::warn!("Show already initialized ({:?})", self.status);
            return;
        }
        for target in orbit_targets() {
            self.particles.add_target(target);
        }
        for cue in &self.directing.sheet().screens {
            self.screen.register(&cue.texture_key);
        }
        self.set_status(ShowStatus::Initializing);
    }

    /// Record that playback and stage assets have finished loading.
    pub fn mark_initialized(&mut self) {
        self.assets_loaded = true;
    }

    fn set_status(&mut self, status: ShowStatus) {
        if self.status != status {
            log::info!("Show {:?} -> {:?}", self.status, status);
            self.status = status;
        }
    }

    pub fn status(&self) -> ShowStatus {
        self.status
    }

    pub fn timeline(&self) -> &ScriptedTimeline {
        &self.timeline
    }

    pub fn directing(&self) -> &DirectingManager {
        &self.directing
    }

    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    pub fn particles(&self) -> &ParticleField {
        &self.particles
    }

    pub fn characters(&self) -> &CharacterManager {
        &self.characters
    }

    pub fn penlight(&self) -> &Penlight {
        &self.penlight
    }

    pub fn lyrics(&self) -> &LyricManager {
        &self.lyrics
    }

    /// Handle a click on the stage.
    pub fn click(&mut self) {
        self.penlight.shake(&mut self.particles);

        match self.status {
            ShowStatus::Ready => {
                if self.timeline.request_play() {
                    self.screen.switch_texture(SCREEN_NONE);
                    self.particles.set_auto_create(true);
                    self.start_character_motions();
                    self.set_status(ShowStatus::Playing);
                } else {
                    log::warn!("Timeline refused to start playback");
                }
            }
            ShowStatus::Finished => self.restart(),
            _ => {}
        }
    }

    fn start_character_motions(&mut self) {
        let song = self.timeline.song();
        for name in self.characters.character_names() {
            let motion = if song.is_singer(&name) {
                SING_MOTION
            } else {
                AUDIENCE_MOTION
            };
            self.characters.play_motions(&name, &[motion.to_string()]);
        }
    }

    /// Run one frame of `dt` seconds.
    pub fn update(&mut self, dt: f32) {
        if self.status == ShowStatus::Initializing && self.assets_loaded {
            self.screen.switch_texture(SCREEN_READY);
            self.set_status(ShowStatus::Ready);
        }

        if self.status == ShowStatus::Playing
            && self.lyrics.is_finished()
            && self.timeline.is_finished()
        {
            self.screen.switch_texture(SCREEN_FINISHED);
            self.particles.set_auto_create(false);
            self.characters.stop_all();
            self.set_status(ShowStatus::Finished);
        }

        self.timeline.advance(dt);

        let mut targets = StageTargets {
            filter: &mut self.filter,
            screen: &mut self.screen,
            particles: &mut self.particles,
            characters: &mut self.characters,
        };
        self.directing.update(&self.timeline, &mut targets);
        self.lyrics.update(&self.timeline);

        self.particles.update(dt);
        self.penlight.update(dt);
        self.characters.update(self.timeline.current_beat());
    }

    /// Rewind for another performance and wait for a click.
    pub fn restart(&mut self) {
        log::info!("Restarting show");
        self.timeline.restart();
        self.directing.restart();
        self.particles.restart();
        self.lyrics.restart();
        self.filter.reset();
        self.screen.switch_texture(SCREEN_READY);
        self.set_status(ShowStatus::Ready);
    }

    pub fn snapshot(&self) -> ShowSnapshot {
        ShowSnapshot {
            status: self.status,
            position: self.timeline.position(),
            phrase_index: self.timeline.current_phrase().map(|c| c.index),
            screen: self.screen.current().to_string(),
            filter_kind: self.filter.kind(),
            filter_mix_ratio: self.filter.mix_ratio(),
            white_out_intensity: self.filter.white_out_intensity(),
            particle_count: self.particles.len(),
            particle_colors: self.particles.particles().iter().map(|p| p.color).collect(),
            can_spread: self.particles.can_spread(),
            lyrics: self
                .lyrics
                .objects()
                .iter()
                .filter(|l| l.visible)
                .map(|l| l.text())
                .collect(),
            characters: self
                .characters
                .iter()
                .map(|c| CharacterSnapshot {
                    name: c.name().to_string(),
                    motions: c.playing().to_vec(),
                })
                .collect(),
        }
    }
}
