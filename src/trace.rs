//! Recording of stage commands.
//!
//! [`CommandRecorder`] stands in for all four sinks and records each command
//! together with the playback position it was issued at. The `trace` CLI
//! command prints these records; tests assert on them.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use serde::Serialize;

use crate::color::Color;
use crate::sinks::{FilterKind, FilterSink, MotionSink, ParticleSink, ScreenSink, StageTargets};

/// A single command sent to a sink.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum StageCommand {
    FilterKind { kind: FilterKind },
    FilterMixRatio { ratio: f32 },
    WhiteOutIntensity { intensity: f32 },
    SwitchTexture { key: String },
    ParticleColors { colors: Vec<Color> },
    ResetParticleColors,
    SpreadParticles,
    PlayMotions { character: String, motions: Vec<String> },
}

/// A command stamped with the playback position (ms) it was issued at.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RecordedCommand {
    pub position: f32,
    #[serde(flatten)]
    pub command: StageCommand,
}

#[derive(Clone, Default)]
struct Log {
    commands: Rc<RefCell<Vec<RecordedCommand>>>,
    position: Rc<Cell<f32>>,
}

impl Log {
    fn record(&self, command: StageCommand) {
        self.commands.borrow_mut().push(RecordedCommand {
            position: self.position.get(),
            command,
        });
    }
}

struct FilterRecorder(Log);
struct ScreenRecorder(Log);
struct ParticleRecorder(Log);

struct MotionRecorder {
    log: Log,
    roster: Vec<String>,
}

impl FilterSink for FilterRecorder {
    fn set_filter_kind(&mut self, kind: FilterKind) {
        self.0.record(StageCommand::FilterKind { kind });
    }

    fn set_filter_mix_ratio(&mut self, ratio: f32) {
        self.0.record(StageCommand::FilterMixRatio { ratio });
    }

    fn set_white_out_intensity(&mut self, intensity: f32) {
        self.0.record(StageCommand::WhiteOutIntensity { intensity });
    }
}

impl ScreenSink for ScreenRecorder {
    fn switch_texture(&mut self, key: &str) {
        self.0.record(StageCommand::SwitchTexture { key: key.to_string() });
    }
}

impl ParticleSink for ParticleRecorder {
    fn set_particle_colors(&mut self, colors: &[Color]) {
        self.0.record(StageCommand::ParticleColors { colors: colors.to_vec() });
    }

    fn reset_particle_colors(&mut self) {
        self.0.record(StageCommand::ResetParticleColors);
    }

    fn spread_particles(&mut self) {
        self.0.record(StageCommand::SpreadParticles);
    }
}

impl MotionSink for MotionRecorder {
    fn character_names(&self) -> Vec<String> {
        self.roster.clone()
    }

    fn play_motions(&mut self, character: &str, motions: &[String]) {
        self.log.record(StageCommand::PlayMotions {
            character: character.to_string(),
            motions: motions.to_vec(),
        });
    }
}

/// Records every command a directing pass issues.
pub struct CommandRecorder {
    log: Log,
    filter: FilterRecorder,
    screen: ScreenRecorder,
    particles: ParticleRecorder,
    characters: MotionRecorder,
}

impl CommandRecorder {
    /// A recorder whose motion sink reports `roster` as the characters on stage.
    pub fn new<S: Into<String>>(roster: impl IntoIterator<Item = S>) -> Self {
        let log = Log::default();
        Self {
            filter: FilterRecorder(log.clone()),
            screen: ScreenRecorder(log.clone()),
            particles: ParticleRecorder(log.clone()),
            characters: MotionRecorder {
                log: log.clone(),
                roster: roster.into_iter().map(Into::into).collect(),
            },
            log,
        }
    }

    /// Position stamped on subsequent commands.
    pub fn set_position(&mut self, position: f32) {
        self.log.position.set(position);
    }

    /// Borrow the recorder as the four sinks of a directing pass.
    pub fn targets(&mut self) -> StageTargets<'_> {
        StageTargets {
            filter: &mut self.filter,
            screen: &mut self.screen,
            particles: &mut self.particles,
            characters: &mut self.characters,
        }
    }

    /// Remove and return everything recorded so far.
    pub fn take_commands(&mut self) -> Vec<RecordedCommand> {
        std::mem::take(&mut *self.log.commands.borrow_mut())
    }
}

/// Queries over the log for unit tests.
#[cfg(test)]
impl CommandRecorder {
    pub fn commands(&self) -> Vec<RecordedCommand> {
        self.log.commands.borrow().clone()
    }

    pub fn last_filter_mix_ratio(&self) -> Option<f32> {
        self.log.commands.borrow().iter().rev().find_map(|r| match r.command {
            StageCommand::FilterMixRatio { ratio } => Some(ratio),
            _ => None,
        })
    }

    /// Texture keys switched to, in order.
    pub fn textures(&self) -> Vec<String> {
        self.log
            .commands
            .borrow()
            .iter()
            .filter_map(|r| match &r.command {
                StageCommand::SwitchTexture { key } => Some(key.clone()),
                _ => None,
            })
            .collect()
    }

    /// The last motion list sent to `character`.
    pub fn last_motions(&self, character: &str) -> Option<Vec<String>> {
        self.log.commands.borrow().iter().rev().find_map(|r| match &r.command {
            StageCommand::PlayMotions { character: c, motions } if c == character => {
                Some(motions.clone())
            }
            _ => None,
        })
    }

    pub fn spread_count(&self) -> usize {
        self.log
            .commands
            .borrow()
            .iter()
            .filter(|r| r.command == StageCommand::SpreadParticles)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_with_position() {
        let mut recorder = CommandRecorder::new(["Miku", "Rin"]);
        recorder.set_position(100.0);
        {
            let targets = recorder.targets();
            targets.screen.switch_texture("mm2013");
            targets.filter.set_filter_mix_ratio(0.25);
        }
        recorder.set_position(200.0);
        recorder.targets().particles.spread_particles();

        let commands = recorder.commands();
        assert_eq!(commands.len(), 3);
        assert_eq!(commands[0].position, 100.0);
        assert_eq!(commands[2].position, 200.0);
        assert_eq!(recorder.textures(), vec!["mm2013"]);
        assert_eq!(recorder.last_filter_mix_ratio(), Some(0.25));
        assert_eq!(recorder.spread_count(), 1);
    }

    #[test]
    fn test_roster_and_motions() {
        let mut recorder = CommandRecorder::new(["Miku", "Rin"]);
        let targets = recorder.targets();
        assert_eq!(targets.characters.character_names(), vec!["Miku", "Rin"]);
        targets.characters.play_motions("Rin", &["clap_1".to_string()]);

        assert_eq!(recorder.last_motions("Rin"), Some(vec!["clap_1".to_string()]));
        assert_eq!(recorder.last_motions("Miku"), None);
    }

    #[test]
    fn test_take_commands_empties_log() {
        let mut recorder = CommandRecorder::new(Vec::<String>::new());
        recorder.targets().particles.reset_particle_colors();
        assert_eq!(recorder.take_commands().len(), 1);
        assert!(recorder.commands().is_empty());
    }

    #[test]
    fn test_serialize_command() {
        let record = RecordedCommand {
            position: 1200.0,
            command: StageCommand::SwitchTexture { key: "none".to_string() },
        };
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json, r#"{"position":1200.0,"command":"switch_texture","key":"none"}"#);
    }
}
