//! Show configuration.
//!
//! Everything is optional in the JSON file; missing fields take the defaults
//! below.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::particle::ParticleConfig;
use crate::penlight::DEFAULT_SWING_SECONDS;
use crate::song::SongId;

#[derive(Clone, Debug, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StageConfig {
    pub song_id: SongId,
    /// Simulation frame rate.
    pub fps: f32,
    pub particles: ParticleConfig,
    pub penlight_swing_seconds: f32,
    /// Singer whose image colour the penlight shows; Miku when unset.
    pub penlight_color: Option<String>,
    /// Characters on stage, in order.
    pub roster: Vec<String>,
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            song_id: 0,
            fps: 60.0,
            particles: ParticleConfig::default(),
            penlight_swing_seconds: DEFAULT_SWING_SECONDS,
            penlight_color: None,
            roster: ["Miku", "Rin", "Len", "Luka"].map(String::from).to_vec(),
        }
    }
}

/// Frame rates must be finite and positive; anything else never advances
/// the show.
pub fn check_fps(fps: f32) -> Result<()> {
    if !fps.is_finite() || fps <= 0.0 {
        anyhow::bail!("fps must be a positive finite number, got {}", fps);
    }
    Ok(())
}

impl StageConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        let config: StageConfig = serde_json::from_str(json).context("Failed to parse config")?;
        check_fps(config.fps)?;
        if config.particles.max_particles == 0 {
            anyhow::bail!("particles.maxParticles must be at least 1");
        }
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        Self::from_json(&contents).with_context(|| format!("Invalid config {}", path.display()))
    }

    /// Seconds per simulated frame.
    pub fn frame_step(&self) -> f32 {
        1.0 / self.fps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_object_is_default() {
        let config = StageConfig::from_json("{}").unwrap();
        assert_eq!(config.song_id, 0);
        assert_eq!(config.roster, vec!["Miku", "Rin", "Len", "Luka"]);
        assert_eq!(config.particles.max_particles, 200);
        assert!((config.frame_step() - 1.0 / 60.0).abs() < 0.001);
    }

    #[test]
    fn test_partial_override() {
        let config = StageConfig::from_json(
            r#"{ "songId": 2, "particles": { "autoCreateInterval": 3.5 }, "roster": ["Meiko"] }"#,
        )
        .unwrap();
        assert_eq!(config.song_id, 2);
        assert!((config.particles.auto_create_interval - 3.5).abs() < 0.001);
        assert!((config.particles.orbit_radius - 10.0).abs() < 0.001);
        assert_eq!(config.roster, vec!["Meiko"]);
        assert!(config.penlight_color.is_none());

        let config = StageConfig::from_json(r#"{ "penlightColor": "Luka" }"#).unwrap();
        assert_eq!(config.penlight_color.as_deref(), Some("Luka"));
    }

    #[test]
    fn test_rejects_bad_fps() {
        assert!(StageConfig::from_json(r#"{ "fps": 0 }"#).is_err());
        assert!(StageConfig::from_json("not json").is_err());
        // Overflows to infinity as f32
        assert!(StageConfig::from_json(r#"{ "fps": 1e39 }"#).is_err());
    }

    #[test]
    fn test_check_fps() {
        assert!(check_fps(30.0).is_ok());
        assert!(check_fps(0.0).is_err());
        assert!(check_fps(-60.0).is_err());
        assert!(check_fps(f32::INFINITY).is_err());
        assert!(check_fps(f32::NAN).is_err());
    }

    #[test]
    fn test_rejects_zero_particle_cap() {
        assert!(StageConfig::from_json(r#"{ "particles": { "maxParticles": 0 } }"#).is_err());
        assert!(StageConfig::from_json(r#"{ "particles": { "maxParticles": 1 } }"#).is_ok());
    }
}
