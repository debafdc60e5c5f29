//! The audience penlight.
//!
//! Each click swings the penlight and throws a particle from its tip.

use std::f32::consts::PI;

use glam::Vec3;

use crate::color::{palette, Color};
use crate::particle::ParticleField;

pub const DEFAULT_SWING_SECONDS: f32 = 0.5;

/// Distance from the penlight origin to the glowing tip.
const TIP_OFFSET: Vec3 = Vec3::new(0.0, 6.0, 0.0);

#[derive(Clone, Debug)]
pub struct Penlight {
    position: Vec3,
    color: Color,
    swing_seconds: f32,
    /// Seconds left in the current swing.
    animation_time: f32,
    /// Euler rotation (x, y, z) in radians.
    rotation: Vec3,
}

impl Default for Penlight {
    fn default() -> Self {
        Self::new(Vec3::new(10.0, 6.0, 40.0), palette::MIKU)
    }
}

impl Penlight {
    pub fn new(position: Vec3, color: Color) -> Self {
        Self {
            position,
            color,
            swing_seconds: DEFAULT_SWING_SECONDS,
            animation_time: 0.0,
            rotation: Self::rotation_at(0.0),
        }
    }

    pub fn with_swing_seconds(mut self, seconds: f32) -> Self {
        self.swing_seconds = seconds.max(f32::EPSILON);
        self
    }

    fn rotation_at(t: f32) -> Vec3 {
        Vec3::new(0.8 * (t + PI / 3.0).cos(), 0.0, 0.03 * t.cos())
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn tip_position(&self) -> Vec3 {
        self.position + TIP_OFFSET
    }

    pub fn light_color(&self) -> Color {
        self.color
    }

    pub fn set_light_color(&mut self, color: Color) {
        self.color = color;
    }

    pub fn rotation(&self) -> Vec3 {
        self.rotation
    }

    pub fn is_swinging(&self) -> bool {
        self.animation_time > 0.0
    }

    /// Start a swing, restarting any swing in progress, and throw a particle
    /// from the tip.
    pub fn shake(&mut self, particles: &mut ParticleField) -> Option<u64> {
        self.animation_time = self.swing_seconds;
        particles.create_particle(self.tip_position(), self.color)
    }

    pub fn update(&mut self, dt: f32) {
        if self.animation_time > 0.0 {
            let t = (self.animation_time / self.swing_seconds) * PI;
            self.rotation = Self::rotation_at(t);
            self.animation_time -= dt;
        }
    }
}
