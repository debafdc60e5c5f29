//! Orbiting sphere particles.
//!
//! Particles are thrown from a point (the penlight tip, or an automatic
//! spawn point behind the audience), arc over to one of a few orbit targets
//! above the stage, and circle it. At the last chorus they are flung out
//! over the floor and disappear.
//!
//! Motion is deterministic for a given seed: random directions come from a
//! xorshift generator, not the thread RNG.

use std::f32::consts::{PI, TAU};

use glam::Vec3;
use serde::Deserialize;

use crate::color::{palette, Color};
use crate::sinks::ParticleSink;

/// Configuration for a particle field.
#[derive(Clone, Debug, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ParticleConfig {
    /// Maximum number of live particles; the oldest is dropped beyond this.
    pub max_particles: usize,
    /// Seconds between automatically created particles.
    pub auto_create_interval: f32,
    /// Units per second while flying to the orbit.
    pub approach_speed: f32,
    /// Orbit radius around the target.
    pub orbit_radius: f32,
    /// Radians per second while orbiting.
    pub orbit_speed: f32,
    /// Units per second while spreading.
    pub spread_speed: f32,
    /// Spread destinations fall within `±spread_extent` on x and z.
    pub spread_extent: f32,
    /// Random seed.
    pub seed: u64,
}

impl Default for ParticleConfig {
    fn default() -> Self {
        Self {
            max_particles: 200,
            auto_create_interval: 7.0,
            approach_speed: 30.0,
            orbit_radius: 10.0,
            orbit_speed: 2.0,
            spread_speed: 15.0,
            spread_extent: 75.0,
            seed: 0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParticlePhase {
    /// Flying from the spawn point to its place on the orbit.
    Approach,
    /// Circling its target.
    Orbit,
    /// Flying out to its spread destination.
    Spread,
    /// Hidden after spreading.
    Idle,
}

/// A single particle.
#[derive(Clone, Debug)]
pub struct Particle {
    pub id: u64,
    pub position: Vec3,
    pub color: Color,
    /// Colour at creation, restored by [`ParticleField::reset_colors`].
    pub origin_color: Color,
    pub phase: ParticlePhase,
    pub visible: bool,
    /// Index of the orbit target.
    pub target: usize,
    /// Position along the straight line of the current flight.
    line_position: Vec3,
    /// Length of the current flight.
    flight_distance: f32,
    phi: f32,
    theta: f32,
    phi_direction: f32,
    theta_direction: f32,
    arrive_position: Vec3,
    spread_position: Vec3,
}

/// Point on a sphere of `radius` given polar angle `phi` and azimuth `theta`
/// (y up).
fn spherical(radius: f32, phi: f32, theta: f32) -> Vec3 {
    let sin_phi = phi.sin();
    Vec3::new(
        radius * sin_phi * theta.sin(),
        radius * phi.cos(),
        radius * sin_phi * theta.cos(),
    )
}

impl Particle {
    /// Advance the particle by `dt` seconds. `target` is its orbit centre.
    fn update(&mut self, dt: f32, target: Vec3, config: &ParticleConfig) {
        match self.phase {
            ParticlePhase::Approach => {
                if !self.fly(dt * config.approach_speed, self.arrive_position, Vec3::new(0.0, 14.0, 10.0)) {
                    self.phase = ParticlePhase::Orbit;
                }
            }
            ParticlePhase::Orbit => {
                let step = dt * config.orbit_speed;
                self.phi = (self.phi + self.phi_direction * step) % TAU;
                self.theta = (self.theta + self.theta_direction * step) % TAU;
                self.position = spherical(config.orbit_radius, self.phi, self.theta) + target;
            }
            ParticlePhase::Spread => {
                if !self.fly(dt * config.spread_speed, self.spread_position, Vec3::new(0.0, 30.0, 15.0)) {
                    self.visible = false;
                    self.phase = ParticlePhase::Idle;
                }
            }
            ParticlePhase::Idle => {}
        }
    }

    /// Move `step` units toward `destination` along an arc whose height is
    /// `arc`. Returns false once the destination is within one step.
    fn fly(&mut self, step: f32, destination: Vec3, arc: Vec3) -> bool {
        let remaining = self.line_position.distance(destination);
        if remaining <= step {
            return false;
        }
        let front = (destination - self.line_position).normalize_or_zero();
        self.line_position += front * step;

        let t = (1.0 - remaining / self.flight_distance.max(f32::EPSILON)) * PI;
        self.position = self.line_position + arc * t.sin();
        true
    }

    fn start_spread(&mut self) {
        if self.phase != ParticlePhase::Spread {
            self.phase = ParticlePhase::Spread;
            self.line_position = self.position;
            self.flight_distance = self.line_position.distance(self.spread_position);
        }
    }
}

/// All particles and their orbit targets.
#[derive(Clone, Debug)]
pub struct ParticleField {
    config: ParticleConfig,
    targets: Vec<Vec3>,
    particles: Vec<Particle>,
    /// Target the next particle will orbit.
    next_target: usize,
    /// Spread is a one-shot per performance.
    can_spread: bool,
    auto_create: bool,
    next_auto_create: f32,
    next_id: u64,
    rng_state: u64,
}

impl ParticleField {
    pub fn new(config: ParticleConfig) -> Self {
        Self {
            next_auto_create: config.auto_create_interval,
            rng_state: config.seed,
            config,
            targets: Vec::new(),
            particles: Vec::new(),
            next_target: 0,
            can_spread: true,
            auto_create: false,
            next_id: 0,
        }
    }

    /// Add an orbit target (a sphere above the stage).
    pub fn add_target(&mut self, position: Vec3) {
        self.targets.push(position);
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn can_spread(&self) -> bool {
        self.can_spread
    }

    pub fn is_auto_create(&self) -> bool {
        self.auto_create
    }

    pub fn set_auto_create(&mut self, enabled: bool) {
        self.auto_create = enabled;
    }

    /// Uniform random value in `[0, 1]`.
    fn next_f32(&mut self) -> f32 {
        // xorshift64; seed 0 is degenerate
        if self.rng_state == 0 {
            self.rng_state = 0x5DEECE66D;
        }
        self.rng_state ^= self.rng_state << 13;
        self.rng_state ^= self.rng_state >> 7;
        self.rng_state ^= self.rng_state << 17;
        (self.rng_state as f32) / (u64::MAX as f32)
    }

    fn next_sign(&mut self) -> f32 {
        if self.next_f32() < 0.5 {
            -1.0
        } else {
            1.0
        }
    }

    /// Throw a new particle from `position`. Returns its id, or `None` when
    /// there is no orbit target to send it to or no room at all.
    pub fn create_particle(&mut self, position: Vec3, color: Color) -> Option<u64> {
        if self.targets.is_empty() {
            log::warn!("Particle field has no orbit targets - particle dropped");
            return None;
        }
        if self.config.max_particles == 0 {
            return None;
        }
        if self.particles.len() >= self.config.max_particles {
            let excess = self.particles.len() + 1 - self.config.max_particles;
            self.particles.drain(..excess);
        }

        let target = self.next_target % self.targets.len();
        let phi = self.next_f32() * TAU;
        let theta = self.next_f32() * TAU;
        let phi_direction = self.next_sign();
        let theta_direction = self.next_sign();
        let extent = self.config.spread_extent;
        let spread_position = Vec3::new(
            (self.next_f32() * extent * 2.0).round() - extent,
            0.0,
            (self.next_f32() * extent * 2.0).round() - extent,
        );
        let arrive_position = spherical(self.config.orbit_radius, phi, theta) + self.targets[target];

        let id = self.next_id;
        self.next_id += 1;
        self.particles.push(Particle {
            id,
            position,
            color,
            origin_color: color,
            phase: ParticlePhase::Approach,
            visible: true,
            target,
            line_position: position,
            flight_distance: position.distance(arrive_position),
            phi,
            theta,
            phi_direction,
            theta_direction,
            arrive_position,
            spread_position,
        });

        self.next_target = (target + 1) % self.targets.len();
        Some(id)
    }

    /// Spawn point for automatic particles, on the side of the target the
    /// particle will orbit. Assumes the usual three targets: centre, left, right.
    pub fn auto_create_position(&mut self) -> Vec3 {
        match self.next_target {
            1 => Vec3::new(-50.0, 10.0, 100.0),
            2 => Vec3::new(50.0, 10.0, 100.0),
            _ => Vec3::new(50.0 * self.next_sign(), 10.0, 100.0),
        }
    }

    /// A random singer colour for automatic particles.
    pub fn auto_create_color(&mut self) -> Color {
        let len = palette::SINGERS.len();
        let index = ((self.next_f32() * len as f32) as usize).min(len - 1);
        palette::SINGERS[index]
    }

    pub fn update(&mut self, dt: f32) {
        for particle in &mut self.particles {
            let target = self.targets.get(particle.target).copied().unwrap_or(Vec3::ZERO);
            particle.update(dt, target, &self.config);
        }

        if self.auto_create {
            self.next_auto_create -= dt;
            if self.next_auto_create < 0.0 {
                let position = self.auto_create_position();
                let color = self.auto_create_color();
                self.create_particle(position, color);
                self.next_auto_create = self.config.auto_create_interval;
            }
        }
    }

    /// Fling every particle out. Only the first call per performance acts.
    pub fn spread(&mut self) {
        if !self.can_spread {
            return;
        }
        log::debug!("Spreading {} particles", self.particles.len());
        for particle in &mut self.particles {
            particle.start_spread();
        }
        self.can_spread = false;
    }

    /// Paint particle `i` with `colors[i % colors.len()]`. An empty list is
    /// ignored.
    pub fn set_colors(&mut self, colors: &[Color]) {
        if colors.is_empty() {
            return;
        }
        for (i, particle) in self.particles.iter_mut().enumerate() {
            particle.color = colors[i % colors.len()];
        }
    }

    pub fn reset_colors(&mut self) {
        for particle in &mut self.particles {
            particle.color = particle.origin_color;
        }
    }

    pub fn remove_particles(&mut self) {
        self.particles.clear();
    }

    /// Clear the field for a new performance and rearm the spread. Random
    /// draws start over from the seed.
    pub fn restart(&mut self) {
        self.remove_particles();
        self.can_spread = true;
        self.next_target = 0;
        self.next_auto_create = self.config.auto_create_interval;
        self.rng_state = self.config.seed;
    }
}

impl ParticleSink for ParticleField {
    fn set_particle_colors(&mut self, colors: &[Color]) {
        self.set_colors(colors);
    }

    fn reset_particle_colors(&mut self) {
        self.reset_colors();
    }

    fn spread_particles(&mut self) {
        self.spread();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_field() -> ParticleField {
        let mut field = ParticleField::new(ParticleConfig {
            seed: 42,
            ..Default::default()
        });
        field.add_target(Vec3::new(0.0, 60.0, -105.0));
        field.add_target(Vec3::new(-130.0, 40.0, -105.0));
        field.add_target(Vec3::new(130.0, 40.0, -105.0));
        field
    }

    #[test]
    fn test_targets_are_round_robin() {
        let mut field = make_field();
        for _ in 0..4 {
            field.create_particle(Vec3::ZERO, palette::MIKU);
        }
        let targets: Vec<usize> = field.particles().iter().map(|p| p.target).collect();
        assert_eq!(targets, vec![0, 1, 2, 0]);
    }

    #[test]
    fn test_no_targets_drops_particle() {
        let mut field = ParticleField::new(ParticleConfig::default());
        assert!(field.create_particle(Vec3::ZERO, palette::MIKU).is_none());
        assert!(field.is_empty());
    }

    #[test]
    fn test_oldest_particle_is_dropped_at_capacity() {
        let mut field = ParticleField::new(ParticleConfig {
            max_particles: 3,
            ..Default::default()
        });
        field.add_target(Vec3::ZERO);
        for _ in 0..5 {
            field.create_particle(Vec3::ZERO, palette::MIKU);
        }
        assert_eq!(field.len(), 3);
        assert_eq!(field.particles()[0].id, 2);
    }

    #[test]
    fn test_zero_capacity_creates_nothing() {
        let mut field = ParticleField::new(ParticleConfig {
            max_particles: 0,
            ..Default::default()
        });
        field.add_target(Vec3::ZERO);
        assert!(field.create_particle(Vec3::ZERO, palette::MIKU).is_none());
        field.set_auto_create(true);
        field.update(8.0);
        assert!(field.is_empty());
    }

    #[test]
    fn test_restart_replays_from_seed() {
        let mut field = make_field();
        field.create_particle(Vec3::ZERO, palette::MIKU);
        field.create_particle(Vec3::ZERO, palette::MIKU);
        field.update(0.5);
        let first: Vec<Vec3> = field.particles().iter().map(|p| p.position).collect();

        field.restart();
        field.create_particle(Vec3::ZERO, palette::MIKU);
        field.create_particle(Vec3::ZERO, palette::MIKU);
        field.update(0.5);
        let second: Vec<Vec3> = field.particles().iter().map(|p| p.position).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_round_robin_colors_and_reset() {
        let mut field = make_field();
        for _ in 0..3 {
            field.create_particle(Vec3::ZERO, palette::MIKU);
        }

        field.set_colors(&[palette::RIN, palette::LEN]);
        let colors: Vec<Color> = field.particles().iter().map(|p| p.color).collect();
        assert_eq!(colors, vec![palette::RIN, palette::LEN, palette::RIN]);

        // Empty list leaves colours alone
        field.set_colors(&[]);
        assert_eq!(field.particles()[1].color, palette::LEN);

        field.reset_colors();
        assert!(field.particles().iter().all(|p| p.color == palette::MIKU));
    }

    #[test]
    fn test_approach_then_orbit() {
        let mut field = make_field();
        field.create_particle(Vec3::new(10.0, 6.0, 40.0), palette::MIKU);
        assert_eq!(field.particles()[0].phase, ParticlePhase::Approach);

        // ~170 units at 30 units/s
        for _ in 0..(60 * 10) {
            field.update(1.0 / 60.0);
        }
        let particle = &field.particles()[0];
        assert_eq!(particle.phase, ParticlePhase::Orbit);
        let centre = field.targets[particle.target];
        assert!((particle.position.distance(centre) - 10.0).abs() < 0.01);
    }

    #[test]
    fn test_spread_is_one_shot() {
        let mut field = make_field();
        field.create_particle(Vec3::ZERO, palette::MIKU);
        field.spread();
        assert!(!field.can_spread());
        assert_eq!(field.particles()[0].phase, ParticlePhase::Spread);

        // A particle created after the spread is not flung by a second call
        field.create_particle(Vec3::ZERO, palette::MIKU);
        field.spread();
        assert_eq!(field.particles()[1].phase, ParticlePhase::Approach);

        field.restart();
        assert!(field.is_empty());
        assert!(field.can_spread());
    }

    #[test]
    fn test_spread_ends_hidden() {
        let mut field = make_field();
        field.create_particle(Vec3::ZERO, palette::MIKU);
        field.spread();
        for _ in 0..(60 * 60) {
            field.update(1.0 / 60.0);
        }
        let particle = &field.particles()[0];
        assert_eq!(particle.phase, ParticlePhase::Idle);
        assert!(!particle.visible);
    }

    #[test]
    fn test_auto_create_interval() {
        let mut field = make_field();
        field.set_auto_create(true);

        field.update(6.9);
        assert!(field.is_empty());
        field.update(0.2);
        assert_eq!(field.len(), 1);
        assert!(palette::SINGERS.contains(&field.particles()[0].origin_color));

        field.set_auto_create(false);
        field.update(100.0);
        assert_eq!(field.len(), 1);
    }

    #[test]
    fn test_deterministic_for_seed() {
        let mut a = make_field();
        let mut b = make_field();
        a.create_particle(Vec3::ZERO, palette::MIKU);
        b.create_particle(Vec3::ZERO, palette::MIKU);
        a.update(0.1);
        b.update(0.1);
        assert_eq!(a.particles()[0].position, b.particles()[0].position);
    }
}
