use std::f32::consts::TAU;

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::Hsl;
use crate::config::{CelebrationConfig, Viewport};

/// One confetti square.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    pub x: f32,
    pub y: f32,
    /// Initial sideways drift; the step only applies sway to `x`.
    pub vx: f32,
    pub vy: f32,
    pub size: f32,
    pub color: Hsl,
    /// Degrees.
    pub rotation: f32,
    /// Degrees per step.
    pub rotation_speed: f32,
    pub phase: f32,
    pub amplitude: f32,
}

impl Particle {
    /// Random particle somewhere above the visible area.
    pub fn scattered<R: Rng + ?Sized>(rng: &mut R, viewport: Viewport, drop_height: f32) -> Self {
        Self {
            x: rng.gen::<f32>() * viewport.width,
            y: -rng.gen::<f32>() * drop_height,
            vx: (rng.gen::<f32>() - 0.5) * 2.0,
            // slow initial fall so the squares drift rather than drop
            vy: rng.gen::<f32>() * 1.5 + 1.0,
            size: rng.gen::<f32>() * 6.0 + 4.0,
            color: Hsl::new(rng.gen::<f32>() * 360.0, 80.0, 50.0),
            rotation: rng.gen::<f32>() * 360.0,
            rotation_speed: rng.gen::<f32>() * 6.0 - 3.0,
            phase: rng.gen::<f32>() * TAU,
            amplitude: rng.gen::<f32>() * 1.5 + 0.5,
        }
    }

    /// Advances one simulation step. `now_ms` drives the sway.
    pub fn step(&mut self, now_ms: f64, gravity: f32, sway_period_ms: f32) {
        self.y += self.vy;
        self.vy += gravity;
        let sway = (now_ms / f64::from(sway_period_ms) + f64::from(self.phase)).sin() as f32;
        self.x += sway * self.amplitude;
        self.rotation += self.rotation_speed;
    }
}

/// Fixed batch of particles stepped once per tick while active.
#[derive(Debug, Default)]
pub struct Confetti {
    particles: Vec<Particle>,
    gravity: f32,
    sway_period_ms: f32,
}

impl Confetti {
    pub fn new(config: &CelebrationConfig) -> Self {
        Self {
            particles: Vec::with_capacity(config.particle_count),
            gravity: config.gravity,
            sway_period_ms: config.sway_period_ms,
        }
    }

    /// Replaces the current batch with `count` fresh particles.
    pub fn scatter<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        count: usize,
        viewport: Viewport,
        drop_height: f32,
    ) {
        self.particles.clear();
        self.particles
            .extend((0..count).map(|_| Particle::scattered(rng, viewport, drop_height)));
    }

    pub fn step(&mut self, now_ms: f64) {
        for particle in &mut self.particles {
            particle.step(now_ms, self.gravity, self.sway_period_ms);
        }
    }

    pub fn clear(&mut self) {
        self.particles.clear();
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }
}
