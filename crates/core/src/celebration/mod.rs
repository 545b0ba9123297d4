//! Timed celebration played after the candles go out.
//!
//! A session runs two animations side by side: balloons released on a
//! staggered schedule, and a batch of confetti stepped once per tick. Both
//! stop when the session duration elapses. Triggering again replaces the
//! running session instead of stacking a second one.

mod balloons;
mod confetti;

use std::{fmt, time::Duration};

use rand::{rngs::StdRng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

pub use balloons::{Balloon, BalloonFlight};
pub use confetti::{Confetti, Particle};

use crate::{config::CelebrationConfig, timeline::TimerQueue, Result};

/// Colour in CSS `hsl()` terms.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hsl {
    pub hue: f32,
    pub saturation: f32,
    pub lightness: f32,
}

impl Hsl {
    pub fn new(hue: f32, saturation: f32, lightness: f32) -> Self {
        Self {
            hue,
            saturation,
            lightness,
        }
    }
}

impl fmt::Display for Hsl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "hsl({:.0}, {:.0}%, {:.0}%)",
            self.hue, self.saturation, self.lightness
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CelebrationSession {
    pub id: u64,
    pub started_at: Duration,
    pub duration: Duration,
    pub active: bool,
}

impl CelebrationSession {
    pub fn ends_at(&self) -> Duration {
        self.started_at + self.duration
    }
}

/// Reported by [`CelebrationOrchestrator::tick`] when a session runs out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionEnded {
    pub id: u64,
    pub at: Duration,
}

#[derive(Debug)]
pub struct CelebrationOrchestrator {
    config: CelebrationConfig,
    rng: StdRng,
    session: Option<CelebrationSession>,
    next_session: u64,
    pending_spawns: TimerQueue<usize>,
    flight: BalloonFlight,
    confetti: Confetti,
}

impl CelebrationOrchestrator {
    pub fn new(config: &CelebrationConfig) -> Result<Self> {
        config.validate()?;
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(Self {
            config: config.clone(),
            rng,
            session: None,
            next_session: 1,
            pending_spawns: TimerQueue::new(),
            flight: BalloonFlight::default(),
            confetti: Confetti::new(config),
        })
    }

    /// Starts a fresh session at `now`, cancelling any session in progress.
    pub fn trigger(&mut self, now: Duration) -> CelebrationSession {
        if let Some(previous) = self.session.take().filter(|session| session.active) {
            debug!(session = previous.id, "replacing running celebration");
        }
        self.pending_spawns.cancel_all();

        let stagger = self.config.stagger();
        for index in 0..self.config.spawn_count {
            self.pending_spawns.schedule(now + stagger * index as u32, index);
        }

        self.confetti.scatter(
            &mut self.rng,
            self.config.particle_count,
            self.config.viewport,
            self.config.drop_height,
        );

        let session = CelebrationSession {
            id: self.next_session,
            started_at: now,
            duration: self.config.duration(),
            active: true,
        };
        self.next_session += 1;
        self.session = Some(session);
        info!(session = session.id, "celebration started");
        session
    }

    /// Advances both animations to `now`. Returns the session that just
    /// ended, if any.
    pub fn tick(&mut self, now: Duration) -> Option<SessionEnded> {
        self.launch_due(now);
        self.flight.prune(now);

        let session = self.session.filter(|session| session.active)?;
        if now >= session.ends_at() {
            self.finish();
            info!(session = session.id, "celebration finished");
            return Some(SessionEnded { id: session.id, at: now });
        }

        self.confetti.step(now.as_secs_f64() * 1_000.0);
        None
    }

    /// Stops everything immediately: pending and airborne balloons are
    /// dropped and confetti is cleared.
    pub fn cancel(&mut self) {
        if self.is_active() || !self.pending_spawns.is_empty() || !self.flight.is_empty() {
            debug!("celebration cancelled");
        }
        self.finish();
        self.flight.clear();
    }

    /// The most recent session. It stays available with `active` cleared
    /// once it has ended or been cancelled.
    pub fn session(&self) -> Option<CelebrationSession> {
        self.session
    }

    pub fn is_active(&self) -> bool {
        self.session.map(|session| session.active).unwrap_or(false)
    }

    /// Whether the page-wide "effect active" marker should be shown.
    pub fn effect_active(&self) -> bool {
        self.is_active()
    }

    pub fn particles(&self) -> &[Particle] {
        self.confetti.particles()
    }

    pub fn balloons(&self) -> &[Balloon] {
        self.flight.balloons()
    }

    pub fn pending_spawns(&self) -> usize {
        self.pending_spawns.len()
    }

    fn launch_due(&mut self, now: Duration) {
        let rise_min = Duration::from_millis(self.config.rise_min_ms);
        let rise_max = Duration::from_millis(self.config.rise_max_ms);
        for (at, index) in self.pending_spawns.drain_due(now) {
            let balloon = Balloon::launch(&mut self.rng, at, rise_min, rise_max);
            debug!(index, rise_ms = balloon.rise.as_millis() as u64, "balloon released");
            self.flight.release(balloon);
        }
    }

    fn finish(&mut self) {
        self.pending_spawns.cancel_all();
        self.confetti.clear();
        if let Some(session) = self.session.as_mut() {
            session.active = false;
        }
    }
}
