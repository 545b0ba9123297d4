use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::Hsl;

/// A balloon rising from the bottom of the screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Balloon {
    /// Horizontal start, percent of the viewport width.
    pub x: f32,
    pub color: Hsl,
    pub rise: Duration,
    pub spawned_at: Duration,
}

impl Balloon {
    pub fn launch<R: Rng + ?Sized>(
        rng: &mut R,
        spawned_at: Duration,
        rise_min: Duration,
        rise_max: Duration,
    ) -> Self {
        let rise = if rise_max > rise_min {
            rng.gen_range(rise_min..=rise_max)
        } else {
            rise_min
        };
        Self {
            x: rng.gen::<f32>() * 90.0,
            color: Hsl::new(rng.gen::<f32>() * 360.0, 70.0, 60.0),
            rise,
            spawned_at,
        }
    }

    /// Eased-in rise progress in `[0, 1]`.
    pub fn progress(&self, now: Duration) -> f32 {
        let elapsed = now.saturating_sub(self.spawned_at).as_secs_f32();
        let linear = (elapsed / self.rise.as_secs_f32()).clamp(0.0, 1.0);
        linear * linear
    }

    pub fn has_landed(&self, now: Duration) -> bool {
        now.saturating_sub(self.spawned_at) >= self.rise
    }
}

/// Balloons already in the air. Each one leaves on its own once its rise
/// completes; ending or replacing a celebration does not pull them down,
/// only a teardown does.
#[derive(Debug, Default)]
pub struct BalloonFlight {
    balloons: Vec<Balloon>,
}

impl BalloonFlight {
    pub fn release(&mut self, balloon: Balloon) {
        self.balloons.push(balloon);
    }

    pub fn prune(&mut self, now: Duration) {
        self.balloons.retain(|balloon| !balloon.has_landed(now));
    }

    pub fn clear(&mut self) {
        self.balloons.clear();
    }

    pub fn balloons(&self) -> &[Balloon] {
        &self.balloons
    }

    pub fn len(&self) -> usize {
        self.balloons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.balloons.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;

    #[test]
    fn launch_respects_rise_range() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..100 {
            let balloon = Balloon::launch(
                &mut rng,
                Duration::ZERO,
                Duration::from_secs(4),
                Duration::from_secs(7),
            );
            assert!(balloon.rise >= Duration::from_secs(4));
            assert!(balloon.rise <= Duration::from_secs(7));
            assert!((0.0..90.0).contains(&balloon.x));
        }
    }

    #[test]
    fn progress_eases_in() {
        let balloon = Balloon {
            x: 10.0,
            color: Hsl::new(0.0, 70.0, 60.0),
            rise: Duration::from_secs(4),
            spawned_at: Duration::from_secs(1),
        };

        assert_eq!(balloon.progress(Duration::ZERO), 0.0);
        assert!((balloon.progress(Duration::from_secs(3)) - 0.25).abs() < 1e-6);
        assert_eq!(balloon.progress(Duration::from_secs(9)), 1.0);
    }

    #[test]
    fn landed_balloons_are_pruned() {
        let mut flight = BalloonFlight::default();
        let mut rng = StdRng::seed_from_u64(5);
        flight.release(Balloon::launch(&mut rng, Duration::ZERO, Duration::from_secs(4), Duration::from_secs(4)));
        flight.release(Balloon::launch(&mut rng, Duration::from_secs(2), Duration::from_secs(4), Duration::from_secs(4)));

        flight.prune(Duration::from_secs(4));
        assert_eq!(flight.len(), 1);
        flight.prune(Duration::from_secs(6));
        assert!(flight.is_empty());
    }
}
