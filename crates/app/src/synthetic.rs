use std::time::Duration;

use birthday_cake_core::{
    AcquireError, AudioStream, Microphone, PlaybackBackend, Result, SecurityContext,
};
use rand::{rngs::StdRng, Rng, SeedableRng};

/// Microphone that is silent except for scripted exhales of white noise.
#[derive(Debug, Clone)]
pub struct SyntheticMicrophone {
    frame: Duration,
    exhales: Vec<(Duration, Duration)>,
    seed: u64,
}

impl SyntheticMicrophone {
    pub fn new(frame: Duration, seed: u64) -> Self {
        Self {
            frame,
            exhales: Vec::new(),
            seed,
        }
    }

    pub fn exhale(mut self, start: Duration, length: Duration) -> Self {
        self.exhales.push((start, start + length));
        self
    }
}

impl Microphone for SyntheticMicrophone {
    type Stream = SyntheticStream;

    fn security_context(&self) -> SecurityContext {
        SecurityContext::local()
    }

    async fn request_stream(&mut self) -> std::result::Result<SyntheticStream, AcquireError> {
        Ok(SyntheticStream {
            frame: self.frame,
            exhales: self.exhales.clone(),
            reads: 0,
            rng: StdRng::seed_from_u64(self.seed),
        })
    }
}

#[derive(Debug)]
pub struct SyntheticStream {
    frame: Duration,
    exhales: Vec<(Duration, Duration)>,
    reads: u32,
    rng: StdRng,
}

impl AudioStream for SyntheticStream {
    fn sample_rate(&self) -> u32 {
        48_000
    }

    fn channels(&self) -> u16 {
        1
    }

    fn read_latest(&mut self, buf: &mut [f32]) -> usize {
        let now = self.frame * self.reads;
        self.reads += 1;

        let blowing = self
            .exhales
            .iter()
            .any(|(start, end)| (*start..*end).contains(&now));
        for value in buf.iter_mut() {
            *value = if blowing {
                self.rng.gen_range(-0.8..0.8)
            } else {
                0.0
            };
        }
        buf.len()
    }

    fn stop(&mut self) {
        tracing::debug!(reads = self.reads, "synthetic stream stopped");
    }
}

/// Playback backend that only logs what it was asked to do.
#[derive(Debug, Default)]
pub struct LoggingPlayback;

impl PlaybackBackend for LoggingPlayback {
    fn play(&mut self, seek_seconds: f32) -> Result<()> {
        tracing::info!(seek_seconds, "birthday song playing");
        Ok(())
    }

    fn pause(&mut self) {
        tracing::info!("birthday song paused");
    }

    fn set_muted(&mut self, muted: bool) {
        tracing::debug!(muted, "birthday song mute changed");
    }
}
