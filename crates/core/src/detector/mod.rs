//! Turns a stream of energy samples into discrete "blow" gestures.
//!
//! A hysteresis counter climbs by one for every loud sample and decays by one
//! for every quiet one. When it reaches `required_frames` a gesture fires and
//! the detector latches: further loud samples are ignored until the signal
//! drops back to or below the threshold, so one long exhale fires once.

use std::{fmt, time::Duration};

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::{analysis::EnergySample, config::DetectorConfig, Result};

/// Where a gesture came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GestureSource {
    Microphone,
    /// Injected by a driver without going through audio.
    Synthetic,
}

/// A detected blow.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GestureEvent {
    /// Monotonic per-detector sequence number, starting at 1.
    pub sequence: u64,
    pub source: GestureSource,
    pub at: Duration,
    /// Energy of the sample that completed the run.
    pub energy: Option<f32>,
}

pub type GestureListener = Box<dyn FnMut(&GestureEvent)>;

pub struct BlowGestureDetector {
    threshold: f32,
    required_frames: u32,
    counter: u32,
    latched: bool,
    emitted: u64,
    listeners: Vec<GestureListener>,
}

impl BlowGestureDetector {
    pub fn new(config: &DetectorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            threshold: config.threshold,
            required_frames: config.required_frames,
            counter: 0,
            latched: false,
            emitted: 0,
            listeners: Vec::new(),
        })
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn required_frames(&self) -> u32 {
        self.required_frames
    }

    /// Current hysteresis counter, always within `0..=required_frames`.
    pub fn counter(&self) -> u32 {
        self.counter
    }

    /// Whether a gesture fired and the signal has not dropped since.
    pub fn is_latched(&self) -> bool {
        self.latched
    }

    pub fn emitted(&self) -> u64 {
        self.emitted
    }

    /// Registers a listener. Listeners run in registration order, after
    /// the detector has updated its own state.
    pub fn subscribe(&mut self, listener: impl FnMut(&GestureEvent) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Feeds one tick's sample. Missing samples leave the state untouched.
    pub fn observe(&mut self, now: Duration, sample: Option<EnergySample>) -> Option<GestureEvent> {
        let Some(sample) = sample else {
            trace!("skipping tick without an energy sample");
            return None;
        };

        if sample.value() > self.threshold {
            if self.latched {
                return None;
            }
            self.counter = (self.counter + 1).min(self.required_frames);
            if self.counter == self.required_frames {
                self.counter = 0;
                self.latched = true;
                return Some(self.emit(now, GestureSource::Microphone, Some(sample.value())));
            }
        } else {
            self.latched = false;
            self.counter = self.counter.saturating_sub(1);
        }
        None
    }

    /// Fires a gesture directly, bypassing the microphone. The hysteresis
    /// state is left alone.
    pub fn inject(&mut self, now: Duration) -> GestureEvent {
        self.emit(now, GestureSource::Synthetic, None)
    }

    pub fn reset(&mut self) {
        self.counter = 0;
        self.latched = false;
    }

    fn emit(&mut self, now: Duration, source: GestureSource, energy: Option<f32>) -> GestureEvent {
        self.emitted += 1;
        let event = GestureEvent {
            sequence: self.emitted,
            source,
            at: now,
            energy,
        };
        debug!(sequence = event.sequence, ?source, "blow gesture detected");
        for listener in &mut self.listeners {
            listener(&event);
        }
        event
    }
}

impl fmt::Debug for BlowGestureDetector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlowGestureDetector")
            .field("threshold", &self.threshold)
            .field("required_frames", &self.required_frames)
            .field("counter", &self.counter)
            .field("latched", &self.latched)
            .field("emitted", &self.emitted)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
