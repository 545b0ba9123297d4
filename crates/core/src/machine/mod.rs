//! The interaction state machine tying detection, layout and celebration
//! together.
//!
//! Everything is driven from [`InteractionStateMachine::tick`]: sample the
//! microphone, feed the detector, react to a gesture, advance the
//! celebration, then build the frame for the surface. A gesture is handled
//! within the tick that produced it.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{
    audio::{Microphone, SignalSampler},
    celebration::CelebrationOrchestrator,
    config::AppConfig,
    detector::{BlowGestureDetector, GestureEvent},
    layout::CandleLayoutEngine,
    playback::{BirthdaySong, PlaybackBackend},
    render::{BalloonDraw, CandleDraw, FruitDraw, ParticleDraw, RenderFrame},
    scene::{CakeScene, CakeStyle},
    Result,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InteractionState {
    /// No candles on the cake.
    Idle,
    /// Candles are lit and waiting to be blown out.
    Ready,
    Celebrating,
    /// Celebration over, waiting for the automatic reset.
    CoolDown,
}

impl InteractionState {
    /// Candle edits and style switches are only accepted when unlocked.
    pub fn is_locked(self) -> bool {
        matches!(self, Self::Celebrating | Self::CoolDown)
    }
}

/// Prompt shown under the cake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Hint {
    Hidden,
    BlowPrompt,
    Celebrating,
    TestMode,
}

impl Hint {
    pub fn text(self) -> Option<&'static str> {
        match self {
            Self::Hidden => None,
            Self::BlowPrompt => Some("Blow into the microphone!"),
            Self::Celebrating => Some("Happy birthday!"),
            Self::TestMode => Some("Test mode (local access)"),
        }
    }
}

pub struct InteractionStateMachine {
    state: InteractionState,
    hint: Hint,
    test_mode: bool,
    sampler: SignalSampler,
    detector: BlowGestureDetector,
    candles: CandleLayoutEngine,
    scene: CakeScene,
    celebration: CelebrationOrchestrator,
    song: BirthdaySong,
    baseline: usize,
    cool_down: Duration,
    reset_at: Option<Duration>,
    flame_fade: Duration,
    smoke: Duration,
}

impl InteractionStateMachine {
    pub fn new(config: &AppConfig, playback: Box<dyn PlaybackBackend>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            state: InteractionState::Idle,
            hint: Hint::Hidden,
            test_mode: false,
            sampler: SignalSampler::new(&config.sampler)?,
            detector: BlowGestureDetector::new(&config.detector)?,
            candles: CandleLayoutEngine::new(&config.candles)?,
            scene: CakeScene::new(&config.scene)?,
            celebration: CelebrationOrchestrator::new(&config.celebration)?,
            song: BirthdaySong::new(&config.playback, playback)?,
            baseline: 0,
            cool_down: config.celebration.cool_down(),
            reset_at: None,
            flame_fade: config.candles.flame_fade(),
            smoke: config.candles.smoke(),
        })
    }

    /// Marks the machine as driven by a test harness rather than a person.
    pub fn with_test_mode(mut self, test_mode: bool) -> Self {
        self.test_mode = test_mode;
        self.hint = self.resting_hint();
        self
    }

    pub fn state(&self) -> InteractionState {
        self.state
    }

    pub fn hint(&self) -> Hint {
        self.hint
    }

    pub fn candles(&self) -> &CandleLayoutEngine {
        &self.candles
    }

    pub fn candle_count(&self) -> usize {
        self.candles.len()
    }

    pub fn scene(&self) -> &CakeScene {
        &self.scene
    }

    pub fn celebration(&self) -> &CelebrationOrchestrator {
        &self.celebration
    }

    pub fn detector(&self) -> &BlowGestureDetector {
        &self.detector
    }

    /// Gives access to the detector, mainly to subscribe gesture listeners.
    pub fn detector_mut(&mut self) -> &mut BlowGestureDetector {
        &mut self.detector
    }

    pub fn is_muted(&self) -> bool {
        self.song.is_muted()
    }

    /// Hands the microphone to the sampler. On failure the cake is cleared
    /// back to `Idle` and the error carries the details for the user.
    pub async fn acquire_microphone<M: Microphone>(&mut self, microphone: &mut M) -> Result<()> {
        match self.sampler.acquire(microphone).await {
            Ok(()) => Ok(()),
            Err(err) => {
                warn!(error = %err, "could not access the microphone");
                self.fall_back_to_idle();
                Err(err)
            }
        }
    }

    pub fn add_candle(&mut self) -> bool {
        if self.state.is_locked() {
            debug!(state = ?self.state, "candle edit ignored");
            return false;
        }
        let changed = self.candles.add_candle();
        self.after_candle_edit();
        changed
    }

    pub fn remove_candle(&mut self) -> bool {
        if self.state.is_locked() {
            debug!(state = ?self.state, "candle edit ignored");
            return false;
        }
        let changed = self.candles.remove_candle();
        self.after_candle_edit();
        changed
    }

    /// Switches the cake look. Decorations reset, so all candles are removed.
    /// Returns `Ok(false)` when ignored because a celebration is running.
    pub fn switch_cake(&mut self, style: CakeStyle) -> Result<bool> {
        if self.state.is_locked() {
            return Ok(false);
        }
        self.scene.switch(style)?;
        self.candles.clear();
        self.after_candle_edit();
        Ok(true)
    }

    /// Fires a gesture without the microphone and reacts to it at `now`.
    /// Returns whether the gesture started a celebration.
    pub fn inject_gesture(&mut self, now: Duration) -> bool {
        let event = self.detector.inject(now);
        self.on_gesture(&event, now)
    }

    /// Flips the birthday song mute flag and returns the new value.
    pub fn toggle_mute(&mut self) -> bool {
        let celebrating = self.state == InteractionState::Celebrating;
        self.song.toggle_mute(celebrating)
    }

    /// Advances everything to `now` and returns the frame to draw.
    pub fn tick(&mut self, now: Duration) -> RenderFrame {
        let sample = self.sampler.sample();
        if let Some(event) = self.detector.observe(now, sample) {
            self.on_gesture(&event, now);
        }

        if let Some(ended) = self.celebration.tick(now) {
            debug!(session = ended.id, "entering cool down");
            self.state = InteractionState::CoolDown;
            self.reset_at = Some(now + self.cool_down);
        }

        if self.state == InteractionState::CoolDown
            && self.reset_at.map(|at| now >= at).unwrap_or(true)
        {
            self.reset();
        }

        self.frame(now)
    }

    /// Cancels the celebration, stops the song and releases the microphone.
    pub fn teardown(&mut self) {
        self.celebration.cancel();
        self.song.stop();
        self.sampler.release();
        self.detector.reset();
        self.reset_at = None;
        if self.state.is_locked() {
            self.reset();
        }
    }

    fn on_gesture(&mut self, event: &GestureEvent, now: Duration) -> bool {
        if self.state != InteractionState::Ready || self.candles.is_empty() {
            debug!(sequence = event.sequence, state = ?self.state, "gesture ignored");
            return false;
        }

        info!(status = "BLOW_SUCCESS", sequence = event.sequence, source = ?event.source, "candles blown out");
        self.baseline = self.candles.len();
        self.candles.extinguish_all(now);
        self.celebration.trigger(now);
        self.song.start();
        self.state = InteractionState::Celebrating;
        self.hint = Hint::Celebrating;
        true
    }

    fn reset(&mut self) {
        self.song.stop();
        self.candles.reset_to(self.baseline);
        self.reset_at = None;
        self.state = self.resting_state();
        self.hint = self.resting_hint();
        info!(candles = self.candles.len(), state = ?self.state, "scene reset");
    }

    fn fall_back_to_idle(&mut self) {
        self.celebration.cancel();
        self.song.stop();
        self.detector.reset();
        self.candles.clear();
        self.baseline = 0;
        self.reset_at = None;
        self.state = InteractionState::Idle;
        self.hint = self.resting_hint();
    }

    fn after_candle_edit(&mut self) {
        self.state = self.resting_state();
        self.hint = if self.candles.is_empty() {
            self.resting_hint()
        } else {
            Hint::BlowPrompt
        };
    }

    fn resting_state(&self) -> InteractionState {
        if self.candles.is_empty() {
            InteractionState::Idle
        } else {
            InteractionState::Ready
        }
    }

    fn resting_hint(&self) -> Hint {
        if self.test_mode {
            Hint::TestMode
        } else {
            Hint::Hidden
        }
    }

    fn frame(&self, now: Duration) -> RenderFrame {
        let candles = self
            .candles
            .candles()
            .iter()
            .zip(self.candles.placements())
            .map(|(candle, placement)| {
                CandleDraw::new(candle, placement, now, self.flame_fade, self.smoke)
            })
            .collect();

        RenderFrame {
            time: now,
            state: self.state,
            hint: self.hint,
            style: self.scene.style(),
            candles,
            fruits: self.scene.fruits().iter().map(FruitDraw::from).collect(),
            balloons: self
                .celebration
                .balloons()
                .iter()
                .map(|balloon| BalloonDraw::new(balloon, now))
                .collect(),
            particles: self.celebration.particles().iter().map(ParticleDraw::from).collect(),
            effect_active: self.celebration.effect_active(),
        }
    }
}

impl std::fmt::Debug for InteractionStateMachine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InteractionStateMachine")
            .field("state", &self.state)
            .field("hint", &self.hint)
            .field("candles", &self.candles.len())
            .field("baseline", &self.baseline)
            .field("sampler", &self.sampler)
            .finish()
    }
}
