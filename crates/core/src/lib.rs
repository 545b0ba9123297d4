//! Core library for the birthday cake.
//!
//! The crate turns microphone energy into a "blow" gesture, lays candles out
//! on the cake, runs the celebration that follows and ties it together in a
//! tick-driven state machine. Platform concerns (capture, song playback,
//! drawing) sit behind the [`Microphone`], [`PlaybackBackend`] and
//! [`RenderSurface`] traits.

pub mod analysis;
pub mod audio;
pub mod celebration;
pub mod config;
pub mod detector;
pub mod error;
pub mod layout;
pub mod machine;
pub mod playback;
pub mod record;
pub mod render;
pub mod scene;
pub mod timeline;

pub use analysis::{EnergySample, SpectrumAnalyser};
pub use audio::{AudioStream, Microphone, SignalSampler};
pub use celebration::{CelebrationOrchestrator, CelebrationSession, Particle};
pub use config::{AppConfig, CelebrationConfig, DetectorConfig, SamplerConfig};
pub use detector::{BlowGestureDetector, GestureEvent, GestureSource};
pub use error::{AcquireError, AcquireErrorKind, CakeError, Result, SecurityContext};
pub use layout::{layout, CandleLayoutEngine, CandlePlacement, Ellipse};
pub use machine::{Hint, InteractionState, InteractionStateMachine};
pub use playback::{PlaybackBackend, SilentPlayback};
pub use record::{FrameRecorder, RecordingSettings};
pub use render::{FrameBuffer, RenderFrame, RenderSurface};
pub use scene::{CakeScene, CakeStyle};
pub use timeline::{FrameClock, TimerQueue};
