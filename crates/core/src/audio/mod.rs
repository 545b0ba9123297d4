//! Microphone ownership and per-tick energy sampling.

use std::future::Future;

use tracing::{info, trace, warn};

use crate::{
    analysis::{EnergySample, SpectrumAnalyser},
    config::SamplerConfig,
    AcquireError, AcquireErrorKind, Result, SecurityContext,
};

/// A live capture stream handed out by a [`Microphone`].
pub trait AudioStream {
    fn sample_rate(&self) -> u32;
    fn channels(&self) -> u16;
    /// Copies the most recent mono samples into `buf` and returns how many
    /// were written. Zero means nothing new arrived since the last read.
    fn read_latest(&mut self, buf: &mut [f32]) -> usize;
    /// Stops capture. Called exactly once by the sampler.
    fn stop(&mut self);
}

/// Platform capability that grants microphone streams.
pub trait Microphone {
    type Stream: AudioStream + 'static;

    fn security_context(&self) -> SecurityContext;

    /// Asks the platform for a stream, resolving once the user grants or
    /// denies permission.
    fn request_stream(&mut self) -> impl Future<Output = std::result::Result<Self::Stream, AcquireError>>;
}

/// Owns the microphone stream and turns it into one [`EnergySample`] per
/// tick.
pub struct SignalSampler {
    analyser: SpectrumAnalyser,
    stream: Option<Box<dyn AudioStream>>,
    window: Vec<f32>,
}

impl SignalSampler {
    pub fn new(config: &SamplerConfig) -> Result<Self> {
        let analyser = SpectrumAnalyser::new(config)?;
        let window = vec![0.0; analyser.fft_size()];
        Ok(Self {
            analyser,
            stream: None,
            window,
        })
    }

    pub fn is_live(&self) -> bool {
        self.stream.is_some()
    }

    pub fn analyser(&self) -> &SpectrumAnalyser {
        &self.analyser
    }

    /// Requests the microphone from `microphone`. Any stream held from an
    /// earlier call is released first. A stream that is granted but unusable
    /// is released before the error is returned.
    pub async fn acquire<M: Microphone>(&mut self, microphone: &mut M) -> Result<()> {
        self.release();

        let context = microphone.security_context();
        if !context.secure {
            return Err(AcquireError::new(
                AcquireErrorKind::InsecureContext,
                "microphone access requires HTTPS or localhost",
                context,
            )
            .into());
        }

        let mut stream = microphone.request_stream().await?;
        if stream.sample_rate() == 0 || stream.channels() == 0 {
            stream.stop();
            warn!("microphone stream granted but unusable");
            return Err(AcquireError::new(
                AcquireErrorKind::DeviceAcquisitionFailure,
                format!(
                    "stream reported {} Hz with {} channels",
                    stream.sample_rate(),
                    stream.channels()
                ),
                context,
            )
            .into());
        }

        info!(
            sample_rate = stream.sample_rate(),
            channels = stream.channels(),
            "microphone acquired"
        );
        self.analyser.reset();
        self.stream = Some(Box::new(stream));
        Ok(())
    }

    /// Produces this tick's sample, or `None` when there is no stream, no
    /// fresh audio, or the audio could not be analysed.
    pub fn sample(&mut self) -> Option<EnergySample> {
        let stream = self.stream.as_mut()?;
        let read = stream.read_latest(&mut self.window);
        if read == 0 {
            return None;
        }

        let read = read.min(self.window.len());
        match self.analyser.analyse(&self.window[..read]) {
            Ok(sample) => Some(sample),
            Err(err) => {
                trace!(error = %err, "dropping unusable audio block");
                None
            }
        }
    }

    /// Stops capture. Safe to call any number of times.
    pub fn release(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            stream.stop();
            info!("microphone released");
        }
    }
}

impl Drop for SignalSampler {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for SignalSampler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignalSampler")
            .field("analyser", &self.analyser)
            .field("live", &self.is_live())
            .finish()
    }
}
