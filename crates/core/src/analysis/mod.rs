use std::{f32::consts::PI, fmt, sync::Arc};

use realfft::{num_complex::Complex32, RealFftPlanner, RealToComplex};
use serde::{Deserialize, Serialize};

use crate::{config::SamplerConfig, CakeError, Result};

/// Upper bound of the byte-scaled spectrum.
pub const MAX_ENERGY: f32 = 255.0;

/// Scalar loudness proxy for a single tick, in `[0, 255]`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct EnergySample(f32);

impl EnergySample {
    /// Returns `None` for values that are not finite or outside `[0, 255]`.
    pub fn new(value: f32) -> Option<Self> {
        if value.is_finite() && (0.0..=MAX_ENERGY).contains(&value) {
            Some(Self(value))
        } else {
            None
        }
    }

    pub fn value(self) -> f32 {
        self.0
    }
}

/// Frequency analyser modelled on the browser `AnalyserNode`: windowed real
/// FFT, magnitudes smoothed across calls, decibels mapped onto a byte range,
/// then averaged into one [`EnergySample`].
pub struct SpectrumAnalyser {
    fft_size: usize,
    smoothing: f32,
    min_decibels: f32,
    max_decibels: f32,
    plan: Arc<dyn RealToComplex<f32>>,
    input: Vec<f32>,
    spectrum: Vec<Complex32>,
    scratch: Vec<Complex32>,
    smoothed: Vec<f32>,
    bytes: Vec<u8>,
}

impl SpectrumAnalyser {
    pub fn new(config: &SamplerConfig) -> Result<Self> {
        config.validate()?;

        let fft_size = config.fft_size;
        let plan = RealFftPlanner::<f32>::new().plan_fft_forward(fft_size);
        let scratch = plan.make_scratch_vec();
        let spectrum = plan.make_output_vec();
        let input = plan.make_input_vec();
        let bins = fft_size / 2;

        Ok(Self {
            fft_size,
            smoothing: config.smoothing,
            min_decibels: config.min_decibels,
            max_decibels: config.max_decibels,
            plan,
            input,
            spectrum,
            scratch,
            smoothed: vec![0.0; bins],
            bytes: vec![0; bins],
        })
    }

    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    /// Number of frequency bins averaged into each sample.
    pub fn bin_count(&self) -> usize {
        self.fft_size / 2
    }

    /// Forgets the smoothing history.
    pub fn reset(&mut self) {
        self.smoothed.iter_mut().for_each(|value| *value = 0.0);
        self.bytes.iter_mut().for_each(|value| *value = 0);
    }

    /// Byte-scaled spectrum produced by the most recent [`Self::analyse`].
    pub fn byte_frequency_data(&self) -> &[u8] {
        &self.bytes
    }

    /// Analyses the most recent `fft_size` samples of `samples`. Shorter
    /// blocks are zero padded at the front.
    pub fn analyse(&mut self, samples: &[f32]) -> Result<EnergySample> {
        if samples.is_empty() {
            return Err(CakeError::InvalidInput(
                "analysis requires at least one sample",
            ));
        }
        if samples.iter().any(|sample| !sample.is_finite()) {
            return Err(CakeError::InvalidInput("analysis input must be finite"));
        }

        let len = self.fft_size;
        let tail = &samples[samples.len().saturating_sub(len)..];
        let pad = len - tail.len();

        self.input[..pad].iter_mut().for_each(|value| *value = 0.0);
        for (offset, value) in tail.iter().enumerate() {
            let index = pad + offset;
            self.input[index] = *value * hann_value(index, len);
        }

        self.plan
            .process_with_scratch(&mut self.input, &mut self.spectrum, &mut self.scratch)?;

        let scale = 1.0 / len as f32;
        let range = self.max_decibels - self.min_decibels;
        let mut total = 0.0_f32;

        for (bin, (smoothed, byte)) in self
            .smoothed
            .iter_mut()
            .zip(self.bytes.iter_mut())
            .enumerate()
        {
            let magnitude = self.spectrum[bin].norm() * scale;
            *smoothed = self.smoothing * *smoothed + (1.0 - self.smoothing) * magnitude;

            let scaled = if *smoothed <= f32::MIN_POSITIVE {
                0.0
            } else {
                let decibels = 20.0 * smoothed.log10();
                (MAX_ENERGY * (decibels - self.min_decibels) / range).clamp(0.0, MAX_ENERGY)
            };
            *byte = scaled as u8;
            total += f32::from(*byte);
        }

        let average = total / self.bytes.len() as f32;
        EnergySample::new(average).ok_or(CakeError::InvalidInput(
            "analysis produced an out of range energy value",
        ))
    }
}

impl fmt::Debug for SpectrumAnalyser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpectrumAnalyser")
            .field("fft_size", &self.fft_size)
            .field("smoothing", &self.smoothing)
            .field("min_decibels", &self.min_decibels)
            .field("max_decibels", &self.max_decibels)
            .finish()
    }
}

fn hann_value(index: usize, len: usize) -> f32 {
    if len <= 1 {
        return 1.0;
    }

    0.5 - 0.5 * ((2.0 * PI * index as f32) / (len as f32 - 1.0)).cos()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyser() -> SpectrumAnalyser {
        SpectrumAnalyser::new(&SamplerConfig::default()).unwrap()
    }

    fn noise(len: usize, amplitude: f32) -> Vec<f32> {
        // xorshift keeps the test free of rng plumbing
        let mut state: u32 = 0x1234_ABCD;
        (0..len)
            .map(|_| {
                state ^= state << 13;
                state ^= state >> 17;
                state ^= state << 5;
                (state as f32 / u32::MAX as f32 * 2.0 - 1.0) * amplitude
            })
            .collect()
    }

    #[test]
    fn silence_has_no_energy() {
        let mut analyser = analyser();
        let energy = analyser.analyse(&vec![0.0; 256]).unwrap();

        assert_eq!(energy.value(), 0.0);
        assert!(analyser.byte_frequency_data().iter().all(|byte| *byte == 0));
    }

    #[test]
    fn loud_noise_crosses_the_default_threshold() {
        let mut analyser = analyser();
        let block = noise(256, 0.8);

        let mut energy = analyser.analyse(&block).unwrap();
        for _ in 0..4 {
            energy = analyser.analyse(&block).unwrap();
        }

        assert!(energy.value() > 60.0, "energy was {}", energy.value());
        assert_eq!(analyser.byte_frequency_data().len(), 128);
    }

    #[test]
    fn smoothing_decays_after_sound_stops() {
        let mut analyser = analyser();
        let block = noise(256, 0.8);
        for _ in 0..5 {
            analyser.analyse(&block).unwrap();
        }

        let loud = analyser.analyse(&block).unwrap();
        let first_quiet = analyser.analyse(&vec![0.0; 256]).unwrap();
        assert!(first_quiet < loud);
        assert!(first_quiet.value() > 0.0);
    }

    #[test]
    fn rejects_empty_and_non_finite_blocks() {
        let mut analyser = analyser();

        assert!(analyser.analyse(&[]).is_err());
        assert!(analyser.analyse(&[0.1, f32::NAN]).is_err());
    }

    #[test]
    fn energy_sample_rejects_out_of_range_values() {
        assert!(EnergySample::new(-1.0).is_none());
        assert!(EnergySample::new(255.5).is_none());
        assert!(EnergySample::new(f32::INFINITY).is_none());
        assert_eq!(EnergySample::new(70.0).map(EnergySample::value), Some(70.0));
    }
}
