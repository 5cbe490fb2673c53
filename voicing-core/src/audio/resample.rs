//! Whole-signal sample-rate conversion using a rubato `FastFixedIn` resampler.
//!
//! ## Design
//!
//! Analysis normally runs at the file's native rate. Hosts may ask for a
//! fixed analysis rate instead (e.g. to make hop durations comparable across
//! recordings); `RateConverter` does that conversion before framing.
//!
//! When source rate == target rate, `RateConverter` is a passthrough and no
//! rubato session is created at all.
//!
//! ## Usage
//!
//! ```ignore
//! let signal = resample(&signal, 16_000)?; // AudioSignal at 16 kHz
//! ```

use rubato::{FastFixedIn, PolynomialDegree, Resampler};
use tracing::debug;

use super::AudioSignal;
use crate::error::{Result, VoicingError};

/// Input frame count per rubato call.
const CHUNK_SIZE: usize = 1024;

/// Converts f32 mono audio from one fixed sample rate to another.
pub struct RateConverter {
    /// `None` when source rate == target rate (passthrough mode).
    resampler: Option<FastFixedIn<f32>>,
    /// Output/input rate ratio.
    ratio: f64,
    /// Pre-allocated output buffer: `[1][output_frames_max]`.
    output_buf: Vec<Vec<f32>>,
}

impl RateConverter {
    /// Create a new converter.
    ///
    /// # Errors
    /// Returns `VoicingError::InvalidSignal` for a zero rate and
    /// `VoicingError::Resample` if rubato fails to initialise.
    pub fn new(source_rate: u32, target_rate: u32) -> Result<Self> {
        if source_rate == 0 || target_rate == 0 {
            return Err(VoicingError::InvalidSignal(format!(
                "sample rates must be positive (source={source_rate}, target={target_rate})"
            )));
        }

        let ratio = target_rate as f64 / source_rate as f64;

        if source_rate == target_rate {
            return Ok(Self {
                resampler: None,
                ratio,
                output_buf: Vec::new(),
            });
        }

        let resampler = FastFixedIn::<f32>::new(
            ratio,
            1.0, // fixed ratio
            PolynomialDegree::Cubic,
            CHUNK_SIZE,
            1, // mono
        )
        .map_err(|e| VoicingError::Resample(format!("init: {e}")))?;

        let max_out = resampler.output_frames_max();
        let output_buf = vec![vec![0f32; max_out]; 1];

        debug!(source_rate, target_rate, max_out, "resampler created");

        Ok(Self {
            resampler: Some(resampler),
            ratio,
            output_buf,
        })
    }

    /// Convert a complete buffer.
    ///
    /// The tail is zero-padded up to a full chunk, the resampler's output
    /// delay is dropped from the front, and the result trimmed to
    /// `round(len * ratio)` samples so sample `i` of the output lines up with
    /// time `i / target_rate` of the input.
    pub fn process_all(&mut self, samples: &[f32]) -> Result<Vec<f32>> {
        let Some(ref mut resampler) = self.resampler else {
            return Ok(samples.to_vec());
        };

        let expected = (samples.len() as f64 * self.ratio).round() as usize;
        let delay = resampler.output_delay();
        let mut result = Vec::with_capacity(delay + expected + CHUNK_SIZE);
        let mut padded = [0f32; CHUNK_SIZE];

        let mut blocks = samples.chunks(CHUNK_SIZE);
        while result.len() < delay + expected {
            let input: &[f32] = match blocks.next() {
                Some(block) if block.len() == CHUNK_SIZE => block,
                Some(block) => {
                    padded[..block.len()].copy_from_slice(block);
                    padded[block.len()..].fill(0.0);
                    &padded
                }
                // Flush the delay line with silence.
                None => {
                    padded.fill(0.0);
                    &padded
                }
            };

            let (_consumed, produced) = resampler
                .process_into_buffer(&[input], &mut self.output_buf, None)
                .map_err(|e| VoicingError::Resample(e.to_string()))?;
            result.extend_from_slice(&self.output_buf[0][..produced]);
        }

        result.drain(..delay.min(result.len()));
        result.resize(expected, 0.0);
        debug!(input = samples.len(), output = result.len(), delay, "resampled");
        Ok(result)
    }
}

/// Convert `signal` to `target_rate`, returning a new signal.
pub fn resample(signal: &AudioSignal, target_rate: u32) -> Result<AudioSignal> {
    let mut rc = RateConverter::new(signal.sample_rate, target_rate)?;
    let samples = rc.process_all(&signal.samples)?;
    Ok(AudioSignal::new(samples, target_rate))
}
