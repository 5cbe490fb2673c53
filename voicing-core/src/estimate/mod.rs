//! Per-frame feature estimators.
//!
//! Energy and pitch are computed independently over the same
//! [`FramedSignal`](crate::framing::FramedSignal), producing index-aligned
//! sequences. The `PitchDetector` trait is the extensibility point: swap in
//! `AutocorrelationPitch` (default) or any other detector without touching
//! the engine.

pub mod energy;
pub mod pitch;

pub use energy::{frame_energies, rms};
pub use pitch::{AutocorrelationPitch, PitchCandidate};

use crate::framing::FramedSignal;

/// RMS energy of one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnergyValue {
    pub frame_index: usize,
    /// Always finite and ≥ 0.
    pub rms: f64,
}

/// Fundamental frequency of one frame. `f0_hz == 0.0` means unvoiced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PitchEstimate {
    pub frame_index: usize,
    pub f0_hz: f64,
}

impl PitchEstimate {
    pub fn is_voiced(&self) -> bool {
        self.f0_hz > 0.0
    }
}

/// Trait for all pitch detectors.
///
/// Implementations must be pure: the same frame and sample rate always give
/// the same result, with no memory between frames.
pub trait PitchDetector: Send + Sync {
    /// Estimate F0 of one frame in Hz, or `0.0` when no reliable pitch exists.
    ///
    /// Must never return NaN, infinity or a negative value.
    fn detect(&self, frame: &[f32], sample_rate: u32) -> f64;

    /// Run [`detect`](Self::detect) over every frame of `framed`.
    fn estimate_all(&self, framed: &FramedSignal, sample_rate: u32) -> Vec<PitchEstimate> {
        framed
            .frames()
            .map(|frame| PitchEstimate {
                frame_index: frame.index,
                f0_hz: sanitize(self.detect(frame.samples, sample_rate)),
            })
            .collect()
    }
}

/// Collapse NaN, infinities and negatives to zero.
#[inline]
pub(crate) fn sanitize(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}
