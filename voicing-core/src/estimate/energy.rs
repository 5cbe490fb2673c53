//! Frame energy as plain RMS (no window function).

use super::{sanitize, EnergyValue};
use crate::framing::FramedSignal;

/// Compute the root-mean-square of a sample slice.
///
/// Accumulates in f64. Empty input and non-finite sums yield `0.0`.
pub fn rms(samples: &[f32]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_sq: f64 = samples.iter().map(|&s| f64::from(s) * f64::from(s)).sum();
    sanitize((sum_sq / samples.len() as f64).sqrt())
}

/// RMS of every frame, in frame order.
pub fn frame_energies(framed: &FramedSignal) -> Vec<EnergyValue> {
    framed
        .frames()
        .map(|frame| EnergyValue {
            frame_index: frame.index,
            rms: rms(frame.samples),
        })
        .collect()
}
