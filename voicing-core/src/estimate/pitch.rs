//! Autocorrelation pitch detector.
//!
//! ## Algorithm
//!
//! 1. If frame RMS is below [`SILENCE_GUARD_RMS`] → unvoiced. Normalized
//!    autocorrelation of near-zero frames is dominated by rounding noise.
//! 2. Remove the frame mean. A constant offset correlates with itself at
//!    every lag; the same guard applies to what is left.
//! 3. Compute the normalized autocorrelation
//!    `r(τ) = Σ x[i]·x[i+τ] / sqrt(Σ x[i]² · Σ x[i+τ]²)`, `i ∈ [0, N-τ)`,
//!    for lags covering periods `sr/f_max ..= sr/f_min`, keeping at least a
//!    quarter frame of overlap (see [`max_searchable_lag`]).
//! 4. Take the strongest local peak. Below `voicing_confidence` → unvoiced.
//!    Otherwise select the *earliest* peak reaching
//!    `OCTAVE_TOLERANCE × strongest`, so a period multiple that happens to
//!    land closer to an integer lag does not win.
//! 5. Refine the selected lag by parabolic interpolation over its two
//!    neighbours. `sr / lag` outside `[f_min, f_max]` → unvoiced.

use super::energy::rms;
use super::{sanitize, PitchDetector};
use crate::error::{Result, VoicingError};

/// RMS below which a frame is treated as digital silence.
pub const SILENCE_GUARD_RMS: f64 = 1e-5;

/// Default lower search bound (C2).
pub const DEFAULT_F_MIN: f64 = 65.41;

/// Default upper search bound (C7).
pub const DEFAULT_F_MAX: f64 = 2093.0;

/// Default minimum normalized autocorrelation peak to accept a pitch.
pub const DEFAULT_VOICING_CONFIDENCE: f64 = 0.45;

/// Fraction of the strongest peak an earlier peak must reach to be preferred.
const OCTAVE_TOLERANCE: f64 = 0.9;

/// Denominators below this are treated as zero.
const EPSILON: f64 = 1e-12;

/// A candidate lag must leave at least `1 / MIN_OVERLAP_DIVISOR` of the frame
/// overlapping; shorter overlaps correlate noise to ±1.
const MIN_OVERLAP_DIVISOR: usize = 4;

/// Largest lag searched in a frame of `frame_len` samples.
pub fn max_searchable_lag(frame_len: usize) -> usize {
    frame_len - frame_len / MIN_OVERLAP_DIVISOR
}

/// The best period found in a frame, before the voicing decision.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PitchCandidate {
    /// Frequency in Hz after parabolic refinement.
    pub f0_hz: f64,
    /// Normalized autocorrelation at the strongest peak, in [-1, 1].
    pub strength: f64,
}

/// Deterministic autocorrelation F0 estimator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AutocorrelationPitch {
    f_min: f64,
    f_max: f64,
    voicing_confidence: f64,
}

impl Default for AutocorrelationPitch {
    fn default() -> Self {
        Self {
            f_min: DEFAULT_F_MIN,
            f_max: DEFAULT_F_MAX,
            voicing_confidence: DEFAULT_VOICING_CONFIDENCE,
        }
    }
}

impl AutocorrelationPitch {
    /// # Errors
    /// `InvalidConfiguration` unless `0 < f_min < f_max`, both finite, and
    /// `voicing_confidence` lies in `[0, 1]`.
    pub fn new(f_min: f64, f_max: f64, voicing_confidence: f64) -> Result<Self> {
        if !f_min.is_finite() || !f_max.is_finite() || f_min <= 0.0 {
            return Err(VoicingError::InvalidConfiguration(format!(
                "fMin/fMax must be finite and positive (got {f_min}/{f_max})"
            )));
        }
        if f_min >= f_max {
            return Err(VoicingError::InvalidConfiguration(format!(
                "fMin ({f_min}) must be below fMax ({f_max})"
            )));
        }
        if !(0.0..=1.0).contains(&voicing_confidence) {
            return Err(VoicingError::InvalidConfiguration(format!(
                "voicingConfidence must lie in [0, 1] (got {voicing_confidence})"
            )));
        }
        Ok(Self {
            f_min,
            f_max,
            voicing_confidence,
        })
    }

    pub fn f_min(&self) -> f64 {
        self.f_min
    }

    pub fn f_max(&self) -> f64 {
        self.f_max
    }

    pub fn voicing_confidence(&self) -> f64 {
        self.voicing_confidence
    }

    /// Inclusive lag search range for a frame of `frame_len` samples.
    ///
    /// Lags stay within `[2, max_searchable_lag(frame_len)]` so every
    /// candidate has two neighbours and a quarter frame of overlap. `None`
    /// when the range is empty.
    pub fn lag_range(&self, sample_rate: u32, frame_len: usize) -> Option<(usize, usize)> {
        if sample_rate == 0 {
            return None;
        }
        let sr = sample_rate as f64;
        let min_lag = ((sr / self.f_max).floor() as usize).max(2);
        let max_lag = ((sr / self.f_min).ceil() as usize).min(max_searchable_lag(frame_len));
        if max_lag < min_lag || max_lag + 1 >= frame_len {
            return None;
        }
        Some((min_lag, max_lag))
    }

    /// Strongest periodicity in `frame`, ignoring the voicing threshold.
    ///
    /// `None` for silent or constant frames, frames too short for the lag
    /// range, frames without any interior autocorrelation peak, and frames
    /// whose refined frequency falls outside `[f_min, f_max]`.
    pub fn candidate(&self, frame: &[f32], sample_rate: u32) -> Option<PitchCandidate> {
        if rms(frame) < SILENCE_GUARD_RMS {
            return None;
        }
        let (min_lag, max_lag) = self.lag_range(sample_rate, frame.len())?;

        let centred = remove_mean(frame);
        let ac_rms = (centred.iter().map(|v| v * v).sum::<f64>() / centred.len() as f64).sqrt();
        if ac_rms < SILENCE_GUARD_RMS {
            return None;
        }

        // acf[k] holds the autocorrelation at lag (min_lag - 1 + k).
        let first = min_lag - 1;
        let acf = normalized_autocorrelation(&centred, first, max_lag + 1);

        let at = |lag: usize| acf[lag - first];
        let peaks: Vec<usize> = (min_lag..=max_lag)
            .filter(|&lag| at(lag) > at(lag - 1) && at(lag) >= at(lag + 1))
            .collect();

        let strength = peaks
            .iter()
            .map(|&lag| at(lag))
            .fold(f64::NEG_INFINITY, f64::max);
        if !strength.is_finite() {
            return None;
        }

        let lag = peaks
            .iter()
            .copied()
            .find(|&lag| at(lag) >= OCTAVE_TOLERANCE * strength)?;

        let refined = lag as f64 + parabolic_offset(at(lag - 1), at(lag), at(lag + 1));
        let f0_hz = sanitize(sample_rate as f64 / refined);
        if f0_hz < self.f_min || f0_hz > self.f_max {
            return None;
        }
        Some(PitchCandidate { f0_hz, strength })
    }
}

impl PitchDetector for AutocorrelationPitch {
    fn detect(&self, frame: &[f32], sample_rate: u32) -> f64 {
        match self.candidate(frame, sample_rate) {
            Some(c) if c.strength > 0.0 && c.strength >= self.voicing_confidence => c.f0_hz,
            _ => 0.0,
        }
    }
}

/// Frame samples in f64 with their mean subtracted.
fn remove_mean(frame: &[f32]) -> Vec<f64> {
    let mean = frame.iter().map(|&s| f64::from(s)).sum::<f64>() / frame.len() as f64;
    frame.iter().map(|&s| f64::from(s) - mean).collect()
}

/// Normalized autocorrelation for lags `first..=last`.
///
/// Lags whose windows carry no energy get `0.0`.
fn normalized_autocorrelation(x: &[f64], first: usize, last: usize) -> Vec<f64> {
    let n = x.len();

    // energy_prefix[k] = Σ x[i]² for i < k
    let mut energy_prefix = Vec::with_capacity(n + 1);
    energy_prefix.push(0.0);
    let mut acc = 0.0;
    for v in x {
        acc += v * v;
        energy_prefix.push(acc);
    }

    (first..=last)
        .map(|lag| {
            let overlap = n - lag;
            let num: f64 = x[..overlap]
                .iter()
                .zip(&x[lag..])
                .map(|(a, b)| a * b)
                .sum();
            let head = energy_prefix[overlap];
            let tail = energy_prefix[n] - energy_prefix[lag];
            let denom = (head * tail).sqrt();
            if denom < EPSILON {
                0.0
            } else {
                let r = num / denom;
                if r.is_finite() {
                    r
                } else {
                    0.0
                }
            }
        })
        .collect()
}

/// Vertex offset of the parabola through `(-1, a)`, `(0, b)`, `(1, c)`,
/// clamped to ±0.5.
fn parabolic_offset(a: f64, b: f64, c: f64) -> f64 {
    let denom = a - 2.0 * b + c;
    if denom.abs() < EPSILON {
        return 0.0;
    }
    (0.5 * (a - c) / denom).clamp(-0.5, 0.5)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    const SR: u32 = 16_000;

    fn sine(freq: f64, amplitude: f64, len: usize, sr: u32) -> Vec<f32> {
        (0..len)
            .map(|i| {
                (amplitude * (2.0 * std::f64::consts::PI * freq * i as f64 / sr as f64).sin())
                    as f32
            })
            .collect()
    }

    fn noise(std_dev: f64, len: usize, seed: u64) -> Vec<f32> {
        let mut rng = StdRng::seed_from_u64(seed);
        // Sum of three U(-1, 1) draws has unit variance.
        (0..len)
            .map(|_| {
                let s: f64 = (0..3).map(|_| rng.gen_range(-1.0..1.0)).sum();
                (s * std_dev) as f32
            })
            .collect()
    }

    #[test]
    fn sine_tones_are_tracked_within_two_hz() {
        let detector = AutocorrelationPitch::default();
        for freq in [82.0, 110.0, 220.0, 440.0, 1000.0] {
            let frame = sine(freq, 0.3, 2048, SR);
            let f0 = detector.detect(&frame, SR);
            assert!((f0 - freq).abs() < 2.0, "freq={freq} f0={f0}");
        }
    }

    #[test]
    fn octave_multiple_does_not_win() {
        // 440 Hz at 16 kHz: 3 periods (109.09) sit closer to an integer lag
        // than one period (36.36); the fundamental must still be reported.
        let frame = sine(440.0, 0.3, 2048, SR);
        let c = AutocorrelationPitch::default()
            .candidate(&frame, SR)
            .expect("candidate");
        assert!((c.f0_hz - 440.0).abs() < 2.0, "f0={}", c.f0_hz);
        assert!(c.strength > 0.99, "strength={}", c.strength);
    }

    #[test]
    fn silence_is_unvoiced() {
        let detector = AutocorrelationPitch::default();
        assert_eq!(detector.detect(&[0.0; 2048], SR), 0.0);
        assert!(detector.candidate(&[0.0; 2048], SR).is_none());
    }

    #[test]
    fn near_silence_below_guard_is_unvoiced() {
        let frame = sine(440.0, 1e-6, 2048, SR);
        assert_eq!(AutocorrelationPitch::default().detect(&frame, SR), 0.0);
    }

    #[test]
    fn white_noise_is_unvoiced() {
        let detector = AutocorrelationPitch::default();
        for seed in 0..8 {
            let frame = noise(0.1, 2048, seed);
            let f0 = detector.detect(&frame, SR);
            assert_eq!(f0, 0.0, "seed={seed} produced f0={f0}");
        }
    }

    #[test]
    fn too_short_frame_is_unvoiced() {
        // Minimum lag at 16 kHz / 2093 Hz is 7 samples.
        let frame = sine(1000.0, 0.5, 8, SR);
        let detector = AutocorrelationPitch::default();
        assert!(detector.lag_range(SR, frame.len()).is_none());
        assert_eq!(detector.detect(&frame, SR), 0.0);
    }

    #[test]
    fn below_f_min_has_no_peak() {
        // 30 Hz period (533 samples) is outside the 65 Hz search range.
        let frame = sine(30.0, 0.5, 2048, SR);
        let f0 = AutocorrelationPitch::default().detect(&frame, SR);
        assert!(f0 == 0.0 || f0 >= DEFAULT_F_MIN, "f0={f0}");
    }

    #[test]
    fn confidence_threshold_gates_voicing() {
        let frame = sine(220.0, 0.3, 2048, SR);
        let strict = AutocorrelationPitch::new(DEFAULT_F_MIN, DEFAULT_F_MAX, 1.0).unwrap();
        let lenient = AutocorrelationPitch::new(DEFAULT_F_MIN, DEFAULT_F_MAX, 0.0).unwrap();
        assert_eq!(strict.detect(&frame, SR), 0.0);
        assert!(lenient.detect(&frame, SR) > 0.0);
    }

    #[test]
    fn detection_is_deterministic() {
        let detector = AutocorrelationPitch::default();
        let frame = sine(311.0, 0.2, 2048, SR);
        let a = detector.detect(&frame, SR);
        let b = detector.detect(&frame, SR);
        assert_eq!(a.to_bits(), b.to_bits());
    }

    #[test]
    fn invalid_ranges_are_rejected() {
        assert!(AutocorrelationPitch::new(500.0, 100.0, 0.45).is_err());
        assert!(AutocorrelationPitch::new(100.0, 100.0, 0.45).is_err());
        assert!(AutocorrelationPitch::new(0.0, 100.0, 0.45).is_err());
        assert!(AutocorrelationPitch::new(f64::NAN, 100.0, 0.45).is_err());
        assert!(AutocorrelationPitch::new(65.0, 2000.0, 1.5).is_err());
    }

    #[test]
    fn constant_offset_is_unvoiced() {
        let detector = AutocorrelationPitch::default();
        assert_eq!(detector.detect(&[0.1; 2048], SR), 0.0);
        assert!(detector.candidate(&[-0.3; 2048], SR).is_none());
    }

    #[test]
    fn noise_on_a_dc_offset_is_unvoiced() {
        let detector = AutocorrelationPitch::default();
        for seed in 0..8 {
            let frame: Vec<f32> = noise(0.03, 2048, seed).iter().map(|s| s + 0.1).collect();
            let f0 = detector.detect(&frame, SR);
            assert_eq!(f0, 0.0, "seed={seed} produced f0={f0}");
        }
    }

    #[test]
    fn tone_on_a_dc_offset_keeps_its_pitch() {
        let frame: Vec<f32> = sine(220.0, 0.2, 2048, SR).iter().map(|s| s + 0.25).collect();
        let f0 = AutocorrelationPitch::default().detect(&frame, SR);
        assert!((f0 - 220.0).abs() < 2.0, "f0={f0}");
    }

    #[test]
    fn tone_above_f_max_is_unvoiced() {
        // Period 7.27 samples sits on the shortest searchable lag (7), and
        // the refined frequency lands above 2093 Hz.
        let frame = sine(2200.0, 0.3, 2048, SR);
        assert_eq!(AutocorrelationPitch::default().detect(&frame, SR), 0.0);
    }

    #[test]
    fn reported_pitch_stays_inside_search_range() {
        let detector = AutocorrelationPitch::new(100.0, 1000.0, 0.45).unwrap();
        for freq in [90.0, 101.0, 250.0, 999.0, 1010.0, 1500.0] {
            let f0 = detector.detect(&sine(freq, 0.3, 2048, SR), SR);
            assert!(f0 == 0.0 || (100.0..=1000.0).contains(&f0), "freq={freq} f0={f0}");
        }
    }

    #[test]
    fn long_periods_at_high_sample_rates_are_searched() {
        let detector = AutocorrelationPitch::default();
        // 70 Hz at 96 kHz is a 1371-sample period: past half of a 2048 frame.
        let f0 = detector.detect(&sine(70.0, 0.3, 2048, 96_000), 96_000);
        assert!((f0 - 70.0).abs() < 2.0, "f0={f0}");
        // 80 Hz at 44.1 kHz in a 1024-sample frame: period 551.
        let f0 = detector.detect(&sine(80.0, 0.3, 1024, 44_100), 44_100);
        assert!((f0 - 80.0).abs() < 2.0, "f0={f0}");
    }

    #[test]
    fn search_keeps_a_quarter_frame_of_overlap() {
        assert_eq!(max_searchable_lag(2048), 1536);
        let (_, max_lag) = AutocorrelationPitch::default()
            .lag_range(96_000, 2048)
            .expect("lag range");
        assert_eq!(max_lag, (96_000.0 / DEFAULT_F_MIN).ceil() as usize);
        let (_, capped) = AutocorrelationPitch::default()
            .lag_range(192_000, 2048)
            .expect("lag range");
        assert_eq!(capped, 1536);
    }

    #[test]
    fn parabolic_offset_finds_vertex() {
        // y = -(x - 0.25)^2 sampled at -1, 0, 1
        let f = |x: f64| -(x - 0.25) * (x - 0.25);
        let off = parabolic_offset(f(-1.0), f(0.0), f(1.0));
        assert!((off - 0.25).abs() < 1e-12, "off={off}");
        assert_eq!(parabolic_offset(1.0, 1.0, 1.0), 0.0);
    }
}
