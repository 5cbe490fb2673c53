//! Three-way frame decision: voiced / unvoiced / silence.
//!
//! Each frame is judged on its own. Adjacent frames may flip label on every
//! hop; any smoothing belongs in a separate pass over the finished report.

use serde::{Deserialize, Serialize};

/// Label of one analysis frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FrameLabel {
    /// A reliable fundamental frequency was found.
    Voiced,
    /// No pitch, but energy above the threshold (fricatives, noise).
    Unvoiced,
    /// No pitch and energy at or below the threshold.
    Silence,
}

impl FrameLabel {
    pub const ALL: [FrameLabel; 3] = [FrameLabel::Voiced, FrameLabel::Unvoiced, FrameLabel::Silence];

    pub fn as_str(self) -> &'static str {
        match self {
            FrameLabel::Voiced => "VOICED",
            FrameLabel::Unvoiced => "UNVOICED",
            FrameLabel::Silence => "SILENCE",
        }
    }
}

impl std::fmt::Display for FrameLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Full-precision result for one frame, before report rounding.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameClassification {
    pub frame_index: usize,
    pub time_seconds: f64,
    pub label: FrameLabel,
    pub f0_hz: f64,
    pub energy: f64,
}

/// Classify a frame from its F0 and RMS energy.
///
/// - `f0 > 0` → `Voiced`
/// - `f0 == 0 && energy > energy_threshold` → `Unvoiced`
/// - otherwise → `Silence`
pub fn classify(f0_hz: f64, energy: f64, energy_threshold: f64) -> FrameLabel {
    if f0_hz > 0.0 {
        FrameLabel::Voiced
    } else if energy > energy_threshold {
        FrameLabel::Unvoiced
    } else {
        FrameLabel::Silence
    }
}
