//! # voicing-core
//!
//! Frame-level voiced / unvoiced / silence classification of complete
//! recordings.
//!
//! ## Architecture
//!
//! ```text
//! AudioSignal → FrameSegmenter (reflect-padded, centred frames)
//!                    │
//!          ┌─────────┴─────────┐
//!     RMS energy        autocorrelation F0
//!          └─────────┬─────────┘
//!               classify(f0, energy)
//!                    │
//!          ReportAssembler → AnalysisReport (JSON contract)
//! ```
//!
//! Analysis is synchronous, deterministic and free of shared state.

#![forbid(unsafe_code)]
#![warn(clippy::all)]

pub mod audio;
pub mod classify;
pub mod engine;
pub mod error;
pub mod estimate;
pub mod framing;
pub mod report;

// Convenience re-exports for downstream crates
pub use audio::AudioSignal;
pub use classify::{FrameClassification, FrameLabel};
pub use engine::{analyze, AnalysisConfig, Analyzer};
pub use error::VoicingError;
pub use estimate::{AutocorrelationPitch, EnergyValue, PitchDetector, PitchEstimate};
pub use report::{AnalysisReport, LabelCounts, Segment};
