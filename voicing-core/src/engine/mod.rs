//! `Analyzer`: the single blocking entry point of the crate.
//!
//! ## Stages
//!
//! ```text
//! AudioSignal ─► FrameSegmenter::segment ─┬─► frame_energies ──┐
//!                                         └─► PitchDetector ───┴─► ReportAssembler ─► AnalysisReport
//! ```
//!
//! ## Threading
//!
//! `Analyzer` holds only read-only configuration and is `Send + Sync`. Every
//! call works on its own buffers, so one instance can serve many threads.
//! Hosts should call it off any async executor (e.g. `spawn_blocking`) and
//! apply their own timeouts; there is no cancellation hook.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, info_span, warn};

use crate::{
    audio::{self, AudioSignal},
    error::{Result, VoicingError},
    estimate::{
        frame_energies,
        pitch::{max_searchable_lag, DEFAULT_F_MAX, DEFAULT_F_MIN, DEFAULT_VOICING_CONFIDENCE},
        AutocorrelationPitch, PitchDetector,
    },
    framing::FrameSegmenter,
    report::{AnalysisReport, ReportAssembler},
};

/// Configuration for `Analyzer`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(default)]
pub struct AnalysisConfig {
    /// RMS boundary between SILENCE and UNVOICED. Default: 0.02.
    pub energy_threshold: f64,
    /// Frame length in samples. Default: 2048.
    pub frame_length: usize,
    /// Hop length in samples, `0 < hop ≤ frame`. Default: 512.
    pub hop_length: usize,
    /// Lower pitch search bound in Hz. Default: 65.41 (C2).
    pub f_min: f64,
    /// Upper pitch search bound in Hz. Default: 2093.0 (C7).
    pub f_max: f64,
    /// Minimum normalized autocorrelation peak to accept a pitch. Default: 0.45.
    pub voicing_confidence: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            energy_threshold: 0.02,
            frame_length: 2048,
            hop_length: 512,
            f_min: DEFAULT_F_MIN,
            f_max: DEFAULT_F_MAX,
            voicing_confidence: DEFAULT_VOICING_CONFIDENCE,
        }
    }
}

impl AnalysisConfig {
    /// Check every field; the first violation is returned.
    ///
    /// # Errors
    /// `VoicingError::InvalidConfiguration` naming the offending field.
    pub fn validate(&self) -> Result<()> {
        if !self.energy_threshold.is_finite() || self.energy_threshold < 0.0 {
            return Err(VoicingError::InvalidConfiguration(format!(
                "energyThreshold must be a finite value ≥ 0 (got {})",
                self.energy_threshold
            )));
        }
        FrameSegmenter::new(self.frame_length, self.hop_length)?;
        AutocorrelationPitch::new(self.f_min, self.f_max, self.voicing_confidence)?;
        Ok(())
    }
}

/// Frame classifier over complete signals.
#[derive(Clone)]
pub struct Analyzer {
    config: AnalysisConfig,
    segmenter: FrameSegmenter,
    pitch: Arc<dyn PitchDetector>,
}

impl std::fmt::Debug for Analyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Analyzer")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Analyzer {
    /// Validate `config` and build an analyzer using `AutocorrelationPitch`.
    ///
    /// # Errors
    /// `VoicingError::InvalidConfiguration` if any field is out of range.
    pub fn new(config: AnalysisConfig) -> Result<Self> {
        let pitch = AutocorrelationPitch::new(config.f_min, config.f_max, config.voicing_confidence)?;
        Self::with_pitch_detector(config, pitch)
    }

    /// Build an analyzer around a custom pitch detector.
    ///
    /// `f_min`/`f_max`/`voicing_confidence` are still validated but only the
    /// default detector reads them.
    pub fn with_pitch_detector<D: PitchDetector + 'static>(
        config: AnalysisConfig,
        pitch: D,
    ) -> Result<Self> {
        config.validate()?;
        let segmenter = FrameSegmenter::new(config.frame_length, config.hop_length)?;
        Ok(Self {
            config,
            segmenter,
            pitch: Arc::new(pitch),
        })
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Number of segments a signal of `len` samples will produce.
    pub fn expected_segments(&self, len: usize) -> usize {
        self.segmenter.frame_count(len)
    }

    /// Classify every frame of `signal`.
    ///
    /// `source` is a file name or path; only its last component is reported.
    /// An empty signal yields an empty report.
    ///
    /// # Errors
    /// `VoicingError::InvalidSignal` if the sample rate is zero.
    pub fn analyze(&self, signal: &AudioSignal, source: &str) -> Result<AnalysisReport> {
        if signal.sample_rate == 0 {
            return Err(VoicingError::InvalidSignal(
                "sample rate must be positive".into(),
            ));
        }

        let span = info_span!(
            "analyze",
            source,
            samples = signal.len(),
            sample_rate = signal.sample_rate,
            duration_secs = signal.duration_secs()
        );
        let _guard = span.enter();
        let started = Instant::now();

        let lowest_hz = signal.sample_rate as f64 / max_searchable_lag(self.config.frame_length) as f64;
        if lowest_hz > self.config.f_min {
            warn!(
                lowest_hz,
                f_min = self.config.f_min,
                frame_length = self.config.frame_length,
                "frame too short to resolve the lowest pitches at this sample rate"
            );
        }

        let framed = self.segmenter.segment(&signal.samples);

        let t = Instant::now();
        let energies = frame_energies(&framed);
        debug!(frames = energies.len(), elapsed_us = t.elapsed().as_micros() as u64, "energy done");

        let t = Instant::now();
        let pitches = self.pitch.estimate_all(&framed, signal.sample_rate);
        debug!(frames = pitches.len(), elapsed_us = t.elapsed().as_micros() as u64, "pitch done");

        let assembler = ReportAssembler::new(
            self.config.hop_length,
            signal.sample_rate,
            self.config.energy_threshold,
        );
        let report = assembler.assemble(source, &energies, &pitches);

        let counts = report.counts();
        info!(
            segments = report.total_segments(),
            voiced = counts.voiced,
            unvoiced = counts.unvoiced,
            silence = counts.silence,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "analysis complete"
        );

        Ok(report)
    }

    /// Decode `path` and analyze it under its own file name.
    ///
    /// # Errors
    /// Decoder errors (`UnsupportedFormat`, `FileNotFound`, `Decode`, `Io`)
    /// plus everything [`analyze`](Self::analyze) returns.
    pub fn analyze_file(&self, path: &Path) -> Result<AnalysisReport> {
        let signal = audio::decode_file(path)?;
        self.analyze(&signal, &path.to_string_lossy())
    }
}

/// One-shot convenience: validate `config`, then analyze `signal`.
pub fn analyze(signal: &AudioSignal, config: &AnalysisConfig, source: &str) -> Result<AnalysisReport> {
    Analyzer::new(*config)?.analyze(signal, source)
}
