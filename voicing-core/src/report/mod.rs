//! Analysis report: the single externally visible result of an analysis.
//!
//! ## Wire shape
//!
//! ```json
//! {
//!   "filename": "take_01.wav",
//!   "total_segments": 157,
//!   "segments": [
//!     { "time": 0.0, "type": "SILENCE", "f0": 0.0, "energy": 0.0 }
//!   ]
//! }
//! ```
//!
//! `time` is rounded to 3 decimals, `f0` to 2 and `energy` to 4.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::classify::{classify, FrameClassification, FrameLabel};
use crate::estimate::{EnergyValue, PitchEstimate};

/// One row of the report.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// Frame centre in seconds.
    pub time: f64,
    #[serde(rename = "type")]
    pub label: FrameLabel,
    /// Fundamental frequency in Hz, `0.0` when unvoiced.
    pub f0: f64,
    /// Frame RMS.
    pub energy: f64,
}

/// Immutable result of one analysis call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    filename: String,
    total_segments: usize,
    segments: Vec<Segment>,
}

impl AnalysisReport {
    /// Display name of the analysed source (no directory components).
    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn total_segments(&self) -> usize {
        self.total_segments
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Number of segments per label.
    pub fn counts(&self) -> LabelCounts {
        let mut counts = LabelCounts::default();
        for seg in &self.segments {
            counts.add(seg.label);
        }
        counts
    }
}

/// Aggregate label counts for one report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelCounts {
    pub voiced: usize,
    pub unvoiced: usize,
    pub silence: usize,
}

impl LabelCounts {
    fn add(&mut self, label: FrameLabel) {
        match label {
            FrameLabel::Voiced => self.voiced += 1,
            FrameLabel::Unvoiced => self.unvoiced += 1,
            FrameLabel::Silence => self.silence += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.voiced + self.unvoiced + self.silence
    }
}

/// Strip directory components, accepting both `/` and `\` separators.
pub fn display_name(source: &str) -> &str {
    source.rsplit(&['/', '\\'][..]).next().unwrap_or(source)
}

/// Round half away from zero to `places` decimals.
pub fn round_to(value: f64, places: i32) -> f64 {
    let scale = 10f64.powi(places);
    let rounded = (value * scale).round() / scale;
    if rounded.is_finite() {
        rounded
    } else {
        0.0
    }
}

/// Joins index-aligned energy and pitch sequences into a report.
#[derive(Debug, Clone, Copy)]
pub struct ReportAssembler {
    hop_length: usize,
    sample_rate: u32,
    energy_threshold: f64,
}

impl ReportAssembler {
    pub fn new(hop_length: usize, sample_rate: u32, energy_threshold: f64) -> Self {
        Self {
            hop_length,
            sample_rate,
            energy_threshold,
        }
    }

    /// Centre time of frame `index`: `index * hop / sample_rate`.
    pub fn frame_time(&self, index: usize) -> f64 {
        (index * self.hop_length) as f64 / self.sample_rate as f64
    }

    /// Full-precision classification of each frame.
    ///
    /// Sequences of unequal length are truncated to the shorter one.
    pub fn classify_frames(
        &self,
        energies: &[EnergyValue],
        pitches: &[PitchEstimate],
    ) -> Vec<FrameClassification> {
        if energies.len() != pitches.len() {
            warn!(
                energies = energies.len(),
                pitches = pitches.len(),
                "energy/pitch length mismatch, truncating to the shorter sequence"
            );
        }

        energies
            .iter()
            .zip(pitches)
            .enumerate()
            .map(|(index, (energy, pitch))| FrameClassification {
                frame_index: index,
                time_seconds: self.frame_time(index),
                label: classify(pitch.f0_hz, energy.rms, self.energy_threshold),
                f0_hz: pitch.f0_hz,
                energy: energy.rms,
            })
            .collect()
    }

    /// Build the report for `source`, which may be a full path.
    pub fn assemble(
        &self,
        source: &str,
        energies: &[EnergyValue],
        pitches: &[PitchEstimate],
    ) -> AnalysisReport {
        let segments: Vec<Segment> = self
            .classify_frames(energies, pitches)
            .into_iter()
            .map(|c| Segment {
                time: round_to(c.time_seconds, 3),
                label: c.label,
                f0: round_to(c.f0_hz, 2),
                energy: round_to(c.energy, 4),
            })
            .collect();

        AnalysisReport {
            filename: display_name(source).to_string(),
            total_segments: segments.len(),
            segments,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn energies(values: &[f64]) -> Vec<EnergyValue> {
        values
            .iter()
            .enumerate()
            .map(|(frame_index, &rms)| EnergyValue { frame_index, rms })
            .collect()
    }

    fn pitches(values: &[f64]) -> Vec<PitchEstimate> {
        values
            .iter()
            .enumerate()
            .map(|(frame_index, &f0_hz)| PitchEstimate { frame_index, f0_hz })
            .collect()
    }

    #[test]
    fn display_name_strips_both_separators() {
        assert_eq!(display_name("/tmp/uploads/take.wav"), "take.wav");
        assert_eq!(display_name(r"C:\Users\me\take.wav"), "take.wav");
        assert_eq!(display_name("take.wav"), "take.wav");
        assert_eq!(display_name("mixed/dir\\take.wav"), "take.wav");
    }

    #[test]
    fn rounding_places() {
        assert_eq!(round_to(0.123_456, 3), 0.123);
        assert_eq!(round_to(440.004_9, 2), 440.0);
        assert_eq!(round_to(0.012_36, 4), 0.0124);
        assert_eq!(round_to(f64::NAN, 2), 0.0);
    }

    #[test]
    fn assembles_labels_and_rounding() {
        let asm = ReportAssembler::new(512, 16_000, 0.02);
        let report = asm.assemble(
            "/data/clip.wav",
            &energies(&[0.0, 0.2123456, 0.05, 0.01]),
            &pitches(&[0.0, 440.0123, 0.0, 0.0]),
        );

        assert_eq!(report.filename(), "clip.wav");
        assert_eq!(report.total_segments(), 4);
        let labels: Vec<FrameLabel> = report.segments().iter().map(|s| s.label).collect();
        assert_eq!(
            labels,
            vec![
                FrameLabel::Silence,
                FrameLabel::Voiced,
                FrameLabel::Unvoiced,
                FrameLabel::Silence
            ]
        );
        let voiced = report.segments()[1];
        assert_eq!(voiced.time, 0.032);
        assert_eq!(voiced.f0, 440.01);
        assert_eq!(voiced.energy, 0.2123);

        let counts = report.counts();
        assert_eq!(counts.voiced, 1);
        assert_eq!(counts.unvoiced, 1);
        assert_eq!(counts.silence, 2);
        assert_eq!(counts.total(), report.total_segments());
    }

    #[test]
    fn mismatched_lengths_truncate_to_shorter() {
        let asm = ReportAssembler::new(512, 16_000, 0.02);
        let report = asm.assemble("a.wav", &energies(&[0.1; 5]), &pitches(&[0.0; 3]));
        assert_eq!(report.total_segments(), 3);
        assert_eq!(report.segments().len(), 3);
    }

    #[test]
    fn empty_input_is_empty_report() {
        let asm = ReportAssembler::new(512, 16_000, 0.02);
        let report = asm.assemble("empty.wav", &[], &[]);
        assert!(report.is_empty());
        assert_eq!(report.total_segments(), 0);
    }

    #[test]
    fn report_serializes_to_contract_shape() {
        let asm = ReportAssembler::new(512, 16_000, 0.02);
        let report = asm.assemble("dir/x.wav", &energies(&[0.3]), &pitches(&[220.0]));

        let json = serde_json::to_value(&report).expect("serialize report");
        assert_eq!(json["filename"], "x.wav");
        assert_eq!(json["total_segments"], 1);
        let seg = &json["segments"][0];
        assert_eq!(seg["type"], "VOICED");
        assert_eq!(seg["time"], 0.0);
        assert_eq!(seg["f0"], 220.0);
        assert_eq!(seg["energy"], 0.3);
        assert_eq!(seg.as_object().map(|o| o.len()), Some(4));

        let round_trip: AnalysisReport =
            serde_json::from_value(json).expect("deserialize report");
        assert_eq!(round_trip, report);
    }

    #[test]
    fn frame_time_is_index_times_hop() {
        let asm = ReportAssembler::new(512, 16_000, 0.02);
        for i in 0..200 {
            let dt = asm.frame_time(i + 1) - asm.frame_time(i);
            assert!((dt - 0.032).abs() < 1e-12, "i={i} dt={dt}");
        }
    }
}
