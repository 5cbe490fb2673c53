//! Decoded audio input.
//!
//! The analysis core only ever sees an [`AudioSignal`]: mono f32 samples at a
//! known rate. WAV decoding lives in [`wav`], the compressed formats in
//! [`compressed`]; optional rate conversion in [`resample`].
//!
//! # Accepted formats
//!
//! Files are accepted by extension (`wav`, `mp3`, `m4a`, `flac`, `ogg`).
//! Everything else is rejected with [`VoicingError::UnsupportedFormat`]
//! before any bytes are read.

pub mod compressed;
pub mod resample;
pub mod wav;

use std::path::Path;

use crate::error::{Result, VoicingError};

/// File extensions accepted and decoded (lower-case, no dot).
pub const SUPPORTED_EXTENSIONS: &[&str] = &["wav", "mp3", "m4a", "flac", "ogg"];

/// A complete mono signal at a known sample rate.
///
/// Owned by the caller; the pipeline only borrows it.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioSignal {
    /// Mono f32 samples, nominally in [-1.0, 1.0].
    pub samples: Vec<f32>,
    /// Sample rate in Hz.
    pub sample_rate: u32,
}

impl AudioSignal {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    /// Returns the duration of this signal in seconds.
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }

    /// Returns true if the signal contains no samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }
}

/// Lower-cased extension of `path`, without the dot. Empty if there is none.
pub fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_ascii_lowercase())
        .unwrap_or_default()
}

/// Reject paths whose extension is outside [`SUPPORTED_EXTENSIONS`].
pub fn check_supported(path: &Path) -> Result<()> {
    let ext = extension_of(path);
    if SUPPORTED_EXTENSIONS.contains(&ext.as_str()) {
        Ok(())
    } else {
        Err(VoicingError::UnsupportedFormat { extension: ext })
    }
}

/// Decode any supported file into a mono signal.
///
/// # Errors
/// - `UnsupportedFormat` for extensions outside [`SUPPORTED_EXTENSIONS`].
/// - `FileNotFound` / `Decode` / `Io` from the underlying decoder.
pub fn decode_file(path: &Path) -> Result<AudioSignal> {
    check_supported(path)?;
    match extension_of(path).as_str() {
        "wav" => wav::read_wav_mono(path),
        _ => compressed::read_compressed_mono(path),
    }
}

/// Average interleaved frames of `channels` samples into `out`.
pub(crate) fn downmix_into(interleaved: &[f32], channels: usize, out: &mut Vec<f32>) {
    if channels <= 1 {
        out.extend_from_slice(interleaved);
        return;
    }
    out.extend(
        interleaved
            .chunks(channels)
            .map(|frame| frame.iter().copied().sum::<f32>() / channels as f32),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_of_one_second() {
        let signal = AudioSignal::new(vec![0.0; 16_000], 16_000);
        assert!((signal.duration_secs() - 1.0).abs() < 1e-12);
        assert!(!signal.is_empty());
    }

    #[test]
    fn extension_check_is_case_insensitive() {
        assert!(check_supported(Path::new("take_01.WAV")).is_ok());
        assert!(check_supported(Path::new("dir/clip.flac")).is_ok());
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let err = check_supported(Path::new("notes.txt")).unwrap_err();
        match err {
            VoicingError::UnsupportedFormat { extension } => assert_eq!(extension, "txt"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unknown_extension_is_rejected_before_io() {
        // File does not exist: the format check must fire first.
        let err = decode_file(Path::new("/nonexistent/voice.aiff")).unwrap_err();
        assert!(matches!(err, VoicingError::UnsupportedFormat { .. }), "{err}");
    }

    #[test]
    fn every_accepted_format_has_a_decoder() {
        for ext in SUPPORTED_EXTENSIONS {
            let path = format!("/nonexistent/voicing/clip.{ext}");
            let err = decode_file(Path::new(&path)).unwrap_err();
            assert!(
                matches!(err, VoicingError::FileNotFound { .. }),
                "ext={ext} err={err}"
            );
        }
    }

    #[test]
    fn downmix_averages_channels() {
        let mut out = Vec::new();
        downmix_into(&[1.0, 0.0, 0.5, 0.5, -1.0, 1.0], 2, &mut out);
        assert_eq!(out, vec![0.5, 0.5, 0.0]);

        let mut mono = vec![0.25];
        downmix_into(&[0.1, 0.2], 1, &mut mono);
        assert_eq!(mono, vec![0.25, 0.1, 0.2]);
    }
}
