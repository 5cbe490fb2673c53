//! WAV decoding via `hound`, downmixed to mono f32.

use std::path::Path;

use tracing::debug;

use super::{downmix_into, AudioSignal};
use crate::error::{Result, VoicingError};

/// Read a WAV file and average all channels into one.
///
/// Integer formats are scaled to [-1.0, 1.0] by their full-scale value.
///
/// # Errors
/// `FileNotFound` if `path` does not exist, `Decode` for malformed WAV data.
pub fn read_wav_mono(path: &Path) -> Result<AudioSignal> {
    if !path.exists() {
        return Err(VoicingError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let mut reader = hound::WavReader::open(path)?;
    let spec = reader.spec();
    let channels = usize::from(spec.channels.max(1));

    let interleaved: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<std::result::Result<Vec<_>, _>>()?,
        hound::SampleFormat::Int => {
            if spec.bits_per_sample <= 8 {
                reader
                    .samples::<i8>()
                    .map(|s| s.map(|v| v as f32 / i8::MAX as f32))
                    .collect::<std::result::Result<Vec<_>, _>>()?
            } else if spec.bits_per_sample <= 16 {
                reader
                    .samples::<i16>()
                    .map(|s| s.map(|v| v as f32 / i16::MAX as f32))
                    .collect::<std::result::Result<Vec<_>, _>>()?
            } else {
                let max = ((1_i64 << (spec.bits_per_sample - 1)) - 1) as f32;
                reader
                    .samples::<i32>()
                    .map(|s| s.map(|v| v as f32 / max))
                    .collect::<std::result::Result<Vec<_>, _>>()?
            }
        }
    };

    debug!(
        path = %path.display(),
        sample_rate = spec.sample_rate,
        channels,
        bits = spec.bits_per_sample,
        "decoded wav"
    );

    if channels == 1 {
        return Ok(AudioSignal::new(interleaved, spec.sample_rate));
    }

    let mut mono = Vec::with_capacity(interleaved.len() / channels);
    downmix_into(&interleaved, channels, &mut mono);
    Ok(AudioSignal::new(mono, spec.sample_rate))
}
