//! MP3 / AAC (m4a) / FLAC / Ogg Vorbis decoding via `symphonia`, downmixed
//! to mono f32.
//!
//! The first track with a known codec is decoded start to finish. Corrupt
//! packets are skipped with a warning; anything else aborts the decode.

use std::fs::File;
use std::io::ErrorKind;
use std::path::Path;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, warn};

use super::{downmix_into, extension_of, AudioSignal};
use crate::error::{Result, VoicingError};

/// Decode a compressed audio file and average all channels into one.
///
/// # Errors
/// `FileNotFound` if `path` does not exist, `Decode` when no readable audio
/// track is found or the stream is malformed, `Io` for read failures.
pub fn read_compressed_mono(path: &Path) -> Result<AudioSignal> {
    if !path.exists() {
        return Err(VoicingError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let file = File::open(path)?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    let ext = extension_of(path);
    if !ext.is_empty() {
        hint.with_extension(&ext);
    }

    let detected = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| VoicingError::Decode(format!("unrecognised .{ext} stream: {e}")))?;
    let mut format = detected.format;

    let (track_id, params) = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .map(|t| (t.id, t.codec_params.clone()))
        .ok_or_else(|| VoicingError::Decode("no decodable audio track".into()))?;

    let mut decoder =
        symphonia::default::get_codecs().make(&params, &DecoderOptions::default())?;

    let mut sample_rate = params.sample_rate;
    let mut channels = 0usize;
    let mut mono = Vec::new();
    let mut buf: Option<SampleBuffer<f32>> = None;
    let mut skipped = 0usize;

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == ErrorKind::UnexpectedEof => break,
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => return Err(e.into()),
        };
        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(SymphoniaError::DecodeError(msg)) => {
                skipped += 1;
                warn!(path = %path.display(), "skipping corrupt packet: {msg}");
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        let spec = *decoded.spec();
        sample_rate.get_or_insert(spec.rate);
        channels = spec.channels.count().max(1);

        let needed = decoded.capacity() * channels;
        let sb = match &mut buf {
            Some(sb) if sb.capacity() >= needed => sb,
            slot => slot.insert(SampleBuffer::new(decoded.capacity() as u64, spec)),
        };
        sb.copy_interleaved_ref(decoded);
        downmix_into(sb.samples(), channels, &mut mono);
    }

    let sample_rate = sample_rate
        .filter(|&sr| sr > 0)
        .ok_or_else(|| VoicingError::Decode("stream declares no sample rate".into()))?;

    debug!(
        path = %path.display(),
        sample_rate,
        channels,
        samples = mono.len(),
        skipped,
        "decoded compressed audio"
    );

    Ok(AudioSignal::new(mono, sample_rate))
}
