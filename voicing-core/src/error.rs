use thiserror::Error;

/// All errors produced by voicing-core.
#[derive(Debug, Error)]
pub enum VoicingError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("invalid signal: {0}")]
    InvalidSignal(String),

    #[error("unsupported audio format: {extension}")]
    UnsupportedFormat { extension: String },

    #[error("audio decode error: {0}")]
    Decode(String),

    #[error("resampler error: {0}")]
    Resample(String),

    #[error("audio file not found: {}", path.display())]
    FileNotFound { path: std::path::PathBuf },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<hound::Error> for VoicingError {
    fn from(e: hound::Error) -> Self {
        match e {
            hound::Error::IoError(io) => VoicingError::Io(io),
            other => VoicingError::Decode(other.to_string()),
        }
    }
}

impl From<symphonia::core::errors::Error> for VoicingError {
    fn from(e: symphonia::core::errors::Error) -> Self {
        match e {
            symphonia::core::errors::Error::IoError(io) => VoicingError::Io(io),
            other => VoicingError::Decode(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, VoicingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decoder_io_errors_stay_io() {
        let io = || std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "short read");
        assert!(matches!(VoicingError::from(hound::Error::IoError(io())), VoicingError::Io(_)));
        assert!(matches!(
            VoicingError::from(symphonia::core::errors::Error::IoError(io())),
            VoicingError::Io(_)
        ));
    }

    #[test]
    fn malformed_streams_become_decode_errors() {
        let err = VoicingError::from(hound::Error::FormatError("no RIFF tag found"));
        assert!(matches!(err, VoicingError::Decode(_)), "{err}");

        let err = VoicingError::from(symphonia::core::errors::Error::DecodeError("bad frame"));
        assert!(matches!(err, VoicingError::Decode(ref m) if m.contains("bad frame")), "{err}");
        assert!(err.to_string().starts_with("audio decode error"));
    }
}
