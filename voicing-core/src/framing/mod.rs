//! Centred, overlapping framing of a complete signal.
//!
//! ## Layout
//!
//! ```text
//!  pad_left = N/2          original signal (len L)          pad_right = N - N/2
//! |<-------->|<------------------------------------------>|<---------->|
//! frame i starts at i*H in the padded buffer, so its centre sits on sample i*H
//! of the original signal: time(i) = i * H / sample_rate.
//! ```
//!
//! Padding mirrors the signal about its edge samples without repeating them
//! (`[a b c d]` padded by 2 → `[c b a b c d c b]`). Signals shorter than the
//! pad fold back and forth until the pad is filled.

use crate::error::{Result, VoicingError};

/// Frame length / hop length pair, validated on construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameSegmenter {
    frame_length: usize,
    hop_length: usize,
}

impl FrameSegmenter {
    /// # Errors
    /// `InvalidConfiguration` if either length is zero or `hop_length > frame_length`.
    pub fn new(frame_length: usize, hop_length: usize) -> Result<Self> {
        if frame_length == 0 {
            return Err(VoicingError::InvalidConfiguration(
                "frameLength must be > 0".into(),
            ));
        }
        if hop_length == 0 {
            return Err(VoicingError::InvalidConfiguration(
                "hopLength must be > 0".into(),
            ));
        }
        if hop_length > frame_length {
            return Err(VoicingError::InvalidConfiguration(format!(
                "hopLength ({hop_length}) must not exceed frameLength ({frame_length})"
            )));
        }
        Ok(Self {
            frame_length,
            hop_length,
        })
    }

    pub fn frame_length(&self) -> usize {
        self.frame_length
    }

    pub fn hop_length(&self) -> usize {
        self.hop_length
    }

    /// Number of frames for a signal of `len` samples: `len / H + 1`, or 0
    /// for an empty signal.
    pub fn frame_count(&self, len: usize) -> usize {
        if len == 0 {
            0
        } else {
            len / self.hop_length + 1
        }
    }

    /// Pad `samples` once and expose its frames as borrowed views.
    pub fn segment(&self, samples: &[f32]) -> FramedSignal {
        let count = self.frame_count(samples.len());
        let padded = if count == 0 {
            Vec::new()
        } else {
            let left = self.frame_length / 2;
            let right = self.frame_length - left;
            reflect_pad(samples, left, right)
        };
        FramedSignal {
            padded,
            frame_length: self.frame_length,
            hop_length: self.hop_length,
            count,
        }
    }
}

/// One analysis window over a [`FramedSignal`].
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    pub index: usize,
    pub samples: &'a [f32],
}

/// A padded copy of the input plus the frame grid over it.
///
/// Frames borrow from `padded`; the padded buffer is the only copy made.
#[derive(Debug, Clone)]
pub struct FramedSignal {
    padded: Vec<f32>,
    frame_length: usize,
    hop_length: usize,
    count: usize,
}

impl FramedSignal {
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Frame `index`, or `None` past the end.
    pub fn frame(&self, index: usize) -> Option<Frame<'_>> {
        if index >= self.count {
            return None;
        }
        let start = index * self.hop_length;
        let samples = self.padded.get(start..start + self.frame_length)?;
        Some(Frame { index, samples })
    }

    pub fn frames(&self) -> impl ExactSizeIterator<Item = Frame<'_>> + '_ {
        (0..self.count).map(move |i| {
            let start = i * self.hop_length;
            Frame {
                index: i,
                samples: &self.padded[start..start + self.frame_length],
            }
        })
    }
}

/// Mirror index `i` (possibly negative or past the end) into `[0, len)`.
fn reflect_index(i: isize, len: usize) -> usize {
    if len == 1 {
        return 0;
    }
    let period = 2 * (len as isize - 1);
    let m = i.rem_euclid(period);
    if m < len as isize {
        m as usize
    } else {
        (period - m) as usize
    }
}

fn reflect_pad(samples: &[f32], left: usize, right: usize) -> Vec<f32> {
    let len = samples.len();
    let mut out = Vec::with_capacity(left + len + right);
    for k in (1..=left).rev() {
        out.push(samples[reflect_index(-(k as isize), len)]);
    }
    out.extend_from_slice(samples);
    for k in 0..right {
        out.push(samples[reflect_index((len + k) as isize, len)]);
    }
    out
}
