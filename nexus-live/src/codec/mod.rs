/// PCM16 audio codec
///
/// Converts between f32 sample buffers (range -1.0..=1.0) and the
/// little-endian signed 16-bit PCM byte layout used on the wire. Encoding
/// is infallible; decoding rejects byte sequences that do not contain a
/// whole number of frames.

use thiserror::Error;

/// Codec errors
#[derive(Error, Debug)]
pub enum CodecError {
    /// Byte length does not form a whole number of frames
    #[error("Malformed audio: {0}")]
    MalformedAudio(String),
}

/// Result type for codec operations
pub type CodecResult<T> = Result<T, CodecError>;

/// A decoded playback buffer: interleaved f32 samples plus format info.
///
/// Created by [`decode`], owned by the playback scheduler until its
/// samples have been submitted for output.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedChunk {
    /// Interleaved samples in -1.0..=1.0
    pub samples: Vec<f32>,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Number of interleaved channels
    pub channels: u16,
}

impl DecodedChunk {
    /// Number of frames (samples per channel)
    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels as usize
    }

    /// Playback duration in seconds
    pub fn duration(&self) -> f64 {
        self.frames() as f64 / self.sample_rate as f64
    }

    /// True if the chunk carries no audio
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Collapse interleaved channels to mono by averaging.
    ///
    /// Returns the samples unchanged when the chunk is already mono.
    pub fn to_mono(&self) -> Vec<f32> {
        if self.channels <= 1 {
            return self.samples.clone();
        }
        let ch = self.channels as usize;
        self.samples
            .chunks_exact(ch)
            .map(|frame| frame.iter().sum::<f32>() / ch as f32)
            .collect()
    }
}

/// Encode f32 samples as little-endian i16 PCM bytes.
///
/// Each sample is scaled by 32767, rounded to the nearest integer and
/// saturated to the i16 range, so out-of-range input cannot overflow.
/// Empty input produces empty output.
///
/// # Example
/// ```
/// use nexus_live::codec::encode;
///
/// let bytes = encode(&[0.0, 1.0]);
/// assert_eq!(bytes, vec![0x00, 0x00, 0xFF, 0x7F]);
/// ```
pub fn encode(samples: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(samples.len() * 2);
    for &sample in samples {
        let scaled = (sample * 32767.0).round();
        let value = scaled.clamp(i16::MIN as f32, i16::MAX as f32) as i16;
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    bytes
}

/// Decode little-endian i16 PCM bytes into a [`DecodedChunk`].
///
/// Every two bytes form one sample, recovered as `i16 / 32768.0`. The
/// byte length must be a multiple of `2 * channels` so that the buffer
/// holds whole frames; empty input decodes to an empty chunk.
///
/// # Errors
/// Returns [`CodecError::MalformedAudio`] if the byte length does not
/// form whole frames, or if `sample_rate` or `channels` is zero.
pub fn decode(bytes: &[u8], sample_rate: u32, channels: u16) -> CodecResult<DecodedChunk> {
    if channels == 0 {
        return Err(CodecError::MalformedAudio(
            "channel count must be non-zero".to_string(),
        ));
    }
    if sample_rate == 0 {
        return Err(CodecError::MalformedAudio(
            "sample rate must be non-zero".to_string(),
        ));
    }

    let frame_bytes = 2 * channels as usize;
    if bytes.len() % frame_bytes != 0 {
        return Err(CodecError::MalformedAudio(format!(
            "byte length {} is not a multiple of {} ({}ch frames)",
            bytes.len(),
            frame_bytes,
            channels
        )));
    }

    let samples = bytes
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]) as f32 / 32768.0)
        .collect();

    Ok(DecodedChunk {
        samples,
        sample_rate,
        channels,
    })
}
