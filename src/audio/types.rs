//! Core data types for the voice message pipeline

use crate::{Result, VoicenoteError};
use chrono::{DateTime, Utc};

/// One opaque binary fragment delivered by the recording backend.
///
/// Chunks arrive in order while capture is active and are never dropped or
/// reordered; the session concatenates them on stop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioChunk {
    pub bytes: Vec<u8>,
}

impl AudioChunk {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// A finished recording: all chunk bytes plus codec and timing metadata.
///
/// Immutable once produced by `CaptureSession::stop`.
#[derive(Debug, Clone)]
pub struct CompressedRecording {
    pub bytes: Vec<u8>,
    /// Codec identifier of the chunk payload, e.g. `audio/pcm;rate=48000;channels=1;bits=16`
    pub mime_type: String,
    /// Wall-clock recording time, 1-second tick granularity
    pub elapsed_seconds: u32,
    pub recorded_at: DateTime<Utc>,
}

impl CompressedRecording {
    pub fn new(bytes: Vec<u8>, mime_type: String, elapsed_seconds: u32) -> Self {
        Self {
            bytes,
            mime_type,
            elapsed_seconds,
            recorded_at: Utc::now(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Filename extension matching the actual codec of `bytes`.
    ///
    /// Used when a recording is uploaded untranscoded; the extension must
    /// never claim a format the bytes are not.
    pub fn file_extension(&self) -> &'static str {
        extension_for_mime(&self.mime_type)
    }
}

/// Map a mime type to the conventional filename extension.
pub fn extension_for_mime(mime_type: &str) -> &'static str {
    let essence = mime_type.split(';').next().unwrap_or("").trim();
    match essence {
        "audio/wav" | "audio/x-wav" | "audio/wave" => "wav",
        "audio/ogg" | "application/ogg" => "ogg",
        "audio/webm" | "video/webm" => "webm",
        "audio/mpeg" | "audio/mp3" => "mp3",
        "audio/mp4" | "audio/aac" => "m4a",
        "audio/flac" | "audio/x-flac" => "flac",
        "audio/pcm" => "pcm",
        _ => "bin",
    }
}

/// Uncompressed audio as per-channel float samples in [-1.0, 1.0].
///
/// Produced by `transcoder::decode`; never mutated in place.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedAudioBuffer {
    sample_rate: u32,
    channels: Vec<Vec<f32>>,
}

impl DecodedAudioBuffer {
    /// Build a buffer from per-channel sample vectors.
    ///
    /// # Errors
    /// Fails if the channel count is not 1 or 2, or channel lengths differ.
    pub fn from_channels(sample_rate: u32, channels: Vec<Vec<f32>>) -> Result<Self> {
        if channels.is_empty() || channels.len() > 2 {
            return Err(VoicenoteError::DecodeFailure(format!(
                "unsupported channel count: {}",
                channels.len()
            )));
        }
        let frames = channels[0].len();
        if channels.iter().any(|c| c.len() != frames) {
            return Err(VoicenoteError::DecodeFailure(
                "channel lengths differ".into(),
            ));
        }
        Ok(Self {
            sample_rate,
            channels,
        })
    }

    /// An empty (zero-frame) mono buffer at the given rate.
    pub fn empty(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            channels: vec![Vec::new()],
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channel_count(&self) -> u16 {
        self.channels.len() as u16
    }

    pub fn frame_count(&self) -> usize {
        self.channels[0].len()
    }

    pub fn channel(&self, index: usize) -> &[f32] {
        &self.channels[index]
    }

    pub fn duration_seconds(&self) -> f32 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frame_count() as f32 / self.sample_rate as f32
    }
}

/// The canonical RIFF/WAVE byte layout handed to the upload boundary.
///
/// Always exactly `44 + frame_count * channel_count * 2` bytes: a fixed
/// 44-byte header followed by interleaved signed 16-bit little-endian PCM.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalWavArtifact {
    bytes: Vec<u8>,
}

impl CanonicalWavArtifact {
    /// Fixed header size of the canonical layout
    pub const HEADER_LEN: usize = 44;

    pub(crate) fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Number of data bytes after the header
    pub fn data_len(&self) -> usize {
        self.bytes.len().saturating_sub(Self::HEADER_LEN)
    }
}
