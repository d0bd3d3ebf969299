//! Upload boundary
//!
//! The network call itself is an external collaborator behind
//! `UploadAdapter`; this module only packages the artifact. A recording that
//! transcodes cleanly is handed over as canonical WAV. When decoding fails,
//! the ORIGINAL bytes are uploaded under their true mime type and extension;
//! a `.wav` name is only ever attached to bytes in the canonical layout.

use crate::audio::{transcoder, CompressedRecording};
use crate::{Result, VoicenoteError};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Binary payload plus metadata handed to the upload adapter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadRequest {
    /// Filename whose extension matches the actual codec of `bytes`
    pub filename: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
    /// Accompanying text metadata (free-form JSON)
    pub metadata: serde_json::Value,
}

/// Backend response shape
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    pub success: bool,
    pub message: String,
    pub data: serde_json::Value,
}

/// External collaborator performing the network call
pub trait UploadAdapter {
    /// Send one artifact with its metadata.
    ///
    /// # Errors
    /// Transport-level failures; the pipeline treats these as opaque.
    fn upload(&self, request: UploadRequest) -> Result<UploadResponse>;
}

/// Package a finished recording for upload.
///
/// Transcodes to canonical WAV when possible. On `DecodeFailure` the
/// original bytes are used with their real extension (logged, not silent).
///
/// # Errors
/// `EncodeFailure` propagates: decoded audio that will not encode is not a
/// recoverable condition.
pub fn prepare_upload(
    recording: &CompressedRecording,
    metadata: serde_json::Value,
) -> Result<UploadRequest> {
    let stamp = recording.recorded_at.format("%Y%m%d-%H%M%S");

    match transcoder::decode(recording) {
        Ok(decoded) => {
            let artifact = transcoder::encode_wav(&decoded)?;
            info!(
                "Prepared WAV upload: {} frames, {} bytes",
                decoded.frame_count(),
                artifact.len()
            );
            Ok(UploadRequest {
                filename: format!("voice-{}.wav", stamp),
                mime_type: "audio/wav".into(),
                bytes: artifact.into_bytes(),
                metadata,
            })
        }
        Err(e @ VoicenoteError::DecodeFailure(_)) => {
            warn!(
                "Transcode failed, uploading original {} bytes untouched: {}",
                recording.mime_type, e
            );
            Ok(UploadRequest {
                filename: format!("voice-{}.{}", stamp, recording.file_extension()),
                mime_type: recording.mime_type.clone(),
                bytes: recording.bytes.clone(),
                metadata,
            })
        }
        Err(e) => Err(e),
    }
}
