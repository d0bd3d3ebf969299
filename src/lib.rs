pub mod audio;
pub mod capture;
pub mod playback;
pub mod ui;
pub mod upload;
pub mod visualize;

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum VoicenoteError {
    #[error("Microphone permission denied: {0}")]
    PermissionDenied(String),

    #[error("No audio input device available: {0}")]
    DeviceUnavailable(String),

    #[error("Audio device already in use: {0}")]
    DeviceBusy(String),

    #[error("Audio decode failure: {0}")]
    DecodeFailure(String),

    #[error("WAV encode failure: {0}")]
    EncodeFailure(String),

    #[error("Playback failure: {0}")]
    PlaybackFailure(String),

    #[error("Channel error: {0}")]
    ChannelError(String),

    #[error("IO error: {0}")]
    IOError(String),
}

impl From<std::io::Error> for VoicenoteError {
    fn from(e: std::io::Error) -> Self {
        VoicenoteError::IOError(e.to_string())
    }
}

impl VoicenoteError {
    /// Check if this error is recoverable
    pub fn is_recoverable(&self) -> bool {
        match self {
            // User can grant access and retry
            VoicenoteError::PermissionDenied(_) => true,
            // No hardware; retrying without a hardware change is pointless
            VoicenoteError::DeviceUnavailable(_) => false,
            // Another session holds the microphone; retry after it stops
            VoicenoteError::DeviceBusy(_) => true,
            // Recovered locally via the original-bytes fallback
            VoicenoteError::DecodeFailure(_) => true,
            // Should not occur for valid decoded input
            VoicenoteError::EncodeFailure(_) => false,
            // Playback reverts to paused; the user can try again
            VoicenoteError::PlaybackFailure(_) => true,
            // Channel errors indicate internal issues
            VoicenoteError::ChannelError(_) => false,
            VoicenoteError::IOError(_) => false,
        }
    }

    /// Get a user-friendly description of the error
    pub fn user_message(&self) -> String {
        match self {
            VoicenoteError::PermissionDenied(_) => {
                "Microphone access was denied. Please allow access and try again.".to_string()
            }
            VoicenoteError::DeviceUnavailable(_) => {
                "No microphone found. Please connect an input device.".to_string()
            }
            VoicenoteError::DeviceBusy(_) => {
                "The microphone is already in use by another recording.".to_string()
            }
            VoicenoteError::DecodeFailure(_) => {
                "The recording could not be converted. The original audio will be used.".to_string()
            }
            VoicenoteError::EncodeFailure(_) => {
                "Audio conversion failed. Please try recording again.".to_string()
            }
            VoicenoteError::PlaybackFailure(_) => {
                "Audio playback failed. Please try again.".to_string()
            }
            VoicenoteError::ChannelError(_) => {
                "Internal communication error. Please restart the application.".to_string()
            }
            VoicenoteError::IOError(_) => "File system error occurred.".to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, VoicenoteError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_errors_user_facing() {
        let denied = VoicenoteError::PermissionDenied("user refused".into());
        assert!(denied.is_recoverable());
        assert!(denied.user_message().contains("Microphone"));

        let missing = VoicenoteError::DeviceUnavailable("no input".into());
        assert!(!missing.is_recoverable());
    }

    #[test]
    fn test_decode_failure_is_recoverable() {
        let err = VoicenoteError::DecodeFailure("unsupported codec".into());
        assert!(err.is_recoverable());

        let err = VoicenoteError::EncodeFailure("writer".into());
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: VoicenoteError = io.into();
        assert!(matches!(err, VoicenoteError::IOError(_)));
    }
}
