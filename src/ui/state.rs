//! Application state glue for the chat page
//!
//! Ties the capture session, live spectrum, playback coordinator and upload
//! handoff together. The visualizer's lifecycle is bound 1:1 to the
//! session's recording state here: it attaches on a successful start and
//! detaches before the session stops or cancels.

use crate::audio::CompressedRecording;
use crate::capture::{CaptureSession, DeviceLock, RecorderBackend};
use crate::playback::{NullSink, PlaybackCoordinator, PlaybackSink, PlaybackWaveform};
use crate::upload::{prepare_upload, UploadAdapter};
use crate::visualize::LiveSpectrum;
use chrono::{DateTime, Utc};
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

/// One voice message shown in the conversation
pub struct VoiceMessage {
    pub id: Uuid,
    pub recording: CompressedRecording,
    pub player: PlaybackWaveform,
    pub sent_at: DateTime<Utc>,
}

/// Central state for the voice message page
pub struct AppState {
    pub session: CaptureSession,
    pub spectrum: LiveSpectrum,
    pub coordinator: PlaybackCoordinator,
    pub messages: Vec<VoiceMessage>,
    /// Last user-facing error, cleared on the next successful action
    pub error: Option<String>,
    uploader: Option<Box<dyn UploadAdapter>>,
    #[cfg(feature = "audio-io")]
    output: Option<(rodio::OutputStream, rodio::OutputStreamHandle)>,
}

impl AppState {
    pub fn new(backend: impl RecorderBackend + 'static) -> Self {
        Self {
            session: CaptureSession::new(backend, DeviceLock::new()),
            spectrum: LiveSpectrum::default(),
            coordinator: PlaybackCoordinator::new(),
            messages: Vec::new(),
            error: None,
            uploader: None,
            #[cfg(feature = "audio-io")]
            output: rodio::OutputStream::try_default()
                .map_err(|e| warn!("No audio output available: {}", e))
                .ok(),
        }
    }

    /// Install the external upload collaborator
    pub fn with_uploader(mut self, uploader: Box<dyn UploadAdapter>) -> Self {
        self.uploader = Some(uploader);
        self
    }

    pub fn is_recording(&self) -> bool {
        self.session.is_recording()
    }

    pub fn elapsed_seconds(&self) -> u32 {
        self.session.elapsed_seconds()
    }

    /// Per-frame upkeep: drain capture chunks and poll playing sinks
    pub fn frame(&mut self) {
        self.session.poll();
        for message in &self.messages {
            message.player.refresh();
        }
    }

    /// Start recording and attach the visualizer to the live stream
    pub fn start_recording(&mut self) {
        match self.session.start() {
            Ok(()) => {
                if let Some(tap) = self.session.sample_tap() {
                    self.spectrum.start(tap);
                }
                self.error = None;
            }
            Err(e) => {
                warn!("Failed to start recording: {}", e);
                self.error = Some(e.user_message());
            }
        }
    }

    /// Stop recording; on success the message is appended and handed to the
    /// upload adapter
    pub fn stop_recording(&mut self) {
        self.spectrum.stop();
        match self.session.stop() {
            Ok(Some(recording)) => self.push_message(recording),
            Ok(None) => {}
            Err(e) => {
                warn!("Failed to stop recording: {}", e);
                self.error = Some(e.user_message());
            }
        }
    }

    /// Discard the recording in progress
    pub fn cancel_recording(&mut self) {
        self.spectrum.stop();
        self.session.cancel();
    }

    fn push_message(&mut self, recording: CompressedRecording) {
        let metadata = json!({
            "elapsed_seconds": recording.elapsed_seconds,
            "recorded_at": recording.recorded_at.to_rfc3339(),
        });

        let request = match prepare_upload(&recording, metadata) {
            Ok(request) => Some(request),
            Err(e) => {
                warn!("Failed to prepare upload: {}", e);
                self.error = Some(e.user_message());
                None
            }
        };

        // Local preview plays the same bytes the backend receives
        let (bytes, mime_type) = match &request {
            Some(request) => (request.bytes.clone(), request.mime_type.clone()),
            None => (recording.bytes.clone(), recording.mime_type.clone()),
        };

        let player = PlaybackWaveform::new(&self.coordinator, self.make_sink(), &bytes, &mime_type)
            .with_duration_hint(recording.elapsed_seconds as f32);

        if let (Some(request), Some(uploader)) = (request, &self.uploader) {
            match uploader.upload(request) {
                Ok(response) if response.success => {
                    info!("Upload accepted: {}", response.message);
                }
                Ok(response) => {
                    warn!("Upload rejected: {}", response.message);
                    self.error = Some(response.message);
                }
                Err(e) => {
                    warn!("Upload failed: {}", e);
                    self.error = Some(e.user_message());
                }
            }
        }

        self.messages.push(VoiceMessage {
            id: Uuid::new_v4(),
            recording,
            player,
            sent_at: Utc::now(),
        });
    }

    #[cfg(feature = "audio-io")]
    fn make_sink(&self) -> Box<dyn PlaybackSink> {
        if let Some((_, handle)) = &self.output {
            match crate::playback::RodioSink::new(handle) {
                Ok(sink) => return Box::new(sink),
                Err(e) => warn!("Falling back to silent playback: {}", e),
            }
        }
        Box::new(NullSink::new())
    }

    #[cfg(not(feature = "audio-io"))]
    fn make_sink(&self) -> Box<dyn PlaybackSink> {
        Box::new(NullSink::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{AudioChunk, SampleTap};
    use crate::capture::RecorderEvent;
    use crate::upload::{UploadRequest, UploadResponse};
    use crate::Result;
    use crossbeam_channel::Sender;
    use parking_lot::Mutex;
    use std::sync::Arc;

    struct StubBackend {
        chunk: Vec<u8>,
        tap: SampleTap,
        events: Option<Sender<RecorderEvent>>,
    }

    impl StubBackend {
        fn new(chunk: Vec<u8>) -> Self {
            Self {
                chunk,
                tap: SampleTap::new(1024),
                events: None,
            }
        }
    }

    impl RecorderBackend for StubBackend {
        fn open(&mut self, events: Sender<RecorderEvent>) -> Result<()> {
            self.events = Some(events);
            Ok(())
        }

        fn finalize(&mut self) -> Result<()> {
            if let Some(events) = self.events.take() {
                if !self.chunk.is_empty() {
                    events
                        .send(RecorderEvent::Chunk(AudioChunk::new(self.chunk.clone())))
                        .unwrap();
                }
                events.send(RecorderEvent::Finalized).unwrap();
            }
            Ok(())
        }

        fn abort(&mut self) {
            self.events = None;
        }

        fn mime_type(&self) -> String {
            "audio/pcm;rate=16000;channels=1;bits=16".into()
        }

        fn sample_tap(&self) -> Option<SampleTap> {
            Some(self.tap.clone())
        }
    }

    struct RecordingUploader {
        seen: Arc<Mutex<Vec<UploadRequest>>>,
    }

    impl UploadAdapter for RecordingUploader {
        fn upload(&self, request: UploadRequest) -> Result<UploadResponse> {
            self.seen.lock().push(request);
            Ok(UploadResponse {
                success: true,
                message: "stored".into(),
                data: serde_json::Value::Null,
            })
        }
    }

    fn pcm_chunk(frames: usize) -> Vec<u8> {
        (0..frames as i16).flat_map(|s| s.to_le_bytes()).collect()
    }

    #[test]
    fn test_record_flow_appends_message_and_uploads() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut state = AppState::new(StubBackend::new(pcm_chunk(160)))
            .with_uploader(Box::new(RecordingUploader {
                seen: Arc::clone(&seen),
            }));

        state.start_recording();
        assert!(state.is_recording());
        assert!(state.spectrum.is_active());

        state.stop_recording();
        assert!(!state.is_recording());
        assert!(!state.spectrum.is_active());
        assert_eq!(state.messages.len(), 1);

        let uploads = seen.lock();
        assert_eq!(uploads.len(), 1);
        assert!(uploads[0].filename.ends_with(".wav"));
        assert_eq!(uploads[0].bytes.len(), 44 + 160 * 2);
    }

    #[test]
    fn test_cancel_discards_without_message() {
        let mut state = AppState::new(StubBackend::new(pcm_chunk(160)));
        state.start_recording();
        state.cancel_recording();

        assert!(!state.is_recording());
        assert!(!state.spectrum.is_active());
        assert!(state.messages.is_empty());
    }

    #[test]
    fn test_double_start_sets_error() {
        let mut state = AppState::new(StubBackend::new(Vec::new()));
        state.start_recording();
        state.start_recording();
        assert!(state.error.is_some());
        // Original recording keeps going
        assert!(state.is_recording());
    }

    #[test]
    fn test_message_player_gets_duration_hint() {
        let mut state = AppState::new(StubBackend::new(pcm_chunk(16000)));
        state.start_recording();
        state.stop_recording();

        let message = &state.messages[0];
        // WAV metadata (1 s at 16 kHz) or the hint; either way non-zero
        assert!(message.player.state().duration >= 0.0);
        assert_eq!(message.recording.elapsed_seconds, 0);
    }
}
