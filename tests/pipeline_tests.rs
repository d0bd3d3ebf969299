//! End-to-end capture and transcode tests
//!
//! Drives a full voice message flow against a scripted recorder backend:
//! record, finalize with trailing chunks, transcode to canonical WAV, and
//! package for upload.

use crossbeam_channel::Sender;
use voicenote::audio::{transcoder, AudioChunk, CompressedRecording, SampleTap};
use voicenote::capture::{CaptureSession, DeviceLock, RecorderBackend, RecorderEvent};
use voicenote::upload::prepare_upload;
use voicenote::{Result, VoicenoteError};

/// Recorder double that emits PCM chunks on open and more at finalize time
struct FakeRecorder {
    on_open: Vec<Vec<u8>>,
    on_finalize: Vec<Vec<u8>>,
    sample_rate: u32,
    tap: SampleTap,
    events: Option<Sender<RecorderEvent>>,
}

impl FakeRecorder {
    fn new(on_open: Vec<Vec<u8>>, on_finalize: Vec<Vec<u8>>) -> Self {
        Self {
            on_open,
            on_finalize,
            sample_rate: 16_000,
            tap: SampleTap::new(4096),
            events: None,
        }
    }
}

impl RecorderBackend for FakeRecorder {
    fn open(&mut self, events: Sender<RecorderEvent>) -> Result<()> {
        for bytes in self.on_open.drain(..) {
            events
                .send(RecorderEvent::Chunk(AudioChunk::new(bytes)))
                .unwrap();
        }
        self.events = Some(events);
        Ok(())
    }

    fn finalize(&mut self) -> Result<()> {
        if let Some(events) = self.events.take() {
            for bytes in self.on_finalize.drain(..) {
                events
                    .send(RecorderEvent::Chunk(AudioChunk::new(bytes)))
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
        format!("audio/pcm;rate={};channels=1;bits=16", self.sample_rate)
    }

    fn sample_tap(&self) -> Option<SampleTap> {
        Some(self.tap.clone())
    }
}

/// PCM bytes for a ramp of `frames` samples
fn pcm_ramp(frames: usize) -> Vec<u8> {
    (0..frames)
        .map(|i| (i % 1000) as i16)
        .flat_map(|s| s.to_le_bytes())
        .collect()
}

#[test]
fn test_full_record_and_transcode_flow() {
    let backend = FakeRecorder::new(
        vec![pcm_ramp(400), pcm_ramp(400)],
        vec![pcm_ramp(200)],
    );
    let mut session = CaptureSession::new(backend, DeviceLock::new());

    session.start().unwrap();
    assert!(session.is_recording());
    session.poll();

    let recording = session.stop().unwrap().expect("recording produced");
    // 1000 frames total, two bytes each, trailing chunk included
    assert_eq!(recording.len(), 1000 * 2);
    assert!(session.state().is_idle());

    let wav = transcoder::transcode_to_wav(&recording).unwrap();
    assert_eq!(wav.len(), 44 + 1000 * 2);
    assert_eq!(&wav.as_bytes()[0..4], b"RIFF");

    // The transcoded artifact decodes back to the same frame count
    let check = CompressedRecording::new(wav.into_bytes(), "audio/wav".into(), 0);
    let decoded = transcoder::decode(&check).unwrap();
    assert_eq!(decoded.frame_count(), 1000);
    assert_eq!(decoded.sample_rate(), 16_000);
}

#[test]
fn test_zero_chunk_session_end_to_end() {
    let backend = FakeRecorder::new(Vec::new(), Vec::new());
    let mut session = CaptureSession::new(backend, DeviceLock::new());

    session.start().unwrap();
    std::thread::sleep(std::time::Duration::from_millis(1100));
    let recording = session.stop().unwrap().unwrap();

    assert!(recording.is_empty());
    assert!(
        (1..=2).contains(&recording.elapsed_seconds),
        "elapsed {} out of range",
        recording.elapsed_seconds
    );

    // Degenerate but valid artifact: header only, no data bytes, no error
    let wav = transcoder::transcode_to_wav(&recording).unwrap();
    assert_eq!(wav.len(), 44);
    assert_eq!(wav.data_len(), 0);
}

#[test]
fn test_chunks_delivered_only_at_finalize_are_kept() {
    // Everything arrives between the stop request and the finalized marker;
    // assembling early would lose the entire payload
    let backend = FakeRecorder::new(Vec::new(), vec![pcm_ramp(300), pcm_ramp(300)]);
    let mut session = CaptureSession::new(backend, DeviceLock::new());

    session.start().unwrap();
    let recording = session.stop().unwrap().unwrap();
    assert_eq!(recording.len(), 600 * 2);
}

#[test]
fn test_microphone_exclusive_across_sessions() {
    let lock = DeviceLock::new();
    let mut first = CaptureSession::new(FakeRecorder::new(Vec::new(), Vec::new()), lock.clone());
    let mut second = CaptureSession::new(FakeRecorder::new(Vec::new(), Vec::new()), lock.clone());

    first.start().unwrap();
    assert!(matches!(
        second.start(),
        Err(VoicenoteError::DeviceBusy(_))
    ));

    // Cancelling the holder frees the device for the other session
    first.cancel();
    assert!(!lock.is_claimed());
    second.start().unwrap();
    second.cancel();
}

#[test]
fn test_cancel_twice_and_while_idle() {
    let mut session = CaptureSession::new(
        FakeRecorder::new(vec![pcm_ramp(10)], Vec::new()),
        DeviceLock::new(),
    );

    session.cancel();
    assert!(session.state().is_idle());

    session.start().unwrap();
    session.cancel();
    session.cancel();
    assert!(session.state().is_idle());
}

#[test]
fn test_upload_packaging_from_recording() {
    let backend = FakeRecorder::new(vec![pcm_ramp(160)], Vec::new());
    let mut session = CaptureSession::new(backend, DeviceLock::new());

    session.start().unwrap();
    session.poll();
    let recording = session.stop().unwrap().unwrap();

    let request = prepare_upload(&recording, serde_json::json!({"q": 7})).unwrap();
    assert!(request.filename.ends_with(".wav"));
    assert_eq!(request.mime_type, "audio/wav");
    assert_eq!(request.bytes.len(), 44 + 160 * 2);
    assert_eq!(request.metadata["q"], 7);
}

#[test]
fn test_upload_fallback_never_claims_wav() {
    // An opaque container the transcoder cannot parse
    let recording = CompressedRecording::new(
        vec![0x1A, 0x45, 0xDF, 0xA3, 0x00, 0x00],
        "audio/webm;codecs=opus".into(),
        4,
    );

    let request = prepare_upload(&recording, serde_json::json!({})).unwrap();
    assert!(
        request.filename.ends_with(".webm"),
        "fallback filename {} must keep the original extension",
        request.filename
    );
    assert_eq!(request.mime_type, "audio/webm;codecs=opus");
    assert_eq!(request.bytes, recording.bytes);
}

#[test]
fn test_visualizer_sees_live_samples_independently() {
    use voicenote::visualize::LiveSpectrum;

    let backend = FakeRecorder::new(Vec::new(), Vec::new());
    let tap = backend.sample_tap().unwrap();
    let mut session = CaptureSession::new(backend, DeviceLock::new());
    let mut spectrum = LiveSpectrum::new(8);

    session.start().unwrap();
    spectrum.start(session.sample_tap().unwrap());

    // The capture callback writes samples the visualizer can pick up even
    // though the recorded bytes are owned by the session
    tap.write(&vec![0.8; 2048]);
    let bars = spectrum.tick(60.0).to_vec();
    assert!(bars.iter().any(|&b| b > 0.0));

    spectrum.stop();
    session.stop().unwrap();
    assert!(!spectrum.is_active());
}
