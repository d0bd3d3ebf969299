//! Capture session state machine
//!
//! Owns the recorder backend for one voice message: accumulates chunks while
//! recording, tracks elapsed wall-clock time, and on stop waits for the
//! backend's `Finalized` marker before assembling the `CompressedRecording`.
//! Assembling earlier would silently drop trailing chunks still in flight.

use crate::audio::{CompressedRecording, SampleTap};
use crate::capture::backend::{RecorderBackend, RecorderEvent};
use crate::{Result, VoicenoteError};
use crossbeam_channel::{unbounded, Receiver};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// How long `stop()` waits for the backend's finalized marker
const FINALIZE_TIMEOUT: Duration = Duration::from_secs(2);

/// Capture pipeline state
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SessionState {
    /// No recording in progress
    #[default]
    Idle,
    /// Actively recording audio from the microphone
    Recording,
    /// Waiting for the recorder to flush its final chunks
    Stopping,
}

impl SessionState {
    pub fn is_idle(&self) -> bool {
        matches!(self, SessionState::Idle)
    }

    pub fn is_recording(&self) -> bool {
        matches!(self, SessionState::Recording)
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionState::Idle => write!(f, "Idle"),
            SessionState::Recording => write!(f, "Recording"),
            SessionState::Stopping => write!(f, "Stopping"),
        }
    }
}

/// Shared claim on the single microphone device.
///
/// Sessions created against the same lock are mutually exclusive: the second
/// `start()` is rejected rather than silently stopping the first.
#[derive(Clone, Default)]
pub struct DeviceLock {
    claimed: Arc<AtomicBool>,
}

impl DeviceLock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether some session currently holds the device
    pub fn is_claimed(&self) -> bool {
        self.claimed.load(Ordering::SeqCst)
    }

    fn try_claim(&self) -> Option<DeviceClaim> {
        if self
            .claimed
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            Some(DeviceClaim {
                claimed: Arc::clone(&self.claimed),
            })
        } else {
            None
        }
    }
}

/// Guard representing a held device claim; releases exactly once on drop
struct DeviceClaim {
    claimed: Arc<AtomicBool>,
}

impl Drop for DeviceClaim {
    fn drop(&mut self) {
        self.claimed.store(false, Ordering::SeqCst);
    }
}

/// One microphone recording session.
///
/// State machine: `Idle -> Recording -> Stopping -> Idle`, with `cancel()`
/// returning to `Idle` from any state. Every exit path releases the device
/// claim exactly once.
pub struct CaptureSession {
    backend: Box<dyn RecorderBackend>,
    lock: DeviceLock,
    claim: Option<DeviceClaim>,
    state: SessionState,
    chunks: Vec<crate::audio::AudioChunk>,
    events: Option<Receiver<RecorderEvent>>,
    started_at: Option<Instant>,
}

impl CaptureSession {
    pub fn new(backend: impl RecorderBackend + 'static, lock: DeviceLock) -> Self {
        Self {
            backend: Box::new(backend),
            lock,
            claim: None,
            state: SessionState::Idle,
            chunks: Vec::new(),
            events: None,
            started_at: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_recording(&self) -> bool {
        self.state.is_recording()
    }

    /// Seconds since `start()`, truncated to whole seconds
    pub fn elapsed_seconds(&self) -> u32 {
        self.started_at
            .map(|t| t.elapsed().as_secs() as u32)
            .unwrap_or(0)
    }

    /// Live sample feed for the visualizer, available while recording
    pub fn sample_tap(&self) -> Option<SampleTap> {
        self.backend.sample_tap()
    }

    /// Request exclusive microphone access and begin recording.
    ///
    /// # Errors
    /// `DeviceBusy` if this session or another holder of the same
    /// `DeviceLock` is already recording; backend errors (`PermissionDenied`,
    /// `DeviceUnavailable`) pass through. On any failure the state remains
    /// `Idle` and no device claim is leaked.
    pub fn start(&mut self) -> Result<()> {
        if !self.state.is_idle() {
            return Err(VoicenoteError::DeviceBusy(
                "session already recording".into(),
            ));
        }

        let claim = self
            .lock
            .try_claim()
            .ok_or_else(|| VoicenoteError::DeviceBusy("microphone held by another session".into()))?;

        let (tx, rx) = unbounded();
        // Claim drops (and releases) if the backend cannot open the device
        self.backend.open(tx)?;

        self.claim = Some(claim);
        self.events = Some(rx);
        self.chunks.clear();
        self.started_at = Some(Instant::now());
        self.state = SessionState::Recording;

        info!("Capture session started");
        Ok(())
    }

    /// Drain chunk events delivered since the last poll.
    ///
    /// Called from the frame loop while recording; a no-op otherwise.
    pub fn poll(&mut self) {
        if !self.state.is_recording() {
            return;
        }
        if let Some(events) = &self.events {
            while let Ok(event) = events.try_recv() {
                match event {
                    RecorderEvent::Chunk(chunk) => {
                        debug!("Buffered chunk of {} bytes", chunk.len());
                        self.chunks.push(chunk);
                    }
                    RecorderEvent::Finalized => {
                        warn!("Unexpected finalized marker while recording");
                    }
                }
            }
        }
    }

    /// Stop recording and assemble the compressed recording.
    ///
    /// Waits for the backend's `Finalized` marker so trailing chunks are
    /// never lost. Idempotent: returns `Ok(None)` when not recording.
    pub fn stop(&mut self) -> Result<Option<CompressedRecording>> {
        if !self.state.is_recording() {
            return Ok(None);
        }
        self.state = SessionState::Stopping;

        let finalize_result = self.backend.finalize();

        let mut finalized = false;
        if let Some(events) = self.events.take() {
            let deadline = Instant::now() + FINALIZE_TIMEOUT;
            loop {
                match events.recv_deadline(deadline) {
                    Ok(RecorderEvent::Chunk(chunk)) => self.chunks.push(chunk),
                    Ok(RecorderEvent::Finalized) => {
                        finalized = true;
                        break;
                    }
                    Err(_) => break,
                }
            }
        }

        let elapsed = self.elapsed_seconds();

        // Release the device on every exit path, before error propagation
        self.claim.take();
        self.state = SessionState::Idle;
        self.started_at = None;

        finalize_result?;
        if !finalized {
            self.chunks.clear();
            return Err(VoicenoteError::ChannelError(
                "recorder never confirmed finalization".into(),
            ));
        }

        let total: usize = self.chunks.iter().map(|c| c.len()).sum();
        let mut bytes = Vec::with_capacity(total);
        for chunk in self.chunks.drain(..) {
            bytes.extend_from_slice(&chunk.bytes);
        }

        let recording = CompressedRecording::new(bytes, self.backend.mime_type(), elapsed);
        info!(
            "Capture session stopped: {} bytes, {} s",
            recording.len(),
            recording.elapsed_seconds
        );
        Ok(Some(recording))
    }

    /// Abort the recording and discard everything buffered.
    ///
    /// Idempotent: calling while idle is a no-op, not an error.
    pub fn cancel(&mut self) {
        if self.state.is_idle() {
            return;
        }

        self.backend.abort();
        self.chunks.clear();
        self.events = None;
        self.claim.take();
        self.started_at = None;
        self.state = SessionState::Idle;

        info!("Capture session cancelled");
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        self.cancel();
    }
}
