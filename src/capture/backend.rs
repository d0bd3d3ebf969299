//! Recorder backend seam for chunked microphone capture
//!
//! `CaptureSession` talks to the recorder through `RecorderBackend`, which
//! delivers opaque encoded chunks followed by a `Finalized` marker once the
//! device has flushed everything. The production backend captures through
//! cpal with automatic mono downmix and feeds the shared `SampleTap` that
//! the live spectrum reads.

use crate::audio::{AudioChunk, SampleTap};
use crate::Result;
use crossbeam_channel::Sender;

/// Events emitted by a recorder backend while a session is open
#[derive(Debug, Clone)]
pub enum RecorderEvent {
    /// An encoded fragment, delivered in order
    Chunk(AudioChunk),
    /// All chunks have been delivered; safe to assemble the recording
    Finalized,
}

/// Chunked audio recorder owned by a capture session
pub trait RecorderBackend {
    /// Acquire the input device and start delivering chunks.
    ///
    /// # Errors
    /// `DeviceUnavailable` when no input device exists, `PermissionDenied`
    /// when the device cannot be opened.
    fn open(&mut self, events: Sender<RecorderEvent>) -> Result<()>;

    /// Stop capturing and flush. The final `Chunk` events and the
    /// `Finalized` marker are delivered on the event channel; the device is
    /// released before this returns.
    fn finalize(&mut self) -> Result<()>;

    /// Release the device without flushing; nothing further is delivered.
    fn abort(&mut self);

    /// Codec identifier of the chunk payload
    fn mime_type(&self) -> String;

    /// Live sample feed for the spectrum visualizer, if this backend has one
    fn sample_tap(&self) -> Option<SampleTap>;
}

#[cfg(feature = "audio-io")]
pub use cpal_backend::CpalBackend;

#[cfg(feature = "audio-io")]
mod cpal_backend {
    use super::{RecorderBackend, RecorderEvent};
    use crate::audio::{AudioChunk, SampleTap};
    use crate::{Result, VoicenoteError};
    use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
    use cpal::{Stream, StreamConfig};
    use crossbeam_channel::Sender;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use tracing::{debug, info, warn};

    /// Bytes accumulated before a chunk is emitted (~170 ms at 48 kHz mono)
    const CHUNK_BYTES: usize = 16 * 1024;

    /// Samples of recent audio kept for the visualizer (~1/3 s at 48 kHz)
    const TAP_CAPACITY: usize = 16 * 1024;

    /// cpal-backed recorder delivering 16-bit little-endian mono PCM chunks.
    ///
    /// Device discovery happens at `open()` time so that missing hardware
    /// and access failures surface on `CaptureSession::start`.
    pub struct CpalBackend {
        stream: Option<Stream>,
        sample_rate: u32,
        tap: SampleTap,
        pending: Arc<Mutex<Vec<u8>>>,
        active: Arc<AtomicBool>,
        events: Option<Sender<RecorderEvent>>,
    }

    impl CpalBackend {
        pub fn new() -> Self {
            Self {
                stream: None,
                sample_rate: 48_000,
                tap: SampleTap::new(TAP_CAPACITY),
                pending: Arc::new(Mutex::new(Vec::new())),
                active: Arc::new(AtomicBool::new(false)),
                events: None,
            }
        }

        pub fn sample_rate(&self) -> u32 {
            self.sample_rate
        }
    }

    impl Default for CpalBackend {
        fn default() -> Self {
            Self::new()
        }
    }

    impl RecorderBackend for CpalBackend {
        fn open(&mut self, events: Sender<RecorderEvent>) -> Result<()> {
            if self.active.load(Ordering::SeqCst) {
                warn!("Recorder already open, ignoring open request");
                return Ok(());
            }

            let host = cpal::default_host();
            let device = host.default_input_device().ok_or_else(|| {
                VoicenoteError::DeviceUnavailable("no input device available".into())
            })?;

            info!(
                "Using input device: {}",
                device.name().unwrap_or_else(|_| "Unknown".to_string())
            );

            let config: StreamConfig = device
                .default_input_config()
                .map_err(|e| {
                    VoicenoteError::DeviceUnavailable(format!(
                        "failed to get input config: {}",
                        e
                    ))
                })?
                .into();

            let channels = config.channels as usize;
            self.sample_rate = config.sample_rate.0;

            let active = Arc::clone(&self.active);
            let tap = self.tap.clone();
            let pending = Arc::clone(&self.pending);
            let chunk_tx = events.clone();

            let err_fn = |err| {
                tracing::error!("Audio input stream error: {}", err);
            };

            let stream = device
                .build_input_stream(
                    &config,
                    move |data: &[f32], _: &cpal::InputCallbackInfo| {
                        if !active.load(Ordering::SeqCst) {
                            return;
                        }

                        // Convert to mono if necessary
                        let samples: Vec<f32> = if channels == 1 {
                            data.to_vec()
                        } else {
                            data.chunks(channels)
                                .map(|frame| frame.iter().sum::<f32>() / channels as f32)
                                .collect()
                        };

                        tap.write(&samples);

                        let mut buf = pending.lock();
                        for &sample in &samples {
                            let quantized = (sample.clamp(-1.0, 1.0) * 32767.0) as i16;
                            buf.extend_from_slice(&quantized.to_le_bytes());
                        }

                        if buf.len() >= CHUNK_BYTES {
                            let bytes = std::mem::take(&mut *buf);
                            drop(buf);
                            if let Err(e) = chunk_tx.send(RecorderEvent::Chunk(AudioChunk::new(bytes)))
                            {
                                warn!("Failed to deliver audio chunk: {}", e);
                            }
                        }
                    },
                    err_fn,
                    None,
                )
                .map_err(|e| match e {
                    cpal::BuildStreamError::DeviceNotAvailable => {
                        VoicenoteError::DeviceUnavailable("input device disappeared".into())
                    }
                    other => VoicenoteError::PermissionDenied(format!(
                        "failed to open input stream: {}",
                        other
                    )),
                })?;

            stream.play().map_err(|e| match e {
                cpal::PlayStreamError::DeviceNotAvailable => {
                    VoicenoteError::DeviceUnavailable("input device disappeared".into())
                }
                other => VoicenoteError::PermissionDenied(format!(
                    "failed to start input stream: {}",
                    other
                )),
            })?;

            self.pending.lock().clear();
            self.tap.clear();
            self.active.store(true, Ordering::SeqCst);
            self.stream = Some(stream);
            self.events = Some(events);

            info!("Audio capture started at {} Hz", self.sample_rate);
            Ok(())
        }

        fn finalize(&mut self) -> Result<()> {
            if !self.active.swap(false, Ordering::SeqCst) {
                return Ok(());
            }

            if let Some(stream) = self.stream.take() {
                drop(stream);
            }

            if let Some(events) = self.events.take() {
                let remainder = std::mem::take(&mut *self.pending.lock());
                if !remainder.is_empty() {
                    debug!("Flushing {} trailing bytes", remainder.len());
                    if let Err(e) = events.send(RecorderEvent::Chunk(AudioChunk::new(remainder))) {
                        warn!("Failed to flush trailing chunk: {}", e);
                    }
                }
                events.send(RecorderEvent::Finalized).map_err(|e| {
                    VoicenoteError::ChannelError(format!(
                        "failed to deliver finalized marker: {}",
                        e
                    ))
                })?;
            }

            info!("Audio capture finalized");
            Ok(())
        }

        fn abort(&mut self) {
            self.active.store(false, Ordering::SeqCst);
            if let Some(stream) = self.stream.take() {
                drop(stream);
            }
            self.pending.lock().clear();
            self.events = None;
            info!("Audio capture aborted");
        }

        fn mime_type(&self) -> String {
            format!(
                "audio/pcm;rate={};channels=1;bits=16",
                self.sample_rate
            )
        }

        fn sample_tap(&self) -> Option<SampleTap> {
            Some(self.tap.clone())
        }
    }

    impl Drop for CpalBackend {
        fn drop(&mut self) {
            self.abort();
        }
    }

}
