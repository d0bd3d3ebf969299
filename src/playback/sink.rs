//! Playback output seam
//!
//! `PlaybackWaveform` drives audio through `PlaybackSink` so the phase
//! machine works the same against a real rodio output, a headless build, or
//! a test double. The rodio implementation decodes the artifact bytes in
//! memory and re-appends them when playback is restarted after the end.

use crate::Result;
use parking_lot::Mutex;
use std::sync::Arc;

/// Audio output handle for one message
pub trait PlaybackSink: Send {
    /// Load artifact bytes; returns the real duration when known.
    ///
    /// # Errors
    /// `PlaybackFailure` when the bytes cannot be decoded for playback.
    fn load(&mut self, bytes: &[u8], mime_type: &str) -> Result<Option<f32>>;

    /// Begin or resume audible playback.
    ///
    /// # Errors
    /// `PlaybackFailure` on output errors; the caller reverts to paused.
    fn play(&mut self) -> Result<()>;

    fn pause(&mut self);

    /// Jump to an absolute position in seconds.
    ///
    /// # Errors
    /// `PlaybackFailure` when the source does not support seeking.
    fn seek(&mut self, seconds: f32) -> Result<()>;

    /// Current position in seconds
    fn position(&self) -> f32;

    /// Whether the source has played to its end
    fn is_finished(&self) -> bool;
}

/// State-only sink for headless builds and tests.
///
/// Optionally records `label:action` strings into a shared log, which the
/// concurrency tests use to assert pause-before-play ordering.
pub struct NullSink {
    playing: bool,
    position: f32,
    duration: Option<f32>,
    finished: bool,
    fail_play: bool,
    label: String,
    log: Option<Arc<Mutex<Vec<String>>>>,
}

impl NullSink {
    pub fn new() -> Self {
        Self {
            playing: false,
            position: 0.0,
            duration: None,
            finished: false,
            fail_play: false,
            label: String::new(),
            log: None,
        }
    }

    /// Report this duration from `load`
    pub fn with_duration(mut self, seconds: f32) -> Self {
        self.duration = Some(seconds);
        self
    }

    /// Record play/pause calls into a shared log
    pub fn with_log(mut self, label: &str, log: Arc<Mutex<Vec<String>>>) -> Self {
        self.label = label.to_string();
        self.log = Some(log);
        self
    }

    /// Make `play` fail with `PlaybackFailure`
    pub fn with_failing_play(mut self) -> Self {
        self.fail_play = true;
        self
    }

    fn record(&self, action: &str) {
        if let Some(log) = &self.log {
            log.lock().push(format!("{}:{}", self.label, action));
        }
    }
}

impl Default for NullSink {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaybackSink for NullSink {
    fn load(&mut self, _bytes: &[u8], _mime_type: &str) -> Result<Option<f32>> {
        Ok(self.duration)
    }

    fn play(&mut self) -> Result<()> {
        if self.fail_play {
            return Err(crate::VoicenoteError::PlaybackFailure(
                "autoplay rejected".into(),
            ));
        }
        self.record("play");
        self.playing = true;
        self.finished = false;
        Ok(())
    }

    fn pause(&mut self) {
        self.record("pause");
        self.playing = false;
    }

    fn seek(&mut self, seconds: f32) -> Result<()> {
        self.position = seconds.max(0.0);
        self.finished = false;
        Ok(())
    }

    fn position(&self) -> f32 {
        self.position
    }

    fn is_finished(&self) -> bool {
        self.finished
    }
}

#[cfg(feature = "audio-io")]
pub use rodio_sink::RodioSink;

#[cfg(feature = "audio-io")]
mod rodio_sink {
    use super::PlaybackSink;
    use crate::{Result, VoicenoteError};
    use rodio::{Decoder, OutputStreamHandle, Sink, Source};
    use std::io::Cursor;
    use std::time::Duration;
    use tracing::debug;

    /// rodio-backed playback of an in-memory artifact.
    ///
    /// The caller owns the `OutputStream`; this holds only the stream handle
    /// so the sink stays `Send`.
    pub struct RodioSink {
        sink: Sink,
        bytes: Vec<u8>,
        duration: Option<f32>,
    }

    impl RodioSink {
        pub fn new(handle: &OutputStreamHandle) -> Result<Self> {
            let sink = Sink::try_new(handle).map_err(|e| {
                VoicenoteError::PlaybackFailure(format!("failed to create sink: {}", e))
            })?;
            sink.pause();
            Ok(Self {
                sink,
                bytes: Vec::new(),
                duration: None,
            })
        }

        fn append_decoded(&mut self) -> Result<()> {
            let decoder = Decoder::new(Cursor::new(self.bytes.clone())).map_err(|e| {
                VoicenoteError::PlaybackFailure(format!("undecodable audio: {}", e))
            })?;
            if self.duration.is_none() {
                self.duration = decoder.total_duration().map(|d| d.as_secs_f32());
            }
            self.sink.append(decoder);
            Ok(())
        }
    }

    impl PlaybackSink for RodioSink {
        fn load(&mut self, bytes: &[u8], mime_type: &str) -> Result<Option<f32>> {
            debug!("Loading {} bytes ({}) for playback", bytes.len(), mime_type);
            self.bytes = bytes.to_vec();
            self.duration = None;
            self.append_decoded()?;
            self.sink.pause();
            Ok(self.duration)
        }

        fn play(&mut self) -> Result<()> {
            if self.sink.empty() && !self.bytes.is_empty() {
                // Finished earlier; queue the source again from the start
                self.append_decoded()?;
            }
            self.sink.play();
            Ok(())
        }

        fn pause(&mut self) {
            self.sink.pause();
        }

        fn seek(&mut self, seconds: f32) -> Result<()> {
            if self.sink.empty() && !self.bytes.is_empty() {
                self.append_decoded()?;
                self.sink.pause();
            }
            self.sink
                .try_seek(Duration::from_secs_f32(seconds.max(0.0)))
                .map_err(|e| VoicenoteError::PlaybackFailure(format!("seek failed: {}", e)))
        }

        fn position(&self) -> f32 {
            self.sink.get_pos().as_secs_f32()
        }

        fn is_finished(&self) -> bool {
            self.sink.empty()
        }
    }
}
