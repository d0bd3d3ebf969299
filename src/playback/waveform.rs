//! Per-message playback state and decorative waveform
//!
//! One `PlaybackWaveform` wraps one playback sink and its phase machine:
//! `Idle -> Playing <-> Paused -> Ended -> Idle`. Transitions come from user
//! activation (click, Enter/Space) or from the sink's own lifecycle events.
//! The visual bars are a fixed per-index pattern, not sample amplitudes; the
//! widget clips a "played" overlay to the progress fraction.

use crate::playback::coordinator::PlaybackCoordinator;
use crate::playback::sink::PlaybackSink;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

/// Number of decorative bars per message
pub const BAR_COUNT: usize = 28;

/// Playback phase machine
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PlaybackPhase {
    /// Loaded, never played
    #[default]
    Idle,
    /// Audibly playing
    Playing,
    /// Paused mid-way
    Paused,
    /// Played to the end; next toggle restarts
    Ended,
}

/// Observable playback state for one message
#[derive(Clone, Copy, Debug, Default)]
pub struct PlaybackState {
    /// Current position in seconds
    pub position: f32,
    /// Known duration in seconds; 0 until metadata or a hint arrives
    pub duration: f32,
    pub phase: PlaybackPhase,
}

impl PlaybackState {
    pub fn is_playing(&self) -> bool {
        self.phase == PlaybackPhase::Playing
    }

    /// Played fraction in [0, 1]; zero or unknown duration yields 0, never
    /// NaN or a division by zero.
    pub fn progress(&self) -> f32 {
        if !self.duration.is_finite() || self.duration <= 0.0 {
            return 0.0;
        }
        (self.position / self.duration).clamp(0.0, 1.0)
    }
}

/// Lifecycle notifications from the underlying playback element
#[derive(Debug, Clone)]
pub enum MediaEvent {
    /// Real duration metadata became available
    Loaded { duration: f32 },
    /// Position advanced
    TimeUpdate { position: f32 },
    /// Source played to the end
    Ended,
    /// Output error (autoplay rejection, unsupported codec)
    Error(String),
}

/// Mutable playback core shared with the coordinator
pub(crate) struct PlayerCore {
    pub(crate) state: PlaybackState,
    pub(crate) metadata_loaded: bool,
    pub(crate) sink: Box<dyn PlaybackSink>,
}

impl PlayerCore {
    pub(crate) fn play(&mut self) {
        if let Err(e) = self.sink.play() {
            // Revert the toggle; the user can try again
            warn!("Playback failure: {}", e);
            self.state.phase = PlaybackPhase::Paused;
            return;
        }
        self.state.phase = PlaybackPhase::Playing;
    }

    pub(crate) fn pause(&mut self) {
        self.sink.pause();
        self.state.phase = PlaybackPhase::Paused;
    }

    pub(crate) fn restart(&mut self) {
        if let Err(e) = self.sink.seek(0.0) {
            warn!("Playback failure: {}", e);
        }
        self.state.position = 0.0;
        self.play();
    }
}

/// Playback control and waveform data for one recorded or uploaded message
pub struct PlaybackWaveform {
    id: Uuid,
    core: Arc<Mutex<PlayerCore>>,
    coordinator: PlaybackCoordinator,
    bars: Vec<f32>,
}

impl PlaybackWaveform {
    /// Wrap artifact bytes in a playback instance registered with the
    /// coordinator. A sink that cannot load the bytes is logged, not fatal;
    /// the instance stays usable with hint-based display.
    pub fn new(
        coordinator: &PlaybackCoordinator,
        mut sink: Box<dyn PlaybackSink>,
        bytes: &[u8],
        mime_type: &str,
    ) -> Self {
        let mut state = PlaybackState::default();
        let mut metadata_loaded = false;

        match sink.load(bytes, mime_type) {
            Ok(Some(duration)) if duration.is_finite() && duration > 0.0 => {
                state.duration = duration;
                metadata_loaded = true;
            }
            Ok(_) => {}
            Err(e) => warn!("Playback failure: {}", e),
        }

        let core = Arc::new(Mutex::new(PlayerCore {
            state,
            metadata_loaded,
            sink,
        }));

        let id = Uuid::new_v4();
        coordinator.register(id, Arc::downgrade(&core));

        Self {
            id,
            core,
            coordinator: coordinator.clone(),
            bars: decorative_bars(BAR_COUNT),
        }
    }

    /// Display duration to use until the sink reports real metadata
    /// (e.g. the elapsed seconds of the recording just made).
    pub fn with_duration_hint(self, seconds: f32) -> Self {
        {
            let mut core = self.core.lock();
            if !core.metadata_loaded && seconds.is_finite() && seconds > 0.0 {
                core.state.duration = seconds;
            }
        }
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> PlaybackState {
        self.core.lock().state
    }

    pub fn is_playing(&self) -> bool {
        self.state().is_playing()
    }

    pub fn progress(&self) -> f32 {
        self.state().progress()
    }

    /// Normalized decorative bar heights in (0, 1]
    pub fn bar_heights(&self) -> &[f32] {
        &self.bars
    }

    /// Play if paused or idle, pause if playing. All other playing
    /// instances are paused first, under the coordinator's lock.
    pub fn toggle(&self) {
        self.coordinator.toggle(self.id, &self.core);
    }

    /// Jump to a played fraction in [0, 1]
    pub fn seek(&self, fraction: f32) {
        let mut core = self.core.lock();
        let duration = core.state.duration;
        if !duration.is_finite() || duration <= 0.0 {
            return;
        }

        let position = fraction.clamp(0.0, 1.0) * duration;
        if let Err(e) = core.sink.seek(position) {
            warn!("Playback failure: {}", e);
            return;
        }
        core.state.position = position;
        if core.state.phase == PlaybackPhase::Ended {
            core.state.phase = PlaybackPhase::Paused;
        }
    }

    /// Apply a lifecycle notification from the playback element
    pub fn on_event(&self, event: MediaEvent) {
        let mut core = self.core.lock();
        match event {
            MediaEvent::Loaded { duration } => {
                if duration.is_finite() && duration > 0.0 {
                    // Real metadata takes precedence over the hint
                    core.metadata_loaded = true;
                    core.state.duration = duration;
                }
            }
            MediaEvent::TimeUpdate { position } => {
                core.state.position = position.max(0.0);
            }
            MediaEvent::Ended => {
                core.state.position = core.state.duration;
                core.state.phase = PlaybackPhase::Ended;
            }
            MediaEvent::Error(message) => {
                warn!("Playback failure: {}", message);
                core.state.phase = PlaybackPhase::Paused;
            }
        }
    }

    /// Poll the sink once per frame while playing
    pub fn refresh(&self) {
        let mut core = self.core.lock();
        if core.state.phase != PlaybackPhase::Playing {
            return;
        }
        core.state.position = core.sink.position();
        if core.sink.is_finished() {
            core.state.position = core.state.duration;
            core.state.phase = PlaybackPhase::Ended;
        }
    }
}

impl Drop for PlaybackWaveform {
    fn drop(&mut self) {
        self.coordinator.unregister(self.id);
    }
}

/// Fixed per-index bar pattern shared by every message.
///
/// Deliberately not derived from sample data; the waveform is decorative.
pub fn decorative_bars(count: usize) -> Vec<f32> {
    (0..count)
        .map(|i| {
            let t = i as f32;
            let wave = (t * 0.9).sin() * (t * 0.37 + 1.3).cos();
            0.25 + 0.75 * wave.abs()
        })
        .collect()
}
