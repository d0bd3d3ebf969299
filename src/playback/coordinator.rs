//! Shared playback coordinator
//!
//! Every `PlaybackWaveform` registers here. Toggling runs entirely under the
//! coordinator's lock: all other playing instances are paused strictly
//! before the target starts, so at most one message is audible at a time
//! without scanning the page for stray players.

use crate::playback::waveform::{PlaybackPhase, PlayerCore};
use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use uuid::Uuid;

#[derive(Clone, Default)]
pub struct PlaybackCoordinator {
    inner: Arc<Mutex<Registry>>,
}

#[derive(Default)]
struct Registry {
    players: Vec<(Uuid, Weak<Mutex<PlayerCore>>)>,
}

impl PlaybackCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn register(&self, id: Uuid, core: Weak<Mutex<PlayerCore>>) {
        let mut inner = self.inner.lock();
        inner.players.retain(|(_, weak)| weak.strong_count() > 0);
        inner.players.push((id, core));
    }

    pub(crate) fn unregister(&self, id: Uuid) {
        self.inner.lock().players.retain(|(other, _)| *other != id);
    }

    /// Toggle one instance, pausing every other playing instance first.
    /// Serialized on the registry lock, so two simultaneous toggles cannot
    /// both end up playing.
    pub(crate) fn toggle(&self, id: Uuid, core: &Arc<Mutex<PlayerCore>>) {
        let inner = self.inner.lock();

        for (other_id, weak) in &inner.players {
            if *other_id == id {
                continue;
            }
            if let Some(other) = weak.upgrade() {
                let mut other = other.lock();
                if other.state.phase == PlaybackPhase::Playing {
                    other.pause();
                }
            }
        }

        let mut core = core.lock();
        match core.state.phase {
            PlaybackPhase::Playing => core.pause(),
            PlaybackPhase::Ended => core.restart(),
            PlaybackPhase::Idle | PlaybackPhase::Paused => core.play(),
        }
    }

    /// Pause every registered instance (e.g. on navigation away)
    pub fn pause_all(&self) {
        let inner = self.inner.lock();
        for (_, weak) in &inner.players {
            if let Some(core) = weak.upgrade() {
                let mut core = core.lock();
                if core.state.phase == PlaybackPhase::Playing {
                    core.pause();
                }
            }
        }
    }

    /// Number of instances currently playing
    pub fn playing_count(&self) -> usize {
        let inner = self.inner.lock();
        inner
            .players
            .iter()
            .filter_map(|(_, weak)| weak.upgrade())
            .filter(|core| core.lock().state.phase == PlaybackPhase::Playing)
            .count()
    }

    /// Number of registered (live) instances
    pub fn registered_count(&self) -> usize {
        let inner = self.inner.lock();
        inner
            .players
            .iter()
            .filter(|(_, weak)| weak.strong_count() > 0)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playback::sink::NullSink;
    use crate::playback::waveform::PlaybackWaveform;

    fn player(coordinator: &PlaybackCoordinator) -> PlaybackWaveform {
        PlaybackWaveform::new(
            coordinator,
            Box::new(NullSink::new().with_duration(5.0)),
            &[0u8; 16],
            "audio/wav",
        )
    }

    #[test]
    fn test_second_play_pauses_first() {
        let coordinator = PlaybackCoordinator::new();
        let a = player(&coordinator);
        let b = player(&coordinator);

        a.toggle();
        assert!(a.is_playing());

        b.toggle();
        assert!(!a.is_playing(), "first instance must be paused");
        assert!(b.is_playing());
        assert_eq!(coordinator.playing_count(), 1);
    }

    #[test]
    fn test_toggle_own_instance_only_pauses_it() {
        let coordinator = PlaybackCoordinator::new();
        let a = player(&coordinator);

        a.toggle();
        a.toggle();
        assert_eq!(coordinator.playing_count(), 0);
    }

    #[test]
    fn test_pause_all() {
        let coordinator = PlaybackCoordinator::new();
        let a = player(&coordinator);
        let _b = player(&coordinator);

        a.toggle();
        coordinator.pause_all();
        assert_eq!(coordinator.playing_count(), 0);
    }

    #[test]
    fn test_dropped_instance_unregisters() {
        let coordinator = PlaybackCoordinator::new();
        let a = player(&coordinator);
        {
            let _b = player(&coordinator);
            assert_eq!(coordinator.registered_count(), 2);
        }
        assert_eq!(coordinator.registered_count(), 1);

        // Toggling after a peer dropped must not panic on stale entries
        a.toggle();
        assert_eq!(coordinator.playing_count(), 1);
    }
}
