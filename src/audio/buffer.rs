//! Shared sample tap between the capture callback and the visualizer
//!
//! The microphone callback writes mono samples into the tap; the live
//! spectrum drains everything fresh on each render tick. When full, the
//! oldest samples are dropped so the tap always holds the most recent audio.

use parking_lot::Mutex;
use ringbuf::{traits::*, HeapRb};
use std::sync::Arc;

/// Thread-safe drop-oldest buffer of recent microphone samples.
///
/// Cloning shares the underlying storage, which is how the capture backend
/// and the visualizer see the same stream without owning each other.
#[derive(Clone)]
pub struct SampleTap {
    buffer: Arc<Mutex<HeapRb<f32>>>,
}

impl SampleTap {
    /// Create a tap holding up to `capacity` samples
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: Arc::new(Mutex::new(HeapRb::new(capacity))),
        }
    }

    /// Write samples, dropping the oldest if the tap is full
    pub fn write(&self, samples: &[f32]) {
        let mut buffer = self.buffer.lock();
        for &sample in samples {
            if buffer.try_push(sample).is_err() {
                let _ = buffer.try_pop();
                let _ = buffer.try_push(sample);
            }
        }
    }

    /// Take every buffered sample, oldest first
    pub fn drain(&self) -> Vec<f32> {
        let mut buffer = self.buffer.lock();
        let mut samples = Vec::with_capacity(buffer.occupied_len());
        while let Some(sample) = buffer.try_pop() {
            samples.push(sample);
        }
        samples
    }

    pub fn clear(&self) {
        self.buffer.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.buffer.lock().occupied_len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.buffer.lock().capacity().get()
    }
}
