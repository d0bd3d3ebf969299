//! Live spectrum bar state for the recording visualization
//!
//! A fixed set of bar heights animated from the analyzer's magnitude bins.
//! The render loop calls `tick` once per display frame while recording;
//! `start`/`stop` bind the visualizer's lifecycle to the capture session so
//! no ticks take effect after the stream is torn down.
//!
//! The circular read-offset makes the bars "flow" left to right. This is a
//! cosmetic effect, not spectral semantics: each bar samples a rotating bin,
//! not a fixed frequency band.

use crate::audio::SampleTap;
use crate::visualize::analyzer::SpectrumAnalyzer;
use tracing::debug;

/// Exponential smoothing factor between displayed and target heights
pub const SMOOTHING_ALPHA: f32 = 0.25;

/// Default number of on-screen bars
pub const DEFAULT_BAR_COUNT: usize = 32;

pub struct LiveSpectrum {
    analyzer: SpectrumAnalyzer,
    tap: Option<SampleTap>,
    bars: Vec<f32>,
    offset: usize,
}

impl LiveSpectrum {
    pub fn new(bar_count: usize) -> Self {
        Self {
            analyzer: SpectrumAnalyzer::new(),
            tap: None,
            bars: vec![0.0; bar_count],
            offset: 0,
        }
    }

    /// Whether a live stream is attached
    pub fn is_active(&self) -> bool {
        self.tap.is_some()
    }

    /// Current displayed bar heights
    pub fn bars(&self) -> &[f32] {
        &self.bars
    }

    /// Attach to the live microphone stream; resets all bars to zero
    pub fn start(&mut self, tap: SampleTap) {
        self.analyzer.reset();
        self.bars.fill(0.0);
        self.offset = 0;
        self.tap = Some(tap);
        debug!("Live spectrum attached");
    }

    /// Detach from the stream and release the analyzer state.
    ///
    /// After this, `tick` returns the frozen bars without computing; leaving
    /// the analyzer subscribed past stream teardown would leak the tap.
    pub fn stop(&mut self) {
        if self.tap.take().is_some() {
            self.analyzer.reset();
            debug!("Live spectrum detached");
        }
    }

    /// One render-tick update: drain fresh samples, recompute bins, and
    /// smooth each bar toward its target height. Exactly one computation per
    /// invocation; returns the displayed heights bounded by `canvas_height`.
    pub fn tick(&mut self, canvas_height: f32) -> &[f32] {
        let Some(tap) = &self.tap else {
            return &self.bars;
        };

        let fresh = tap.drain();
        self.analyzer.feed(&fresh);
        let bins = self.analyzer.bins();
        Self::advance(&mut self.bars, &mut self.offset, bins, canvas_height);
        &self.bars
    }

    fn advance(bars: &mut [f32], offset: &mut usize, bins: &[u8], canvas_height: f32) {
        if bins.is_empty() || !canvas_height.is_finite() || canvas_height <= 0.0 {
            return;
        }

        for (i, bar) in bars.iter_mut().enumerate() {
            let magnitude = bins[(i + *offset) % bins.len()];
            let target = magnitude as f32 / 255.0 * canvas_height;
            *bar += (target - *bar) * SMOOTHING_ALPHA;
            *bar = bar.clamp(0.0, canvas_height);
        }

        *offset = (*offset + 1) % bins.len();
    }
}

impl Default for LiveSpectrum {
    fn default() -> Self {
        Self::new(DEFAULT_BAR_COUNT)
    }
}
