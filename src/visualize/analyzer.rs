//! Frequency analysis for the live spectrum display
//!
//! Maintains a rolling Hann-windowed sample window and produces byte
//! magnitude bins (0-255) from a planned real FFT, reusing the transform's
//! scratch buffers across ticks.

use realfft::num_complex::Complex;
use realfft::{RealFftPlanner, RealToComplex};
use std::sync::Arc;
use tracing::error;

/// Transform length; one bin per `FFT_SIZE / 2` frequency bands
pub const FFT_SIZE: usize = 1024;

/// dB range mapped onto the 0-255 bin scale
const MIN_DB: f32 = -100.0;
const MAX_DB: f32 = -30.0;

pub struct SpectrumAnalyzer {
    fft: Arc<dyn RealToComplex<f32>>,
    window: Vec<f32>,
    hann: Vec<f32>,
    input: Vec<f32>,
    spectrum: Vec<Complex<f32>>,
    scratch: Vec<Complex<f32>>,
    bins: Vec<u8>,
}

impl SpectrumAnalyzer {
    pub fn new() -> Self {
        let mut planner = RealFftPlanner::new();
        let fft = planner.plan_fft_forward(FFT_SIZE);
        let input = fft.make_input_vec();
        let spectrum = fft.make_output_vec();
        let scratch = fft.make_scratch_vec();

        let hann: Vec<f32> = (0..FFT_SIZE)
            .map(|n| {
                let phase = 2.0 * std::f32::consts::PI * n as f32 / (FFT_SIZE - 1) as f32;
                0.5 * (1.0 - phase.cos())
            })
            .collect();

        Self {
            fft,
            window: vec![0.0; FFT_SIZE],
            hann,
            input,
            spectrum,
            scratch,
            bins: vec![0; FFT_SIZE / 2],
        }
    }

    pub fn bin_count(&self) -> usize {
        self.bins.len()
    }

    /// Append fresh samples, keeping the most recent `FFT_SIZE`
    pub fn feed(&mut self, samples: &[f32]) {
        let n = samples.len();
        if n >= FFT_SIZE {
            self.window.copy_from_slice(&samples[n - FFT_SIZE..]);
        } else if n > 0 {
            self.window.copy_within(n.., 0);
            self.window[FFT_SIZE - n..].copy_from_slice(samples);
        }
    }

    /// Current magnitude bins, one computation per call
    pub fn bins(&mut self) -> &[u8] {
        for (dst, (sample, coeff)) in self
            .input
            .iter_mut()
            .zip(self.window.iter().zip(self.hann.iter()))
        {
            *dst = sample * coeff;
        }

        if let Err(e) =
            self.fft
                .process_with_scratch(&mut self.input, &mut self.spectrum, &mut self.scratch)
        {
            // Lengths are fixed at construction; keep the previous bins
            error!("FFT failed: {}", e);
            return &self.bins;
        }

        for (bin, value) in self.bins.iter_mut().zip(self.spectrum.iter().skip(1)) {
            let magnitude = value.norm() * (2.0 / FFT_SIZE as f32);
            let db = 20.0 * magnitude.max(1e-10).log10();
            let scaled = (db - MIN_DB) / (MAX_DB - MIN_DB);
            *bin = (scaled.clamp(0.0, 1.0) * 255.0) as u8;
        }

        &self.bins
    }

    /// Forget everything buffered (used on stream teardown)
    pub fn reset(&mut self) {
        self.window.fill(0.0);
        self.bins.fill(0);
    }
}

impl Default for SpectrumAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_silence_is_all_zero_bins() {
        let mut analyzer = SpectrumAnalyzer::new();
        analyzer.feed(&vec![0.0; FFT_SIZE]);
        assert!(analyzer.bins().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_tone_lights_up_bins() {
        let mut analyzer = SpectrumAnalyzer::new();
        // Loud tone near bin 64 of a 1024-point transform
        let samples: Vec<f32> = (0..FFT_SIZE)
            .map(|i| (2.0 * std::f32::consts::PI * 64.0 * i as f32 / FFT_SIZE as f32).sin() * 0.9)
            .collect();
        analyzer.feed(&samples);

        let bins = analyzer.bins();
        assert_eq!(bins.len(), FFT_SIZE / 2);
        assert!(bins.iter().any(|&b| b > 100), "tone produced no energy");
    }

    #[test]
    fn test_feed_keeps_most_recent_window() {
        let mut analyzer = SpectrumAnalyzer::new();
        analyzer.feed(&vec![0.9; FFT_SIZE]);
        // Overwrite with silence in two partial feeds
        analyzer.feed(&vec![0.0; FFT_SIZE / 2]);
        analyzer.feed(&vec![0.0; FFT_SIZE / 2]);
        assert!(analyzer.bins().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_reset_clears_bins() {
        let mut analyzer = SpectrumAnalyzer::new();
        analyzer.feed(&vec![0.9; FFT_SIZE]);
        let _ = analyzer.bins();
        analyzer.reset();
        assert!(analyzer.bins().iter().all(|&b| b == 0));
    }
}
