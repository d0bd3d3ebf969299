pub mod analyzer;
pub mod spectrum;

pub use analyzer::SpectrumAnalyzer;
pub use spectrum::{LiveSpectrum, DEFAULT_BAR_COUNT, SMOOTHING_ALPHA};
