pub mod record_button;
pub mod spectrum_view;
pub mod waveform_view;

pub use record_button::{ElapsedLabel, RecordButton};
pub use spectrum_view::SpectrumView;
pub use waveform_view::WaveformView;
