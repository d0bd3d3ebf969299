pub mod coordinator;
pub mod sink;
pub mod waveform;

pub use coordinator::PlaybackCoordinator;
#[cfg(feature = "audio-io")]
pub use sink::RodioSink;
pub use sink::{NullSink, PlaybackSink};
pub use waveform::{
    decorative_bars, MediaEvent, PlaybackPhase, PlaybackState, PlaybackWaveform, BAR_COUNT,
};
