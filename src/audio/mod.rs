pub mod buffer;
pub mod transcoder;
pub mod types;

pub use buffer::SampleTap;
pub use types::{AudioChunk, CanonicalWavArtifact, CompressedRecording, DecodedAudioBuffer};

use crate::Result;
use tracing::info;

/// Self-check of the transcoding pipeline, run at startup
pub fn verify_pipeline() -> Result<()> {
    info!("Verifying audio pipeline...");

    // Encode a short sine and check the canonical layout
    let sample_rate = 16_000;
    let samples: Vec<f32> = (0..sample_rate as usize)
        .map(|i| (i as f32 * 440.0 * 2.0 * std::f32::consts::PI / sample_rate as f32).sin() * 0.5)
        .collect();
    let frames = samples.len();
    let decoded = DecodedAudioBuffer::from_channels(sample_rate, vec![samples])?;
    let wav = transcoder::encode_wav(&decoded)?;
    assert_eq!(wav.len(), 44 + frames * 2);

    // Decode it back
    let recording = CompressedRecording::new(wav.into_bytes(), "audio/wav".into(), 1);
    let round = transcoder::decode(&recording)?;
    assert_eq!(round.frame_count(), frames);

    info!("Audio pipeline verified");
    Ok(())
}
