//! Pure transcoding between compressed recordings and canonical WAV
//!
//! `decode` parses a compressed container into per-channel float samples;
//! `encode_wav` writes the fixed RIFF/WAVE layout handed to the upload
//! boundary. Both are stateless; all screens share this one implementation
//! so the byte layout holds uniformly.

use crate::audio::types::{CanonicalWavArtifact, CompressedRecording, DecodedAudioBuffer};
use crate::{Result, VoicenoteError};
use hound::{SampleFormat, WavSpec, WavWriter};
use std::io::Cursor;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, warn};

/// Sample rate assumed for degenerate (empty) recordings
const FALLBACK_SAMPLE_RATE: u32 = 48_000;

/// Decode a compressed recording into per-channel float samples.
///
/// An empty payload decodes to a valid zero-frame buffer. Raw PCM payloads
/// (the `audio/pcm` mime produced by the capture backend) are parsed
/// directly; everything else goes through a symphonia probe. Sources with
/// more than two channels keep the first two.
///
/// # Errors
/// Returns `DecodeFailure` for corrupt or unsupported payloads. Callers
/// recover by falling back to the original bytes; the failure is logged
/// here, never silently swallowed.
pub fn decode(recording: &CompressedRecording) -> Result<DecodedAudioBuffer> {
    if recording.is_empty() {
        debug!("Decoding empty recording as zero-frame buffer");
        return Ok(DecodedAudioBuffer::empty(FALLBACK_SAMPLE_RATE));
    }

    let result = if let Some(params) = PcmParams::from_mime(&recording.mime_type) {
        decode_raw_pcm(&recording.bytes, params)
    } else {
        decode_container(&recording.bytes, &recording.mime_type)
    };

    if let Err(e) = &result {
        warn!("Audio decode failed ({}): {}", recording.mime_type, e);
    }
    result
}

/// Encode decoded samples as a canonical WAV artifact.
///
/// Samples are clamped to [-1.0, 1.0] before scaling, so out-of-range input
/// can never wrap around in the 16-bit output. Interleaving is frame-major.
///
/// # Errors
/// Returns `EncodeFailure` on writer errors; this is not expected for valid
/// decoded input and propagates to the caller.
pub fn encode_wav(decoded: &DecodedAudioBuffer) -> Result<CanonicalWavArtifact> {
    let spec = WavSpec {
        channels: decoded.channel_count(),
        sample_rate: decoded.sample_rate(),
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut bytes = Vec::with_capacity(
        CanonicalWavArtifact::HEADER_LEN
            + decoded.frame_count() * decoded.channel_count() as usize * 2,
    );
    {
        let cursor = Cursor::new(&mut bytes);
        let mut writer = WavWriter::new(cursor, spec)
            .map_err(|e| VoicenoteError::EncodeFailure(format!("failed to create writer: {}", e)))?;

        let channels = decoded.channel_count() as usize;
        for frame in 0..decoded.frame_count() {
            for ch in 0..channels {
                let sample = decoded.channel(ch)[frame];
                let quantized = (sample.clamp(-1.0, 1.0) * 32767.0).round() as i16;
                writer.write_sample(quantized).map_err(|e| {
                    VoicenoteError::EncodeFailure(format!("failed to write sample: {}", e))
                })?;
            }
        }

        writer
            .finalize()
            .map_err(|e| VoicenoteError::EncodeFailure(format!("failed to finalize: {}", e)))?;
    }

    debug!(
        "Encoded {} frames x {} channel(s) at {} Hz ({} bytes)",
        decoded.frame_count(),
        decoded.channel_count(),
        decoded.sample_rate(),
        bytes.len()
    );

    Ok(CanonicalWavArtifact::new(bytes))
}

/// Decode then encode: compressed recording to canonical WAV
pub fn transcode_to_wav(recording: &CompressedRecording) -> Result<CanonicalWavArtifact> {
    encode_wav(&decode(recording)?)
}

/// Parameters of a raw `audio/pcm` payload, parsed from the mime type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PcmParams {
    sample_rate: u32,
    channels: u16,
    bits: u16,
}

impl PcmParams {
    /// Parse `audio/pcm;rate=48000;channels=1;bits=16`; None for other mimes
    fn from_mime(mime_type: &str) -> Option<Self> {
        let mut parts = mime_type.split(';').map(str::trim);
        if parts.next()? != "audio/pcm" {
            return None;
        }

        let mut params = Self {
            sample_rate: FALLBACK_SAMPLE_RATE,
            channels: 1,
            bits: 16,
        };
        for part in parts {
            let mut kv = part.splitn(2, '=');
            let (key, value) = (kv.next().unwrap_or(""), kv.next().unwrap_or(""));
            match key {
                "rate" => params.sample_rate = value.parse().unwrap_or(params.sample_rate),
                "channels" => params.channels = value.parse().unwrap_or(params.channels),
                "bits" => params.bits = value.parse().unwrap_or(params.bits),
                _ => {}
            }
        }
        Some(params)
    }
}

fn decode_raw_pcm(bytes: &[u8], params: PcmParams) -> Result<DecodedAudioBuffer> {
    if params.bits != 16 {
        return Err(VoicenoteError::DecodeFailure(format!(
            "unsupported pcm bit depth: {}",
            params.bits
        )));
    }
    if params.channels == 0 || params.channels > 2 {
        return Err(VoicenoteError::DecodeFailure(format!(
            "unsupported pcm channel count: {}",
            params.channels
        )));
    }

    let channels = params.channels as usize;
    let frame_bytes = channels * 2;
    if bytes.len() % frame_bytes != 0 {
        return Err(VoicenoteError::DecodeFailure(format!(
            "truncated pcm payload: {} bytes is not a whole number of frames",
            bytes.len()
        )));
    }

    let frame_count = bytes.len() / frame_bytes;
    let mut planes: Vec<Vec<f32>> = vec![Vec::with_capacity(frame_count); channels];
    for frame in bytes.chunks_exact(frame_bytes) {
        for (ch, sample) in frame.chunks_exact(2).enumerate() {
            let value = i16::from_le_bytes([sample[0], sample[1]]);
            planes[ch].push(value as f32 / 32768.0);
        }
    }

    DecodedAudioBuffer::from_channels(params.sample_rate, planes)
}

fn decode_container(bytes: &[u8], mime_type: &str) -> Result<DecodedAudioBuffer> {
    let mss = MediaSourceStream::new(Box::new(Cursor::new(bytes.to_vec())), Default::default());

    let mut hint = Hint::new();
    hint.mime_type(mime_type);

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| VoicenoteError::DecodeFailure(format!("unrecognized container: {}", e)))?;

    let mut format = probed.format;
    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| VoicenoteError::DecodeFailure("no supported audio track".into()))?;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| VoicenoteError::DecodeFailure(format!("unsupported codec: {}", e)))?;

    let track_id = track.id;
    let sample_rate = track
        .codec_params
        .sample_rate
        .ok_or_else(|| VoicenoteError::DecodeFailure("unknown sample rate".into()))?;

    let mut planes: Vec<Vec<f32>> = Vec::new();
    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            // End of stream
            Err(SymphoniaError::IoError(_)) => break,
            Err(SymphoniaError::ResetRequired) => continue,
            Err(e) => {
                return Err(VoicenoteError::DecodeFailure(format!(
                    "packet read failed: {}",
                    e
                )))
            }
        };

        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => {
                let spec = *decoded.spec();
                let mut sample_buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
                sample_buf.copy_interleaved_ref(decoded);

                let src_channels = spec.channels.count();
                let kept = src_channels.min(2);
                if planes.is_empty() {
                    planes = vec![Vec::new(); kept];
                }

                for frame in sample_buf.samples().chunks_exact(src_channels) {
                    for ch in 0..kept {
                        planes[ch].push(frame[ch]);
                    }
                }
            }
            // Skip undecodable packets, keep going
            Err(SymphoniaError::DecodeError(_)) => (),
            Err(e) => {
                return Err(VoicenoteError::DecodeFailure(format!(
                    "decode failed: {}",
                    e
                )))
            }
        }
    }

    if planes.is_empty() {
        return Err(VoicenoteError::DecodeFailure(
            "container held no decodable audio".into(),
        ));
    }

    DecodedAudioBuffer::from_channels(sample_rate, planes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    fn sine(sample_rate: u32, frequency: f32, frames: usize) -> Vec<f32> {
        (0..frames)
            .map(|i| (2.0 * PI * frequency * i as f32 / sample_rate as f32).sin() * 0.5)
            .collect()
    }

    fn read_u32(bytes: &[u8], offset: usize) -> u32 {
        u32::from_le_bytes(bytes[offset..offset + 4].try_into().unwrap())
    }

    fn read_u16(bytes: &[u8], offset: usize) -> u16 {
        u16::from_le_bytes(bytes[offset..offset + 2].try_into().unwrap())
    }

    #[test]
    fn test_wav_length_formula() {
        for &channels in &[1usize, 2] {
            for &rate in &[8000u32, 16000, 22050, 44100, 48000] {
                let frames = 333;
                let planes = vec![sine(rate, 440.0, frames); channels];
                let decoded = DecodedAudioBuffer::from_channels(rate, planes).unwrap();
                let wav = encode_wav(&decoded).unwrap();
                assert_eq!(
                    wav.len(),
                    44 + frames * channels * 2,
                    "length mismatch for {} ch at {} Hz",
                    channels,
                    rate
                );
            }
        }
    }

    #[test]
    fn test_wav_header_layout() {
        let rate = 44100;
        let frames = 100;
        let decoded = DecodedAudioBuffer::from_channels(
            rate,
            vec![sine(rate, 440.0, frames), sine(rate, 880.0, frames)],
        )
        .unwrap();
        let wav = encode_wav(&decoded).unwrap();
        let bytes = wav.as_bytes();

        assert_eq!(&bytes[0..4], b"RIFF");
        assert_eq!(read_u32(bytes, 4) as usize, bytes.len() - 8);
        assert_eq!(&bytes[8..12], b"WAVE");
        assert_eq!(&bytes[12..16], b"fmt ");
        assert_eq!(read_u32(bytes, 16), 16);
        assert_eq!(read_u16(bytes, 20), 1); // PCM
        assert_eq!(read_u16(bytes, 22), 2); // channels
        assert_eq!(read_u32(bytes, 24), rate);
        assert_eq!(read_u32(bytes, 28), rate * 2 * 2); // byte rate
        assert_eq!(read_u16(bytes, 32), 4); // block align
        assert_eq!(read_u16(bytes, 34), 16); // bits per sample
        assert_eq!(&bytes[36..40], b"data");
        assert_eq!(read_u32(bytes, 40) as usize, frames * 2 * 2);
    }

    #[test]
    fn test_clamping_prevents_wraparound() {
        let decoded = DecodedAudioBuffer::from_channels(
            16000,
            vec![vec![2.0, -3.5, 1.0, -1.0, 0.0, f32::MAX, f32::MIN]],
        )
        .unwrap();
        let wav = encode_wav(&decoded).unwrap();
        let data = &wav.as_bytes()[44..];

        let samples: Vec<i16> = data
            .chunks_exact(2)
            .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
            .collect();
        assert_eq!(samples[0], 32767);
        assert_eq!(samples[1], -32767);
        assert_eq!(samples[2], 32767);
        assert_eq!(samples[3], -32767);
        assert_eq!(samples[4], 0);
        assert_eq!(samples[5], 32767);
        assert_eq!(samples[6], -32767);
    }

    #[test]
    fn test_round_trip_within_quantization() {
        let rate = 16000;
        let original = sine(rate, 440.0, 1600);
        let decoded = DecodedAudioBuffer::from_channels(rate, vec![original.clone()]).unwrap();
        let wav = encode_wav(&decoded).unwrap();

        let recording = CompressedRecording::new(wav.into_bytes(), "audio/wav".into(), 0);
        let round = decode(&recording).unwrap();

        assert_eq!(round.sample_rate(), rate);
        assert_eq!(round.channel_count(), 1);
        assert_eq!(round.frame_count(), original.len());
        for (a, b) in original.iter().zip(round.channel(0)) {
            assert!(
                (a - b).abs() < 0.001,
                "sample drifted beyond 16-bit tolerance: {} vs {}",
                a,
                b
            );
        }
    }

    #[test]
    fn test_stereo_interleave_frame_major() {
        let left = vec![0.5, 0.5, 0.5];
        let right = vec![-0.5, -0.5, -0.5];
        let decoded = DecodedAudioBuffer::from_channels(8000, vec![left, right]).unwrap();
        let wav = encode_wav(&decoded).unwrap();
        let data = &wav.as_bytes()[44..];

        // All channels for frame 0, then frame 1, ...
        for frame in data.chunks_exact(4) {
            let l = i16::from_le_bytes([frame[0], frame[1]]);
            let r = i16::from_le_bytes([frame[2], frame[3]]);
            assert!(l > 0);
            assert!(r < 0);
        }
    }

    #[test]
    fn test_empty_recording_degenerate_artifact() {
        let recording = CompressedRecording::new(Vec::new(), "audio/webm;codecs=opus".into(), 3);
        let wav = transcode_to_wav(&recording).unwrap();
        assert_eq!(wav.len(), 44);
        assert_eq!(wav.data_len(), 0);
    }

    #[test]
    fn test_raw_pcm_decode() {
        let samples: Vec<i16> = vec![0, 16384, -16384, 32767, -32768];
        let bytes: Vec<u8> = samples.iter().flat_map(|s| s.to_le_bytes()).collect();
        let recording = CompressedRecording::new(
            bytes,
            "audio/pcm;rate=16000;channels=1;bits=16".into(),
            1,
        );

        let decoded = decode(&recording).unwrap();
        assert_eq!(decoded.sample_rate(), 16000);
        assert_eq!(decoded.frame_count(), 5);
        assert!((decoded.channel(0)[1] - 0.5).abs() < 0.001);
        assert!((decoded.channel(0)[4] + 1.0).abs() < 0.001);
    }

    #[test]
    fn test_raw_pcm_stereo_deinterleave() {
        // Frames of (1000, -1000)
        let mut bytes = Vec::new();
        for _ in 0..4 {
            bytes.extend(1000i16.to_le_bytes());
            bytes.extend((-1000i16).to_le_bytes());
        }
        let recording = CompressedRecording::new(
            bytes,
            "audio/pcm;rate=48000;channels=2;bits=16".into(),
            1,
        );

        let decoded = decode(&recording).unwrap();
        assert_eq!(decoded.channel_count(), 2);
        assert_eq!(decoded.frame_count(), 4);
        assert!(decoded.channel(0).iter().all(|&s| s > 0.0));
        assert!(decoded.channel(1).iter().all(|&s| s < 0.0));
    }

    #[test]
    fn test_truncated_pcm_is_decode_failure() {
        let recording = CompressedRecording::new(
            vec![0u8, 1, 2],
            "audio/pcm;rate=48000;channels=1;bits=16".into(),
            1,
        );
        assert!(matches!(
            decode(&recording),
            Err(VoicenoteError::DecodeFailure(_))
        ));
    }

    #[test]
    fn test_garbage_container_is_decode_failure() {
        let recording =
            CompressedRecording::new(vec![0xDE, 0xAD, 0xBE, 0xEF], "audio/webm".into(), 1);
        assert!(matches!(
            decode(&recording),
            Err(VoicenoteError::DecodeFailure(_))
        ));
    }

    #[test]
    fn test_pcm_mime_parsing() {
        let params = PcmParams::from_mime("audio/pcm;rate=44100;channels=2;bits=16").unwrap();
        assert_eq!(params.sample_rate, 44100);
        assert_eq!(params.channels, 2);

        // Defaults fill in missing parameters
        let params = PcmParams::from_mime("audio/pcm").unwrap();
        assert_eq!(params.sample_rate, 48000);
        assert_eq!(params.channels, 1);
        assert_eq!(params.bits, 16);

        assert!(PcmParams::from_mime("audio/wav").is_none());
    }
}
