//! Audio primitives used by the turn pipeline.
//!
//! Inbound audio is 16-bit little-endian mono PCM at the client's capture rate
//! (48 kHz by default). Everything downstream of the turn gate works on
//! [`CanonicalAudio`]: 16 kHz, mono, 16-bit.

pub mod buffer;
pub mod resampler;

pub use buffer::AudioFrameBuffer;
pub use resampler::{AudioResampler, to_canonical};

use std::io::Cursor;
use std::time::Duration;

/// Sample rate every turn is converted to before gating and transcription.
pub const CANONICAL_SAMPLE_RATE: u32 = 16_000;

/// Errors raised while decoding or converting audio.
#[derive(Debug, thiserror::Error)]
pub enum AudioError {
    #[error("PCM payload has an odd number of bytes ({0})")]
    OddByteCount(usize),
    #[error("Invalid sample rate: {0}")]
    InvalidSampleRate(u32),
    #[error("Resampler construction failed: {0}")]
    Construction(String),
    #[error("Resampling failed: {0}")]
    Resample(String),
    #[error("WAV encoding failed: {0}")]
    Wav(String),
}

/// A turn's audio after resampling: mono 16-bit samples at 16 kHz.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalAudio {
    pub samples: Vec<i16>,
    pub sample_rate: u32,
}

impl CanonicalAudio {
    pub fn new(samples: Vec<i16>) -> Self {
        Self {
            samples,
            sample_rate: CANONICAL_SAMPLE_RATE,
        }
    }

    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.samples.len() as f64 / self.sample_rate as f64)
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Encode the samples as a RIFF/WAV file in memory.
    pub fn to_wav_bytes(&self) -> Result<Vec<u8>, AudioError> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };

        let mut cursor = Cursor::new(Vec::with_capacity(44 + self.samples.len() * 2));
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec)
                .map_err(|e| AudioError::Wav(e.to_string()))?;
            for sample in &self.samples {
                writer
                    .write_sample(*sample)
                    .map_err(|e| AudioError::Wav(e.to_string()))?;
            }
            writer
                .finalize()
                .map_err(|e| AudioError::Wav(e.to_string()))?;
        }

        Ok(cursor.into_inner())
    }
}

/// Decode little-endian 16-bit PCM bytes into samples.
pub fn pcm16_from_le_bytes(bytes: &[u8]) -> Result<Vec<i16>, AudioError> {
    if bytes.len() % 2 != 0 {
        return Err(AudioError::OddByteCount(bytes.len()));
    }
    Ok(bytes
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
        .collect())
}
