use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};
use tracing::debug;

use super::{AudioError, CANONICAL_SAMPLE_RATE, CanonicalAudio, pcm16_from_le_bytes};

/// Frames fed to the sinc resampler per call.
const CHUNK_FRAMES: usize = 1024;

/// Mono sinc resampler for converting a whole turn between sample rates.
pub struct AudioResampler {
    resampler: SincFixedIn<f32>,
    input_rate: u32,
    output_rate: u32,
}

impl AudioResampler {
    pub fn new(input_rate: u32, output_rate: u32) -> Result<Self, AudioError> {
        if input_rate == 0 {
            return Err(AudioError::InvalidSampleRate(input_rate));
        }
        if output_rate == 0 {
            return Err(AudioError::InvalidSampleRate(output_rate));
        }

        let params = SincInterpolationParameters {
            sinc_len: 128,
            f_cutoff: 0.95,
            interpolation: SincInterpolationType::Linear,
            oversampling_factor: 128,
            window: WindowFunction::BlackmanHarris2,
        };

        let ratio = output_rate as f64 / input_rate as f64;
        let resampler = SincFixedIn::<f32>::new(ratio, 1.0, params, CHUNK_FRAMES, 1)
            .map_err(|e| AudioError::Construction(e.to_string()))?;

        debug!("Created resampler: {} Hz -> {} Hz", input_rate, output_rate);

        Ok(Self {
            resampler,
            input_rate,
            output_rate,
        })
    }

    /// Resample a complete mono signal.
    ///
    /// The resampler's group delay is trimmed from the front and the output is
    /// cut to `len * output_rate / input_rate` frames, so the result lines up
    /// with the input in time.
    pub fn resample(&mut self, input: &[f32]) -> Result<Vec<f32>, AudioError> {
        if input.is_empty() {
            return Ok(Vec::new());
        }

        let ratio = self.output_rate as f64 / self.input_rate as f64;
        let expected = (input.len() as f64 * ratio).round() as usize;
        let delay = self.resampler.output_delay();
        let mut output = Vec::with_capacity(expected + delay + CHUNK_FRAMES);

        let mut position = 0;
        while position < input.len() {
            let needed = self.resampler.input_frames_next();
            let end = (position + needed).min(input.len());
            let chunk = &input[position..end];

            let frames = if chunk.len() == needed {
                self.resampler.process(&[chunk], None)
            } else {
                self.resampler.process_partial(Some(&[chunk]), None)
            }
            .map_err(|e| AudioError::Resample(e.to_string()))?;

            output.extend_from_slice(&frames[0]);
            position = end;
        }

        // Flush the samples still held back by the filter delay.
        while output.len() < expected + delay {
            let frames = self
                .resampler
                .process_partial::<&[f32]>(None, None)
                .map_err(|e| AudioError::Resample(e.to_string()))?;
            if frames[0].is_empty() {
                break;
            }
            output.extend_from_slice(&frames[0]);
        }

        let end = (delay + expected).min(output.len());
        let start = delay.min(end);
        Ok(output[start..end].to_vec())
    }
}

/// Convert raw little-endian PCM bytes captured at `input_rate` into
/// canonical 16 kHz audio.
pub fn to_canonical(bytes: &[u8], input_rate: u32) -> Result<CanonicalAudio, AudioError> {
    let samples = pcm16_from_le_bytes(bytes)?;
    if samples.is_empty() || input_rate == CANONICAL_SAMPLE_RATE {
        return Ok(CanonicalAudio::new(samples));
    }

    let input: Vec<f32> = samples
        .iter()
        .map(|&s| s as f32 / i16::MAX as f32)
        .collect();

    let mut resampler = AudioResampler::new(input_rate, CANONICAL_SAMPLE_RATE)?;
    let output = resampler.resample(&input)?;

    let samples = output
        .into_iter()
        .map(|s| (s.clamp(-1.0, 1.0) * i16::MAX as f32).round() as i16)
        .collect();

    Ok(CanonicalAudio::new(samples))
}
