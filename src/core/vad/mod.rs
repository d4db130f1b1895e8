//! Voice Activity Detection (VAD).
//!
//! The turn gate asks a [`SpeechDetector`] whether a finished turn contains
//! any speech before paying for transcription. Two detectors exist:
//!
//! - [`EnergyVAD`]: frame RMS energy, always available.
//! - `SileroVAD`: the Silero ONNX model, behind the `silero-vad` feature.

pub mod config;
pub mod energy;
#[cfg(feature = "silero-vad")]
pub mod silero;

pub use config::{VADConfig, VADEngine};
pub use energy::EnergyVAD;
#[cfg(feature = "silero-vad")]
pub use silero::SileroVAD;

use std::sync::Arc;

/// Errors from voice-activity detection.
#[derive(Debug, Clone, thiserror::Error)]
pub enum VADError {
    #[error("VAD configuration error: {0}")]
    Configuration(String),
    #[error("VAD model error: {0}")]
    Model(String),
    #[error("VAD engine '{0}' is not available in this build")]
    Unavailable(&'static str),
}

/// Per-frame speech scores summarised over one turn.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpeechActivity {
    pub frames: usize,
    pub speech_frames: usize,
    pub peak_probability: f32,
}

impl SpeechActivity {
    pub(crate) fn record(&mut self, probability: f32, threshold: f32) {
        self.frames += 1;
        if probability > threshold {
            self.speech_frames += 1;
        }
        if probability > self.peak_probability {
            self.peak_probability = probability;
        }
    }

    /// True when at least one frame exceeded the detector's threshold.
    pub fn has_speech(&self) -> bool {
        self.speech_frames > 0
    }
}

/// Classifies 16 kHz mono audio as speech or non-speech, frame by frame.
///
/// Detection is CPU-bound; callers run it on the blocking pool.
pub trait SpeechDetector: Send + Sync {
    fn analyze(&self, samples: &[i16]) -> Result<SpeechActivity, VADError>;

    fn threshold(&self) -> f32;

    fn name(&self) -> &'static str;
}

/// Build the detector selected by `config.engine`.
pub fn create_speech_detector(config: &VADConfig) -> Result<Arc<dyn SpeechDetector>, VADError> {
    match config.engine {
        VADEngine::Energy => Ok(Arc::new(EnergyVAD::new(config.clone())?)),
        #[cfg(feature = "silero-vad")]
        VADEngine::Silero => Ok(Arc::new(SileroVAD::new(config.clone())?)),
        #[cfg(not(feature = "silero-vad"))]
        VADEngine::Silero => Err(VADError::Unavailable("silero")),
    }
}
