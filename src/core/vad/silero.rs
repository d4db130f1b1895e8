//! Silero VAD detector backed by the `voice_activity_detector` crate.

use parking_lot::Mutex;
use tracing::{debug, info};
use voice_activity_detector::VoiceActivityDetector;

use super::{SpeechActivity, SpeechDetector, VADConfig, VADError};

/// Silero-VAD speech detector.
///
/// The model keeps recurrent state between frames, so one turn is analysed
/// under the lock and the state is reset before the next turn.
pub struct SileroVAD {
    detector: Mutex<VoiceActivityDetector>,
    config: VADConfig,
}

impl SileroVAD {
    pub fn new(config: VADConfig) -> Result<Self, VADError> {
        if config.frame_size != 512 {
            return Err(VADError::Configuration(format!(
                "Silero VAD at 16kHz requires 512-sample frames, got {}",
                config.frame_size
            )));
        }

        let detector = VoiceActivityDetector::builder()
            .sample_rate(16_000)
            .chunk_size(config.frame_size)
            .build()
            .map_err(|e| VADError::Model(format!("Failed to create Silero VAD: {e:?}")))?;

        info!("Initialized Silero VAD with threshold {}", config.threshold);

        Ok(Self {
            detector: Mutex::new(detector),
            config,
        })
    }
}

impl SpeechDetector for SileroVAD {
    fn analyze(&self, samples: &[i16]) -> Result<SpeechActivity, VADError> {
        let mut detector = self.detector.lock();
        detector.reset();

        let mut activity = SpeechActivity::default();
        for frame in samples.chunks_exact(self.config.frame_size) {
            let probability = detector.predict(frame.iter().copied());
            activity.record(probability, self.config.threshold);
        }

        debug!(
            "Silero VAD: {}/{} speech frames, peak {:.2}",
            activity.speech_frames, activity.frames, activity.peak_probability
        );
        Ok(activity)
    }

    fn threshold(&self) -> f32 {
        self.config.threshold
    }

    fn name(&self) -> &'static str {
        "silero"
    }
}
