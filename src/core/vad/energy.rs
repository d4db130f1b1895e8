//! Energy-based speech detector.

use super::{SpeechActivity, SpeechDetector, VADConfig, VADError};

/// Scores each frame by its RMS level in dBFS, linearly mapped between a
/// silence floor and a speech level.
///
/// This is the default detector: it needs no model download and rejects the
/// digital silence and low-level room noise that make up most false turns.
pub struct EnergyVAD {
    config: VADConfig,
}

impl EnergyVAD {
    pub fn new(config: VADConfig) -> Result<Self, VADError> {
        if config.frame_size == 0 {
            return Err(VADError::Configuration("frame_size must be > 0".into()));
        }
        if config.energy_speech_db <= config.energy_floor_db {
            return Err(VADError::Configuration(format!(
                "energy_speech_db ({}) must be above energy_floor_db ({})",
                config.energy_speech_db, config.energy_floor_db
            )));
        }
        Ok(Self { config })
    }

    fn frame_score(&self, frame: &[i16]) -> f32 {
        let mean_square = frame
            .iter()
            .map(|&s| {
                let v = s as f64 / i16::MAX as f64;
                v * v
            })
            .sum::<f64>()
            / frame.len() as f64;

        if mean_square <= f64::EPSILON {
            return 0.0;
        }

        let db = 10.0 * mean_square.log10() as f32;
        let span = self.config.energy_speech_db - self.config.energy_floor_db;
        ((db - self.config.energy_floor_db) / span).clamp(0.0, 1.0)
    }
}

impl SpeechDetector for EnergyVAD {
    fn analyze(&self, samples: &[i16]) -> Result<SpeechActivity, VADError> {
        let mut activity = SpeechActivity::default();
        for frame in samples.chunks(self.config.frame_size) {
            // A trailing fragment shorter than a quarter frame is too short to score.
            if frame.len() < self.config.frame_size / 4 {
                continue;
            }
            activity.record(self.frame_score(frame), self.config.threshold);
        }
        Ok(activity)
    }

    fn threshold(&self) -> f32 {
        self.config.threshold
    }

    fn name(&self) -> &'static str {
        "energy"
    }
}
