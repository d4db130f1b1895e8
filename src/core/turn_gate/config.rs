use std::time::Duration;

use crate::core::vad::VADConfig;

/// Thresholds applied to every finished turn.
#[derive(Debug, Clone)]
pub struct TurnGateConfig {
    /// Sample rate of inbound client audio.
    pub input_sample_rate: u32,
    /// Turns shorter than this (after resampling) are dropped.
    pub min_duration: Duration,
    /// Turns longer than this are dropped as runaway buffers.
    pub max_duration: Duration,
    /// Minimum time since the assistant last spoke before a turn is accepted.
    pub cooldown: Duration,
    pub vad: VADConfig,
    /// Transcripts with fewer words are dropped.
    pub min_words: usize,
    /// Filler token the speech-to-text model repeats on silence or noise.
    pub hallucination_token: String,
    /// Occurrences of `hallucination_token` tolerated before a transcript is dropped.
    pub hallucination_max_repeats: usize,
}

impl Default for TurnGateConfig {
    fn default() -> Self {
        Self {
            input_sample_rate: 48_000,
            min_duration: Duration::from_millis(250),
            max_duration: Duration::from_secs(8),
            cooldown: Duration::from_secs(1),
            vad: VADConfig::default(),
            min_words: 2,
            hallucination_token: "sí".to_string(),
            hallucination_max_repeats: 8,
        }
    }
}
