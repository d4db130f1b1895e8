//! Turn gate: decides whether a finished turn is a genuine user utterance.
//!
//! Signal-level checks run before transcription, in this order, each one a
//! terminal short-circuit:
//!
//! 1. resample to 16 kHz (failure discards the turn)
//! 2. duration floor and ceiling
//! 3. cooldown since the assistant last spoke (echo suppression)
//! 4. voice-activity detection
//!
//! Transcript-level checks run after transcription through an ordered list of
//! [`TranscriptFilter`]s (minimum word count, repeated-token hallucination).

pub mod config;
pub mod filters;

pub use config::TurnGateConfig;
pub use filters::{MinWordsFilter, RepeatedTokenFilter, TranscriptFilter};

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

use crate::core::audio::{CanonicalAudio, to_canonical};
use crate::core::vad::{SpeechDetector, VADError, create_speech_detector};

/// Why a turn was discarded.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Rejection {
    #[error("resampling failed: {0}")]
    ResampleFailed(String),
    #[error("turn too short ({duration:?} < {min:?})")]
    TooShort { duration: Duration, min: Duration },
    #[error("turn too long ({duration:?} > {max:?})")]
    TooLong { duration: Duration, max: Duration },
    #[error("too soon after assistant speech ({elapsed:?} < {cooldown:?})")]
    Cooldown { elapsed: Duration, cooldown: Duration },
    #[error("no speech detected (peak probability {peak:.2})")]
    NoSpeech { peak: f32 },
    #[error("voice activity detection failed: {0}")]
    DetectorFailed(String),
    #[error("empty transcript")]
    EmptyTranscript,
    #[error("transcript has {words} word(s), need {min}")]
    TooFewWords { words: usize, min: usize },
    #[error("hallucinated transcript ('{token}' repeated {count} times)")]
    Hallucination { token: String, count: usize },
}

pub struct TurnGate {
    config: TurnGateConfig,
    detector: Arc<dyn SpeechDetector>,
    filters: Vec<Box<dyn TranscriptFilter>>,
}

impl TurnGate {
    pub fn new(
        config: TurnGateConfig,
        detector: Arc<dyn SpeechDetector>,
        filters: Vec<Box<dyn TranscriptFilter>>,
    ) -> Self {
        Self {
            config,
            detector,
            filters,
        }
    }

    /// Build a gate with the configured detector and the default filter chain.
    pub fn from_config(config: TurnGateConfig) -> Result<Self, VADError> {
        let detector = create_speech_detector(&config.vad)?;
        let filters = Self::default_filters(&config);
        Ok(Self::new(config, detector, filters))
    }

    pub fn default_filters(config: &TurnGateConfig) -> Vec<Box<dyn TranscriptFilter>> {
        vec![
            Box::new(MinWordsFilter::new(config.min_words)),
            Box::new(RepeatedTokenFilter::new(
                config.hallucination_token.clone(),
                config.hallucination_max_repeats,
            )),
        ]
    }

    /// Append a filter to the end of the transcript chain.
    pub fn with_filter(mut self, filter: Box<dyn TranscriptFilter>) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn config(&self) -> &TurnGateConfig {
        &self.config
    }

    /// Size of the longest raw turn the duration ceiling admits.
    pub fn max_turn_bytes(&self) -> usize {
        let samples = self.config.max_duration.as_secs_f64()
            * f64::from(self.config.input_sample_rate);
        // One sample of slack for rounding at the boundary.
        (samples.ceil() as usize + 1) * 2
    }

    /// Run the pre-transcription checks on a raw turn.
    ///
    /// `last_assistant_speech` is when the assistant's last reply with audio
    /// finished delivering, if it has spoken at all.
    pub async fn screen_audio(
        &self,
        raw: Vec<u8>,
        last_assistant_speech: Option<Instant>,
    ) -> Result<CanonicalAudio, Rejection> {
        let input_rate = self.config.input_sample_rate;

        // A runaway buffer is rejected from its length alone, before any decoding.
        if raw.len() > self.max_turn_bytes() {
            return Err(Rejection::TooLong {
                duration: raw_duration(raw.len(), input_rate),
                max: self.config.max_duration,
            });
        }

        let audio = tokio::task::spawn_blocking(move || to_canonical(&raw, input_rate))
            .await
            .map_err(|e| Rejection::ResampleFailed(e.to_string()))?
            .map_err(|e| Rejection::ResampleFailed(e.to_string()))?;

        let duration = audio.duration();
        if duration < self.config.min_duration {
            return Err(Rejection::TooShort {
                duration,
                min: self.config.min_duration,
            });
        }
        if duration > self.config.max_duration {
            return Err(Rejection::TooLong {
                duration,
                max: self.config.max_duration,
            });
        }

        if let Some(spoke_at) = last_assistant_speech {
            let elapsed = spoke_at.elapsed();
            if elapsed < self.config.cooldown {
                return Err(Rejection::Cooldown {
                    elapsed,
                    cooldown: self.config.cooldown,
                });
            }
        }

        let detector = Arc::clone(&self.detector);
        let (audio, activity) = tokio::task::spawn_blocking(move || {
            let activity = detector.analyze(&audio.samples);
            (audio, activity)
        })
        .await
        .map_err(|e| Rejection::DetectorFailed(e.to_string()))?;

        let activity = activity.map_err(|e| Rejection::DetectorFailed(e.to_string()))?;
        if !activity.has_speech() {
            return Err(Rejection::NoSpeech {
                peak: activity.peak_probability,
            });
        }

        debug!(
            "Turn accepted for transcription: {:?}, {}/{} speech frames ({})",
            duration,
            activity.speech_frames,
            activity.frames,
            self.detector.name()
        );
        Ok(audio)
    }

    /// Run the transcript filters in order.
    pub fn screen_transcript(&self, transcript: &str) -> Result<(), Rejection> {
        for filter in &self.filters {
            if let Err(rejection) = filter.check(transcript) {
                debug!("Transcript rejected by '{}' filter", filter.name());
                return Err(rejection);
            }
        }
        Ok(())
    }
}

/// Playing time of `len` bytes of 16-bit mono PCM at `rate`.
fn raw_duration(len: usize, rate: u32) -> Duration {
    if rate == 0 {
        return Duration::ZERO;
    }
    Duration::from_secs_f64(len as f64 / 2.0 / f64::from(rate))
}
