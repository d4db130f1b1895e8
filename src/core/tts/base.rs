//! # TTS Base Trait
//!
//! The turn pipeline needs one thing from a text-to-speech provider: the
//! complete audio for a reply, returned in one piece so the reply can be
//! delivered (or dropped) as a unit.

use async_trait::async_trait;

/// Audio data structure for TTS output
#[derive(Debug, Clone, PartialEq)]
pub struct AudioData {
    /// Encoded audio bytes in the format given by `format`
    pub data: Vec<u8>,
    /// Audio format (e.g. "mp3", "pcm")
    pub format: String,
}

impl AudioData {
    pub fn new(data: Vec<u8>, format: impl Into<String>) -> Self {
        Self {
            data,
            format: format.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// TTS-specific error types
#[derive(Debug, Clone, thiserror::Error)]
pub enum TTSError {
    #[error("Audio generation failed: {0}")]
    AudioGenerationFailed(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Provider error: {0}")]
    ProviderError(String),
}

/// Result type for TTS operations
pub type TTSResult<T> = Result<T, TTSError>;

/// Text-to-speech capability used by the turn pipeline.
#[async_trait]
pub trait Synthesizer: Send + Sync {
    /// Synthesize `text` into a single audio payload.
    async fn synthesize(&self, text: &str) -> TTSResult<AudioData>;

    /// Get provider-specific information
    fn get_provider_info(&self) -> serde_json::Value;
}
