use async_trait::async_trait;

use crate::core::audio::CanonicalAudio;

/// Error types for STT operations
#[derive(Debug, Clone, thiserror::Error)]
pub enum STTError {
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),
    #[error("Audio processing error: {0}")]
    AudioProcessingError(String),
    #[error("Provider error: {0}")]
    ProviderError(String),
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
    #[error("Network error: {0}")]
    NetworkError(String),
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Speech-to-text capability used by the turn pipeline.
///
/// One call transcribes one complete turn. Implementations return the
/// provider's best guess, which may be an empty string.
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe a 16 kHz mono segment.
    ///
    /// # Arguments
    /// * `audio` - The canonical turn audio
    /// * `language` - ISO-639-1 language hint (e.g. "en")
    async fn transcribe(&self, audio: &CanonicalAudio, language: &str) -> Result<String, STTError>;

    /// Get provider-specific information
    fn get_provider_info(&self) -> &'static str;
}
