//! Post-transcription filters.
//!
//! Each filter inspects a transcript and either lets it through or rejects
//! the turn. The gate runs them in order and stops at the first rejection.

use super::Rejection;

pub trait TranscriptFilter: Send + Sync {
    fn name(&self) -> &'static str;

    fn check(&self, transcript: &str) -> Result<(), Rejection>;
}

/// Drops empty transcripts and ones with too few words to be a real answer.
pub struct MinWordsFilter {
    min_words: usize,
}

impl MinWordsFilter {
    pub fn new(min_words: usize) -> Self {
        Self { min_words }
    }
}

impl TranscriptFilter for MinWordsFilter {
    fn name(&self) -> &'static str {
        "min_words"
    }

    fn check(&self, transcript: &str) -> Result<(), Rejection> {
        let trimmed = transcript.trim();
        if trimmed.is_empty() {
            return Err(Rejection::EmptyTranscript);
        }

        let words = trimmed.split_whitespace().count();
        if words < self.min_words {
            return Err(Rejection::TooFewWords {
                words,
                min: self.min_words,
            });
        }
        Ok(())
    }
}

/// Drops transcripts in which a filler token repeats past a limit.
///
/// Whisper-family models emit long runs of a single token on noise; the
/// token is configurable because it depends on the model version.
pub struct RepeatedTokenFilter {
    token: String,
    max_repeats: usize,
}

impl RepeatedTokenFilter {
    pub fn new(token: impl Into<String>, max_repeats: usize) -> Self {
        Self {
            token: token.into().to_lowercase(),
            max_repeats,
        }
    }
}

impl TranscriptFilter for RepeatedTokenFilter {
    fn name(&self) -> &'static str {
        "repeated_token"
    }

    fn check(&self, transcript: &str) -> Result<(), Rejection> {
        if self.token.is_empty() {
            return Ok(());
        }

        let count = transcript.to_lowercase().matches(self.token.as_str()).count();
        if count > self.max_repeats {
            return Err(Rejection::Hallucination {
                token: self.token.clone(),
                count,
            });
        }
        Ok(())
    }
}
