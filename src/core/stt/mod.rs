mod base;
pub mod openai;

pub use base::{STTError, Transcriber};
pub use openai::{OPENAI_API_URL, OpenAISTTConfig, OpenAITranscriber};
