mod base;
pub mod elevenlabs;

pub use base::{AudioData, Synthesizer, TTSError, TTSResult};
pub use elevenlabs::{ELEVENLABS_API_URL, ElevenLabsTTS, ElevenLabsTTSConfig, VoiceSettings};
