//! Configuration for voice-activity detection.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Which detector backs the voice-activity check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VADEngine {
    /// Frame RMS energy mapped onto a 0..1 speech score.
    #[default]
    Energy,
    /// Silero VAD ONNX model (requires the `silero-vad` feature).
    Silero,
}

impl VADEngine {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "energy" => Some(Self::Energy),
            "silero" => Some(Self::Silero),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Energy => "energy",
            Self::Silero => "silero",
        }
    }
}

impl FromStr for VADEngine {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("unknown VAD engine '{s}' (expected energy or silero)"))
    }
}

/// Voice-activity detector settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VADConfig {
    pub engine: VADEngine,

    /// Speech probability a frame must exceed to count as speech.
    ///
    /// 0.5 is the Silero recommendation; the energy detector's dB range is
    /// tuned around it.
    pub threshold: f32,

    /// Samples per analysis frame at 16 kHz (32 ms).
    pub frame_size: usize,

    /// RMS level (dBFS) at or below which a frame scores 0.0.
    pub energy_floor_db: f32,

    /// RMS level (dBFS) at or above which a frame scores 1.0.
    pub energy_speech_db: f32,
}

impl Default for VADConfig {
    fn default() -> Self {
        Self {
            engine: VADEngine::Energy,
            threshold: 0.5,
            frame_size: 512,
            energy_floor_db: -60.0,
            energy_speech_db: -30.0,
        }
    }
}
