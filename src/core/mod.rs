pub mod audio;
pub mod dialogue;
pub mod session;
pub mod state;
pub mod stt;
pub mod tts;
pub mod turn_gate;
pub mod vad;

// Re-export commonly used types for convenience
pub use audio::{AudioError, AudioFrameBuffer, CanonicalAudio};
pub use dialogue::{DialogueEngine, DialogueError, DialogueReply, DialogueState};
pub use session::{
    InboundFrame, IncomingMessage, MessageRoute, OutgoingMessage, SessionArchive, SessionConfig,
    SessionError, SessionLoop, SessionPhase, SessionSummary, VoiceServices,
};
pub use stt::{STTError, Transcriber};
pub use tts::{AudioData, Synthesizer, TTSError};
pub use turn_gate::{Rejection, TurnGate, TurnGateConfig};
pub use vad::{SpeechDetector, VADConfig, VADError};

// Re-export CoreState for external use
pub use state::{CoreInitError, CoreState};
