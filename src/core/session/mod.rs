//! # Voice session
//!
//! One [`SessionLoop`] per connected client. The loop reads inbound frames,
//! buffers audio into the current turn and, on `end_stream`, spawns the turn
//! pipeline (gate → transcribe → dialogue → synthesize). Replies go out
//! through a cancellable delivery task; a new audio chunk during delivery
//! cancels it and tells the client to stop playback.
//!
//! ```text
//!   chunks ──► buffer ──end_stream──► pipeline task ──► delivery task ──► writer
//!                 ▲                        │                  │
//!                 └──── barge-in marks ────┴── interrupted ◄──┘ cancel
//! ```
//!
//! At most one pipeline task and one delivery task exist per session. All
//! outbound frames pass through one FIFO channel to the connection's writer.

pub mod archive;
mod delivery;
pub mod errors;
pub mod messages;
mod pipeline;
mod runner;

#[cfg(test)]
mod tests;

pub use archive::{DEFAULT_ARCHIVE_CAPACITY, SessionArchive, SessionSnapshot};
pub use errors::{SessionError, SessionResult};
pub use messages::{InboundFrame, IncomingMessage, MessageRoute, OutgoingMessage};
pub use runner::{SessionLoop, SessionStats, SessionSummary};

use std::sync::Arc;
use std::time::Duration;

use crate::core::dialogue::{DialogueEngine, FALLBACK_REPLY, GREETING};
use crate::core::stt::Transcriber;
use crate::core::tts::Synthesizer;
use crate::core::turn_gate::TurnGate;

/// Observable state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Nothing buffered, nothing in flight
    AwaitingAudio,
    /// Audio is accumulating for the next turn
    Buffering,
    /// A turn is being gated, transcribed and answered
    Finalizing,
    /// A reply is on its way to the client and can still be interrupted
    Delivering,
    Ended,
}

/// Per-session behaviour that is not part of the turn gate.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Bound on the dialogue step; exceeding it yields the fallback reply
    pub dialogue_timeout: Duration,
    /// Language hint passed to the transcriber
    pub language: String,
    pub greeting: String,
    pub fallback_reply: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            dialogue_timeout: Duration::from_secs(10),
            language: "en".to_string(),
            greeting: GREETING.to_string(),
            fallback_reply: FALLBACK_REPLY.to_string(),
        }
    }
}

/// The external capabilities a session depends on.
#[derive(Clone)]
pub struct VoiceServices {
    pub transcriber: Arc<dyn Transcriber>,
    pub dialogue: Arc<dyn DialogueEngine>,
    pub synthesizer: Arc<dyn Synthesizer>,
    pub gate: Arc<TurnGate>,
}
