//! Wire messages of the `/ws/audio` protocol and the session's internal routes.

use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

/// Client → server JSON text frames
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "type")]
pub enum IncomingMessage {
    /// Base64 of 16-bit little-endian mono PCM at the input sample rate
    #[serde(rename = "audio_chunk")]
    AudioChunk { data: String },
    /// The user stopped talking; process what has been buffered
    #[serde(rename = "end_stream")]
    EndStream,
}

/// Server → client JSON text frames
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "type")]
pub enum OutgoingMessage {
    /// Reply text with its synthesized audio; `audio_b64` is `null` when
    /// synthesis failed
    #[serde(rename = "assistant_reply")]
    AssistantReply {
        text: String,
        audio_b64: Option<String>,
    },
    #[serde(rename = "transcript")]
    Transcript { text: String },
    /// Stop playing the current reply
    #[serde(rename = "interrupt_audio")]
    InterruptAudio,
    #[serde(rename = "error")]
    Error { message: String },
}

/// Everything the session hands to the connection's writer task.
#[derive(Debug)]
pub enum MessageRoute {
    Outgoing(OutgoingMessage),
    /// A reply whose write the writer confirms through `written`
    Delivery {
        message: OutgoingMessage,
        written: oneshot::Sender<()>,
    },
    /// Close the connection after everything queued before it
    Close,
}

/// Transport-independent view of one inbound frame.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundFrame {
    Message(IncomingMessage),
    /// A frame that could not be understood; the session continues
    Malformed(String),
    Closed,
    /// The connection failed; the session ends
    TransportError(String),
}

impl InboundFrame {
    /// Parse a JSON text frame.
    pub fn from_text(text: &str) -> Self {
        match serde_json::from_str::<IncomingMessage>(text) {
            Ok(message) => InboundFrame::Message(message),
            Err(e) => InboundFrame::Malformed(format!("Invalid message format: {e}")),
        }
    }
}
