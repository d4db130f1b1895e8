//! One user turn, from raw audio to a reply ready for delivery.
//!
//! Runs as its own task so the session keeps reading frames (and can notice
//! barge-in) while the providers work. Provider failures are absorbed here:
//! a failed transcription discards the turn, a failed dialogue step becomes
//! the fallback reply and a failed synthesis becomes a text-only reply.

use std::sync::Arc;

use base64::Engine;
use base64::prelude::BASE64_STANDARD;
use tokio::sync::mpsc;
use tokio::time::{Instant, timeout};
use tracing::{info, warn};

use super::errors::{SessionError, SessionResult};
use super::messages::{MessageRoute, OutgoingMessage};
use super::{SessionConfig, VoiceServices};
use crate::core::dialogue::{DialogueError, DialogueReply, DialogueState};
use crate::core::tts::Synthesizer;
use crate::core::turn_gate::Rejection;

/// A reply that has been generated and synthesized but not yet sent.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PreparedReply {
    pub text: String,
    pub audio_b64: Option<String>,
    pub end_of_session: bool,
}

impl PreparedReply {
    pub fn into_message(self) -> OutgoingMessage {
        OutgoingMessage::AssistantReply {
            text: self.text,
            audio_b64: self.audio_b64,
        }
    }
}

#[derive(Debug)]
pub(crate) enum TurnOutcome {
    Rejected(Rejection),
    /// `dialogue` holds the user's line and any extracted fields; the reply
    /// itself is recorded by the session once it has been written
    Reply {
        reply: PreparedReply,
        dialogue: DialogueState,
    },
}

/// What a turn task needs from its session.
#[derive(Clone)]
pub(crate) struct TurnContext {
    pub session_id: String,
    pub services: VoiceServices,
    pub config: Arc<SessionConfig>,
    pub outbound: mpsc::Sender<MessageRoute>,
}

pub(crate) async fn run_turn(
    ctx: TurnContext,
    raw: Vec<u8>,
    last_assistant_speech: Option<Instant>,
    mut dialogue: DialogueState,
) -> SessionResult<TurnOutcome> {
    let gate = &ctx.services.gate;

    let audio = match gate.screen_audio(raw, last_assistant_speech).await {
        Ok(audio) => audio,
        Err(rejection) => return Ok(TurnOutcome::Rejected(rejection)),
    };

    let transcript = match ctx
        .services
        .transcriber
        .transcribe(&audio, &ctx.config.language)
        .await
    {
        Ok(text) => text,
        Err(e) => {
            warn!("[{}] Transcription failed: {}", ctx.session_id, e);
            String::new()
        }
    };

    if let Err(rejection) = gate.screen_transcript(&transcript) {
        return Ok(TurnOutcome::Rejected(rejection));
    }

    info!("[{}] User said: {}", ctx.session_id, transcript);
    ctx.outbound
        .send(MessageRoute::Outgoing(OutgoingMessage::Transcript {
            text: transcript.clone(),
        }))
        .await
        .map_err(|_| SessionError::ChannelClosed)?;

    dialogue.record_user(&transcript);

    let result = timeout(
        ctx.config.dialogue_timeout,
        ctx.services.dialogue.respond(&transcript, &mut dialogue),
    )
    .await
    .unwrap_or(Err(DialogueError::Timeout(ctx.config.dialogue_timeout)));

    let reply = match result {
        Ok(reply) if !reply.text.trim().is_empty() => reply,
        Ok(_) => {
            warn!("[{}] Dialogue engine returned an empty reply", ctx.session_id);
            DialogueReply::new(ctx.config.fallback_reply.as_str())
        }
        Err(e) => {
            warn!("[{}] Dialogue engine failed: {}", ctx.session_id, e);
            DialogueReply::new(ctx.config.fallback_reply.as_str())
        }
    };

    info!("[{}] Assistant: {}", ctx.session_id, reply.text);

    let audio_b64 = synthesize_b64(ctx.services.synthesizer.as_ref(), &reply.text).await;

    Ok(TurnOutcome::Reply {
        reply: PreparedReply {
            text: reply.text,
            audio_b64,
            end_of_session: reply.end_of_session,
        },
        dialogue,
    })
}

/// Synthesize `text` and base64 it, or `None` when synthesis fails.
pub(crate) async fn synthesize_b64(synthesizer: &dyn Synthesizer, text: &str) -> Option<String> {
    match synthesizer.synthesize(text).await {
        Ok(audio) if !audio.is_empty() => Some(BASE64_STANDARD.encode(&audio.data)),
        Ok(_) => {
            warn!("Synthesizer returned no audio, sending text only");
            None
        }
        Err(e) => {
            warn!("Speech synthesis failed, sending text only: {}", e);
            None
        }
    }
}
