//! # WebSocket Audio Session
//!
//! `GET /ws/audio` carries one voice session. Every frame is a JSON text
//! frame tagged by `type`.
//!
//! **Incoming Messages:**
//! - `{"type": "audio_chunk", "data": "<base64 PCM>"}` - 16-bit little-endian
//!   mono PCM at the configured input rate (48 kHz by default)
//! - `{"type": "end_stream"}` - the user finished speaking
//!
//! **Outgoing Messages:**
//! - `{"type": "assistant_reply", "text": "...", "audio_b64": "<base64 mp3>" | null}`
//! - `{"type": "transcript", "text": "..."}` - what the assistant understood
//! - `{"type": "interrupt_audio"}` - stop playing the current reply
//! - `{"type": "error", "message": "..."}`
//!
//! The greeting is sent as an `assistant_reply` right after the upgrade.
//! Binary frames and unparseable text frames produce an `error` frame and
//! the session carries on. When the assistant ends the interview, its final
//! reply is followed by a close frame.

pub mod handler;


pub use handler::ws_audio_handler;
