//! HTTP and WebSocket request handlers
//!
//! - `api` - Health check and read-only session views
//! - `ws` - The real-time voice session socket

pub mod api;
pub mod ws;

pub use ws::ws_audio_handler;
