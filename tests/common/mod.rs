//! Shared fixtures for the integration tests: stand-in voice services and a
//! server bound to an ephemeral port.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::prelude::BASE64_STANDARD;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use serde_json::{Value, json};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::protocol::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use voiceform::core::dialogue::{DialogueEngine, DialogueError, DialogueReply, DialogueState};
use voiceform::core::stt::{STTError, Transcriber};
use voiceform::core::tts::{AudioData, Synthesizer, TTSResult};
use voiceform::core::{CanonicalAudio, CoreState, SessionConfig, TurnGate, TurnGateConfig};
use voiceform::{ServerConfig, VoiceServices, routes, state::AppState};

pub const STUB_AUDIO: &[u8] = b"ID3-stub-mp3";
pub const INPUT_RATE: u32 = 48_000;

pub struct StubTranscriber {
    pub transcript: String,
}

#[async_trait]
impl Transcriber for StubTranscriber {
    async fn transcribe(&self, _audio: &CanonicalAudio, _language: &str) -> Result<String, STTError> {
        Ok(self.transcript.clone())
    }

    fn get_provider_info(&self) -> &'static str {
        "stub"
    }
}

/// Replies with the queued texts in order, then with `default_reply`.
pub struct StubDialogue {
    replies: Mutex<VecDeque<String>>,
    default_reply: String,
    delay: Duration,
    pub calls: AtomicUsize,
}

impl StubDialogue {
    pub fn new(default_reply: &str) -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            default_reply: default_reply.to_string(),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn then(self, reply: &str) -> Self {
        self.replies.lock().push_back(reply.to_string());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DialogueEngine for StubDialogue {
    async fn respond(
        &self,
        transcript: &str,
        state: &mut DialogueState,
    ) -> Result<DialogueReply, DialogueError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let mut extracted = serde_json::Map::new();
        extracted.insert("SiteCompanyName1".to_string(), json!(transcript));
        state.apply_extracted(&extracted);

        let next = self.replies.lock().pop_front();
        Ok(DialogueReply::new(
            next.unwrap_or_else(|| self.default_reply.clone()),
        ))
    }

    fn get_provider_info(&self) -> &'static str {
        "stub"
    }
}

pub struct StubSynthesizer;

#[async_trait]
impl Synthesizer for StubSynthesizer {
    async fn synthesize(&self, _text: &str) -> TTSResult<AudioData> {
        Ok(AudioData::new(STUB_AUDIO.to_vec(), "mp3"))
    }

    fn get_provider_info(&self) -> Value {
        json!({ "provider": "stub" })
    }
}

/// Services backed by the stubs, gating 48 kHz input with no cooldown.
pub fn stub_services(transcript: &str, dialogue: Arc<StubDialogue>) -> VoiceServices {
    let gate_config = TurnGateConfig {
        input_sample_rate: INPUT_RATE,
        cooldown: Duration::ZERO,
        ..Default::default()
    };

    VoiceServices {
        transcriber: Arc::new(StubTranscriber {
            transcript: transcript.to_string(),
        }),
        dialogue,
        synthesizer: Arc::new(StubSynthesizer),
        gate: Arc::new(TurnGate::from_config(gate_config).unwrap()),
    }
}

/// Serve the full application on an ephemeral port.
pub async fn spawn_app(services: VoiceServices) -> (SocketAddr, Arc<AppState>) {
    let config = ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        ..Default::default()
    };
    let core = CoreState::with_services(services, SessionConfig::default());
    let app_state = AppState::with_core(config, core);
    let app = routes::create_app(app_state.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (addr, app_state)
}

/// Base64 of a loud tone at the input rate.
pub fn speech_b64(duration: Duration) -> String {
    let count = (duration.as_secs_f64() * INPUT_RATE as f64) as usize;
    let bytes: Vec<u8> = (0..count)
        .map(|i| {
            let t = i as f32 / INPUT_RATE as f32;
            (8000.0 * (2.0 * std::f32::consts::PI * 300.0 * t).sin()) as i16
        })
        .flat_map(|s| s.to_le_bytes())
        .collect();
    BASE64_STANDARD.encode(bytes)
}

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub struct WsClient {
    write: SplitSink<WsStream, Message>,
    read: SplitStream<WsStream>,
}

impl WsClient {
    pub async fn connect(addr: SocketAddr) -> Self {
        let url = format!("ws://{addr}/ws/audio");
        let (ws_stream, _) = connect_async(url).await.expect("Failed to connect");
        let (write, read) = ws_stream.split();
        Self { write, read }
    }

    pub async fn send_json(&mut self, value: Value) {
        self.write
            .send(Message::Text(value.to_string().into()))
            .await
            .unwrap();
    }

    pub async fn send_raw(&mut self, message: Message) {
        self.write.send(message).await.unwrap();
    }

    pub async fn chunk(&mut self, duration: Duration) {
        self.send_json(json!({ "type": "audio_chunk", "data": speech_b64(duration) }))
            .await;
    }

    pub async fn end_stream(&mut self) {
        self.send_json(json!({ "type": "end_stream" })).await;
    }

    /// Next frame other than ping/pong, or `None` once the socket is done.
    pub async fn next_frame(&mut self) -> Option<Message> {
        loop {
            let next = tokio::time::timeout(Duration::from_secs(30), self.read.next())
                .await
                .expect("timed out waiting for a frame");
            match next {
                Some(Ok(Message::Ping(_))) | Some(Ok(Message::Pong(_))) => continue,
                Some(Ok(message)) => return Some(message),
                Some(Err(_)) | None => return None,
            }
        }
    }

    pub async fn next_json(&mut self) -> Value {
        match self.next_frame().await {
            Some(Message::Text(text)) => serde_json::from_str(text.as_str()).unwrap(),
            other => panic!("expected a JSON text frame, got {other:?}"),
        }
    }

    /// Nothing arrives within `window`.
    pub async fn expect_silence(&mut self, window: Duration) {
        if let Ok(frame) = tokio::time::timeout(window, self.read.next()).await {
            panic!("expected no frame, got {frame:?}");
        }
    }

    pub async fn close(mut self) {
        let _ = self.write.send(Message::Close(None)).await;
    }
}
