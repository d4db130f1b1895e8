//! Stub capabilities and a harness for driving a [`SessionLoop`] in tests.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::prelude::BASE64_STANDARD;
use futures::channel::mpsc as futures_mpsc;
use parking_lot::Mutex;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::core::audio::CanonicalAudio;
use crate::core::dialogue::{DialogueEngine, DialogueError, DialogueReply, DialogueState};
use crate::core::session::{
    InboundFrame, IncomingMessage, MessageRoute, OutgoingMessage, SessionArchive, SessionConfig,
    SessionLoop, SessionPhase, SessionSummary, VoiceServices,
};
use crate::core::stt::{STTError, Transcriber};
use crate::core::tts::{AudioData, Synthesizer, TTSError, TTSResult};
use crate::core::turn_gate::{TurnGate, TurnGateConfig};

pub const STUB_AUDIO: &[u8] = b"ID3-stub-mp3";

pub struct StubTranscriber {
    pub transcript: String,
    pub fail: bool,
    pub calls: AtomicUsize,
}

impl StubTranscriber {
    pub fn new(transcript: &str) -> Self {
        Self {
            transcript: transcript.to_string(),
            fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transcriber for StubTranscriber {
    async fn transcribe(&self, _audio: &CanonicalAudio, _language: &str) -> Result<String, STTError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(STTError::NetworkError("stub failure".to_string()));
        }
        Ok(self.transcript.clone())
    }

    fn get_provider_info(&self) -> &'static str {
        "stub"
    }
}

/// Replies from a script, then repeats `default_reply`.
pub struct StubDialogue {
    script: Mutex<VecDeque<Result<String, DialogueError>>>,
    pub default_reply: String,
    pub delay: Option<Duration>,
    pub calls: AtomicUsize,
}

impl StubDialogue {
    pub fn new(default_reply: &str) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            default_reply: default_reply.to_string(),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn then(self, reply: Result<&str, DialogueError>) -> Self {
        self.script.lock().push_back(reply.map(str::to_string));
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
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let mut extracted = serde_json::Map::new();
        extracted.insert("SiteCompanyName1".to_string(), transcript.into());
        state.apply_extracted(&extracted);

        let next = self.script.lock().pop_front();
        match next {
            Some(Ok(text)) => Ok(DialogueReply::new(text)),
            Some(Err(e)) => Err(e),
            None => Ok(DialogueReply::new(self.default_reply.as_str())),
        }
    }

    fn get_provider_info(&self) -> &'static str {
        "stub"
    }
}

pub struct StubSynthesizer {
    pub fail: bool,
    pub calls: AtomicUsize,
}

impl StubSynthesizer {
    pub fn new() -> Self {
        Self {
            fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl Synthesizer for StubSynthesizer {
    async fn synthesize(&self, _text: &str) -> TTSResult<AudioData> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(TTSError::ProviderError("stub failure".to_string()));
        }
        Ok(AudioData::new(STUB_AUDIO.to_vec(), "mp3"))
    }

    fn get_provider_info(&self) -> serde_json::Value {
        serde_json::json!({ "provider": "stub" })
    }
}

/// Gate on 16 kHz input with the energy detector and no cooldown.
pub fn test_gate_config() -> TurnGateConfig {
    TurnGateConfig {
        input_sample_rate: 16_000,
        cooldown: Duration::ZERO,
        ..Default::default()
    }
}

pub struct Stubs {
    pub transcriber: Arc<StubTranscriber>,
    pub dialogue: Arc<StubDialogue>,
    pub synthesizer: Arc<StubSynthesizer>,
    pub gate_config: TurnGateConfig,
}

impl Stubs {
    pub fn new() -> Self {
        Self {
            transcriber: Arc::new(StubTranscriber::new("my business is Acme Widgets")),
            dialogue: Arc::new(StubDialogue::new("Great, what is the site address?")),
            synthesizer: Arc::new(StubSynthesizer::new()),
            gate_config: test_gate_config(),
        }
    }

    pub fn services(&self) -> VoiceServices {
        VoiceServices {
            transcriber: self.transcriber.clone(),
            dialogue: self.dialogue.clone(),
            synthesizer: self.synthesizer.clone(),
            gate: Arc::new(TurnGate::from_config(self.gate_config.clone()).unwrap()),
        }
    }
}

/// 16 kHz PCM of a loud tone, base64 encoded.
pub fn speech_b64(duration: Duration) -> String {
    let count = (duration.as_secs_f64() * 16_000.0) as usize;
    let bytes: Vec<u8> = (0..count)
        .map(|i| {
            let t = i as f32 / 16_000.0;
            (8000.0 * (2.0 * std::f32::consts::PI * 330.0 * t).sin()) as i16
        })
        .flat_map(|s| s.to_le_bytes())
        .collect();
    BASE64_STANDARD.encode(bytes)
}

pub fn silence_b64(duration: Duration) -> String {
    let count = (duration.as_secs_f64() * 16_000.0) as usize;
    BASE64_STANDARD.encode(vec![0u8; count * 2])
}

pub struct Harness {
    inbound: futures_mpsc::UnboundedSender<InboundFrame>,
    pub outbound: mpsc::Receiver<MessageRoute>,
    pub phase: watch::Receiver<SessionPhase>,
    pub archive: Arc<SessionArchive>,
    pub session_id: String,
    task: JoinHandle<SessionSummary>,
}

impl Harness {
    pub fn start(stubs: &Stubs, config: SessionConfig, outbound_capacity: usize) -> Self {
        let (inbound_tx, inbound_rx) = futures_mpsc::unbounded();
        let (outbound_tx, outbound_rx) = mpsc::channel(outbound_capacity);
        let archive = Arc::new(SessionArchive::default());

        let session = SessionLoop::new(stubs.services(), Arc::new(config), outbound_tx)
            .with_archive(archive.clone());
        let phase = session.subscribe_phase();
        let session_id = session.session_id().to_string();
        let task = tokio::spawn(session.run(inbound_rx));

        Self {
            inbound: inbound_tx,
            outbound: outbound_rx,
            phase,
            archive,
            session_id,
            task,
        }
    }

    pub fn send(&self, frame: InboundFrame) {
        self.inbound.unbounded_send(frame).unwrap();
    }

    pub fn chunk(&self, data: String) {
        self.send(InboundFrame::Message(IncomingMessage::AudioChunk { data }));
    }

    pub fn end_stream(&self) {
        self.send(InboundFrame::Message(IncomingMessage::EndStream));
    }

    pub async fn next_route(&mut self) -> MessageRoute {
        tokio::time::timeout(Duration::from_secs(60), self.outbound.recv())
            .await
            .expect("timed out waiting for an outbound message")
            .expect("outbound channel closed")
    }

    /// Next outbound message, acknowledging reply writes.
    pub async fn next_message(&mut self) -> OutgoingMessage {
        match self.next_route().await {
            MessageRoute::Outgoing(message) => message,
            MessageRoute::Delivery { message, written } => {
                let _ = written.send(());
                message
            }
            MessageRoute::Close => panic!("unexpected close"),
        }
    }

    pub async fn expect_close(&mut self) {
        match self.next_route().await {
            MessageRoute::Close => {}
            other => panic!("expected close, got {other:?}"),
        }
    }

    pub async fn wait_for_phase(&mut self, phase: SessionPhase) {
        tokio::time::timeout(Duration::from_secs(60), self.phase.wait_for(|p| *p == phase))
            .await
            .expect("timed out waiting for phase")
            .expect("session dropped its phase channel");
    }

    /// Receive the greeting and confirm its write.
    pub async fn skip_greeting(&mut self) -> OutgoingMessage {
        let greeting = self.next_message().await;
        assert!(matches!(greeting, OutgoingMessage::AssistantReply { .. }));
        self.wait_for_phase(SessionPhase::AwaitingAudio).await;
        greeting
    }

    /// Close the client side and collect the session summary.
    pub async fn close(self) -> (SessionSummary, mpsc::Receiver<MessageRoute>) {
        let _ = self.inbound.unbounded_send(InboundFrame::Closed);
        let summary = self.task.await.unwrap();
        (summary, self.outbound)
    }

    pub async fn finish(self) -> (SessionSummary, mpsc::Receiver<MessageRoute>) {
        let summary = self.task.await.unwrap();
        (summary, self.outbound)
    }
}
