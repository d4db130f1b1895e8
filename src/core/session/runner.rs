use std::future::pending;
use std::pin::pin;
use std::sync::Arc;

use base64::Engine;
use base64::prelude::BASE64_STANDARD;
use futures::{Stream, StreamExt};
use tokio::select;
use tokio::sync::{mpsc, watch};
use tokio::task::{JoinError, JoinHandle};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::archive::{SessionArchive, SessionSnapshot};
use super::delivery::{ActiveDelivery, DeliveryOutcome, deliver};
use super::errors::{SessionError, SessionResult};
use super::messages::{InboundFrame, IncomingMessage, MessageRoute, OutgoingMessage};
use super::pipeline::{PreparedReply, TurnContext, TurnOutcome, run_turn, synthesize_b64};
use super::{SessionConfig, SessionPhase, VoiceServices};
use crate::core::audio::AudioFrameBuffer;
use crate::core::dialogue::DialogueState;

/// Per-connection state. Nothing here is shared with other sessions.
struct Session {
    id: String,
    buffer: AudioFrameBuffer,
    dialogue: DialogueState,
    last_assistant_speech: Option<Instant>,
    /// The user spoke while a turn was in flight or a reply was playing
    interrupted: bool,
    /// `end_stream` arrived while a turn was in flight
    pending_end_of_turn: bool,
    ended: bool,
    stats: SessionStats,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub replies_delivered: usize,
    pub turns_rejected: usize,
    pub stale_replies_dropped: usize,
    pub interruptions: usize,
}

/// What is left of a session after it ends.
#[derive(Debug, Clone)]
pub struct SessionSummary {
    pub session_id: String,
    pub stats: SessionStats,
    pub dialogue: DialogueState,
    /// The failure that ended the session, if any
    pub error: Option<SessionError>,
}

/// Drives one duplex connection: buffers audio, runs at most one turn at a
/// time, delivers at most one reply at a time and handles barge-in.
pub struct SessionLoop {
    session: Session,
    services: VoiceServices,
    config: Arc<SessionConfig>,
    outbound: mpsc::Sender<MessageRoute>,
    archive: Option<Arc<SessionArchive>>,
    phase_tx: watch::Sender<SessionPhase>,
    pipeline: Option<JoinHandle<SessionResult<TurnOutcome>>>,
    delivery: Option<ActiveDelivery>,
    error: Option<SessionError>,
}

impl SessionLoop {
    pub fn new(
        services: VoiceServices,
        config: Arc<SessionConfig>,
        outbound: mpsc::Sender<MessageRoute>,
    ) -> Self {
        let (phase_tx, _) = watch::channel(SessionPhase::AwaitingAudio);
        let session = Session {
            id: Uuid::new_v4().to_string(),
            buffer: AudioFrameBuffer::new(),
            dialogue: DialogueState::new(&config.greeting),
            last_assistant_speech: None,
            interrupted: false,
            pending_end_of_turn: false,
            ended: false,
            stats: SessionStats::default(),
        };

        Self {
            session,
            services,
            config,
            outbound,
            archive: None,
            phase_tx,
            pipeline: None,
            delivery: None,
            error: None,
        }
    }

    /// Publish snapshots of this session's dialogue to `archive`.
    pub fn with_archive(mut self, archive: Arc<SessionArchive>) -> Self {
        self.archive = Some(archive);
        self
    }

    pub fn session_id(&self) -> &str {
        &self.session.id
    }

    pub fn subscribe_phase(&self) -> watch::Receiver<SessionPhase> {
        self.phase_tx.subscribe()
    }

    /// Run the session until the client leaves, the conversation ends or
    /// the connection fails.
    pub async fn run<S>(mut self, inbound: S) -> SessionSummary
    where
        S: Stream<Item = InboundFrame>,
    {
        let mut inbound = pin!(inbound);
        info!("[{}] Session started", self.session.id);
        self.publish_snapshot(true);

        if let Err(e) = self.greet().await {
            self.fail(e);
        }

        while !self.session.ended {
            let result = select! {
                frame = inbound.next() => {
                    self.handle_frame(frame.unwrap_or(InboundFrame::Closed)).await
                }
                joined = join_pipeline(&mut self.pipeline) => {
                    self.pipeline = None;
                    self.on_turn_finished(joined).await
                }
                joined = join_delivery(&mut self.delivery) => {
                    match self.delivery.take() {
                        Some(finished) => self.on_delivery_finished(joined, finished),
                        None => Ok(()),
                    }
                }
            };

            if let Err(e) = result {
                self.fail(e);
            }
            self.publish_phase();
        }

        self.shutdown().await
    }

    async fn greet(&mut self) -> SessionResult<()> {
        let text = self.config.greeting.clone();
        let audio_b64 = synthesize_b64(self.services.synthesizer.as_ref(), &text).await;
        // The greeting opens every conversation log already.
        self.deliver(
            PreparedReply {
                text,
                audio_b64,
                end_of_session: false,
            },
            false,
        )
        .await
    }

    async fn handle_frame(&mut self, frame: InboundFrame) -> SessionResult<()> {
        match frame {
            InboundFrame::Message(IncomingMessage::AudioChunk { data }) => {
                self.on_audio_chunk(&data).await
            }
            InboundFrame::Message(IncomingMessage::EndStream) => self.on_end_stream().await,
            InboundFrame::Malformed(reason) => {
                warn!("[{}] {}", self.session.id, reason);
                self.send(OutgoingMessage::Error { message: reason }).await
            }
            InboundFrame::Closed => {
                info!("[{}] Connection closed by client", self.session.id);
                self.session.ended = true;
                Ok(())
            }
            InboundFrame::TransportError(e) => Err(SessionError::Transport(e)),
        }
    }

    async fn on_audio_chunk(&mut self, data: &str) -> SessionResult<()> {
        let bytes = match BASE64_STANDARD.decode(data) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("[{}] Undecodable audio chunk: {}", self.session.id, e);
                return self
                    .send(OutgoingMessage::Error {
                        message: format!("Invalid audio chunk: {e}"),
                    })
                    .await;
            }
        };
        if bytes.is_empty() {
            return Ok(());
        }
        // Past the gate's ceiling the turn is rejected anyway; stop growing.
        if self.session.buffer.len() <= self.services.gate.max_turn_bytes() {
            self.session.buffer.append(&bytes);
        } else {
            debug!("[{}] Turn exceeds the duration ceiling, chunk dropped", self.session.id);
        }

        if self.pipeline.is_some() && !self.session.interrupted {
            debug!("[{}] User spoke while a turn is in flight", self.session.id);
            self.session.interrupted = true;
        }

        if let Some(delivery) = &self.delivery
            && delivery.is_live()
        {
            delivery.cancel.cancel();
            self.session.interrupted = true;
            self.session.stats.interruptions += 1;
            info!("[{}] Assistant reply interrupted by user", self.session.id);
            self.publish_phase();
            self.send(OutgoingMessage::InterruptAudio).await?;
        }
        Ok(())
    }

    async fn on_end_stream(&mut self) -> SessionResult<()> {
        if self.pipeline.is_some() {
            debug!(
                "[{}] end_stream while a turn is in flight, queued",
                self.session.id
            );
            self.session.pending_end_of_turn = true;
            return Ok(());
        }
        self.start_turn().await
    }

    async fn start_turn(&mut self) -> SessionResult<()> {
        if self.session.buffer.is_empty() {
            debug!("[{}] end_stream with an empty buffer", self.session.id);
            return Ok(());
        }

        // The turn works on a copy of the dialogue, so the interrupted reply
        // must settle first: it joins the history only if it was written.
        if let Some(previous) = self.delivery.take() {
            self.settle_delivery(previous).await?;
        }

        let raw = self.session.buffer.take_all();

        self.session.interrupted = false;
        let ctx = TurnContext {
            session_id: self.session.id.clone(),
            services: self.services.clone(),
            config: Arc::clone(&self.config),
            outbound: self.outbound.clone(),
        };
        debug!("[{}] Finalizing turn of {} bytes", self.session.id, raw.len());

        self.pipeline = Some(tokio::spawn(run_turn(
            ctx,
            raw,
            self.session.last_assistant_speech,
            self.session.dialogue.clone(),
        )));
        self.publish_phase();
        Ok(())
    }

    async fn on_turn_finished(
        &mut self,
        joined: Result<SessionResult<TurnOutcome>, JoinError>,
    ) -> SessionResult<()> {
        let outcome = joined.map_err(|e| SessionError::TaskFailed(e.to_string()))??;

        match outcome {
            TurnOutcome::Rejected(rejection) => {
                info!("[{}] Turn discarded: {}", self.session.id, rejection);
                self.session.stats.turns_rejected += 1;
                self.session.interrupted = false;
            }
            TurnOutcome::Reply { .. } if self.session.interrupted => {
                info!(
                    "[{}] Dropping outdated reply, user spoke during processing",
                    self.session.id
                );
                self.session.stats.stale_replies_dropped += 1;
                self.session.interrupted = false;
            }
            TurnOutcome::Reply { reply, dialogue } => {
                // The user's line and extracted fields stand; the reply is
                // recorded once the client has it.
                self.session.dialogue = dialogue;
                self.publish_snapshot(true);
                self.deliver(reply, true).await?;
            }
        }

        if self.session.pending_end_of_turn && !self.session.ended {
            self.session.pending_end_of_turn = false;
            self.start_turn().await?;
        }
        Ok(())
    }

    /// Send a reply. Only one reply is ever in flight: a previous one is
    /// superseded. With `record`, the reply joins the conversation log once
    /// it has been written.
    async fn deliver(&mut self, reply: PreparedReply, record: bool) -> SessionResult<()> {
        if let Some(previous) = self.delivery.take() {
            self.settle_delivery(previous).await?;
        }

        let has_audio = reply.audio_b64.is_some();
        let end_of_session = reply.end_of_session;
        let history_line = record.then(|| reply.text.clone());
        let message = reply.into_message();

        if end_of_session {
            // The closing reply is not interruptible.
            match deliver(self.outbound.clone(), message, CancellationToken::new()).await {
                DeliveryOutcome::Delivered => {
                    self.session.stats.replies_delivered += 1;
                    if let Some(line) = history_line {
                        self.session.dialogue.record_assistant(&line);
                    }
                    info!("[{}] Conversation complete, closing", self.session.id);
                }
                DeliveryOutcome::Cancelled | DeliveryOutcome::WriterClosed => {
                    return Err(SessionError::ChannelClosed);
                }
            }
            self.session.ended = true;
            let _ = self.outbound.send(MessageRoute::Close).await;
            return Ok(());
        }

        self.delivery = Some(ActiveDelivery::spawn(
            self.outbound.clone(),
            message,
            has_audio,
            history_line,
        ));
        self.publish_phase();
        Ok(())
    }

    async fn settle_delivery(&mut self, mut delivery: ActiveDelivery) -> SessionResult<()> {
        let joined = delivery.supersede().await;
        self.on_delivery_finished(joined, delivery)
    }

    fn on_delivery_finished(
        &mut self,
        joined: Result<DeliveryOutcome, JoinError>,
        delivery: ActiveDelivery,
    ) -> SessionResult<()> {
        match joined.map_err(|e| SessionError::TaskFailed(e.to_string()))? {
            DeliveryOutcome::Delivered => {
                self.session.stats.replies_delivered += 1;
                if delivery.has_audio {
                    self.session.last_assistant_speech = Some(Instant::now());
                }
                if let Some(line) = delivery.history_line {
                    self.session.dialogue.record_assistant(&line);
                    self.publish_snapshot(true);
                }
                Ok(())
            }
            DeliveryOutcome::Cancelled => {
                debug!(
                    "[{}] Interrupted reply was never sent, left out of the history",
                    self.session.id
                );
                Ok(())
            }
            DeliveryOutcome::WriterClosed => Err(SessionError::ChannelClosed),
        }
    }

    async fn send(&self, message: OutgoingMessage) -> SessionResult<()> {
        self.outbound
            .send(MessageRoute::Outgoing(message))
            .await
            .map_err(|_| SessionError::ChannelClosed)
    }

    /// Report `error` to the client if possible and end the session.
    fn fail(&mut self, error: SessionError) {
        error!("[{}] Session failed: {}", self.session.id, error);
        let _ = self
            .outbound
            .try_send(MessageRoute::Outgoing(OutgoingMessage::Error {
                message: error.to_string(),
            }));
        let _ = self.outbound.try_send(MessageRoute::Close);
        self.session.ended = true;
        self.error.get_or_insert(error);
    }

    fn current_phase(&self) -> SessionPhase {
        if self.session.ended {
            SessionPhase::Ended
        } else if self.pipeline.is_some() {
            SessionPhase::Finalizing
        } else if self.delivery.as_ref().is_some_and(ActiveDelivery::is_live) {
            SessionPhase::Delivering
        } else if !self.session.buffer.is_empty() {
            SessionPhase::Buffering
        } else {
            SessionPhase::AwaitingAudio
        }
    }

    fn publish_phase(&self) {
        let phase = self.current_phase();
        self.phase_tx.send_if_modified(|current| {
            if *current == phase {
                false
            } else {
                debug!("[{}] Phase {:?} -> {:?}", self.session.id, current, phase);
                *current = phase;
                true
            }
        });
    }

    fn publish_snapshot(&self, active: bool) {
        if let Some(archive) = &self.archive {
            archive.publish(SessionSnapshot::new(
                &self.session.id,
                &self.session.dialogue,
                active,
            ));
        }
    }

    async fn shutdown(mut self) -> SessionSummary {
        if let Some(pipeline) = self.pipeline.take() {
            pipeline.abort();
        }
        if let Some(mut delivery) = self.delivery.take() {
            if delivery.handle.is_finished() {
                let joined = (&mut delivery.handle).await;
                if let Err(e) = self.on_delivery_finished(joined, delivery) {
                    debug!("[{}] Last delivery failed: {}", self.session.id, e);
                }
            } else {
                delivery.cancel.cancel();
                delivery.handle.abort();
            }
        }

        self.session.ended = true;
        self.publish_phase();
        self.publish_snapshot(false);

        info!(
            "[{}] Session ended: {:?}",
            self.session.id, self.session.stats
        );

        SessionSummary {
            session_id: self.session.id,
            stats: self.session.stats,
            dialogue: self.session.dialogue,
            error: self.error,
        }
    }
}

async fn join_pipeline(
    pipeline: &mut Option<JoinHandle<SessionResult<TurnOutcome>>>,
) -> Result<SessionResult<TurnOutcome>, JoinError> {
    match pipeline.as_mut() {
        Some(handle) => handle.await,
        None => pending().await,
    }
}

async fn join_delivery(
    delivery: &mut Option<ActiveDelivery>,
) -> Result<DeliveryOutcome, JoinError> {
    match delivery.as_mut() {
        Some(active) => (&mut active.handle).await,
        None => pending().await,
    }
}
