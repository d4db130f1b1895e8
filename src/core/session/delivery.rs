use tokio::select;
use tokio::sync::{mpsc, oneshot};
use tokio::task::{JoinError, JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::messages::{MessageRoute, OutgoingMessage};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DeliveryOutcome {
    /// The writer put the whole frame on the wire
    Delivered,
    /// Cancelled before the writer took the frame; nothing was sent
    Cancelled,
    WriterClosed,
}

/// The session's single in-flight reply.
pub(crate) struct ActiveDelivery {
    pub handle: JoinHandle<DeliveryOutcome>,
    pub cancel: CancellationToken,
    /// The reply carries synthesized audio
    pub has_audio: bool,
    /// Assistant line to add to the conversation once the client has it
    pub history_line: Option<String>,
}

impl ActiveDelivery {
    pub fn spawn(
        outbound: mpsc::Sender<MessageRoute>,
        message: OutgoingMessage,
        has_audio: bool,
        history_line: Option<String>,
    ) -> Self {
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(deliver(outbound, message, cancel.clone()));
        Self {
            handle,
            cancel,
            has_audio,
            history_line,
        }
    }

    /// Still cancellable, i.e. not yet interrupted.
    pub fn is_live(&self) -> bool {
        !self.cancel.is_cancelled()
    }

    /// Cancel the delivery and wait for its outcome.
    ///
    /// A reply still waiting for writer capacity resolves as `Cancelled`
    /// at once; one already handed off resolves when its write is confirmed.
    pub async fn supersede(&mut self) -> Result<DeliveryOutcome, JoinError> {
        self.cancel.cancel();
        (&mut self.handle).await
    }
}

/// Hand `message` to the writer unless `cancel` fires first.
///
/// Once the writer holds the frame it is written whole; cancellation after
/// that point has no effect on this frame.
pub(crate) async fn deliver(
    outbound: mpsc::Sender<MessageRoute>,
    message: OutgoingMessage,
    cancel: CancellationToken,
) -> DeliveryOutcome {
    let permit = select! {
        biased;
        _ = cancel.cancelled() => {
            debug!("Reply cancelled before hand-off");
            return DeliveryOutcome::Cancelled;
        }
        permit = outbound.reserve() => match permit {
            Ok(permit) => permit,
            Err(_) => return DeliveryOutcome::WriterClosed,
        },
    };

    let (written_tx, written_rx) = oneshot::channel();
    permit.send(MessageRoute::Delivery {
        message,
        written: written_tx,
    });

    match written_rx.await {
        Ok(()) => DeliveryOutcome::Delivered,
        Err(_) => DeliveryOutcome::WriterClosed,
    }
}
