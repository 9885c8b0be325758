//! Rate-limited outbound queue shared by every channel.
//!
//! All replies go through one worker task that waits for the next interval tick before
//! handing a line to the transport, so the bot stays under the chat platform's flood
//! limits no matter how many commands answer at once. The queue is FIFO: lines queued
//! by one task go out in the order they were queued.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, error, info};

use roastbot_common::models::OutboundMessage;

use crate::Error;
use crate::platforms::ChatTransport;

/// Twitch allows 20 lines per 30 seconds for a regular account.
pub const DEFAULT_SEND_INTERVAL: Duration = Duration::from_millis(1500);

/// How many replies may wait in the queue before `say` starts applying backpressure.
pub const QUEUE_CAPACITY: usize = 256;

struct Envelope {
    message: OutboundMessage,
    ack: Option<oneshot::Sender<Result<(), Error>>>,
}

/// Cheap-to-clone handle onto the outbound queue.
#[derive(Clone)]
pub struct OutboundSender {
    tx: mpsc::Sender<Envelope>,
}

impl OutboundSender {
    /// Starts the worker. It runs until every `OutboundSender` clone is dropped and the
    /// queue has drained.
    pub fn spawn(transport: Arc<dyn ChatTransport>, interval: Duration) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(QUEUE_CAPACITY);
        let handle = tokio::spawn(run_sender(rx, transport, interval));
        (Self { tx }, handle)
    }

    /// Queues a line and returns as soon as the worker owns it.
    pub async fn say(&self, channel: &str, text: impl Into<String>) -> Result<(), Error> {
        self.enqueue(channel, text.into(), None).await
    }

    /// Queues a line and waits until the transport has accepted (or rejected) it.
    pub async fn send(&self, channel: &str, text: impl Into<String>) -> Result<(), Error> {
        let (ack_tx, ack_rx) = oneshot::channel();
        self.enqueue(channel, text.into(), Some(ack_tx)).await?;
        ack_rx.await.map_err(|_| Error::SenderClosed)?
    }

    async fn enqueue(
        &self,
        channel: &str,
        text: String,
        ack: Option<oneshot::Sender<Result<(), Error>>>,
    ) -> Result<(), Error> {
        let envelope = Envelope {
            message: OutboundMessage { channel: channel.to_string(), text },
            ack,
        };
        self.tx.send(envelope).await.map_err(|_| Error::SenderClosed)
    }
}

async fn run_sender(
    mut rx: mpsc::Receiver<Envelope>,
    transport: Arc<dyn ChatTransport>,
    interval: Duration,
) {
    // A zero interval means "no rate limit" (tokio rejects zero-length intervals).
    let mut ticker = (!interval.is_zero()).then(|| {
        let mut t = time::interval(interval);
        t.set_missed_tick_behavior(MissedTickBehavior::Delay);
        t
    });

    while let Some(Envelope { message, ack }) = rx.recv().await {
        if let Some(t) = ticker.as_mut() {
            t.tick().await;
        }
        debug!("sending to '{}': {}", message.channel, message.text);
        let result = transport.send_message(&message.channel, &message.text).await;
        if let Err(e) = &result {
            error!("failed to send message to '{}': {}", message.channel, e);
        }
        if let Some(ack) = ack {
            let _ = ack.send(result);
        }
    }

    info!("outbound sender stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platforms::MockChatTransport;
    use mockall::Sequence;
    use tokio::time::Instant;

    #[tokio::test]
    async fn test_send_reaches_transport() {
        let mut transport = MockChatTransport::new();
        transport
            .expect_send_message()
            .withf(|channel, text| channel == "forsen" && text == "xD")
            .times(1)
            .returning(|_, _| Ok(()));

        let (sender, handle) = OutboundSender::spawn(Arc::new(transport), Duration::ZERO);
        sender.send("forsen", "xD").await.expect("send succeeds");

        drop(sender);
        handle.await.expect("worker exits cleanly");
    }

    #[tokio::test]
    async fn test_send_reports_transport_failure() {
        let mut transport = MockChatTransport::new();
        transport
            .expect_send_message()
            .returning(|_, _| Err(Error::Transport("socket closed".into())));

        let (sender, _handle) = OutboundSender::spawn(Arc::new(transport), Duration::ZERO);
        let err = sender.send("forsen", "hello").await.unwrap_err();
        assert!(matches!(err, Error::Transport(_)));

        // The worker survives a failed send.
        let err = sender.send("forsen", "again").await.unwrap_err();
        assert!(matches!(err, Error::Transport(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_sends_are_spaced_and_ordered() {
        let mut seq = Sequence::new();
        let mut transport = MockChatTransport::new();
        for expected in ["one", "two", "three"] {
            transport
                .expect_send_message()
                .withf(move |_, text| text == expected)
                .times(1)
                .in_sequence(&mut seq)
                .returning(|_, _| Ok(()));
        }

        let interval = Duration::from_secs(2);
        let (sender, handle) = OutboundSender::spawn(Arc::new(transport), interval);

        let start = Instant::now();
        sender.say("chan", "one").await.expect("queued");
        sender.say("chan", "two").await.expect("queued");
        sender.send("chan", "three").await.expect("sent");

        // First tick is immediate; the next two each wait a full interval.
        assert!(start.elapsed() >= interval * 2);

        drop(sender);
        handle.await.expect("worker exits cleanly");
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_every_handle_drains_queue() {
        let mut transport = MockChatTransport::new();
        transport
            .expect_send_message()
            .times(3)
            .returning(|_, _| Ok(()));

        let (sender, handle) = OutboundSender::spawn(Arc::new(transport), Duration::from_secs(1));
        let clone = sender.clone();
        sender.say("chan", "one").await.expect("queued");
        clone.say("chan", "two").await.expect("queued");
        clone.say("chan", "three").await.expect("queued");
        drop(sender);
        drop(clone);

        // All three lines still reach the transport before the worker exits.
        time::timeout(Duration::from_secs(10), handle)
            .await
            .expect("worker drains within the timeout")
            .expect("worker exits cleanly");
    }

    #[tokio::test]
    async fn test_say_after_worker_gone() {
        let transport = MockChatTransport::new();
        let (sender, handle) = OutboundSender::spawn(Arc::new(transport), Duration::ZERO);
        handle.abort();
        let _ = handle.await;

        let err = sender.say("chan", "late").await.unwrap_err();
        assert!(matches!(err, Error::SenderClosed));
    }
}
