use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;

use roastbot_core::models::{ChatMessage, ChatUser};
use roastbot_core::platforms::ChatTransport;
use roastbot_core::{Bot, Dispatch, Dispatcher, Error, OutboundSender};

pub const BOT_NAME: &str = "RoastBot";
pub const OPERATOR: &str = "roastedb";
pub const CHANNEL: &str = "forsen";

/// Transport that records every line and forwards it to a channel the test can await.
pub struct RecordingTransport {
    pub joined: Mutex<Vec<String>>,
    sent: mpsc::UnboundedSender<(String, String)>,
}

impl RecordingTransport {
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<(String, String)>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Arc::new(Self { joined: Mutex::new(Vec::new()), sent: tx }), rx)
    }
}

#[async_trait]
impl ChatTransport for RecordingTransport {
    async fn join_channel(&self, channel: &str) -> Result<(), Error> {
        self.joined.lock().push(channel.to_string());
        Ok(())
    }

    async fn send_message(&self, channel: &str, text: &str) -> Result<(), Error> {
        self.sent
            .send((channel.to_string(), text.to_string()))
            .map_err(|_| Error::Transport("test receiver dropped".into()))
    }

    async fn disconnect(&self) -> Result<(), Error> {
        Ok(())
    }
}

pub struct Harness {
    pub bot: Arc<Bot>,
    pub dispatcher: Dispatcher,
    pub transport: Arc<RecordingTransport>,
    pub outbox: mpsc::UnboundedReceiver<(String, String)>,
}

impl Harness {
    /// A bot with one bootstrapped channel and no send rate limit.
    pub fn new() -> Self {
        let (transport, outbox) = RecordingTransport::new();
        let (sender, _worker) = OutboundSender::spawn(transport.clone(), Duration::ZERO);
        let bot = Arc::new(Bot::new(BOT_NAME, OPERATOR, sender));
        bot.bootstrap_channel(CHANNEL).expect("bootstrap channel");
        Self {
            dispatcher: Dispatcher::new(bot.clone()),
            bot,
            transport,
            outbox,
        }
    }

    pub async fn send_as(&self, username: &str, text: &str) -> Dispatch {
        let user = ChatUser::new(username.to_lowercase(), username);
        self.dispatcher
            .handle_message(ChatMessage::new(CHANNEL, user, text))
            .await
    }

    /// Dispatches and, if a handler was spawned, waits for it to finish.
    pub async fn run_as(&self, username: &str, text: &str) -> Dispatch {
        let outcome = self.send_as(username, text).await;
        if let Dispatch::Executing(handle) = outcome {
            handle.await.expect("handler task panicked");
            return Dispatch::Executing(tokio::spawn(async {}));
        }
        outcome
    }

    /// Next line the transport saw.
    pub async fn next_reply(&mut self) -> String {
        let (channel, text) = tokio::time::timeout(Duration::from_secs(5), self.outbox.recv())
            .await
            .expect("timed out waiting for a reply")
            .expect("outbox closed");
        assert_eq!(channel, CHANNEL);
        text
    }

    /// Lets the sender worker run, then asserts nothing reached the transport.
    pub async fn assert_silent(&mut self) {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert!(self.outbox.try_recv().is_err(), "expected no reply");
    }
}

/// In-memory sink for `tracing` output, for asserting on log levels.
#[derive(Clone, Default)]
pub struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    /// Plain-text fmt subscriber writing into this buffer. Install it with
    /// `tracing::subscriber::set_default` on a current-thread runtime.
    pub fn subscriber(&self) -> impl tracing::Subscriber + Send + Sync + 'static {
        let sink = self.clone();
        tracing_subscriber::fmt()
            .with_writer(move || sink.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::DEBUG)
            .finish()
    }

    pub fn lines_containing(&self, needle: &str) -> Vec<String> {
        String::from_utf8_lossy(&self.0.lock())
            .lines()
            .filter(|l| l.contains(needle))
            .map(str::to_string)
            .collect()
    }
}

impl std::io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
