// File: src/platforms/mod.rs

use async_trait::async_trait;
use crate::Error;

/// What the dispatcher core needs from a chat network connection.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn join_channel(&self, channel: &str) -> Result<(), Error>;
    async fn send_message(&self, channel: &str, text: &str) -> Result<(), Error>;
    async fn disconnect(&self) -> Result<(), Error>;
}

pub mod twitch_irc;
