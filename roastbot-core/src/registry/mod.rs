// File: roastbot-core/src/registry/mod.rs
//! The bot's channel/module/command registry.
//!
//! `Bot` owns every joined `Channel` plus the outbound sender. All toggles go through
//! the methods here (or on `Channel`/`Module`) so flag writes are never torn, and every
//! read accessor hands out snapshots rather than lock guards.

pub mod channel;
pub mod command;
pub mod module;

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::time::Instant;
use tracing::{error, info};

use roastbot_common::models::{ChannelSnapshot, ModuleSnapshot};

use crate::Error;
use crate::platforms::ChatTransport;
use crate::services::builtin_commands;
use crate::services::message_sender::OutboundSender;

pub use channel::{Channel, DEFAULT_MODULE};
pub use command::{handler_fn, Command, CommandContext, CommandHandler, CommandState};
pub use module::Module;

/// Module and command names are case-insensitive.
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Channel names drop the IRC `#` prefix and are case-insensitive.
pub fn normalize_channel(name: &str) -> String {
    name.trim().trim_start_matches('#').to_lowercase()
}

pub struct Bot {
    username: String,
    operator: String,
    started: Instant,
    started_at: DateTime<Utc>,
    channels: DashMap<String, Arc<Channel>>,
    sender: OutboundSender,
}

impl Bot {
    pub fn new(username: &str, operator: &str, sender: OutboundSender) -> Self {
        Self {
            username: username.to_string(),
            operator: operator.to_lowercase(),
            started: Instant::now(),
            started_at: Utc::now(),
            channels: DashMap::new(),
            sender,
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// Login name of the only user allowed to run admin commands.
    pub fn operator(&self) -> &str {
        &self.operator
    }

    pub fn uptime(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn sender(&self) -> &OutboundSender {
        &self.sender
    }

    /// Registers a channel (with its default module). Does not join it on the transport.
    pub fn add_channel(&self, name: &str) -> Result<Arc<Channel>, Error> {
        let key = normalize_channel(name);
        match self.channels.entry(key) {
            Entry::Occupied(o) => Err(Error::ChannelAlreadyExists(o.key().clone())),
            Entry::Vacant(v) => {
                let channel = Arc::new(Channel::new(v.key()));
                v.insert(channel.clone());
                Ok(channel)
            }
        }
    }

    /// Adds the channel and the operator-only `admin` module every joined channel carries.
    pub fn bootstrap_channel(&self, name: &str) -> Result<Arc<Channel>, Error> {
        let channel = self.add_channel(name)?;
        builtin_commands::register_admin_module(&channel)?;
        Ok(channel)
    }

    pub fn channel(&self, name: &str) -> Result<Arc<Channel>, Error> {
        let key = normalize_channel(name);
        self.channels
            .get(&key)
            .map(|c| c.value().clone())
            .ok_or(Error::ChannelNotFound(key))
    }

    pub fn channel_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.channels.iter().map(|c| c.key().clone()).collect();
        names.sort();
        names
    }

    pub fn add_module(&self, channel: &str, module: &str) -> Result<Arc<Module>, Error> {
        self.channel(channel)?.add_module(module)
    }

    /// Adds a command, creating `module` in the channel if it does not exist yet.
    pub fn add_command(
        &self,
        channel: &str,
        module: &str,
        command: Command,
    ) -> Result<Arc<Command>, Error> {
        self.channel(channel)?.add_command(module, command)
    }

    pub fn enable_module(&self, channel: &str, module: &str) -> Result<(), Error> {
        self.channel(channel)?.enable_module(module)
    }

    pub fn disable_module(&self, channel: &str, module: &str) -> Result<(), Error> {
        self.channel(channel)?.disable_module(module)
    }

    pub fn enable_command(&self, channel: &str, module: &str, command: &str) -> Result<(), Error> {
        self.channel(channel)?.enable_command(module, command)
    }

    pub fn disable_command(&self, channel: &str, module: &str, command: &str) -> Result<(), Error> {
        self.channel(channel)?.disable_command(module, command)
    }

    /// Hands `text` to the outbound sender; returns once it is queued, not once it is sent.
    pub async fn say(&self, channel: &str, text: impl Into<String>) -> Result<(), Error> {
        self.sender.say(&normalize_channel(channel), text).await
    }

    /// Every channel, sorted by name.
    pub fn channels(&self) -> Vec<ChannelSnapshot> {
        let mut channels: Vec<Arc<Channel>> =
            self.channels.iter().map(|c| c.value().clone()).collect();
        channels.sort_by(|a, b| a.name().cmp(b.name()));
        channels.iter().map(|c| c.snapshot()).collect()
    }

    pub fn modules(&self, channel: &str) -> Result<Vec<ModuleSnapshot>, Error> {
        Ok(self.channel(channel)?.module_snapshots())
    }

    /// Joins every registered channel; failures are logged and skipped.
    pub async fn join_channels(&self, transport: &dyn ChatTransport) {
        for name in self.channel_names() {
            match transport.join_channel(&name).await {
                Ok(()) => info!("joined channel '{}'", name),
                Err(e) => error!("failed to join channel '{}': {}", name, e),
            }
        }
    }
}

impl std::fmt::Debug for Bot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bot")
            .field("username", &self.username)
            .field("channels", &self.channel_names())
            .finish()
    }
}
