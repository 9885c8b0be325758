// File: roastbot-core/src/registry/command.rs
//! A single invocable chat command plus its mutable enabled/cooldown state.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::time::Instant;

use roastbot_common::models::{ChatUser, CommandSnapshot};

use crate::Error;
use crate::registry::{Bot, Module};

/// Everything a handler gets to see about the message that triggered it.
#[derive(Clone)]
pub struct CommandContext {
    pub bot: Arc<Bot>,
    pub channel: String,
    pub user: ChatUser,
    /// Message tokens with the bot mention removed; `args[0]` is the keyword.
    pub args: Vec<String>,
    pub text: String,
}

impl CommandContext {
    /// Queue a reply into the channel the command was invoked from.
    pub async fn reply(&self, text: impl Into<String>) -> Result<(), Error> {
        self.bot.say(&self.channel, text).await
    }
}

#[async_trait]
pub trait CommandHandler: Send + Sync {
    async fn execute(&self, ctx: &CommandContext) -> Result<(), Error>;
}

struct FnHandler<F>(F);

#[async_trait]
impl<F, Fut> CommandHandler for FnHandler<F>
where
    F: Fn(CommandContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), Error>> + Send + 'static,
{
    async fn execute(&self, ctx: &CommandContext) -> Result<(), Error> {
        (self.0)(ctx.clone()).await
    }
}

/// Wrap an async closure as a command handler.
pub fn handler_fn<F, Fut>(f: F) -> Arc<dyn CommandHandler>
where
    F: Fn(CommandContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), Error>> + Send + 'static,
{
    Arc::new(FnHandler(f))
}

/// Outcome of the enabled/cooldown gate for a resolved command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandState {
    Disabled,
    OnCooldown { remaining: Duration },
    Ready,
}

pub struct Command {
    name: String,
    keyword: String,
    cooldown: Duration,
    handler: Arc<dyn CommandHandler>,
    enabled: AtomicBool,
    last_used: Mutex<Option<Instant>>,
}

impl Command {
    /// Creates an enabled command. `name` is lower-cased; `keyword` is kept verbatim
    /// since keyword matching is case-sensitive.
    pub fn new(
        name: &str,
        keyword: &str,
        cooldown: Duration,
        handler: Arc<dyn CommandHandler>,
    ) -> Self {
        Self {
            name: super::normalize_name(name),
            keyword: keyword.to_string(),
            cooldown,
            handler,
            enabled: AtomicBool::new(true),
            last_used: Mutex::new(None),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    pub(crate) fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }

    pub fn matches(&self, token: &str) -> bool {
        !token.is_empty() && token == self.keyword
    }

    pub fn last_used(&self) -> Option<Instant> {
        *self.last_used.lock()
    }

    pub fn mark_used(&self) {
        self.mark_used_at(Instant::now());
    }

    pub fn mark_used_at(&self, at: Instant) {
        *self.last_used.lock() = Some(at);
    }

    /// Time left before the command may run again, if any.
    pub fn cooldown_remaining(&self, now: Instant) -> Option<Duration> {
        let last = (*self.last_used.lock())?;
        let ready_at = last + self.cooldown;
        if now < ready_at {
            Some(ready_at - now)
        } else {
            None
        }
    }

    pub fn is_on_cooldown(&self) -> bool {
        self.cooldown_remaining(Instant::now()).is_some()
    }

    /// Evaluates the gate against `module`, which must be the module owning this command.
    pub fn state(&self, module: &Module, now: Instant) -> CommandState {
        if !module.is_enabled() || !self.is_enabled() {
            return CommandState::Disabled;
        }
        match self.cooldown_remaining(now) {
            Some(remaining) => CommandState::OnCooldown { remaining },
            None => CommandState::Ready,
        }
    }

    pub async fn execute(&self, ctx: &CommandContext) -> Result<(), Error> {
        self.handler.execute(ctx).await
    }

    pub fn snapshot(&self) -> CommandSnapshot {
        CommandSnapshot {
            name: self.name.clone(),
            keyword: self.keyword.clone(),
            enabled: self.is_enabled(),
            cooldown_seconds: self.cooldown.as_secs(),
        }
    }
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("keyword", &self.keyword)
            .field("cooldown", &self.cooldown)
            .field("enabled", &self.is_enabled())
            .finish()
    }
}
