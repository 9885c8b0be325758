// File: roastbot-core/src/services/dispatcher.rs
//! Per-message orchestration: mention check, command resolution, the enabled/cooldown
//! gate, then a spawned task for the handler so a slow command never stalls intake.
//!
//! `lastUsed` is written when the handler finishes successfully, so a command's
//! cooldown window starts at completion time. A second message that resolves to the
//! same command while the first is still running passes the gate too; cooldowns are a
//! throttle, not mutual exclusion.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use roastbot_common::models::ChatMessage;

use crate::Error;
use crate::registry::{Bot, Channel, Command, CommandContext, CommandState, Module};
use crate::services::mention::{MessageIntent, classify};

/// What the dispatcher did with one message.
#[derive(Debug)]
pub enum Dispatch {
    /// Own message, unknown channel, empty, or not addressed to the bot.
    Ignored,
    /// A global trigger reply was queued.
    Triggered,
    /// The bot was mentioned with nothing else; a greeting was queued.
    Greeted,
    /// Addressed to the bot but no enabled module has the keyword.
    NoMatch,
    Disabled { module: String, command: String },
    OnCooldown { module: String, command: String },
    /// The handler is running on this task.
    Executing(JoinHandle<()>),
}

#[derive(Clone)]
pub struct Dispatcher {
    bot: Arc<Bot>,
}

impl Dispatcher {
    pub fn new(bot: Arc<Bot>) -> Self {
        Self { bot }
    }

    pub fn bot(&self) -> &Arc<Bot> {
        &self.bot
    }

    /// Drains inbound messages until the transport drops its sender.
    pub async fn run(self, mut incoming: mpsc::UnboundedReceiver<ChatMessage>) {
        info!("dispatcher started");
        while let Some(msg) = incoming.recv().await {
            self.handle_message(msg).await;
        }
        info!("dispatcher stopped: inbound stream closed");
    }

    pub async fn handle_message(&self, msg: ChatMessage) -> Dispatch {
        let bot = &self.bot;
        if msg.user.username.eq_ignore_ascii_case(bot.username()) {
            return Dispatch::Ignored;
        }

        let channel = match bot.channel(&msg.channel) {
            Ok(c) => c,
            Err(e) => {
                warn!("cannot handle message: {}", e);
                return Dispatch::Ignored;
            }
        };

        match classify(&msg.text, bot.username(), bot.operator()) {
            MessageIntent::Empty | MessageIntent::NotAddressed => Dispatch::Ignored,
            MessageIntent::Trigger(reply) => {
                info!("sending trigger reply in '{}'", channel.name());
                self.say(channel.name(), reply).await;
                Dispatch::Triggered
            }
            MessageIntent::Greeting => {
                self.say(channel.name(), format!("hi {} :)", msg.user.display_name)).await;
                Dispatch::Greeted
            }
            MessageIntent::Command(args) => self.dispatch_command(channel, msg, args),
        }
    }

    fn dispatch_command(&self, channel: Arc<Channel>, msg: ChatMessage, args: Vec<String>) -> Dispatch {
        info!(
            channel = %channel.name(),
            user = %msg.user.display_name,
            text = %msg.text,
            "handling message"
        );

        let Some((module, command)) = channel.match_command(&args) else {
            debug!("no command matches {:?} in '{}'", args.first(), channel.name());
            return Dispatch::NoMatch;
        };

        match command.state(&module, Instant::now()) {
            CommandState::Disabled => {
                warn!(
                    channel = %channel.name(),
                    command = %command.name(),
                    module = %module.name(),
                    user = %msg.user.display_name,
                    "command is not enabled"
                );
                Dispatch::Disabled {
                    module: module.name().to_string(),
                    command: command.name().to_string(),
                }
            }
            CommandState::OnCooldown { remaining } => {
                warn!(
                    channel = %channel.name(),
                    command = %command.name(),
                    module = %module.name(),
                    user = %msg.user.display_name,
                    remaining_ms = remaining.as_millis() as u64,
                    "command is on cooldown"
                );
                Dispatch::OnCooldown {
                    module: module.name().to_string(),
                    command: command.name().to_string(),
                }
            }
            CommandState::Ready => {
                let ctx = CommandContext {
                    bot: self.bot.clone(),
                    channel: channel.name().to_string(),
                    user: msg.user,
                    args,
                    text: msg.text,
                };
                Dispatch::Executing(tokio::spawn(execute_command(module, command, ctx)))
            }
        }
    }

    async fn say(&self, channel: &str, text: String) {
        if let Err(e) = self.bot.say(channel, text).await {
            error!("failed to queue reply for '{}': {}", channel, e);
        }
    }
}

async fn execute_command(module: Arc<Module>, command: Arc<Command>, ctx: CommandContext) {
    info!(
        channel = %ctx.channel,
        command = %command.name(),
        module = %module.name(),
        user = %ctx.user.display_name,
        "executing command"
    );
    let start = Instant::now();

    match command.execute(&ctx).await {
        Ok(()) => command.mark_used(),
        Err(e) => report_failure(&ctx, &command, e).await,
    }

    info!(
        channel = %ctx.channel,
        command = %command.name(),
        module = %module.name(),
        user = %ctx.user.display_name,
        delta = %format!("{}ms", start.elapsed().as_millis()),
        "finished executing command"
    );
}

/// Unauthorized callers get silence; usage and lookup errors are echoed verbatim;
/// anything else gets a generic failure line.
async fn report_failure(ctx: &CommandContext, command: &Command, e: Error) {
    let reply = match &e {
        Error::Unauthorized(user) => {
            debug!("'{}' is not allowed to run '{}'", user, command.name());
            return;
        }
        Error::InvalidSyntax(_) => e.to_string(),
        _ if e.is_not_found() => e.to_string(),
        _ => {
            error!("command '{}' failed: {}", command.name(), e);
            format!("{}, that command failed: {}", ctx.user.display_name, e)
        }
    };
    if let Err(send_err) = ctx.reply(reply).await {
        error!("failed to queue error reply for '{}': {}", ctx.channel, send_err);
    }
}
