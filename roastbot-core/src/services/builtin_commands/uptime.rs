use std::time::Duration;

use async_trait::async_trait;

use crate::Error;
use crate::registry::{CommandContext, CommandHandler};

pub struct UptimeCommand;

/// Hours roll over into days only once a full day has passed.
pub fn format_uptime(name: &str, elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    let days = secs / 86_400;
    let hours = secs / 3_600;
    let minutes = (secs / 60) % 60;
    let seconds = secs % 60;

    if days > 0 {
        format!(
            "{} has been running for {} days, {} hours, {} minutes, and {} seconds",
            name,
            days,
            hours % 24,
            minutes,
            seconds
        )
    } else {
        format!(
            "{} has been running for {} hours, {} minutes, and {} seconds",
            name, hours, minutes, seconds
        )
    }
}

#[async_trait]
impl CommandHandler for UptimeCommand {
    async fn execute(&self, ctx: &CommandContext) -> Result<(), Error> {
        ctx.reply(format_uptime(ctx.bot.username(), ctx.bot.uptime())).await
    }
}
