use async_trait::async_trait;

use crate::Error;
use crate::registry::{CommandContext, CommandHandler};

pub struct HelpCommand;

pub fn help_text(display_name: &str) -> String {
    format!(
        "{}, to use my commands, mention me at the start or end of your message.",
        display_name
    )
}

#[async_trait]
impl CommandHandler for HelpCommand {
    async fn execute(&self, ctx: &CommandContext) -> Result<(), Error> {
        ctx.reply(help_text(&ctx.user.display_name)).await
    }
}
