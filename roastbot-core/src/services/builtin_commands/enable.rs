//! `enable|disable -m <module> [-c <command>]`, operator only.

use async_trait::async_trait;
use tracing::{debug, info};

use crate::Error;
use crate::registry::{CommandContext, CommandHandler, DEFAULT_MODULE, normalize_name};

pub const TOGGLE_USAGE: &str = "enable|disable -m module_name [-c command_name]";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToggleRequest {
    pub enable: bool,
    pub module: String,
    pub command: Option<String>,
}

/// Parses the argument list, verb included. Flags may come in any order; a flag
/// without a following value is ignored, and a later flag overrides an earlier one.
pub fn parse_toggle_args(args: &[String]) -> Result<ToggleRequest, Error> {
    let invalid = || Error::InvalidSyntax(TOGGLE_USAGE.to_string());

    let (verb, rest) = args.split_first().ok_or_else(invalid)?;
    let enable = match verb.to_lowercase().as_str() {
        "enable" => true,
        "disable" => false,
        _ => return Err(invalid()),
    };

    let mut module = None;
    let mut command = None;
    for (i, flag) in rest.iter().enumerate() {
        let Some(value) = rest.get(i + 1) else { break };
        match flag.to_lowercase().as_str() {
            "-m" | "--module" => module = Some(value.clone()),
            "-c" | "--command" => command = Some(value.clone()),
            _ => {}
        }
    }

    let module = module.filter(|m| !m.is_empty()).ok_or_else(invalid)?;
    Ok(ToggleRequest {
        enable,
        module,
        command: command.filter(|c| !c.is_empty()),
    })
}

pub struct ToggleCommand;

#[async_trait]
impl CommandHandler for ToggleCommand {
    async fn execute(&self, ctx: &CommandContext) -> Result<(), Error> {
        if !ctx.user.username.eq_ignore_ascii_case(ctx.bot.operator()) {
            return Err(Error::Unauthorized(ctx.user.username.clone()));
        }

        let req = parse_toggle_args(&ctx.args)?;
        if normalize_name(&req.module) == DEFAULT_MODULE {
            debug!("ignoring toggle of the default module in '{}'", ctx.channel);
            return Ok(());
        }

        let bot = &ctx.bot;
        let (verb, reply) = match (&req.command, req.enable) {
            (None, true) => {
                bot.enable_module(&ctx.channel, &req.module)?;
                ("enabled", format!("Enabled module '{}'", req.module))
            }
            (None, false) => {
                bot.disable_module(&ctx.channel, &req.module)?;
                ("disabled", format!("Disabled module '{}'", req.module))
            }
            (Some(cmd), true) => {
                bot.enable_command(&ctx.channel, &req.module, cmd)?;
                ("enabled", format!("Enabled command '{}' in module '{}'", cmd, req.module))
            }
            (Some(cmd), false) => {
                bot.disable_command(&ctx.channel, &req.module, cmd)?;
                ("disabled", format!("Disabled command '{}' in module '{}'", cmd, req.module))
            }
        };

        info!(
            channel = %ctx.channel,
            module = %req.module,
            command = req.command.as_deref().unwrap_or("*"),
            "{} by operator",
            verb
        );
        ctx.reply(reply).await
    }
}
