// File: roastbot-core/src/services/builtin_commands/mod.rs
//! Commands every channel gets: `help` and `uptime` in the default module, and the
//! operator-only `enable`/`disable` pair in the `admin` module.

pub mod enable;
pub mod help;
pub mod uptime;

use std::sync::Arc;
use std::time::Duration;

use crate::Error;
use crate::registry::{Channel, Command};

pub const ADMIN_MODULE: &str = "admin";

const DEFAULT_COOLDOWN: Duration = Duration::from_secs(5);
const ADMIN_COOLDOWN: Duration = Duration::from_secs(1);

pub fn default_commands() -> Vec<Command> {
    vec![
        Command::new("help", "help", DEFAULT_COOLDOWN, Arc::new(help::HelpCommand)),
        Command::new("uptime", "uptime", DEFAULT_COOLDOWN, Arc::new(uptime::UptimeCommand)),
    ]
}

pub fn admin_commands() -> Vec<Command> {
    let toggle = Arc::new(enable::ToggleCommand);
    vec![
        Command::new("enable", "enable", ADMIN_COOLDOWN, toggle.clone()),
        Command::new("disable", "disable", ADMIN_COOLDOWN, toggle),
    ]
}

pub fn register_admin_module(channel: &Channel) -> Result<(), Error> {
    for command in admin_commands() {
        channel.add_command(ADMIN_MODULE, command)?;
    }
    Ok(())
}
