// File: roastbot-core/src/registry/module.rs

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::RwLock;

use roastbot_common::models::ModuleSnapshot;

use crate::Error;
use crate::registry::Command;

/// A named, independently toggleable group of commands.
/// Commands are kept in registration order so keyword resolution is stable.
pub struct Module {
    name: String,
    enabled: AtomicBool,
    commands: RwLock<Vec<Arc<Command>>>,
}

impl Module {
    /// New modules start enabled.
    pub fn new(name: &str) -> Self {
        Self {
            name: super::normalize_name(name),
            enabled: AtomicBool::new(true),
            commands: RwLock::new(Vec::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    pub(crate) fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }

    /// Adds a command. A name that is already taken leaves the module untouched.
    pub fn add_command(&self, command: Command) -> Result<Arc<Command>, Error> {
        let mut commands = self.commands.write();
        if commands.iter().any(|c| c.name() == command.name()) {
            return Err(Error::DuplicateCommand {
                module: self.name.clone(),
                command: command.name().to_string(),
            });
        }
        let command = Arc::new(command);
        commands.push(command.clone());
        Ok(command)
    }

    pub fn command(&self, name: &str) -> Option<Arc<Command>> {
        let name = super::normalize_name(name);
        self.commands.read().iter().find(|c| c.name() == name).cloned()
    }

    pub fn commands(&self) -> Vec<Arc<Command>> {
        self.commands.read().clone()
    }

    /// First command, in registration order, whose keyword equals `keyword`.
    pub fn find_by_keyword(&self, keyword: &str) -> Option<Arc<Command>> {
        self.commands.read().iter().find(|c| c.matches(keyword)).cloned()
    }

    pub fn enable_command(&self, name: &str) -> Result<(), Error> {
        self.set_command_enabled(name, true)
    }

    pub fn disable_command(&self, name: &str) -> Result<(), Error> {
        self.set_command_enabled(name, false)
    }

    fn set_command_enabled(&self, name: &str, enabled: bool) -> Result<(), Error> {
        let command = self.command(name).ok_or_else(|| Error::CommandNotFound {
            module: self.name.clone(),
            command: name.to_string(),
        })?;
        command.set_enabled(enabled);
        Ok(())
    }

    pub fn is_command_enabled(&self, name: &str) -> bool {
        self.command(name).map_or(false, |c| c.is_enabled())
    }

    pub fn snapshot(&self) -> ModuleSnapshot {
        ModuleSnapshot {
            name: self.name.clone(),
            enabled: self.is_enabled(),
            commands: self.commands().iter().map(|c| c.snapshot()).collect(),
        }
    }
}

impl std::fmt::Debug for Module {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Module")
            .field("name", &self.name)
            .field("enabled", &self.is_enabled())
            .field("commands", &self.commands.read().len())
            .finish()
    }
}
