// File: roastbot-core/src/registry/channel.rs

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tracing::info;

use roastbot_common::models::{ChannelSnapshot, ModuleSnapshot};

use crate::Error;
use crate::registry::{Command, Module};
use crate::services::builtin_commands;

/// Name of the module every channel is created with.
pub const DEFAULT_MODULE: &str = "default";

/// A joined chat room and its module registry.
pub struct Channel {
    name: String,
    joined_at: DateTime<Utc>,
    modules: RwLock<Vec<Arc<Module>>>,
}

impl Channel {
    /// Creates the channel with its default module (help, uptime) already enabled.
    pub fn new(name: &str) -> Self {
        let name = super::normalize_channel(name);
        info!("initialising default module for channel '{}'", name);

        let default = Module::new(DEFAULT_MODULE);
        for command in builtin_commands::default_commands() {
            // Fresh module, names are distinct.
            let _ = default.add_command(command);
        }

        Self {
            name,
            joined_at: Utc::now(),
            modules: RwLock::new(vec![Arc::new(default)]),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn joined_at(&self) -> DateTime<Utc> {
        self.joined_at
    }

    pub fn module(&self, name: &str) -> Option<Arc<Module>> {
        let name = super::normalize_name(name);
        self.modules.read().iter().find(|m| m.name() == name).cloned()
    }

    fn require_module(&self, name: &str) -> Result<Arc<Module>, Error> {
        self.module(name).ok_or_else(|| Error::ModuleNotFound {
            channel: self.name.clone(),
            module: name.to_string(),
        })
    }

    /// Modules in registration order; the default module is always first.
    pub fn modules(&self) -> Vec<Arc<Module>> {
        self.modules.read().clone()
    }

    pub fn add_module(&self, name: &str) -> Result<Arc<Module>, Error> {
        let module = Arc::new(Module::new(name));
        let mut modules = self.modules.write();
        if modules.iter().any(|m| m.name() == module.name()) {
            return Err(Error::ModuleAlreadyExists {
                channel: self.name.clone(),
                module: module.name().to_string(),
            });
        }
        modules.push(module.clone());
        Ok(module)
    }

    /// Adds `command` to `module`, creating the module first if needed.
    pub fn add_command(&self, module: &str, command: Command) -> Result<Arc<Command>, Error> {
        let module = {
            let mut modules = self.modules.write();
            let key = super::normalize_name(module);
            match modules.iter().find(|m| m.name() == key) {
                Some(m) => m.clone(),
                None => {
                    let m = Arc::new(Module::new(&key));
                    modules.push(m.clone());
                    m
                }
            }
        };
        module.add_command(command)
    }

    pub fn enable_module(&self, module: &str) -> Result<(), Error> {
        self.require_module(module)?.set_enabled(true);
        Ok(())
    }

    pub fn disable_module(&self, module: &str) -> Result<(), Error> {
        self.require_module(module)?.set_enabled(false);
        Ok(())
    }

    pub fn is_module_enabled(&self, module: &str) -> bool {
        self.module(module).map_or(false, |m| m.is_enabled())
    }

    pub fn enable_command(&self, module: &str, command: &str) -> Result<(), Error> {
        self.require_module(module)?.enable_command(command)
    }

    pub fn disable_command(&self, module: &str, command: &str) -> Result<(), Error> {
        self.require_module(module)?.disable_command(command)
    }

    /// Resolves `args[0]` to a command.
    ///
    /// Enabled modules are scanned in registration order and the first module holding a
    /// command with that keyword wins, even if the command itself is disabled: a later
    /// module defining the same keyword is never consulted. Disabled-ness is left for the
    /// caller to check.
    pub fn match_command(&self, args: &[String]) -> Option<(Arc<Module>, Arc<Command>)> {
        let keyword = args.first()?;
        if keyword.is_empty() {
            return None;
        }
        for module in self.modules() {
            if !module.is_enabled() {
                continue;
            }
            if let Some(command) = module.find_by_keyword(keyword) {
                return Some((module, command));
            }
        }
        None
    }

    pub fn module_snapshots(&self) -> Vec<ModuleSnapshot> {
        self.modules().iter().map(|m| m.snapshot()).collect()
    }

    pub fn snapshot(&self) -> ChannelSnapshot {
        ChannelSnapshot {
            name: self.name.clone(),
            modules: self.module_snapshots(),
            joined_at: self.joined_at,
        }
    }
}

impl std::fmt::Debug for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Channel")
            .field("name", &self.name)
            .field("modules", &self.modules.read().len())
            .finish()
    }
}
