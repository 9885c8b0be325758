//! Read-only views of the registry, safe to hand to other tasks or serialise.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSnapshot {
    pub name: String,
    pub keyword: String,
    pub enabled: bool,
    pub cooldown_seconds: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleSnapshot {
    pub name: String,
    pub enabled: bool,
    pub commands: Vec<CommandSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelSnapshot {
    pub name: String,
    pub modules: Vec<ModuleSnapshot>,
    pub joined_at: DateTime<Utc>,
}
