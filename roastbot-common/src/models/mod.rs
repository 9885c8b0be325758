// File: roastbot-common/src/models/mod.rs
pub mod chat;
pub mod snapshot;

pub use chat::{ChatMessage, ChatUser, OutboundMessage};
pub use snapshot::{ChannelSnapshot, CommandSnapshot, ModuleSnapshot};
