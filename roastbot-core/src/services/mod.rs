// File: roastbot-core/src/services/mod.rs

pub mod builtin_commands;
pub mod dispatcher;
pub mod mention;
pub mod message_sender;

pub use dispatcher::{Dispatch, Dispatcher};
pub use message_sender::OutboundSender;
