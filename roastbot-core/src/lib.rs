// src/lib.rs

pub mod platforms;
pub mod registry;
pub mod services;

pub use roastbot_common::error::Error;
pub use roastbot_common::models;
pub use registry::{Bot, Channel, Command, CommandContext, CommandHandler, Module};
pub use services::dispatcher::{Dispatch, Dispatcher};
pub use services::message_sender::OutboundSender;
