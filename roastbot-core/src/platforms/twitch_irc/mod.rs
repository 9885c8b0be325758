pub mod client;

pub use client::{ParsedIrcLine, TwitchIrcClient};
