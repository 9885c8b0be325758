// src/error.rs
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("channel '{0}' is not configured")]
    ChannelNotFound(String),

    #[error("module with name '{module}' does not exist in channel '{channel}'")]
    ModuleNotFound { channel: String, module: String },

    #[error("command with name '{command}' does not exist in module '{module}'")]
    CommandNotFound { module: String, command: String },

    #[error("bot already contains channel with name '{0}'")]
    ChannelAlreadyExists(String),

    #[error("module '{module}' already exists in channel '{channel}'")]
    ModuleAlreadyExists { channel: String, module: String },

    #[error("command '{command}' already exists in module '{module}'")]
    DuplicateCommand { module: String, command: String },

    #[error("Invalid command syntax. Usage: {0}")]
    InvalidSyntax(String),

    #[error("user '{0}' is not allowed to use this command")]
    Unauthorized(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("outbound sender is closed")]
    SenderClosed,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// True for the channel/module/command lookup failures.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Error::ChannelNotFound(_) | Error::ModuleNotFound { .. } | Error::CommandNotFound { .. }
        )
    }

    /// True for duplicate registrations.
    pub fn is_already_exists(&self) -> bool {
        matches!(
            self,
            Error::ChannelAlreadyExists(_)
                | Error::ModuleAlreadyExists { .. }
                | Error::DuplicateCommand { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_families() {
        let nf = Error::ModuleNotFound { channel: "forsen".into(), module: "fun".into() };
        assert!(nf.is_not_found());
        assert!(!nf.is_already_exists());

        let dup = Error::DuplicateCommand { module: "fun".into(), command: "roll".into() };
        assert!(dup.is_already_exists());
        assert!(!dup.is_not_found());

        assert!(!Error::SenderClosed.is_not_found());
    }

    #[test]
    fn test_error_messages_name_the_entity() {
        let e = Error::CommandNotFound { module: "general".into(), command: "uptime".into() };
        assert_eq!(
            e.to_string(),
            "command with name 'uptime' does not exist in module 'general'"
        );
    }
}
