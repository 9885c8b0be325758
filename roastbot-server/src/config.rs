// roastbot-server/src/config.rs
//! On-disk bot configuration.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use roastbot_core::Error;

fn default_operator() -> String {
    "roastedb".to_string()
}

fn default_send_interval_ms() -> u64 {
    1500
}

#[derive(Debug, Clone, Deserialize)]
pub struct BotConfig {
    /// Login name of the bot account; also the name users mention.
    pub username: String,
    pub oauth: String,
    #[serde(default)]
    pub channels: Vec<String>,
    #[serde(default = "default_operator")]
    pub operator: String,
    /// Minimum gap between two outbound chat lines.
    #[serde(default = "default_send_interval_ms")]
    pub send_interval_ms: u64,
    #[serde(default)]
    pub http_addr: Option<String>,
}

impl BotConfig {
    pub fn load(path: &Path) -> Result<Self, Error> {
        let raw = fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, Error> {
        let mut config: BotConfig = serde_json::from_str(raw)?;
        config.normalize()?;
        Ok(config)
    }

    fn normalize(&mut self) -> Result<(), Error> {
        self.username = self.username.trim().to_string();
        if self.username.is_empty() {
            return Err(Error::Config("username must not be empty".into()));
        }

        let token = self.oauth.trim();
        if token.is_empty() || token == "oauth:" {
            return Err(Error::Config("oauth token must not be empty".into()));
        }
        self.oauth = if token.starts_with("oauth:") {
            token.to_string()
        } else {
            format!("oauth:{}", token)
        };

        self.operator = self.operator.trim().to_lowercase();
        if self.operator.is_empty() {
            self.operator = default_operator();
        }
        Ok(())
    }

    pub fn send_interval(&self) -> Duration {
        Duration::from_millis(self.send_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_applied() {
        let cfg = BotConfig::from_json(r#"{"username": "RoastBot", "oauth": "abc123"}"#).unwrap();
        assert_eq!(cfg.username, "RoastBot");
        assert_eq!(cfg.oauth, "oauth:abc123");
        assert!(cfg.channels.is_empty());
        assert_eq!(cfg.operator, "roastedb");
        assert_eq!(cfg.send_interval(), Duration::from_millis(1500));
        assert!(cfg.http_addr.is_none());
    }

    #[test]
    fn test_full_config() {
        let cfg = BotConfig::from_json(
            r##"{
                "username": "roastbot",
                "oauth": "oauth:xyz",
                "channels": ["forsen", "#xqc"],
                "operator": "SomeStreamer",
                "send_interval_ms": 0,
                "http_addr": "127.0.0.1:8080"
            }"##,
        )
        .unwrap();
        assert_eq!(cfg.oauth, "oauth:xyz");
        assert_eq!(cfg.channels, ["forsen", "#xqc"]);
        assert_eq!(cfg.operator, "somestreamer");
        assert!(cfg.send_interval().is_zero());
        assert_eq!(cfg.http_addr.as_deref(), Some("127.0.0.1:8080"));
    }

    #[test]
    fn test_rejects_missing_credentials() {
        let err = BotConfig::from_json(r#"{"username": "  ", "oauth": "abc"}"#).unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let err = BotConfig::from_json(r#"{"username": "roastbot", "oauth": "oauth:"}"#).unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let err = BotConfig::from_json(r#"{"username": "roastbot"}"#).unwrap_err();
        assert!(matches!(err, Error::Json(_)));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"username": "roastbot", "oauth": "tok", "channels": ["forsen"]}}"#).unwrap();

        let cfg = BotConfig::load(file.path()).unwrap();
        assert_eq!(cfg.channels, ["forsen"]);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = BotConfig::load(&dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
