//! Harness configuration.
//!
//! Supports configuration from:
//! - TOML config files
//! - Environment variables

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{HarnessError, Result};

/// Main configuration struct
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Connection negotiation settings
    #[serde(default)]
    pub connect: ConnectConfig,

    /// Conversation provisioning settings
    #[serde(default)]
    pub conversation: ConversationConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let content = std::fs::read_to_string(&path)
            .map_err(|e| HarnessError::Config(format!("failed to read config file: {e}")))?;

        toml::from_str(&content)
            .map_err(|e| HarnessError::Config(format!("failed to parse config: {e}")))
    }

    /// Default per-user config file location, if the platform has one
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("botlink").join("config.toml"))
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(greeting) = std::env::var("BOTLINK_CONNECT_GREETING") {
            config.connect.greeting = greeting;
        }
        if let Ok(name) = std::env::var("BOTLINK_GROUP_NAME") {
            config.conversation.group_name = name;
        }

        config
    }

    /// Merge with another config (other takes precedence)
    pub fn merge(self, other: Self) -> Self {
        Self {
            connect: ConnectConfig {
                greeting: if other.connect.greeting != ConnectConfig::default().greeting {
                    other.connect.greeting
                } else {
                    self.connect.greeting
                },
            },
            conversation: ConversationConfig {
                group_name: if other.conversation.group_name
                    != ConversationConfig::default().group_name
                {
                    other.conversation.group_name
                } else {
                    self.conversation.group_name
                },
            },
        }
    }
}

/// Connection negotiation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectConfig {
    /// Greeting payload sent with every connection request
    pub greeting: String,
}

impl Default for ConnectConfig {
    fn default() -> Self {
        Self {
            greeting: "hello there".to_string(),
        }
    }
}

/// Conversation provisioning configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationConfig {
    /// Name given to newly created group conversations
    pub group_name: String,
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            group_name: "bot scenario".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.connect.greeting, "hello there");
        assert_eq!(config.conversation.group_name, "bot scenario");
    }

    #[test]
    fn test_config_from_toml() {
        let toml = r#"
            [connect]
            greeting = "hi, let's talk"

            [conversation]
            group_name = "smoke test room"
        "#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.connect.greeting, "hi, let's talk");
        assert_eq!(config.conversation.group_name, "smoke test room");
    }

    #[test]
    fn test_config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[connect]\ngreeting = \"from file\"").unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.connect.greeting, "from file");
        // Unset sections fall back to defaults.
        assert_eq!(config.conversation.group_name, "bot scenario");
    }

    #[test]
    fn test_config_from_env_overrides() {
        std::env::set_var("BOTLINK_CONNECT_GREETING", "env greeting");
        std::env::set_var("BOTLINK_GROUP_NAME", "env room");
        let both = Config::from_env();

        std::env::remove_var("BOTLINK_GROUP_NAME");
        let partial = Config::from_env();
        std::env::remove_var("BOTLINK_CONNECT_GREETING");

        assert_eq!(both.connect.greeting, "env greeting");
        assert_eq!(both.conversation.group_name, "env room");

        // Unset variables leave their fields at defaults.
        assert_eq!(partial.connect.greeting, "env greeting");
        assert_eq!(partial.conversation.group_name, "bot scenario");
    }

    #[test]
    fn test_default_path_under_config_dir() {
        // Platforms without a config dir legitimately return None.
        if let Some(path) = Config::default_path() {
            assert!(path.ends_with("botlink/config.toml"));
        }
    }

    #[test]
    fn test_config_merge_prefers_non_default() {
        let base = Config {
            connect: ConnectConfig {
                greeting: "base greeting".to_string(),
            },
            ..Default::default()
        };
        let overlay = Config {
            conversation: ConversationConfig {
                group_name: "overlay room".to_string(),
            },
            ..Default::default()
        };

        let merged = base.merge(overlay);
        assert_eq!(merged.connect.greeting, "base greeting");
        assert_eq!(merged.conversation.group_name, "overlay room");
    }
}
