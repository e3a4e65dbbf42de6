use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::badge::DEFAULT_BADGE_COLOR;

/// Main configuration.
///
/// Example YAML:
/// ```yaml
/// user: alice
/// data_dir: /home/alice/.local/share/snooze-bro
/// badge_color: "#3C5A99"
/// allowed_urls:
///   - "http://*"
///   - "https://*"
/// notification_icon: icons/icon-128.png
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// User whose snooze list commands act on
    #[serde(default = "default_user")]
    pub user: String,

    /// Root of the local and sync store directories
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,

    /// Badge background, "#RRGGBB"
    #[serde(default = "default_badge_color")]
    pub badge_color: String,

    /// Glob patterns a tab URL must match to be snoozable
    #[serde(default = "default_allowed_urls")]
    pub allowed_urls: Vec<String>,

    #[serde(default = "default_notification_icon")]
    pub notification_icon: String,
}

fn default_user() -> String {
    "default".to_string()
}

fn default_badge_color() -> String {
    DEFAULT_BADGE_COLOR.to_string()
}

fn default_allowed_urls() -> Vec<String> {
    vec!["http://*".to_string(), "https://*".to_string()]
}

fn default_notification_icon() -> String {
    "icons/icon-128.png".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            user: default_user(),
            data_dir: None,
            badge_color: default_badge_color(),
            allowed_urls: default_allowed_urls(),
            notification_icon: default_notification_icon(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: Config = serde_saphyr::from_str("{}").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_partial_config_parse() {
        let yaml = r##"
user: alice
badge_color: "#FF0000"
"##;
        let config: Config = serde_saphyr::from_str(yaml).unwrap();
        assert_eq!(config.user, "alice");
        assert_eq!(config.badge_color, "#FF0000");
        assert_eq!(config.allowed_urls.len(), 2);
        assert!(config.data_dir.is_none());
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result: Result<Config, _> = serde_saphyr::from_str("colour: red\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_config_serde_roundtrip() {
        let config = Config {
            data_dir: Some(PathBuf::from("/tmp/snooze")),
            ..Config::default()
        };
        let yaml = serde_saphyr::to_string(&config).unwrap();
        let parsed: Config = serde_saphyr::from_str(&yaml).unwrap();
        assert_eq!(config, parsed);
    }
}
