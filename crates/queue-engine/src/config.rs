//! Queue engine configuration
//!
//! Configuration covering dialog behavior (voices, languages, gather
//! timeouts), queue-status estimation (statistics window, position cap),
//! callback task creation (priority), and media asset references.
//!
//! # Examples
//!
//! ```
//! use holdline_queue_engine::config::QueueEngineConfig;
//!
//! let mut config = QueueEngineConfig::default();
//! config.base_url = "https://voice.example.com".to_string();
//! config.validate().expect("configuration should be valid");
//!
//! assert_eq!(config.callback_priority, 50);
//! assert_eq!(config.stats_window_minutes, 5);
//! assert_eq!(config.max_queue_position, 20);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{QueueEngineError, Result};

/// Configuration for the in-queue voice menu engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueEngineConfig {
    /// Public base URL of this service, used to build continuation URLs and
    /// media asset URLs (no trailing slash)
    pub base_url: String,

    /// Default TTS voice when the inbound step carries none
    pub default_voice: String,

    /// Default language tag when the inbound step carries none
    pub default_language: String,

    /// Trailing window, in minutes, for cumulative wait statistics
    pub stats_window_minutes: u32,

    /// Maximum queue depth inspected when locating the caller's position.
    /// Callers deeper than this hear "more than N ahead".
    pub max_queue_position: usize,

    /// Priority assigned to created callback tasks
    pub callback_priority: u32,

    /// Gather timeout for the main-menu digit prompts, in seconds
    pub menu_gather_timeout_secs: u32,

    /// Gather timeout for the callback-menu digit prompts, in seconds
    pub callback_gather_timeout_secs: u32,

    /// Hold music asset path, relative to `base_url`
    pub hold_music_path: String,

    /// Agent audible alert tone path, relative to `base_url`; carried on
    /// callback tasks as the ringback attribute
    pub alert_tone_path: String,
}

impl Default for QueueEngineConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            default_voice: "Polly.Joanna".to_string(),
            default_language: "en-US".to_string(),
            stats_window_minutes: 5,
            max_queue_position: 20,
            callback_priority: 50,
            menu_gather_timeout_secs: 2,
            callback_gather_timeout_secs: 5,
            hold_music_path: "/guitar_music.mp3".to_string(),
            alert_tone_path: "/alertTone.mp3".to_string(),
        }
    }
}

impl QueueEngineConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.base_url.ends_with('/') {
            return Err(QueueEngineError::configuration(
                "base_url must not end with a slash",
            ));
        }
        if self.stats_window_minutes == 0 {
            return Err(QueueEngineError::configuration(
                "stats_window_minutes must be at least 1",
            ));
        }
        if self.max_queue_position < 2 {
            return Err(QueueEngineError::configuration(
                "max_queue_position must be at least 2",
            ));
        }
        if self.default_voice.is_empty() || self.default_language.is_empty() {
            return Err(QueueEngineError::configuration(
                "default voice and language must be set",
            ));
        }
        if !self.hold_music_path.starts_with('/') || !self.alert_tone_path.starts_with('/') {
            return Err(QueueEngineError::configuration(
                "asset paths must start with a slash",
            ));
        }
        Ok(())
    }

    /// Absolute URL of the hold music asset
    pub fn hold_music_url(&self) -> String {
        format!("{}{}", self.base_url, self.hold_music_path)
    }

    /// Absolute URL of the agent alert tone asset
    pub fn alert_tone_url(&self) -> String {
        format!("{}{}", self.base_url, self.alert_tone_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = QueueEngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.callback_priority, 50);
        assert_eq!(config.stats_window_minutes, 5);
        assert_eq!(config.max_queue_position, 20);
        assert_eq!(config.default_voice, "Polly.Joanna");
        assert_eq!(config.default_language, "en-US");
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = QueueEngineConfig::default();
        config.stats_window_minutes = 0;
        assert!(config.validate().is_err());

        let mut config = QueueEngineConfig::default();
        config.base_url = "https://voice.example.com/".to_string();
        assert!(config.validate().is_err());

        let mut config = QueueEngineConfig::default();
        config.hold_music_path = "guitar_music.mp3".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_asset_urls() {
        let mut config = QueueEngineConfig::default();
        config.base_url = "https://voice.example.com".to_string();
        assert_eq!(
            config.hold_music_url(),
            "https://voice.example.com/guitar_music.mp3"
        );
        assert_eq!(
            config.alert_tone_url(),
            "https://voice.example.com/alertTone.mp3"
        );
    }
}
