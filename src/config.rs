use crate::error::{config_error, env_error, AppResult};
use dotenvy::dotenv;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fs;
use url::Url;

/// Backend address used when `BACKEND_URL` is not set
pub const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:5000";

/// Locale used when `UI_LOCALE` is not set
pub const DEFAULT_LOCALE: &str = "en";

/// Component toggle for speech recognition input
pub const VOICE_INPUT: &str = "voice_input";

/// Component toggle for synthesized speech output
pub const VOICE_OUTPUT: &str = "voice_output";

const COMPONENTS_FILE: &str = "config/components.toml";

/// Main configuration structure for the client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the calendar assistant backend
    pub backend_url: String,
    /// Cookie header value of an existing backend session
    pub session_cookie: Option<String>,
    /// IANA timezone used as local time; system local time when unset
    pub timezone: Option<String>,
    /// Locale for user-visible strings
    pub ui_locale: String,
    /// Command that listens once and prints the final transcript
    pub speech_recognizer_cmd: Option<String>,
    /// Command that plays the audio file passed as its last argument
    pub audio_player_cmd: Option<String>,
    /// Map of component names to their enabled status
    pub components: HashMap<String, bool>,
}

impl Config {
    /// Load configuration from environment and config file
    pub fn load() -> AppResult<Self> {
        // Load .env file if it exists
        dotenv().ok();

        let mut config = Self::from_vars(|key| env::var(key).ok())?;

        // Load components configuration from file if it exists
        if let Ok(content) = fs::read_to_string(COMPONENTS_FILE) {
            config.merge_components(&content)?;
        }

        Ok(config)
    }

    /// Build a configuration from a variable lookup
    pub fn from_vars<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let backend_url =
            non_empty("BACKEND_URL").unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string());
        Url::parse(&backend_url).map_err(|_| env_error("BACKEND_URL"))?;

        let timezone = non_empty("TIMEZONE");
        if let Some(tz) = &timezone {
            tz.parse::<chrono_tz::Tz>()
                .map_err(|_| config_error(&format!("Unknown timezone: {}", tz)))?;
        }

        let ui_locale = non_empty("UI_LOCALE").unwrap_or_else(|| DEFAULT_LOCALE.to_string());

        // Initialize default components
        let mut components = HashMap::new();
        components.insert(VOICE_INPUT.to_string(), true);
        components.insert(VOICE_OUTPUT.to_string(), true);

        Ok(Config {
            backend_url,
            session_cookie: non_empty("SESSION_COOKIE"),
            timezone,
            ui_locale,
            speech_recognizer_cmd: non_empty("SPEECH_RECOGNIZER_CMD"),
            audio_player_cmd: non_empty("AUDIO_PLAYER_CMD"),
            components,
        })
    }

    /// Merge component toggles from TOML content over the defaults
    pub fn merge_components(&mut self, content: &str) -> AppResult<()> {
        let file_components = toml::from_str::<HashMap<String, bool>>(content)?;
        for (key, value) in file_components {
            self.components.insert(key, value);
        }
        Ok(())
    }

    /// Check if a component is enabled
    pub fn is_component_enabled(&self, name: &str) -> bool {
        *self.components.get(name).unwrap_or(&false)
    }
}
