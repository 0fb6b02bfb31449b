use discnav_engine::backend::{BackendSettings, EventNumbering};
use discnav_engine::EngineSettings;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub player: PlayerConfig,

    #[serde(default)]
    pub engine: EngineConfig,
}

/// Preferences forwarded to the package when a disc is opened.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PlayerConfig {
    /// ISO 639-2 code for the preferred audio language
    #[serde(default = "default_language")]
    pub audio_language: String,

    /// ISO 639-2 code for the preferred subtitle language
    #[serde(default = "default_language")]
    pub subtitle_language: String,

    /// ISO 639-2 code for disc menus
    #[serde(default = "default_language")]
    pub menu_language: String,

    #[serde(default = "default_country")]
    pub country_code: String,

    /// Player region: A, B or C
    #[serde(default = "default_region")]
    pub region_code: String,

    /// Parental level (255 disables parental checks)
    #[serde(default = "default_parental_level")]
    pub parental_level: u8,
}

fn default_language() -> String {
    "eng".to_string()
}

fn default_country() -> String {
    "us".to_string()
}

fn default_region() -> String {
    "A".to_string()
}

fn default_parental_level() -> u8 {
    99
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            audio_language: default_language(),
            subtitle_language: default_language(),
            menu_language: default_language(),
            country_code: default_country(),
            region_code: default_region(),
            parental_level: default_parental_level(),
        }
    }
}

/// How discs are opened.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackMode {
    /// Interactive menus from first-play
    #[default]
    Menu,
    /// Play the main title directly
    Direct,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub mode: PlaybackMode,

    /// Pause after the package reports it is idle (default: 100)
    #[serde(default = "default_idle_sleep_ms")]
    pub idle_sleep_ms: u64,

    /// Empty package reads before a read returns retry (default: 64)
    #[serde(default = "default_read_retry_limit")]
    pub read_retry_limit: u32,

    /// Event code generation of the package library
    #[serde(default)]
    pub event_numbering: EventNumbering,
}

fn default_idle_sleep_ms() -> u64 {
    100
}

fn default_read_retry_limit() -> u32 {
    64
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            mode: PlaybackMode::default(),
            idle_sleep_ms: default_idle_sleep_ms(),
            read_retry_limit: default_read_retry_limit(),
            event_numbering: EventNumbering::default(),
        }
    }
}

impl Config {
    /// Package settings for this configuration. Call after validation.
    pub fn backend_settings(&self) -> BackendSettings {
        BackendSettings {
            audio_language: self.player.audio_language.clone(),
            subtitle_language: self.player.subtitle_language.clone(),
            menu_language: self.player.menu_language.clone(),
            country_code: self.player.country_code.clone(),
            region_code: self
                .player
                .region_code
                .chars()
                .next()
                .map_or('A', |c| c.to_ascii_uppercase()),
            parental_level: self.player.parental_level,
            event_numbering: self.engine.event_numbering,
        }
    }

    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            idle_sleep: Duration::from_millis(self.engine.idle_sleep_ms),
            read_retry_limit: self.engine.read_retry_limit,
        }
    }
}
