mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::Path;

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    validate_config(&config)?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    // Try default locations
    let default_paths = [
        "./discnav.toml",
        "~/.config/discnav/config.toml",
        "/etc/discnav/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            tracing::debug!("Using config file {:?}", path);
            return load_config(path);
        }
    }

    Ok(Config::default())
}

fn is_language_code(code: &str) -> bool {
    code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic())
}

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    let player = &config.player;

    for (field, code) in [
        ("audio_language", &player.audio_language),
        ("subtitle_language", &player.subtitle_language),
        ("menu_language", &player.menu_language),
    ] {
        if !is_language_code(code) {
            anyhow::bail!("player.{} must be a 3-letter language code, got '{}'", field, code);
        }
    }

    if !matches!(player.region_code.to_ascii_uppercase().as_str(), "A" | "B" | "C") {
        anyhow::bail!(
            "player.region_code must be A, B or C, got '{}'",
            player.region_code
        );
    }

    if player.country_code.len() != 2 {
        tracing::warn!("Unusual country code: {:?}", player.country_code);
    }

    if config.engine.read_retry_limit == 0 {
        anyhow::bail!("engine.read_retry_limit cannot be 0");
    }

    Ok(())
}
