mod cli;

use discnav::{config, replay};
use discnav_engine::{classify, PackageOrigin, ResumeState, ResumeStateCodec};

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands, ResumeCommands};
use std::path::Path;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "discnav=trace,discnav_engine=trace,discnav_overlay=trace,discnav_common=debug"
                .to_string()
        } else {
            "discnav=info,discnav_engine=info,discnav_overlay=warn".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Inspect { path, json } => inspect(&path, json),
        Commands::Replay { script } => run_replay(&script, cli.config.as_deref()),
        Commands::Resume { command } => match command {
            ResumeCommands::Encode { playlist } => {
                let state = ResumeState {
                    playlist_id: playlist.into(),
                };
                println!("{}", ResumeStateCodec::encode(&state));
                Ok(())
            }
            ResumeCommands::Decode { text } => {
                let state = ResumeStateCodec::decode(&text).context("Invalid resume record")?;
                println!("playlist {}", state.playlist_id);
                Ok(())
            }
        },
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("discnav {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn inspect(path: &Path, json: bool) -> Result<()> {
    let location = classify(path).with_context(|| format!("Cannot open {:?}", path))?;

    let (kind, package_path) = match &location.origin {
        PackageOrigin::DirectoryTree { root } => ("directory", root),
        PackageOrigin::StreamedImage { image } => ("image", image),
        PackageOrigin::RawDevice { device } => ("device", device),
    };

    if json {
        let value = serde_json::json!({
            "origin": kind,
            "path": package_path.display().to_string(),
            "playlist": location.playlist_hint.map(|p| p.0),
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        println!("Origin: {}", kind);
        println!("Path: {}", package_path.display());
        if let Some(playlist) = location.playlist_hint {
            println!("Playlist: {}", playlist.file_name());
        }
    }

    Ok(())
}

fn run_replay(script_path: &Path, config_path: Option<&Path>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let script = replay::ReplayScript::load(script_path)?;

    tracing::info!("Replaying {:?}", script_path);
    let transcript = replay::replay(script, &config, script_path);

    for entry in &transcript {
        println!("{}", serde_json::to_string(entry)?);
    }

    if let Some(replay::ReplayEntry::OpenFailed { message, .. }) = transcript.first() {
        anyhow::bail!("{}", message);
    }

    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            println!("✓ Configuration is valid");
            println!("  Mode: {:?}", config.engine.mode);
            println!(
                "  Languages: audio {}, subtitle {}, menu {}",
                config.player.audio_language,
                config.player.subtitle_language,
                config.player.menu_language
            );
            println!("  Region: {}", config.player.region_code);
            println!("  Event numbering: {:?}", config.engine.event_numbering);
        }
        None => {
            println!("No config file specified, using defaults");
            let config = config::Config::default();
            println!("Default config:");
            println!("  Mode: {:?}", config.engine.mode);
            println!("  Region: {}", config.player.region_code);
        }
    }

    Ok(())
}
