use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "discnav")]
#[command(author, version, about = "Optical disc navigation engine")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show how a disc path would be opened
    Inspect {
        /// Disc directory, BDMV file, image or device
        #[arg(required = true)]
        path: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run the engine against a scripted disc and print what it reports
    Replay {
        /// Replay script (JSON)
        #[arg(required = true)]
        script: PathBuf,
    },

    /// Encode or decode resume records
    Resume {
        #[command(subcommand)]
        command: ResumeCommands,
    },

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },

    /// Display version information
    Version,
}

#[derive(Subcommand)]
pub enum ResumeCommands {
    /// Print the resume record for a playlist
    Encode {
        /// Playlist number
        #[arg(short, long)]
        playlist: u32,
    },

    /// Print the playlist stored in a resume record
    Decode {
        /// Resume record text
        text: String,
    },
}
