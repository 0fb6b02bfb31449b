//! The disc package protocol consumed by the engine.
//!
//! A package library (directory tree, streamed image or raw device) is
//! wrapped in a [`DiscBackend`]. The engine never sees the library's own
//! handles or callback tables, only this trait.

pub mod events;
pub mod scripted;

pub use events::{EventDecoder, EventNumbering, NavEvent, RawEvent};
pub use scripted::{ScriptStep, ScriptedBackend, ScriptedDisc, ScriptedProvider};

use discnav_common::{DiscInfo, PlaylistId, Title, TitleSelector};
use discnav_overlay::OverlayCommand;
use serde::{Deserialize, Serialize};
use std::io::{Read, Seek};
use std::path::Path;
use thiserror::Error;

/// Errors reported by a package backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// I/O error while accessing the package.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The package library rejected the request.
    #[error("Package operation failed: {0}")]
    Failed(String),

    /// The requested item does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Operation not available for this package.
    #[error("Unsupported: {0}")]
    Unsupported(&'static str),
}

impl BackendError {
    pub fn failed(msg: impl Into<String>) -> Self {
        Self::Failed(msg.into())
    }
}

/// Player preferences handed to the package when it is opened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendSettings {
    pub audio_language: String,
    pub subtitle_language: String,
    pub menu_language: String,
    pub country_code: String,
    /// Region letter: A, B or C.
    pub region_code: char,
    /// 0-255; 255 disables parental checks.
    pub parental_level: u8,
    pub event_numbering: EventNumbering,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            audio_language: "eng".to_string(),
            subtitle_language: "eng".to_string(),
            menu_language: "eng".to_string(),
            country_code: "us".to_string(),
            region_code: 'A',
            parental_level: 99,
            event_numbering: EventNumbering::Current,
        }
    }
}

/// Remote-control keys understood by interactive menus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NavKey {
    Up,
    Down,
    Left,
    Right,
    Enter,
    Digit(u8),
    Popup,
    RootMenu,
    /// Activate the button under the pointer.
    MouseActivate,
}

/// Menu sound clip fetched from the package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoundEffect {
    pub id: u32,
    pub sample_rate: u32,
    pub channels: u8,
    /// Interleaved signed 16-bit samples.
    #[serde(default)]
    pub samples: Vec<i16>,
}

/// Output of one navigation-mode read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadChunk {
    /// Bytes written to the caller's buffer.
    pub len: usize,
    /// Event raised alongside the data, `NavEvent::None` when there is none.
    pub event: NavEvent,
}

/// An opened disc package.
pub trait DiscBackend: Send {
    /// Disc-level capabilities and protection status.
    fn disc_info(&self) -> DiscInfo;

    /// Resolve a title. Numbered titles are 1-based.
    fn title_info(&mut self, title: TitleSelector, angle: u32) -> Option<Title>;

    fn playlist_info(&mut self, playlist: PlaylistId, angle: u32) -> Option<Title>;

    /// Select a playlist for direct playback.
    fn select_playlist(&mut self, playlist: PlaylistId) -> Result<(), BackendError>;

    /// Start interactive navigation from the first-play title.
    fn play(&mut self) -> Result<(), BackendError>;

    /// Navigation-mode read: data plus at most one event.
    fn read_ext(&mut self, buf: &mut [u8]) -> Result<ReadChunk, BackendError>;

    /// Direct-mode read: data only; events are queued for [`DiscBackend::next_event`].
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, BackendError>;

    /// Pop the next queued event.
    fn next_event(&mut self) -> Option<NavEvent>;

    /// Pop the next queued overlay command.
    fn next_overlay(&mut self) -> Option<OverlayCommand>;

    /// Position of the next byte to be read, in milliseconds.
    fn tell_time(&self) -> u64;

    /// Seek to a time; returns the position actually reached.
    fn seek_time(&mut self, time_ms: u64) -> Result<u64, BackendError>;

    /// Seek to a 0-based chapter index; returns the position reached.
    fn seek_chapter(&mut self, chapter: u32) -> Result<u64, BackendError>;

    fn user_input(&mut self, key: NavKey) -> Result<(), BackendError>;

    fn mouse_select(&mut self, x: u32, y: u32) -> Result<(), BackendError>;

    /// Open the menu through the disc's explicit menu call.
    fn menu_call(&mut self) -> Result<(), BackendError>;

    /// Advance past the current still frame.
    fn skip_still(&mut self);

    fn sound_effect(&mut self, id: u32) -> Result<SoundEffect, BackendError>;

    /// Release the package. Further calls are not expected.
    fn close(&mut self) {}
}

/// Seekable byte source for single-file images.
pub trait ImageReader: Read + Seek + Send {}

impl<T: Read + Seek + Send> ImageReader for T {}

/// Opens packages. One implementation per package library.
pub trait PackageProvider: Send + Sync {
    /// Open a directory tree or raw device by path.
    fn open_path(
        &self,
        path: &Path,
        settings: &BackendSettings,
    ) -> Result<Box<dyn DiscBackend>, BackendError>;

    /// Open a single-file image through a caller-supplied reader.
    fn open_reader(
        &self,
        reader: Box<dyn ImageReader>,
        settings: &BackendSettings,
    ) -> Result<Box<dyn DiscBackend>, BackendError>;
}
