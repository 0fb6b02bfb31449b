//! Disc data model: titles, playlists, clips, chapters and disc-level info.
//!
//! These are immutable snapshots handed out by the package backend. The
//! navigation engine replaces them wholesale instead of mutating them.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a playlist (`BDMV/PLAYLIST/NNNNN.mpls`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlaylistId(pub u32);

impl PlaylistId {
    /// File name of the playlist inside `BDMV/PLAYLIST`.
    pub fn file_name(self) -> String {
        format!("{self}.mpls")
    }
}

impl fmt::Display for PlaylistId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:05}", self.0)
    }
}

impl From<u32> for PlaylistId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

/// Reference to a top-level title as signalled by the package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TitleSelector {
    /// The disc's root menu.
    TopMenu,
    /// The title played on insertion.
    FirstPlay,
    /// A numbered feature title.
    Index(u32),
}

impl fmt::Display for TitleSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TitleSelector::TopMenu => write!(f, "top menu"),
            TitleSelector::FirstPlay => write!(f, "first play"),
            TitleSelector::Index(idx) => write!(f, "title {idx}"),
        }
    }
}

/// Interactive technology used by a title's menus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MenuTechnology {
    /// Movie-object menus with button geometry the engine can hit-test.
    #[default]
    Hdmv,
    /// Programmatic menus; button geometry is not exposed.
    Bdj,
}

impl MenuTechnology {
    /// Whether pointer move/click can be forwarded for this technology.
    pub fn supports_pointer(self) -> bool {
        matches!(self, MenuTechnology::Hdmv)
    }
}

/// A chapter mark inside a playlist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chapter {
    /// Offset from the start of the playlist in milliseconds.
    pub start_ms: u64,
    /// Chapter length in milliseconds.
    #[serde(default)]
    pub duration_ms: u64,
}

/// Elementary stream type inside a clip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamKind {
    Video,
    Audio,
    Subtitle,
    Graphics,
}

/// One entry of a clip's stream table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamEntry {
    /// Transport stream PID.
    pub pid: u16,
    /// Coding type as reported by the package (e.g. "H.264", "DTS-HD MA").
    #[serde(default)]
    pub coding: String,
    /// ISO 639-2 language code; empty when the package carries none.
    #[serde(default)]
    pub language: String,
}

/// A contiguous multiplexed segment referenced by a playlist.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Clip {
    /// Clip file id (`BDMV/STREAM/NNNNN.m2ts`).
    #[serde(default)]
    pub clip_id: String,
    #[serde(default)]
    pub video_streams: Vec<StreamEntry>,
    #[serde(default)]
    pub audio_streams: Vec<StreamEntry>,
    #[serde(default)]
    pub subtitle_streams: Vec<StreamEntry>,
    #[serde(default)]
    pub graphics_streams: Vec<StreamEntry>,
}

impl Clip {
    /// Stream table for one stream type.
    pub fn streams(&self, kind: StreamKind) -> &[StreamEntry] {
        match kind {
            StreamKind::Video => &self.video_streams,
            StreamKind::Audio => &self.audio_streams,
            StreamKind::Subtitle => &self.subtitle_streams,
            StreamKind::Graphics => &self.graphics_streams,
        }
    }

    /// Find a stream by PID across every table.
    pub fn find_pid(&self, pid: u16) -> Option<(StreamKind, &StreamEntry)> {
        [
            StreamKind::Video,
            StreamKind::Audio,
            StreamKind::Subtitle,
            StreamKind::Graphics,
        ]
        .into_iter()
        .find_map(|kind| {
            self.streams(kind)
                .iter()
                .find(|s| s.pid == pid)
                .map(|s| (kind, s))
        })
    }
}

/// Immutable snapshot of a title/playlist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Title {
    /// Playlist backing this title.
    pub playlist: PlaylistId,
    /// Total duration in milliseconds.
    pub duration_ms: u64,
    #[serde(default)]
    pub chapters: Vec<Chapter>,
    #[serde(default)]
    pub clips: Vec<Clip>,
    /// Number of alternate angles (at least 1).
    #[serde(default = "default_angle_count")]
    pub angle_count: u32,
    #[serde(default)]
    pub menu_technology: MenuTechnology,
}

fn default_angle_count() -> u32 {
    1
}

impl Title {
    /// Create a title without chapters or clips.
    pub fn new(playlist: PlaylistId, duration_ms: u64) -> Self {
        Self {
            playlist,
            duration_ms,
            chapters: Vec::new(),
            clips: Vec::new(),
            angle_count: 1,
            menu_technology: MenuTechnology::Hdmv,
        }
    }

    /// Add chapters starting at the given offsets; durations are derived
    /// from the next mark or the title end.
    pub fn with_chapter_marks(mut self, starts_ms: &[u64]) -> Self {
        self.chapters = starts_ms
            .iter()
            .enumerate()
            .map(|(i, &start_ms)| {
                let end = starts_ms.get(i + 1).copied().unwrap_or(self.duration_ms);
                Chapter {
                    start_ms,
                    duration_ms: end.saturating_sub(start_ms),
                }
            })
            .collect();
        self
    }

    /// Append a clip.
    pub fn with_clip(mut self, clip: Clip) -> Self {
        self.clips.push(clip);
        self
    }

    /// Set the menu technology.
    pub fn with_menu_technology(mut self, tech: MenuTechnology) -> Self {
        self.menu_technology = tech;
        self
    }
}

/// Known content protection schemes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProtectionScheme {
    Aacs,
    #[serde(rename = "bdplus")]
    BdPlus,
    /// Decryption failed but the disc did not report which scheme.
    Unknown,
}

impl fmt::Display for ProtectionScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtectionScheme::Aacs => write!(f, "AACS"),
            ProtectionScheme::BdPlus => write!(f, "BD+"),
            ProtectionScheme::Unknown => write!(f, "an unidentified scheme"),
        }
    }
}

/// Detection/handling status of one protection scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SchemeStatus {
    #[serde(default)]
    pub detected: bool,
    #[serde(default)]
    pub handled: bool,
    /// Backend failure code, when one was reported.
    #[serde(default)]
    pub error_code: Option<i32>,
}

impl SchemeStatus {
    /// Protection present and not handled.
    pub fn is_blocking(&self) -> bool {
        self.detected && !self.handled
    }
}

/// Protection status of a disc.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProtectionInfo {
    #[serde(default)]
    pub aacs: SchemeStatus,
    #[serde(default)]
    pub bdplus: SchemeStatus,
}

impl ProtectionInfo {
    /// The first scheme that blocks playback, with its failure code.
    pub fn blocking_scheme(&self) -> Option<(ProtectionScheme, Option<i32>)> {
        if self.aacs.is_blocking() {
            Some((ProtectionScheme::Aacs, self.aacs.error_code))
        } else if self.bdplus.is_blocking() {
            Some((ProtectionScheme::BdPlus, self.bdplus.error_code))
        } else {
            None
        }
    }

    /// The scheme to blame for a decryption failure during playback.
    pub fn failing_scheme(&self) -> (ProtectionScheme, Option<i32>) {
        if let Some(blocking) = self.blocking_scheme() {
            blocking
        } else if self.bdplus.detected {
            (ProtectionScheme::BdPlus, self.bdplus.error_code)
        } else if self.aacs.detected {
            (ProtectionScheme::Aacs, self.aacs.error_code)
        } else {
            (ProtectionScheme::Unknown, None)
        }
    }
}

/// Disc-level capabilities reported by the package.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DiscInfo {
    #[serde(default)]
    pub first_play_supported: bool,
    #[serde(default)]
    pub top_menu_supported: bool,
    /// Number of numbered titles.
    #[serde(default)]
    pub title_count: u32,
    #[serde(default)]
    pub protection: ProtectionInfo,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_playlist_display_is_zero_padded() {
        assert_eq!(PlaylistId(10).to_string(), "00010");
        assert_eq!(PlaylistId(10).file_name(), "00010.mpls");
    }

    #[test]
    fn test_chapter_marks_derive_durations() {
        let title = Title::new(PlaylistId(1), 5_400_000).with_chapter_marks(&[
            0, 1_800_000, 3_600_000,
        ]);

        assert_eq!(title.chapters.len(), 3);
        assert_eq!(title.chapters[0].duration_ms, 1_800_000);
        assert_eq!(title.chapters[2].duration_ms, 1_800_000);
    }

    #[test]
    fn test_find_pid_searches_all_tables() {
        let clip = Clip {
            audio_streams: vec![StreamEntry {
                pid: 0x1100,
                coding: "AC-3".to_string(),
                language: "eng".to_string(),
            }],
            subtitle_streams: vec![StreamEntry {
                pid: 0x1200,
                coding: "PGS".to_string(),
                language: "fra".to_string(),
            }],
            ..Default::default()
        };

        let (kind, entry) = clip.find_pid(0x1200).unwrap();
        assert_eq!(kind, StreamKind::Subtitle);
        assert_eq!(entry.language, "fra");
        assert!(clip.find_pid(0x1011).is_none());
    }

    #[test]
    fn test_blocking_scheme_prefers_aacs() {
        let info = ProtectionInfo {
            aacs: SchemeStatus {
                detected: true,
                handled: false,
                error_code: Some(-1),
            },
            bdplus: SchemeStatus {
                detected: true,
                handled: false,
                error_code: None,
            },
        };
        assert_eq!(
            info.blocking_scheme(),
            Some((ProtectionScheme::Aacs, Some(-1)))
        );

        let handled = ProtectionInfo {
            aacs: SchemeStatus {
                detected: true,
                handled: true,
                error_code: None,
            },
            ..Default::default()
        };
        assert_eq!(handled.blocking_scheme(), None);
        assert_eq!(handled.failing_scheme(), (ProtectionScheme::Aacs, None));
        assert_eq!(
            ProtectionInfo::default().failing_scheme(),
            (ProtectionScheme::Unknown, None)
        );
    }

    #[test]
    fn test_pointer_policy() {
        assert!(MenuTechnology::Hdmv.supports_pointer());
        assert!(!MenuTechnology::Bdj.supports_pointer());
    }
}
