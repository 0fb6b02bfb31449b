//! Typed navigation events and the raw event-code adapter.
//!
//! Package libraries report events as `(code, param)` pairs. Older library
//! versions lack the play-mark slot, so every code from that slot on is one
//! lower than on current versions. [`EventDecoder`] owns that translation;
//! the engine's transition table only ever sees [`NavEvent`].

use discnav_common::{PlaylistId, TitleSelector};
use serde::{Deserialize, Serialize};

/// Event emitted by the package while reading or navigating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", content = "param", rename_all = "snake_case")]
pub enum NavEvent {
    #[default]
    None,
    /// Unrecoverable package failure.
    FatalError,
    /// A single read failed; the package continues.
    ReadError,
    /// Encrypted content could not be decrypted.
    Encrypted,
    AngleChanged(u32),
    TitleChanged(TitleSelector),
    PlaylistChanged(PlaylistId),
    PlayitemChanged(u32),
    /// Chapter number (1-based) now playing.
    Chapter(u32),
    TitleEnded,
    AudioStreamSelected(u32),
    SubtitleStreamSelected(u32),
    SubtitleEnabled(bool),
    /// The package wants buffered data discarded.
    PlaylistStop,
    Discontinuity(u32),
    Seek,
    /// Still on/off signal; carries no timing and is not acted on.
    StillSignal(u32),
    /// Still frame for a number of seconds.
    StillFrameTimed(u32),
    /// Still frame until the viewer acts.
    StillFrameIndefinite,
    SoundEffect(u32),
    /// Nothing to deliver right now (menu waiting for input).
    Idle,
    MenuVisibilityChanged(bool),
    /// Code not understood by this engine.
    Unknown { code: u32, param: u32 },
}

impl NavEvent {
    /// Events that must not share a read buffer with the data after them.
    pub fn is_holding(&self) -> bool {
        matches!(
            self,
            NavEvent::Seek
                | NavEvent::TitleChanged(_)
                | NavEvent::AngleChanged(_)
                | NavEvent::PlaylistChanged(_)
                | NavEvent::PlayitemChanged(_)
        )
    }
}

/// Event numbering generation of the package library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventNumbering {
    #[default]
    Current,
    /// Library versions predating the play-mark event.
    Legacy,
}

/// Untranslated `(code, param)` pair as reported by a package library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEvent {
    pub code: u32,
    #[serde(default)]
    pub param: u32,
}

impl RawEvent {
    pub const fn new(code: u32, param: u32) -> Self {
        Self { code, param }
    }
}

/// Current-generation event codes.
pub mod codes {
    pub const NONE: u32 = 0;
    pub const ERROR: u32 = 1;
    pub const READ_ERROR: u32 = 2;
    pub const ENCRYPTED: u32 = 3;
    pub const ANGLE: u32 = 4;
    pub const TITLE: u32 = 5;
    pub const PLAYLIST: u32 = 6;
    pub const PLAYITEM: u32 = 7;
    pub const CHAPTER: u32 = 8;
    pub const PLAYMARK: u32 = 9;
    pub const END_OF_TITLE: u32 = 10;
    pub const AUDIO_STREAM: u32 = 11;
    pub const PG_TEXTST_STREAM: u32 = 13;
    pub const PG_TEXTST: u32 = 17;
    pub const PLAYLIST_STOP: u32 = 22;
    pub const DISCONTINUITY: u32 = 23;
    pub const SEEK: u32 = 24;
    pub const STILL: u32 = 25;
    pub const STILL_TIME: u32 = 26;
    pub const SOUND_EFFECT: u32 = 27;
    pub const IDLE: u32 = 28;
    pub const MENU: u32 = 30;

    /// Title parameter for the disc's root menu.
    pub const TITLE_TOP_MENU: u32 = 0;
    /// Title parameter for the first-play title.
    pub const TITLE_FIRST_PLAY: u32 = 0xFFFF;
}

/// Translates raw codes into [`NavEvent`]s for one numbering generation.
#[derive(Debug, Clone, Copy, Default)]
pub struct EventDecoder {
    numbering: EventNumbering,
}

impl EventDecoder {
    pub fn new(numbering: EventNumbering) -> Self {
        Self { numbering }
    }

    pub fn numbering(&self) -> EventNumbering {
        self.numbering
    }

    fn normalize(&self, code: u32) -> u32 {
        match self.numbering {
            EventNumbering::Legacy if code >= codes::PLAYMARK => code + 1,
            _ => code,
        }
    }

    pub fn decode(&self, raw: RawEvent) -> NavEvent {
        let param = raw.param;
        match self.normalize(raw.code) {
            codes::NONE => NavEvent::None,
            codes::ERROR => NavEvent::FatalError,
            codes::READ_ERROR => NavEvent::ReadError,
            codes::ENCRYPTED => NavEvent::Encrypted,
            codes::ANGLE => NavEvent::AngleChanged(param),
            codes::TITLE => NavEvent::TitleChanged(match param {
                codes::TITLE_TOP_MENU => TitleSelector::TopMenu,
                codes::TITLE_FIRST_PLAY => TitleSelector::FirstPlay,
                n => TitleSelector::Index(n),
            }),
            codes::PLAYLIST => NavEvent::PlaylistChanged(PlaylistId(param)),
            codes::PLAYITEM => NavEvent::PlayitemChanged(param),
            codes::CHAPTER => NavEvent::Chapter(param),
            codes::END_OF_TITLE => NavEvent::TitleEnded,
            codes::AUDIO_STREAM => NavEvent::AudioStreamSelected(param),
            codes::PG_TEXTST_STREAM => NavEvent::SubtitleStreamSelected(param),
            codes::PG_TEXTST => NavEvent::SubtitleEnabled(param != 0),
            codes::PLAYLIST_STOP => NavEvent::PlaylistStop,
            codes::DISCONTINUITY => NavEvent::Discontinuity(param),
            codes::SEEK => NavEvent::Seek,
            codes::STILL => NavEvent::StillSignal(param),
            codes::STILL_TIME if param == 0 => NavEvent::StillFrameIndefinite,
            codes::STILL_TIME => NavEvent::StillFrameTimed(param),
            codes::SOUND_EFFECT => NavEvent::SoundEffect(param),
            codes::IDLE => NavEvent::Idle,
            codes::MENU => NavEvent::MenuVisibilityChanged(param != 0),
            _ => NavEvent::Unknown {
                code: raw.code,
                param,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_current_numbering() {
        let d = EventDecoder::new(EventNumbering::Current);
        assert_eq!(
            d.decode(RawEvent::new(codes::PLAYLIST, 10)),
            NavEvent::PlaylistChanged(PlaylistId(10))
        );
        assert_eq!(
            d.decode(RawEvent::new(codes::END_OF_TITLE, 0)),
            NavEvent::TitleEnded
        );
        assert_eq!(
            d.decode(RawEvent::new(codes::STILL_TIME, 0)),
            NavEvent::StillFrameIndefinite
        );
        assert_eq!(
            d.decode(RawEvent::new(codes::STILL_TIME, 5)),
            NavEvent::StillFrameTimed(5)
        );
    }

    #[test]
    fn test_legacy_numbering_shifts_after_playmark() {
        let d = EventDecoder::new(EventNumbering::Legacy);
        // Codes below the play-mark slot are identical.
        assert_eq!(
            d.decode(RawEvent::new(codes::CHAPTER, 2)),
            NavEvent::Chapter(2)
        );
        // Legacy end-of-title sits where play-mark is today.
        assert_eq!(
            d.decode(RawEvent::new(codes::PLAYMARK, 0)),
            NavEvent::TitleEnded
        );
        assert_eq!(
            d.decode(RawEvent::new(codes::MENU - 1, 1)),
            NavEvent::MenuVisibilityChanged(true)
        );
    }

    #[test]
    fn test_title_selectors() {
        let d = EventDecoder::default();
        assert_eq!(
            d.decode(RawEvent::new(codes::TITLE, codes::TITLE_TOP_MENU)),
            NavEvent::TitleChanged(TitleSelector::TopMenu)
        );
        assert_eq!(
            d.decode(RawEvent::new(codes::TITLE, codes::TITLE_FIRST_PLAY)),
            NavEvent::TitleChanged(TitleSelector::FirstPlay)
        );
        assert_eq!(
            d.decode(RawEvent::new(codes::TITLE, 3)),
            NavEvent::TitleChanged(TitleSelector::Index(3))
        );
    }

    #[test]
    fn test_unknown_codes_keep_raw_value() {
        let d = EventDecoder::new(EventNumbering::Legacy);
        assert_eq!(
            d.decode(RawEvent::new(200, 7)),
            NavEvent::Unknown {
                code: 200,
                param: 7
            }
        );
    }

    #[test]
    fn test_holding_events() {
        assert!(NavEvent::Seek.is_holding());
        assert!(NavEvent::PlayitemChanged(1).is_holding());
        assert!(!NavEvent::TitleEnded.is_holding());
        assert!(!NavEvent::StillFrameIndefinite.is_holding());
    }
}
