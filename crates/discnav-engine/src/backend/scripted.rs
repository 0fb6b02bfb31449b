//! In-memory package driven by a script of reads, events and overlay commands.
//!
//! Used by the test suites and by `discnav replay` to exercise the engine
//! without a disc. Every call the engine makes is recorded in a shared
//! [`CallLog`].

use discnav_common::{DiscInfo, PlaylistId, Title, TitleSelector};
use discnav_overlay::OverlayCommand;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::path::Path;
use std::sync::Arc;

use super::{
    BackendError, BackendSettings, DiscBackend, EventDecoder, ImageReader, NavEvent, NavKey,
    PackageProvider, RawEvent, ReadChunk, SoundEffect,
};

/// Fill byte for scripted data (MPEG-TS sync byte).
const FILL_BYTE: u8 = 0x47;

/// Event as written in a script: typed, or a raw code pair that goes through
/// the configured [`EventDecoder`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScriptEvent {
    Raw { raw: RawEvent },
    Typed(NavEvent),
}

impl Default for ScriptEvent {
    fn default() -> Self {
        ScriptEvent::Typed(NavEvent::None)
    }
}

impl From<NavEvent> for ScriptEvent {
    fn from(event: NavEvent) -> Self {
        ScriptEvent::Typed(event)
    }
}

/// One scripted package action, consumed by reads in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum ScriptStep {
    /// Deliver `len` bytes, optionally with an event.
    Data {
        len: usize,
        #[serde(default)]
        event: ScriptEvent,
        #[serde(default)]
        advance_ms: u64,
    },
    /// Deliver an event with no data.
    Event { event: ScriptEvent },
    /// Queue an overlay command.
    Overlay { command: OverlayCommand },
    /// Fail the read.
    Fail { message: String },
}

impl ScriptStep {
    pub fn data(len: usize) -> Self {
        ScriptStep::Data {
            len,
            event: ScriptEvent::default(),
            advance_ms: 0,
        }
    }

    pub fn data_with(len: usize, event: NavEvent) -> Self {
        ScriptStep::Data {
            len,
            event: event.into(),
            advance_ms: 0,
        }
    }

    pub fn event(event: NavEvent) -> Self {
        ScriptStep::Event {
            event: event.into(),
        }
    }

    pub fn raw(code: u32, param: u32) -> Self {
        ScriptStep::Event {
            event: ScriptEvent::Raw {
                raw: RawEvent::new(code, param),
            },
        }
    }

    pub fn overlay(command: OverlayCommand) -> Self {
        ScriptStep::Overlay { command }
    }
}

/// Description of a scripted disc.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptedDisc {
    #[serde(default)]
    pub disc: DiscInfo,
    #[serde(default)]
    pub first_play: Option<Title>,
    #[serde(default)]
    pub top_menu: Option<Title>,
    /// Numbered titles; title `n` is `titles[n - 1]`.
    #[serde(default)]
    pub titles: Vec<Title>,
    /// Playlists reachable by id that are not numbered titles.
    #[serde(default)]
    pub playlists: Vec<Title>,
    #[serde(default)]
    pub sound_effects: Vec<SoundEffect>,
    /// Keys the package refuses.
    #[serde(default)]
    pub rejected_keys: Vec<NavKey>,
    #[serde(default)]
    pub menu_call_fails: bool,
    #[serde(default)]
    pub steps: Vec<ScriptStep>,
}

/// A call the engine made into the package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptedCall {
    Play,
    SelectPlaylist(PlaylistId),
    SeekTime(u64),
    SeekChapter(u32),
    UserInput(NavKey),
    MouseSelect(u32, u32),
    MenuCall,
    SkipStill,
    SoundEffect(u32),
    Close,
}

/// Shared record of package calls.
pub type CallLog = Arc<Mutex<Vec<ScriptedCall>>>;

/// [`DiscBackend`] that plays back a [`ScriptedDisc`].
pub struct ScriptedBackend {
    disc: ScriptedDisc,
    steps: VecDeque<ScriptStep>,
    decoder: EventDecoder,
    pending: VecDeque<NavEvent>,
    overlays: VecDeque<OverlayCommand>,
    time_ms: u64,
    current: Option<PlaylistId>,
    calls: CallLog,
}

impl ScriptedBackend {
    pub fn new(mut disc: ScriptedDisc, decoder: EventDecoder) -> Self {
        let steps = std::mem::take(&mut disc.steps).into();
        Self {
            disc,
            steps,
            decoder,
            pending: VecDeque::new(),
            overlays: VecDeque::new(),
            time_ms: 0,
            current: None,
            calls: CallLog::default(),
        }
    }

    /// Share an existing call log.
    pub fn with_call_log(mut self, calls: CallLog) -> Self {
        self.calls = calls;
        self
    }

    pub fn calls(&self) -> CallLog {
        Arc::clone(&self.calls)
    }

    fn record(&self, call: ScriptedCall) {
        self.calls.lock().push(call);
    }

    fn find_playlist(&self, playlist: PlaylistId) -> Option<&Title> {
        self.disc
            .playlists
            .iter()
            .chain(self.disc.titles.iter())
            .chain(self.disc.first_play.iter())
            .chain(self.disc.top_menu.iter())
            .find(|t| t.playlist == playlist)
    }

    fn resolve(&mut self, event: ScriptEvent) -> NavEvent {
        let event = match event {
            ScriptEvent::Raw { raw } => self.decoder.decode(raw),
            ScriptEvent::Typed(event) => event,
        };
        // Track what the package itself is playing so chapter seeks resolve.
        match event {
            NavEvent::PlaylistChanged(id) => self.current = Some(id),
            NavEvent::TitleChanged(selector) => {
                if let Some(title) = self.title_info(selector, 0) {
                    self.current = Some(title.playlist);
                }
            }
            _ => {}
        }
        event
    }

    /// Pull the next data-bearing step, queueing overlays on the way.
    fn next_step(&mut self) -> Option<ScriptStep> {
        while let Some(step) = self.steps.pop_front() {
            match step {
                ScriptStep::Overlay { command } => self.overlays.push_back(command),
                other => return Some(other),
            }
        }
        None
    }

    fn fill(&mut self, buf: &mut [u8], len: usize, advance_ms: u64) -> usize {
        let n = len.min(buf.len());
        buf[..n].fill(FILL_BYTE);
        self.time_ms += advance_ms;
        n
    }
}

impl DiscBackend for ScriptedBackend {
    fn disc_info(&self) -> DiscInfo {
        self.disc.disc.clone()
    }

    fn title_info(&mut self, title: TitleSelector, angle: u32) -> Option<Title> {
        let found = match title {
            TitleSelector::FirstPlay => self.disc.first_play.as_ref(),
            TitleSelector::TopMenu => self.disc.top_menu.as_ref(),
            TitleSelector::Index(0) => None,
            TitleSelector::Index(n) => self.disc.titles.get(n as usize - 1),
        };
        found.filter(|t| angle < t.angle_count).cloned()
    }

    fn playlist_info(&mut self, playlist: PlaylistId, angle: u32) -> Option<Title> {
        self.find_playlist(playlist)
            .filter(|t| angle < t.angle_count)
            .cloned()
    }

    fn select_playlist(&mut self, playlist: PlaylistId) -> Result<(), BackendError> {
        self.record(ScriptedCall::SelectPlaylist(playlist));
        if self.find_playlist(playlist).is_none() {
            return Err(BackendError::NotFound(format!("playlist {playlist}")));
        }
        self.current = Some(playlist);
        self.time_ms = 0;
        Ok(())
    }

    fn play(&mut self) -> Result<(), BackendError> {
        self.record(ScriptedCall::Play);
        if !self.disc.disc.first_play_supported {
            return Err(BackendError::Unsupported("first play"));
        }
        Ok(())
    }

    fn read_ext(&mut self, buf: &mut [u8]) -> Result<ReadChunk, BackendError> {
        if let Some(event) = self.pending.pop_front() {
            return Ok(ReadChunk { len: 0, event });
        }
        match self.next_step() {
            Some(ScriptStep::Data {
                len,
                event,
                advance_ms,
            }) => {
                let len = self.fill(buf, len, advance_ms);
                let event = self.resolve(event);
                Ok(ReadChunk { len, event })
            }
            Some(ScriptStep::Event { event }) => Ok(ReadChunk {
                len: 0,
                event: self.resolve(event),
            }),
            Some(ScriptStep::Fail { message }) => Err(BackendError::Failed(message)),
            Some(ScriptStep::Overlay { .. }) | None => Ok(ReadChunk {
                len: 0,
                event: NavEvent::None,
            }),
        }
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, BackendError> {
        while let Some(step) = self.next_step() {
            match step {
                ScriptStep::Data {
                    len,
                    event,
                    advance_ms,
                } => {
                    let event = self.resolve(event);
                    if event != NavEvent::None {
                        self.pending.push_back(event);
                    }
                    return Ok(self.fill(buf, len, advance_ms));
                }
                ScriptStep::Event { event } => {
                    let event = self.resolve(event);
                    self.pending.push_back(event);
                }
                ScriptStep::Fail { message } => return Err(BackendError::Failed(message)),
                ScriptStep::Overlay { command } => self.overlays.push_back(command),
            }
        }
        Ok(0)
    }

    fn next_event(&mut self) -> Option<NavEvent> {
        self.pending.pop_front()
    }

    fn next_overlay(&mut self) -> Option<OverlayCommand> {
        self.overlays.pop_front()
    }

    fn tell_time(&self) -> u64 {
        self.time_ms
    }

    fn seek_time(&mut self, time_ms: u64) -> Result<u64, BackendError> {
        self.record(ScriptedCall::SeekTime(time_ms));
        let limit = self
            .current
            .and_then(|id| self.find_playlist(id))
            .map(|t| t.duration_ms)
            .unwrap_or(u64::MAX);
        self.time_ms = time_ms.min(limit);
        self.pending.push_back(NavEvent::Seek);
        Ok(self.time_ms)
    }

    fn seek_chapter(&mut self, chapter: u32) -> Result<u64, BackendError> {
        self.record(ScriptedCall::SeekChapter(chapter));
        let start = self
            .current
            .and_then(|id| self.find_playlist(id))
            .and_then(|t| t.chapters.get(chapter as usize))
            .map(|c| c.start_ms)
            .ok_or_else(|| BackendError::NotFound(format!("chapter index {chapter}")))?;
        self.time_ms = start;
        self.pending.push_back(NavEvent::Seek);
        self.pending.push_back(NavEvent::Chapter(chapter + 1));
        Ok(start)
    }

    fn user_input(&mut self, key: NavKey) -> Result<(), BackendError> {
        self.record(ScriptedCall::UserInput(key));
        if self.disc.rejected_keys.contains(&key) {
            return Err(BackendError::failed(format!("key {key:?} rejected")));
        }
        Ok(())
    }

    fn mouse_select(&mut self, x: u32, y: u32) -> Result<(), BackendError> {
        self.record(ScriptedCall::MouseSelect(x, y));
        Ok(())
    }

    fn menu_call(&mut self) -> Result<(), BackendError> {
        self.record(ScriptedCall::MenuCall);
        if self.disc.menu_call_fails {
            return Err(BackendError::failed("menu call refused"));
        }
        Ok(())
    }

    fn skip_still(&mut self) {
        self.record(ScriptedCall::SkipStill);
    }

    fn sound_effect(&mut self, id: u32) -> Result<SoundEffect, BackendError> {
        self.record(ScriptedCall::SoundEffect(id));
        self.disc
            .sound_effects
            .iter()
            .find(|s| s.id == id)
            .cloned()
            .ok_or_else(|| BackendError::NotFound(format!("sound effect {id}")))
    }

    fn close(&mut self) {
        self.record(ScriptedCall::Close);
    }
}

/// [`PackageProvider`] that hands out [`ScriptedBackend`]s for any path or reader.
pub struct ScriptedProvider {
    disc: ScriptedDisc,
    calls: CallLog,
}

impl ScriptedProvider {
    pub fn new(disc: ScriptedDisc) -> Self {
        Self {
            disc,
            calls: CallLog::default(),
        }
    }

    /// Calls made by every backend this provider opened.
    pub fn calls(&self) -> CallLog {
        Arc::clone(&self.calls)
    }

    fn backend(&self, settings: &BackendSettings) -> Box<dyn DiscBackend> {
        Box::new(
            ScriptedBackend::new(
                self.disc.clone(),
                EventDecoder::new(settings.event_numbering),
            )
            .with_call_log(Arc::clone(&self.calls)),
        )
    }
}

impl PackageProvider for ScriptedProvider {
    fn open_path(
        &self,
        path: &Path,
        settings: &BackendSettings,
    ) -> Result<Box<dyn DiscBackend>, BackendError> {
        tracing::debug!(path = %path.display(), "opening scripted package");
        Ok(self.backend(settings))
    }

    fn open_reader(
        &self,
        _reader: Box<dyn ImageReader>,
        settings: &BackendSettings,
    ) -> Result<Box<dyn DiscBackend>, BackendError> {
        tracing::debug!("opening scripted package from image reader");
        Ok(self.backend(settings))
    }
}
