//! The navigation state machine.
//!
//! [`NavigationEngine`] pulls data and events from the package, runs every
//! event through one transition table and gates further reads on a single
//! [`HoldState`]. It is driven by one thread; only overlay groups and
//! notifications cross to other threads, by value.

use discnav_common::{
    DiscInfo, Error, PlaylistId, ProtectionScheme, Result, StreamEntry, StreamKind, Title,
    TitleSelector,
};
use discnav_overlay::{OverlayCompositor, Plane};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, trace, warn};

use crate::backend::{BackendError, DiscBackend, NavEvent, NavKey};
use crate::context::PlaybackContext;
use crate::notify::{Discard, OverlaySink, PlayerCallbacks};
use crate::resume::ResumeState;
use crate::session::DiscSession;

/// Gate on whether [`NavigationEngine::read`] may pull more data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HoldState {
    #[default]
    None,
    /// A hold was just released; holding events pass until data flows.
    Data,
    /// Showing a still frame.
    Still,
    /// Stopped at a title/playlist boundary.
    Held,
    Error,
    Exit,
}

/// Result of one [`NavigationEngine::read`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOutcome {
    /// Bytes written to the buffer (never zero).
    Data(usize),
    /// Nothing this time; call again.
    Retry,
    /// The session is over.
    Fatal,
}

impl ReadOutcome {
    /// Numeric form: bytes read, 0 for retry, -1 for fatal.
    pub fn code(self) -> i64 {
        match self {
            ReadOutcome::Data(n) => n as i64,
            ReadOutcome::Retry => 0,
            ReadOutcome::Fatal => -1,
        }
    }

    fn from_len(n: usize) -> Self {
        if n == 0 {
            ReadOutcome::Retry
        } else {
            ReadOutcome::Data(n)
        }
    }
}

/// How the package is played.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationMode {
    /// Full menu navigation starting at first-play.
    InteractiveMenu,
    /// Play one playlist; `None` picks the path's playlist or the longest title.
    DirectTitle(Option<PlaylistId>),
}

/// Tuning for the read loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineSettings {
    /// Pause after the package reports it is idle.
    pub idle_sleep: Duration,
    /// Empty package reads per [`NavigationEngine::read`] before returning Retry.
    pub read_retry_limit: u32,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            idle_sleep: Duration::from_millis(100),
            read_retry_limit: 64,
        }
    }
}

/// Thread-safe handle that cancels the engine's current session.
#[derive(Debug, Clone, Default)]
pub struct AbortHandle(Arc<AtomicBool>);

impl AbortHandle {
    pub fn abort(&self) {
        self.0.store(true, Ordering::Release);
    }

    fn take(&self) -> bool {
        self.0.swap(false, Ordering::AcqRel)
    }

    fn reset(&self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Drives one disc session.
pub struct NavigationEngine {
    settings: EngineSettings,
    session: Option<DiscSession>,
    mode: Option<NavigationMode>,
    hold: HoldState,
    /// Holding event deferred until the caller has flushed.
    pending_event: Option<NavEvent>,
    context: PlaybackContext,
    compositor: OverlayCompositor,
    /// Sitting in the top menu (not skippable).
    menu_active: bool,
    menu_visible: bool,
    /// User-facing text of the error that ended the session.
    failure: Option<String>,
    abort: AbortHandle,
    overlay_sink: Box<dyn OverlaySink>,
    callbacks: Box<dyn PlayerCallbacks>,
}

impl NavigationEngine {
    pub fn new(settings: EngineSettings) -> Self {
        Self {
            settings,
            session: None,
            mode: None,
            hold: HoldState::None,
            pending_event: None,
            context: PlaybackContext::new(),
            compositor: OverlayCompositor::new(),
            menu_active: false,
            menu_visible: false,
            failure: None,
            abort: AbortHandle::default(),
            overlay_sink: Box::new(Discard),
            callbacks: Box::new(Discard),
        }
    }

    pub fn with_overlay_sink(mut self, sink: impl OverlaySink + 'static) -> Self {
        self.overlay_sink = Box::new(sink);
        self
    }

    pub fn with_callbacks(mut self, callbacks: impl PlayerCallbacks + 'static) -> Self {
        self.callbacks = Box::new(callbacks);
        self
    }

    pub fn hold_state(&self) -> HoldState {
        self.hold
    }

    pub fn mode(&self) -> Option<NavigationMode> {
        self.mode
    }

    pub fn context(&self) -> &PlaybackContext {
        &self.context
    }

    pub fn compositor(&self) -> &OverlayCompositor {
        &self.compositor
    }

    pub fn abort_handle(&self) -> AbortHandle {
        self.abort.clone()
    }

    /// Message to show the user for the error that ended the session.
    pub fn failure_message(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    fn backend(&mut self) -> Option<&mut dyn DiscBackend> {
        self.session.as_mut()?.handle_mut()
    }

    fn is_menu_mode(&self) -> bool {
        self.mode == Some(NavigationMode::InteractiveMenu)
    }

    /// Enter the error hold and tell the player.
    fn fail(&mut self, err: Error) -> Error {
        error!(error = %err, kind = %err.kind(), "navigation session failed");
        self.hold = HoldState::Error;
        self.failure = Some(err.user_message());
        self.callbacks.on_error(err.kind());
        err
    }

    /// Error or Exit: nothing but a new open revives the session.
    fn has_ended(&mut self) -> bool {
        if self.abort.take() {
            self.hold = HoldState::Exit;
        }
        matches!(self.hold, HoldState::Error | HoldState::Exit)
    }

    fn ended_error(&self) -> Error {
        Error::navigation(format!("navigation session has ended ({:?})", self.hold))
    }

    fn reset(&mut self) {
        self.mode = None;
        self.hold = HoldState::None;
        self.pending_event = None;
        self.context = PlaybackContext::new();
        self.compositor = OverlayCompositor::new();
        self.menu_active = false;
        self.menu_visible = false;
        self.failure = None;
        self.abort.reset();
    }

    /// Open `session` and start playback in `mode`.
    ///
    /// Menu mode on a disc without a usable first-play title falls back to
    /// direct playback.
    pub fn open(&mut self, mut session: DiscSession, mode: NavigationMode) -> Result<Title> {
        self.close();
        self.reset();

        if !session.is_open() {
            if let Err(err) = session.open_direct() {
                return Err(self.fail(err));
            }
        }
        let hint = session.playlist_hint();
        let Some(backend) = session.handle_mut() else {
            return Err(self.fail(Error::open("package handle unavailable")));
        };

        let info = backend.disc_info();
        if let Some((scheme, code)) = info.protection.blocking_scheme() {
            return Err(self.fail(Error::ContentProtection { scheme, code }));
        }

        let started = match mode {
            NavigationMode::InteractiveMenu => match start_menu(backend, &info) {
                Ok(Some(title)) => Ok((title, NavigationMode::InteractiveMenu)),
                Ok(None) => {
                    warn!("disc has no usable first-play title, falling back to direct playback");
                    start_direct(backend, &info, hint)
                        .map(|t| (t, NavigationMode::DirectTitle(hint)))
                }
                Err(err) => Err(err),
            },
            NavigationMode::DirectTitle(playlist) => {
                let playlist = playlist.or(hint);
                start_direct(backend, &info, playlist)
                    .map(|t| (t, NavigationMode::DirectTitle(playlist)))
            }
        };
        let (title, mode) = match started {
            Ok(started) => started,
            Err(err) => return Err(self.fail(err)),
        };
        let time_ms = backend.tell_time();

        info!(
            origin = %session.origin(),
            playlist = %title.playlist,
            duration_ms = title.duration_ms,
            ?mode,
            "disc opened"
        );

        self.session = Some(session);
        self.mode = Some(mode);
        self.context.set_time(time_ms);
        self.become_current(title.clone());
        Ok(title)
    }

    /// Make the next [`read`](Self::read) return Fatal.
    pub fn abort(&mut self) {
        info!("navigation aborted");
        self.hold = HoldState::Exit;
    }

    /// Release the package and clear every overlay plane.
    pub fn close(&mut self) {
        let Some(mut session) = self.session.take() else {
            return;
        };
        let group = self.compositor.close(None);
        self.overlay_sink.add_overlay_group(group);
        session.close();
        self.context.clear_title();
        self.hold = HoldState::Exit;
        debug!("navigation session closed");
    }

    /// Read the next chunk of the multiplexed stream into `buf`.
    pub fn read(&mut self, buf: &mut [u8]) -> ReadOutcome {
        if self.has_ended() {
            return ReadOutcome::Fatal;
        }
        match self.hold {
            HoldState::Held => {
                self.hold = HoldState::Data;
                if let Some(event) = self.pending_event.take() {
                    self.process_event(event);
                    self.pump_overlays();
                    return match self.hold {
                        HoldState::Error | HoldState::Exit => ReadOutcome::Fatal,
                        _ => ReadOutcome::Retry,
                    };
                }
            }
            _ => {}
        }

        let Some(time_ms) = self.backend().map(|b| b.tell_time()) else {
            return ReadOutcome::Fatal;
        };
        self.context.set_time(time_ms);

        if self.is_menu_mode() {
            self.read_menu(buf)
        } else {
            self.read_direct(buf)
        }
    }

    fn read_menu(&mut self, buf: &mut [u8]) -> ReadOutcome {
        let mut empty_reads = 0;
        loop {
            let chunk = match self.backend().map(|b| b.read_ext(buf)) {
                Some(Ok(chunk)) => chunk,
                Some(Err(err)) => {
                    self.fail(Error::navigation(err.to_string()));
                    return ReadOutcome::Fatal;
                }
                None => return ReadOutcome::Fatal,
            };

            if chunk.event.is_holding() && self.hold != HoldState::Data {
                debug!(event = ?chunk.event, bytes = chunk.len, "holding at boundary");
                self.pending_event = Some(chunk.event);
                self.hold = HoldState::Held;
                return ReadOutcome::from_len(chunk.len);
            }

            if chunk.len > 0 {
                self.hold = HoldState::None;
            }
            self.process_event(chunk.event);
            self.pump_overlays();

            if chunk.len > 0 {
                return ReadOutcome::Data(chunk.len);
            }
            match self.hold {
                HoldState::Error | HoldState::Exit => return ReadOutcome::Fatal,
                HoldState::Still => return ReadOutcome::Retry,
                _ => {}
            }
            if chunk.event == NavEvent::Idle {
                std::thread::sleep(self.settings.idle_sleep);
                return ReadOutcome::Retry;
            }
            empty_reads += 1;
            if empty_reads >= self.settings.read_retry_limit {
                trace!(empty_reads, "no data from package");
                return ReadOutcome::Retry;
            }
        }
    }

    fn read_direct(&mut self, buf: &mut [u8]) -> ReadOutcome {
        let n = match self.backend().map(|b| b.read(buf)) {
            Some(Ok(n)) => n,
            Some(Err(err)) => {
                self.fail(Error::navigation(err.to_string()));
                return ReadOutcome::Fatal;
            }
            None => return ReadOutcome::Fatal,
        };
        self.drain_events();
        self.pump_overlays();
        match self.hold {
            HoldState::Error | HoldState::Exit if n == 0 => ReadOutcome::Fatal,
            _ => ReadOutcome::from_len(n),
        }
    }

    fn drain_events(&mut self) {
        while let Some(event) = self.backend().and_then(|b| b.next_event()) {
            self.process_event(event);
        }
    }

    /// Apply queued overlay commands and hand flushed groups to the sink.
    fn pump_overlays(&mut self) {
        while let Some(command) = self.backend().and_then(|b| b.next_overlay()) {
            trace!(?command, "overlay command");
            match self.compositor.apply(command) {
                Ok(Some(group)) => self.overlay_sink.add_overlay_group(group),
                Ok(None) => {}
                Err(err) => warn!(error = %err, "dropping overlay command"),
            }
        }
    }

    fn become_current(&mut self, title: Title) {
        self.context.set_title(title);
        if let Some(title) = self.context.title() {
            self.callbacks.on_title_changed(title);
        }
        self.overlay_sink.show_video(true);
    }

    fn refetch_playlist(&mut self) {
        let Some(playlist) = self.context.playlist() else {
            return;
        };
        let angle = self.context.angle();
        match self.backend().and_then(|b| b.playlist_info(playlist, angle)) {
            Some(title) => self.become_current(title),
            None => {
                warn!(%playlist, angle, "playlist info unavailable");
                self.context.clear_title();
            }
        }
    }

    fn process_event(&mut self, event: NavEvent) {
        if event == NavEvent::None {
            return;
        }
        debug!(?event, hold = ?self.hold, "navigation event");

        match event {
            NavEvent::None => {}
            NavEvent::FatalError => {
                self.fail(Error::navigation("package reported an unrecoverable error"));
            }
            NavEvent::ReadError => {
                warn!("transient read failure, continuing");
            }
            NavEvent::Encrypted => {
                let (scheme, code) = self
                    .backend()
                    .map(|b| b.disc_info().protection.failing_scheme())
                    .unwrap_or((ProtectionScheme::Unknown, None));
                self.fail(Error::ContentProtection { scheme, code });
            }
            NavEvent::StillFrameTimed(seconds) => {
                self.hold = HoldState::Still;
                self.callbacks.on_still_time(seconds);
            }
            NavEvent::StillFrameIndefinite => {
                self.hold = HoldState::Still;
                self.callbacks.on_still_indefinite();
            }
            NavEvent::StillSignal(param) => {
                debug!(param, "ignoring still signal");
            }
            NavEvent::Discontinuity(_) => {
                self.hold = HoldState::Still;
            }
            NavEvent::AngleChanged(angle) => {
                self.context.set_angle(angle);
                self.refetch_playlist();
            }
            NavEvent::TitleEnded => {
                self.context.clear_title();
                self.overlay_sink.show_video(false);
            }
            NavEvent::TitleChanged(selector) => {
                self.menu_active = selector == TitleSelector::TopMenu;
                let angle = self.context.angle();
                match self.backend().and_then(|b| b.title_info(selector, angle)) {
                    Some(title) => self.become_current(title),
                    None => {
                        warn!(%selector, "title info unavailable");
                        self.context.clear_title();
                    }
                }
            }
            NavEvent::PlaylistChanged(playlist) => {
                self.context.set_playlist(playlist);
                self.refetch_playlist();
            }
            NavEvent::PlayitemChanged(index) => {
                if !self.context.select_clip(index as usize) {
                    warn!(index, "play item out of range, ignored");
                }
            }
            NavEvent::Chapter(chapter) => self.callbacks.on_chapter(chapter),
            NavEvent::AudioStreamSelected(index) => self.callbacks.on_audio_stream(index),
            NavEvent::SubtitleStreamSelected(index) => self.callbacks.on_subtitle_stream(index),
            NavEvent::SubtitleEnabled(enabled) => self.callbacks.on_subtitle_enabled(enabled),
            NavEvent::PlaylistStop => self.callbacks.on_flush_requested(),
            NavEvent::Seek => {}
            NavEvent::SoundEffect(id) => match self.backend().map(|b| b.sound_effect(id)) {
                Some(Ok(effect)) => self.callbacks.on_sound_effect(&effect),
                Some(Err(err)) => warn!(id, error = %err, "sound effect unavailable"),
                None => {}
            },
            NavEvent::Idle => {}
            NavEvent::MenuVisibilityChanged(visible) => {
                self.menu_visible = visible;
                self.callbacks.on_menu_visible(visible);
            }
            NavEvent::Unknown { code, param } => {
                warn!(code, param, "unknown navigation event ignored");
            }
        }
    }

    /// In a menu: top menu, a visible popup, or interactive graphics on screen.
    pub fn is_in_menu(&self) -> bool {
        self.is_menu_mode()
            && (self.menu_active
                || self.menu_visible
                || !self.compositor.regions(Plane::Interactive).is_empty())
    }

    /// Seeking is refused only in the top menu.
    pub fn can_seek(&self) -> bool {
        !(self.is_menu_mode() && self.menu_active)
    }

    /// Seek to `time_ms`; returns the position reached.
    pub fn seek(&mut self, time_ms: u64) -> Result<u64> {
        if self.has_ended() {
            return Err(self.ended_error());
        }
        if !self.can_seek() {
            return Err(Error::NotSeekable);
        }
        let reached = match self.backend().map(|b| b.seek_time(time_ms)) {
            Some(Ok(reached)) => reached,
            Some(Err(err)) => return Err(self.fail(Error::navigation(err.to_string()))),
            None => return Err(Error::NotSeekable),
        };
        self.context.set_time(reached);
        self.drain_events();
        self.pump_overlays();
        Ok(reached)
    }

    /// Seek to 1-based chapter `n`. Returns `false` when the chapter does
    /// not exist.
    pub fn seek_chapter(&mut self, n: u32) -> Result<bool> {
        if self.has_ended() {
            return Err(self.ended_error());
        }
        if !self.can_seek() {
            return Err(Error::NotSeekable);
        }
        if n == 0 || n > self.context.chapter_count() {
            return Ok(false);
        }
        let reached = match self.backend().map(|b| b.seek_chapter(n - 1)) {
            Some(Ok(reached)) => reached,
            Some(Err(err)) => return Err(self.fail(Error::navigation(err.to_string()))),
            None => return Err(Error::NotSeekable),
        };
        self.context.set_time(reached);
        self.drain_events();
        self.pump_overlays();
        Ok(true)
    }

    pub fn chapter(&self) -> u32 {
        self.context.chapter()
    }

    pub fn chapter_count(&self) -> u32 {
        self.context.chapter_count()
    }

    pub fn chapter_position(&self, n: u32) -> u64 {
        self.context.chapter_position(n)
    }

    /// Position captured before the last read.
    pub fn time(&self) -> u64 {
        self.context.time_ms()
    }

    pub fn total_time(&self) -> u64 {
        self.context.total_time_ms()
    }

    pub fn stream_language(&self, kind: StreamKind, index: usize) -> Option<&str> {
        self.context.stream_language(kind, index)
    }

    pub fn find_stream(&self, pid: u16) -> Option<(StreamKind, &StreamEntry)> {
        self.context.find_stream(pid)
    }

    /// Send a remote key to the menu. Returns whether the package took it.
    pub fn user_input(&mut self, key: NavKey) -> bool {
        if self.has_ended() || !self.is_menu_mode() {
            return false;
        }
        let accepted = self.send_key(key);
        self.pump_overlays();
        accepted
    }

    fn send_key(&mut self, key: NavKey) -> bool {
        match self.backend().map(|b| b.user_input(key)) {
            Some(Ok(())) => true,
            Some(Err(err)) => {
                debug!(?key, error = %err, "key refused");
                false
            }
            None => false,
        }
    }

    fn pointer_enabled(&mut self) -> bool {
        !self.has_ended()
            && self.is_menu_mode()
            && self
                .context
                .title()
                .is_some_and(|t| t.menu_technology.supports_pointer())
    }

    /// Move the pointer over the menu; selects the button underneath.
    pub fn pointer_move(&mut self, x: u32, y: u32) -> bool {
        if !self.pointer_enabled() {
            return false;
        }
        let moved = matches!(self.backend().map(|b| b.mouse_select(x, y)), Some(Ok(())));
        self.pump_overlays();
        moved
    }

    /// Select and activate the button under the pointer.
    pub fn pointer_click(&mut self, x: u32, y: u32) -> bool {
        if !self.pointer_enabled() {
            return false;
        }
        let selected = matches!(self.backend().map(|b| b.mouse_select(x, y)), Some(Ok(())));
        let activated = selected && self.send_key(NavKey::MouseActivate);
        self.pump_overlays();
        activated
    }

    /// Open the disc menu: popup, then root menu, then the explicit menu call.
    pub fn open_menu(&mut self) -> bool {
        if self.has_ended() || !self.is_menu_mode() {
            return false;
        }
        let opened = self.send_key(NavKey::Popup)
            || self.send_key(NavKey::RootMenu)
            || match self.backend().map(|b| b.menu_call()) {
                Some(Ok(())) => true,
                Some(Err(err)) => {
                    debug!(error = %err, "menu call refused");
                    false
                }
                None => false,
            };
        self.pump_overlays();
        opened
    }

    /// Advance past a still frame. Only valid while in [`HoldState::Still`].
    pub fn skip_hold(&mut self) -> bool {
        if self.hold != HoldState::Still {
            return false;
        }
        let Some(backend) = self.backend() else {
            return false;
        };
        backend.skip_still();
        self.hold = HoldState::Held;
        true
    }

    /// The playlist to resume later, if one has been played.
    pub fn save_state(&self) -> Option<ResumeState> {
        self.context
            .playlist()
            .map(|playlist_id| ResumeState { playlist_id })
    }

    /// Jump to a saved playlist. Fails without side effects when the
    /// playlist is not on the disc or the session has ended.
    pub fn restore_state(&mut self, state: &ResumeState) -> Result<()> {
        if self.has_ended() {
            return Err(self.ended_error());
        }
        let playlist = state.playlist_id;
        let angle = self.context.angle();
        let Some(backend) = self.backend() else {
            return Err(Error::InvalidPlaylistReference(playlist));
        };
        let Some(title) = backend.playlist_info(playlist, angle) else {
            return Err(Error::InvalidPlaylistReference(playlist));
        };
        if let Err(err) = backend.select_playlist(playlist) {
            debug!(%playlist, error = %err, "playlist selection refused");
            return Err(Error::InvalidPlaylistReference(playlist));
        }
        let time_ms = backend.tell_time();

        info!(%playlist, "resuming playlist");
        self.hold = HoldState::None;
        self.pending_event = None;
        self.menu_active = false;
        self.context.set_time(time_ms);
        self.become_current(title);
        Ok(())
    }
}

impl Drop for NavigationEngine {
    fn drop(&mut self) {
        self.close();
    }
}

fn start_menu(backend: &mut dyn DiscBackend, info: &DiscInfo) -> Result<Option<Title>> {
    if !info.first_play_supported {
        return Ok(None);
    }
    let Some(title) = backend.title_info(TitleSelector::FirstPlay, 0) else {
        return Ok(None);
    };
    match backend.play() {
        Ok(()) => Ok(Some(title)),
        Err(BackendError::Unsupported(what)) => {
            debug!(what, "navigation start unsupported");
            Ok(None)
        }
        Err(err) => Err(Error::navigation(err.to_string())),
    }
}

fn start_direct(
    backend: &mut dyn DiscBackend,
    info: &DiscInfo,
    playlist: Option<PlaylistId>,
) -> Result<Title> {
    let title = match playlist {
        Some(playlist) => backend
            .playlist_info(playlist, 0)
            .ok_or_else(|| Error::open(format!("playlist {playlist} not found")))?,
        None => longest_title(backend, info)
            .ok_or_else(|| Error::open("disc has no playable titles"))?,
    };
    backend
        .select_playlist(title.playlist)
        .map_err(|e| Error::open(e.to_string()))?;
    Ok(title)
}

/// First title with the greatest duration.
fn longest_title(backend: &mut dyn DiscBackend, info: &DiscInfo) -> Option<Title> {
    let mut best: Option<Title> = None;
    for index in 1..=info.title_count {
        let Some(title) = backend.title_info(TitleSelector::Index(index), 0) else {
            continue;
        };
        if best.as_ref().map_or(true, |b| title.duration_ms > b.duration_ms) {
            best = Some(title);
        }
    }
    best
}
