//! Outbound notifications: overlay groups for the renderer and events for
//! the player controller.
//!
//! Everything handed over is moved or copied; the engine's region lists
//! and title snapshot never leave the engine by reference.

use discnav_common::{ErrorKind, Title};
use discnav_overlay::OverlayGroup;
use serde::Serialize;
use tokio::sync::mpsc;

use crate::backend::SoundEffect;

/// Receives flushed overlay groups.
pub trait OverlaySink: Send {
    fn add_overlay_group(&mut self, group: OverlayGroup);

    /// Hide or show the video layer (hidden while no title plays).
    fn show_video(&mut self, _visible: bool) {}
}

/// Player-controller notifications. Every method defaults to a no-op.
pub trait PlayerCallbacks: Send {
    fn on_still_time(&mut self, _seconds: u32) {}
    fn on_still_indefinite(&mut self) {}
    fn on_menu_visible(&mut self, _visible: bool) {}
    fn on_error(&mut self, _kind: ErrorKind) {}
    /// Buffered data ahead of the current position must be discarded.
    fn on_flush_requested(&mut self) {}
    fn on_title_changed(&mut self, _title: &Title) {}
    fn on_chapter(&mut self, _chapter: u32) {}
    fn on_audio_stream(&mut self, _index: u32) {}
    fn on_subtitle_stream(&mut self, _index: u32) {}
    fn on_subtitle_enabled(&mut self, _enabled: bool) {}
    fn on_sound_effect(&mut self, _effect: &SoundEffect) {}
}

/// Sink that drops everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct Discard;

impl OverlaySink for Discard {
    fn add_overlay_group(&mut self, _group: OverlayGroup) {}
}

impl PlayerCallbacks for Discard {}

/// A notification moved across threads by [`ChannelSink`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "message", rename_all = "snake_case")]
pub enum EngineMessage {
    OverlayGroup {
        pts: Option<i64>,
        forced: bool,
        regions: usize,
    },
    ShowVideo {
        visible: bool,
    },
    StillTime {
        seconds: u32,
    },
    StillIndefinite,
    MenuVisible {
        visible: bool,
    },
    Error {
        kind: ErrorKind,
    },
    FlushRequested,
    TitleChanged {
        playlist: u32,
        duration_ms: u64,
    },
    Chapter {
        chapter: u32,
    },
    AudioStream {
        index: u32,
    },
    SubtitleStream {
        index: u32,
    },
    SubtitleEnabled {
        enabled: bool,
    },
    SoundEffect {
        id: u32,
        samples: usize,
    },
}

/// Forwards overlay groups and callbacks over an unbounded channel.
///
/// Overlay groups travel on their own channel so the renderer can own them.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    messages: mpsc::UnboundedSender<EngineMessage>,
    groups: Option<mpsc::UnboundedSender<OverlayGroup>>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<EngineMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                messages: tx,
                groups: None,
            },
            rx,
        )
    }

    /// Also deliver the overlay groups themselves.
    pub fn with_groups(mut self) -> (Self, mpsc::UnboundedReceiver<OverlayGroup>) {
        let (tx, rx) = mpsc::unbounded_channel();
        self.groups = Some(tx);
        (self, rx)
    }

    fn send(&self, message: EngineMessage) {
        if self.messages.send(message).is_err() {
            tracing::trace!("notification receiver dropped");
        }
    }
}

impl OverlaySink for ChannelSink {
    fn add_overlay_group(&mut self, group: OverlayGroup) {
        self.send(EngineMessage::OverlayGroup {
            pts: group.pts,
            forced: group.forced,
            regions: group.regions.len(),
        });
        if let Some(groups) = &self.groups {
            if groups.send(group).is_err() {
                tracing::trace!("overlay group receiver dropped");
            }
        }
    }

    fn show_video(&mut self, visible: bool) {
        self.send(EngineMessage::ShowVideo { visible });
    }
}

impl PlayerCallbacks for ChannelSink {
    fn on_still_time(&mut self, seconds: u32) {
        self.send(EngineMessage::StillTime { seconds });
    }

    fn on_still_indefinite(&mut self) {
        self.send(EngineMessage::StillIndefinite);
    }

    fn on_menu_visible(&mut self, visible: bool) {
        self.send(EngineMessage::MenuVisible { visible });
    }

    fn on_error(&mut self, kind: ErrorKind) {
        self.send(EngineMessage::Error { kind });
    }

    fn on_flush_requested(&mut self) {
        self.send(EngineMessage::FlushRequested);
    }

    fn on_title_changed(&mut self, title: &Title) {
        self.send(EngineMessage::TitleChanged {
            playlist: title.playlist.0,
            duration_ms: title.duration_ms,
        });
    }

    fn on_chapter(&mut self, chapter: u32) {
        self.send(EngineMessage::Chapter { chapter });
    }

    fn on_audio_stream(&mut self, index: u32) {
        self.send(EngineMessage::AudioStream { index });
    }

    fn on_subtitle_stream(&mut self, index: u32) {
        self.send(EngineMessage::SubtitleStream { index });
    }

    fn on_subtitle_enabled(&mut self, enabled: bool) {
        self.send(EngineMessage::SubtitleEnabled { enabled });
    }

    fn on_sound_effect(&mut self, effect: &SoundEffect) {
        self.send(EngineMessage::SoundEffect {
            id: effect.id,
            samples: effect.samples.len(),
        });
    }
}
