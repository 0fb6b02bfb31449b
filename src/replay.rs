//! Drive the navigation engine against a scripted disc.
//!
//! A replay script describes a package (titles, playlists and the ordered
//! stream of reads, events and overlay commands it produces) and the
//! player actions to perform against it. Replaying yields a transcript of
//! everything the engine reported.

use anyhow::{Context, Result};
use discnav_common::PlaylistId;
use discnav_engine::backend::{NavKey, ScriptedDisc, ScriptedProvider};
use discnav_engine::{
    ChannelSink, DiscSession, EngineMessage, HoldState, NavigationEngine, NavigationMode,
    PackageLocation, PackageOrigin, ReadOutcome, ResumeState, ResumeStateCodec,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

use crate::config::{Config, PlaybackMode};

/// Reads performed when a script lists no actions.
const DEFAULT_READS: usize = 256;

/// Buffer size per read (32 aligned units of 192 bytes).
const READ_SIZE: usize = 6144;

/// A player action.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ReplayAction {
    /// Read up to `count` times, stopping early on a fatal read.
    Read {
        #[serde(default = "one")]
        count: usize,
    },
    Seek {
        time_ms: u64,
    },
    SeekChapter {
        chapter: u32,
    },
    Key {
        key: NavKey,
    },
    PointerMove {
        x: u32,
        y: u32,
    },
    PointerClick {
        x: u32,
        y: u32,
    },
    OpenMenu,
    SkipHold,
    Abort,
    /// Record the resume text for the current playlist.
    Save,
    /// Resume a playlist.
    Restore {
        playlist: u32,
    },
}

fn one() -> usize {
    1
}

/// Replay input file.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ReplayScript {
    pub package: ScriptedDisc,

    /// Overrides the configured playback mode.
    #[serde(default)]
    pub mode: Option<PlaybackMode>,

    /// Playlist for direct playback.
    #[serde(default)]
    pub playlist: Option<u32>,

    #[serde(default)]
    pub actions: Vec<ReplayAction>,
}

impl ReplayScript {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read replay script: {:?}", path))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse replay script: {:?}", path))
    }
}

/// One transcript line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReplayEntry {
    Opened {
        playlist: u32,
        duration_ms: u64,
        chapters: u32,
    },
    OpenFailed {
        kind: discnav_common::ErrorKind,
        message: String,
    },
    Read {
        result: i64,
        hold: String,
    },
    Action {
        action: ReplayAction,
        ok: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        detail: Option<String>,
    },
    Notification {
        #[serde(flatten)]
        message: EngineMessage,
    },
}

fn hold_name(hold: HoldState) -> String {
    format!("{:?}", hold).to_lowercase()
}

/// Run `script` and return the transcript.
pub fn replay(script: ReplayScript, config: &Config, source: &Path) -> Vec<ReplayEntry> {
    let settings = config.backend_settings();
    let provider = Arc::new(ScriptedProvider::new(script.package));
    let location = PackageLocation {
        origin: PackageOrigin::DirectoryTree {
            root: source.to_path_buf(),
        },
        playlist_hint: None,
    };
    let session = DiscSession::from_location(location, provider, settings);

    let (sink, mut messages) = ChannelSink::new();
    let mut engine = NavigationEngine::new(config.engine_settings())
        .with_overlay_sink(sink.clone())
        .with_callbacks(sink);

    let mode = match script.mode.unwrap_or(config.engine.mode) {
        PlaybackMode::Menu => NavigationMode::InteractiveMenu,
        PlaybackMode::Direct => NavigationMode::DirectTitle(script.playlist.map(PlaylistId)),
    };

    let mut transcript = Vec::new();
    let mut collect = |transcript: &mut Vec<ReplayEntry>| {
        while let Ok(message) = messages.try_recv() {
            transcript.push(ReplayEntry::Notification { message });
        }
    };

    match engine.open(session, mode) {
        Ok(title) => transcript.push(ReplayEntry::Opened {
            playlist: title.playlist.0,
            duration_ms: title.duration_ms,
            chapters: title.chapters.len() as u32,
        }),
        Err(err) => {
            transcript.push(ReplayEntry::OpenFailed {
                kind: err.kind(),
                message: err.user_message(),
            });
            collect(&mut transcript);
            return transcript;
        }
    }
    collect(&mut transcript);

    let actions = if script.actions.is_empty() {
        vec![ReplayAction::Read {
            count: DEFAULT_READS,
        }]
    } else {
        script.actions
    };

    let mut buf = vec![0u8; READ_SIZE];
    for action in actions {
        match action {
            ReplayAction::Read { count } => {
                for _ in 0..count {
                    let outcome = engine.read(&mut buf);
                    transcript.push(ReplayEntry::Read {
                        result: outcome.code(),
                        hold: hold_name(engine.hold_state()),
                    });
                    collect(&mut transcript);
                    if outcome == ReadOutcome::Fatal {
                        break;
                    }
                }
                continue;
            }
            ref other => {
                let (ok, detail) = perform(&mut engine, other);
                transcript.push(ReplayEntry::Action {
                    action: other.clone(),
                    ok,
                    detail,
                });
            }
        }
        collect(&mut transcript);
    }

    engine.close();
    collect(&mut transcript);
    transcript
}

fn perform(engine: &mut NavigationEngine, action: &ReplayAction) -> (bool, Option<String>) {
    match *action {
        ReplayAction::Read { .. } => (true, None),
        ReplayAction::Seek { time_ms } => match engine.seek(time_ms) {
            Ok(reached) => (true, Some(format!("reached {reached} ms"))),
            Err(err) => (false, Some(err.to_string())),
        },
        ReplayAction::SeekChapter { chapter } => match engine.seek_chapter(chapter) {
            Ok(found) => (found, Some(format!("chapter {}", engine.chapter()))),
            Err(err) => (false, Some(err.to_string())),
        },
        ReplayAction::Key { key } => (engine.user_input(key), None),
        ReplayAction::PointerMove { x, y } => (engine.pointer_move(x, y), None),
        ReplayAction::PointerClick { x, y } => (engine.pointer_click(x, y), None),
        ReplayAction::OpenMenu => (engine.open_menu(), None),
        ReplayAction::SkipHold => (engine.skip_hold(), None),
        ReplayAction::Abort => {
            engine.abort();
            (true, None)
        }
        ReplayAction::Save => match engine.save_state() {
            Some(state) => (true, Some(ResumeStateCodec::encode(&state))),
            None => (false, None),
        },
        ReplayAction::Restore { playlist } => {
            let state = ResumeState {
                playlist_id: PlaylistId(playlist),
            };
            match engine.restore_state(&state) {
                Ok(()) => (true, None),
                Err(err) => (false, Some(err.to_string())),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use discnav_common::{DiscInfo, Title};
    use discnav_engine::backend::{NavEvent, ScriptStep};

    fn script(actions: Vec<ReplayAction>) -> ReplayScript {
        ReplayScript {
            package: ScriptedDisc {
                disc: DiscInfo {
                    title_count: 1,
                    ..Default::default()
                },
                titles: vec![Title::new(PlaylistId(10), 60_000).with_chapter_marks(&[0, 30_000])],
                steps: vec![
                    ScriptStep::data(READ_SIZE),
                    ScriptStep::data_with(100, NavEvent::TitleEnded),
                ],
                ..Default::default()
            },
            mode: Some(PlaybackMode::Direct),
            playlist: None,
            actions,
        }
    }

    #[test]
    fn test_default_actions_read_until_exhausted() {
        let mut config = Config::default();
        config.engine.idle_sleep_ms = 0;
        let transcript = replay(script(vec![]), &config, Path::new("disc"));

        assert_eq!(
            transcript[0],
            ReplayEntry::Opened {
                playlist: 10,
                duration_ms: 60_000,
                chapters: 2
            }
        );
        let reads: Vec<i64> = transcript
            .iter()
            .filter_map(|e| match e {
                ReplayEntry::Read { result, .. } => Some(*result),
                _ => None,
            })
            .collect();
        assert_eq!(reads.len(), DEFAULT_READS);
        assert_eq!(reads[..3], [READ_SIZE as i64, 100, 0]);
    }

    #[test]
    fn test_actions_are_reported() {
        let transcript = replay(
            script(vec![
                ReplayAction::SeekChapter { chapter: 2 },
                ReplayAction::Save,
                ReplayAction::Restore { playlist: 99 },
                ReplayAction::Abort,
                ReplayAction::Read { count: 3 },
            ]),
            &Config::default(),
            Path::new("disc"),
        );

        let actions: Vec<(bool, Option<String>)> = transcript
            .iter()
            .filter_map(|e| match e {
                ReplayEntry::Action { ok, detail, .. } => Some((*ok, detail.clone())),
                _ => None,
            })
            .collect();
        assert_eq!(actions[0], (true, Some("chapter 2".to_string())));
        assert_eq!(
            actions[1],
            (true, Some(r#"{"playlist_id":10,"version":1}"#.to_string()))
        );
        assert!(!actions[2].0);

        // Abort stops the read loop after one fatal read.
        let reads = transcript
            .iter()
            .filter(|e| matches!(e, ReplayEntry::Read { .. }))
            .count();
        assert_eq!(reads, 1);
    }

    #[test]
    fn test_script_parses_from_json() {
        let json = r#"{
            "package": {
                "disc": { "title_count": 1 },
                "titles": [ { "playlist": 10, "duration_ms": 1000 } ],
                "steps": [
                    { "step": "data", "len": 188 },
                    { "step": "event", "event": { "kind": "chapter", "param": 2 } },
                    { "step": "event", "event": { "raw": { "code": 28 } } }
                ]
            },
            "mode": "direct",
            "actions": [ { "action": "read", "count": 2 }, { "action": "open_menu" } ]
        }"#;
        let script: ReplayScript = serde_json::from_str(json).unwrap();
        assert_eq!(script.package.steps.len(), 3);
        assert_eq!(script.mode, Some(PlaybackMode::Direct));
        assert_eq!(script.actions[1], ReplayAction::OpenMenu);
    }
}
