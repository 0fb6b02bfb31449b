//! Discnav-Engine: navigation state machine for menu-capable disc packages
//!
//! Drives playback of a disc package, interprets the events it raises while
//! reading and forwards overlay groups and player notifications.
//!
//! # Modules
//!
//! - `backend` - The package protocol, raw event decoding, a scripted package
//! - `context` - Current title, clip, angle and chapter bookkeeping
//! - `session` - Package origin detection and handle ownership
//! - `engine` - Read loop, event transitions, seeking, menus, hold state
//! - `notify` - Overlay sink and player callback traits, channel delivery
//! - `resume` - Resume record text form
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use discnav_common::{DiscInfo, PlaylistId, Title};
//! use discnav_engine::backend::{BackendSettings, ScriptStep, ScriptedDisc, ScriptedProvider};
//! use discnav_engine::{
//!     DiscSession, EngineSettings, NavigationEngine, NavigationMode, PackageLocation,
//!     PackageOrigin, ReadOutcome,
//! };
//!
//! let disc = ScriptedDisc {
//!     disc: DiscInfo { title_count: 1, ..Default::default() },
//!     titles: vec![Title::new(PlaylistId(800), 60_000)],
//!     steps: vec![ScriptStep::data(6144)],
//!     ..Default::default()
//! };
//! let location = PackageLocation {
//!     origin: PackageOrigin::DirectoryTree { root: "/discs/movie".into() },
//!     playlist_hint: None,
//! };
//! let session = DiscSession::from_location(
//!     location,
//!     Arc::new(ScriptedProvider::new(disc)),
//!     BackendSettings::default(),
//! );
//!
//! let mut engine = NavigationEngine::new(EngineSettings::default());
//! let title = engine.open(session, NavigationMode::DirectTitle(None))?;
//! assert_eq!(title.playlist, PlaylistId(800));
//!
//! let mut buf = vec![0u8; 6144];
//! assert_eq!(engine.read(&mut buf), ReadOutcome::Data(6144));
//! # Ok::<(), discnav_common::Error>(())
//! ```

pub mod backend;
pub mod context;
pub mod engine;
pub mod notify;
pub mod resume;
pub mod session;

pub use backend::{BackendError, BackendSettings, DiscBackend, NavEvent, NavKey, PackageProvider};
pub use context::PlaybackContext;
pub use engine::{
    AbortHandle, EngineSettings, HoldState, NavigationEngine, NavigationMode, ReadOutcome,
};
pub use notify::{ChannelSink, Discard, EngineMessage, OverlaySink, PlayerCallbacks};
pub use resume::{ResumeState, ResumeStateCodec};
pub use session::{classify, DiscSession, PackageLocation, PackageOrigin};
