//! Discnav-Common: shared disc data model and error taxonomy.
//!
//! - **Data model**: titles, playlists, clips, chapters, stream tables and
//!   disc-level protection info
//! - **Error handling**: the navigation error taxonomy with fatal/recoverable
//!   classification
//!
//! # Examples
//!
//! ```
//! use discnav_common::{Error, ErrorKind, PlaylistId, Title};
//!
//! let title = Title::new(PlaylistId(800), 5_400_000).with_chapter_marks(&[0, 1_800_000]);
//! assert_eq!(title.chapters.len(), 2);
//!
//! let err = Error::InvalidPlaylistReference(PlaylistId(42));
//! assert_eq!(err.kind(), ErrorKind::InvalidPlaylistReference);
//! assert!(!err.is_fatal());
//! ```

pub mod error;
pub mod types;

pub use error::{Error, ErrorKind, Result};
pub use types::*;
