//! Error taxonomy shared by the discnav crates.
//!
//! Each variant maps onto an [`ErrorKind`]; the kind decides whether the
//! navigation session survives the failure.

use serde::{Deserialize, Serialize};

use crate::types::{PlaylistId, ProtectionScheme};

/// Coarse classification of an [`Error`], also delivered to player callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The package could not be parsed or opened.
    OpenFailure,
    /// Content protection is present and nothing handled it.
    ContentProtectionFailure,
    /// A single bad read; the read loop retries it.
    TransientReadFailure,
    /// The package reported a decode or menu fault.
    NavigationFault,
    /// Seeking was requested while seeking is not allowed.
    NotSeekable,
    /// A resume target does not exist on the package.
    InvalidPlaylistReference,
    /// Resume text could not be parsed.
    MalformedResume,
    /// Underlying I/O failed.
    Io,
}

impl ErrorKind {
    /// Fatal kinds end the session and put the engine into its error hold.
    pub fn is_fatal(self) -> bool {
        matches!(
            self,
            ErrorKind::OpenFailure
                | ErrorKind::ContentProtectionFailure
                | ErrorKind::NavigationFault
                | ErrorKind::Io
        )
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorKind::OpenFailure => "open failure",
            ErrorKind::ContentProtectionFailure => "content protection failure",
            ErrorKind::TransientReadFailure => "transient read failure",
            ErrorKind::NavigationFault => "navigation fault",
            ErrorKind::NotSeekable => "not seekable",
            ErrorKind::InvalidPlaylistReference => "invalid playlist reference",
            ErrorKind::MalformedResume => "malformed resume state",
            ErrorKind::Io => "I/O error",
        };
        f.write_str(name)
    }
}

/// Common error type for discnav.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The package is unparseable.
    #[error("Failed to open disc package: {0}")]
    OpenFailure(String),

    /// Content protection present and unhandled.
    #[error("Disc is protected by {scheme} and it could not be handled")]
    ContentProtection {
        scheme: ProtectionScheme,
        /// Backend-specific failure code, if the backend reported one.
        code: Option<i32>,
    },

    /// A single read failed.
    #[error("Transient read failure")]
    TransientRead,

    /// Package-reported decode or menu fault.
    #[error("Navigation fault: {0}")]
    Navigation(String),

    /// Seek rejected because the engine sits in a non-skippable menu.
    #[error("Seeking is not possible in the current menu")]
    NotSeekable,

    /// Resume target not present on the package.
    #[error("Playlist {0} does not exist on this disc")]
    InvalidPlaylistReference(PlaylistId),

    /// Resume text could not be decoded.
    #[error("Malformed resume state: {0}")]
    MalformedResume(String),

    /// An I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a new OpenFailure error.
    pub fn open<S: Into<String>>(msg: S) -> Self {
        Self::OpenFailure(msg.into())
    }

    /// Create a new Navigation error.
    pub fn navigation<S: Into<String>>(msg: S) -> Self {
        Self::Navigation(msg.into())
    }

    /// Create a new MalformedResume error.
    pub fn malformed_resume<S: Into<String>>(msg: S) -> Self {
        Self::MalformedResume(msg.into())
    }

    /// The kind this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::OpenFailure(_) => ErrorKind::OpenFailure,
            Error::ContentProtection { .. } => ErrorKind::ContentProtectionFailure,
            Error::TransientRead => ErrorKind::TransientReadFailure,
            Error::Navigation(_) => ErrorKind::NavigationFault,
            Error::NotSeekable => ErrorKind::NotSeekable,
            Error::InvalidPlaylistReference(_) => ErrorKind::InvalidPlaylistReference,
            Error::MalformedResume(_) => ErrorKind::MalformedResume,
            Error::Io(_) => ErrorKind::Io,
        }
    }

    /// Whether the error ends the navigation session.
    pub fn is_fatal(&self) -> bool {
        self.kind().is_fatal()
    }

    /// Message suitable for presenting to the viewer.
    ///
    /// Protected discs get their own wording so they are never reported as
    /// a generic playback failure.
    pub fn user_message(&self) -> String {
        match self {
            Error::ContentProtection { scheme, .. } => format!(
                "This is a protected disc ({scheme}) and cannot be played without a supported decryption library"
            ),
            other => format!("Playback failed: {other}"),
        }
    }
}

/// Result type alias using the common Error type.
pub type Result<T> = std::result::Result<T, Error>;
