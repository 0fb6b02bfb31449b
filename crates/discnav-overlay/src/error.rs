//! Error types for discnav-overlay.

use thiserror::Error;

use crate::geometry::Rect;

/// Result type for discnav-overlay operations.
pub type Result<T> = std::result::Result<T, OverlayError>;

/// Error type for overlay commands that cannot be applied.
#[derive(Debug, Error)]
pub enum OverlayError {
    /// Pixel buffer does not match the draw rectangle.
    #[error("Pixel buffer holds {actual} pixels, draw rectangle needs {expected}")]
    PixelCount { expected: usize, actual: usize },

    /// Draw rectangle has no area.
    #[error("Empty draw rectangle {0}")]
    EmptyRect(Rect),

    /// Draw rectangle does not fit the plane.
    #[error("Draw rectangle {rect} exceeds the {width}x{height} plane")]
    OutOfBounds { rect: Rect, width: u32, height: u32 },
}
