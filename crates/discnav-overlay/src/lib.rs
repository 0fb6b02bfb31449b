//! Discnav-Overlay: interactive graphics composition for disc menus and subtitles
//!
//! The package emits an ordered command stream per graphics plane. This crate
//! applies those commands and packages the result into time-stamped groups
//! for a renderer.
//!
//! # Modules
//!
//! - `geometry` - Rectangles and the set-difference used by clearing
//! - `palette` - Native palette to RGBA conversion, RLE expansion
//! - `compositor` - Region lists per plane, command application, flushing
//!
//! # Example
//!
//! ```
//! use discnav_overlay::{OverlayCommand, OverlayCompositor, OverlayImage, Plane, Rect};
//!
//! let mut compositor = OverlayCompositor::new();
//! let rect = Rect::new(0, 0, 2, 2);
//! compositor.apply(OverlayCommand::Init { plane: Plane::Interactive, width: 1920, height: 1080 })?;
//! compositor.apply(OverlayCommand::Draw {
//!     plane: Plane::Interactive,
//!     rect,
//!     image: OverlayImage::Argb(vec![0xFF00_FF00; 4]),
//! })?;
//! let group = compositor
//!     .apply(OverlayCommand::Flush { plane: Plane::Interactive, pts: 90_000 })?
//!     .expect("flush yields a group");
//! assert_eq!(group.regions.len(), 1);
//! # Ok::<(), discnav_overlay::OverlayError>(())
//! ```

pub mod compositor;
pub mod error;
pub mod geometry;
pub mod palette;

pub use compositor::{
    OverlayCommand, OverlayCompositor, OverlayGroup, OverlayImage, OverlayRegion, PalettePixels,
    Plane, RegionPixels, MAX_REGION_PIXELS,
};
pub use error::{OverlayError, Result};
pub use geometry::Rect;
pub use palette::{Rgba, RleRun, YcbcrEntry};
