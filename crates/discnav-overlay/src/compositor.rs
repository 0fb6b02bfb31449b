//! Per-plane overlay region bookkeeping.
//!
//! The package streams a finite, ordered sequence of commands per plane:
//! `Init`, then any mix of `Clear`/`Draw`, then `Flush` (the only command
//! that produces a consumer-visible [`OverlayGroup`]), and finally `Close`.
//! Clearing is the only place regions are split, which keeps every plane's
//! regions pairwise disjoint.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::{OverlayError, Result};
use crate::geometry::Rect;
use crate::palette::{convert_palette, decode_rle, Rgba, RleRun, YcbcrEntry};

/// Graphics plane an overlay is drawn on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Plane {
    /// Subtitles (presentation graphics).
    Presentation,
    /// Menus and buttons (interactive graphics).
    Interactive,
}

impl Plane {
    pub const ALL: [Plane; 2] = [Plane::Presentation, Plane::Interactive];

    fn slot(self) -> usize {
        match self {
            Plane::Presentation => 0,
            Plane::Interactive => 1,
        }
    }
}

/// Palette image pixels, either already expanded or run-length encoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PalettePixels {
    Indexed(Vec<u8>),
    Rle(Vec<RleRun>),
}

/// Image payload of a draw command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlayImage {
    /// Palette-indexed image with its native palette.
    Palette {
        pixels: PalettePixels,
        palette: Vec<YcbcrEntry>,
    },
    /// Pre-rendered `0xAARRGGBB` pixels; no palette conversion.
    Argb(Vec<u32>),
}

/// One command of the overlay stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum OverlayCommand {
    Init {
        plane: Plane,
        width: u32,
        height: u32,
    },
    Clear {
        plane: Plane,
        rect: Rect,
    },
    Draw {
        plane: Plane,
        rect: Rect,
        image: OverlayImage,
    },
    Flush {
        plane: Plane,
        pts: i64,
    },
    /// Close one plane, or every plane when `plane` is `None`.
    Close {
        #[serde(default)]
        plane: Option<Plane>,
    },
}

/// Pixel storage of a region, row-major with a stride equal to the region width.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegionPixels {
    /// Palette indices with the converted display palette.
    Indexed {
        indices: Vec<u8>,
        palette: Arc<[Rgba]>,
    },
    /// Raw ARGB pixels.
    Argb(Vec<u32>),
}

impl RegionPixels {
    fn len(&self) -> usize {
        match self {
            RegionPixels::Indexed { indices, .. } => indices.len(),
            RegionPixels::Argb(px) => px.len(),
        }
    }

    fn crop(&self, parent: &Rect, sub: &Rect) -> RegionPixels {
        match self {
            RegionPixels::Indexed { indices, palette } => RegionPixels::Indexed {
                indices: crop_rows(indices, parent, sub),
                palette: Arc::clone(palette),
            },
            RegionPixels::Argb(px) => RegionPixels::Argb(crop_rows(px, parent, sub)),
        }
    }
}

/// Copy the rows of `sub` out of a buffer laid out over `parent`.
fn crop_rows<T: Copy>(data: &[T], parent: &Rect, sub: &Rect) -> Vec<T> {
    let stride = parent.width as usize;
    let dx = (sub.x - parent.x) as usize;
    let mut out = Vec::with_capacity(sub.area() as usize);
    for row in sub.y..sub.bottom() {
        let start = (row - parent.y) as usize * stride + dx;
        out.extend_from_slice(&data[start..start + sub.width as usize]);
    }
    out
}

/// A rectangle of overlay pixels on one plane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlayRegion {
    pub plane: Plane,
    pub rect: Rect,
    pub pixels: RegionPixels,
    /// Dimensions of the plane the region was drawn on.
    pub source_width: u32,
    pub source_height: u32,
}

impl OverlayRegion {
    /// Display color at plane coordinates, if inside the region.
    pub fn pixel_at(&self, x: u32, y: u32) -> Option<Rgba> {
        if x < self.rect.x || y < self.rect.y || x >= self.rect.right() || y >= self.rect.bottom()
        {
            return None;
        }
        let row = (y - self.rect.y) as usize;
        let idx = row * self.rect.width as usize + (x - self.rect.x) as usize;
        match &self.pixels {
            RegionPixels::Indexed { indices, palette } => {
                palette.get(*indices.get(idx)? as usize).copied()
            }
            RegionPixels::Argb(px) => {
                let [a, r, g, b] = px.get(idx)?.to_be_bytes();
                Some(Rgba { r, g, b, a })
            }
        }
    }

    /// Region pixels as packed `0xAARRGGBB`.
    pub fn to_argb(&self) -> Vec<u32> {
        match &self.pixels {
            RegionPixels::Indexed { indices, palette } => indices
                .iter()
                .map(|&i| {
                    palette
                        .get(i as usize)
                        .copied()
                        .unwrap_or(Rgba::TRANSPARENT)
                        .to_argb()
                })
                .collect(),
            RegionPixels::Argb(px) => px.clone(),
        }
    }
}

/// Flushed snapshot of every plane's regions, ready for presentation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlayGroup {
    /// Presentation timestamp (90 kHz); `None` means "show immediately".
    pub pts: Option<i64>,
    /// Replace whatever is on screen rather than blend with it.
    pub forced: bool,
    pub regions: Vec<OverlayRegion>,
}

impl OverlayGroup {
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}

#[derive(Debug, Default)]
struct PlaneState {
    width: u32,
    height: u32,
    regions: Vec<OverlayRegion>,
}

/// Largest region accepted on a plane that has not been initialised.
pub const MAX_REGION_PIXELS: u64 = 4096 * 4096;

/// Maintains the disjoint region lists of every plane.
#[derive(Debug, Default)]
pub struct OverlayCompositor {
    planes: [PlaneState; 2],
}

impl OverlayCompositor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current regions of a plane, in insertion order.
    pub fn regions(&self, plane: Plane) -> &[OverlayRegion] {
        &self.planes[plane.slot()].regions
    }

    /// Recorded dimensions of a plane.
    pub fn plane_size(&self, plane: Plane) -> (u32, u32) {
        let state = &self.planes[plane.slot()];
        (state.width, state.height)
    }

    /// Reset a plane and record its dimensions.
    pub fn init(&mut self, plane: Plane, width: u32, height: u32) {
        let state = &mut self.planes[plane.slot()];
        state.regions.clear();
        state.width = width;
        state.height = height;
    }

    /// Remove `rect` from every region on the plane.
    ///
    /// Each intersecting region is replaced in place by the strips left over
    /// after subtracting `rect`, so insertion order is preserved. Fragment
    /// pixels are copied from the parent, never resampled.
    pub fn clear(&mut self, plane: Plane, rect: Rect) {
        if rect.is_empty() {
            return;
        }
        let regions = std::mem::take(&mut self.planes[plane.slot()].regions);
        let mut kept = Vec::with_capacity(regions.len());

        for region in regions {
            if !region.rect.intersects(&rect) {
                kept.push(region);
                continue;
            }
            for strip in region.rect.subtract(&rect) {
                kept.push(OverlayRegion {
                    plane: region.plane,
                    rect: strip,
                    pixels: region.pixels.crop(&region.rect, &strip),
                    source_width: region.source_width,
                    source_height: region.source_height,
                });
            }
        }

        self.planes[plane.slot()].regions = kept;
    }

    /// Clear `rect` and append a new region covering it.
    pub fn draw(&mut self, plane: Plane, rect: Rect, image: OverlayImage) -> Result<()> {
        if rect.is_empty() {
            return Err(OverlayError::EmptyRect(rect));
        }
        self.check_bounds(plane, rect)?;
        let expected = rect.area() as usize;

        let pixels = match image {
            OverlayImage::Palette { pixels, palette } => {
                let indices = match pixels {
                    PalettePixels::Indexed(indices) => indices,
                    PalettePixels::Rle(runs) => decode_rle(&runs, expected)?,
                };
                RegionPixels::Indexed {
                    indices,
                    palette: convert_palette(&palette).into(),
                }
            }
            OverlayImage::Argb(px) => RegionPixels::Argb(px),
        };

        if pixels.len() != expected {
            return Err(OverlayError::PixelCount {
                expected,
                actual: pixels.len(),
            });
        }

        self.clear(plane, rect);

        let state = &mut self.planes[plane.slot()];
        state.regions.push(OverlayRegion {
            plane,
            rect,
            pixels,
            source_width: state.width,
            source_height: state.height,
        });
        Ok(())
    }

    /// Reject rectangles past the plane edges, or past
    /// [`MAX_REGION_PIXELS`] when the plane size is unknown.
    fn check_bounds(&self, plane: Plane, rect: Rect) -> Result<()> {
        let state = &self.planes[plane.slot()];
        let right = rect.x as u64 + rect.width as u64;
        let bottom = rect.y as u64 + rect.height as u64;
        let fits = if state.width > 0 && state.height > 0 {
            right <= state.width as u64 && bottom <= state.height as u64
        } else {
            right <= u32::MAX as u64
                && bottom <= u32::MAX as u64
                && rect.area() <= MAX_REGION_PIXELS
        };
        if fits {
            Ok(())
        } else {
            Err(OverlayError::OutOfBounds {
                rect,
                width: state.width,
                height: state.height,
            })
        }
    }

    /// Package every plane's current regions into one forced group.
    ///
    /// Region state persists; a later flush re-delivers whatever is still drawn.
    pub fn flush(&self, plane: Plane, pts: i64) -> OverlayGroup {
        let regions: Vec<OverlayRegion> = self
            .planes
            .iter()
            .flat_map(|p| p.regions.iter().cloned())
            .collect();
        tracing::trace!(?plane, pts, regions = regions.len(), "overlay flush");

        OverlayGroup {
            pts: Some(pts),
            forced: true,
            regions,
        }
    }

    /// Empty one plane (or all) and return the group to show immediately.
    pub fn close(&mut self, plane: Option<Plane>) -> OverlayGroup {
        match plane {
            Some(p) => self.planes[p.slot()].regions.clear(),
            None => self.planes.iter_mut().for_each(|p| p.regions.clear()),
        }

        OverlayGroup {
            pts: None,
            forced: true,
            regions: self
                .planes
                .iter()
                .flat_map(|p| p.regions.iter().cloned())
                .collect(),
        }
    }

    /// Apply one command; `Flush` and `Close` yield a group for the renderer.
    pub fn apply(&mut self, command: OverlayCommand) -> Result<Option<OverlayGroup>> {
        match command {
            OverlayCommand::Init {
                plane,
                width,
                height,
            } => {
                tracing::debug!(?plane, width, height, "overlay init");
                self.init(plane, width, height);
                Ok(None)
            }
            OverlayCommand::Clear { plane, rect } => {
                self.clear(plane, rect);
                Ok(None)
            }
            OverlayCommand::Draw { plane, rect, image } => {
                self.draw(plane, rect, image)?;
                Ok(None)
            }
            OverlayCommand::Flush { plane, pts } => Ok(Some(self.flush(plane, pts))),
            OverlayCommand::Close { plane } => {
                tracing::debug!(?plane, "overlay close");
                Ok(Some(self.close(plane)))
            }
        }
    }
}
