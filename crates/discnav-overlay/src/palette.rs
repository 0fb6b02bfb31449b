//! Palette conversion and run-length decoding for palette overlays.
//!
//! Palette entries arrive in the package's native luma/chroma/alpha form
//! and are converted once per draw to display RGBA:
//!
//!   R = 1.164 * (Y - 16) + 1.596 * (Cr - 128)
//!   G = 1.164 * (Y - 16) - 0.391 * (Cb - 128) - 0.813 * (Cr - 128)
//!   B = 1.164 * (Y - 16) + 2.018 * (Cb - 128)
//!
//! Each channel is clamped to [0, 255]. Alpha passes through unscaled.

use serde::{Deserialize, Serialize};

use crate::error::{OverlayError, Result};

/// Number of entries in a full palette.
pub const PALETTE_SIZE: usize = 256;

/// Native palette entry: luma, chroma and transparency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct YcbcrEntry {
    pub y: u8,
    pub cb: u8,
    pub cr: u8,
    /// Opacity (0 = transparent).
    pub alpha: u8,
}

impl YcbcrEntry {
    pub const fn new(y: u8, cb: u8, cr: u8, alpha: u8) -> Self {
        Self { y, cb, cr, alpha }
    }
}

/// Display color, straight (non-premultiplied) alpha.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const TRANSPARENT: Rgba = Rgba {
        r: 0,
        g: 0,
        b: 0,
        a: 0,
    };

    /// Pack as `0xAARRGGBB`.
    pub fn to_argb(self) -> u32 {
        u32::from_be_bytes([self.a, self.r, self.g, self.b])
    }
}

fn clamp_u8(val: f32) -> u8 {
    val.round().clamp(0.0, 255.0) as u8
}

/// Convert one native entry to display RGBA.
pub fn ycbcr_to_rgba(entry: YcbcrEntry) -> Rgba {
    let y = 1.164 * (entry.y as f32 - 16.0);
    let cb = entry.cb as f32 - 128.0;
    let cr = entry.cr as f32 - 128.0;

    Rgba {
        r: clamp_u8(y + 1.596 * cr),
        g: clamp_u8(y - 0.391 * cb - 0.813 * cr),
        b: clamp_u8(y + 2.018 * cb),
        a: entry.alpha,
    }
}

/// Convert a palette to a full 256-entry display table. Entries past the
/// end of `palette` are transparent.
pub fn convert_palette(palette: &[YcbcrEntry]) -> Vec<Rgba> {
    let mut table: Vec<Rgba> = palette
        .iter()
        .take(PALETTE_SIZE)
        .map(|e| ycbcr_to_rgba(*e))
        .collect();
    table.resize(PALETTE_SIZE, Rgba::TRANSPARENT);
    table
}

/// One run of a run-length encoded palette image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RleRun {
    /// Number of pixels; zero-length runs mark line ends and emit nothing.
    pub len: u16,
    /// Palette index repeated `len` times.
    pub index: u8,
}

/// Expand RLE runs into exactly `pixel_count` palette indices.
///
/// Runs beyond `pixel_count` are dropped; too few pixels is an error.
pub fn decode_rle(runs: &[RleRun], pixel_count: usize) -> Result<Vec<u8>> {
    let total: usize = runs.iter().map(|r| r.len as usize).sum();
    let mut out = Vec::with_capacity(total.min(pixel_count));
    for run in runs {
        if out.len() >= pixel_count {
            break;
        }
        let take = (run.len as usize).min(pixel_count - out.len());
        out.extend(std::iter::repeat(run.index).take(take));
    }

    if out.len() < pixel_count {
        return Err(OverlayError::PixelCount {
            expected: pixel_count,
            actual: out.len(),
        });
    }
    Ok(out)
}
