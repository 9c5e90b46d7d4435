//! Pixel buffers and complex-plane points.

use serde::{Deserialize, Serialize};

/// Channels stored per pixel (R, G, B).
pub const CHANNELS: usize = 3;

/// A row-major RGB buffer, [`CHANNELS`] integers per pixel.
///
/// Channel values are truncated but never clamped.
pub type PixelBuffer = Vec<u32>;

pub fn allocate(pixels: usize) -> PixelBuffer {
    vec![0; pixels * CHANNELS]
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Complex {
    pub real: f64,
    pub imaginary: f64,
}

impl Complex {
    pub const ZERO: Self = Complex {
        real: 0.0,
        imaginary: 0.0,
    };

    pub fn new(real: f64, imaginary: f64) -> Self {
        Self { real, imaginary }
    }
}
