use log::info;

use crate::error::{Error, Result};

/// Oversampling factors for supersampling antialiasing.
///
/// Every display pixel is computed as an `upscale_width` x `upscale_height`
/// block of kernel samples and averaged back down.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SampleGrid {
    pub samples_per_pixel: u32,
    pub upscale_width: u32,
    pub upscale_height: u32,
}

impl SampleGrid {
    /// Factor `samples_per_pixel` into a grid that is as close to square as possible.
    ///
    /// When `floor(sqrt(n))` divides `n` the factorisation is exact. Otherwise
    /// the divisors below `n` are scanned and the last one wins, which for a
    /// prime `n` leaves the fully anisotropic `(n, 1)` grid.
    pub fn plan(samples_per_pixel: u32) -> Result<Self> {
        if samples_per_pixel < 1 {
            return Err(Error::InvalidSamplesPerPixel(samples_per_pixel));
        }

        let root = integer_sqrt(samples_per_pixel);
        let (upscale_width, upscale_height) = if samples_per_pixel % root == 0 {
            (samples_per_pixel / root, root)
        } else {
            let mut factors = (samples_per_pixel, 1);
            for divisor in 1..samples_per_pixel {
                if samples_per_pixel % divisor == 0 {
                    let width = samples_per_pixel / divisor;
                    factors = (width, samples_per_pixel / width);
                }
            }
            factors
        };

        let grid = Self {
            samples_per_pixel,
            upscale_width,
            upscale_height,
        };
        if grid.is_degenerate() {
            info!(
                "{} samples per pixel only factor as a {}x{} grid; antialiasing will be anisotropic",
                samples_per_pixel, upscale_width, upscale_height
            );
        }
        Ok(grid)
    }

    /// A single row or column of samples for more than one sample per pixel.
    pub fn is_degenerate(&self) -> bool {
        self.samples_per_pixel > 1 && (self.upscale_width == 1 || self.upscale_height == 1)
    }
}

impl Default for SampleGrid {
    fn default() -> Self {
        Self {
            samples_per_pixel: 1,
            upscale_width: 1,
            upscale_height: 1,
        }
    }
}

fn integer_sqrt(value: u32) -> u32 {
    let mut root = f64::from(value).sqrt() as u32;
    // Guard against the float estimate landing one off.
    while root * root > value {
        root -= 1;
    }
    while (root + 1) * (root + 1) <= value {
        root += 1;
    }
    root
}
