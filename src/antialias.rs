//! Supersampling resolve: block-average the oversampled buffer down to the
//! display resolution.

use crate::{kernel::KernelParams, pixel::CHANNELS};

/// Allowance for float drift before truncation, so a block of identical
/// samples resolves to exactly that sample.
const DRIFT: f64 = 1e-9;

/// Average colour of the sample block behind display pixel `index`.
///
/// Each sample contributes `channel / samples_per_pixel`. Samples that fall
/// outside `oversampled` are skipped.
pub fn resolve(params: &KernelParams, oversampled: &[u32], index: usize) -> [u32; 3] {
    let width = params.size.width as usize;
    let (upscale_width, upscale_height) = (
        params.grid.upscale_width as usize,
        params.grid.upscale_height as usize,
    );
    let row = params.oversampled_columns();
    let samples = f64::from(params.grid.samples_per_pixel);

    let ypixel = (index / width) * upscale_height;
    let xpixel = (index * upscale_width) % row;
    let corner = CHANNELS * (ypixel * row + xpixel);

    let mut sum = [0.0f64; 3];
    for ychunk in 0..upscale_height {
        for xchunk in 0..upscale_width {
            let offset = corner + CHANNELS * (ychunk * row + xchunk);
            if let Some(sample) = oversampled.get(offset..offset + CHANNELS) {
                for (total, channel) in sum.iter_mut().zip(sample) {
                    *total += f64::from(*channel) / samples;
                }
            }
        }
    }

    sum.map(|total| (total + DRIFT) as u32)
}

/// Write the resolved colour for `index` into its triplet of the display buffer.
pub fn run(params: &KernelParams, oversampled: &[u32], index: usize, pixel: &mut [u32]) {
    pixel.copy_from_slice(&resolve(params, oversampled, index));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        colour::ColorSensitivity,
        kernel::KernelVariant,
        pixel::{self, Complex},
        sample_grid::SampleGrid,
        screen,
        view::{JuliaParams, ViewState},
    };
    use test_log::test;

    fn params(width: u32, height: u32, samples_per_pixel: u32) -> KernelParams {
        KernelParams {
            size: screen::Size { width, height },
            grid: SampleGrid::plan(samples_per_pixel).unwrap(),
            view: ViewState {
                center: Complex::ZERO,
                magnification: 1.0,
                image_detail: 1,
            },
            colours: ColorSensitivity::default(),
            julia: JuliaParams::default(),
            variant: KernelVariant::Current,
        }
    }

    fn resolve_all(params: &KernelParams, oversampled: &[u32]) -> Vec<u32> {
        let mut display = pixel::allocate(params.display_pixels());
        for (index, pixel) in display.chunks_mut(CHANNELS).enumerate() {
            run(params, oversampled, index, pixel);
        }
        display
    }

    #[test]
    fn uniform_blocks_resolve_exactly() {
        for samples in [1, 2, 3, 4, 7, 9, 16] {
            let params = params(3, 2, samples);
            let oversampled: Vec<u32> = std::iter::repeat([255, 154, 7])
                .take(params.oversampled_pixels())
                .flatten()
                .collect();
            let display = resolve_all(&params, &oversampled);
            for pixel in display.chunks(CHANNELS) {
                assert_eq!(pixel, [255, 154, 7], "{} samples", samples);
            }
        }
    }

    #[test]
    fn averages_a_square_block() {
        let params = params(2, 1, 4);
        // 4x2 oversampled image; the left block holds 0, 4, 8, 12.
        #[rustfmt::skip]
        let oversampled = vec![
            0, 0, 0,    4, 4, 4,    100, 0, 0,  100, 0, 0,
            8, 8, 8,    12, 12, 12, 100, 0, 0,  100, 0, 0,
        ];
        assert_eq!(resolve_all(&params, &oversampled), vec![6, 6, 6, 100, 0, 0]);
    }

    // Each display pixel owns a distinct colour, smeared across its block, so
    // a block read from the wrong place shows up as a mixed colour.
    fn tagged_oversampled(params: &KernelParams) -> Vec<u32> {
        let columns = params.oversampled_columns();
        let mut oversampled = pixel::allocate(params.oversampled_pixels());
        for (index, sample) in oversampled.chunks_mut(CHANNELS).enumerate() {
            let (x, y) = (index % columns, index / columns);
            let owner = (y / params.grid.upscale_height as usize) * params.size.width as usize
                + x / params.grid.upscale_width as usize;
            sample.copy_from_slice(&[owner as u32, 2 * owner as u32, 7]);
        }
        oversampled
    }

    #[test]
    fn anisotropic_row_grid_reads_the_right_blocks() {
        let params = params(3, 2, 7);
        assert_eq!((params.grid.upscale_width, params.grid.upscale_height), (7, 1));
        let display = resolve_all(&params, &tagged_oversampled(&params));
        for (index, pixel) in display.chunks(CHANNELS).enumerate() {
            assert_eq!(pixel, [index as u32, 2 * index as u32, 7]);
        }
    }

    #[test]
    fn anisotropic_column_grid_reads_the_right_blocks() {
        let params = params(3, 3, 10);
        assert_eq!((params.grid.upscale_width, params.grid.upscale_height), (2, 5));
        let display = resolve_all(&params, &tagged_oversampled(&params));
        for (index, pixel) in display.chunks(CHANNELS).enumerate() {
            assert_eq!(pixel, [index as u32, 2 * index as u32, 7]);
        }
    }

    #[test]
    fn short_source_is_skipped_not_fatal() {
        let params = params(2, 2, 4);
        // Only the first oversampled row survives.
        let oversampled = vec![40; 4 * CHANNELS];
        let display = resolve_all(&params, &oversampled);
        // Two of four samples present, each weighted by 1/4.
        assert_eq!(display, vec![20, 20, 20, 20, 20, 20, 0, 0, 0, 0, 0, 0]);
    }
}
