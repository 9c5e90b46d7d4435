//! The per-pixel escape-time kernel.
//!
//! [`escape_time`] maps one linear index of the oversampled buffer to one RGB
//! triplet. It reads nothing but its [`KernelParams`] snapshot, so any
//! partition of the index space produces the same image.

use std::ops::{Add, Mul, Sub};

use serde::{Deserialize, Serialize};

use crate::{
    colour::ColorSensitivity, pixel::Complex, sample_grid::SampleGrid, screen, view::JuliaParams,
    view::ViewState,
};

/// `|z|^2` at or above this value has escaped.
pub const ESCAPE_THRESHOLD: f64 = 4.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KernelVariant {
    /// 50 base iterations, double precision.
    #[default]
    Current,
    /// 30 base iterations, single precision, whole-number budget.
    Legacy,
}

impl KernelVariant {
    pub fn base_iterations(self) -> u32 {
        match self {
            KernelVariant::Current => 50,
            KernelVariant::Legacy => 30,
        }
    }

    /// Iteration budget: `base + max(1, 10 * detail * ln(magnification))`.
    ///
    /// Magnifications at or below 1 never push the budget under `base + 1`.
    pub fn budget(self, image_detail: u32, magnification: f64) -> f64 {
        let growth = (10.0 * f64::from(image_detail) * magnification.ln()).max(1.0);
        let budget = f64::from(self.base_iterations()) + growth;
        match self {
            KernelVariant::Current => budget,
            KernelVariant::Legacy => budget.trunc(),
        }
    }
}

/// Read-only configuration snapshot for one render.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct KernelParams {
    pub size: screen::Size,
    pub grid: SampleGrid,
    pub view: ViewState,
    pub colours: ColorSensitivity,
    pub julia: JuliaParams,
    pub variant: KernelVariant,
}

impl KernelParams {
    pub fn budget(&self) -> f64 {
        self.variant
            .budget(self.view.image_detail, self.view.magnification)
    }

    pub fn oversampled_columns(&self) -> usize {
        self.size.width as usize * self.grid.upscale_width as usize
    }

    pub fn oversampled_rows(&self) -> usize {
        self.size.height as usize * self.grid.upscale_height as usize
    }

    pub fn oversampled_pixels(&self) -> usize {
        self.oversampled_columns() * self.oversampled_rows()
    }

    pub fn display_pixels(&self) -> usize {
        self.size.pixel_count()
    }

    /// Distance in the plane between neighbouring oversampled pixels, taking
    /// the finer of the two axes.
    pub fn pixel_step(&self) -> f64 {
        let finest = self.grid.upscale_width.max(self.grid.upscale_height);
        2.0 * self.view.half_span() / (f64::from(self.size.width) * f64::from(finest))
    }

    /// Complex coordinate of an oversampled pixel.
    pub fn point(&self, index: usize) -> Complex {
        let columns = self.oversampled_columns();
        let (x, y) = (index % columns, index / columns);
        self.view.grid_to_complex(
            self.size.aspect(),
            x as f64,
            y as f64,
            columns as f64,
            self.oversampled_rows() as f64,
        )
    }
}

/// Colour of the oversampled pixel at `index`.
pub fn escape_time(params: &KernelParams, index: usize) -> [u32; 3] {
    let start = params.point(index);
    let c = if params.julia.enabled {
        Complex::new(params.julia.real, params.julia.imaginary)
    } else {
        start
    };

    let budget = params.budget();
    match params.variant {
        KernelVariant::Current => match iterate(start, c, budget) {
            Some(iterations) => params.colours.escaped(iterations, budget),
            None => [0, 0, 0],
        },
        KernelVariant::Legacy => {
            let budget = budget as f32;
            match iterate(start, c, budget) {
                Some(iterations) => params.colours.escaped_f32(iterations, budget),
                None => [0, 0, 0],
            }
        }
    }
}

/// Write the colour for `index` into its triplet of the oversampled buffer.
pub fn run(params: &KernelParams, index: usize, pixel: &mut [u32]) {
    pixel.copy_from_slice(&escape_time(params, index));
}

trait Real: Copy + PartialOrd + Add<Output = Self> + Sub<Output = Self> + Mul<Output = Self> {
    const ZERO: Self;
    const TWO: Self;

    fn from_f64(value: f64) -> Self;
    fn from_iterations(iterations: u32) -> Self;
}

macro_rules! impl_real {
    ($float:ty) => {
        impl Real for $float {
            const ZERO: Self = 0.0;
            const TWO: Self = 2.0;

            fn from_f64(value: f64) -> Self {
                value as $float
            }

            fn from_iterations(iterations: u32) -> Self {
                iterations as $float
            }
        }
    };
}

impl_real!(f32);
impl_real!(f64);

/// Iterate `z <- z^2 + c` from `start`. Returns the iteration at which `z`
/// escaped, or `None` if the budget ran out or `z` got stuck at the origin.
fn iterate<F: Real>(start: Complex, c: Complex, budget: F) -> Option<u32> {
    let threshold = F::from_f64(ESCAPE_THRESHOLD);
    let (c_real, c_imaginary) = (F::from_f64(c.real), F::from_f64(c.imaginary));
    let (mut real, mut imaginary) = (F::from_f64(start.real), F::from_f64(start.imaginary));

    let mut was_zero = real == F::ZERO && imaginary == F::ZERO;
    let mut iterations = 0;
    while F::from_iterations(iterations) <= budget {
        if real * real + imaginary * imaginary >= threshold {
            return Some(iterations);
        }

        let next_real = real * real - imaginary * imaginary + c_real;
        imaginary = F::TWO * real * imaginary + c_imaginary;
        real = next_real;

        // Zero twice in a row is a fixed point.
        let is_zero = real == F::ZERO && imaginary == F::ZERO;
        if is_zero && was_zero {
            return None;
        }
        was_zero = is_zero;

        iterations += 1;
    }
    None
}
