//! The window onto the complex plane.

use serde::{Deserialize, Serialize};

use crate::pixel::Complex;

/// Centre, zoom and iteration detail of the current view.
///
/// At magnification 1 the view spans 4 plane units horizontally. The
/// imaginary axis is scaled by the screen's height/width ratio so that
/// non-square screens are not stretched.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewState {
    pub center: Complex,
    pub magnification: f64,
    pub image_detail: u32,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            center: Complex::ZERO,
            magnification: 1.0,
            image_detail: 1,
        }
    }
}

impl ViewState {
    /// Half of the visible span along each axis, before the aspect correction.
    pub fn half_span(&self) -> f64 {
        2.0 / self.magnification
    }

    /// Map a position on a `columns` x `rows` pixel grid covering the view to
    /// the complex plane.
    pub fn grid_to_complex(&self, aspect: f64, x: f64, y: f64, columns: f64, rows: f64) -> Complex {
        let half = self.half_span();
        Complex {
            real: (self.center.real - half) + 2.0 * half * x / columns,
            imaginary: aspect * (self.center.imaginary + half - 2.0 * half * y / rows),
        }
    }

    /// Inverse of [`ViewState::grid_to_complex`].
    pub fn complex_to_grid(&self, aspect: f64, point: Complex, columns: f64, rows: f64) -> (f64, f64) {
        let half = self.half_span();
        let x = (point.real - (self.center.real - half)) * columns / (2.0 * half);
        let y = (self.center.imaginary + half - point.imaginary / aspect) * rows / (2.0 * half);
        (x, y)
    }
}

/// Fixed parameter of the Julia map `z <- z^2 + c`.
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct JuliaParams {
    pub enabled: bool,
    pub real: f64,
    pub imaginary: f64,
}
