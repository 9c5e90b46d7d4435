//! Escape-time fractal renderer.
//!
//! A [`FractalOrchestrator`] renders Mandelbrot and Julia sets into an RGB
//! buffer. Each render computes an oversampled image with the escape-time
//! kernel and block-averages it down to the display resolution, on the GPU
//! through `wgpu` when that is requested and the workload is small enough,
//! and on a `rayon` thread pool otherwise.

pub mod antialias;
pub mod colour;
mod command_buffer;
mod command_encoder;
pub mod compute;
pub mod config;
pub mod cpu;
pub mod error;
pub mod executor;
pub mod gpu;
pub mod kernel;
pub mod orchestrator;
pub mod pixel;
pub mod sample_grid;
pub mod screen;
mod typed_buffer;
mod var;
pub mod view;

pub use config::Config;
pub use error::{Error, Result};
pub use executor::ExecutionMode;
pub use orchestrator::{Frame, FractalOrchestrator};
