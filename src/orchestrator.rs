//! Owns a fractal view: its configuration, both pixel buffers and the
//! executors. Picks an execution mode for every render and sequences the zoom
//! and Julia animations.

use std::time::{Duration, Instant};

use log::{debug, info, warn};

use crate::{
    colour::ColorSensitivity,
    config::{AntialiasingConfig, Config},
    cpu::CpuExecutor,
    error::{Channel, Error, Result},
    executor::{ExecutionMode, Executor},
    gpu::GpuExecutor,
    kernel::{KernelParams, KernelVariant},
    pixel::{self, Complex, PixelBuffer},
    sample_grid::SampleGrid,
    screen,
    view::{JuliaParams, ViewState},
};

pub const MAX_SAMPLES_PER_PIXEL: u32 = 16;
pub const MAX_IMAGE_DETAIL: u32 = 10;

/// Above either limit a GPU run risks the driver's watchdog, so the render
/// goes to the CPU instead.
const ACCELERATED_MAX_IMAGE_DETAIL: u32 = 1;
const ACCELERATED_MAX_SAMPLES_PER_PIXEL: u32 = 4;

/// Smallest pixel step, per unit of coordinate magnitude, that the `f32`
/// shader still resolves. Finer views go to the CPU's `f64` kernel.
const ACCELERATED_MIN_PIXEL_STEP: f64 = 1e-5;

const ZOOM_OUT_FACTOR: f64 = 0.2;
const JULIA_DEMO_START: Complex = Complex {
    real: -0.1,
    imaginary: 0.651,
};
const JULIA_DEMO_DRIFT: f64 = 0.001;
const JULIA_DEMO_BLUE: u8 = 100;
const JULIA_DEMO_RED_STEP: i32 = 30;

/// A finished render.
#[derive(Debug)]
pub struct Frame<'a> {
    /// Display-resolution RGB buffer.
    pub pixels: &'a [u32],
    pub size: screen::Size,
    pub samples_per_pixel: u32,
    pub elapsed: Duration,
    pub mode: ExecutionMode,
}

impl Frame<'_> {
    pub fn millis_elapsed(&self) -> u128 {
        self.elapsed.as_millis()
    }
}

enum Accelerator {
    Untried,
    Ready(Box<GpuExecutor>),
    Unavailable,
}

pub struct FractalOrchestrator {
    size: screen::Size,
    view: ViewState,
    colours: ColorSensitivity,
    julia: JuliaParams,
    grid: SampleGrid,
    zoom_antialiasing: AntialiasingConfig,
    variant: KernelVariant,
    gpu_enabled: bool,
    mode: ExecutionMode,
    accelerator_functional: bool,
    elapsed: Duration,
    oversampled: PixelBuffer,
    display: PixelBuffer,
    cpu: CpuExecutor,
    accelerator: Accelerator,
}

impl FractalOrchestrator {
    /// A view of the given size with every other setting at its default.
    pub fn new(width: u32, height: u32) -> Result<Self> {
        Self::from_config(&Config {
            width,
            height,
            ..Config::default()
        })
    }

    /// Apply every value of `config` through the validating setters.
    pub fn from_config(config: &Config) -> Result<Self> {
        validate_size(config.width, config.height)?;
        let size = screen::Size {
            width: config.width,
            height: config.height,
        };
        let grid = SampleGrid::default();

        let mut orchestrator = Self {
            size,
            view: ViewState::default(),
            colours: ColorSensitivity::default(),
            julia: JuliaParams::default(),
            grid,
            zoom_antialiasing: AntialiasingConfig::default(),
            variant: KernelVariant::default(),
            gpu_enabled: false,
            mode: ExecutionMode::MultithreadedFallback,
            accelerator_functional: false,
            elapsed: Duration::ZERO,
            oversampled: pixel::allocate(size.pixel_count()),
            display: pixel::allocate(size.pixel_count()),
            cpu: CpuExecutor::new()?,
            accelerator: Accelerator::Untried,
        };

        orchestrator.set_coordinates(config.center.real, config.center.imaginary);
        orchestrator.set_magnification(config.magnification)?;
        orchestrator.set_image_detail(config.image_detail)?;
        orchestrator.set_red_sensitivity(config.colours.red)?;
        orchestrator.set_green_sensitivity(config.colours.green)?;
        orchestrator.set_blue_sensitivity(config.colours.blue)?;
        orchestrator.set_min_antialiasing(config.antialiasing.min)?;
        orchestrator.set_max_antialiasing(config.antialiasing.max)?;
        orchestrator.set_samples_per_pixel(config.antialiasing.max)?;
        orchestrator.set_render_julia_set(config.julia.enabled);
        orchestrator.set_julia_values(config.julia.real, config.julia.imaginary);
        orchestrator.enable_gpu(config.gpu_enabled);
        orchestrator.set_kernel_variant(config.kernel);
        Ok(orchestrator)
    }

    pub fn size(&self) -> screen::Size {
        self.size
    }

    pub fn center(&self) -> Complex {
        self.view.center
    }

    pub fn magnification(&self) -> f64 {
        self.view.magnification
    }

    pub fn image_detail(&self) -> u32 {
        self.view.image_detail
    }

    pub fn colours(&self) -> ColorSensitivity {
        self.colours
    }

    pub fn julia(&self) -> JuliaParams {
        self.julia
    }

    pub fn sample_grid(&self) -> SampleGrid {
        self.grid
    }

    pub fn samples_per_pixel(&self) -> u32 {
        self.grid.samples_per_pixel
    }

    pub fn min_antialiasing(&self) -> u32 {
        self.zoom_antialiasing.min
    }

    pub fn max_antialiasing(&self) -> u32 {
        self.zoom_antialiasing.max
    }

    pub fn kernel_variant(&self) -> KernelVariant {
        self.variant
    }

    /// Whether the user asked for the GPU.
    pub fn gpu_enabled(&self) -> bool {
        self.gpu_enabled
    }

    /// Mode the last render actually ran under.
    pub fn execution_mode(&self) -> ExecutionMode {
        self.mode
    }

    /// True once any render has run on the GPU. Never reset.
    pub fn accelerator_functional(&self) -> bool {
        self.accelerator_functional
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// The display buffer from the last render.
    pub fn pixels(&self) -> &[u32] {
        &self.display
    }

    /// The oversampled buffer from the last render.
    pub fn oversampled(&self) -> &[u32] {
        &self.oversampled
    }

    pub fn set_magnification(&mut self, magnification: f64) -> Result<()> {
        if !magnification.is_finite() || magnification <= 0.0 {
            return Err(Error::InvalidMagnification(magnification));
        }
        self.view.magnification = magnification;
        Ok(())
    }

    pub fn set_coordinates(&mut self, real: f64, imaginary: f64) {
        self.view.center = Complex::new(real, imaginary);
    }

    /// Change the antialiasing level. Reallocates both buffers when the
    /// sample grid changes.
    pub fn set_samples_per_pixel(&mut self, samples_per_pixel: u32) -> Result<()> {
        validate_samples_per_pixel(samples_per_pixel)?;
        let grid = SampleGrid::plan(samples_per_pixel)?;
        if grid != self.grid {
            self.grid = grid;
            self.reallocate();
        }
        Ok(())
    }

    pub fn set_image_detail(&mut self, image_detail: u32) -> Result<()> {
        if image_detail > MAX_IMAGE_DETAIL {
            return Err(Error::InvalidImageDetail(image_detail));
        }
        self.view.image_detail = image_detail;
        Ok(())
    }

    pub fn set_red_sensitivity(&mut self, red: i32) -> Result<()> {
        self.colours.set(Channel::Red, red)
    }

    pub fn set_green_sensitivity(&mut self, green: i32) -> Result<()> {
        self.colours.set(Channel::Green, green)
    }

    pub fn set_blue_sensitivity(&mut self, blue: i32) -> Result<()> {
        self.colours.set(Channel::Blue, blue)
    }

    pub fn set_colours(&mut self, colours: ColorSensitivity) {
        self.colours = colours;
    }

    pub fn set_render_julia_set(&mut self, enabled: bool) {
        self.julia.enabled = enabled;
    }

    pub fn set_julia_values(&mut self, real: f64, imaginary: f64) {
        self.julia.real = real;
        self.julia.imaginary = imaginary;
    }

    /// Ask for (or stop asking for) the GPU from the next render on.
    pub fn enable_gpu(&mut self, enabled: bool) {
        self.gpu_enabled = enabled;
    }

    /// Antialiasing used for the intermediate frames of a zoom.
    pub fn set_min_antialiasing(&mut self, samples_per_pixel: u32) -> Result<()> {
        validate_samples_per_pixel(samples_per_pixel)?;
        self.zoom_antialiasing.min = samples_per_pixel;
        Ok(())
    }

    /// Antialiasing used once a zoom settles.
    pub fn set_max_antialiasing(&mut self, samples_per_pixel: u32) -> Result<()> {
        validate_samples_per_pixel(samples_per_pixel)?;
        self.zoom_antialiasing.max = samples_per_pixel;
        Ok(())
    }

    pub fn set_kernel_variant(&mut self, variant: KernelVariant) {
        self.variant = variant;
    }

    /// Resize the display. Both buffers are reallocated; everything else is kept.
    pub fn change_size(&mut self, width: u32, height: u32) -> Result<()> {
        validate_size(width, height)?;
        self.size = screen::Size { width, height };
        self.reallocate();
        Ok(())
    }

    fn reallocate(&mut self) {
        let params = self.kernel_params();
        debug!(
            "reallocating buffers for {}x{} at {}x{} samples",
            self.size.width, self.size.height, self.grid.upscale_width, self.grid.upscale_height
        );
        self.oversampled = pixel::allocate(params.oversampled_pixels());
        self.display = pixel::allocate(params.display_pixels());
    }

    pub fn kernel_params(&self) -> KernelParams {
        KernelParams {
            size: self.size,
            grid: self.grid,
            view: self.view,
            colours: self.colours,
            julia: self.julia,
            variant: self.variant,
        }
    }

    /// Mode the next render will try.
    pub fn planned_mode(&self) -> ExecutionMode {
        if !self.gpu_enabled {
            return ExecutionMode::MultithreadedFallback;
        }
        if self.view.image_detail > ACCELERATED_MAX_IMAGE_DETAIL
            || self.grid.samples_per_pixel > ACCELERATED_MAX_SAMPLES_PER_PIXEL
        {
            debug!(
                "detail {} at {} samples per pixel is too heavy for the GPU; using the CPU for this render",
                self.view.image_detail, self.grid.samples_per_pixel
            );
            return ExecutionMode::MultithreadedFallback;
        }
        if !self.accelerator_resolves_view() {
            debug!(
                "magnification {} is past single precision; using the CPU for this render",
                self.view.magnification
            );
            return ExecutionMode::MultithreadedFallback;
        }
        ExecutionMode::Accelerated
    }

    /// Whether neighbouring pixels stay distinct in single precision at the
    /// current centre and zoom.
    fn accelerator_resolves_view(&self) -> bool {
        let params = self.kernel_params();
        let mut magnitude = self.view.center.real.abs().max(self.view.center.imaginary.abs());
        if self.julia.enabled {
            magnitude = magnitude
                .max(self.julia.real.abs())
                .max(self.julia.imaginary.abs());
        }
        params.pixel_step() >= ACCELERATED_MIN_PIXEL_STEP * magnitude.max(1.0)
    }

    /// Compute the oversampled image, resolve it to the display buffer and
    /// record which mode ran and how long it took.
    pub fn render(&mut self) -> Result<Frame<'_>> {
        let start = Instant::now();
        self.oversampled.fill(0);
        let params = self.kernel_params();

        let accelerated = self.planned_mode() == ExecutionMode::Accelerated
            && run_accelerated(
                &mut self.accelerator,
                &params,
                &mut self.oversampled,
                &mut self.display,
            );
        self.mode = if accelerated {
            ExecutionMode::Accelerated
        } else {
            self.cpu
                .execute(&params, &mut self.oversampled, &mut self.display)?;
            self.cpu.mode()
        };

        if self.mode == ExecutionMode::Accelerated && !self.accelerator_functional {
            info!("GPU rendering works");
            self.accelerator_functional = true;
        }
        self.elapsed = start.elapsed();
        debug!(
            "rendered {}x{} at {} samples per pixel on the {} in {:?}",
            self.size.width, self.size.height, self.grid.samples_per_pixel, self.mode, self.elapsed
        );
        Ok(self.frame())
    }

    fn frame(&self) -> Frame<'_> {
        Frame {
            pixels: &self.display,
            size: self.size,
            samples_per_pixel: self.grid.samples_per_pixel,
            elapsed: self.elapsed,
            mode: self.mode,
        }
    }

    /// Complex-plane point under screen pixel `(x, y)`.
    pub fn convert_screen_to_complex(&self, x: i32, y: i32) -> Complex {
        self.view.grid_to_complex(
            self.size.aspect(),
            f64::from(x),
            f64::from(y),
            f64::from(self.size.width),
            f64::from(self.size.height),
        )
    }

    /// Screen position of a complex-plane point. Inverse of
    /// [`FractalOrchestrator::convert_screen_to_complex`].
    pub fn convert_complex_to_screen(&self, point: Complex) -> (f64, f64) {
        self.view.complex_to_grid(
            self.size.aspect(),
            point,
            f64::from(self.size.width),
            f64::from(self.size.height),
        )
    }

    /// The centre that would put screen pixel `(x, y)` in the middle of the view.
    fn screen_to_center(&self, x: i32, y: i32) -> Complex {
        self.view.grid_to_complex(
            1.0,
            f64::from(x),
            f64::from(y),
            f64::from(self.size.width),
            f64::from(self.size.height),
        )
    }

    /// Frames in a zoom sequence: fewer at high magnification.
    pub fn zoom_steps(&self) -> usize {
        let depth = (self.view.magnification * f64::from(self.view.image_detail)).ln();
        (10.0 - depth.max(0.0)).max(1.0) as usize
    }

    /// Glide towards screen pixel `(x, y)` while zooming in, rendering and
    /// publishing every intermediate frame. Intermediate frames use the
    /// minimum antialiasing, the last one the maximum.
    pub fn zoom_in(&mut self, x: i32, y: i32, mut publish: impl FnMut(&Frame<'_>)) -> Result<()> {
        let target = self.screen_to_center(x, y);
        let start = self.view.center;
        let steps = self.zoom_steps();
        let step = Complex::new(
            (target.real - start.real) / steps as f64,
            (target.imaginary - start.imaginary) / steps as f64,
        );
        debug!("zooming towards {:?} in {} steps", target, steps);

        self.set_samples_per_pixel(self.zoom_antialiasing.min)?;
        let result = self.zoom_frames(step, steps, &mut publish);
        if result.is_err() {
            self.set_samples_per_pixel(self.zoom_antialiasing.max)?;
        }
        result
    }

    fn zoom_frames(
        &mut self,
        step: Complex,
        steps: usize,
        publish: &mut impl FnMut(&Frame<'_>),
    ) -> Result<()> {
        for index in 0..steps {
            let center = self.view.center;
            self.set_coordinates(center.real + step.real, center.imaginary + step.imaginary);
            self.set_magnification(self.view.magnification * (1.0 + 1.0 / steps as f64))?;
            if index == steps - 1 {
                self.set_samples_per_pixel(self.zoom_antialiasing.max)?;
            }

            let frame = self.render()?;
            publish(&frame);
        }
        Ok(())
    }

    /// Zoom out by a fixed factor and render once.
    pub fn zoom_out(&mut self) -> Result<Frame<'_>> {
        self.set_magnification(self.view.magnification * ZOOM_OUT_FACTOR)?;
        self.render()
    }

    /// Animate the Julia set from a fixed starting parameter, drifting the
    /// parameter and cycling the red sensitivity each frame. Restores the
    /// previous colours, switches back to the Mandelbrot set and publishes a
    /// final frame at the maximum antialiasing.
    pub fn animate_julia(&mut self, frames: usize, mut publish: impl FnMut(&Frame<'_>)) -> Result<()> {
        let previous_colours = self.colours;
        self.set_julia_values(JULIA_DEMO_START.real, JULIA_DEMO_START.imaginary);
        self.set_render_julia_set(true);
        self.set_samples_per_pixel(self.zoom_antialiasing.min)?;
        self.colours.blue = JULIA_DEMO_BLUE;

        let mut red_step = JULIA_DEMO_RED_STEP;
        for _ in 0..frames {
            self.set_julia_values(
                self.julia.real + JULIA_DEMO_DRIFT,
                self.julia.imaginary + JULIA_DEMO_DRIFT,
            );
            let red = i32::from(self.colours.red);
            if !(0..=255).contains(&(red + red_step)) {
                red_step = -red_step;
            }
            self.set_red_sensitivity(red + red_step)?;

            let frame = self.render()?;
            publish(&frame);
        }

        self.colours = previous_colours;
        self.set_render_julia_set(false);
        self.set_samples_per_pixel(self.zoom_antialiasing.max)?;
        let frame = self.render()?;
        publish(&frame);
        Ok(())
    }
}

/// Run a render on the GPU, initialising it on first use. Returns false when
/// the GPU is unavailable or the run failed.
fn run_accelerated(
    accelerator: &mut Accelerator,
    params: &KernelParams,
    oversampled: &mut [u32],
    display: &mut [u32],
) -> bool {
    if let Accelerator::Untried = accelerator {
        *accelerator = match GpuExecutor::new() {
            Ok(executor) => {
                info!("GPU ready on {}", executor.adapter_name());
                Accelerator::Ready(Box::new(executor))
            }
            Err(error) => {
                warn!("{}; rendering on the CPU", error);
                Accelerator::Unavailable
            }
        };
    }

    match accelerator {
        Accelerator::Ready(executor) => match executor.execute(params, oversampled, display) {
            Ok(()) => true,
            Err(error) => {
                warn!("GPU render failed, falling back to the CPU: {}", error);
                false
            }
        },
        Accelerator::Untried | Accelerator::Unavailable => false,
    }
}

fn validate_samples_per_pixel(samples_per_pixel: u32) -> Result<()> {
    if !(1..=MAX_SAMPLES_PER_PIXEL).contains(&samples_per_pixel) {
        return Err(Error::InvalidSamplesPerPixel(samples_per_pixel));
    }
    Ok(())
}

fn validate_size(width: u32, height: u32) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(Error::InvalidSize { width, height });
    }
    Ok(())
}
