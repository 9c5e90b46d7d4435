//! Multithreaded fallback executor.

use log::{debug, trace};
use rayon::prelude::{IndexedParallelIterator, ParallelIterator, ParallelSliceMut};

use crate::{
    antialias,
    error::Result,
    executor::{ExecutionMode, Executor},
    kernel::{self, KernelParams},
    pixel::CHANNELS,
};

pub struct CpuExecutor {
    pool: rayon::ThreadPool,
}

impl CpuExecutor {
    pub fn new() -> Result<Self> {
        let threads = num_cpus::get();
        debug!("starting {} fallback worker threads", threads);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|index| format!("fractal-worker-{}", index))
            .build()?;
        Ok(Self { pool })
    }

    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }
}

impl Executor for CpuExecutor {
    fn mode(&self) -> ExecutionMode {
        ExecutionMode::MultithreadedFallback
    }

    fn execute(
        &mut self,
        params: &KernelParams,
        oversampled: &mut [u32],
        display: &mut [u32],
    ) -> Result<()> {
        self.pool.install(|| {
            trace!("begin escape_time");
            oversampled
                .par_chunks_mut(CHANNELS)
                .enumerate()
                .for_each(|(index, pixel)| kernel::run(params, index, pixel));
            trace!("end escape_time");

            let oversampled = &*oversampled;
            trace!("begin antialias");
            display
                .par_chunks_mut(CHANNELS)
                .enumerate()
                .for_each(|(index, pixel)| antialias::run(params, oversampled, index, pixel));
            trace!("end antialias");
        });
        Ok(())
    }
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

    fn params(samples_per_pixel: u32, julia: JuliaParams) -> KernelParams {
        KernelParams {
            size: screen::Size {
                width: 37,
                height: 23,
            },
            grid: SampleGrid::plan(samples_per_pixel).unwrap(),
            view: ViewState {
                center: Complex::new(-0.5, 0.1),
                magnification: 2.5,
                image_detail: 3,
            },
            colours: ColorSensitivity::new(200, 155, 255),
            julia,
            variant: KernelVariant::Current,
        }
    }

    fn sequential(params: &KernelParams) -> (Vec<u32>, Vec<u32>) {
        let mut oversampled = pixel::allocate(params.oversampled_pixels());
        for (index, pixel) in oversampled.chunks_mut(CHANNELS).enumerate() {
            kernel::run(params, index, pixel);
        }
        let mut display = pixel::allocate(params.display_pixels());
        for (index, pixel) in display.chunks_mut(CHANNELS).enumerate() {
            antialias::run(params, &oversampled, index, pixel);
        }
        (oversampled, display)
    }

    #[test]
    fn parallel_matches_sequential() {
        let mut executor = CpuExecutor::new().unwrap();
        assert!(executor.threads() >= 1);
        let julia = JuliaParams {
            enabled: true,
            real: -0.1,
            imaginary: 0.651,
        };
        for params in [params(1, JuliaParams::default()), params(4, julia), params(7, JuliaParams::default())] {
            let (expected_oversampled, expected_display) = sequential(&params);

            let mut oversampled = pixel::allocate(params.oversampled_pixels());
            let mut display = pixel::allocate(params.display_pixels());
            executor
                .execute(&params, &mut oversampled, &mut display)
                .unwrap();

            assert_eq!(oversampled, expected_oversampled);
            assert_eq!(display, expected_display);
            assert!(display.iter().any(|channel| *channel > 0));
        }
    }
}
