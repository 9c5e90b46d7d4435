use log::{error, info};
use wgpu_fractal::{Config, Frame, FractalOrchestrator};

fn main() {
    env_logger::init();

    if let Err(error) = run() {
        error!("{}", error);
        std::process::exit(1);
    }
}

fn run() -> wgpu_fractal::Result<()> {
    let config = match std::env::args().nth(1) {
        Some(path) => {
            info!("loading configuration from {}", path);
            Config::load(path)?
        }
        None => Config::default(),
    };
    let mut orchestrator = FractalOrchestrator::from_config(&config)?;

    let frame = orchestrator.render()?;
    report("initial", &frame);

    // Seahorse valley, near -0.75 + 0.1i.
    let size = orchestrator.size();
    let (x, y) = ((size.width * 5 / 16) as i32, (size.height * 19 / 40) as i32);
    let mut step = 0;
    orchestrator.zoom_in(x, y, |frame| {
        step += 1;
        report(&format!("zoom step {}", step), frame);
    })?;

    info!(
        "centre {:?}, magnification {}, GPU functional: {}",
        orchestrator.center(),
        orchestrator.magnification(),
        orchestrator.accelerator_functional()
    );
    Ok(())
}

fn report(label: &str, frame: &Frame<'_>) {
    let lit = frame
        .pixels
        .chunks(wgpu_fractal::pixel::CHANNELS)
        .filter(|pixel| pixel.iter().any(|channel| *channel > 0))
        .count();
    info!(
        "{}: {}x{} at {}x antialiasing on the {} in {} ms ({} escaped pixels)",
        label,
        frame.size.width,
        frame.size.height,
        frame.samples_per_pixel,
        frame.mode,
        frame.millis_elapsed(),
        lit
    );
}
