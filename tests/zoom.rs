use test_log::test;
use wgpu_fractal::{pixel::Complex, FractalOrchestrator};

#[test]
fn zoom_lands_on_the_clicked_point() {
    let mut orchestrator = FractalOrchestrator::new(40, 30).unwrap();
    orchestrator.set_min_antialiasing(2).unwrap();
    orchestrator.set_max_antialiasing(6).unwrap();

    let mut published = Vec::new();
    orchestrator
        .zoom_in(10, 12, |frame| published.push(frame.samples_per_pixel))
        .unwrap();

    let steps = published.len();
    assert_eq!(steps, 10);
    assert!(published[..steps - 1].iter().all(|samples| *samples == 2));
    assert_eq!(published[steps - 1], 6);

    // (10, 12) on a 40x30 view is (-1, 0.4) in centre space.
    let center = orchestrator.center();
    assert!((center.real + 1.0).abs() < 1e-9);
    assert!((center.imaginary - 0.4).abs() < 1e-9);

    // The clicked point is now in the middle of the screen.
    let (x, y) = orchestrator.convert_complex_to_screen(Complex::new(-1.0, 0.4 * 0.75));
    assert!((x - 20.0).abs() < 1e-6);
    assert!((y - 15.0).abs() < 1e-6);
}

#[test]
fn deep_zooms_take_fewer_frames() {
    let mut orchestrator = FractalOrchestrator::new(16, 16).unwrap();
    orchestrator.set_magnification(1e5).unwrap();
    orchestrator.set_image_detail(1).unwrap();
    let expected = orchestrator.zoom_steps();
    assert!(expected < 10);

    let mut frames = 0;
    orchestrator.zoom_in(8, 8, |_| frames += 1).unwrap();
    assert_eq!(frames, expected);
}

#[test]
fn zoom_out_then_in_is_reversible_in_magnification() {
    let mut orchestrator = FractalOrchestrator::new(8, 8).unwrap();
    orchestrator.set_magnification(5.0).unwrap();
    orchestrator.zoom_out().unwrap();
    assert!((orchestrator.magnification() - 1.0).abs() < 1e-12);
}

#[test]
fn julia_animation_publishes_every_frame_and_restores() {
    let mut orchestrator = FractalOrchestrator::new(12, 9).unwrap();
    orchestrator.set_max_antialiasing(9).unwrap();
    let colours = orchestrator.colours();

    let mut published = Vec::new();
    orchestrator
        .animate_julia(5, |frame| published.push((frame.samples_per_pixel, frame.pixels.len())))
        .unwrap();

    assert_eq!(published.len(), 6);
    assert!(published[..5].iter().all(|frame| *frame == (1, 12 * 9 * 3)));
    assert_eq!(published[5], (9, 12 * 9 * 3));
    assert_eq!(orchestrator.colours(), colours);
    assert!(!orchestrator.julia().enabled);
}
