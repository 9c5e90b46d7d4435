use std::io::Write;

use test_log::test;
use wgpu_fractal::{
    colour::ColorSensitivity, error::Channel, Config, Error, FractalOrchestrator,
};

fn write_config(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn loads_and_applies_a_file() {
    let file = write_config(
        r#"{
            "width": 64,
            "height": 48,
            "center": { "real": -0.75, "imaginary": 0.1 },
            "magnification": 8.0,
            "image_detail": 3,
            "antialiasing": { "min": 2, "max": 9 },
            "julia": { "enabled": true, "real": 0.285, "imaginary": 0.01 }
        }"#,
    );
    let config = Config::load(file.path()).unwrap();
    let orchestrator = FractalOrchestrator::from_config(&config).unwrap();

    assert_eq!(orchestrator.size().width, 64);
    assert_eq!(orchestrator.size().height, 48);
    assert_eq!(orchestrator.magnification(), 8.0);
    assert_eq!(orchestrator.image_detail(), 3);
    assert_eq!(orchestrator.min_antialiasing(), 2);
    assert_eq!(orchestrator.samples_per_pixel(), 9);
    assert!(orchestrator.julia().enabled);
    assert_eq!(orchestrator.pixels().len(), 64 * 48 * 3);
}

#[test]
fn invalid_values_are_rejected() {
    let file = write_config(r#"{ "antialiasing": { "max": 17 } }"#);
    let config = Config::load(file.path()).unwrap();
    assert!(matches!(
        FractalOrchestrator::from_config(&config),
        Err(Error::InvalidSamplesPerPixel(17))
    ));

    let file = write_config(r#"{ "image_detail": 12 }"#);
    let config = Config::load(file.path()).unwrap();
    assert!(matches!(
        FractalOrchestrator::from_config(&config),
        Err(Error::InvalidImageDetail(12))
    ));

    let file = write_config(r#"{ "width": 0 }"#);
    let config = Config::load(file.path()).unwrap();
    assert!(matches!(
        FractalOrchestrator::from_config(&config),
        Err(Error::InvalidSize { width: 0, .. })
    ));
}

#[test]
fn sensitivities_are_checked_like_the_setters() {
    let file = write_config(r#"{ "colours": { "red": 256 } }"#);
    let config = Config::load(file.path()).unwrap();
    assert!(matches!(
        FractalOrchestrator::from_config(&config),
        Err(Error::InvalidSensitivity {
            channel: Channel::Red,
            value: 256
        })
    ));

    let file = write_config(r#"{ "colours": { "blue": -1 } }"#);
    let config = Config::load(file.path()).unwrap();
    assert!(matches!(
        FractalOrchestrator::from_config(&config),
        Err(Error::InvalidSensitivity {
            channel: Channel::Blue,
            value: -1
        })
    ));

    let file = write_config(r#"{ "colours": { "red": 10, "green": 20, "blue": 30 } }"#);
    let config = Config::load(file.path()).unwrap();
    let orchestrator = FractalOrchestrator::from_config(&config).unwrap();
    assert_eq!(orchestrator.colours(), ColorSensitivity::new(10, 20, 30));
}

#[test]
fn unreadable_files_report_why() {
    let file = write_config("{ not json");
    assert!(matches!(Config::load(file.path()), Err(Error::Config(_))));

    let directory = tempfile::tempdir().unwrap();
    let missing = directory.path().join("missing.json");
    assert!(matches!(Config::load(missing), Err(Error::Io(_))));
}
