//! Configuration for a fractal view.
//!
//! Every field has a default, so a configuration file only needs to name the
//! values it changes. Values are validated when they are applied to a
//! [`FractalOrchestrator`](crate::orchestrator::FractalOrchestrator), not here.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{
    colour::ColorSensitivity, error::Result, kernel::KernelVariant, pixel::Complex,
    view::JuliaParams,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub width: u32,
    pub height: u32,
    pub center: Complex,
    pub magnification: f64,
    /// Growth of the iteration budget with zoom, 0..=10.
    pub image_detail: u32,
    pub colours: ColoursConfig,
    pub antialiasing: AntialiasingConfig,
    pub julia: JuliaParams,
    /// Prefer the GPU when the workload allows it.
    pub gpu_enabled: bool,
    pub kernel: KernelVariant,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            center: Complex::ZERO,
            magnification: 1.0,
            image_detail: 1,
            colours: ColoursConfig::default(),
            antialiasing: AntialiasingConfig::default(),
            julia: JuliaParams::default(),
            gpu_enabled: false,
            kernel: KernelVariant::default(),
        }
    }
}

impl Config {
    /// Read a JSON configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }
}

/// Per-channel sensitivities, each 0..=255. Kept wide so that an out of range
/// value reaches the setter's check instead of failing to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColoursConfig {
    pub red: i32,
    pub green: i32,
    pub blue: i32,
}

impl Default for ColoursConfig {
    fn default() -> Self {
        let colours = ColorSensitivity::default();
        Self {
            red: colours.red.into(),
            green: colours.green.into(),
            blue: colours.blue.into(),
        }
    }
}

/// Samples per pixel, each 1..=16.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AntialiasingConfig {
    /// Used for the intermediate frames of a zoom.
    pub min: u32,
    /// Used once the view settles.
    pub max: u32,
}

impl Default for AntialiasingConfig {
    fn default() -> Self {
        Self { min: 1, max: 4 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn missing_fields_take_defaults() {
        let config: Config =
            serde_json::from_str(r#"{ "width": 320, "antialiasing": { "max": 9 } }"#).unwrap();
        assert_eq!(config.width, 320);
        assert_eq!(config.height, 600);
        assert_eq!(config.antialiasing, AntialiasingConfig { min: 1, max: 9 });
        assert_eq!(
            config.colours,
            ColoursConfig {
                red: 1,
                green: 155,
                blue: 255
            }
        );
        assert_eq!(config.kernel, KernelVariant::Current);
    }

    #[test]
    fn parses_every_section() {
        let config: Config = serde_json::from_str(
            r#"{
                "center": { "real": -0.75, "imaginary": 0.1 },
                "magnification": 20.0,
                "colours": { "red": 10, "green": 20, "blue": 30 },
                "julia": { "enabled": true, "real": -0.1, "imaginary": 0.651 },
                "gpu_enabled": true,
                "kernel": "legacy"
            }"#,
        )
        .unwrap();
        assert_eq!(config.center, Complex::new(-0.75, 0.1));
        assert_eq!(config.magnification, 20.0);
        assert_eq!(
            config.colours,
            ColoursConfig {
                red: 10,
                green: 20,
                blue: 30
            }
        );
        assert!(config.julia.enabled);
        assert!(config.gpu_enabled);
        assert_eq!(config.kernel, KernelVariant::Legacy);
    }

    #[test]
    fn out_of_range_sensitivity_still_parses() {
        let config: Config =
            serde_json::from_str(r#"{ "colours": { "red": 256, "blue": -4 } }"#).unwrap();
        assert_eq!(config.colours.red, 256);
        assert_eq!(config.colours.green, 155);
        assert_eq!(config.colours.blue, -4);
    }
}
