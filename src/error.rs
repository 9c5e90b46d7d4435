use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid samples per pixel: {0} (expected 1..=16)")]
    InvalidSamplesPerPixel(u32),
    #[error("Invalid {channel} sensitivity: {value} (expected 0..=255)")]
    InvalidSensitivity { channel: Channel, value: i32 },
    #[error("Invalid image detail: {0} (expected 0..=10)")]
    InvalidImageDetail(u32),
    #[error("Invalid magnification: {0} (expected a finite value above zero)")]
    InvalidMagnification(f64),
    #[error("Invalid size: {width}x{height}")]
    InvalidSize { width: u32, height: u32 },
    #[error("Failed to start worker threads: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
    #[error("Accelerator unavailable: {0}")]
    AcceleratorUnavailable(String),
    #[error("Failed to read configuration: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse configuration: {0}")]
    Config(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Channel {
    Red,
    Green,
    Blue,
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Channel::Red => write!(f, "red"),
            Channel::Green => write!(f, "green"),
            Channel::Blue => write!(f, "blue"),
        }
    }
}
