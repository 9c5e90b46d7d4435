use crate::{error::Result, kernel::KernelParams};

/// Where a render pass ran.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExecutionMode {
    Accelerated,
    MultithreadedFallback,
}

impl std::fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExecutionMode::Accelerated => write!(f, "GPU"),
            ExecutionMode::MultithreadedFallback => write!(f, "CPU"),
        }
    }
}

/// Runs both passes of a render: the escape-time kernel over every index of
/// `oversampled`, then the antialiasing resolve over every index of `display`.
pub trait Executor {
    fn mode(&self) -> ExecutionMode;

    fn execute(
        &mut self,
        params: &KernelParams,
        oversampled: &mut [u32],
        display: &mut [u32],
    ) -> Result<()>;
}
