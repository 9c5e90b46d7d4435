use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

/// Display resolution in pixels.
#[repr(C)]
#[derive(Pod, Zeroable, Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Height over width, used to keep the view undistorted on non-square screens.
    pub fn aspect(&self) -> f64 {
        f64::from(self.height) / f64::from(self.width)
    }
}
