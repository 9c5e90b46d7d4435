//! Colouring algorithms.

use crate::error::{Channel, Error, Result};

/// Per-channel scale applied to the normalised iteration count of an escaped point.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ColorSensitivity {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl ColorSensitivity {
    pub fn new(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    pub fn get(&self, channel: Channel) -> u8 {
        match channel {
            Channel::Red => self.red,
            Channel::Green => self.green,
            Channel::Blue => self.blue,
        }
    }

    /// Replace one channel, rejecting values outside `0..=255` and leaving the
    /// current value in place when that happens.
    pub fn set(&mut self, channel: Channel, value: i32) -> Result<()> {
        let value =
            u8::try_from(value).map_err(|_| Error::InvalidSensitivity { channel, value })?;
        match channel {
            Channel::Red => self.red = value,
            Channel::Green => self.green = value,
            Channel::Blue => self.blue = value,
        }
        Ok(())
    }

    /// Linear colouring: each channel is `sensitivity * iterations / budget`, truncated.
    pub fn escaped(&self, iterations: u32, budget: f64) -> [u32; 3] {
        let scale = |sensitivity: u8| (f64::from(sensitivity) * f64::from(iterations) / budget) as u32;
        [scale(self.red), scale(self.green), scale(self.blue)]
    }

    /// Same as [`ColorSensitivity::escaped`] evaluated in single precision.
    pub fn escaped_f32(&self, iterations: u32, budget: f32) -> [u32; 3] {
        let scale = |sensitivity: u8| (f32::from(sensitivity) * iterations as f32 / budget) as u32;
        [scale(self.red), scale(self.green), scale(self.blue)]
    }
}

impl Default for ColorSensitivity {
    fn default() -> Self {
        Self::new(1, 155, 255)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn rejects_out_of_range_and_keeps_previous() {
        let mut colours = ColorSensitivity::default();
        assert!(matches!(
            colours.set(Channel::Green, 256),
            Err(Error::InvalidSensitivity {
                channel: Channel::Green,
                value: 256
            })
        ));
        assert!(colours.set(Channel::Red, -1).is_err());
        assert_eq!(colours, ColorSensitivity::default());

        colours.set(Channel::Blue, 0).unwrap();
        colours.set(Channel::Red, 255).unwrap();
        assert_eq!(colours, ColorSensitivity::new(255, 155, 0));
    }

    #[test]
    fn escaped_colour_truncates() {
        let colours = ColorSensitivity::new(255, 100, 0);
        assert_eq!(colours.escaped(0, 51.0), [0, 0, 0]);
        // 255 * 10 / 51 = 50, 100 * 10 / 51 = 19.6
        assert_eq!(colours.escaped(10, 51.0), [50, 19, 0]);
        assert_eq!(colours.escaped(51, 51.0), [255, 100, 0]);
    }
}
