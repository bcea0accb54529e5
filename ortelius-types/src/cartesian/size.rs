#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Size of a rectangular area, e.g. of a map widget, in pixels.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Size {
    width: f64,
    height: f64,
}

impl Size {
    /// Creates a new size value.
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Width of the area.
    pub fn width(&self) -> f64 {
        self.width
    }

    /// Height of the area.
    pub fn height(&self) -> f64 {
        self.height
    }

    /// Half of the width.
    pub fn half_width(&self) -> f64 {
        self.width / 2.0
    }

    /// Half of the height.
    pub fn half_height(&self) -> f64 {
        self.height / 2.0
    }

    /// Returns true if either of the dimensions is zero or not finite.
    pub fn is_zero(&self) -> bool {
        self.width == 0.0
            || self.height == 0.0
            || !self.width.is_finite()
            || !self.height.is_finite()
    }
}
