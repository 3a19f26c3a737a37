//! Logical canvas geometry.
//!
//! Definitions position layers in logical pixels of a fixed canvas. The
//! scale mapper turns these into display pixels.

use serde::{Deserialize, Serialize};

/// Width and height in logical (or display) pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Width divided by height, or `None` for a degenerate size.
    pub fn aspect_ratio(&self) -> Option<f64> {
        (self.height > 0.0 && self.width.is_finite() && self.height.is_finite())
            .then(|| self.width / self.height)
    }

    /// Multiply both dimensions by `factor`.
    pub fn scaled(&self, factor: f64) -> Size {
        Size::new(self.width * factor, self.height * factor)
    }

    /// Height that keeps this size's aspect ratio at the given width.
    pub fn height_for_width(&self, width: f64) -> f64 {
        if self.width <= 0.0 {
            return 0.0;
        }
        width * self.height / self.width
    }
}

/// An axis-aligned rectangle. `(0, 0)` is the canvas's top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    /// Rectangle covering the whole of `size`.
    pub fn full(size: Size) -> Self {
        Self::new(0.0, 0.0, size.width, size.height)
    }

    pub fn right(&self) -> f64 {
        self.x + self.w
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.h
    }

    pub fn scaled(&self, factor: f64) -> Rect {
        Rect::new(
            self.x * factor,
            self.y * factor,
            self.w * factor,
            self.h * factor,
        )
    }

    /// Check if a point lies inside (edges included).
    pub fn contains(&self, px: f64, py: f64) -> bool {
        px >= self.x && px <= self.right() && py >= self.y && py <= self.bottom()
    }
}
