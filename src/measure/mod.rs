//! Intrinsic size of styled text under a width constraint.

mod layout;
mod slot;

use serde::{Deserialize, Serialize};

pub use layout::layout;
pub use slot::MeasuredText;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MeasuredSize {
    pub width: f32,
    pub height: f32,
}

impl MeasuredSize {
    pub const ZERO: Self = Self {
        width: 0.0,
        height: 0.0,
    };

    pub fn area(&self) -> f32 {
        self.width * self.height
    }
}

/// Approximate font metrics, expressed relative to the font size.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextMetrics {
    /// Average advance of one column of body text.
    pub body_advance: f32,
    pub monospace_advance: f32,
    /// Extra advance of bold glyphs.
    pub bold_factor: f32,
    pub line_height: f32,
}

impl Default for TextMetrics {
    fn default() -> Self {
        Self {
            body_advance: 0.5,
            monospace_advance: 0.6,
            bold_factor: 1.05,
            line_height: 1.25,
        }
    }
}
