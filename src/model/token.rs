//! Recognized text tokens with position information.

use serde::{Deserialize, Serialize};

/// A single recognized text token with its bounding polygon.
///
/// Produced by the token-stream extraction boundary. The polygon is the
/// four-point quadrilateral reported by the OCR engine; all positional
/// queries are derived from its extrema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    /// Recognized text content.
    pub text: String,
    /// Recognition confidence in `[0, 1]`.
    pub confidence: f32,
    /// Bounding quadrilateral as four `(x, y)` points.
    pub polygon: [(f32, f32); 4],
}

impl Token {
    /// Create a new token.
    pub fn new(text: impl Into<String>, confidence: f32, polygon: [(f32, f32); 4]) -> Self {
        Self {
            text: text.into(),
            confidence,
            polygon,
        }
    }

    /// Horizontal center of the bounding polygon.
    pub fn center_x(&self) -> f32 {
        self.polygon.iter().map(|p| p.0).sum::<f32>() / 4.0
    }

    /// Vertical center of the bounding polygon.
    pub fn center_y(&self) -> f32 {
        self.polygon.iter().map(|p| p.1).sum::<f32>() / 4.0
    }

    /// Topmost Y coordinate.
    pub fn top(&self) -> f32 {
        fold_min(self.polygon.iter().map(|p| p.1))
    }

    /// Bottommost Y coordinate.
    pub fn bottom(&self) -> f32 {
        fold_max(self.polygon.iter().map(|p| p.1))
    }

    /// Leftmost X coordinate.
    pub fn left(&self) -> f32 {
        fold_min(self.polygon.iter().map(|p| p.0))
    }

    /// Rightmost X coordinate.
    pub fn right(&self) -> f32 {
        fold_max(self.polygon.iter().map(|p| p.0))
    }

    /// Height of the bounding polygon.
    pub fn height(&self) -> f32 {
        self.bottom() - self.top()
    }

    /// Convenience constructor for an axis-aligned box.
    pub fn from_rect(
        text: impl Into<String>,
        confidence: f32,
        left: f32,
        top: f32,
        right: f32,
        bottom: f32,
    ) -> Self {
        Self::new(
            text,
            confidence,
            [(left, top), (right, top), (right, bottom), (left, bottom)],
        )
    }
}

fn fold_min(values: impl Iterator<Item = f32>) -> f32 {
    values.fold(f32::INFINITY, f32::min)
}

fn fold_max(values: impl Iterator<Item = f32>) -> f32 {
    values.fold(f32::NEG_INFINITY, f32::max)
}
