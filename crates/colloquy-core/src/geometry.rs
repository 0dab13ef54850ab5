//! Editor coordinates.

use serde::{Deserialize, Serialize};

/// A 2D position on the editing surface.
///
/// Positions are carried through save and load unchanged; nothing in the
/// engine interprets them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    x: f32,
    y: f32,
}

impl Position {
    /// Creates a new position.
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Returns the horizontal coordinate.
    pub fn x(self) -> f32 {
        self.x
    }

    /// Returns the vertical coordinate.
    pub fn y(self) -> f32 {
        self.y
    }
}
