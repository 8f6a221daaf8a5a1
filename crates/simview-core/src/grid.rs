//! Grid dimensions.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{DomainError, DomainResult};

/// Size of the simulated city in cells.
///
/// Sent by the server on connect and whenever a scenario changes; it is
/// applied as soon as it arrives rather than at a frame boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridConfig {
    pub width: u32,
    pub height: u32,
}

impl GridConfig {
    /// Width used until the server sends its own.
    pub const DEFAULT_WIDTH: u32 = 35;

    /// Height used until the server sends its own.
    pub const DEFAULT_HEIGHT: u32 = 23;

    /// Creates a grid, rejecting zero-sized dimensions.
    pub fn try_new(width: u32, height: u32) -> DomainResult<Self> {
        if width == 0 || height == 0 {
            return Err(DomainError::InvalidFieldValue {
                field: "grid size".to_string(),
                value: format!("{width}x{height}"),
                expected: "non-zero width and height".to_string(),
            });
        }
        Ok(Self { width, height })
    }

    /// Returns true if the grid-space position lies inside the grid.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= 0.0 && y >= 0.0 && x < f64::from(self.width) && y < f64::from(self.height)
    }

    /// Number of cells.
    pub fn cell_count(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            width: Self::DEFAULT_WIDTH,
            height: Self::DEFAULT_HEIGHT,
        }
    }
}

impl fmt::Display for GridConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}
