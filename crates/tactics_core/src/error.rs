//! Error types for match setup.
//!
//! Gameplay rejections (illegal path steps, commands issued while another
//! actor is busy, empty selections) are not errors: they are reported as
//! `bool` or silently ignored. `TacticsError` only covers failures while
//! building a battle from configuration.

use thiserror::Error;

use crate::grid::CellCoord;

/// Result type alias using [`TacticsError`].
pub type Result<T, E = TacticsError> = std::result::Result<T, E>;

/// Top-level error type for engine setup failures.
#[derive(Debug, Error)]
pub enum TacticsError {
    /// Grid dimensions must be positive.
    #[error("Invalid grid dimensions: {width}x{height}")]
    InvalidGridSize {
        /// Requested width.
        width: u32,
        /// Requested height.
        height: u32,
    },

    /// Footprints are odd-sized rectangles centred on their pivot.
    #[error("Footprint must have odd positive dimensions, got {width}x{height}")]
    InvalidFootprint {
        /// Requested width.
        width: u32,
        /// Requested height.
        height: u32,
    },

    /// A referenced cell lies outside the grid.
    #[error("Cell {0} is outside the grid")]
    OutOfBounds(CellCoord),

    /// An actor could not be placed at the requested pose.
    #[error("Cannot place '{name}' at {cell}: {reason}")]
    InvalidPlacement {
        /// Actor name from the configuration.
        name: String,
        /// Requested pivot cell.
        cell: CellCoord,
        /// Why the placement was refused.
        reason: String,
    },

    /// A match needs between two and 255 sides.
    #[error("A match needs between 2 and 255 sides, got {0}")]
    InvalidSideCount(usize),

    /// The side referenced by a placement does not exist.
    #[error("Unknown side index {0}")]
    UnknownSide(u8),

    /// Configuration file could not be read.
    #[error("Failed to read match config '{path}': {source}")]
    ConfigRead {
        /// Path to the file.
        path: String,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Configuration could not be parsed.
    #[error("Failed to parse match config: {0}")]
    ConfigParse(#[from] ron::error::SpannedError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setup_error_messages() {
        assert_eq!(TacticsError::UnknownSide(3).to_string(), "Unknown side index 3");
        assert_eq!(
            TacticsError::InvalidSideCount(1).to_string(),
            "A match needs between 2 and 255 sides, got 1"
        );
    }
}
