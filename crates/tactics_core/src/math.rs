//! Fixed-point math for presentation poses.
//!
//! Gameplay state is integer-only (cells, quarter turns, weights). The only
//! fractional values in the engine are the interpolated poses a replaying
//! actor reports to the presentation layer, and those use fixed-point so
//! that two runs of the same match produce bit-identical event streams.

use fixed::types::I32F32;
use serde::{Deserialize, Serialize};

use crate::grid::CellCoord;

/// Fixed-point number type for all fractional engine values.
///
/// Uses 32 bits for integer part and 32 bits for fractional part.
pub type Fixed = I32F32;

/// Fixed-point 2D vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Vec2Fixed {
    /// X coordinate.
    #[serde(with = "fixed_serde")]
    pub x: Fixed,
    /// Y coordinate.
    #[serde(with = "fixed_serde")]
    pub y: Fixed,
}

/// Serde support for fixed-point numbers.
///
/// Serializes fixed-point numbers as their raw bit representation (i64)
/// to preserve exact precision across serialization boundaries.
pub mod fixed_serde {
    use super::Fixed;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a fixed-point number as its raw bit representation.
    pub fn serialize<S>(value: &Fixed, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        value.to_bits().serialize(serializer)
    }

    /// Deserialize a fixed-point number from its raw bit representation.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Fixed, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bits = i64::deserialize(deserializer)?;
        Ok(Fixed::from_bits(bits))
    }
}

impl Vec2Fixed {
    /// Create a new fixed-point vector.
    #[must_use]
    pub const fn new(x: Fixed, y: Fixed) -> Self {
        Self { x, y }
    }

    /// Zero vector.
    pub const ZERO: Self = Self {
        x: Fixed::ZERO,
        y: Fixed::ZERO,
    };

    /// Position of a cell in board space (one unit per cell).
    #[must_use]
    pub fn from_cell(cell: CellCoord) -> Self {
        Self::new(Fixed::from_num(cell.x), Fixed::from_num(cell.y))
    }

    /// Linearly interpolate between two vectors.
    #[must_use]
    pub fn lerp(self, other: Self, t: Fixed) -> Self {
        Self {
            x: self.x + (other.x - self.x) * t,
            y: self.y + (other.y - self.y) * t,
        }
    }
}

/// Fraction `numerator / denominator` clamped to `[0, 1]`.
///
/// A zero denominator yields one, so zero-length animations complete at once.
#[must_use]
pub fn progress(numerator: u32, denominator: u32) -> Fixed {
    if denominator == 0 || numerator >= denominator {
        return Fixed::ONE;
    }
    Fixed::from_num(numerator) / Fixed::from_num(denominator)
}

/// Linearly interpolate between two scalars.
#[must_use]
pub fn lerp(from: Fixed, to: Fixed, t: Fixed) -> Fixed {
    from + (to - from) * t
}
