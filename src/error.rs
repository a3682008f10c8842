//! Error type shared by every entry point.

use crate::kernels::Backend;
use thiserror::Error;

/// Errors reported by matrix operations.
///
/// Singular matrices are not errors for the determinant, inverse and solve
/// entry points: those report a zero determinant instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LinalgError {
    /// Operand shapes are incompatible.
    #[error("dimension mismatch: {0}")]
    DimensionMismatch(String),

    /// A square matrix was required.
    #[error("matrix is {rows}x{cols}, expected square")]
    NotSquare { rows: usize, cols: usize },

    /// A window does not fit inside its parent.
    #[error("window [{row}..{row_end}, {col}..{col_end}] outside {rows}x{cols} matrix")]
    WindowOutOfBounds {
        row: usize,
        row_end: usize,
        col: usize,
        col_end: usize,
        rows: usize,
        cols: usize,
    },

    /// Buffer size computation would overflow.
    #[error("dimensions too large")]
    TooLarge,

    /// Modulus outside `[2, 2^60)`.
    #[error("invalid modulus {0}")]
    InvalidModulus(u64),

    /// Elimination width exceeds the column count.
    #[error("elimination width {width} exceeds {cols} columns")]
    BadWidth { width: usize, cols: usize },

    /// A nonzero element shares a factor with a composite modulus.
    #[error("{value} is not invertible (gcd {gcd} with modulus)")]
    NotInvertible { value: u64, gcd: u64 },

    /// The accumulator cannot absorb a panel of products for this modulus.
    #[error("{0:?} accumulator cannot absorb {1} products before reducing")]
    AccumulatorTooNarrow(Backend, usize),

    /// The matrix has no inverse.
    #[error("matrix is singular")]
    Singular,
}

pub type Result<T> = std::result::Result<T, LinalgError>;

/// Checked `a * b`, mapped to [`LinalgError::TooLarge`].
pub(crate) fn checked_area(a: usize, b: usize) -> Result<usize> {
    a.checked_mul(b).ok_or(LinalgError::TooLarge)
}
