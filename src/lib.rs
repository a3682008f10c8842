//! Dense matrices over a word-sized prime field, in Rust.
//!
//! Everything here works on entries in `[0, p)` for one modulus `p < 2^60`.
//! The speed comes from the same places as in a floating point BLAS: 32-wide
//! panels that stay in cache, SIMD multiply-add, and Strassen on top. The
//! extra twist is modular reduction, which is expensive, so products are
//! accumulated in `u64`, `u128` or `f64` and reduced only when the
//! accumulator is about to run out of exact range.
//!
//! ## Usage
//!
//! ```
//! use zpmat::{Field, Mat};
//!
//! let f = Field::new(7).unwrap();
//! let a = Mat::from_rows(&[[1u64, 2], [3, 4]]).unwrap();
//!
//! let (det, inv) = zpmat::inverse(&f, &a).unwrap();
//! assert_eq!(det, 5);
//! let prod = zpmat::multiply(&f, &a, &inv.unwrap()).unwrap();
//! assert!(prod.is_identity());
//! ```
//!
//! Linear systems and row echelon forms:
//!
//! ```
//! use zpmat::{Field, Mat};
//!
//! let f = Field::new(97).unwrap();
//! let a = Mat::from_rows(&[[2u64, 0, 1], [1, 3, 0], [0, 1, 4]]).unwrap();
//! let (det, x) = zpmat::solve(&f, &a, &[5, 4, 6]).unwrap();
//! assert_ne!(det, 0);
//! assert_eq!(zpmat::matrix::ops::mul_vec(&f, &a, &x.unwrap()).unwrap(), vec![5, 4, 6]);
//!
//! let b = Mat::from_rows(&[[1u64, 2], [2, 4]]).unwrap();
//! assert_eq!(zpmat::rank(&f, &b).unwrap(), 1);
//! assert_eq!(zpmat::kernel(&f, &b).unwrap().row(0), &[95, 1]);
//! ```
//!
//! Large inputs are split across rayon's global pool. Run a call inside
//! `ThreadPool::install` to control how many threads it gets.
//!
//! ## What's inside
//!
//! - Barrett and Shoup scalar reduction
//! - 32×32 panel kernels for `u64`, `u128` and AVX2/FMA `f64`
//! - Strassen-Winograd over a blocked base case
//! - Blocked Gauss-Jordan for inverse, determinant and solve
//! - Blocked row echelon form with image and left kernel

pub mod blocked;
pub mod dispatch;
pub mod error;
pub mod field;
pub mod gauss;
pub mod kernels;
pub mod matrix;
pub mod threaded;

pub use error::{LinalgError, Result};
pub use field::{Field, InvStatus, MulPrecon};
pub use gauss::{Elimination, ImageMode};
pub use kernels::Backend;
pub use matrix::{Mat, MatMut, MatRef, Permutation};

use tracing::debug;

fn check_mul_shapes(a: MatRef<'_>, b: MatRef<'_>) -> Result<()> {
    if a.cols() != b.rows() {
        return Err(LinalgError::DimensionMismatch(format!(
            "cannot multiply {}x{} by {}x{}",
            a.rows(),
            a.cols(),
            b.rows(),
            b.cols()
        )));
    }
    Ok(())
}

/// `A · B`.
pub fn multiply(field: &Field, a: &Mat, b: &Mat) -> Result<Mat> {
    check_mul_shapes(a.view(), b.view())?;
    let mut c = Mat::try_zeros(a.num_rows(), b.num_cols())?;
    blocked::mul_strassen(field, c.view_mut(), a.view(), b.view())?;
    Ok(c)
}

/// Writes `A · B` into `c`, which must already have the product's shape.
///
/// `c` cannot overlap `a` or `b`; use [`multiply_assign`] to overwrite an
/// operand.
pub fn multiply_into(field: &Field, c: MatMut<'_>, a: MatRef<'_>, b: MatRef<'_>) -> Result<()> {
    check_mul_shapes(a, b)?;
    if c.rows() != a.rows() || c.cols() != b.cols() {
        return Err(LinalgError::DimensionMismatch(format!(
            "output is {}x{}, product is {}x{}",
            c.rows(),
            c.cols(),
            a.rows(),
            b.cols()
        )));
    }
    blocked::mul_strassen(field, c, a, b)
}

/// `A ← A · B`, computed into a temporary and moved into `a`.
pub fn multiply_assign(field: &Field, a: &mut Mat, b: &Mat) -> Result<()> {
    *a = multiply(field, a, b)?;
    Ok(())
}

/// `A · A`.
pub fn square(field: &Field, a: &Mat) -> Result<Mat> {
    multiply(field, a, a)
}

/// `A^e`. A negative exponent inverts first and fails with
/// [`LinalgError::Singular`] when there is no inverse.
pub fn power(field: &Field, a: &Mat, e: i64) -> Result<Mat> {
    let n = gauss::check_square(a.view())?;
    let mut base = if e < 0 {
        inverse_checked(field, a)?
    } else {
        a.clone()
    };
    let mut e = e.unsigned_abs();
    let mut acc = Mat::try_identity(n)?;
    while e > 0 {
        if e & 1 == 1 {
            multiply_assign(field, &mut acc, &base)?;
        }
        e >>= 1;
        if e > 0 {
            base = square(field, &base)?;
        }
    }
    Ok(acc)
}

/// Determinant and, when it is nonzero, the inverse.
pub fn inverse(field: &Field, a: &Mat) -> Result<(u64, Option<Mat>)> {
    gauss::inv(field, a.view(), false)
}

/// [`inverse`] for prime-power moduli: pivots that are zero divisors are
/// passed over rather than ending the elimination.
pub fn relaxed_inverse(field: &Field, a: &Mat) -> Result<(u64, Option<Mat>)> {
    gauss::inv(field, a.view(), true)
}

/// The inverse, or [`LinalgError::Singular`].
pub fn inverse_checked(field: &Field, a: &Mat) -> Result<Mat> {
    let (det, x) = inverse(field, a)?;
    debug!(det, "inverse_checked");
    x.ok_or(LinalgError::Singular)
}

pub fn determinant(field: &Field, a: &Mat) -> Result<u64> {
    Ok(gauss::tri(field, a.view(), None, false, false)?.0)
}

pub fn relaxed_determinant(field: &Field, a: &Mat) -> Result<u64> {
    Ok(gauss::tri(field, a.view(), None, false, true)?.0)
}

/// Solves `A · x = b`. Returns the determinant and, when it is nonzero,
/// the solution.
pub fn solve(field: &Field, a: &Mat, b: &[u64]) -> Result<(u64, Option<Vec<u64>>)> {
    gauss::tri(field, a.view(), Some(b), false, false)
}

/// Solves `x · A = b`.
pub fn solve_transposed(field: &Field, a: &Mat, b: &[u64]) -> Result<(u64, Option<Vec<u64>>)> {
    gauss::tri(field, a.view(), Some(b), true, false)
}

pub fn relaxed_solve(field: &Field, a: &Mat, b: &[u64]) -> Result<(u64, Option<Vec<u64>>)> {
    gauss::tri(field, a.view(), Some(b), false, true)
}

pub fn relaxed_solve_transposed(
    field: &Field,
    a: &Mat,
    b: &[u64],
) -> Result<(u64, Option<Vec<u64>>)> {
    gauss::tri(field, a.view(), Some(b), true, true)
}

/// Row echelon form over the first `w` columns plus optional image and
/// left kernel.
pub fn elim(
    field: &Field,
    a: &Mat,
    w: usize,
    mode: ImageMode,
    want_kernel: bool,
) -> Result<Elimination> {
    gauss::elim(field, a.view(), w, mode, want_kernel)
}

/// Replaces `a` by its row echelon form over the first `w` columns and
/// returns the rank.
pub fn gauss(field: &Field, a: &mut Mat, w: usize) -> Result<usize> {
    let e = gauss::elim(field, a.view(), w, ImageMode::Full, false)?;
    if let Some(image) = e.image {
        *a = image;
    }
    Ok(e.rank)
}

/// The nonzero rows of the row echelon form of `a`.
pub fn image(field: &Field, a: &Mat) -> Result<Mat> {
    let e = gauss::elim(field, a.view(), a.num_cols(), ImageMode::Rows, false)?;
    Ok(e.image.unwrap_or_else(|| Mat::zeros(0, a.num_cols())))
}

/// Basis of `{v : v · A = 0}`, one vector per row.
pub fn kernel(field: &Field, a: &Mat) -> Result<Mat> {
    let e = gauss::elim(field, a.view(), a.num_cols(), ImageMode::Skip, true)?;
    Ok(e.kernel.unwrap_or_else(|| Mat::zeros(0, a.num_rows())))
}

pub fn rank(field: &Field, a: &Mat) -> Result<usize> {
    Ok(gauss::elim(field, a.view(), a.num_cols(), ImageMode::Skip, false)?.rank)
}
