//! Gaussian elimination over the field.
//!
//! - `inverse`: Gauss-Jordan inversion with determinant.
//! - `tri`: forward elimination only, for determinants and linear solves.
//! - `elim`: row echelon form restricted to a column prefix, with rank,
//!   image and left kernel.
//!
//! Each has a scalar version plus versions generic over the accumulator.
//! All versions pick the same pivots, so for a given input they return
//! identical results. A singular matrix is not an error here: it shows up
//! as a zero determinant or a rank below the row count.

pub mod elim;
pub mod inverse;
pub mod tri;

pub use elim::{elim, elim_basic, elim_blk};
pub use inverse::{alt_inv, basic_inv, blk_inv, inv};
pub use tri::{alt_tri, basic_tri, blk_tri, tri};

use crate::error::{LinalgError, Result};
use crate::field::{Field, InvStatus};
use crate::matrix::{Mat, MatRef, Permutation};
use crate::threaded::{self, for_each_mut};
use tracing::trace;

/// Which rows of the echelon form [`elim`] should return.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ImageMode {
    /// No image.
    #[default]
    Skip,
    /// The `rank × m` nonzero rows.
    Rows,
    /// All `n × m` rows; rows past the rank keep their columns `w..`.
    Full,
}

/// Output of [`elim`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Elimination {
    /// Pivots found within the first `w` columns.
    pub rank: usize,
    pub image: Option<Mat>,
    /// `(n - rank) × n` basis of `{v : v·A = 0}` restricted to those columns.
    pub kernel: Option<Mat>,
}

/// A usable pivot: its row, value and inverse.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Pivot {
    pub row: usize,
    pub value: u64,
    pub inv: u64,
}

/// First candidate that can serve as a pivot.
///
/// With `relax`, nonzero entries without an inverse are skipped. Without
/// it the first nonzero entry decides: a zero divisor there means no pivot.
pub(crate) fn find_pivot(
    field: &Field,
    relax: bool,
    candidates: impl IntoIterator<Item = (usize, u64)>,
) -> Option<Pivot> {
    for (row, value) in candidates {
        if value == 0 {
            continue;
        }
        match field.inv_status(value) {
            InvStatus::Unit(inv) => return Some(Pivot { row, value, inv }),
            InvStatus::ZeroDivisor { .. } if relax => continue,
            InvStatus::ZeroDivisor { gcd } => {
                trace!(row, value, gcd, "pivot shares a factor with the modulus");
                return None;
            }
        }
    }
    None
}

pub(crate) fn check_square(a: MatRef<'_>) -> Result<usize> {
    if a.rows() != a.cols() {
        return Err(LinalgError::NotSquare {
            rows: a.rows(),
            cols: a.cols(),
        });
    }
    Ok(a.rows())
}

pub(crate) fn check_width(w: usize, cols: usize) -> Result<()> {
    if w > cols {
        return Err(LinalgError::BadWidth { width: w, cols });
    }
    Ok(())
}

/// Undoes the recorded row swaps on the columns of `x`, last swap first.
pub(crate) fn unpermute_columns(x: &mut Mat, perm: &Permutation) {
    if perm.is_identity() {
        return;
    }
    let work = threaded::work(&[x.num_rows(), x.num_cols()]);
    let mut rows = x.view_mut().into_rows();
    for_each_mut(&mut rows, work, |_, row| perm.apply_reverse(&mut row[..]));
}

/// Results for an empty matrix or an empty column prefix.
pub(crate) fn trivial_elim(
    a: MatRef<'_>,
    w: usize,
    mode: ImageMode,
    want_kernel: bool,
) -> Option<Elimination> {
    let (n, m) = (a.rows(), a.cols());
    if n == 0 {
        return Some(Elimination {
            rank: 0,
            image: (mode != ImageMode::Skip).then(|| Mat::zeros(0, m)),
            kernel: want_kernel.then(|| Mat::zeros(0, 0)),
        });
    }
    if w == 0 {
        let image = match mode {
            ImageMode::Skip => None,
            ImageMode::Rows => Some(Mat::zeros(0, m)),
            ImageMode::Full => Some(Mat::from(a)),
        };
        return Some(Elimination {
            rank: 0,
            image,
            kernel: want_kernel.then(|| Mat::identity(n)),
        });
    }
    None
}

/// Builds the image from the eliminated entries `get(i, j)`.
///
/// Pivot rows are zero left of their pivot column; in full mode the rows
/// past the rank are zero on the first `w` columns.
pub(crate) fn assemble_image(
    a_shape: (usize, usize),
    w: usize,
    pcol: &[usize],
    mode: ImageMode,
    get: impl Fn(usize, usize) -> u64,
) -> Option<Mat> {
    let (n, m) = a_shape;
    let r = pcol.len();
    let rows = match mode {
        ImageMode::Skip => return None,
        ImageMode::Rows => r,
        ImageMode::Full => n,
    };
    let mut im = Mat::zeros(rows, m);
    for (i, &pc) in pcol.iter().enumerate() {
        for j in pc..m {
            im[(i, j)] = get(i, j);
        }
    }
    for i in r..rows {
        for j in w..m {
            im[(i, j)] = get(i, j);
        }
    }
    Some(im)
}

/// Kernel basis: row `i` is `[x(i, 0..r) | e_i]`, then unpermuted.
pub(crate) fn assemble_kernel(
    n: usize,
    r: usize,
    perm: &Permutation,
    x: impl Fn(usize, usize) -> u64,
) -> Mat {
    let mut ker = Mat::zeros(n - r, n);
    for i in 0..n - r {
        for j in 0..r {
            ker[(i, j)] = x(i, j);
        }
        ker[(i, r + i)] = 1;
    }
    unpermute_columns(&mut ker, perm);
    ker
}
