//! Scalar multiply-accumulate kernels and their panel-level drivers.

use super::{Accumulator, BLK, BLK_SQ, Block, Panel};
use std::ops::Range;

/// Portable version of [`Accumulator::muladd_row`].
#[inline]
pub fn muladd_row_scalar<A: Accumulator>(x: &mut [A], a: &[A], bt: &[A], n: usize) {
    debug_assert!(x.len() >= BLK && a.len() >= n && bt.len() >= BLK_SQ && n <= BLK);
    let a = &a[..n];
    for (j, out) in x[..BLK].iter_mut().enumerate() {
        let col = &bt[j * BLK..j * BLK + n];
        let mut sum = *out;
        for (&ai, &bi) in a.iter().zip(col) {
            sum = sum.add_mul(ai, bi);
        }
        *out = sum;
    }
}

/// Portable version of [`Accumulator::muladd_interval`].
#[inline]
pub fn muladd_interval_scalar<A: Accumulator>(x: &mut [A], y: &[A], c: A) {
    for (xi, &yi) in x.iter_mut().zip(y) {
        *xi = xi.add_mul(yi, c);
    }
}

/// `x[i] += a[i][..n] · btᵀ` for every row `i` in `rows`.
///
/// `bt` holds a transposed `BLK × BLK` block: `bt[j*BLK + k]` multiplies
/// column `k` of `a` into column `j` of `x`.
pub fn muladd_panel_rows<A: Accumulator>(
    x: &mut Panel<A>,
    a: &Panel<A>,
    bt: &Block<A>,
    rows: Range<usize>,
    n: usize,
) {
    let bt = bt.as_slice();
    for i in rows {
        A::muladd_row(x.row_mut(i), a.row(i), bt, n);
    }
}

/// `x += y · zᵀ` on three `BLK × BLK` blocks stored row-major.
pub fn muladd_block<A: Accumulator>(x: &mut [A], y: &[A], z: &[A]) {
    debug_assert!(x.len() >= BLK_SQ && y.len() >= BLK_SQ && z.len() >= BLK_SQ);
    for (xr, yr) in x[..BLK_SQ].chunks_exact_mut(BLK).zip(y.chunks_exact(BLK)) {
        A::muladd_row(xr, yr, z, BLK);
    }
}
