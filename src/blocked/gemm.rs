//! Base-case multiplication: inner-product ("alt") and panel-blocked.
//!
//! The blocked version packs A into `n × 32` column panels once, then
//! computes each 32-wide column panel of the product independently:
//! for every contraction panel it loads the matching `32 × 32` tile of B
//! transposed and runs the panel kernel over all rows. Products pile up
//! unreduced until the accumulator's trigger says another panel might
//! overflow, at which point the whole output panel is reduced.

use crate::dispatch::{self, MulPlan};
use crate::error::{Result, checked_area};
use crate::field::Field;
use crate::kernels::{Accumulator, BLK, Backend, Block, Panel, checked_trigger, muladd};
use crate::matrix::naive::basic_mul;
use crate::matrix::transpose::transpose_into;
use crate::matrix::{Mat, MatMut, MatRef, ops};
use crate::threaded::{self, for_each_mut, map_range};

/// `X = A * B` as inner products of rows of A with rows of `Bᵀ`.
///
/// Each entry accumulates in `A` and reduces whenever the next product
/// could overflow, so any contraction length works.
pub fn alt_mul<A: Accumulator>(field: &Field, x: MatMut<'_>, a: MatRef<'_>, b: MatRef<'_>) {
    let (n, l, m) = (a.rows(), a.cols(), b.cols());
    debug_assert!(b.rows() == l && x.rows() == n && x.cols() == m);

    let mut bt = Mat::zeros(m, l);
    transpose_into(b, bt.view_mut());

    let mut rows = x.into_rows();
    for_each_mut(&mut rows, threaded::work(&[n, l, m]), |i, xr| {
        let ar = a.row(i);
        for (j, xv) in xr.iter_mut().enumerate() {
            *xv = ops::dot::<A>(field, ar, bt.row(j));
        }
    });
}

/// `X = A * B` through the panel kernels.
///
/// Fails with `AccumulatorTooNarrow` when `A` cannot take a full panel of
/// products between reductions for this modulus.
pub fn blk_mul<A: Accumulator>(
    field: &Field,
    x: MatMut<'_>,
    a: MatRef<'_>,
    b: MatRef<'_>,
) -> Result<()> {
    let (n, l, m) = (a.rows(), a.cols(), b.cols());
    debug_assert!(b.rows() == l && x.rows() == n && x.cols() == m);

    checked_area(n, BLK)?;
    checked_area(l, BLK)?;
    checked_area(m, BLK)?;
    let trigger = checked_trigger::<A>(field, BLK)?;

    let a_panels = Panel::<A>::split_columns(a);
    let work = threaded::work(&[n, l, m]);

    let out: Vec<Panel<A>> = map_range(m.div_ceil(BLK), work, |jp| {
        let mut buf = Panel::<A>::zeros(n);
        let mut bt = Block::<A>::zeros();
        let mut red_count = trigger;

        for (kp, ap) in a_panels.iter().enumerate() {
            let kk = kp * BLK;
            let k_len = (l - kk).min(BLK);
            bt.load_transposed(b, kk, jp * BLK);

            if red_count < BLK {
                red_count = trigger;
                buf.reduce_all(field);
            }
            red_count -= BLK;

            muladd::muladd_panel_rows(&mut buf, ap, &bt, 0..n, k_len);
        }
        buf
    });

    let mut rows = x.into_rows();
    for_each_mut(&mut rows, threaded::work(&[n, m]), |i, xr| {
        for (jp, panel) in out.iter().enumerate() {
            let j0 = jp * BLK;
            let width = (m - j0).min(BLK);
            for (dst, &v) in xr[j0..j0 + width].iter_mut().zip(&panel.row(i)[..width]) {
                *dst = v.reduce(field);
            }
        }
    });
    Ok(())
}

/// Non-recursive `X = A * B`, choosing the variant by shape and modulus.
pub fn mul_base(field: &Field, mut x: MatMut<'_>, a: MatRef<'_>, b: MatRef<'_>) -> Result<()> {
    match dispatch::mul_plan(field, a.rows(), a.cols(), b.cols()) {
        MulPlan::Zero => x.fill(0),
        MulPlan::Basic => basic_mul(field, x, a, b),
        MulPlan::Alt(Backend::WideInteger) => alt_mul::<u128>(field, x, a, b),
        MulPlan::Alt(_) => alt_mul::<u64>(field, x, a, b),
        MulPlan::Blocked(Backend::Integer) => blk_mul::<u64>(field, x, a, b)?,
        MulPlan::Blocked(Backend::WideInteger) => blk_mul::<u128>(field, x, a, b)?,
        MulPlan::Blocked(Backend::Float) => blk_mul::<f64>(field, x, a, b)?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LinalgError;

    fn pseudo_random(rows: usize, cols: usize, p: u64, seed: u64) -> Mat {
        let mut s = seed;
        Mat::from_fn(rows, cols, |_, _| {
            s = s.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            (s >> 11) % p
        })
    }

    fn reference(field: &Field, a: &Mat, b: &Mat) -> Mat {
        let mut x = Mat::zeros(a.num_rows(), b.num_cols());
        basic_mul(field, x.view_mut(), a.view(), b.view());
        x
    }

    #[test]
    fn test_blocked_backends_agree_on_ragged_shapes() {
        let f = Field::new(40_009).unwrap();
        for (n, l, m) in [(1, 1, 1), (33, 70, 5), (70, 45, 100), (64, 64, 64)] {
            let a = pseudo_random(n, l, f.modulus(), 1);
            let b = pseudo_random(l, m, f.modulus(), 2);
            let want = reference(&f, &a, &b);

            let mut x = Mat::zeros(n, m);
            blk_mul::<u64>(&f, x.view_mut(), a.view(), b.view()).unwrap();
            assert_eq!(x, want, "u64 {}x{}x{}", n, l, m);

            blk_mul::<u128>(&f, x.view_mut(), a.view(), b.view()).unwrap();
            assert_eq!(x, want, "u128 {}x{}x{}", n, l, m);

            blk_mul::<f64>(&f, x.view_mut(), a.view(), b.view()).unwrap();
            assert_eq!(x, want, "f64 {}x{}x{}", n, l, m);

            alt_mul::<u64>(&f, x.view_mut(), a.view(), b.view());
            assert_eq!(x, want, "alt {}x{}x{}", n, l, m);
        }
    }

    #[test]
    fn test_blocked_reduces_between_panels() {
        // u64 absorbs only 40 products here: one reduction per panel
        let f = Field::new(679_000_019).unwrap();
        assert_eq!(<u64 as Accumulator>::red_trigger(&f), 40);
        let a = pseudo_random(40, 300, f.modulus(), 3);
        let b = pseudo_random(300, 40, f.modulus(), 4);
        let want = reference(&f, &a, &b);
        let mut x = Mat::zeros(40, 40);
        blk_mul::<u64>(&f, x.view_mut(), a.view(), b.view()).unwrap();
        assert_eq!(x, want);
        alt_mul::<u64>(&f, x.view_mut(), a.view(), b.view());
        assert_eq!(x, want);
    }

    #[test]
    fn test_narrow_accumulator_rejected() {
        let f = Field::new((1 << 60) - 93).unwrap();
        let a = Mat::zeros(4, 4);
        let mut x = Mat::zeros(4, 4);
        let err = blk_mul::<u64>(&f, x.view_mut(), a.view(), a.view()).unwrap_err();
        assert_eq!(err, LinalgError::AccumulatorTooNarrow(Backend::Integer, BLK));
    }

    #[test]
    fn test_alt_wide_for_large_modulus() {
        let f = Field::new((1 << 60) - 93).unwrap();
        let a = pseudo_random(9, 600, f.modulus(), 5);
        let b = pseudo_random(600, 7, f.modulus(), 6);
        let mut x = Mat::zeros(9, 7);
        alt_mul::<u128>(&f, x.view_mut(), a.view(), b.view());
        assert_eq!(x, reference(&f, &a, &b));
    }
}
