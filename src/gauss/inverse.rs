//! Gauss-Jordan inversion.
//!
//! Every version eliminates column `k` from all other rows after scaling
//! the pivot row, storing the inverse in place of the eliminated columns.
//! Row swaps become column swaps of the result, undone at the end.

use super::{Pivot, check_square, find_pivot, unpermute_columns};
use crate::dispatch::{self, GaussPlan};
use crate::error::{Result, checked_area};
use crate::field::Field;
use crate::kernels::{Accumulator, BLK, Backend, Block, Panel, checked_trigger, muladd};
use crate::matrix::{Mat, MatRef, Permutation};
use crate::threaded::{self, for_each_mut};
use tracing::trace;

/// Determinant plus the inverse, `None` when the determinant is zero.
pub type Inverse = (u64, Option<Mat>);

fn empty() -> Inverse {
    (1, Some(Mat::zeros(0, 0)))
}

/// Scalar Gauss-Jordan on reduced rows.
pub fn basic_inv(field: &Field, a: MatRef<'_>, relax: bool) -> Inverse {
    let n = a.rows();
    if n == 0 {
        return empty();
    }

    let mut rows: Vec<Vec<u64>> = a.row_iter().map(<[u64]>::to_vec).collect();
    let mut perm = Permutation::identity(n);
    let mut det = 1;
    let work = threaded::work(&[n, n]);

    for k in 0..n {
        let Some(Pivot { row, value, inv }) =
            find_pivot(field, relax, (k..n).map(|i| (i, rows[i][k])))
        else {
            return (0, None);
        };

        if row != k {
            rows.swap(row, k);
            det = field.neg(det);
            perm.record(k, row);
        }
        det = field.mul(det, value);

        let pre = field.precon(inv);
        for v in rows[k].iter_mut() {
            *v = field.mul_precon(*v, &pre);
        }
        rows[k][k] = inv;

        let y = rows[k].clone();
        for_each_mut(&mut rows, work, |i, x| {
            if i == k {
                return;
            }
            let t = field.neg(x[k]);
            x[k] = 0;
            if t == 0 {
                return;
            }
            let pre = field.precon(t);
            for (xj, &yj) in x.iter_mut().zip(&y) {
                *xj = field.add(*xj, field.mul_precon(yj, &pre));
            }
        });
    }

    let mut x = Mat::from_row_vecs(rows, n);
    unpermute_columns(&mut x, &perm);
    (det, Some(x))
}

/// Gauss-Jordan on whole rows of unreduced `A` values.
///
/// Each step adds one product to every entry, so rows are reduced once per
/// `A::red_trigger` steps.
pub fn alt_inv<A: Accumulator>(field: &Field, a: MatRef<'_>, relax: bool) -> Result<Inverse> {
    let n = a.rows();
    if n == 0 {
        return Ok(empty());
    }
    let trigger = checked_trigger::<A>(field, 1)?;

    let mut rows: Vec<Vec<A>> = a
        .row_iter()
        .map(|r| r.iter().map(|&v| A::lift(v)).collect())
        .collect();
    let mut perm = Permutation::identity(n);
    let mut det = 1;
    let mut red_count = trigger;
    let work = threaded::work(&[n, n]);

    for k in 0..n {
        let cleanup = red_count == 0;
        if cleanup {
            trace!(k, "row reduction sweep");
            red_count = trigger;
        }
        red_count -= 1;

        let Some(Pivot { row, value, inv }) =
            find_pivot(field, relax, (k..n).map(|i| (i, rows[i][k].reduce(field))))
        else {
            return Ok((0, None));
        };

        if row != k {
            rows.swap(row, k);
            det = field.neg(det);
            perm.record(k, row);
        }
        det = field.mul(det, value);

        let pre = field.precon(inv);
        for v in rows[k].iter_mut() {
            *v = A::lift(field.mul_precon(v.reduce(field), &pre));
        }
        rows[k][k] = A::lift(inv);

        let y = rows[k].clone();
        for_each_mut(&mut rows, work, |i, x| {
            if i == k {
                return;
            }
            if cleanup {
                for v in x.iter_mut() {
                    *v = v.reduced(field);
                }
            }
            let t = field.neg(x[k].reduce(field));
            x[k] = A::default();
            if t == 0 {
                return;
            }
            A::muladd_interval(x, &y, A::lift(t));
        });
    }

    for row in rows.iter_mut() {
        perm.apply_reverse(row);
    }
    let out: Vec<Vec<u64>> = rows
        .into_iter()
        .map(|r| r.into_iter().map(|v| v.reduce(field)).collect())
        .collect();
    Ok((det, Some(Mat::from_row_vecs(out, n))))
}

/// Blocked Gauss-Jordan over 32-wide column panels.
///
/// Pivots of one panel are found and eliminated inside that panel; the
/// accumulated transform is then applied to every other panel at once
/// through the panel kernel. Subtracting one from the panel's diagonal
/// before the update makes `jpanel += kpanel · rows` replace the pivot rows
/// instead of adding to them.
pub fn blk_inv<A: Accumulator>(field: &Field, a: MatRef<'_>, relax: bool) -> Result<Inverse> {
    let n = a.rows();
    if n == 0 {
        return Ok(empty());
    }
    checked_area(n, BLK)?;
    let trigger = checked_trigger::<A>(field, BLK)?;

    let npanels = n.div_ceil(BLK);
    let mut panels = Panel::<A>::split_columns(a);
    let mut perm = Permutation::identity(n);
    let mut det = 1;
    let mut red_count = trigger;
    let work = threaded::work(&[n, n, BLK]);

    for kp in 0..npanels {
        let kk = kp * BLK;
        let k_max = (kk + BLK).min(n);

        let cleanup = red_count < BLK;
        if cleanup {
            trace!(kk, "panel reduction sweep");
            red_count = trigger;
        }
        red_count -= BLK;

        // out of the vector so the other panels can be borrowed mutably
        let mut kpanel = std::mem::take(&mut panels[kp]);
        if cleanup {
            kpanel.reduce_all(field);
        }

        for k in kk..k_max {
            let c = k - kk;
            let found = find_pivot(
                field,
                relax,
                (k..n).map(|i| (i, kpanel.get(i, c).reduce(field))),
            );
            let Some(Pivot { row, value, inv }) = found else {
                return Ok((0, None));
            };

            if row != k {
                kpanel.swap_rows(row, k);
                det = field.neg(det);
                perm.record(k, row);
            }
            det = field.mul(det, value);

            let pre = field.precon(inv);
            for v in kpanel.row_mut(k) {
                *v = A::lift(field.mul_precon(v.reduce(field), &pre));
            }
            kpanel.set(k, c, A::lift(inv));

            let mut y = [A::default(); BLK];
            y.copy_from_slice(kpanel.row(k));
            for i in (0..n).filter(|&i| i != k) {
                let x = kpanel.row_mut(i);
                let t = field.neg(x[c].reduce(field));
                x[c] = A::default();
                if t != 0 {
                    A::muladd_interval(x, &y, A::lift(t));
                }
            }
        }

        kpanel.reduce_all(field);
        for k in kk..k_max {
            let d = kpanel.get(k, k - kk).reduce(field);
            kpanel.set(k, k - kk, A::lift(field.sub(d, 1)));
        }

        let kref = &kpanel;
        let perm_ref = &perm;
        for_each_mut(&mut panels, work, |jp, jpanel| {
            if jp == kp {
                return;
            }
            if cleanup {
                jpanel.reduce_all(field);
            }
            jpanel.apply_swaps(perm_ref, kk..k_max);

            let mut bt = Block::<A>::zeros();
            jpanel.transpose_rows_into(field, kk..k_max, &mut bt);
            muladd::muladd_panel_rows(jpanel, kref, &bt, 0..n, k_max - kk);
        });

        for k in kk..k_max {
            let d = kpanel.get(k, k - kk).reduce(field);
            kpanel.set(k, k - kk, A::lift(field.add(d, 1)));
        }
        panels[kp] = kpanel;
    }

    let mut x = Mat::zeros(n, n);
    for (jp, panel) in panels.iter().enumerate() {
        panel.write_columns(field, x.view_mut(), jp * BLK);
    }
    unpermute_columns(&mut x, &perm);
    Ok((det, Some(x)))
}

/// Determinant and inverse of a square matrix, choosing the variant by
/// size and modulus.
///
/// With `relax`, pivots that are zero divisors of a composite modulus are
/// passed over instead of ending the elimination.
pub fn inv(field: &Field, a: MatRef<'_>, relax: bool) -> Result<Inverse> {
    let n = check_square(a)?;
    match dispatch::inv_plan(field, n) {
        GaussPlan::Basic => Ok(basic_inv(field, a, relax)),
        GaussPlan::Alt(Backend::Float) => alt_inv::<f64>(field, a, relax),
        GaussPlan::Alt(Backend::Integer) => alt_inv::<u64>(field, a, relax),
        GaussPlan::Alt(Backend::WideInteger) => alt_inv::<u128>(field, a, relax),
        GaussPlan::Blocked(Backend::Float) => blk_inv::<f64>(field, a, relax),
        GaussPlan::Blocked(Backend::Integer) => blk_inv::<u64>(field, a, relax),
        GaussPlan::Blocked(Backend::WideInteger) => blk_inv::<u128>(field, a, relax),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::naive::basic_mul;

    fn pseudo_random(n: usize, p: u64, seed: u64) -> Mat {
        let mut s = seed;
        Mat::from_fn(n, n, |_, _| {
            s = s.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            (s >> 17) % p
        })
    }

    fn product(f: &Field, a: &Mat, b: &Mat) -> Mat {
        let mut x = Mat::zeros(a.num_rows(), b.num_cols());
        basic_mul(f, x.view_mut(), a.view(), b.view());
        x
    }

    #[test]
    fn test_two_by_two_mod_seven() {
        let f = Field::new(7).unwrap();
        let a = Mat::from_rows(&[[1, 2], [3, 4]]).unwrap();
        let (det, x) = basic_inv(&f, a.view(), false);
        assert_eq!(det, 5);
        let x = x.unwrap();
        assert!(product(&f, &a, &x).is_identity());
    }

    #[test]
    fn test_variants_agree() {
        let f = Field::new(65_521).unwrap();
        for n in [1, 17, 45, 70] {
            let a = pseudo_random(n, f.modulus(), n as u64);
            let want = basic_inv(&f, a.view(), false);
            assert!(want.1.is_some(), "n={}", n);

            assert_eq!(alt_inv::<u64>(&f, a.view(), false).unwrap(), want, "alt u64 n={}", n);
            assert_eq!(alt_inv::<f64>(&f, a.view(), false).unwrap(), want, "alt f64 n={}", n);
            assert_eq!(blk_inv::<u64>(&f, a.view(), false).unwrap(), want, "blk u64 n={}", n);
            assert_eq!(blk_inv::<u128>(&f, a.view(), false).unwrap(), want, "blk u128 n={}", n);
            assert_eq!(blk_inv::<f64>(&f, a.view(), false).unwrap(), want, "blk f64 n={}", n);

            let x = want.1.unwrap();
            assert!(product(&f, &a, &x).is_identity());
            assert!(product(&f, &x, &a).is_identity());
        }
    }

    #[test]
    fn test_singular_reports_zero() {
        let f = Field::new(97).unwrap();
        let mut a = pseudo_random(40, 97, 3);
        // row 7 = 2 * row 3
        let r3: Vec<u64> = a.row(3).iter().map(|&v| f.mul(v, 2)).collect();
        a.row_mut(7).copy_from_slice(&r3);

        assert_eq!(basic_inv(&f, a.view(), false), (0, None));
        assert_eq!(alt_inv::<u64>(&f, a.view(), false).unwrap(), (0, None));
        assert_eq!(blk_inv::<u64>(&f, a.view(), false).unwrap(), (0, None));
    }

    #[test]
    fn test_large_modulus_wide_blocked() {
        let f = Field::new((1 << 60) - 93).unwrap();
        let a = pseudo_random(36, f.modulus(), 11);
        let want = basic_inv(&f, a.view(), false);
        assert_eq!(blk_inv::<u128>(&f, a.view(), false).unwrap(), want);
        assert!(alt_inv::<u64>(&f, a.view(), false).is_err());
    }

    #[test]
    fn test_relaxed_prime_power() {
        // det = 3*3 - 1 = 8, a unit mod 9; the leading 3 is a zero divisor
        let f = Field::new(9).unwrap();
        let a = Mat::from_rows(&[[3, 1], [1, 3]]).unwrap();
        assert_eq!(basic_inv(&f, a.view(), false).0, 0);

        let (det, x) = basic_inv(&f, a.view(), true);
        assert_eq!(det, 8);
        assert!(product(&f, &a, &x.unwrap()).is_identity());
    }

    #[test]
    fn test_nonsquare_rejected() {
        let f = Field::new(5).unwrap();
        let a = Mat::zeros(2, 3);
        assert!(inv(&f, a.view(), false).is_err());
        assert_eq!(inv(&f, Mat::zeros(0, 0).view(), false).unwrap(), empty());
    }
}
