//! Triangularization: determinants and linear solves.
//!
//! Forward elimination only touches rows below the pivot, which makes it
//! roughly three times cheaper than inversion. An optional right-hand side
//! follows the row operations and is solved by back substitution.
//!
//! With `trans` the routines work on `Aᵀ`, which turns `A·x = b` into
//! `x·A = b`.

use super::{Pivot, check_square, find_pivot};
use crate::dispatch::{self, GaussPlan};
use crate::error::{LinalgError, Result, checked_area};
use crate::field::Field;
use crate::kernels::{Accumulator, BLK, Backend, Block, Panel, checked_trigger, muladd};
use crate::matrix::transpose::transpose_into;
use crate::matrix::{Mat, MatRef, Permutation};
use crate::threaded::{self, for_each_mut};
use tracing::trace;

/// Determinant plus the solution, `None` when singular or no right-hand
/// side was given.
pub type Triangular = (u64, Option<Vec<u64>>);

fn oriented(a: MatRef<'_>, trans: bool) -> Mat {
    if trans {
        let mut t = Mat::zeros(a.cols(), a.rows());
        transpose_into(a, t.view_mut());
        t
    } else {
        Mat::from(a)
    }
}

fn empty(b: Option<&[u64]>) -> Triangular {
    (1, b.map(|_| Vec::new()))
}

/// `b[i] -= Σ_{j>i} x[j]·u(i, j)` from the bottom row up.
fn back_substitute(field: &Field, mut bv: Vec<u64>, u: impl Fn(usize, usize) -> u64) -> Vec<u64> {
    let n = bv.len();
    for i in (0..n).rev() {
        let mut acc = 0;
        for j in i + 1..n {
            acc = field.add(acc, field.mul(bv[j], u(i, j)));
        }
        bv[i] = field.sub(bv[i], acc);
    }
    bv
}

/// Scalar forward elimination.
pub fn basic_tri(
    field: &Field,
    a: MatRef<'_>,
    b: Option<&[u64]>,
    trans: bool,
    relax: bool,
) -> Triangular {
    let n = a.rows();
    if n == 0 {
        return empty(b);
    }

    let mut rows = oriented(a, trans).to_row_vecs();
    let mut bv = b.map(<[u64]>::to_vec);
    let mut det = 1;

    for k in 0..n {
        let Some(Pivot { row, value, inv }) =
            find_pivot(field, relax, (k..n).map(|i| (i, rows[i][k])))
        else {
            return (0, None);
        };

        if row != k {
            rows.swap(row, k);
            det = field.neg(det);
            if let Some(bv) = bv.as_mut() {
                bv.swap(row, k);
            }
        }
        det = field.mul(det, value);

        let pre = field.precon(inv);
        for v in &mut rows[k][k + 1..] {
            *v = field.mul_precon(*v, &pre);
        }

        if let Some(bv) = bv.as_mut() {
            bv[k] = field.mul_precon(bv[k], &pre);
            for i in k + 1..n {
                let t = field.neg(rows[i][k]);
                bv[i] = field.add(bv[i], field.mul(bv[k], t));
            }
        }

        let y = rows[k].clone();
        let below = &mut rows[k + 1..];
        let work = threaded::work(&[below.len(), n]);
        for_each_mut(below, work, |_, x| {
            let t = field.neg(x[k]);
            if t == 0 {
                return;
            }
            let pre = field.precon(t);
            for (xj, &yj) in x[k + 1..].iter_mut().zip(&y[k + 1..]) {
                *xj = field.add(*xj, field.mul_precon(yj, &pre));
            }
        });
    }

    let x = bv.map(|bv| back_substitute(field, bv, |i, j| rows[i][j]));
    (det, x)
}

/// Forward elimination on rows of unreduced `A` values.
pub fn alt_tri<A: Accumulator>(
    field: &Field,
    a: MatRef<'_>,
    b: Option<&[u64]>,
    trans: bool,
    relax: bool,
) -> Result<Triangular> {
    let n = a.rows();
    if n == 0 {
        return Ok(empty(b));
    }
    let trigger = checked_trigger::<A>(field, 1)?;

    let mut rows: Vec<Vec<A>> = oriented(a, trans)
        .view()
        .row_iter()
        .map(|r| r.iter().map(|&v| A::lift(v)).collect())
        .collect();
    let mut bv = b.map(<[u64]>::to_vec);
    let mut det = 1;
    let mut red_count = trigger;

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
            if let Some(bv) = bv.as_mut() {
                bv.swap(row, k);
            }
        }
        det = field.mul(det, value);

        let pre = field.precon(inv);
        for v in &mut rows[k][k + 1..] {
            *v = A::lift(field.mul_precon(v.reduce(field), &pre));
        }

        if let Some(bv) = bv.as_mut() {
            bv[k] = field.mul_precon(bv[k], &pre);
            for i in k + 1..n {
                let t = field.neg(rows[i][k].reduce(field));
                bv[i] = field.add(bv[i], field.mul(bv[k], t));
            }
        }

        let y = rows[k].clone();
        let below = &mut rows[k + 1..];
        let work = threaded::work(&[below.len(), n]);
        for_each_mut(below, work, |_, x| {
            if cleanup {
                for v in &mut x[k + 1..] {
                    *v = v.reduced(field);
                }
            }
            let t = field.neg(x[k].reduce(field));
            if t != 0 {
                A::muladd_interval(&mut x[k + 1..], &y[k + 1..], A::lift(t));
            }
        });
    }

    let x = bv.map(|bv| back_substitute(field, bv, |i, j| rows[i][j].reduce(field)));
    Ok((det, x))
}

/// Blocked forward elimination over 32-wide column panels.
///
/// Within a panel the pivot columns are cleared above the pivot as well,
/// so the diagonal tile ends up as the identity and the back substitution
/// only needs the panels to the right.
pub fn blk_tri<A: Accumulator>(
    field: &Field,
    a: MatRef<'_>,
    b: Option<&[u64]>,
    trans: bool,
    relax: bool,
) -> Result<Triangular> {
    let n = a.rows();
    if n == 0 {
        return Ok(empty(b));
    }
    checked_area(n, BLK)?;
    let trigger = checked_trigger::<A>(field, BLK)?;

    let npanels = n.div_ceil(BLK);
    let mut panels = Panel::<A>::split_columns(oriented(a, trans).view());
    let mut bv = b.map(<[u64]>::to_vec);
    let mut perm = Permutation::identity(n);
    let mut det = 1;
    let mut red_count = trigger;

    for kp in 0..npanels {
        let kk = kp * BLK;
        let k_max = (kk + BLK).min(n);

        let cleanup = red_count < BLK;
        if cleanup {
            trace!(kk, "panel reduction sweep");
            red_count = trigger;
        }
        red_count -= BLK;

        let (done, rest) = panels.split_at_mut(kp + 1);
        let kpanel = &mut done[kp];
        if cleanup {
            kpanel.reduce_rows(field, kk..n);
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
                if let Some(bv) = bv.as_mut() {
                    bv.swap(row, k);
                }
            }
            det = field.mul(det, value);

            let pre = field.precon(inv);
            for v in kpanel.row_mut(k) {
                *v = A::lift(field.mul_precon(v.reduce(field), &pre));
            }
            kpanel.set(k, c, A::lift(inv));
            if let Some(bv) = bv.as_mut() {
                bv[k] = field.mul_precon(bv[k], &pre);
            }

            let mut y = [A::default(); BLK];
            y.copy_from_slice(kpanel.row(k));
            for i in (kk..n).filter(|&i| i != k) {
                let x = kpanel.row_mut(i);
                let t = field.neg(x[c].reduce(field));
                x[c] = A::default();
                if t == 0 {
                    continue;
                }
                A::muladd_interval(x, &y, A::lift(t));
                if let Some(bv) = bv.as_mut() {
                    bv[i] = field.add(bv[i], field.mul(bv[k], t));
                }
            }
        }

        kpanel.reduce_rows(field, kk..n);
        for k in kk..k_max {
            let d = kpanel.get(k, k - kk).reduce(field);
            kpanel.set(k, k - kk, A::lift(field.sub(d, 1)));
        }

        let kref = &*kpanel;
        let perm_ref = &perm;
        let work = threaded::work(&[rest.len(), n, BLK, BLK]);
        for_each_mut(rest, work, |_, jpanel| {
            if cleanup {
                jpanel.reduce_rows(field, kk..n);
            }
            jpanel.apply_swaps(perm_ref, kk..k_max);

            let mut bt = Block::<A>::zeros();
            jpanel.transpose_rows_into(field, kk..k_max, &mut bt);
            muladd::muladd_panel_rows(jpanel, kref, &bt, kk..n, k_max - kk);
        });

        for k in kk..k_max {
            let d = kpanel.get(k, k - kk).reduce(field);
            kpanel.set(k, k - kk, A::lift(field.add(d, 1)));
        }
    }

    let x = bv.map(|bv| {
        back_substitute(field, bv, |i, j| {
            // the diagonal tile is the identity
            if j / BLK == i / BLK {
                0
            } else {
                panels[j / BLK].get(i, j % BLK).reduce(field)
            }
        })
    });
    Ok((det, x))
}

/// Determinant and optional solution, choosing the variant by size and
/// modulus.
pub fn tri(
    field: &Field,
    a: MatRef<'_>,
    b: Option<&[u64]>,
    trans: bool,
    relax: bool,
) -> Result<Triangular> {
    let n = check_square(a)?;
    if let Some(b) = b {
        if b.len() != n {
            return Err(LinalgError::DimensionMismatch(format!(
                "right-hand side has length {}, matrix is {}x{}",
                b.len(),
                n,
                n
            )));
        }
    }
    match dispatch::inv_plan(field, n) {
        GaussPlan::Basic => Ok(basic_tri(field, a, b, trans, relax)),
        GaussPlan::Alt(Backend::Float) => alt_tri::<f64>(field, a, b, trans, relax),
        GaussPlan::Alt(Backend::Integer) => alt_tri::<u64>(field, a, b, trans, relax),
        GaussPlan::Alt(Backend::WideInteger) => alt_tri::<u128>(field, a, b, trans, relax),
        GaussPlan::Blocked(Backend::Float) => blk_tri::<f64>(field, a, b, trans, relax),
        GaussPlan::Blocked(Backend::Integer) => blk_tri::<u64>(field, a, b, trans, relax),
        GaussPlan::Blocked(Backend::WideInteger) => blk_tri::<u128>(field, a, b, trans, relax),
    }
}
