//! Strassen-Winograd recursion on top of [`mul_base`].
//!
//! Uses the memory-lean operation schedule of Dumas, Pernet and Zhou
//! ("Memory efficient scheduling of Strassen-Winograd's matrix
//! multiplication algorithm"): seven half-size products, two operand
//! temporaries, and the output quadrants as accumulators. Odd trailing
//! rows and columns are patched afterwards with up to three rectangular
//! products.

use super::gemm::mul_base;
use crate::dispatch;
use crate::error::Result;
use crate::field::Field;
use crate::matrix::ops::{add_assign, add_into, rsub_assign, sub_assign, sub_into};
use crate::matrix::{Mat, MatMut, MatRef};
use crate::threaded;
use tracing::debug;

/// `C = A * B` with the crossover chosen for this field and pool.
pub fn mul_strassen(field: &Field, c: MatMut<'_>, a: MatRef<'_>, b: MatRef<'_>) -> Result<()> {
    let xover = dispatch::strassen_crossover(
        dispatch::base_uses_float(field),
        threaded::available_threads(),
    );
    debug!(xover, "strassen crossover");
    strassen(field, c, a, b, xover)
}

/// `C = A * B`, recursing while every dimension exceeds `xover`.
pub fn strassen(
    field: &Field,
    mut c: MatMut<'_>,
    a: MatRef<'_>,
    b: MatRef<'_>,
    xover: usize,
) -> Result<()> {
    let (am, ak, bn) = (a.rows(), a.cols(), b.cols());

    if am <= xover || ak <= xover || bn <= xover {
        return mul_base(field, c, a, b);
    }

    let anr = am / 2;
    let anc = ak / 2;
    let bnr = anc;
    let bnc = bn / 2;

    let a11 = a.window(0, 0, anr, anc)?;
    let a12 = a.window(0, anc, anr, anc)?;
    let a21 = a.window(anr, 0, anr, anc)?;
    let a22 = a.window(anr, anc, anr, anc)?;

    let b11 = b.window(0, 0, bnr, bnc)?;
    let b12 = b.window(0, bnc, bnr, bnc)?;
    let b21 = b.window(bnr, 0, bnr, bnc)?;
    let b22 = b.window(bnr, bnc, bnr, bnc)?;

    let mut c11 = Mat::zeros(anr, bnc);
    let mut c12 = Mat::zeros(anr, bnc);
    let mut c21 = Mat::zeros(anr, bnc);
    let mut c22 = Mat::zeros(anr, bnc);

    let mut x1a = Mat::zeros(anr, anc);
    let mut x1b = Mat::zeros(anr, bnc);
    let mut x2 = Mat::zeros(anc, bnc);

    sub_into(field, x1a.view_mut(), a11, a21);
    sub_into(field, x2.view_mut(), b22, b12);
    strassen(field, c21.view_mut(), x1a.view(), x2.view(), xover)?;

    add_into(field, x1a.view_mut(), a21, a22);
    sub_into(field, x2.view_mut(), b12, b11);
    strassen(field, c22.view_mut(), x1a.view(), x2.view(), xover)?;

    sub_assign(field, x1a.view_mut(), a11);
    rsub_assign(field, x2.view_mut(), b22);
    strassen(field, c12.view_mut(), x1a.view(), x2.view(), xover)?;

    rsub_assign(field, x1a.view_mut(), a12);
    strassen(field, c11.view_mut(), x1a.view(), b22, xover)?;

    strassen(field, x1b.view_mut(), a11, b11, xover)?;

    add_assign(field, c12.view_mut(), x1b.view());
    add_assign(field, c21.view_mut(), c12.view());
    add_assign(field, c12.view_mut(), c22.view());
    add_assign(field, c22.view_mut(), c21.view());
    add_assign(field, c12.view_mut(), c11.view());
    sub_assign(field, x2.view_mut(), b21);
    strassen(field, c11.view_mut(), a22, x2.view(), xover)?;
    drop(x2);

    sub_assign(field, c21.view_mut(), c11.view());
    strassen(field, c11.view_mut(), a12, b21, xover)?;
    add_assign(field, c11.view_mut(), x1b.view());
    drop((x1a, x1b));

    c.window_mut(0, 0, anr, bnc)?.copy_from(c11.view());
    c.window_mut(0, bnc, anr, bnc)?.copy_from(c12.view());
    c.window_mut(anr, 0, anr, bnc)?.copy_from(c21.view());
    c.window_mut(anr, bnc, anr, bnc)?.copy_from(c22.view());

    if bn > 2 * bnc {
        // A by last column of B
        let bc = b.window(0, 2 * bnc, ak, bn - 2 * bnc)?;
        let cc = c.window_mut(0, 2 * bnc, am, bn - 2 * bnc)?;
        strassen(field, cc, a, bc, xover)?;
    }

    if am > 2 * anr {
        // last row of A by B
        let ar = a.window(2 * anr, 0, am - 2 * anr, ak)?;
        let cr = c.window_mut(2 * anr, 0, am - 2 * anr, bn)?;
        strassen(field, cr, ar, b, xover)?;
    }

    if ak > 2 * anc {
        // last column of A by last row of B, added in
        let ac = a.window(0, 2 * anc, 2 * anr, ak - 2 * anc)?;
        let br = b.window(2 * bnr, 0, ak - 2 * bnr, 2 * bnc)?;
        let mut tmp = Mat::zeros(2 * anr, 2 * bnc);
        strassen(field, tmp.view_mut(), ac, br, xover)?;
        add_assign(field, c.window_mut(0, 0, 2 * anr, 2 * bnc)?, tmp.view());
    }

    Ok(())
}
