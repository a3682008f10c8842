//! Entrywise arithmetic, scalar and vector products.

use super::{Mat, MatMut, MatRef};
use crate::error::{LinalgError, Result};
use crate::field::Field;
use crate::kernels::Accumulator;
use crate::threaded::{self, map_range};

fn same_shape(a: &Mat, b: &Mat, what: &str) -> Result<()> {
    if a.num_rows() != b.num_rows() || a.num_cols() != b.num_cols() {
        return Err(LinalgError::DimensionMismatch(format!(
            "{}: {}x{} vs {}x{}",
            what,
            a.num_rows(),
            a.num_cols(),
            b.num_rows(),
            b.num_cols()
        )));
    }
    Ok(())
}

fn zip_into(mut out: MatMut<'_>, a: MatRef<'_>, b: MatRef<'_>, f: impl Fn(u64, u64) -> u64) {
    for i in 0..out.rows() {
        let (ra, rb) = (a.row(i), b.row(i));
        for ((o, &x), &y) in out.row_mut(i).iter_mut().zip(ra).zip(rb) {
            *o = f(x, y);
        }
    }
}

fn update(mut out: MatMut<'_>, a: MatRef<'_>, f: impl Fn(u64, u64) -> u64) {
    for i in 0..out.rows() {
        let ra = a.row(i);
        for (o, &x) in out.row_mut(i).iter_mut().zip(ra) {
            *o = f(*o, x);
        }
    }
}

/// `out = a + b` on equally shaped windows.
pub fn add_into(field: &Field, out: MatMut<'_>, a: MatRef<'_>, b: MatRef<'_>) {
    zip_into(out, a, b, |x, y| field.add(x, y));
}

/// `out = a - b` on equally shaped windows.
pub fn sub_into(field: &Field, out: MatMut<'_>, a: MatRef<'_>, b: MatRef<'_>) {
    zip_into(out, a, b, |x, y| field.sub(x, y));
}

/// `out += a`
pub fn add_assign(field: &Field, out: MatMut<'_>, a: MatRef<'_>) {
    update(out, a, |o, x| field.add(o, x));
}

/// `out -= a`
pub fn sub_assign(field: &Field, out: MatMut<'_>, a: MatRef<'_>) {
    update(out, a, |o, x| field.sub(o, x));
}

/// `out = a - out`
pub fn rsub_assign(field: &Field, out: MatMut<'_>, a: MatRef<'_>) {
    update(out, a, |o, x| field.sub(x, o));
}

pub fn add(field: &Field, a: &Mat, b: &Mat) -> Result<Mat> {
    same_shape(a, b, "matrix add")?;
    let mut out = Mat::zeros(a.num_rows(), a.num_cols());
    add_into(field, out.view_mut(), a.view(), b.view());
    Ok(out)
}

pub fn sub(field: &Field, a: &Mat, b: &Mat) -> Result<Mat> {
    same_shape(a, b, "matrix sub")?;
    let mut out = Mat::zeros(a.num_rows(), a.num_cols());
    sub_into(field, out.view_mut(), a.view(), b.view());
    Ok(out)
}

pub fn negate(field: &Field, a: &Mat) -> Mat {
    let mut out = a.clone();
    for v in out.as_mut_slice() {
        *v = field.neg(*v);
    }
    out
}

/// `c · A`
pub fn scale(field: &Field, a: &Mat, c: u64) -> Mat {
    let pre = field.precon(c);
    let mut out = a.clone();
    let work = threaded::work(&[a.num_rows(), a.num_cols()]);
    let mut rows = out.view_mut().into_rows();
    threaded::for_each_mut(&mut rows, work, |_, row| {
        for v in row.iter_mut() {
            *v = field.mul_precon(*v, &pre);
        }
    });
    out
}

/// `Σ a[i] * b[i] mod p`, reducing only when the accumulator could overflow.
pub fn dot<A: Accumulator>(field: &Field, a: &[u64], b: &[u64]) -> u64 {
    dot_iter::<A>(field, a.iter().copied().zip(b.iter().copied()))
}

/// [`dot`] over an iterator of operand pairs.
pub fn dot_iter<A: Accumulator>(field: &Field, pairs: impl Iterator<Item = (u64, u64)>) -> u64 {
    let trigger = A::red_trigger(field).max(1);
    let mut acc = A::default();
    let mut left = trigger;
    for (x, y) in pairs {
        if left == 0 {
            acc = acc.reduced(field);
            left = trigger;
        }
        acc = acc.add_mul(A::lift(x), A::lift(y));
        left -= 1;
    }
    acc.reduce(field)
}

/// Inner product using the cheapest exact accumulator for length `len`.
pub fn dot_auto(field: &Field, a: &[u64], b: &[u64]) -> u64 {
    if <u64 as Accumulator>::red_trigger(field) >= a.len() {
        dot::<u64>(field, a, b)
    } else {
        dot::<u128>(field, a, b)
    }
}

/// `A · x` for a column vector `x`.
pub fn mul_vec(field: &Field, a: &Mat, x: &[u64]) -> Result<Vec<u64>> {
    if a.num_cols() != x.len() {
        return Err(LinalgError::DimensionMismatch(format!(
            "matrix-vector: {} columns, vector length {}",
            a.num_cols(),
            x.len()
        )));
    }
    let work = threaded::work(&[a.num_rows(), a.num_cols()]);
    Ok(map_range(a.num_rows(), work, |i| dot_auto(field, a.row(i), x)))
}

/// `x · A` for a row vector `x`.
pub fn vec_mul(field: &Field, x: &[u64], a: &Mat) -> Result<Vec<u64>> {
    if a.num_rows() != x.len() {
        return Err(LinalgError::DimensionMismatch(format!(
            "vector-matrix: vector length {}, {} rows",
            x.len(),
            a.num_rows()
        )));
    }
    let m = a.num_cols();
    let mut out = vec![0u64; m];
    for (i, &xi) in x.iter().enumerate() {
        if xi == 0 {
            continue;
        }
        let pre = field.precon(xi);
        for (o, &v) in out.iter_mut().zip(a.row(i)) {
            *o = field.add(*o, field.mul_precon(v, &pre));
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn f97() -> Field {
        Field::new(97).unwrap()
    }

    #[test]
    fn test_add_sub_negate() {
        let f = f97();
        let a = Mat::from_rows(&[[1u64, 96], [50, 0]]).unwrap();
        let b = Mat::from_rows(&[[96u64, 2], [50, 3]]).unwrap();
        assert_eq!(add(&f, &a, &b).unwrap().as_slice(), &[0, 1, 3, 3]);
        assert_eq!(sub(&f, &a, &b).unwrap().as_slice(), &[2, 94, 0, 94]);
        assert!(add(&f, &a, &negate(&f, &a)).unwrap().is_zero());
        assert!(add(&f, &a, &Mat::zeros(2, 3)).is_err());
    }

    #[test]
    fn test_window_updates() {
        let f = f97();
        let a = Mat::from_rows(&[[10u64, 20], [30, 40]]).unwrap();
        let mut c = Mat::from_rows(&[[1u64, 2], [3, 4]]).unwrap();
        rsub_assign(&f, c.view_mut(), a.view());
        assert_eq!(c.as_slice(), &[9, 18, 27, 36]);
        sub_assign(&f, c.view_mut(), a.view());
        assert_eq!(c.as_slice(), &[96, 95, 94, 93]);
        add_assign(&f, c.view_mut(), a.view());
        assert_eq!(c.as_slice(), &[9, 18, 27, 36]);
    }

    #[test]
    fn test_scale_and_vectors() {
        let f = f97();
        let a = Mat::from_rows(&[[2u64, 0, 1], [1, 3, 0], [0, 1, 4]]).unwrap();
        assert_eq!(scale(&f, &a, 50).row(0), &[3, 0, 50]);
        assert_eq!(mul_vec(&f, &a, &[1, 2, 3]).unwrap(), vec![5, 7, 14]);
        assert_eq!(vec_mul(&f, &[1, 2, 3], &a).unwrap(), vec![4, 9, 13]);
        assert!(mul_vec(&f, &a, &[1]).is_err());
    }

    #[test]
    fn test_dot_reduces_long_sums() {
        let f = Field::new((1 << 60) - 93).unwrap();
        let a = vec![(1u64 << 60) - 94; 1000];
        let want = (0..1000).fold(0u64, |acc, _| f.add(acc, f.mul(a[0], a[0])));
        assert_eq!(dot::<u128>(&f, &a, &a), want);
        assert_eq!(dot_auto(&f, &a, &a), want);
    }
}
