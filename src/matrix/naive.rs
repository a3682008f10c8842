use super::{MatMut, MatRef};
use crate::field::Field;
use crate::threaded;

/// Modular multiplication using i-k-j loop order: X = A * B
///
/// The innermost loop walks a row of B and a row of X with stride 1. Each
/// `A[i][k]` is prepared once for Shoup multiplication and reused across
/// the whole row of B; zero entries are skipped.
///
/// Rows of X are independent, so they are split across threads once the
/// total work `n * l * m` passes the threshold.
///
/// # Arguments
///
/// * `x` - Output (n × m), overwritten
/// * `a` - Matrix A (n × l)
/// * `b` - Matrix B (l × m)
pub fn basic_mul(field: &Field, x: MatMut<'_>, a: MatRef<'_>, b: MatRef<'_>) {
    let (n, l, m) = (a.rows(), a.cols(), b.cols());
    debug_assert!(b.rows() == l && x.rows() == n && x.cols() == m);

    let mut rows = x.into_rows();
    threaded::for_each_mut(&mut rows, threaded::work(&[n, l, m]), |i, xr| {
        xr.fill(0);
        let ar = a.row(i);
        for (k, &aik) in ar.iter().enumerate() {
            if aik == 0 {
                continue;
            }
            let pre = field.precon(aik);
            for (xv, &bv) in xr.iter_mut().zip(b.row(k)) {
                *xv = field.add(*xv, field.mul_precon(bv, &pre));
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::Mat;

    #[test]
    fn test_basic_mul_2x3_times_3x2() {
        let f = Field::new(97).unwrap();
        let a = Mat::from_rows(&[[1u64, 2, 3], [4, 5, 6]]).unwrap();
        let b = Mat::from_rows(&[[7u64, 8], [9, 10], [11, 12]]).unwrap();
        let mut x = Mat::from_fn(2, 2, |_, _| 5);
        basic_mul(&f, x.view_mut(), a.view(), b.view());
        // 58 64 139 154 mod 97
        assert_eq!(x.as_slice(), &[58, 64, 42, 57]);
    }
}
