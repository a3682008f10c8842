use super::{Mat, MatMut, MatRef};

/// Transpose a window: dst = src^T
///
/// What was column j of src becomes row j of dst. `dst` must be
/// `src.cols() × src.rows()`.
pub fn transpose_into(src: MatRef<'_>, mut dst: MatMut<'_>) {
    debug_assert!(dst.rows() == src.cols() && dst.cols() == src.rows());
    for i in 0..src.rows() {
        for (j, &v) in src.row(i).iter().enumerate() {
            dst.set(j, i, v);
        }
    }
}

/// Transposed copy of a matrix.
///
/// # Example
///
/// ```
/// use zpmat::Mat;
/// use zpmat::matrix::transpose::transpose;
///
/// let src = Mat::from_rows(&[[1u64, 2, 3],   // 2×3 matrix
///                            [4, 5, 6]]).unwrap();
///
/// let dst = transpose(&src);                 // 3×2
///
/// assert_eq!(dst.as_slice(), &[1, 4,
///                              2, 5,
///                              3, 6]);
/// ```
pub fn transpose(src: &Mat) -> Mat {
    let mut dst = Mat::zeros(src.num_cols(), src.num_rows());
    transpose_into(src.view(), dst.view_mut());
    dst
}

/// Transposes in place; square matrices swap entries, others go through
/// a temporary.
pub fn transpose_in_place(a: &mut Mat) {
    if a.is_square() {
        let n = a.num_rows();
        for i in 0..n {
            for j in i + 1..n {
                let t = a[(i, j)];
                a[(i, j)] = a[(j, i)];
                a[(j, i)] = t;
            }
        }
    } else {
        *a = transpose(a);
    }
}
