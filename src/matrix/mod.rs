//! Dense matrices over a word-sized field, plus the simple operations.
//!
//! [`Mat`] owns row-major storage. Algorithms that recurse on sub-blocks
//! take [`MatRef`]/[`MatMut`] windows instead, so nothing is copied until a
//! blocked routine packs operands into panels.

pub mod naive;
pub mod ops;
pub mod permutation;
pub mod transpose;
pub mod window;

pub use permutation::Permutation;
pub use window::{MatMut, MatRef};

use crate::error::{LinalgError, Result, checked_area};
use std::ops::{Index, IndexMut};

/// Row-major dense matrix of field elements.
///
/// Entries are expected to lie in `[0, p)` for whichever field they are
/// used with; constructors do not check this.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Mat {
    rows: usize,
    cols: usize,
    data: Vec<u64>,
}

impl Mat {
    /// # Panics
    ///
    /// Panics if `rows * cols` overflows, like `vec!` on a capacity overflow.
    /// Use [`Mat::try_zeros`] for caller-supplied shapes.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        let len = rows.checked_mul(cols).unwrap_or(usize::MAX);
        Self {
            rows,
            cols,
            data: vec![0; len],
        }
    }

    /// [`Mat::zeros`], or [`LinalgError::TooLarge`] when the element count
    /// does not fit in `usize`.
    pub fn try_zeros(rows: usize, cols: usize) -> Result<Self> {
        let len = checked_area(rows, cols)?;
        Ok(Self {
            rows,
            cols,
            data: vec![0; len],
        })
    }

    pub fn identity(n: usize) -> Self {
        Self::diag(n, 1)
    }

    pub fn try_identity(n: usize) -> Result<Self> {
        let mut m = Self::try_zeros(n, n)?;
        for i in 0..n {
            m[(i, i)] = 1;
        }
        Ok(m)
    }

    /// `d` on the diagonal, zero elsewhere.
    pub fn diag(n: usize, d: u64) -> Self {
        let mut m = Self::zeros(n, n);
        for i in 0..n {
            m[(i, i)] = d;
        }
        m
    }

    pub fn from_fn(rows: usize, cols: usize, mut f: impl FnMut(usize, usize) -> u64) -> Self {
        let mut data = Vec::with_capacity(rows.saturating_mul(cols));
        for i in 0..rows {
            for j in 0..cols {
                data.push(f(i, j));
            }
        }
        Self { rows, cols, data }
    }

    /// Wraps row-major `data`.
    pub fn from_vec(rows: usize, cols: usize, data: Vec<u64>) -> Result<Self> {
        let want = checked_area(rows, cols)?;
        if data.len() != want {
            return Err(LinalgError::DimensionMismatch(format!(
                "{}x{} needs {} elements, got {}",
                rows,
                cols,
                want,
                data.len()
            )));
        }
        Ok(Self { rows, cols, data })
    }

    /// Builds a matrix from equal-length rows.
    pub fn from_rows<R: AsRef<[u64]>>(rows: &[R]) -> Result<Self> {
        let cols = rows.first().map_or(0, |r| r.as_ref().len());
        let mut data = Vec::with_capacity(rows.len() * cols);
        for (i, r) in rows.iter().enumerate() {
            let r = r.as_ref();
            if r.len() != cols {
                return Err(LinalgError::DimensionMismatch(format!(
                    "row {} has {} entries, expected {}",
                    i,
                    r.len(),
                    cols
                )));
            }
            data.extend_from_slice(r);
        }
        Ok(Self {
            rows: rows.len(),
            cols,
            data,
        })
    }

    #[inline]
    pub fn num_rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn num_cols(&self) -> usize {
        self.cols
    }

    pub fn is_square(&self) -> bool {
        self.rows == self.cols
    }

    #[inline]
    pub fn row(&self, i: usize) -> &[u64] {
        &self.data[i * self.cols..(i + 1) * self.cols]
    }

    #[inline]
    pub fn row_mut(&mut self, i: usize) -> &mut [u64] {
        &mut self.data[i * self.cols..(i + 1) * self.cols]
    }

    pub fn as_slice(&self) -> &[u64] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [u64] {
        &mut self.data
    }

    /// Rows as owned vectors, for routines that swap whole rows.
    pub fn to_row_vecs(&self) -> Vec<Vec<u64>> {
        (0..self.rows).map(|i| self.row(i).to_vec()).collect()
    }

    pub fn from_row_vecs(rows: Vec<Vec<u64>>, cols: usize) -> Self {
        let n = rows.len();
        let mut data = Vec::with_capacity(n * cols);
        for r in rows {
            debug_assert_eq!(r.len(), cols);
            data.extend(r);
        }
        Self {
            rows: n,
            cols,
            data,
        }
    }

    pub fn view(&self) -> MatRef<'_> {
        MatRef::new(&self.data, self.rows, self.cols, self.cols)
    }

    pub fn view_mut(&mut self) -> MatMut<'_> {
        MatMut::new(&mut self.data, self.rows, self.cols, self.cols)
    }

    pub fn window(&self, row: usize, col: usize, nrows: usize, ncols: usize) -> Result<MatRef<'_>> {
        self.view().window(row, col, nrows, ncols)
    }

    pub fn is_zero(&self) -> bool {
        self.data.iter().all(|&v| v == 0)
    }

    pub fn is_identity(&self) -> bool {
        self.is_square()
            && (0..self.rows)
                .all(|i| self.row(i).iter().enumerate().all(|(j, &v)| v == (i == j) as u64))
    }

    pub fn swap_rows(&mut self, i: usize, j: usize) {
        if i == j {
            return;
        }
        let (lo, hi) = (i.min(j), i.max(j));
        let cols = self.cols;
        let (head, tail) = self.data.split_at_mut(hi * cols);
        head[lo * cols..(lo + 1) * cols].swap_with_slice(&mut tail[..cols]);
    }
}

impl From<MatRef<'_>> for Mat {
    fn from(src: MatRef<'_>) -> Self {
        let mut data = Vec::with_capacity(src.rows() * src.cols());
        for row in src.row_iter() {
            data.extend_from_slice(row);
        }
        Self {
            rows: src.rows(),
            cols: src.cols(),
            data,
        }
    }
}

impl Index<(usize, usize)> for Mat {
    type Output = u64;

    #[inline]
    fn index(&self, (i, j): (usize, usize)) -> &u64 {
        debug_assert!(i < self.rows && j < self.cols);
        &self.data[i * self.cols + j]
    }
}

impl IndexMut<(usize, usize)> for Mat {
    #[inline]
    fn index_mut(&mut self, (i, j): (usize, usize)) -> &mut u64 {
        debug_assert!(i < self.rows && j < self.cols);
        &mut self.data[i * self.cols + j]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_rows_rejects_ragged() {
        let err = Mat::from_rows(&[vec![1, 2], vec![3]]).unwrap_err();
        assert!(matches!(err, LinalgError::DimensionMismatch(_)));

        let m = Mat::from_rows(&[[1u64, 2], [3, 4]]).unwrap();
        assert_eq!(m[(1, 0)], 3);
        assert_eq!(m.num_cols(), 2);
    }

    #[test]
    fn test_empty_shapes() {
        let m = Mat::from_rows::<Vec<u64>>(&[]).unwrap();
        assert_eq!((m.num_rows(), m.num_cols()), (0, 0));
        assert!(m.is_identity());

        let tall = Mat::zeros(3, 0);
        assert_eq!(tall.row(2), &[] as &[u64]);
        assert!(tall.is_zero());
        assert_eq!(Mat::from(tall.view()), tall);
    }

    #[test]
    fn test_identity_and_swap() {
        let mut m = Mat::identity(3);
        assert!(m.is_identity());
        m.swap_rows(0, 2);
        assert!(!m.is_identity());
        assert_eq!(m.row(0), &[0, 0, 1]);
        assert_eq!(Mat::diag(2, 5).as_slice(), &[5, 0, 0, 5]);
    }

    #[test]
    fn test_from_vec_checks_length() {
        assert!(Mat::from_vec(2, 3, vec![0; 5]).is_err());
        assert_eq!(Mat::from_vec(usize::MAX, 2, vec![]), Err(LinalgError::TooLarge));
    }

    #[test]
    fn test_try_constructors() {
        assert_eq!(Mat::try_zeros(1 << 33, 1 << 33), Err(LinalgError::TooLarge));
        assert_eq!(Mat::try_identity(usize::MAX), Err(LinalgError::TooLarge));
        assert_eq!(Mat::try_zeros(2, 3).unwrap(), Mat::zeros(2, 3));
        assert_eq!(Mat::try_identity(4).unwrap(), Mat::identity(4));
        assert_eq!(Mat::try_zeros(1 << 33, 0).unwrap().num_rows(), 1 << 33);
    }
}
