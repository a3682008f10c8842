//! Borrowed rectangular views into a matrix.
//!
//! Windows carry their own row stride so recursive algorithms can address
//! quadrants without copying. A shared window is `Copy`; a mutable window
//! hands out at most one sub-window at a time through reborrowing.

use crate::error::{LinalgError, Result};

fn check_bounds(
    rows: usize,
    cols: usize,
    row: usize,
    col: usize,
    nrows: usize,
    ncols: usize,
) -> Result<()> {
    let row_end = row.checked_add(nrows).ok_or(LinalgError::TooLarge)?;
    let col_end = col.checked_add(ncols).ok_or(LinalgError::TooLarge)?;
    if row_end > rows || col_end > cols {
        return Err(LinalgError::WindowOutOfBounds {
            row,
            row_end,
            col,
            col_end,
            rows,
            cols,
        });
    }
    Ok(())
}

/// Slice span covering a `rows × cols` window with the given stride.
#[inline]
fn span(rows: usize, cols: usize, stride: usize) -> usize {
    if rows == 0 || cols == 0 {
        0
    } else {
        (rows - 1) * stride + cols
    }
}

/// Read-only view.
#[derive(Clone, Copy, Debug)]
pub struct MatRef<'a> {
    data: &'a [u64],
    rows: usize,
    cols: usize,
    stride: usize,
}

impl<'a> MatRef<'a> {
    /// View over `data` with `rows` rows of `cols` entries, `stride` apart.
    pub fn new(data: &'a [u64], rows: usize, cols: usize, stride: usize) -> Self {
        let len = span(rows, cols, stride);
        debug_assert!(stride >= cols || rows <= 1);
        Self {
            data: &data[..len],
            rows,
            cols,
            stride,
        }
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline(always)]
    pub fn row(&self, i: usize) -> &'a [u64] {
        if self.cols == 0 {
            return &[];
        }
        let start = i * self.stride;
        &self.data[start..start + self.cols]
    }

    #[inline(always)]
    pub fn get(&self, i: usize, j: usize) -> u64 {
        self.data[i * self.stride + j]
    }

    /// Sub-window of `nrows × ncols` starting at `(row, col)`.
    pub fn window(&self, row: usize, col: usize, nrows: usize, ncols: usize) -> Result<MatRef<'a>> {
        check_bounds(self.rows, self.cols, row, col, nrows, ncols)?;
        let len = span(nrows, ncols, self.stride);
        let data = if len == 0 {
            &self.data[..0]
        } else {
            let start = row * self.stride + col;
            &self.data[start..start + len]
        };
        Ok(MatRef {
            data,
            rows: nrows,
            cols: ncols,
            stride: self.stride,
        })
    }

    /// Iterator over the rows.
    pub fn row_iter(self) -> impl Iterator<Item = &'a [u64]> {
        (0..self.rows).map(move |i| self.row(i))
    }
}

/// Mutable view.
#[derive(Debug)]
pub struct MatMut<'a> {
    data: &'a mut [u64],
    rows: usize,
    cols: usize,
    stride: usize,
}

impl<'a> MatMut<'a> {
    pub fn new(data: &'a mut [u64], rows: usize, cols: usize, stride: usize) -> Self {
        let len = span(rows, cols, stride);
        debug_assert!(stride >= cols || rows <= 1);
        Self {
            data: &mut data[..len],
            rows,
            cols,
            stride,
        }
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline(always)]
    pub fn row(&self, i: usize) -> &[u64] {
        if self.cols == 0 {
            return &[];
        }
        let start = i * self.stride;
        &self.data[start..start + self.cols]
    }

    #[inline(always)]
    pub fn row_mut(&mut self, i: usize) -> &mut [u64] {
        if self.cols == 0 {
            return &mut [];
        }
        let start = i * self.stride;
        &mut self.data[start..start + self.cols]
    }

    #[inline(always)]
    pub fn get(&self, i: usize, j: usize) -> u64 {
        self.data[i * self.stride + j]
    }

    #[inline(always)]
    pub fn set(&mut self, i: usize, j: usize, v: u64) {
        self.data[i * self.stride + j] = v;
    }

    /// Shorter-lived copy of this view.
    pub fn reborrow(&mut self) -> MatMut<'_> {
        MatMut {
            data: &mut *self.data,
            rows: self.rows,
            cols: self.cols,
            stride: self.stride,
        }
    }

    pub fn as_ref(&self) -> MatRef<'_> {
        MatRef {
            data: &*self.data,
            rows: self.rows,
            cols: self.cols,
            stride: self.stride,
        }
    }

    pub fn window_mut(
        &mut self,
        row: usize,
        col: usize,
        nrows: usize,
        ncols: usize,
    ) -> Result<MatMut<'_>> {
        check_bounds(self.rows, self.cols, row, col, nrows, ncols)?;
        let len = span(nrows, ncols, self.stride);
        let data = if len == 0 {
            &mut self.data[..0]
        } else {
            let start = row * self.stride + col;
            &mut self.data[start..start + len]
        };
        Ok(MatMut {
            data,
            rows: nrows,
            cols: ncols,
            stride: self.stride,
        })
    }

    /// Consumes the view into disjoint mutable rows.
    pub fn into_rows(self) -> Vec<&'a mut [u64]> {
        if self.rows == 0 || self.cols == 0 {
            return Vec::new();
        }
        let cols = self.cols;
        self.data
            .chunks_mut(self.stride)
            .take(self.rows)
            .map(|chunk| &mut chunk[..cols])
            .collect()
    }

    pub fn fill(&mut self, v: u64) {
        for i in 0..self.rows {
            self.row_mut(i).fill(v);
        }
    }

    /// Copies `src` (same shape) into this view.
    pub fn copy_from(&mut self, src: MatRef<'_>) {
        debug_assert!(src.rows() == self.rows && src.cols() == self.cols);
        for i in 0..self.rows {
            self.row_mut(i).copy_from_slice(src.row(i));
        }
    }
}
