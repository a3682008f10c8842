//! Owned, zero-padded panel buffers.
//!
//! A [`Panel`] is an `n × BLK` slab stored row-major; a [`Block`] is a
//! single `BLK × BLK` tile. Both are addressed through [`offset`] so the
//! layout lives in one place.

use super::{Accumulator, BLK, BLK_SQ};
use crate::field::Field;
use crate::matrix::{MatMut, MatRef, Permutation};
use std::ops::Range;

/// Position of `(row, col)` inside a `BLK`-wide buffer.
#[inline(always)]
pub fn offset(row: usize, col: usize) -> usize {
    row * BLK + col
}

/// `n × BLK` column panel.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Panel<A> {
    rows: usize,
    data: Vec<A>,
}

impl<A: Accumulator> Panel<A> {
    pub fn zeros(rows: usize) -> Self {
        Self {
            rows,
            data: vec![A::default(); rows * BLK],
        }
    }

    /// Loads columns `col..col + BLK` of `src`, zero-padding past its edge.
    pub fn from_columns(src: MatRef<'_>, col: usize) -> Self {
        let mut panel = Self::zeros(src.rows());
        let width = src.cols().saturating_sub(col).min(BLK);
        for i in 0..src.rows() {
            let row = &src.row(i)[col..col + width];
            for (dst, &v) in panel.row_mut(i).iter_mut().zip(row) {
                *dst = A::lift(v);
            }
        }
        panel
    }

    /// Splits `src` into `ceil(cols / BLK)` column panels.
    pub fn split_columns(src: MatRef<'_>) -> Vec<Self> {
        (0..src.cols().div_ceil(BLK))
            .map(|jp| Self::from_columns(src, jp * BLK))
            .collect()
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline(always)]
    pub fn get(&self, i: usize, j: usize) -> A {
        self.data[offset(i, j)]
    }

    #[inline(always)]
    pub fn set(&mut self, i: usize, j: usize, v: A) {
        self.data[offset(i, j)] = v;
    }

    #[inline(always)]
    pub fn row(&self, i: usize) -> &[A] {
        &self.data[offset(i, 0)..offset(i + 1, 0)]
    }

    #[inline(always)]
    pub fn row_mut(&mut self, i: usize) -> &mut [A] {
        &mut self.data[offset(i, 0)..offset(i + 1, 0)]
    }

    /// Raw storage of rows `rows`.
    pub fn rows_slice(&self, rows: Range<usize>) -> &[A] {
        &self.data[offset(rows.start, 0)..offset(rows.end, 0)]
    }

    pub fn rows_slice_mut(&mut self, rows: Range<usize>) -> &mut [A] {
        &mut self.data[offset(rows.start, 0)..offset(rows.end, 0)]
    }

    pub fn clear(&mut self) {
        self.data.fill(A::default());
    }

    pub fn swap_rows(&mut self, i: usize, j: usize) {
        self.swap_row_range(i, j, 0..BLK);
    }

    /// Swaps columns `cols` of rows `i` and `j`.
    pub fn swap_row_range(&mut self, i: usize, j: usize, cols: Range<usize>) {
        if i == j {
            return;
        }
        let (lo, hi) = (i.min(j), i.max(j));
        let (head, tail) = self.data.split_at_mut(offset(hi, 0));
        let a = &mut head[offset(lo, cols.start)..offset(lo, cols.end)];
        let b = &mut tail[cols.start..cols.end];
        a.swap_with_slice(b);
    }

    /// Replays the recorded row swaps for positions in `range`.
    pub fn apply_swaps(&mut self, perm: &Permutation, range: Range<usize>) {
        for k in range {
            let pos = perm.target(k);
            if pos != k {
                self.swap_rows(k, pos);
            }
        }
    }

    pub fn reduce_all(&mut self, field: &Field) {
        for v in &mut self.data {
            *v = v.reduced(field);
        }
    }

    pub fn reduce_rows(&mut self, field: &Field, rows: Range<usize>) {
        for v in self.rows_slice_mut(rows) {
            *v = v.reduced(field);
        }
    }

    /// Writes the reduced entries of rows `rows`, transposed, into `bt`:
    /// `bt[j*BLK + (i - rows.start)] = self[i][j]`.
    ///
    /// Positions of `bt` past `rows.len()` keep whatever they held; the
    /// kernels never read them.
    pub fn transpose_rows_into(&self, field: &Field, rows: Range<usize>, bt: &mut Block<A>) {
        debug_assert!(rows.len() <= BLK);
        let start = rows.start;
        for i in rows {
            let row = self.row(i);
            for (j, &v) in row.iter().enumerate() {
                bt.data[offset(j, i - start)] = v.reduced(field);
            }
        }
    }

    /// Copies rows `blk*BLK..` into `dst` as a `BLK × BLK` tile, zero
    /// filling rows past the panel end.
    pub fn copy_block_out(&self, blk: usize, dst: &mut [A]) {
        let start = blk * BLK;
        let end = (start + BLK).min(self.rows);
        let used = end.saturating_sub(start) * BLK;
        if used > 0 {
            dst[..used].copy_from_slice(self.rows_slice(start..end));
        }
        dst[used..BLK_SQ].fill(A::default());
    }

    /// Moves tile `src_blk` into tile slot `dst_blk` (`dst_blk < src_blk`)
    /// and transposes the slot in place.
    pub fn shift_block_transposed(&mut self, src_blk: usize, dst_blk: usize) {
        debug_assert!(dst_blk < src_blk);
        let start = src_blk * BLK;
        let end = (start + BLK).min(self.rows);
        let used = end.saturating_sub(start) * BLK;
        let dst0 = dst_blk * BLK_SQ;
        let src0 = offset(start, 0);
        self.data.copy_within(src0..src0 + used, dst0);
        self.data[dst0 + used..dst0 + BLK_SQ].fill(A::default());
        transpose_square(&mut self.data[dst0..dst0 + BLK_SQ]);
    }

    /// Tile slot `blk` as a raw `BLK × BLK` slice.
    pub fn block_slot(&self, blk: usize) -> &[A] {
        &self.data[blk * BLK_SQ..(blk + 1) * BLK_SQ]
    }

    /// Copies rows `rows` from `other` (same height).
    pub fn copy_rows_from(&mut self, other: &Panel<A>, rows: Range<usize>) {
        let range = offset(rows.start, 0)..offset(rows.end, 0);
        self.data[range.clone()].copy_from_slice(&other.data[range]);
    }

    /// Stores the reduced panel into columns `col..` of `dst`.
    pub fn write_columns(&self, field: &Field, mut dst: MatMut<'_>, col: usize) {
        let width = dst.cols().saturating_sub(col).min(BLK);
        for i in 0..self.rows.min(dst.rows()) {
            let src = &self.row(i)[..width];
            for (d, &v) in dst.row_mut(i)[col..col + width].iter_mut().zip(src) {
                *d = v.reduce(field);
            }
        }
    }
}

/// One `BLK × BLK` tile.
#[derive(Clone, Debug, PartialEq)]
pub struct Block<A> {
    data: Vec<A>,
}

impl<A: Accumulator> Block<A> {
    pub fn zeros() -> Self {
        Self {
            data: vec![A::default(); BLK_SQ],
        }
    }

    /// Loads `src[row..row+BLK][col..col+BLK]` transposed, zero padded:
    /// `bt[j*BLK + i] = src[row + i][col + j]`.
    pub fn load_transposed(&mut self, src: MatRef<'_>, row: usize, col: usize) {
        self.data.fill(A::default());
        let h = src.rows().saturating_sub(row).min(BLK);
        let w = src.cols().saturating_sub(col).min(BLK);
        for i in 0..h {
            let r = &src.row(row + i)[col..col + w];
            for (j, &v) in r.iter().enumerate() {
                self.data[offset(j, i)] = A::lift(v);
            }
        }
    }

    #[inline]
    pub fn as_slice(&self) -> &[A] {
        &self.data
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [A] {
        &mut self.data
    }
}

impl<A: Accumulator> Default for Block<A> {
    fn default() -> Self {
        Self::zeros()
    }
}

/// In-place transpose of a row-major `BLK × BLK` tile.
pub fn transpose_square<A: Copy>(tile: &mut [A]) {
    for i in 0..BLK {
        for j in i + 1..BLK {
            tile.swap(offset(i, j), offset(j, i));
        }
    }
}

/// Reduces every entry of a tile.
pub fn reduce_slice<A: Accumulator>(field: &Field, tile: &mut [A]) {
    for v in tile {
        *v = v.reduced(field);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::Mat;

    #[test]
    fn test_from_columns_pads() {
        let m = Mat::from_fn(3, 40, |i, j| (i * 100 + j) as u64);
        let panels = Panel::<u64>::split_columns(m.view());
        assert_eq!(panels.len(), 2);
        assert_eq!(panels[0].get(2, 31), 231);
        assert_eq!(panels[1].get(1, 7), 139);
        assert_eq!(panels[1].get(1, 8), 0);
    }

    #[test]
    fn test_swaps_and_ranges() {
        let m = Mat::from_fn(4, 32, |i, j| (i * 32 + j) as u64);
        let mut p = Panel::<u64>::from_columns(m.view(), 0);
        p.swap_row_range(3, 1, 16..32);
        assert_eq!(p.get(1, 15), 47);
        assert_eq!(p.get(1, 16), 112);
        assert_eq!(p.get(3, 16), 48);

        let mut perm = Permutation::identity(4);
        perm.record(0, 2);
        let mut q = Panel::<u64>::from_columns(m.view(), 0);
        q.apply_swaps(&perm, 0..1);
        assert_eq!(q.get(0, 0), 64);
        assert_eq!(q.get(2, 0), 0);
    }

    #[test]
    fn test_transpose_rows_into_reduces() {
        let f = Field::new(7).unwrap();
        let m = Mat::from_fn(3, 32, |i, j| (i + j) as u64);
        let p = Panel::<u64>::from_columns(m.view(), 0);
        let mut bt = Block::zeros();
        p.transpose_rows_into(&f, 1..3, &mut bt);
        assert_eq!(bt.as_slice()[offset(10, 0)], 11 % 7);
        assert_eq!(bt.as_slice()[offset(10, 1)], 12 % 7);
    }

    #[test]
    fn test_shift_block_transposed() {
        let m = Mat::from_fn(70, 32, |i, j| (i * 1000 + j) as u64);
        let mut p = Panel::<u64>::from_columns(m.view(), 0);
        p.shift_block_transposed(2, 1);
        // slot 1 now holds rows 64..70 transposed
        let slot = p.block_slot(1);
        assert_eq!(slot[offset(3, 0)], 64_003);
        assert_eq!(slot[offset(3, 5)], 69_003);
        assert_eq!(slot[offset(3, 6)], 0);
    }
}
