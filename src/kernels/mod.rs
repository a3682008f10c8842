//! Panel kernels with deferred modular reduction.
//!
//! Blocked routines work on 32-wide column panels of unreduced values and
//! only fold them back into `[0, p)` when the next batch of products could
//! overflow the accumulator. The accumulator type decides how many products
//! fit between reductions:
//!
//! - `u64` ([`Backend::Integer`]): plain 64-bit sums, good for `p` up to
//!   about `2^28` at panel width.
//! - `u128` ([`Backend::WideInteger`]): always at least 256 products for
//!   the supported moduli.
//! - `f64` ([`Backend::Float`]): exact below `2^53`, vectorised with
//!   AVX2+FMA when the CPU has it.
//!
//! All three produce identical reduced results; only speed differs.

pub mod avx;
pub mod muladd;
pub mod panel;

use crate::error::{LinalgError, Result};
use crate::field::Field;
use std::fmt::Debug;

pub use panel::{Block, Panel};

/// Panel width.
pub const BLK: usize = 32;

/// Elements in one `BLK × BLK` block.
pub const BLK_SQ: usize = BLK * BLK;

/// Accumulator flavour used by a blocked routine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Backend {
    Integer,
    WideInteger,
    Float,
}

impl Backend {
    /// Products that fit on top of a reduced value before reducing.
    pub fn red_trigger(self, field: &Field) -> usize {
        match self {
            Backend::Integer => <u64 as Accumulator>::red_trigger(field),
            Backend::WideInteger => <u128 as Accumulator>::red_trigger(field),
            Backend::Float => <f64 as Accumulator>::red_trigger(field),
        }
    }

    /// True when at least `v` products fit between reductions.
    pub fn supports(self, field: &Field, v: usize) -> bool {
        self.red_trigger(field) >= v
    }

    /// Fastest backend able to absorb `v` products between reductions.
    ///
    /// Float is only chosen when the SIMD kernels can run.
    pub fn select(field: &Field, v: usize) -> Option<Backend> {
        if avx::available() && Backend::Float.supports(field, v) {
            Some(Backend::Float)
        } else if Backend::Integer.supports(field, v) {
            Some(Backend::Integer)
        } else if Backend::WideInteger.supports(field, v) {
            Some(Backend::WideInteger)
        } else {
            None
        }
    }
}

/// Reduction trigger for `A`, or an error when fewer than `v` products fit.
pub fn checked_trigger<A: Accumulator>(field: &Field, v: usize) -> Result<usize> {
    let t = A::red_trigger(field);
    if t < v {
        return Err(LinalgError::AccumulatorTooNarrow(A::BACKEND, v));
    }
    Ok(t)
}

/// Numeric type holding unreduced sums of products.
pub trait Accumulator: Copy + Default + PartialEq + Debug + Send + Sync + 'static {
    const BACKEND: Backend;

    /// Largest integer the type holds exactly.
    const LIMIT: u128;

    fn lift(x: u64) -> Self;

    /// `self + a * b`
    fn add_mul(self, a: Self, b: Self) -> Self;

    fn reduce(self, field: &Field) -> u64;

    #[inline(always)]
    fn reduced(self, field: &Field) -> Self {
        Self::lift(self.reduce(field))
    }

    fn red_trigger(field: &Field) -> usize {
        let pm1 = (field.modulus() - 1) as u128;
        if pm1 >= Self::LIMIT {
            return 0;
        }
        let t = (Self::LIMIT - pm1) / (pm1 * pm1);
        t.min(usize::MAX as u128) as usize
    }

    /// `x[j] += Σ_{i<n} a[i] * bt[j*BLK + i]` for all `BLK` outputs.
    #[inline]
    fn muladd_row(x: &mut [Self], a: &[Self], bt: &[Self], n: usize) {
        muladd::muladd_row_scalar(x, a, bt, n);
    }

    /// `x[i] += y[i] * c`
    #[inline]
    fn muladd_interval(x: &mut [Self], y: &[Self], c: Self) {
        muladd::muladd_interval_scalar(x, y, c);
    }
}

impl Accumulator for u64 {
    const BACKEND: Backend = Backend::Integer;
    const LIMIT: u128 = u64::MAX as u128;

    #[inline(always)]
    fn lift(x: u64) -> Self {
        x
    }

    #[inline(always)]
    fn add_mul(self, a: Self, b: Self) -> Self {
        self + a * b
    }

    #[inline(always)]
    fn reduce(self, field: &Field) -> u64 {
        field.reduce_u64(self)
    }
}

impl Accumulator for u128 {
    const BACKEND: Backend = Backend::WideInteger;
    const LIMIT: u128 = u128::MAX;

    #[inline(always)]
    fn lift(x: u64) -> Self {
        x as u128
    }

    #[inline(always)]
    fn add_mul(self, a: Self, b: Self) -> Self {
        self + a * b
    }

    #[inline(always)]
    fn reduce(self, field: &Field) -> u64 {
        field.reduce_u128(self)
    }
}

impl Accumulator for f64 {
    const BACKEND: Backend = Backend::Float;
    const LIMIT: u128 = (1u128 << 53) - 1;

    #[inline(always)]
    fn lift(x: u64) -> Self {
        x as f64
    }

    #[inline(always)]
    fn add_mul(self, a: Self, b: Self) -> Self {
        self + a * b
    }

    #[inline(always)]
    fn reduce(self, field: &Field) -> u64 {
        field.reduce_f64(self)
    }

    #[inline]
    fn muladd_row(x: &mut [Self], a: &[Self], bt: &[Self], n: usize) {
        #[cfg(target_arch = "x86_64")]
        {
            if avx::available() {
                unsafe { avx::muladd_row_avx2(x, a, bt, n) };
                return;
            }
        }
        muladd::muladd_row_scalar(x, a, bt, n);
    }

    #[inline]
    fn muladd_interval(x: &mut [Self], y: &[Self], c: Self) {
        #[cfg(target_arch = "x86_64")]
        {
            if avx::available() {
                unsafe { avx::muladd_interval_avx2(x, y, c) };
                return;
            }
        }
        muladd::muladd_interval_scalar(x, y, c);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_red_trigger_bounds() {
        let f = Field::new(65_521).unwrap();
        let pm1 = 65_520u128;
        assert_eq!(
            Backend::Integer.red_trigger(&f) as u128,
            (u64::MAX as u128 - pm1) / (pm1 * pm1)
        );
        assert_eq!(
            Backend::Float.red_trigger(&f) as u128,
            ((1u128 << 53) - 1 - pm1) / (pm1 * pm1)
        );

        // 60-bit modulus: only the wide backend survives
        let big = Field::new((1 << 60) - 93).unwrap();
        assert_eq!(Backend::Integer.red_trigger(&big), 0);
        assert_eq!(Backend::Float.red_trigger(&big), 0);
        assert!(Backend::WideInteger.red_trigger(&big) >= 256);
        assert_eq!(Backend::select(&big, 4 * BLK), Some(Backend::WideInteger));
    }

    #[test]
    fn test_select_prefers_integer_without_simd() {
        let f = Field::new(1_000_003).unwrap();
        let picked = Backend::select(&f, 4 * BLK).unwrap();
        if avx::available() {
            assert_eq!(picked, Backend::Float);
        } else {
            assert_eq!(picked, Backend::Integer);
        }
    }

    #[test]
    fn test_select_none_when_width_too_large() {
        let big = Field::new((1 << 60) - 93).unwrap();
        assert_eq!(Backend::select(&big, usize::MAX), None);
    }

    #[test]
    fn test_reduce_agrees_across_backends() {
        let f = Field::new(1_000_003).unwrap();
        let vals = [0u64, 1, 1_000_002, 999_999];
        for &a in &vals {
            for &b in &vals {
                let want = f.mul(a, b);
                assert_eq!(0u64.add_mul(a, b).reduce(&f), want);
                assert_eq!(0u128.add_mul(a as u128, b as u128).reduce(&f), want);
                assert_eq!(0f64.add_mul(a as f64, b as f64).reduce(&f), want);
            }
        }
    }
}
