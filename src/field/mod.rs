//! Arithmetic modulo a word-sized modulus.
//!
//! A [`Field`] carries the modulus together with the reciprocals used by
//! every reduction in the crate. It is passed explicitly into each
//! operation; nothing in the crate keeps a global "current modulus", so
//! several fields can be used side by side on different threads.
//!
//! ```
//! use zpmat::Field;
//!
//! let f = Field::new(97).unwrap();
//! assert_eq!(f.mul(50, 2), 3);
//! assert_eq!(f.mul(f.inv(5).unwrap(), 5), 1);
//! ```

pub mod reduce;

pub use reduce::MulPrecon;

use crate::error::{LinalgError, Result};
use tracing::trace;

/// Largest supported modulus is `2^MAX_MODULUS_BITS - 1`.
pub const MAX_MODULUS_BITS: u32 = 60;

/// Outcome of an inversion attempt under a possibly composite modulus.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InvStatus {
    /// The element is a unit; carries its inverse.
    Unit(u64),
    /// The element shares the factor `gcd` with the modulus.
    ZeroDivisor { gcd: u64 },
}

/// Modulus plus cached reduction constants.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Field {
    p: u64,
    /// floor(2^64 / p)
    m: u64,
    /// floor((2^128 - 1) / p)
    mu: u128,
}

impl Field {
    /// Builds the context for modulus `p`, `2 <= p < 2^60`.
    ///
    /// `p` is expected to be prime. Prime powers work with the relaxed
    /// entry points; other composites are accepted but only meaningful for
    /// the multiplication routines.
    pub fn new(p: u64) -> Result<Self> {
        if p < 2 || p >> MAX_MODULUS_BITS != 0 {
            return Err(LinalgError::InvalidModulus(p));
        }
        let m = ((1u128 << 64) / p as u128) as u64;
        let mu = u128::MAX / p as u128;
        trace!(p, "field context");
        Ok(Self { p, m, mu })
    }

    #[inline]
    pub fn modulus(&self) -> u64 {
        self.p
    }

    #[inline(always)]
    pub fn add(&self, a: u64, b: u64) -> u64 {
        let r = a.wrapping_add(b).wrapping_sub(self.p);
        r.wrapping_add(self.p & ((r as i64 >> 63) as u64))
    }

    #[inline(always)]
    pub fn sub(&self, a: u64, b: u64) -> u64 {
        let r = a.wrapping_sub(b);
        r.wrapping_add(self.p & ((r as i64 >> 63) as u64))
    }

    #[inline(always)]
    pub fn neg(&self, a: u64) -> u64 {
        self.sub(0, a)
    }

    #[inline(always)]
    pub fn mul(&self, a: u64, b: u64) -> u64 {
        self.reduce_u128(a as u128 * b as u128)
    }

    /// Prepares `b` for repeated multiplication.
    #[inline]
    pub fn precon(&self, b: u64) -> MulPrecon {
        MulPrecon::new(b, self.p)
    }

    #[inline(always)]
    pub fn mul_precon(&self, a: u64, b: &MulPrecon) -> u64 {
        b.apply(a, self.p)
    }

    #[inline(always)]
    pub fn reduce_u64(&self, x: u64) -> u64 {
        reduce::barrett_u64(x, self.p, self.m)
    }

    #[inline(always)]
    pub fn reduce_u128(&self, x: u128) -> u64 {
        reduce::barrett_u128(x, self.p, self.m, self.mu)
    }

    /// Reduces an exactly represented non-negative integer below `2^53`.
    #[inline(always)]
    pub fn reduce_f64(&self, x: f64) -> u64 {
        self.reduce_u64(x as u64)
    }

    /// Maps a signed integer to its residue.
    pub fn from_i64(&self, v: i64) -> u64 {
        (v as i128).rem_euclid(self.p as i128) as u64
    }

    /// Inversion that reports zero divisors instead of failing.
    pub fn inv_status(&self, a: u64) -> InvStatus {
        let p = self.p as i64;
        let (mut r0, mut r1) = (p, (a % self.p) as i64);
        let (mut t0, mut t1) = (0i64, 1i64);
        while r1 != 0 {
            let q = r0 / r1;
            (r0, r1) = (r1, r0 - q * r1);
            (t0, t1) = (t1, t0 - q * t1);
        }
        if r0 != 1 {
            return InvStatus::ZeroDivisor { gcd: r0 as u64 };
        }
        InvStatus::Unit(t0.rem_euclid(p) as u64)
    }

    /// Modular inverse; fails when `gcd(a, p) != 1`.
    pub fn inv(&self, a: u64) -> Result<u64> {
        match self.inv_status(a) {
            InvStatus::Unit(v) => Ok(v),
            InvStatus::ZeroDivisor { gcd } => Err(LinalgError::NotInvertible { value: a, gcd }),
        }
    }

    pub fn pow(&self, a: u64, mut e: u64) -> u64 {
        let mut base = a;
        let mut acc = 1;
        while e > 0 {
            if e & 1 == 1 {
                acc = self.mul(acc, base);
            }
            base = self.mul(base, base);
            e >>= 1;
        }
        acc
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const BIG: u64 = (1 << 60) - 93;

    #[test]
    fn test_rejects_bad_moduli() {
        assert_eq!(Field::new(0), Err(LinalgError::InvalidModulus(0)));
        assert_eq!(Field::new(1), Err(LinalgError::InvalidModulus(1)));
        assert!(Field::new(1 << 60).is_err());
        assert!(Field::new((1 << 60) - 1).is_ok());
    }

    #[test]
    fn test_small_prime_table() {
        let f = Field::new(7).unwrap();
        assert_eq!(f.add(5, 4), 2);
        assert_eq!(f.sub(2, 5), 4);
        assert_eq!(f.neg(0), 0);
        assert_eq!(f.neg(3), 4);
        assert_eq!(f.mul(3, 5), 1);
        assert_eq!(f.inv(3), Ok(5));
        assert_eq!(f.pow(3, 6), 1);
        assert_eq!(f.from_i64(-2), 5);
    }

    #[test]
    fn test_inv_status_prime_power() {
        let f = Field::new(27).unwrap();
        assert_eq!(f.inv_status(6), InvStatus::ZeroDivisor { gcd: 3 });
        assert_eq!(f.inv_status(0), InvStatus::ZeroDivisor { gcd: 27 });
        assert_eq!(f.inv_status(2), InvStatus::Unit(14));
        assert_eq!(f.inv(9), Err(LinalgError::NotInvertible { value: 9, gcd: 9 }));
    }

    #[test]
    fn test_reduce_f64_exact() {
        let f = Field::new(65_521).unwrap();
        let x = ((1u64 << 53) - 1) as f64;
        assert_eq!(f.reduce_f64(x), ((1u64 << 53) - 1) % 65_521);
    }

    proptest! {
        #[test]
        fn field_ops_match_u128(a in 0..BIG, b in 0..BIG) {
            let f = Field::new(BIG).unwrap();
            let p = BIG as u128;
            prop_assert_eq!(f.add(a, b) as u128, (a as u128 + b as u128) % p);
            prop_assert_eq!(f.sub(a, b) as u128, (a as u128 + p - b as u128) % p);
            prop_assert_eq!(f.mul(a, b) as u128, a as u128 * b as u128 % p);
            prop_assert_eq!(f.mul_precon(a, &f.precon(b)), f.mul(a, b));
        }

        #[test]
        fn inverse_is_inverse(a in 1..BIG) {
            let f = Field::new(BIG).unwrap();
            // BIG is prime
            let inv = f.inv(a).unwrap();
            prop_assert_eq!(f.mul(a, inv), 1);
        }
    }
}
