//! Reduction primitives for a word-sized modulus.
//!
//! All reducers take an unreduced value plus precomputed reciprocals and
//! return the canonical remainder. They assume `p < 2^60`, which keeps every
//! intermediate remainder below `2^62`.

/// High 128 bits of a 128×128-bit product.
#[inline(always)]
pub(crate) fn mulhi_u128(x: u128, y: u128) -> u128 {
    const LO: u128 = u64::MAX as u128;

    let (x0, x1) = (x & LO, x >> 64);
    let (y0, y1) = (y & LO, y >> 64);

    let ll = x0 * y0;
    let lh = x0 * y1;
    let hl = x1 * y0;
    let hh = x1 * y1;

    // < 3 * 2^64, no overflow
    let mid = (ll >> 64) + (lh & LO) + (hl & LO);
    hh + (lh >> 64) + (hl >> 64) + (mid >> 64)
}

/// `x mod p` for a single word, with `m = floor(2^64 / p)`.
///
/// The estimated quotient undershoots by at most one, so one conditional
/// subtraction suffices.
#[inline(always)]
pub(crate) fn barrett_u64(x: u64, p: u64, m: u64) -> u64 {
    let q = ((x as u128 * m as u128) >> 64) as u64;
    let r = x - q * p;
    if r >= p { r - p } else { r }
}

/// `x mod p` for a double word, with `mu = floor((2^128 - 1) / p)`.
///
/// Values whose high word is zero take the single-word path.
#[inline(always)]
pub(crate) fn barrett_u128(x: u128, p: u64, m: u64, mu: u128) -> u64 {
    if x >> 64 == 0 {
        return barrett_u64(x as u64, p, m);
    }
    let q = mulhi_u128(x, mu);
    let mut r = x.wrapping_sub(q.wrapping_mul(p as u128));
    while r >= p as u128 {
        r -= p as u128;
    }
    r as u64
}

/// Shoup's precomputed quotient for multiplying by a fixed `b < p`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MulPrecon {
    pub(crate) b: u64,
    pub(crate) bq: u64,
}

impl MulPrecon {
    #[inline]
    pub(crate) fn new(b: u64, p: u64) -> Self {
        let bq = (((b as u128) << 64) / p as u128) as u64;
        Self { b, bq }
    }

    /// The multiplier this was prepared from.
    #[inline]
    pub fn value(&self) -> u64 {
        self.b
    }

    /// `a * b mod p` for any `a < 2^64`.
    #[inline(always)]
    pub(crate) fn apply(&self, a: u64, p: u64) -> u64 {
        let q = ((a as u128 * self.bq as u128) >> 64) as u64;
        let r = a.wrapping_mul(self.b).wrapping_sub(q.wrapping_mul(p));
        if r >= p { r - p } else { r }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const P: u64 = (1 << 60) - 93;

    fn consts(p: u64) -> (u64, u128) {
        (((1u128 << 64) / p as u128) as u64, u128::MAX / p as u128)
    }

    #[test]
    fn test_mulhi_edges() {
        assert_eq!(mulhi_u128(u128::MAX, u128::MAX), u128::MAX - 1);
        assert_eq!(mulhi_u128(1 << 64, 1 << 64), 1);
        assert_eq!(mulhi_u128(3, 5), 0);
    }

    #[test]
    fn test_barrett_extremes() {
        for p in [2u64, 3, 7, 65_537, (1 << 31) - 1, P] {
            let (m, mu) = consts(p);
            assert_eq!(barrett_u64(u64::MAX, p, m), u64::MAX % p);
            assert_eq!(barrett_u64(0, p, m), 0);
            assert_eq!(barrett_u128(u128::MAX, p, m, mu), (u128::MAX % p as u128) as u64);
            let sq = (p as u128 - 1) * (p as u128 - 1);
            assert_eq!(barrett_u128(sq, p, m, mu), (sq % p as u128) as u64);
        }
    }

    proptest! {
        #[test]
        fn barrett_u128_matches_rem(x in any::<u128>()) {
            let (m, mu) = consts(P);
            prop_assert_eq!(barrett_u128(x, P, m, mu), (x % P as u128) as u64);
        }

        #[test]
        fn precon_matches_rem(a in 0..P, b in 0..P) {
            let pre = MulPrecon::new(b, P);
            let want = (a as u128 * b as u128 % P as u128) as u64;
            prop_assert_eq!(pre.apply(a, P), want);
        }
    }
}
