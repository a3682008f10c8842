//! AVX2+FMA kernels for the `f64` accumulator.
//!
//! Every operand is an integer below `2^53`, so fused and unfused sums are
//! both exact and the order of accumulation does not change the result.

/// True when the CPU can run the kernels in this module.
#[inline]
pub fn available() -> bool {
    #[cfg(target_arch = "x86_64")]
    {
        is_x86_feature_detected!("avx2") && is_x86_feature_detected!("fma")
    }
    #[cfg(not(target_arch = "x86_64"))]
    {
        false
    }
}

/// `x[j] += Σ_{i<n} a[i] * bt[j*32 + i]` for `j < 32`.
///
/// Each output is a dot product of `a` with one row of the transposed
/// block, four lanes at a time, folded horizontally at the end.
///
/// # Safety
///
/// Caller must ensure:
/// - CPU supports AVX2 and FMA
/// - `x.len() >= 32`, `a.len() >= n`, `bt.len() >= 32 * 32`, `n <= 32`
#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2,fma")]
#[allow(unsafe_op_in_unsafe_fn)]
pub unsafe fn muladd_row_avx2(x: &mut [f64], a: &[f64], bt: &[f64], n: usize) {
    use super::BLK;
    use std::arch::x86_64::*;

    debug_assert!(x.len() >= BLK && a.len() >= n && bt.len() >= BLK * BLK && n <= BLK);

    let n4 = n & !3;
    let ap = a.as_ptr();

    for j in 0..BLK {
        let bp = bt.as_ptr().add(j * BLK);

        // Two independent chains hide the FMA latency
        let mut acc0 = _mm256_setzero_pd();
        let mut acc1 = _mm256_setzero_pd();
        let mut i = 0;
        while i + 8 <= n4 {
            acc0 = _mm256_fmadd_pd(_mm256_loadu_pd(ap.add(i)), _mm256_loadu_pd(bp.add(i)), acc0);
            acc1 = _mm256_fmadd_pd(
                _mm256_loadu_pd(ap.add(i + 4)),
                _mm256_loadu_pd(bp.add(i + 4)),
                acc1,
            );
            i += 8;
        }
        if i < n4 {
            acc0 = _mm256_fmadd_pd(_mm256_loadu_pd(ap.add(i)), _mm256_loadu_pd(bp.add(i)), acc0);
        }
        let acc = _mm256_add_pd(acc0, acc1);

        let lo = _mm256_castpd256_pd128(acc);
        let hi = _mm256_extractf128_pd(acc, 1);
        let pair = _mm_add_pd(lo, hi);
        let mut sum = _mm_cvtsd_f64(_mm_add_sd(pair, _mm_unpackhi_pd(pair, pair)));

        for k in n4..n {
            sum += *ap.add(k) * *bp.add(k);
        }
        *x.get_unchecked_mut(j) += sum;
    }
}

/// `x[i] += y[i] * c` over `min(x.len(), y.len())` entries.
///
/// # Safety
///
/// Caller must ensure the CPU supports AVX2 and FMA.
#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2,fma")]
#[allow(unsafe_op_in_unsafe_fn)]
pub unsafe fn muladd_interval_avx2(x: &mut [f64], y: &[f64], c: f64) {
    use std::arch::x86_64::*;

    let len = x.len().min(y.len());
    let len4 = len & !3;
    let xp = x.as_mut_ptr();
    let yp = y.as_ptr();
    let cv = _mm256_set1_pd(c);

    let mut i = 0;
    while i < len4 {
        let xv = _mm256_loadu_pd(xp.add(i));
        let yv = _mm256_loadu_pd(yp.add(i));
        _mm256_storeu_pd(xp.add(i), _mm256_fmadd_pd(yv, cv, xv));
        i += 4;
    }
    for k in len4..len {
        *xp.add(k) += *yp.add(k) * c;
    }
}
