//! Parallel-for helpers over rayon's global pool.
//!
//! Every loop in the crate states its total work (`rows × cols` or
//! `rows × cols × depth`) and runs on the calling thread below
//! [`PAR_THRESH`]. Above it, iterations are split across rayon workers; each
//! iteration owns a disjoint item, so no locking is involved.
//!
//! The pool itself is whatever rayon currently runs on. Wrap a call in
//! `ThreadPool::install` to pin it to a specific pool size.

use rayon::prelude::*;

/// Minimum work before a loop is split across threads.
pub const PAR_THRESH: usize = 40_000;

/// Square-root of [`PAR_THRESH`], used for per-row checks on `n × n` work.
pub const PAR_THRESH_SQ: usize = 200;

/// Workers in the current rayon pool.
pub fn available_threads() -> usize {
    rayon::current_num_threads()
}

/// True when `work` is large enough to be worth splitting.
#[inline]
pub fn worth_parallel(work: usize) -> bool {
    work >= PAR_THRESH && available_threads() > 1
}

/// Product of loop extents, saturating instead of overflowing.
#[inline]
pub fn work(dims: &[usize]) -> usize {
    dims.iter().fold(1usize, |acc, &d| acc.saturating_mul(d))
}

/// Runs `f(index, item)` over `items`, in parallel when `work` warrants it.
pub fn for_each_mut<T, F>(items: &mut [T], work: usize, f: F)
where
    T: Send,
    F: Fn(usize, &mut T) + Sync + Send,
{
    if worth_parallel(work) {
        items.par_iter_mut().enumerate().for_each(|(i, t)| f(i, t));
    } else {
        items.iter_mut().enumerate().for_each(|(i, t)| f(i, t));
    }
}

/// Collects `f(i)` for `i` in `0..n`, in parallel when `work` warrants it.
pub fn map_range<R, F>(n: usize, work: usize, f: F) -> Vec<R>
where
    R: Send,
    F: Fn(usize) -> R + Sync + Send,
{
    if worth_parallel(work) {
        (0..n).into_par_iter().map(f).collect()
    } else {
        (0..n).map(f).collect()
    }
}
