//! Variant selection for multiplication and elimination.
//!
//! These are pure functions of the shape, the modulus and the pool size.
//! Each one logs its decision at `debug` level.

use crate::field::Field;
use crate::kernels::{Accumulator, BLK, Backend};
use tracing::debug;

/// Products absorbed per panel step by the blocked routines.
pub const BLOCKED_WIDTH: usize = 4 * BLK;

/// Products absorbed per step by the row-oriented "alt" routines.
pub const ALT_WIDTH: usize = 64;

/// Below this order inversion and triangularization stay scalar.
pub const BASIC_GAUSS_MAX: usize = 16;

/// Base-case multiplication variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MulPlan {
    /// Some dimension is zero.
    Zero,
    /// Scalar i-k-j loop.
    Basic,
    /// Inner products against a transposed copy of B.
    Alt(Backend),
    /// Column panels through the panel kernels.
    Blocked(Backend),
}

/// Inversion / triangularization / elimination variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GaussPlan {
    Basic,
    Alt(Backend),
    Blocked(Backend),
}

/// Accumulator for an inner product of length `l`.
fn alt_backend(field: &Field, l: usize) -> Backend {
    if <u64 as Accumulator>::red_trigger(field) >= l {
        Backend::Integer
    } else {
        Backend::WideInteger
    }
}

/// Picks the base-case multiplication for `(n × l) · (l × m)`.
pub fn mul_plan(field: &Field, n: usize, l: usize, m: usize) -> MulPlan {
    let plan = if n == 0 || l == 0 || m == 0 {
        MulPlan::Zero
    } else if l < BLK {
        MulPlan::Basic
    } else if n / BLK < 4 || l / BLK < 4 || m / BLK < 4 {
        MulPlan::Alt(alt_backend(field, l))
    } else {
        match Backend::select(field, BLOCKED_WIDTH) {
            Some(backend) => MulPlan::Blocked(backend),
            None => MulPlan::Alt(alt_backend(field, l)),
        }
    };
    debug!(n, l, m, ?plan, "mul base plan");
    plan
}

/// True when the base case would run the vectorised float kernels.
pub fn base_uses_float(field: &Field) -> bool {
    Backend::select(field, BLOCKED_WIDTH) == Some(Backend::Float)
}

/// Dimension above which Strassen recursion pays off.
///
/// Higher when the float kernels make the base case cheap; grows with the
/// number of workers since each recursion level serialises more.
pub fn strassen_crossover(use_float: bool, threads: usize) -> usize {
    if threads > 1 {
        if use_float || threads > 8192 / (2 * BLK) {
            8192
        } else {
            800.max(threads * 2 * BLK)
        }
    } else if use_float {
        800
    } else {
        448
    }
}

/// Plan for inverting or triangularizing an `n × n` matrix.
pub fn inv_plan(field: &Field, n: usize) -> GaussPlan {
    let plan = if n < BASIC_GAUSS_MAX {
        GaussPlan::Basic
    } else if n / BLK < 4 {
        alt_plan(field)
    } else {
        match Backend::select(field, BLOCKED_WIDTH) {
            Some(backend) => GaussPlan::Blocked(backend),
            None => GaussPlan::Basic,
        }
    };
    debug!(n, ?plan, "gauss-jordan plan");
    plan
}

fn alt_plan(field: &Field) -> GaussPlan {
    if crate::kernels::avx::available() && Backend::Float.supports(field, ALT_WIDTH) {
        GaussPlan::Alt(Backend::Float)
    } else if Backend::Integer.supports(field, ALT_WIDTH) {
        GaussPlan::Alt(Backend::Integer)
    } else {
        GaussPlan::Alt(Backend::WideInteger)
    }
}

/// Plan for row echelon elimination of `n` rows over the first `w` columns.
pub fn elim_plan(field: &Field, n: usize, w: usize) -> GaussPlan {
    let plan = if n / BLK < 4 || w / BLK < 4 {
        GaussPlan::Basic
    } else {
        match Backend::select(field, BLOCKED_WIDTH) {
            Some(backend) => GaussPlan::Blocked(backend),
            None => GaussPlan::Basic,
        }
    };
    debug!(n, w, ?plan, "elimination plan");
    plan
}
