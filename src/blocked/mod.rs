//! Matrix multiplication drivers.
//!
//! - `gemm`: base cases (inner-product "alt" and panel-blocked) and the
//!   shape-based chooser between them and the scalar loop.
//! - `strassen`: Winograd-scheduled recursion that bottoms out in the
//!   base cases once a dimension drops to the crossover.

pub mod gemm;
pub mod strassen;

pub use gemm::{alt_mul, blk_mul, mul_base};
pub use strassen::{mul_strassen, strassen};
