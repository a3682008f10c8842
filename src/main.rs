//! Timing runner for the multiplication and elimination variants.

use std::time::Instant;
use zpmat::blocked::{alt_mul, blk_mul};
use zpmat::matrix::naive::basic_mul;
use zpmat::{Field, Mat, Result};

/// 50-bit prime: forces the u128 paths.
const BIG_P: u64 = 1_125_899_906_842_597;
/// 23-bit prime: small enough for the f64 kernels.
const SMALL_P: u64 = 8_388_593;

fn main() -> Result<()> {
    println!("=== Matrices over Z/pZ ===\n");

    let sizes = [256, 512, 1024];
    let iterations = 3;
    let mut all_results = Vec::new();

    let has_avx2 = is_x86_feature_detected!("avx2") && is_x86_feature_detected!("fma");
    println!(
        "CPU Features: AVX2+FMA={}, threads={}\n",
        has_avx2,
        zpmat::threaded::available_threads()
    );

    let small = Field::new(SMALL_P)?;
    let big = Field::new(BIG_P)?;

    for &size in &sizes {
        println!("Matrix: {}×{}", size, size);
        println!("{}", "-".repeat(50));

        let a = sample(size, SMALL_P, 1);
        let b = sample(size, SMALL_P, 2);
        let a_big = sample(size, BIG_P, 3);
        let b_big = sample(size, BIG_P, 4);

        let results: Vec<(&str, f64)> = vec![
            (
                "basic (i-k-j)",
                time(iterations, || {
                    let mut c = Mat::zeros(size, size);
                    basic_mul(&small, c.view_mut(), a.view(), b.view());
                    Ok(())
                })?,
            ),
            (
                "alt u64",
                time(iterations, || {
                    let mut c = Mat::zeros(size, size);
                    alt_mul::<u64>(&small, c.view_mut(), a.view(), b.view());
                    Ok(())
                })?,
            ),
            (
                "blk u64",
                time(iterations, || {
                    let mut c = Mat::zeros(size, size);
                    blk_mul::<u64>(&small, c.view_mut(), a.view(), b.view())
                })?,
            ),
            (
                "blk f64",
                time(iterations, || {
                    let mut c = Mat::zeros(size, size);
                    blk_mul::<f64>(&small, c.view_mut(), a.view(), b.view())
                })?,
            ),
            (
                "strassen",
                time(iterations, || zpmat::multiply(&small, &a, &b).map(drop))?,
            ),
            (
                "strassen 50-bit",
                time(iterations, || zpmat::multiply(&big, &a_big, &b_big).map(drop))?,
            ),
            (
                "inverse",
                time(iterations, || zpmat::inverse(&small, &a).map(drop))?,
            ),
            (
                "kernel",
                time(iterations, || zpmat::kernel(&small, &a).map(drop))?,
            ),
        ];

        let baseline_time = results[0].1;
        for (i, (name, time_ms)) in results.iter().enumerate() {
            println!(
                "{}. {:16} {:8.2} ms  ({:.1}×)",
                i + 1,
                name,
                time_ms,
                baseline_time / time_ms
            );
        }
        println!();

        all_results.push((size, results));
    }

    print_summary_table(&all_results);
    Ok(())
}

/// Deterministic filler, no rng needed for timing.
fn sample(n: usize, p: u64, seed: u64) -> Mat {
    let mut s = seed;
    Mat::from_fn(n, n, |_, _| {
        s ^= s << 13;
        s ^= s >> 7;
        s ^= s << 17;
        s % p
    })
}

/// Average wall time of `f` in milliseconds, after one warmup run.
fn time<F>(iterations: usize, mut f: F) -> Result<f64>
where
    F: FnMut() -> Result<()>,
{
    f()?;

    let mut total = 0.0;
    for _ in 0..iterations {
        let start = Instant::now();
        f()?;
        total += start.elapsed().as_secs_f64();
    }
    Ok(total / iterations as f64 * 1000.0)
}

fn print_summary_table(all_results: &[(usize, Vec<(&str, f64)>)]) {
    println!("\n{}", "=".repeat(80));
    println!("SUMMARY");
    println!("{}", "=".repeat(80));

    print!("\n{:<18}", "Method");
    for (size, _) in all_results {
        print!(" {:>14}", format!("{}×{}", size, size));
    }
    println!();
    println!("{}", "-".repeat(80));

    let Some((_, first)) = all_results.first() else {
        return;
    };
    for (method_idx, (name, _)) in first.iter().enumerate() {
        print!("{:<18}", name);
        for (_, results) in all_results {
            print!(" {:>11.2} ms", results[method_idx].1);
        }
        println!();
    }

    println!("{}", "=".repeat(80));
    println!("\nSpeedup in the per-size listings is relative to basic (i-k-j).\n");
}
