//! Benchmarks for multiplication, inversion and elimination.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use zpmat::blocked::{alt_mul, blk_mul, strassen};
use zpmat::gauss::{basic_inv, blk_inv, elim_basic, elim_blk};
use zpmat::matrix::naive::basic_mul;
use zpmat::{Field, ImageMode, Mat};

const P: u64 = 8_388_593;

fn random_mat(rng: &mut ChaCha8Rng, n: usize, m: usize, p: u64) -> Mat {
    Mat::from_fn(n, m, |_, _| rng.gen_range(0..p))
}

fn bench_multiplication(c: &mut Criterion) {
    let f = Field::new(P).unwrap();
    let mut rng = ChaCha8Rng::seed_from_u64(1);
    let mut group = c.benchmark_group("mul");

    for size in [64, 256, 512] {
        let a = random_mat(&mut rng, size, size, P);
        let b = random_mat(&mut rng, size, size, P);
        let mut out = Mat::zeros(size, size);

        group.bench_with_input(BenchmarkId::new("basic", size), &size, |bench, _| {
            bench.iter(|| basic_mul(&f, out.view_mut(), black_box(a.view()), b.view()))
        });
        group.bench_with_input(BenchmarkId::new("alt u64", size), &size, |bench, _| {
            bench.iter(|| alt_mul::<u64>(&f, out.view_mut(), black_box(a.view()), b.view()))
        });
        group.bench_with_input(BenchmarkId::new("blk u64", size), &size, |bench, _| {
            bench.iter(|| blk_mul::<u64>(&f, out.view_mut(), black_box(a.view()), b.view()))
        });
        group.bench_with_input(BenchmarkId::new("blk f64", size), &size, |bench, _| {
            bench.iter(|| blk_mul::<f64>(&f, out.view_mut(), black_box(a.view()), b.view()))
        });
        group.bench_with_input(BenchmarkId::new("strassen/64", size), &size, |bench, _| {
            bench.iter(|| strassen(&f, out.view_mut(), black_box(a.view()), b.view(), 64))
        });
    }

    group.finish();
}

fn bench_inverse(c: &mut Criterion) {
    let f = Field::new(P).unwrap();
    let mut rng = ChaCha8Rng::seed_from_u64(2);
    let mut group = c.benchmark_group("inv");

    for size in [64, 256] {
        let a = random_mat(&mut rng, size, size, P);

        group.bench_with_input(BenchmarkId::new("basic", size), &size, |bench, _| {
            bench.iter(|| basic_inv(&f, black_box(a.view()), false))
        });
        group.bench_with_input(BenchmarkId::new("blk f64", size), &size, |bench, _| {
            bench.iter(|| blk_inv::<f64>(&f, black_box(a.view()), false))
        });
    }

    group.finish();
}

fn bench_kernel(c: &mut Criterion) {
    let f = Field::new(P).unwrap();
    let mut rng = ChaCha8Rng::seed_from_u64(3);
    let mut group = c.benchmark_group("kernel");

    for size in [128, 384] {
        // rank size/2
        let l = random_mat(&mut rng, size, size / 2, P);
        let r = random_mat(&mut rng, size / 2, size, P);
        let a = zpmat::multiply(&f, &l, &r).unwrap();

        group.bench_with_input(BenchmarkId::new("basic", size), &size, |bench, _| {
            bench.iter(|| elim_basic(&f, black_box(a.view()), size, ImageMode::Skip, true))
        });
        group.bench_with_input(BenchmarkId::new("blk u64", size), &size, |bench, _| {
            bench.iter(|| elim_blk::<u64>(&f, black_box(a.view()), size, ImageMode::Skip, true))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_multiplication, bench_inverse, bench_kernel);
criterion_main!(benches);
