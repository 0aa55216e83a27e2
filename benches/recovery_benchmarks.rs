use std::hint::black_box;

use anonymity_share::baseline::{self, BaselineStrategy};
use anonymity_share::prelude::*;
use criterion::{Criterion, criterion_group, criterion_main};

fn bench_recover(c: &mut Criterion) {
    let mut group = c.benchmark_group("recover");
    group.sample_size(10);
    let secret = key_bytes_to_limbs(b"benchmark secret");

    for (trustees, threshold, subsecrets, size) in [(10usize, 2usize, 4usize, 40usize), (25, 3, 8, 100)] {
        let config = SchemeConfig::new(trustees, threshold)
            .with_subsecrets(subsecrets)
            .unwrap()
            .with_anonymity_set_size(size);
        let mut session = Session::<Gf65536>::from_seed(10);
        let packing = session.share(&secret, &config).unwrap();
        let order = session.random_access_order(packing.set.len());

        for (label, mode) in [
            ("sequential", RecoveryMode::Sequential),
            ("parallel", RecoveryMode::Parallel { workers: 4 }),
        ] {
            let params = config.recovery_params().with_mode(mode);
            group.bench_function(format!("{}_n{}_a{}", label, trustees, size), |b| {
                b.iter(|| {
                    black_box(recover(&packing.set, black_box(&order), &params).unwrap());
                });
            });
        }
    }

    group.finish();
}

fn bench_baseline(c: &mut Criterion) {
    let mut group = c.benchmark_group("baseline");
    group.sample_size(10);
    let secret = key_bytes_to_limbs(b"benchmark secret");
    let digest = baseline::secret_digest(&secret);

    for (trustees, threshold, size) in [(5usize, 3usize, 15usize), (8, 4, 20)] {
        let mut session = Session::<Gf65536>::from_seed(20);
        let shares = session.baseline_split(&secret, threshold, trustees).unwrap();
        let set = session.baseline_anonymity_set(shares, size).unwrap();
        let order = session.random_access_order(set.len());

        for (label, strategy) in [
            ("exhaustive", BaselineStrategy::Exhaustive),
            ("known_threshold", BaselineStrategy::KnownThreshold(threshold)),
        ] {
            group.bench_function(format!("{}_n{}_a{}", label, trustees, size), |b| {
                b.iter(|| {
                    black_box(
                        baseline::recover(
                            &set,
                            black_box(&order),
                            &digest,
                            strategy,
                            RecoveryMode::Sequential,
                        )
                        .unwrap(),
                    );
                });
            });
        }
    }

    group.finish();
}

criterion_group!(benches, bench_recover, bench_baseline);
criterion_main!(benches);
