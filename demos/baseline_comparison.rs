use std::time::Instant;

use anonymity_share::baseline::{self, BaselineStrategy};
use anonymity_share::prelude::*;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();

    println!("=== Subsecret Recovery vs Hashed Baseline ===\n");

    let (trustees, threshold, size) = (8, 3, 16);
    let secret = key_bytes_to_limbs(b"comparison key!!");
    println!("Trustees: {trustees}, threshold: {threshold}, anonymity set: {size}\n");

    let config = SchemeConfig::new(trustees, threshold)
        .with_subsecrets(4)?
        .with_anonymity_set_size(size);
    let mut session = Session::<Gf65536>::new()?;
    let packing = session.share(&secret, &config)?;
    let order = session.random_access_order(packing.set.len());

    let started = Instant::now();
    let report = recover(&packing.set, &order, &config.recovery_params())?;
    println!(
        "Subsecret scheme: {:?} after {} entries in {:.2?}",
        report.state,
        report.packets_queried,
        started.elapsed()
    );

    let shares = session.baseline_split(&secret, threshold, trustees)?;
    let set = session.baseline_anonymity_set(shares, size)?;
    let order = session.random_access_order(set.len());
    let digest = baseline::secret_digest(&secret);

    for (label, strategy) in [
        ("known threshold", BaselineStrategy::KnownThreshold(threshold)),
        ("exhaustive", BaselineStrategy::Exhaustive),
    ] {
        let started = Instant::now();
        match baseline::recover(&set, &order, &digest, strategy, RecoveryMode::Parallel { workers: 4 }) {
            Ok(found) => println!(
                "Baseline ({label}): found after {} entries at threshold {} in {:.2?}",
                found.shares_queried,
                found.threshold,
                started.elapsed()
            ),
            Err(ShareError::SecretNotFound) => println!("Baseline ({label}): secret not found"),
            Err(e) => return Err(e.into()),
        }
    }

    Ok(())
}
