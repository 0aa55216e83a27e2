use std::time::Instant;

use anonymity_share::prelude::*;
use anonymity_share::{ideal_no_of_subsecrets, least_no_of_subsecrets};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();

    println!("=== Anonymity Set Recovery Walkthrough ===\n");

    let (trustees, threshold, percentage) = (25, 3, 80);
    let ideal = ideal_no_of_subsecrets(2, percentage, trustees, threshold)?;
    let least = least_no_of_subsecrets(2, percentage, trustees, threshold)?;
    println!("Trustees: {trustees}, threshold: {threshold}, leaves threshold: {percentage}%");
    println!("Subsecret counts for at most 2 shares per trustee: least {least}, ideal {ideal}\n");

    let secret_bytes = b"walkthrough key!";
    let secret = key_bytes_to_limbs(secret_bytes);

    for placement in [Placement::Random, Placement::WorstCase] {
        let config = SchemeConfig::new(trustees, threshold)
            .with_subsecrets(least)?
            .with_percentage_leaves_threshold(percentage)?
            .with_anonymity_set_size(100)
            .with_placement(placement)
            .with_mode(RecoveryMode::Parallel { workers: 4 });

        let mut session = Session::<Gf65536>::new()?;
        let packing = session.share(&secret, &config)?;
        println!("Placement {:?}", placement);
        println!(
            "  {} entries, {} shares per entry, real packets at {:?}",
            packing.set.len(),
            packing.set.layout.max_shares_per_person,
            packing.trustee_positions
        );

        let order = session.random_access_order(packing.set.len());
        let started = Instant::now();
        let report = recover(&packing.set, &order, &config.recovery_params())?;
        println!(
            "  {:?} after {} entries, {} subsecrets, {:.2?}",
            report.state,
            report.packets_queried,
            report.subsecrets_recovered,
            started.elapsed()
        );
        println!(
            "  Recovered key matches: {}\n",
            limbs_to_key_bytes(&report.secret_or_zero()) == secret_bytes
        );
    }

    println!("With a hint layer (3 of 5 hint fragments needed)");
    let config = SchemeConfig::new(10, 2)
        .with_subsecrets(4)?
        .with_hints(5, 3)?
        .with_anonymity_set_size(40);
    let mut session = Session::<Gf65536>::new()?;
    let packing = session.share(&secret, &config)?;
    let order = session.random_access_order(packing.set.len());
    let report = recover(&packing.set, &order, &config.recovery_params())?;
    println!(
        "  {:?} after {} entries, hint key recovered: {}",
        report.state, report.packets_queried, report.hint_key_recovered
    );

    Ok(())
}
