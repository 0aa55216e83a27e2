#![no_main]

use std::sync::LazyLock;

use anonymity_share::prelude::*;
use libfuzzer_sys::fuzz_target;

static PACKING: LazyLock<(SchemeConfig, AnonymityPacking<Gf65536>)> = LazyLock::new(|| {
    let config = SchemeConfig::new(4, 2)
        .with_subsecrets(2)
        .unwrap()
        .with_anonymity_set_size(12);
    let mut session = Session::<Gf65536>::from_seed(0);
    let packing = session
        .share(&key_bytes_to_limbs(b"fuzzed access!!!"), &config)
        .unwrap();
    (config, packing)
});

// Any access order, including repeats and out-of-range positions, must
// either be rejected or end in a well-formed report.
fuzz_target!(|data: &[u8]| {
    let (config, packing) = &*PACKING;
    let order: Vec<usize> = data.iter().take(64).map(|&b| (b % 16) as usize).collect();
    let params = config.recovery_params();

    match recover(&packing.set, &order, &params) {
        Ok(report) => {
            assert!(report.packets_queried <= order.len());
            if let Some(secret) = report.secret {
                assert_eq!(secret, key_bytes_to_limbs(b"fuzzed access!!!"));
            }
        }
        Err(e) => assert!(matches!(e, ShareError::InvalidAccessOrder { .. })),
    }
});
