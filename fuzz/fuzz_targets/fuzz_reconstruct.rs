#![no_main]

use anonymity_share::{Gf65536, Share, shamir};
use libfuzzer_sys::fuzz_target;

// Arbitrary shares must make reconstruct return Ok or Err, never panic:
// duplicate and zero x-coordinates, ragged limb counts, empty input.
fuzz_target!(|data: &[u8]| {
    if data.len() < 2 {
        return;
    }

    let count = (data[0] % 16) as usize;
    let limbs = (data[1] % 8) as usize;
    let mut words = data[2..]
        .chunks(2)
        .map(|c| u16::from_be_bytes([c[0], *c.get(1).unwrap_or(&0)]));

    let mut shares = Vec::with_capacity(count);
    for i in 0..count {
        let Some(x) = words.next() else { break };
        // Every third share gets one limb fewer
        let len = if i % 3 == 2 { limbs.saturating_sub(1) } else { limbs };
        let y = (0..len).map(|_| Gf65536(words.next().unwrap_or(0))).collect();
        shares.push(Share::new(Gf65536(x), y));
    }

    let _ = shamir::reconstruct(&shares);
    let _ = shamir::reconstruct::<Gf65536>(&[]);
    if let Some(first) = shares.first() {
        let _ = shamir::reconstruct(&[first.clone(), first.clone()]);
    }
});
