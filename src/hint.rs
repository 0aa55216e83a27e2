//! Hint layer wrapped around already-built share packets
//!
//! A fresh random key masks every share limb in the trustee packets, so
//! leaf shares are unusable until the key is rebuilt. The key is
//! Shamir-split into `hints` fragments; randomly chosen trustees receive one
//! fragment each, every other entry of the anonymity set carries a random
//! fragment of identical shape. Each trustee packet also carries a marker
//! for the key under the packet's salt.

use rand::seq::index;
use rand_core::RngCore;
use tracing::debug;

use crate::config::HintConfig;
use crate::error::{Result, ShareError};
use crate::field::Field;
use crate::marker::{self, MarkerKind};
use crate::packet::{HintFragment, SharePackets};
use crate::registry::XCoordinateRegistry;
use crate::shamir::{self, Share};

/// Entropy of the hint key
pub const HINT_KEY_BYTES: usize = 16;

/// Limbs needed to hold a hint key over `F`
pub fn hint_key_limbs<F: Field>() -> usize {
    HINT_KEY_BYTES.div_ceil(F::BYTES)
}

/// Dealer-side record of the hint layer
#[derive(Debug, Clone)]
pub struct HintDeal<F: Field> {
    pub key: Vec<F>,
    /// Trustees holding a real fragment
    pub hinted_trustees: Vec<usize>,
}

/// Masks the shares in `packets` and attaches hint fragments
///
/// # Errors
/// - [`ShareError::InvalidHints`] if the hint parameters do not fit the trustees
/// - [`ShareError::CoordinatesExhausted`] if fragments cannot get coordinates
pub fn apply<F, R>(
    packets: &mut SharePackets<F>,
    config: &HintConfig,
    registry: &mut XCoordinateRegistry<F>,
    rng: &mut R,
) -> Result<HintDeal<F>>
where
    F: Field,
    R: RngCore + ?Sized,
{
    let trustees = packets.packets.len();
    if config.threshold == 0 || config.threshold > config.hints || config.hints > trustees {
        return Err(ShareError::InvalidHints {
            hints: config.hints,
            threshold: config.threshold,
            trustees,
        });
    }

    let limbs = hint_key_limbs::<F>();
    let key: Vec<F> = (0..limbs).map(|_| F::random(rng)).collect();
    let mut fragments = shamir::split(&key, config.threshold, config.hints, registry, rng)?
        .into_iter()
        .peekable();
    let hinted_trustees = index::sample(rng, trustees, config.hints).into_vec();

    // Every fragment exists before any packet is touched
    let dealt = (0..trustees)
        .map(|trustee| match fragments.next_if(|_| hinted_trustees.contains(&trustee)) {
            Some(fragment) => Ok(fragment),
            None => Share::random(limbs, registry, rng),
        })
        .collect::<Result<Vec<_>>>()?;

    for (packet, share) in packets.packets.iter_mut().zip(dealt) {
        for leaf in &mut packet.shares {
            mask(&key, leaf);
        }
        packet.hint = Some(HintFragment {
            share,
            marker: marker::seal(MarkerKind::HintKey, &packet.salt, &key, None),
        });
    }
    packets.layout.hint_limbs = Some(limbs);

    debug!(
        hints = config.hints,
        threshold = config.threshold,
        "hint layer applied"
    );
    Ok(HintDeal {
        key,
        hinted_trustees,
    })
}

/// Adds the keyed pad to every limb of `share`
pub fn mask<F: Field>(key: &[F], share: &mut Share<F>) {
    let x = share.x;
    for (limb, y) in share.y.iter_mut().enumerate() {
        *y = *y + marker::hint_pad(key, x, limb);
    }
}

/// Removes the keyed pad added by [`mask`]
pub fn unmask<F: Field>(key: &[F], share: &mut Share<F>) {
    let x = share.x;
    for (limb, y) in share.y.iter_mut().enumerate() {
        *y = *y - marker::hint_pad(key, x, limb);
    }
}
