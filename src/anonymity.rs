//! Mixing real packets into a larger set of decoys
//!
//! The recovering user sees only an [`AnonymitySet`]: `a` entries of identical
//! shape, `n` of which belong to trustees. Which positions are real is known
//! to the dealer alone.

use rand::seq::{SliceRandom, index};
use rand_core::RngCore;
use tracing::debug;

use crate::config::Placement;
use crate::error::{Result, ShareError};
use crate::field::Field;
use crate::packet::{PacketLayout, SharePacket, SharePackets};
use crate::registry::XCoordinateRegistry;

/// Real and decoy packets in their published order
#[derive(Debug, Clone)]
pub struct AnonymitySet<F: Field> {
    pub entries: Vec<SharePacket<F>>,
    pub layout: PacketLayout,
}

impl<F: Field> AnonymitySet<F> {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, position: usize) -> Option<&SharePacket<F>> {
        self.entries.get(position)
    }

    /// Checks that `order` only names entries of this set
    pub fn check_access_order(&self, order: &[usize]) -> Result<()> {
        match order.iter().find(|&&p| p >= self.entries.len()) {
            Some(&index) => Err(ShareError::InvalidAccessOrder {
                index,
                size: self.entries.len(),
            }),
            None => Ok(()),
        }
    }
}

/// Anonymity set plus the dealer-only map from trustee to position
#[derive(Debug, Clone)]
pub struct AnonymityPacking<F: Field> {
    pub set: AnonymitySet<F>,
    /// `trustee_positions[i]` is where trustee `i`'s packet sits in the set
    pub trustee_positions: Vec<usize>,
}

/// Pads `packets` with decoys up to `size` entries
///
/// # Errors
/// - [`ShareError::AnonymitySetTooSmall`] if `size` is below the trustee count
/// - [`ShareError::CoordinatesExhausted`] if decoy shares cannot get coordinates
pub fn build_anonymity_set<F, R>(
    packets: SharePackets<F>,
    size: usize,
    placement: Placement,
    registry: &mut XCoordinateRegistry<F>,
    rng: &mut R,
) -> Result<AnonymityPacking<F>>
where
    F: Field,
    R: RngCore + ?Sized,
{
    let trustees = packets.packets.len();
    if size < trustees {
        return Err(ShareError::AnonymitySetTooSmall { size, trustees });
    }

    let trustee_positions: Vec<usize> = match placement {
        Placement::Random => index::sample(rng, size, trustees).into_vec(),
        Placement::WorstCase => (size - trustees..size).collect(),
    };

    let layout = packets.layout;
    let mut slots: Vec<Option<SharePacket<F>>> = (0..size).map(|_| None).collect();
    for (packet, &position) in packets.packets.into_iter().zip(&trustee_positions) {
        slots[position] = Some(packet);
    }
    let entries = slots
        .into_iter()
        .map(|slot| match slot {
            Some(packet) => Ok(packet),
            None => SharePacket::decoy(&layout, registry, rng),
        })
        .collect::<Result<Vec<_>>>()?;

    debug!(
        size,
        trustees,
        decoys = size - trustees,
        ?placement,
        "anonymity set built"
    );
    Ok(AnonymityPacking {
        set: AnonymitySet { entries, layout },
        trustee_positions,
    })
}

/// A uniformly random permutation of `0..size`
pub fn random_access_order<R: RngCore + ?Sized>(size: usize, rng: &mut R) -> Vec<usize> {
    let mut order: Vec<usize> = (0..size).collect();
    order.shuffle(rng);
    order
}

/// Front-to-back order `0..size`
pub fn sequential_access_order(size: usize) -> Vec<usize> {
    (0..size).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SchemeConfig;
    use crate::finite_field::Gf65536;
    use crate::limbs::key_bytes_to_limbs;
    use crate::packet::build_share_packets;
    use crate::subsecret;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;
    use std::collections::HashSet;

    fn packets(
        rng: &mut ChaCha20Rng,
        registry: &mut XCoordinateRegistry<Gf65536>,
    ) -> SharePackets<Gf65536> {
        let config = SchemeConfig::new(5, 2).with_subsecrets(3).unwrap();
        let secret = key_bytes_to_limbs(b"sixteen byte key");
        let split = subsecret::split(&secret, &config, registry, rng).unwrap();
        build_share_packets(&secret, &split, &config, registry, rng).unwrap()
    }

    #[test]
    fn test_random_placement() {
        let mut rng = ChaCha20Rng::seed_from_u64(61);
        let mut registry = XCoordinateRegistry::new();
        let real = packets(&mut rng, &mut registry);
        let originals = real.packets.clone();
        let packing =
            build_anonymity_set(real, 20, Placement::Random, &mut registry, &mut rng).unwrap();

        assert_eq!(packing.set.len(), 20);
        let distinct: HashSet<_> = packing.trustee_positions.iter().collect();
        assert_eq!(distinct.len(), 5);
        for (original, &position) in originals.iter().zip(&packing.trustee_positions) {
            assert_eq!(&packing.set.entries[position], original);
        }

        let expected = packing.set.layout.encoded_len::<Gf65536>();
        assert!(packing.set.entries.iter().all(|e| e.to_bytes().len() == expected));
    }

    #[test]
    fn test_worst_case_placement() {
        let mut rng = ChaCha20Rng::seed_from_u64(62);
        let mut registry = XCoordinateRegistry::new();
        let real = packets(&mut rng, &mut registry);
        let packing =
            build_anonymity_set(real, 12, Placement::WorstCase, &mut registry, &mut rng).unwrap();
        assert_eq!(packing.trustee_positions, vec![7, 8, 9, 10, 11]);
    }

    #[test]
    fn test_coordinates_unique_across_set() {
        let mut rng = ChaCha20Rng::seed_from_u64(63);
        let mut registry = XCoordinateRegistry::new();
        let real = packets(&mut rng, &mut registry);
        let packing =
            build_anonymity_set(real, 30, Placement::Random, &mut registry, &mut rng).unwrap();

        let xs: Vec<_> = packing
            .set
            .entries
            .iter()
            .flat_map(|e| e.shares.iter().map(|s| s.x))
            .collect();
        let distinct: HashSet<_> = xs.iter().collect();
        assert_eq!(distinct.len(), xs.len());
        assert!(xs.iter().all(|x| registry.contains(x)));
    }

    #[test]
    fn test_set_smaller_than_trustees_rejected() {
        let mut rng = ChaCha20Rng::seed_from_u64(64);
        let mut registry = XCoordinateRegistry::new();
        let real = packets(&mut rng, &mut registry);
        assert!(matches!(
            build_anonymity_set(real, 4, Placement::Random, &mut registry, &mut rng),
            Err(ShareError::AnonymitySetTooSmall {
                size: 4,
                trustees: 5
            })
        ));
    }

    #[test]
    fn test_access_orders() {
        let mut rng = ChaCha20Rng::seed_from_u64(65);
        let mut order = random_access_order(50, &mut rng);
        order.sort_unstable();
        assert_eq!(order, sequential_access_order(50));
    }
}
