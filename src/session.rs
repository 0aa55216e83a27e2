use rand::rngs::OsRng;
use rand_chacha::ChaCha20Rng;
use rand_core::SeedableRng;
use tracing::debug;

use crate::anonymity::{self, AnonymityPacking};
use crate::baseline;
use crate::config::SchemeConfig;
use crate::error::{Result, ShareError};
use crate::field::Field;
use crate::hint;
use crate::packet::{self, SharePackets};
use crate::registry::XCoordinateRegistry;
use crate::shamir::Share;
use crate::subsecret::{self, SplitOutput};

/// Dealer-side context for one sharing session
///
/// Owns the randomness source and the x-coordinate registry, so every share,
/// filler share, decoy share and hint fragment produced through the same
/// session has a distinct coordinate. Sessions are independent of each other.
///
/// # Security
///
/// - Randomness comes from a ChaCha20 CSPRNG seeded from the OS
/// - [`Session::from_seed`] is deterministic and meant for tests and simulations
///
/// # Example
/// ```
/// use anonymity_share::prelude::*;
///
/// let config = SchemeConfig::new(5, 2)
///     .with_subsecrets(3)
///     .unwrap()
///     .with_anonymity_set_size(20);
/// let mut session = Session::<Gf65536>::new().unwrap();
/// let secret = key_bytes_to_limbs(b"correct horse battery");
///
/// let split = session.split(&secret, &config).unwrap();
/// let packets = session.build_share_packets(&secret, &split, &config).unwrap();
/// let packing = session.build_anonymity_set(packets, &config).unwrap();
///
/// assert_eq!(packing.set.len(), 20);
/// assert_eq!(packing.trustee_positions.len(), 5);
/// ```
pub struct Session<F: Field> {
    rng: ChaCha20Rng,
    registry: XCoordinateRegistry<F>,
}

impl<F: Field> Session<F> {
    /// Creates a session seeded from the operating system
    pub fn new() -> Result<Self> {
        let rng = ChaCha20Rng::try_from_rng(&mut OsRng)
            .map_err(|e| ShareError::RngError(e.to_string()))?;
        Ok(Self::with_rng(rng))
    }

    /// Creates a reproducible session
    pub fn from_seed(seed: u64) -> Self {
        Self::with_rng(ChaCha20Rng::seed_from_u64(seed))
    }

    fn with_rng(rng: ChaCha20Rng) -> Self {
        Self {
            rng,
            registry: XCoordinateRegistry::new(),
        }
    }

    /// Coordinates handed out so far
    pub fn registry(&self) -> &XCoordinateRegistry<F> {
        &self.registry
    }

    pub fn rng(&mut self) -> &mut ChaCha20Rng {
        &mut self.rng
    }

    /// A uniformly random secret of `limbs` limbs
    pub fn random_secret(&mut self, limbs: usize) -> Vec<F> {
        (0..limbs).map(|_| F::random(&mut self.rng)).collect()
    }

    /// Splits `secret` into subsecrets and leaf shares
    pub fn split(&mut self, secret: &[F], config: &SchemeConfig) -> Result<SplitOutput<F>> {
        subsecret::split(secret, config, &mut self.registry, &mut self.rng)
    }

    /// Packs the leaves into per-trustee packets, adding the hint layer if configured
    pub fn build_share_packets(
        &mut self,
        secret: &[F],
        split: &SplitOutput<F>,
        config: &SchemeConfig,
    ) -> Result<SharePackets<F>> {
        let mut packets =
            packet::build_share_packets(secret, split, config, &mut self.registry, &mut self.rng)?;
        if let Some(hints) = &config.hints {
            hint::apply(&mut packets, hints, &mut self.registry, &mut self.rng)?;
        }
        Ok(packets)
    }

    /// Mixes `packets` into an anonymity set of `config.anonymity_set_size` entries
    pub fn build_anonymity_set(
        &mut self,
        packets: SharePackets<F>,
        config: &SchemeConfig,
    ) -> Result<AnonymityPacking<F>> {
        anonymity::build_anonymity_set(
            packets,
            config.anonymity_set_size,
            config.placement,
            &mut self.registry,
            &mut self.rng,
        )
    }

    /// Split, package and mix in one go after validating the whole configuration
    pub fn share(&mut self, secret: &[F], config: &SchemeConfig) -> Result<AnonymityPacking<F>> {
        config.validate()?;
        let split = self.split(secret, config)?;
        let packets = self.build_share_packets(secret, &split, config)?;
        let packing = self.build_anonymity_set(packets, config)?;
        debug!(
            field = F::NAME,
            coordinates = self.registry.len(),
            "sharing session complete"
        );
        Ok(packing)
    }

    /// A uniformly random access order over `size` entries
    pub fn random_access_order(&mut self, size: usize) -> Vec<usize> {
        anonymity::random_access_order(size, &mut self.rng)
    }

    /// Plain Shamir split with an absolute threshold, for the hashed baseline
    pub fn baseline_split(
        &mut self,
        secret: &[F],
        threshold: usize,
        trustees: usize,
    ) -> Result<Vec<Share<F>>> {
        baseline::split(secret, threshold, trustees, &mut self.registry, &mut self.rng)
    }

    /// Plain Shamir split with a percentage threshold, for the hashed baseline
    pub fn baseline_split_percentage(
        &mut self,
        secret: &[F],
        percentage: u32,
        trustees: usize,
    ) -> Result<Vec<Share<F>>> {
        baseline::split_percentage(secret, percentage, trustees, &mut self.registry, &mut self.rng)
    }

    /// Hides baseline shares among random shares
    pub fn baseline_anonymity_set(
        &mut self,
        shares: Vec<Share<F>>,
        size: usize,
    ) -> Result<Vec<Share<F>>> {
        baseline::anonymity_set(shares, size, &mut self.registry, &mut self.rng)
    }
}
