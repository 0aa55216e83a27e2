//! Hashed brute-force recovery over plain Shamir shares
//!
//! The reference point the subsecret scheme is measured against. The secret
//! is split with a single polynomial and the shares are hidden among random
//! shares of identical shape. Recovery only knows a SHA-256 digest of the
//! secret, so every candidate subset is interpolated and hashed. With an
//! unknown threshold every threshold up to the number of queried entries is
//! tried.

use rand::seq::SliceRandom;
use rand_core::RngCore;
use sha2::{Digest, Sha256};
use tracing::{debug, trace};

use crate::config::RecoveryMode;
use crate::error::{Result, ShareError};
use crate::field::{Field, limbs_to_field_bytes};
use crate::limbs::check_byte_array_equal;
use crate::registry::XCoordinateRegistry;
use crate::shamir::{self, Share};
use crate::subsets::{Combinations, find_first, run_with_mode};

/// What the recovering user knows about the threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaselineStrategy {
    /// Try every threshold from 2 up to the number of queried entries
    Exhaustive,
    /// Only subsets of exactly this size are interpolated
    KnownThreshold(usize),
}

/// Successful outcome of [`recover`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaselineRecovery<F: Field> {
    pub secret: Vec<F>,
    /// Entries of the access order consumed before the digest matched
    pub shares_queried: usize,
    /// Size of the subset that produced the secret
    pub threshold: usize,
}

/// SHA-256 over the canonical limb encoding of `secret`
pub fn secret_digest<F: Field>(secret: &[F]) -> [u8; 32] {
    Sha256::digest(limbs_to_field_bytes(secret)).into()
}

/// Splits `secret` into one share per trustee with an absolute threshold
///
/// # Errors
/// - [`ShareError::InvalidTrustees`] if `trustees` is zero
/// - any error of [`shamir::split`]
pub fn split<F, R>(
    secret: &[F],
    threshold: usize,
    trustees: usize,
    registry: &mut XCoordinateRegistry<F>,
    rng: &mut R,
) -> Result<Vec<Share<F>>>
where
    F: Field,
    R: RngCore + ?Sized,
{
    if trustees == 0 {
        return Err(ShareError::InvalidTrustees(trustees));
    }
    shamir::split(secret, threshold, trustees, registry, rng)
}

/// Splits with threshold `floor(percentage * trustees / 100)`
///
/// # Errors
/// - [`ShareError::InvalidPercentage`] unless `percentage` is in `1..=100`
/// - [`ShareError::InvalidThreshold`] if the derived threshold is zero
pub fn split_percentage<F, R>(
    secret: &[F],
    percentage: u32,
    trustees: usize,
    registry: &mut XCoordinateRegistry<F>,
    rng: &mut R,
) -> Result<Vec<Share<F>>>
where
    F: Field,
    R: RngCore + ?Sized,
{
    if percentage == 0 || percentage > 100 {
        return Err(ShareError::InvalidPercentage {
            name: "baseline threshold",
            value: percentage,
        });
    }
    let threshold = percentage as usize * trustees / 100;
    if threshold == 0 {
        return Err(ShareError::InvalidThreshold(threshold));
    }
    split(secret, threshold, trustees, registry, rng)
}

/// Shuffles `shares` together with random shares up to `size` entries
///
/// A `size` smaller than the number of shares is raised to it.
///
/// # Errors
/// - [`ShareError::InsufficientShares`] if `shares` is empty
/// - [`ShareError::InconsistentShareLength`] if limb counts differ
/// - [`ShareError::CoordinatesExhausted`] if random shares cannot get coordinates
pub fn anonymity_set<F, R>(
    mut shares: Vec<Share<F>>,
    size: usize,
    registry: &mut XCoordinateRegistry<F>,
    rng: &mut R,
) -> Result<Vec<Share<F>>>
where
    F: Field,
    R: RngCore + ?Sized,
{
    let limbs = shares
        .first()
        .map(Share::limbs)
        .ok_or(ShareError::InsufficientShares { needed: 1, got: 0 })?;
    if shares.iter().any(|s| s.limbs() != limbs) {
        return Err(ShareError::InconsistentShareLength);
    }

    let size = size.max(shares.len());
    let real = shares.len();
    for _ in real..size {
        shares.push(Share::random(limbs, registry, rng)?);
    }
    shares.shuffle(rng);
    debug!(size, real, "baseline anonymity set built");
    Ok(shares)
}

/// Queries `set` in `order` until some subset hashes to `digest`
///
/// After each query, subsets made of the newest entry plus `threshold - 1`
/// earlier ones are tried, smallest threshold first.
///
/// # Errors
/// - [`ShareError::InvalidAccessOrder`] if `order` names a missing entry
/// - [`ShareError::InvalidThreshold`] for a known threshold of zero
/// - [`ShareError::SecretNotFound`] if the order is exhausted without a match
/// - [`ShareError::WorkerPoolError`] if the parallel pool cannot start
pub fn recover<F: Field>(
    set: &[Share<F>],
    order: &[usize],
    digest: &[u8; 32],
    strategy: BaselineStrategy,
    mode: RecoveryMode,
) -> Result<BaselineRecovery<F>> {
    if let Some(&index) = order.iter().find(|&&p| p >= set.len()) {
        return Err(ShareError::InvalidAccessOrder {
            index,
            size: set.len(),
        });
    }
    if strategy == BaselineStrategy::KnownThreshold(0) {
        return Err(ShareError::InvalidThreshold(0));
    }

    let found = run_with_mode(mode, |parallel| search(set, order, digest, strategy, parallel))?;
    match &found {
        Some(recovery) => debug!(
            queried = recovery.shares_queried,
            threshold = recovery.threshold,
            "baseline recovery succeeded"
        ),
        None => debug!(queried = order.len(), "baseline recovery exhausted the access order"),
    }
    found.ok_or(ShareError::SecretNotFound)
}

fn search<F: Field>(
    set: &[Share<F>],
    order: &[usize],
    digest: &[u8; 32],
    strategy: BaselineStrategy,
    parallel: bool,
) -> Option<BaselineRecovery<F>> {
    let first = match strategy {
        BaselineStrategy::Exhaustive => 2,
        BaselineStrategy::KnownThreshold(threshold) => threshold,
    };

    for queried in first..=order.len() {
        let newest = &set[order[queried - 1]];
        let thresholds = match strategy {
            BaselineStrategy::Exhaustive => 2..=queried,
            BaselineStrategy::KnownThreshold(threshold) => threshold..=threshold,
        };
        for threshold in thresholds {
            trace!(queried, threshold, "trying baseline subsets");
            let subsets: Vec<Vec<usize>> = Combinations::new(queried - 1, threshold - 1).collect();
            let secret = find_first(parallel, &subsets, |subset| {
                let mut points: Vec<&Share<F>> = subset.iter().map(|&i| &set[order[i]]).collect();
                points.push(newest);
                let candidate = shamir::interpolate(&points).ok()?;
                check_byte_array_equal(&secret_digest(&candidate), digest).then_some(candidate)
            });
            if let Some(secret) = secret {
                return Some(BaselineRecovery {
                    secret,
                    shares_queried: queried,
                    threshold,
                });
            }
        }
    }
    None
}
