//! Two-layer splitting: secret into subsecrets, subsecrets into leaf shares
//!
//! Under [`SubsecretPolicy::Additive`] the secret is the field sum of all
//! subsecrets. Under [`SubsecretPolicy::Thresholded`] the subsecrets are
//! themselves Shamir shares of the secret and carry their upper-layer
//! x-coordinate. Either way each subsecret is then Shamir-split into
//! `shares_per_subsecret` leaves with the absolute threshold.

use std::collections::HashMap;

use rand_core::RngCore;
use tracing::{debug, warn};

use crate::config::{SchemeConfig, SubsecretPolicy, shares_per_subsecret};
use crate::error::{Result, ShareError};
use crate::field::Field;
use crate::registry::XCoordinateRegistry;
use crate::shamir::{self, Share};

/// Secrets shorter than this can be brute-forced from their markers
const MIN_SECURE_SECRET_BYTES: usize = 16;

/// Intermediate secret between the secret and the leaf shares
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subsecret<F: Field> {
    /// Upper-layer x-coordinate; `None` under the additive policy
    pub x: Option<F>,
    pub value: Vec<F>,
}

/// Everything the dealer knows after splitting
#[derive(Debug, Clone)]
pub struct SplitOutput<F: Field> {
    pub policy: SubsecretPolicy,
    pub subsecrets: Vec<Subsecret<F>>,
    /// All leaf shares, grouped by subsecret in order
    pub leaves: Vec<Share<F>>,
    /// Leaf x-coordinate to index into `subsecrets`
    pub parent_subsecrets: HashMap<F, usize>,
    /// Leaf shares needed per subsecret
    pub absolute_threshold: usize,
}

impl<F: Field> SplitOutput<F> {
    /// Number of limbs in the secret and in every share
    pub fn limbs(&self) -> usize {
        self.subsecrets.first().map_or(0, |s| s.value.len())
    }

    /// Subsecret a leaf belongs to
    pub fn parent_of(&self, leaf: &Share<F>) -> Option<&Subsecret<F>> {
        self.parent_subsecrets
            .get(&leaf.x)
            .and_then(|&idx| self.subsecrets.get(idx))
    }

    /// Leaves generated from subsecret `index`
    pub fn leaves_of(&self, index: usize) -> impl Iterator<Item = &Share<F>> {
        self.leaves
            .iter()
            .filter(move |leaf| self.parent_subsecrets.get(&leaf.x) == Some(&index))
    }
}

/// Splits `secret` into subsecrets and leaf shares according to `config`
///
/// # Errors
/// - Configuration errors from [`SchemeConfig::validate_split`]
/// - [`ShareError::InvalidConfig`] for an empty secret
/// - [`ShareError::CoordinatesExhausted`] if the field runs out of coordinates
pub fn split<F, R>(
    secret: &[F],
    config: &SchemeConfig,
    registry: &mut XCoordinateRegistry<F>,
    rng: &mut R,
) -> Result<SplitOutput<F>>
where
    F: Field,
    R: RngCore + ?Sized,
{
    config.validate_split()?;
    if secret.is_empty() {
        return Err(ShareError::InvalidConfig(
            "Secret must have at least one limb".into(),
        ));
    }
    if secret.len() * F::BYTES < MIN_SECURE_SECRET_BYTES {
        warn!(
            limbs = secret.len(),
            field = F::NAME,
            "secret shorter than {MIN_SECURE_SECRET_BYTES} bytes; markers are brute-forceable"
        );
    }

    let subsecrets = match config.policy {
        SubsecretPolicy::Additive => additive_subsecrets(secret, config.subsecrets, rng),
        SubsecretPolicy::Thresholded { .. } => {
            let threshold = config.subsecret_threshold().unwrap_or(config.subsecrets);
            shamir::split(secret, threshold, config.subsecrets, registry, rng)?
                .into_iter()
                .map(|share| Subsecret {
                    x: Some(share.x),
                    value: share.y,
                })
                .collect()
        }
    };

    let per_subsecret = config.shares_per_subsecret();
    let mut leaves = Vec::with_capacity(per_subsecret * subsecrets.len());
    let mut parent_subsecrets = HashMap::with_capacity(per_subsecret * subsecrets.len());
    for (index, subsecret) in subsecrets.iter().enumerate() {
        let shares = shamir::split(
            &subsecret.value,
            config.absolute_threshold,
            per_subsecret,
            registry,
            rng,
        )?;
        for share in shares {
            parent_subsecrets.insert(share.x, index);
            leaves.push(share);
        }
    }

    debug!(
        policy = ?config.policy,
        subsecrets = subsecrets.len(),
        leaves = leaves.len(),
        per_subsecret,
        "secret split"
    );

    Ok(SplitOutput {
        policy: config.policy,
        subsecrets,
        leaves,
        parent_subsecrets,
        absolute_threshold: config.absolute_threshold,
    })
}

/// `count - 1` random subsecrets plus the one that makes the sum equal `secret`
fn additive_subsecrets<F, R>(secret: &[F], count: usize, rng: &mut R) -> Vec<Subsecret<F>>
where
    F: Field,
    R: RngCore + ?Sized,
{
    let mut subsecrets: Vec<Subsecret<F>> = (1..count)
        .map(|_| Subsecret {
            x: None,
            value: (0..secret.len()).map(|_| F::random(rng)).collect(),
        })
        .collect();

    let last = secret
        .iter()
        .enumerate()
        .map(|(limb, &s)| {
            subsecrets
                .iter()
                .fold(s, |acc, subsecret| acc - subsecret.value[limb])
        })
        .collect();
    subsecrets.push(Subsecret { x: None, value: last });
    subsecrets
}

/// Recombines subsecrets into the secret
///
/// Sums additive subsecrets and interpolates thresholded ones at zero.
pub fn combine_subsecrets<F: Field>(subsecrets: &[Subsecret<F>]) -> Result<Vec<F>> {
    let first = subsecrets
        .first()
        .ok_or(ShareError::InsufficientShares { needed: 1, got: 0 })?;
    let limbs = first.value.len();
    if !subsecrets.iter().all(|s| s.value.len() == limbs) {
        return Err(ShareError::InconsistentShareLength);
    }

    if subsecrets.iter().all(|s| s.x.is_none()) {
        let mut sum = vec![F::zero(); limbs];
        for subsecret in subsecrets {
            for (acc, &v) in sum.iter_mut().zip(&subsecret.value) {
                *acc = *acc + v;
            }
        }
        return Ok(sum);
    }

    let points = subsecrets
        .iter()
        .map(|s| s.x.map(|x| Share::new(x, s.value.clone())))
        .collect::<Option<Vec<_>>>()
        .ok_or(ShareError::InvalidShareFormat)?;
    shamir::reconstruct(&points)
}

/// Shares per subsecret for a planning query, rejecting a zero result
fn planned_shares_per_subsecret(percentage: u32, threshold: usize) -> Result<usize> {
    if percentage == 0 || percentage > 100 {
        return Err(ShareError::InvalidPercentage {
            name: "leaves threshold",
            value: percentage,
        });
    }
    match shares_per_subsecret(threshold, percentage) {
        0 => Err(ShareError::InvalidThreshold(threshold)),
        n => Ok(n),
    }
}

/// One step of the subsecret-count search
struct Probe {
    subsecrets: usize,
    per_trustee: usize,
    remainder: usize,
    total: usize,
}

/// Walks candidate subsecret counts from 2 upwards until the per-trustee
/// share count exceeds `cap`, skipping counts with fewer shares than trustees
fn probes(
    cap: usize,
    per_subsecret: usize,
    trustees: usize,
) -> impl Iterator<Item = Probe> {
    let start = trustees.div_ceil(per_subsecret).max(2);
    (start..)
        .map(move |subsecrets| {
            let total = per_subsecret * subsecrets;
            Probe {
                subsecrets,
                per_trustee: total / trustees,
                remainder: total % trustees,
                total,
            }
        })
        .take_while(move |probe| probe.per_trustee <= cap)
}

fn check_planning(trustees: usize) -> Result<()> {
    if trustees == 0 {
        return Err(ShareError::InvalidTrustees(trustees));
    }
    Ok(())
}

/// Subsecret count that leaves the fewest filler shares at one below `cap` shares per trustee
///
/// Returns 2 when no count qualifies. When a count fills every trustee with
/// exactly `cap` shares, the answer is one more than the best count found so
/// far.
pub fn ideal_no_of_subsecrets(
    cap: usize,
    percentage: u32,
    trustees: usize,
    threshold: usize,
) -> Result<usize> {
    check_planning(trustees)?;
    let per_subsecret = planned_shares_per_subsecret(percentage, threshold)?;

    let mut output = 2;
    let mut fewest_filler: Option<usize> = None;
    for probe in probes(cap, per_subsecret, trustees) {
        if probe.per_trustee == cap && probe.remainder == 0 {
            output += 1;
            break;
        }
        if Some(probe.per_trustee) == cap.checked_sub(1) && probe.remainder != 0 {
            let filler = (probe.per_trustee + 1) * trustees - probe.total;
            if fewest_filler.is_none_or(|best| filler < best) {
                fewest_filler = Some(filler);
                output = probe.subsecrets;
            }
        }
    }
    Ok(output)
}

/// Smallest subsecret count giving one below `cap` shares per trustee, 2 if none does
pub fn least_no_of_subsecrets(
    cap: usize,
    percentage: u32,
    trustees: usize,
    threshold: usize,
) -> Result<usize> {
    check_planning(trustees)?;
    let per_subsecret = planned_shares_per_subsecret(percentage, threshold)?;

    for probe in probes(cap, per_subsecret, trustees) {
        if probe.per_trustee == cap && probe.remainder == 0 {
            return Ok(3);
        }
        if Some(probe.per_trustee) == cap.checked_sub(1) && probe.remainder != 0 {
            return Ok(probe.subsecrets);
        }
    }
    Ok(2)
}

/// Every subsecret count that fits under `cap` shares per trustee
///
/// Includes counts giving one below `cap` with a remainder, and the first
/// count reaching exactly `cap` if it divides evenly.
pub fn all_possible_subsecrets(
    cap: usize,
    percentage: u32,
    trustees: usize,
    threshold: usize,
) -> Result<Vec<usize>> {
    check_planning(trustees)?;
    let per_subsecret = planned_shares_per_subsecret(percentage, threshold)?;

    let mut counts = Vec::new();
    for probe in probes(cap, per_subsecret, trustees) {
        if probe.per_trustee == cap {
            if probe.remainder == 0 {
                counts.push(probe.subsecrets);
            }
            break;
        }
        if Some(probe.per_trustee) == cap.checked_sub(1) && probe.remainder != 0 {
            counts.push(probe.subsecrets);
        }
    }
    Ok(counts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finite_field::Gf65536;
    use crate::limbs::key_bytes_to_limbs;
    use crate::scalar_field::Ed25519Scalar;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    fn additive_config() -> SchemeConfig {
        SchemeConfig::new(25, 3)
            .with_subsecrets(8)
            .unwrap()
            .with_percentage_leaves_threshold(80)
            .unwrap()
    }

    #[test]
    fn test_additive_split_sums_to_secret() {
        let mut rng = ChaCha20Rng::seed_from_u64(21);
        let mut registry = XCoordinateRegistry::new();
        let secret = key_bytes_to_limbs(b"sixteen byte key");
        let output = split(&secret, &additive_config(), &mut registry, &mut rng).unwrap();

        assert_eq!(output.subsecrets.len(), 8);
        assert_eq!(output.leaves.len(), 24);
        assert_eq!(output.limbs(), secret.len());
        assert!(output.subsecrets.iter().all(|s| s.x.is_none()));
        assert_eq!(combine_subsecrets(&output.subsecrets).unwrap(), secret);
        assert_eq!(registry.len(), 24);
    }

    #[test]
    fn test_leaves_rebuild_their_parent() {
        let mut rng = ChaCha20Rng::seed_from_u64(22);
        let mut registry = XCoordinateRegistry::new();
        let secret = key_bytes_to_limbs(b"another secret key");
        let output = split(&secret, &additive_config(), &mut registry, &mut rng).unwrap();

        for (index, subsecret) in output.subsecrets.iter().enumerate() {
            let leaves: Vec<_> = output.leaves_of(index).cloned().collect();
            assert_eq!(leaves.len(), 3);
            assert_eq!(shamir::reconstruct(&leaves).unwrap(), subsecret.value);
            assert_eq!(output.parent_of(&leaves[0]), Some(subsecret));
        }
    }

    #[test]
    fn test_thresholded_split() {
        let mut rng = ChaCha20Rng::seed_from_u64(23);
        let mut registry = XCoordinateRegistry::new();
        let secret = vec![Ed25519Scalar::random(&mut rng)];
        let config = SchemeConfig::new(10, 2)
            .with_subsecrets(5)
            .unwrap()
            .with_policy(SubsecretPolicy::Thresholded { percentage: 60 })
            .unwrap();
        let output = split(&secret, &config, &mut registry, &mut rng).unwrap();

        assert!(output.subsecrets.iter().all(|s| s.x.is_some()));
        // ceil(60 * 5 / 100) = 3 subsecrets suffice
        assert_eq!(combine_subsecrets(&output.subsecrets[2..5]).unwrap(), secret);
        assert_ne!(combine_subsecrets(&output.subsecrets[0..2]).unwrap(), secret);
        // Upper-layer coordinates come from the same registry as the leaves
        assert_eq!(registry.len(), 5 + 5 * 2);
    }

    #[test]
    fn test_split_rejects_bad_percentage() {
        let mut rng = ChaCha20Rng::seed_from_u64(24);
        let mut registry = XCoordinateRegistry::<Gf65536>::new();
        let mut config = additive_config();
        config.percentage_leaves_threshold = 120;
        assert!(matches!(
            split(&[Gf65536(1)], &config, &mut registry, &mut rng),
            Err(ShareError::InvalidPercentage { value: 120, .. })
        ));
    }

    #[test]
    fn test_split_rejects_empty_secret() {
        let mut rng = ChaCha20Rng::seed_from_u64(26);
        let mut registry = XCoordinateRegistry::<Gf65536>::new();
        assert!(matches!(
            split(&[], &additive_config(), &mut registry, &mut rng),
            Err(ShareError::InvalidConfig(_))
        ));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_split_exhausts_small_field() {
        let mut rng = ChaCha20Rng::seed_from_u64(25);
        let mut registry = XCoordinateRegistry::<Gf65536>::new();
        for v in 1..=65500u16 {
            registry.insert(Gf65536(v));
        }
        let config = SchemeConfig::new(10, 5)
            .with_subsecrets(10)
            .unwrap()
            .with_percentage_leaves_threshold(50)
            .unwrap();
        assert!(matches!(
            split(&key_bytes_to_limbs(b"sixteen byte key"), &config, &mut registry, &mut rng),
            Err(ShareError::CoordinatesExhausted { .. })
        ));
    }

    #[test]
    fn test_ideal_no_of_subsecrets() {
        // 3 shares per subsecret over 25 trustees, at most 2 per trustee
        assert_eq!(ideal_no_of_subsecrets(2, 80, 25, 3).unwrap(), 16);
        // No count qualifies: the default is returned
        assert_eq!(ideal_no_of_subsecrets(1, 80, 25, 3).unwrap(), 2);
        // Exact fit at the cap bumps the running answer by one
        assert_eq!(ideal_no_of_subsecrets(1, 100, 6, 3).unwrap(), 3);
    }

    #[test]
    fn test_least_no_of_subsecrets() {
        assert_eq!(least_no_of_subsecrets(2, 80, 25, 3).unwrap(), 9);
        assert_eq!(least_no_of_subsecrets(1, 80, 25, 3).unwrap(), 2);
        assert_eq!(least_no_of_subsecrets(0, 80, 25, 3).unwrap(), 2);
    }

    #[test]
    fn test_all_possible_subsecrets() {
        assert_eq!(
            all_possible_subsecrets(2, 80, 25, 3).unwrap(),
            (9..=16).collect::<Vec<_>>()
        );
        assert!(all_possible_subsecrets(1, 80, 25, 3).unwrap().is_empty());
        assert_eq!(all_possible_subsecrets(1, 100, 6, 3).unwrap(), vec![2]);
    }

    #[test]
    fn test_planning_rejects_bad_input() {
        assert!(ideal_no_of_subsecrets(2, 0, 25, 3).is_err());
        assert!(least_no_of_subsecrets(2, 80, 0, 3).is_err());
        assert!(all_possible_subsecrets(2, 80, 25, 0).is_err());
    }
}
