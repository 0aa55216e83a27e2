//! Polynomial (Shamir) sharing of multi-limb secrets
//!
//! Each limb of the secret is the constant term of its own random polynomial
//! of degree `threshold - 1`; all limbs of one share are evaluated at the same
//! x-coordinate, which is drawn from the session's
//! [`XCoordinateRegistry`](crate::registry::XCoordinateRegistry).

use rand_core::RngCore;
use rayon::prelude::*;

use crate::error::{Result, ShareError};
use crate::field::{Field, batch_invert};
use crate::registry::XCoordinateRegistry;

/// Evaluating more shares than this in one call switches to rayon
const PARALLEL_EVALUATION_THRESHOLD: usize = 64;

/// A point on the sharing polynomials
///
/// `y[j]` is the evaluation of the polynomial hiding limb `j` at `x`.
///
/// # Example
/// ```
/// use anonymity_share::{Gf65536, XCoordinateRegistry, shamir};
/// use rand::SeedableRng;
/// use rand_chacha::ChaCha20Rng;
///
/// let mut rng = ChaCha20Rng::seed_from_u64(9);
/// let mut registry = XCoordinateRegistry::new();
/// let secret = vec![Gf65536(0x1234), Gf65536(0xabcd)];
///
/// let shares = shamir::split(&secret, 3, 5, &mut registry, &mut rng).unwrap();
/// assert_eq!(shares.len(), 5);
/// assert_eq!(shares[0].y.len(), 2);
///
/// let recovered = shamir::reconstruct(&shares[1..4]).unwrap();
/// assert_eq!(recovered, secret);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Share<F: Field> {
    /// x-coordinate, unique within the session
    pub x: F,
    /// One y-value per secret limb
    pub y: Vec<F>,
}

impl<F: Field> Share<F> {
    pub fn new(x: F, y: Vec<F>) -> Self {
        Self { x, y }
    }

    /// A share with a fresh coordinate and uniformly random y-values
    pub fn random<R: RngCore + ?Sized>(
        limbs: usize,
        registry: &mut XCoordinateRegistry<F>,
        rng: &mut R,
    ) -> Result<Self> {
        let x = registry.allocate(rng)?;
        let y = (0..limbs).map(|_| F::random(rng)).collect();
        Ok(Self { x, y })
    }

    /// Number of secret limbs this share covers
    pub fn limbs(&self) -> usize {
        self.y.len()
    }
}

/// Splits `secret` into `total` shares, any `threshold` of which reconstruct it
///
/// Coordinates come from `registry` and are recorded there.
///
/// # Errors
/// - [`ShareError::InvalidShareCount`] if `total` is zero
/// - [`ShareError::InvalidThreshold`] if `threshold` is zero
/// - [`ShareError::ThresholdTooLarge`] if `threshold > total`
/// - [`ShareError::CoordinatesExhausted`] if the field has too few unused coordinates
pub fn split<F, R>(
    secret: &[F],
    threshold: usize,
    total: usize,
    registry: &mut XCoordinateRegistry<F>,
    rng: &mut R,
) -> Result<Vec<Share<F>>>
where
    F: Field,
    R: RngCore + ?Sized,
{
    check_parameters(threshold, total)?;
    let xs = registry.allocate_many(total, rng)?;
    split_at(secret, threshold, &xs, rng)
}

/// Splits `secret` by evaluating fresh polynomials at the given coordinates
///
/// The caller is responsible for the coordinates being distinct and non-zero.
pub fn split_at<F, R>(secret: &[F], threshold: usize, xs: &[F], rng: &mut R) -> Result<Vec<Share<F>>>
where
    F: Field,
    R: RngCore + ?Sized,
{
    check_parameters(threshold, xs.len())?;

    // coefficients[limb * (t - 1) + (j - 1)] multiplies x^j in the polynomial of `limb`
    let degree = threshold - 1;
    let coefficients: Vec<F> = (0..secret.len() * degree).map(|_| F::random(rng)).collect();

    let evaluate = |x: F| Share {
        x,
        y: secret
            .iter()
            .enumerate()
            .map(|(limb, &constant)| {
                let row = &coefficients[limb * degree..(limb + 1) * degree];
                // Horner's method from the highest coefficient down
                row.iter().rev().fold(F::zero(), |acc, &c| acc * x + c) * x + constant
            })
            .collect(),
    };

    let shares = if xs.len() > PARALLEL_EVALUATION_THRESHOLD {
        xs.par_iter().map(|&x| evaluate(x)).collect()
    } else {
        xs.iter().map(|&x| evaluate(x)).collect()
    };
    Ok(shares)
}

/// Reconstructs the secret by Lagrange interpolation at zero over all supplied shares
///
/// With fewer shares than the sharing threshold the result is an unrelated
/// value; callers verify candidates out of band.
///
/// # Errors
/// - [`ShareError::InsufficientShares`] if `shares` is empty
/// - [`ShareError::InconsistentShareLength`] if limb counts differ
/// - [`ShareError::InvalidShareFormat`] on duplicate x-coordinates
pub fn reconstruct<F: Field>(shares: &[Share<F>]) -> Result<Vec<F>> {
    let refs: Vec<&Share<F>> = shares.iter().collect();
    interpolate(&refs)
}

/// Same as [`reconstruct`] over borrowed shares
pub fn interpolate<F: Field>(shares: &[&Share<F>]) -> Result<Vec<F>> {
    let first = shares
        .first()
        .ok_or(ShareError::InsufficientShares { needed: 1, got: 0 })?;
    let limbs = first.y.len();
    if !shares.iter().all(|s| s.y.len() == limbs) {
        return Err(ShareError::InconsistentShareLength);
    }

    let xs: Vec<F> = shares.iter().map(|s| s.x).collect();
    let coefficients = lagrange_coefficients(&xs)?;
    Ok(combine(&coefficients, shares.iter().map(|s| s.y.as_slice()), limbs))
}

/// Lagrange basis polynomials evaluated at zero
///
/// `L_i(0) = prod_{j != i} x_j / (x_j - x_i)`; the denominators are inverted
/// together with one field inversion.
pub(crate) fn lagrange_coefficients<F: Field>(xs: &[F]) -> Result<Vec<F>> {
    let mut denominators = Vec::with_capacity(xs.len());
    let mut numerators = Vec::with_capacity(xs.len());
    for (i, &x_i) in xs.iter().enumerate() {
        let mut numerator = F::one();
        let mut denominator = F::one();
        for (j, &x_j) in xs.iter().enumerate() {
            if i != j {
                numerator = numerator * x_j;
                denominator = denominator * (x_j - x_i);
            }
        }
        numerators.push(numerator);
        denominators.push(denominator);
    }

    // A zero denominator means two shares share an x-coordinate
    batch_invert(&mut denominators).ok_or(ShareError::InvalidShareFormat)?;
    Ok(numerators
        .into_iter()
        .zip(denominators)
        .map(|(n, d)| n * d)
        .collect())
}

/// Weighted sum of y-vectors, limb by limb
pub(crate) fn combine<'a, F, I>(coefficients: &[F], ys: I, limbs: usize) -> Vec<F>
where
    F: Field,
    I: IntoIterator<Item = &'a [F]>,
{
    let mut acc = vec![F::zero(); limbs];
    for (y, &c) in ys.into_iter().zip(coefficients) {
        for (slot, &v) in acc.iter_mut().zip(y) {
            *slot = *slot + c * v;
        }
    }
    acc
}

fn check_parameters(threshold: usize, total: usize) -> Result<()> {
    if total == 0 {
        return Err(ShareError::InvalidShareCount(total));
    }
    if threshold == 0 {
        return Err(ShareError::InvalidThreshold(threshold));
    }
    if threshold > total {
        return Err(ShareError::ThresholdTooLarge {
            threshold,
            total_shares: total,
        });
    }
    Ok(())
}
