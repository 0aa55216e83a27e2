//! Abstraction over the two prime-characteristic fields used for sharing
//!
//! Every sharing primitive in this crate is generic over [`Field`]. Secrets
//! longer than one element are split limb by limb, so a secret is a
//! `Vec<F>` and each share carries one y-value per limb.

use std::fmt::Debug;
use std::hash::Hash;
use std::ops::{Add, Mul, Sub};

use rand_core::RngCore;

/// A finite field usable for polynomial secret sharing
pub trait Field:
    Copy
    + Debug
    + PartialEq
    + Eq
    + Hash
    + Send
    + Sync
    + 'static
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
{
    /// Width of the canonical byte encoding
    const BYTES: usize;

    /// Human-readable field name, used in logs
    const NAME: &'static str;

    fn zero() -> Self;

    fn one() -> Self;

    /// Multiplicative inverse, `None` for zero
    fn invert(self) -> Option<Self>;

    /// Division, `None` when `rhs` is zero
    fn div(self, rhs: Self) -> Option<Self> {
        rhs.invert().map(|inv| self * inv)
    }

    /// Uniformly distributed element
    fn random<R: RngCore + ?Sized>(rng: &mut R) -> Self {
        let mut wide = [0u8; 64];
        rng.fill_bytes(&mut wide);
        Self::from_uniform_bytes(&wide)
    }

    /// Maps 64 uniform bytes onto the field with negligible bias
    fn from_uniform_bytes(bytes: &[u8; 64]) -> Self;

    fn from_u64(value: u64) -> Self;

    /// Canonical encoding, exactly [`Field::BYTES`] long
    fn to_bytes(&self) -> Vec<u8>;

    /// Decodes a canonical encoding
    fn from_bytes(bytes: &[u8]) -> Option<Self>;

    /// Number of non-zero elements when the field is small enough to exhaust
    fn coordinate_space() -> Option<usize>;

    fn is_zero(&self) -> bool {
        *self == Self::zero()
    }
}

/// Inverts every element in place with a single field inversion
///
/// Returns `None` if any element is zero, leaving `values` untouched.
pub fn batch_invert<F: Field>(values: &mut [F]) -> Option<()> {
    let mut prefix = Vec::with_capacity(values.len());
    let mut acc = F::one();
    for value in values.iter() {
        if value.is_zero() {
            return None;
        }
        prefix.push(acc);
        acc = acc * *value;
    }

    let mut inv = acc.invert()?;
    for (value, before) in values.iter_mut().zip(prefix).rev() {
        let next = inv * *value;
        *value = inv * before;
        inv = next;
    }
    Some(())
}

/// Concatenates the canonical encodings of `limbs`
pub fn limbs_to_field_bytes<F: Field>(limbs: &[F]) -> Vec<u8> {
    let mut out = Vec::with_capacity(limbs.len() * F::BYTES);
    for limb in limbs {
        out.extend_from_slice(&limb.to_bytes());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finite_field::Gf65536;
    use crate::scalar_field::Ed25519Scalar;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    fn check_batch_invert<F: Field>() {
        let mut rng = ChaCha20Rng::seed_from_u64(7);
        let originals: Vec<F> = (0..9)
            .map(|_| loop {
                let v = F::random(&mut rng);
                if !v.is_zero() {
                    break v;
                }
            })
            .collect();
        let mut inverted = originals.clone();
        batch_invert(&mut inverted).unwrap();
        for (a, inv) in originals.iter().zip(&inverted) {
            assert_eq!(*a * *inv, F::one());
            assert_eq!(a.invert(), Some(*inv));
        }
    }

    #[test]
    fn test_batch_invert_gf65536() {
        check_batch_invert::<Gf65536>();
    }

    #[test]
    fn test_batch_invert_scalar() {
        check_batch_invert::<Ed25519Scalar>();
    }

    #[test]
    fn test_batch_invert_rejects_zero() {
        let mut values = vec![Gf65536::new(3), Gf65536::new(0), Gf65536::new(5)];
        assert!(batch_invert(&mut values).is_none());
        assert_eq!(values[0], Gf65536::new(3));
    }

    #[test]
    fn test_division() {
        let a = Gf65536::new(0x1234);
        let b = Gf65536::new(0x00ff);
        assert_eq!((a * b).div(b), Some(a));
        assert_eq!(a.div(Gf65536::zero()), None);
    }

    #[test]
    fn test_limb_encoding() {
        let limbs = [Gf65536::new(0x0102), Gf65536::new(0xa0b0)];
        assert_eq!(limbs_to_field_bytes(&limbs), vec![0x01, 0x02, 0xa0, 0xb0]);
    }
}
