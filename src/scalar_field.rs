use std::hash::{Hash, Hasher};
use std::ops::{Add, Mul, Sub};

use curve25519_dalek::scalar::Scalar;

use crate::field::Field;

/// Element of the prime-order scalar field of Curve25519
///
/// The field has order 2^252 + 27742317777372353535851937790883648493, so it
/// never runs out of x-coordinates and a single limb carries a 252-bit secret.
///
/// # Example
/// ```
/// use anonymity_share::{Ed25519Scalar, Field};
///
/// let a = Ed25519Scalar::from_u64(12);
/// let b = Ed25519Scalar::from_u64(30);
/// assert_eq!(a + b, Ed25519Scalar::from_u64(42));
/// assert_eq!(a * a.invert().unwrap(), Ed25519Scalar::one());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ed25519Scalar(pub Scalar);

impl Hash for Ed25519Scalar {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.as_bytes().hash(state);
    }
}

impl Add for Ed25519Scalar {
    type Output = Self;
    #[inline]
    fn add(self, other: Self) -> Self {
        Self(self.0 + other.0)
    }
}

impl Sub for Ed25519Scalar {
    type Output = Self;
    #[inline]
    fn sub(self, other: Self) -> Self {
        Self(self.0 - other.0)
    }
}

impl Mul for Ed25519Scalar {
    type Output = Self;
    #[inline]
    fn mul(self, other: Self) -> Self {
        Self(self.0 * other.0)
    }
}

impl Field for Ed25519Scalar {
    const BYTES: usize = 32;
    const NAME: &'static str = "ed25519 scalar";

    fn zero() -> Self {
        Self(Scalar::ZERO)
    }

    fn one() -> Self {
        Self(Scalar::ONE)
    }

    fn invert(self) -> Option<Self> {
        if self.0 == Scalar::ZERO {
            None
        } else {
            Some(Self(self.0.invert()))
        }
    }

    fn from_uniform_bytes(bytes: &[u8; 64]) -> Self {
        Self(Scalar::from_bytes_mod_order_wide(bytes))
    }

    fn from_u64(value: u64) -> Self {
        Self(Scalar::from(value))
    }

    fn to_bytes(&self) -> Vec<u8> {
        self.0.to_bytes().to_vec()
    }

    fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let raw: [u8; 32] = bytes.try_into().ok()?;
        Option::<Scalar>::from(Scalar::from_canonical_bytes(raw)).map(Self)
    }

    fn coordinate_space() -> Option<usize> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    #[test]
    fn test_arithmetic() {
        let a = Ed25519Scalar::from_u64(7);
        let b = Ed25519Scalar::from_u64(5);
        assert_eq!(a - b, Ed25519Scalar::from_u64(2));
        assert_eq!(a * b, Ed25519Scalar::from_u64(35));
        assert_eq!((a * b).div(b), Some(a));
        assert_eq!(Ed25519Scalar::zero().invert(), None);
    }

    #[test]
    fn test_random_inverse() {
        let mut rng = ChaCha20Rng::seed_from_u64(42);
        for _ in 0..8 {
            let a = Ed25519Scalar::random(&mut rng);
            assert_eq!(a * a.invert().unwrap(), Ed25519Scalar::one());
        }
    }

    #[test]
    fn test_byte_encoding() {
        let mut rng = ChaCha20Rng::seed_from_u64(1);
        let a = Ed25519Scalar::random(&mut rng);
        let bytes = a.to_bytes();
        assert_eq!(bytes.len(), Ed25519Scalar::BYTES);
        assert_eq!(Ed25519Scalar::from_bytes(&bytes), Some(a));
        assert_eq!(Ed25519Scalar::from_bytes(&[0xff; 32]), None);
        assert_eq!(Ed25519Scalar::from_bytes(&[1; 31]), None);
    }

    #[test]
    fn test_unbounded_coordinates() {
        assert_eq!(Ed25519Scalar::coordinate_space(), None);
    }
}
