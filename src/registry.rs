use std::collections::HashSet;

use rand_core::RngCore;

use crate::error::{Result, ShareError};
use crate::field::Field;

/// Session-scoped set of x-coordinates already handed out
///
/// Every share, filler share and hint fragment produced within one session
/// draws its x-coordinate from the same registry, so no two shares anywhere in
/// the session collide and zero is never issued.
///
/// # Example
/// ```
/// use anonymity_share::{Gf65536, XCoordinateRegistry};
/// use rand::SeedableRng;
/// use rand_chacha::ChaCha20Rng;
///
/// let mut rng = ChaCha20Rng::seed_from_u64(1);
/// let mut registry = XCoordinateRegistry::<Gf65536>::new();
/// let xs = registry.allocate_many(10, &mut rng).unwrap();
/// assert_eq!(registry.len(), 10);
/// assert!(xs.iter().all(|x| registry.contains(x)));
/// ```
#[derive(Debug, Clone)]
pub struct XCoordinateRegistry<F: Field> {
    used: HashSet<F>,
}

impl<F: Field> Default for XCoordinateRegistry<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: Field> XCoordinateRegistry<F> {
    pub fn new() -> Self {
        Self {
            used: HashSet::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.used.len()
    }

    pub fn is_empty(&self) -> bool {
        self.used.is_empty()
    }

    pub fn contains(&self, x: &F) -> bool {
        self.used.contains(x)
    }

    /// Coordinates still available, `None` for unbounded fields
    pub fn remaining(&self) -> Option<usize> {
        F::coordinate_space().map(|space| space.saturating_sub(self.used.len()))
    }

    /// Draws one fresh non-zero coordinate and records it
    pub fn allocate<R: RngCore + ?Sized>(&mut self, rng: &mut R) -> Result<F> {
        self.ensure_available(1)?;
        loop {
            let x = F::random(rng);
            if !x.is_zero() && self.used.insert(x) {
                return Ok(x);
            }
        }
    }

    /// Draws `count` fresh coordinates, failing up front if the field cannot supply them
    pub fn allocate_many<R: RngCore + ?Sized>(&mut self, count: usize, rng: &mut R) -> Result<Vec<F>> {
        self.ensure_available(count)?;
        (0..count).map(|_| self.allocate(rng)).collect()
    }

    /// Records a coordinate chosen elsewhere; returns `false` if it was already used
    pub fn insert(&mut self, x: F) -> bool {
        !x.is_zero() && self.used.insert(x)
    }

    pub fn iter(&self) -> impl Iterator<Item = &F> {
        self.used.iter()
    }

    fn ensure_available(&self, requested: usize) -> Result<()> {
        match self.remaining() {
            Some(available) if available < requested => {
                Err(ShareError::CoordinatesExhausted { requested, available })
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finite_field::Gf65536;
    use crate::scalar_field::Ed25519Scalar;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    #[test]
    fn test_allocations_are_unique_and_nonzero() {
        let mut rng = ChaCha20Rng::seed_from_u64(3);
        let mut registry = XCoordinateRegistry::<Gf65536>::new();
        let xs = registry.allocate_many(5000, &mut rng).unwrap();
        let unique: HashSet<_> = xs.iter().copied().collect();
        assert_eq!(unique.len(), 5000);
        assert!(!unique.contains(&Gf65536(0)));
        assert_eq!(registry.remaining(), Some(65535 - 5000));
    }

    #[test]
    fn test_exhaustion() {
        let mut rng = ChaCha20Rng::seed_from_u64(4);
        let mut registry = XCoordinateRegistry::<Gf65536>::new();
        for v in 1..=65530u16 {
            assert!(registry.insert(Gf65536(v)));
        }
        assert!(matches!(
            registry.allocate_many(6, &mut rng),
            Err(ShareError::CoordinatesExhausted {
                requested: 6,
                available: 5
            })
        ));
        // The failed request leaves the registry untouched
        assert_eq!(registry.len(), 65530);

        let last = registry.allocate_many(5, &mut rng).unwrap();
        assert!(last.iter().all(|x| x.0 > 65530));
        assert!(registry.allocate(&mut rng).is_err());
    }

    #[test]
    fn test_insert_rejects_duplicates_and_zero() {
        let mut registry = XCoordinateRegistry::<Gf65536>::new();
        assert!(registry.insert(Gf65536(9)));
        assert!(!registry.insert(Gf65536(9)));
        assert!(!registry.insert(Gf65536(0)));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_unbounded_field() {
        let mut rng = ChaCha20Rng::seed_from_u64(5);
        let mut registry = XCoordinateRegistry::<Ed25519Scalar>::new();
        assert_eq!(registry.remaining(), None);
        let xs = registry.allocate_many(100, &mut rng).unwrap();
        assert_eq!(xs.len(), 100);
        assert_eq!(registry.len(), 100);
    }
}
