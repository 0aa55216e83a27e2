//! Salted verification markers
//!
//! A marker lets whoever holds a candidate value check it against a packet
//! without the packet revealing anything about the value. It is laid out as
//!
//! ```text
//! SHA-256(label || salt || value)  ||  tag XOR SHA-256("pad" || label || salt || value)
//! ```
//!
//! where `tag` is an optional field element bound to the value (the
//! upper-layer x-coordinate of a thresholded subsecret). Decoy markers are
//! uniformly random bytes of the same length.

use rand_core::RngCore;
use sha2::{Digest, Sha256, Sha512};

#[cfg(feature = "zeroize")]
use zeroize::Zeroize;

use crate::field::{Field, limbs_to_field_bytes};
use crate::limbs::check_byte_array_equal;

pub const SALT_LEN: usize = 32;
const DIGEST_LEN: usize = 32;

pub type Salt = [u8; SALT_LEN];

/// What a marker commits to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerKind {
    /// The full secret
    Secret,
    /// One subsecret
    Subsecret,
    /// The hint-layer key
    HintKey,
}

impl MarkerKind {
    fn label(self) -> &'static [u8] {
        match self {
            Self::Secret => b"marker/secret",
            Self::Subsecret => b"marker/subsecret",
            Self::HintKey => b"marker/hint-key",
        }
    }
}

/// Byte length of every marker over `F`
pub fn marker_len<F: Field>() -> usize {
    DIGEST_LEN + F::BYTES
}

/// Candidate value bound to one salt, ready to be checked against markers
///
/// Only the digest is computed up front; the tag pad is derived on a match.
pub struct MarkerProbe {
    digest: [u8; DIGEST_LEN],
    preimage: Vec<u8>,
}

impl MarkerProbe {
    pub fn new<F: Field>(kind: MarkerKind, salt: &Salt, value: &[F]) -> Self {
        let label = kind.label();
        let mut preimage = Vec::with_capacity(label.len() + SALT_LEN + value.len() * F::BYTES);
        preimage.extend_from_slice(label);
        preimage.extend_from_slice(salt);
        preimage.extend_from_slice(&limbs_to_field_bytes(value));

        let mut digest = [0u8; DIGEST_LEN];
        digest.copy_from_slice(&Sha256::digest(&preimage));
        Self { digest, preimage }
    }

    fn pad(&self) -> [u8; DIGEST_LEN] {
        let mut pad = [0u8; DIGEST_LEN];
        pad.copy_from_slice(
            &Sha256::new()
                .chain_update(b"pad")
                .chain_update(&self.preimage)
                .finalize(),
        );
        pad
    }

    /// Builds the marker carrying `tag` (zero when `None`)
    pub fn seal<F: Field>(&self, tag: Option<F>) -> Vec<u8> {
        let tag = tag.unwrap_or_else(F::zero).to_bytes();
        let mut marker = Vec::with_capacity(marker_len::<F>());
        marker.extend_from_slice(&self.digest);
        marker.extend(tag.iter().zip(&self.pad()).map(|(t, p)| t ^ p));
        marker
    }

    /// Finds the first of `markers` this candidate opens
    ///
    /// Returns the recovered tag: `Some(None)` for a zero tag, `Some(Some(x))`
    /// otherwise, and `None` if no marker matches.
    pub fn open<F: Field>(&self, markers: &[Vec<u8>]) -> Option<Option<F>> {
        let marker = markers.iter().find(|m| {
            m.len() == marker_len::<F>() && check_byte_array_equal(&m[..DIGEST_LEN], &self.digest)
        })?;
        let tag: Vec<u8> = marker[DIGEST_LEN..]
            .iter()
            .zip(&self.pad())
            .map(|(t, p)| t ^ p)
            .collect();
        let tag = F::from_bytes(&tag)?;
        Some((!tag.is_zero()).then_some(tag))
    }

    /// True if any of `markers` was sealed for this candidate
    pub fn matches<F: Field>(&self, markers: &[Vec<u8>]) -> bool {
        markers.iter().any(|m| {
            m.len() == marker_len::<F>() && check_byte_array_equal(&m[..DIGEST_LEN], &self.digest)
        })
    }
}

#[cfg(feature = "zeroize")]
impl Drop for MarkerProbe {
    fn drop(&mut self) {
        self.preimage.zeroize();
    }
}

/// Seals `value` under `salt`
pub fn seal<F: Field>(kind: MarkerKind, salt: &Salt, value: &[F], tag: Option<F>) -> Vec<u8> {
    MarkerProbe::new(kind, salt, value).seal(tag)
}

/// Uniformly random bytes with the length of a real marker
pub fn random_marker<F: Field, R: RngCore + ?Sized>(rng: &mut R) -> Vec<u8> {
    let mut marker = vec![0u8; marker_len::<F>()];
    rng.fill_bytes(&mut marker);
    marker
}

pub fn random_salt<R: RngCore + ?Sized>(rng: &mut R) -> Salt {
    let mut salt = [0u8; SALT_LEN];
    rng.fill_bytes(&mut salt);
    salt
}

/// Keyed pad used to mask limb `limb` of the share at `x` in the hint layer
pub fn hint_pad<F: Field>(key: &[F], x: F, limb: usize) -> F {
    let mut key_bytes = limbs_to_field_bytes(key);
    let wide = Sha512::new()
        .chain_update(b"hint-pad")
        .chain_update(&key_bytes)
        .chain_update(x.to_bytes())
        .chain_update((limb as u64).to_be_bytes())
        .finalize();
    #[cfg(feature = "zeroize")]
    key_bytes.zeroize();
    #[cfg(not(feature = "zeroize"))]
    key_bytes.clear();

    let mut bytes = [0u8; 64];
    bytes.copy_from_slice(&wide);
    F::from_uniform_bytes(&bytes)
}
