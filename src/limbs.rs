//! Conversions between byte strings and 16-bit field limbs
//!
//! Keys are packed big-endian into [`Gf65536`] limbs. Key conversion pads the
//! input so the original length can be restored: odd-length keys get a single
//! `0x01`, even-length keys get `0x00 0x00`.

use crate::field::Field;
use crate::finite_field::Gf65536;

/// Packs a key into limbs, appending the length-restoring padding
///
/// # Example
/// ```
/// use anonymity_share::limbs::{key_bytes_to_limbs, limbs_to_key_bytes};
///
/// let key = b"sixteen byte key";
/// let limbs = key_bytes_to_limbs(key);
/// assert_eq!(limbs.len(), 9);
/// assert_eq!(limbs_to_key_bytes(&limbs), key);
/// ```
pub fn key_bytes_to_limbs(key: &[u8]) -> Vec<Gf65536> {
    let mut padded = Vec::with_capacity(key.len() + 2);
    padded.extend_from_slice(key);
    if key.len() % 2 == 1 {
        padded.push(0x01);
    } else {
        padded.extend_from_slice(&[0x00, 0x00]);
    }
    bytes_to_limbs(&padded)
}

/// Inverse of [`key_bytes_to_limbs`]
pub fn limbs_to_key_bytes(limbs: &[Gf65536]) -> Vec<u8> {
    let mut bytes = limbs_to_bytes(limbs);
    match bytes.last() {
        Some(0x01) => {
            bytes.pop();
        }
        Some(_) => {
            bytes.truncate(bytes.len().saturating_sub(2));
        }
        None => {}
    }
    bytes
}

/// Packs bytes two at a time; a trailing odd byte is zero-extended on the right
pub fn bytes_to_limbs(bytes: &[u8]) -> Vec<Gf65536> {
    bytes
        .chunks(2)
        .map(|pair| match *pair {
            [hi, lo] => Gf65536(u16::from_be_bytes([hi, lo])),
            [hi] => Gf65536(u16::from_be_bytes([hi, 0])),
            _ => Gf65536(0),
        })
        .collect()
}

/// Flattens limbs into big-endian bytes
pub fn limbs_to_bytes(limbs: &[Gf65536]) -> Vec<u8> {
    limbs.iter().flat_map(|limb| limb.0.to_be_bytes()).collect()
}

/// Constant-time equality of two limb vectors
pub fn compare_limbs<F: Field>(a: &[F], b: &[F]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let diff = a
        .iter()
        .zip(b)
        .fold(0u8, |acc, (x, y)| acc | constant_time_diff(&x.to_bytes(), &y.to_bytes()));
    diff == 0
}

/// Constant-time equality of two byte strings
pub fn check_byte_array_equal(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && constant_time_diff(a, b) == 0
}

#[inline]
fn constant_time_diff(a: &[u8], b: &[u8]) -> u8 {
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y))
}
