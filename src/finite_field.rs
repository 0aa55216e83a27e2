use std::ops::{Add, Mul, Sub};

use once_cell::sync::OnceCell;
use rand_core::RngCore;

use crate::error::{Result, ShareError};
use crate::field::Field;

/// Reducing polynomial x^16 + x^12 + x^3 + x + 1
pub const DEFAULT_MODULUS: u32 = 0x1100B;

/// Primitive element modulo [`DEFAULT_MODULUS`]
pub const DEFAULT_GENERATOR: u16 = 2;

const ORDER: usize = 65535;

static TABLES: OnceCell<FieldTables> = OnceCell::new();

/// Log and antilog tables for GF(2^16)
///
/// `exp[i] = g^i` for `i` in `0..65535` and `log[exp[i]] = i`. Built once per
/// process; every multiplication and inversion is two lookups.
pub struct FieldTables {
    generator: u16,
    modulus: u32,
    exp: Vec<u16>,
    log: Vec<u16>,
}

impl FieldTables {
    /// Builds tables by stepping through the powers of `generator`
    ///
    /// # Errors
    /// Returns [`ShareError::NonPrimitiveGenerator`] if the powers of the
    /// generator repeat before covering all 65535 non-zero elements.
    pub fn generate(generator: u16, modulus: u32) -> Result<Self> {
        let not_primitive = ShareError::NonPrimitiveGenerator { generator, modulus };
        if generator == 0 || modulus >> 16 != 1 {
            return Err(not_primitive);
        }

        let mut exp = vec![0u16; ORDER];
        let mut log = vec![0u16; ORDER + 1];
        let mut seen = vec![false; ORDER + 1];
        let mut element: u16 = 1;
        for (i, slot) in exp.iter_mut().enumerate() {
            if seen[element as usize] {
                return Err(not_primitive);
            }
            seen[element as usize] = true;
            *slot = element;
            log[element as usize] = i as u16;
            element = carryless_multiply(element, generator, modulus);
        }
        if element != 1 {
            return Err(not_primitive);
        }

        Ok(Self {
            generator,
            modulus,
            exp,
            log,
        })
    }

    pub fn generator(&self) -> u16 {
        self.generator
    }

    pub fn modulus(&self) -> u32 {
        self.modulus
    }

    #[inline]
    fn mul(&self, a: u16, b: u16) -> u16 {
        if a == 0 || b == 0 {
            return 0;
        }
        let sum = self.log[a as usize] as usize + self.log[b as usize] as usize;
        self.exp[sum % ORDER]
    }

    #[inline]
    fn inv(&self, a: u16) -> Option<u16> {
        if a == 0 {
            return None;
        }
        let l = self.log[a as usize] as usize;
        Some(self.exp[(ORDER - l) % ORDER])
    }

    #[inline]
    fn div(&self, a: u16, b: u16) -> Option<u16> {
        if b == 0 {
            return None;
        }
        if a == 0 {
            return Some(0);
        }
        let diff = ORDER + self.log[a as usize] as usize - self.log[b as usize] as usize;
        Some(self.exp[diff % ORDER])
    }
}

/// Shift-and-add multiplication modulo `modulus`, used only while building tables
fn carryless_multiply(a: u16, b: u16, modulus: u32) -> u16 {
    let mut a = a as u32;
    let mut b = b;
    let mut p: u32 = 0;
    while b != 0 {
        if b & 1 != 0 {
            p ^= a;
        }
        a <<= 1;
        if a & 0x10000 != 0 {
            a ^= modulus;
        }
        b >>= 1;
    }
    p as u16
}

/// Galois Field GF(2^16) element
///
/// Addition is XOR; multiplication goes through log/antilog tables generated
/// from [`DEFAULT_GENERATOR`] and [`DEFAULT_MODULUS`] unless
/// [`Gf65536::initialize_tables_with`] ran first.
///
/// # Example
/// ```
/// use anonymity_share::{Field, Gf65536};
///
/// let a = Gf65536::new(0x1234);
/// let b = Gf65536::new(0xBEEF);
/// assert_eq!((a + b).0, 0x1234 ^ 0xBEEF);
/// assert_eq!(a * a.invert().unwrap(), Gf65536::one());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "zeroize", derive(zeroize::Zeroize))]
pub struct Gf65536(pub u16);

impl Gf65536 {
    #[inline]
    pub fn new(value: u16) -> Self {
        Self(value)
    }

    /// Builds the default tables now instead of on first use
    pub fn initialize_tables() -> Result<&'static FieldTables> {
        Self::initialize_tables_with(DEFAULT_GENERATOR, DEFAULT_MODULUS)
    }

    /// Builds tables from a custom generator and reducing polynomial
    ///
    /// Must run before any arithmetic; the tables are process-wide and
    /// immutable once built.
    ///
    /// # Errors
    /// - [`ShareError::NonPrimitiveGenerator`] if `generator` is not primitive
    /// - [`ShareError::TablesAlreadyInitialized`] if tables with other
    ///   parameters already exist
    pub fn initialize_tables_with(generator: u16, modulus: u32) -> Result<&'static FieldTables> {
        let tables = TABLES.get_or_try_init(|| FieldTables::generate(generator, modulus))?;
        if tables.generator != generator || tables.modulus != modulus {
            return Err(ShareError::TablesAlreadyInitialized);
        }
        Ok(tables)
    }

    #[inline]
    fn tables() -> &'static FieldTables {
        TABLES.get_or_init(default_tables)
    }

    /// Computes `self^exp` by square-and-multiply
    pub fn pow(self, mut exp: u32) -> Self {
        let mut result = Self(1);
        let mut base = self;
        while exp > 0 {
            if exp & 1 == 1 {
                result = result * base;
            }
            base = base * base;
            exp >>= 1;
        }
        result
    }
}

/// Default tables, filled directly from the known-primitive default generator
fn default_tables() -> FieldTables {
    let mut exp = vec![0u16; ORDER];
    let mut log = vec![0u16; ORDER + 1];
    let mut element: u16 = 1;
    for (i, slot) in exp.iter_mut().enumerate() {
        *slot = element;
        log[element as usize] = i as u16;
        element = carryless_multiply(element, DEFAULT_GENERATOR, DEFAULT_MODULUS);
    }
    FieldTables {
        generator: DEFAULT_GENERATOR,
        modulus: DEFAULT_MODULUS,
        exp,
        log,
    }
}

/// Implements addition as XOR in GF(2^16)
impl Add for Gf65536 {
    type Output = Self;
    #[inline]
    fn add(self, other: Self) -> Self {
        #[allow(clippy::suspicious_arithmetic_impl)]
        let result = self.0 ^ other.0;
        Self(result)
    }
}

impl Sub for Gf65536 {
    type Output = Self;
    #[inline]
    fn sub(self, other: Self) -> Self {
        // Characteristic 2: subtraction and addition coincide
        #[allow(clippy::suspicious_arithmetic_impl)]
        let result = self.add(other);
        result
    }
}

impl Mul for Gf65536 {
    type Output = Self;
    #[inline]
    fn mul(self, other: Self) -> Self {
        Self(Self::tables().mul(self.0, other.0))
    }
}

impl Field for Gf65536 {
    const BYTES: usize = 2;
    const NAME: &'static str = "GF(2^16)";

    fn zero() -> Self {
        Self(0)
    }

    fn one() -> Self {
        Self(1)
    }

    fn invert(self) -> Option<Self> {
        Self::tables().inv(self.0).map(Self)
    }

    fn div(self, rhs: Self) -> Option<Self> {
        Self::tables().div(self.0, rhs.0).map(Self)
    }

    fn random<R: RngCore + ?Sized>(rng: &mut R) -> Self {
        Self(rng.next_u32() as u16)
    }

    fn from_uniform_bytes(bytes: &[u8; 64]) -> Self {
        Self(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    fn from_u64(value: u64) -> Self {
        Self(value as u16)
    }

    fn to_bytes(&self) -> Vec<u8> {
        self.0.to_be_bytes().to_vec()
    }

    fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let raw: [u8; 2] = bytes.try_into().ok()?;
        Some(Self(u16::from_be_bytes(raw)))
    }

    fn coordinate_space() -> Option<usize> {
        Some(ORDER)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_addition() {
        let a = Gf65536::new(0x5353);
        let b = Gf65536::new(0xCACA);
        assert_eq!((a + b).0, 0x9999);
        assert_eq!(a - b, a + b);
    }

    #[test]
    fn test_default_generator_is_primitive() {
        let tables = FieldTables::generate(DEFAULT_GENERATOR, DEFAULT_MODULUS).unwrap();
        let defaults = default_tables();
        assert_eq!(tables.exp, defaults.exp);
        assert_eq!(tables.log, defaults.log);
    }

    #[test]
    fn test_non_primitive_generator_rejected() {
        // 1 has order 1
        assert!(matches!(
            FieldTables::generate(1, DEFAULT_MODULUS),
            Err(ShareError::NonPrimitiveGenerator { generator: 1, .. })
        ));
        assert!(FieldTables::generate(0, DEFAULT_MODULUS).is_err());
        // Not a degree-16 polynomial
        assert!(FieldTables::generate(2, 0x11B).is_err());
    }

    #[test]
    fn test_initialize_tables_idempotent() {
        let first = Gf65536::initialize_tables().unwrap();
        let second = Gf65536::initialize_tables().unwrap();
        assert!(std::ptr::eq(first, second));
        assert!(matches!(
            Gf65536::initialize_tables_with(3, DEFAULT_MODULUS),
            Err(ShareError::TablesAlreadyInitialized)
        ));
    }

    #[test]
    fn test_all_inverses() {
        for i in 1..=u16::MAX {
            let a = Gf65536::new(i);
            let inv = a.invert().unwrap();
            assert_eq!(a * inv, Gf65536::one(), "inverse mismatch for {i:#06x}");
        }
        assert_eq!(Gf65536::zero().invert(), None);
    }

    #[test]
    fn test_division_inverts_multiplication() {
        let samples = [1u16, 2, 3, 0x00ff, 0x1234, 0x8000, 0xbeef, 0xffff];
        for &a in &samples {
            for &b in &samples {
                let (a, b) = (Gf65536::new(a), Gf65536::new(b));
                assert_eq!((a * b).div(b), Some(a));
            }
        }
        assert_eq!(Gf65536::zero().div(Gf65536::new(7)), Some(Gf65536::zero()));
    }

    #[test]
    fn test_table_multiply_matches_shift_and_add() {
        let samples = [1u16, 2, 0x0100, 0x1234, 0x8001, 0xfffe];
        for &a in &samples {
            for &b in &samples {
                assert_eq!(
                    (Gf65536::new(a) * Gf65536::new(b)).0,
                    carryless_multiply(a, b, DEFAULT_MODULUS)
                );
            }
        }
    }

    #[test]
    fn test_field_laws() {
        let a = Gf65536::new(0x1357);
        let b = Gf65536::new(0x2468);
        let c = Gf65536::new(0xabcd);
        assert_eq!(a * b, b * a);
        assert_eq!((a * b) * c, a * (b * c));
        assert_eq!(a * (b + c), (a * b) + (a * c));
        assert_eq!(a * Gf65536::one(), a);
        assert_eq!(a * Gf65536::zero(), Gf65536::zero());
        assert_eq!(a.pow(65535), Gf65536::one());
        assert_eq!(a.pow(3), a * a * a);
    }

    #[test]
    fn test_byte_encoding() {
        let a = Gf65536::new(0xa1b2);
        assert_eq!(a.to_bytes(), vec![0xa1, 0xb2]);
        assert_eq!(Gf65536::from_bytes(&[0xa1, 0xb2]), Some(a));
        assert_eq!(Gf65536::from_bytes(&[0xa1]), None);
    }
}
