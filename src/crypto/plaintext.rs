use std::fmt;

use num_bigint::BigUint;
use num_traits::One;
use rand::Rng;

use crate::math::random_biguint_below;

/// Integers modulo the plaintext prime `p` of a context.
///
/// Elements are plain `BigUint`s in canonical form `[0, p)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaintextRing {
    modulus: BigUint,
}

impl PlaintextRing {
    pub(crate) fn new(modulus: BigUint) -> Self {
        Self { modulus }
    }

    pub fn modulus(&self) -> &BigUint {
        &self.modulus
    }

    /// Canonical representative of `value`.
    pub fn element(&self, value: impl Into<BigUint>) -> BigUint {
        let value: BigUint = value.into();
        value % &self.modulus
    }

    pub fn add(&self, a: &BigUint, b: &BigUint) -> BigUint {
        (a + b) % &self.modulus
    }

    pub fn sub(&self, a: &BigUint, b: &BigUint) -> BigUint {
        let b = b % &self.modulus;
        (a + &self.modulus - b) % &self.modulus
    }

    pub fn mul(&self, a: &BigUint, b: &BigUint) -> BigUint {
        (a * b) % &self.modulus
    }

    pub fn neg(&self, a: &BigUint) -> BigUint {
        self.sub(&BigUint::ZERO, a)
    }

    pub fn product<'a, I>(&self, factors: I) -> BigUint
    where
        I: IntoIterator<Item = &'a BigUint>,
    {
        factors
            .into_iter()
            .fold(BigUint::one() % &self.modulus, |acc, x| self.mul(&acc, x))
    }

    pub fn random<R: Rng + ?Sized>(&self, rng: &mut R) -> BigUint {
        random_biguint_below(&self.modulus, rng)
    }
}

impl fmt::Display for PlaintextRing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Z/{}Z", self.modulus)
    }
}
