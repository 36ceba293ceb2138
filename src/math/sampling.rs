use num_bigint::BigUint;
use num_traits::Zero;
use rand::Rng;
use rand_distr::{Distribution, Uniform};

/// Samples a uniform integer in `[0, bound)` by rejection on the bit length
/// of `bound`.
///
/// # Panics
///
/// Panics if `bound == 0`.
pub fn random_biguint_below<R: Rng + ?Sized>(bound: &BigUint, rng: &mut R) -> BigUint {
    assert!(
        !bound.is_zero(),
        "random_biguint_below: bound must be positive"
    );
    let bits = bound.bits();
    loop {
        let candidate = random_biguint_bits(bits, rng);
        if &candidate < bound {
            return candidate;
        }
    }
}

/// Samples a uniform integer in `[0, 2^bits)`.
pub fn random_biguint_bits<R: Rng + ?Sized>(bits: u64, rng: &mut R) -> BigUint {
    if bits == 0 {
        return BigUint::zero();
    }
    let byte_len = bits.div_ceil(8) as usize;
    let mut bytes = vec![0u8; byte_len];
    rng.fill(&mut bytes[..]);
    let excess = (byte_len as u64) * 8 - bits;
    if excess > 0 {
        // Little-endian: the last byte holds the most significant bits.
        bytes[byte_len - 1] &= 0xff >> excess;
    }
    BigUint::from_bytes_le(&bytes)
}

/// Samples an integer with exactly `bits` bits (top bit forced to one).
///
/// # Panics
///
/// Panics if `bits == 0`.
pub fn random_biguint_with_bits<R: Rng + ?Sized>(bits: u64, rng: &mut R) -> BigUint {
    assert!(bits > 0, "random_biguint_with_bits: bits must be positive");
    let mut value = random_biguint_bits(bits, rng);
    value.set_bit(bits - 1, true);
    value
}

/// Samples a uniform non-zero residue in `[1, modulus)`.
///
/// # Panics
///
/// Panics if `modulus < 2`.
pub fn random_nonzero_residue<R: Rng + ?Sized>(modulus: &BigUint, rng: &mut R) -> BigUint {
    assert!(
        modulus > &BigUint::from(1u32),
        "random_nonzero_residue: modulus must be at least 2"
    );
    let span = modulus - 1u32;
    random_biguint_below(&span, rng) + 1u32
}

/// Samples a small non-negative error term in `[0, 2^bits)`.
///
/// These are the `e` of a numerator `a + e*g`; uniform small coefficients
/// stand in for a discrete Gaussian.
///
/// # Panics
///
/// Panics if `bits` is zero or larger than 63.
pub fn small_error<R: Rng + ?Sized>(bits: u32, rng: &mut R) -> u64 {
    assert!(
        (1..64).contains(&bits),
        "small_error: bits must be in [1, 63], got {bits}"
    );
    let distribution = Uniform::new(0u64, 1u64 << bits)
        .unwrap_or_else(|_| panic!("small_error: invalid range [0, 2^{bits})"));
    distribution.sample(rng)
}
