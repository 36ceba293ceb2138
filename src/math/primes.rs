//! Prime utilities for deriving the plaintext modulus `p` and the encoding
//! modulus `q`.
//!
//! Word-sized candidates go through a deterministic Miller-Rabin test with a
//! fixed base set. Larger candidates are first sieved by trial division with
//! small primes, then run through Miller-Rabin with random bases drawn from the
//! caller's generator, so the whole prime search replays exactly under a fixed
//! seed.
//!
//! Reference:
//! https://en.wikipedia.org/wiki/Miller%E2%80%93Rabin_primality_test

use num_bigint::BigUint;
use num_integer::Integer;
use num_traits::{One, ToPrimitive, Zero};
use rand::Rng;

use super::sampling::{random_biguint_below, random_biguint_with_bits};

// These bases are deterministic for all n < 318,665,857,834,031,151,167,461,
// which covers all u64 values.
// Source: https://miller-rabin.appspot.com/
const MILLER_RABIN_BASES: [u64; 12] = [2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37];

const SMALL_PRIMES: [u64; 24] = [
    3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47, 53, 59, 61, 67, 71, 73, 79, 83,
    89, 97,
];

/// Random-base rounds for multi-word candidates; error probability `<= 4^-40`.
pub const BIG_PRIME_ROUNDS: usize = 40;

/// Computes `(a * b) mod modulus` using `u128` intermediate arithmetic.
fn mul_mod(a: u64, b: u64, modulus: u64) -> u64 {
    assert!(modulus > 0, "mul_mod: modulus must be positive");
    ((a as u128 * b as u128) % modulus as u128) as u64
}

/// Computes `base^exp mod modulus` via binary exponentiation.
fn mod_pow(mut base: u64, mut exp: u64, modulus: u64) -> u64 {
    assert!(modulus > 0, "mod_pow: modulus must be positive");
    if modulus == 1 {
        return 0;
    }
    let mut acc = 1 % modulus;
    base %= modulus;
    while exp > 0 {
        if exp & 1 == 1 {
            acc = mul_mod(acc, base, modulus);
        }
        base = mul_mod(base, base, modulus);
        exp >>= 1;
    }
    acc
}

/// Returns `(odd_part, power_of_two)` such that `n = odd_part * 2^power_of_two`.
fn decompose(n: u64) -> (u64, u32) {
    assert!(n > 0, "decompose: n must be positive");
    let mut d = n;
    let mut r = 0;
    while d & 1 == 0 {
        d >>= 1;
        r += 1;
    }
    (d, r)
}

/// Returns `true` if `n` is prime using deterministic Miller-Rabin on `u64`.
pub fn is_prime(n: u64) -> bool {
    match n {
        0 | 1 => return false,
        2 | 3 => return true,
        _ if n & 1 == 0 => return false,
        _ => {}
    }

    let (d, r) = decompose(n - 1);
    'bases: for &a in MILLER_RABIN_BASES.iter() {
        if a >= n {
            continue;
        }
        let mut x = mod_pow(a, d, n);
        if x == 1 || x == n - 1 {
            continue;
        }
        for _ in 1..r {
            x = mul_mod(x, x, n);
            if x == n - 1 {
                continue 'bases;
            }
        }
        return false;
    }
    true
}

/// Probabilistic primality test for arbitrary-size candidates.
///
/// Values that fit in a `u64` are answered exactly by [`is_prime`].
pub fn is_probable_prime<R: Rng + ?Sized>(n: &BigUint, rounds: usize, rng: &mut R) -> bool {
    if let Some(small) = n.to_u64() {
        return is_prime(small);
    }
    if n.is_even() {
        return false;
    }
    for &p in &SMALL_PRIMES {
        if (n % p).is_zero() {
            return false;
        }
    }

    let one = BigUint::one();
    let two = BigUint::from(2u32);
    let n_minus_one = n - &one;
    let Some(r) = n_minus_one.trailing_zeros() else {
        return false;
    };
    let d = &n_minus_one >> r;
    // Bases are drawn from [2, n - 2].
    let base_span = n - 3u32;

    'rounds: for _ in 0..rounds {
        let a = random_biguint_below(&base_span, rng) + &two;
        let mut x = a.modpow(&d, n);
        if x == one || x == n_minus_one {
            continue;
        }
        for _ in 1..r {
            x = (&x * &x) % n;
            if x == n_minus_one {
                continue 'rounds;
            }
        }
        return false;
    }
    true
}

/// Samples a prime with exactly `bits` bits, i.e. in `[2^(bits-1), 2^bits)`.
///
/// Returns `None` if no prime was found within `max_attempts` candidates.
///
/// # Panics
///
/// Panics if `bits < 2`.
pub fn random_prime<R: Rng + ?Sized>(
    bits: u64,
    max_attempts: usize,
    rng: &mut R,
) -> Option<BigUint> {
    assert!(bits >= 2, "random_prime: bits must be at least 2");
    for _ in 0..max_attempts {
        let mut candidate = random_biguint_with_bits(bits, rng);
        // Two-bit candidates are 2 and 3, both prime.
        if bits > 2 {
            candidate.set_bit(0, true);
        }
        if is_probable_prime(&candidate, BIG_PRIME_ROUNDS, rng) {
            return Some(candidate);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    const KNOWN_SMALL_PRIMES: [u64; 8] = [2, 3, 5, 7, 11, 13, 17, 19];
    const KNOWN_SMALL_COMPOSITES: [u64; 10] = [0, 1, 4, 6, 8, 9, 10, 12, 15, 16];

    #[test]
    fn test_is_prime_basic() {
        for &prime in &KNOWN_SMALL_PRIMES {
            assert!(is_prime(prime));
        }
        for &composite in &KNOWN_SMALL_COMPOSITES {
            assert!(!is_prime(composite));
        }
    }

    #[test]
    fn mul_mod_matches_widened_reference() {
        let a = u64::MAX - 11;
        let b = u64::MAX - 17;
        let modulus = 1_073_750_017u64;
        let expected = ((a as u128 * b as u128) % modulus as u128) as u64;
        assert_eq!(mul_mod(a, b, modulus), expected);
    }

    #[test]
    fn mod_pow_handles_edge_cases() {
        assert_eq!(mod_pow(2, 0, 17), 1);
        assert_eq!(mod_pow(5, 0, 1), 0);
        assert_eq!(mod_pow(0, 5, 17), 0);
        assert_eq!(mod_pow(7, 1, 19), 7);
    }

    #[test]
    fn decompose_splits_power_of_two_factor() {
        assert_eq!(decompose(24), (3, 3));
        assert_eq!(decompose(1), (1, 0));
    }

    #[test]
    fn test_is_prime_tricky_composites() {
        // Carmichael numbers and strong pseudoprimes for small base sets.
        let tricky = [561u64, 1_105, 1_729, 3_215_031_751];
        for &n in &tricky {
            assert!(!is_prime(n), "expected composite: {n}");
        }
    }

    #[test]
    fn big_test_agrees_with_word_test_on_small_values() {
        let mut rng = ChaCha20Rng::seed_from_u64(7);
        for n in 0u64..500 {
            assert_eq!(
                is_probable_prime(&BigUint::from(n), BIG_PRIME_ROUNDS, &mut rng),
                is_prime(n),
                "mismatch at {n}"
            );
        }
    }

    #[test]
    fn big_test_recognises_mersenne_127() {
        let mut rng = ChaCha20Rng::seed_from_u64(1);
        let m127 = (BigUint::one() << 127u32) - 1u32;
        assert!(is_probable_prime(&m127, BIG_PRIME_ROUNDS, &mut rng));
        let m128 = (BigUint::one() << 128u32) - 1u32;
        assert!(!is_probable_prime(&m128, BIG_PRIME_ROUNDS, &mut rng));
        // 2^127 - 1 squared is composite with no small factor.
        let square = &m127 * &m127;
        assert!(!is_probable_prime(&square, BIG_PRIME_ROUNDS, &mut rng));
    }

    #[test]
    fn random_prime_has_requested_bit_length() {
        let mut rng = ChaCha20Rng::seed_from_u64(42);
        for bits in [2u64, 8, 21, 64, 130] {
            let p = random_prime(bits, 10_000, &mut rng).unwrap();
            assert_eq!(p.bits(), bits);
            assert!(is_probable_prime(&p, BIG_PRIME_ROUNDS, &mut rng));
        }
    }

    #[test]
    fn random_prime_replays_under_fixed_seed() {
        let a = random_prime(200, 10_000, &mut ChaCha20Rng::seed_from_u64(9));
        let b = random_prime(200, 10_000, &mut ChaCha20Rng::seed_from_u64(9));
        assert_eq!(a, b);
    }

    #[test]
    #[should_panic(expected = "random_prime: bits must be at least 2")]
    fn random_prime_panics_on_one_bit() {
        let mut rng = ChaCha20Rng::seed_from_u64(0);
        let _ = random_prime(1, 10, &mut rng);
    }
}
