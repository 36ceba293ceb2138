//! Dimension-one GGH-style graded encodings over `Z_q`.
//!
//! An encoding of `a` at level `S` is `(a + e·p) / Π_{i∈S} z_i mod q`, with
//! `e` small. Levels are raised by multiplying with the public encodings of
//! one `y_i = (1 + e_i·p) / z_i`, so encoding never needs the trapdoor. The
//! zero-test parameter is `p_zt = h · Π z_i / p`; a top-level `u` encodes zero
//! iff `u · p_zt mod q` is shorter than `q^(7/8)`.
//!
//! With ring dimension one the ideal generator `g` is the plaintext modulus
//! `p` itself, which is public. The scheme is therefore not secure; it exists
//! to drive the context layer with real arithmetic. Symmetric grading uses one
//! `z` raised to the degree; asymmetric grading uses one `z_i` per slot.
//!
//! `q` is sized at setup for a fixed noise budget: top-level products of up to
//! [`FACTOR_BUDGET_PER_SLOT`]`·κ + 4` fresh encodings (including the `y_i`
//! factors) zero-test correctly. Longer chains of level-0 products can exceed
//! it.

use num_bigint::BigUint;
use num_traits::One;
use rand::Rng;
use tracing::debug;

use super::secrets::{TrapdoorSecrets, mul_mod_assign};
use super::{EngineError, EngineResult, GradedEngine, SetupParams};
use crate::crypto::{GradingMode, Level};
use crate::math::{
    centered_abs, mod_inverse_prime, random_biguint_below, random_biguint_bits,
    random_nonzero_residue, random_prime, small_error, top_bits,
};

/// Width of the error terms `e`.
pub const DEFAULT_ERROR_BITS: u32 = 16;
/// Fresh numerator factors budgeted per slot of κ.
pub const FACTOR_BUDGET_PER_SLOT: u64 = 3;
/// Bits of head-room for additions and re-randomization.
const NOISE_SLACK_BITS: u64 = 16;
/// Largest encoding modulus the engine will allocate.
pub const MAX_MODULUS_BITS: u64 = 1 << 16;
/// Prime candidates tried per bit of the requested size.
const PRIME_ATTEMPTS_PER_BIT: usize = 64;
const MAX_REJECTIONS: usize = 1_000;

#[derive(Debug)]
pub struct GghEngine;

#[derive(Debug, Clone)]
pub struct GghParams {
    /// Plaintext modulus, equal to the ideal generator `g`.
    p: BigUint,
    q: BigUint,
    q_bits: u64,
    /// Level-one encodings of one; a single entry when symmetric.
    y: Vec<BigUint>,
    pzt: BigUint,
    error_bits: u32,
    threshold_bits: u64,
    extract_bits: u64,
}

impl GghParams {
    pub fn q(&self) -> &BigUint {
        &self.q
    }

    pub fn error_bits(&self) -> u32 {
        self.error_bits
    }

    /// Product of the `y` factors that lift a level-zero numerator to `level`.
    fn lift(&self, level: &Level) -> BigUint {
        match level {
            Level::Symmetric(d) => self.y[0].modpow(&BigUint::from(*d), &self.q),
            Level::Asymmetric(slots) => slots
                .iter()
                .fold(BigUint::one(), |acc, slot| (acc * &self.y[slot]) % &self.q),
        }
    }

    /// Lift from `from` to `to`; both are valid and `to` is reachable.
    fn lift_between(&self, from: &Level, to: &Level) -> BigUint {
        match (from, to) {
            (Level::Symmetric(a), Level::Symmetric(b)) => {
                self.y[0].modpow(&BigUint::from(b - a), &self.q)
            }
            (Level::Asymmetric(a), Level::Asymmetric(b)) => b
                .difference(a)
                .fold(BigUint::one(), |acc, slot| (acc * &self.y[slot]) % &self.q),
            _ => unreachable!("grading checked by caller"),
        }
    }

    /// Level-zero numerator `a + e·p` with a fresh error term.
    fn numerator<R: Rng + ?Sized>(&self, plaintext: &BigUint, rng: &mut R) -> BigUint {
        let e = small_error(self.error_bits, rng);
        plaintext + &self.p * e
    }

    fn zero_test_product(&self, a: &BigUint) -> BigUint {
        (a * &self.pzt) % &self.q
    }
}

/// Bit length of `q` for the given budget under the `q^(7/8)` threshold.
///
/// With `B` the bound on `|h · N|` for any budgeted numerator `N`, the zero
/// case gives `|u·p_zt| < 2^B` and the non-zero case forces
/// `|u·p_zt| > (q - 2^B) / p`. Requiring `7Q/8 > B` and `Q/8 > λ + 4` keeps
/// the two ranges apart.
///
/// Returns `None` if the size does not fit in a `u64`.
fn modulus_bits(lambda: u64, kappa: u64, error_bits: u64) -> Option<u64> {
    let factor_bits = lambda.checked_add(error_bits)?.checked_add(2)?;
    let factors = FACTOR_BUDGET_PER_SLOT.checked_mul(kappa)?.checked_add(4)?;
    let bound = factors
        .checked_mul(factor_bits)?
        .checked_add(lambda)?
        .checked_add(NOISE_SLACK_BITS)?;
    let for_zero = bound.checked_add(1)?.checked_mul(8)?.div_ceil(7);
    let for_nonzero = bound.checked_add(lambda)?.checked_add(8)?;
    let for_gap = lambda.checked_mul(8)?.checked_add(32)?;
    for_zero.max(for_nonzero).max(for_gap).checked_add(8)
}

fn sample_multiplier<R: Rng + ?Sized>(
    q: &BigUint,
    lambda: u32,
    hardened: bool,
    rng: &mut R,
) -> EngineResult<(BigUint, BigUint)> {
    let short = q >> lambda;
    for _ in 0..MAX_REJECTIONS {
        let z = random_nonzero_residue(q, rng);
        let Some(z_inv) = mod_inverse_prime(&z, q) else {
            continue;
        };
        if hardened && (z < short || z_inv < short) {
            continue;
        }
        return Ok((z, z_inv));
    }
    Err(EngineError::SamplingExhausted {
        what: "level multiplier",
        attempts: MAX_REJECTIONS,
    })
}

impl GradedEngine for GghEngine {
    type PublicParams = GghParams;
    type Element = BigUint;

    fn setup<R: Rng + ?Sized>(params: &SetupParams, rng: &mut R) -> EngineResult<GghParams> {
        let lambda = params.lambda;
        let kappa = params.grading.kappa();
        let mode = params.grading.mode();
        let error_bits = if params.hard_assumption {
            2 * DEFAULT_ERROR_BITS
        } else {
            DEFAULT_ERROR_BITS
        };

        let q_bits = modulus_bits(lambda as u64, kappa as u64, error_bits as u64)
            .unwrap_or(u64::MAX);
        if q_bits > MAX_MODULUS_BITS {
            return Err(EngineError::ModulusTooLarge {
                bits: q_bits,
                max: MAX_MODULUS_BITS,
            });
        }

        // p > 2^lambda keeps |R/(g)| above the security bound.
        let p_bits = lambda as u64 + 1;
        let p_attempts = PRIME_ATTEMPTS_PER_BIT * p_bits as usize;
        let p = random_prime(p_bits, p_attempts, rng).ok_or(EngineError::PrimeSearchExhausted {
            bits: p_bits,
            attempts: p_attempts,
        })?;

        let q_attempts = PRIME_ATTEMPTS_PER_BIT * q_bits as usize;
        let q = random_prime(q_bits, q_attempts, rng).ok_or(EngineError::PrimeSearchExhausted {
            bits: q_bits,
            attempts: q_attempts,
        })?;
        debug!(p_bits, q_bits, error_bits, "sampled moduli");

        let mut secrets = TrapdoorSecrets::default();
        let denominators = match mode {
            GradingMode::Symmetric => 1,
            GradingMode::Asymmetric => kappa,
        };
        for _ in 0..denominators {
            let (z, z_inv) = sample_multiplier(&q, lambda, params.hardened_inverse_sampling, rng)?;
            secrets.z.push(z);
            secrets.z_inv.push(z_inv);
        }
        // h < 2^lambda < p, so h is a unit modulo p.
        secrets.h = random_biguint_bits(lambda as u64, rng);
        if secrets.h < BigUint::one() {
            secrets.h = BigUint::one();
        }

        let y = secrets
            .z_inv
            .iter()
            .map(|z_inv| {
                let e = small_error(error_bits, rng);
                let mut y = BigUint::one() + &p * e;
                mul_mod_assign(&mut y, z_inv, &q);
                y
            })
            .collect();

        let p_inv = mod_inverse_prime(&p, &q).ok_or(EngineError::SamplingExhausted {
            what: "invertible plaintext modulus",
            attempts: 1,
        })?;
        secrets.z_product = BigUint::one();
        match mode {
            GradingMode::Symmetric => {
                for _ in 0..kappa {
                    mul_mod_assign(&mut secrets.z_product, &secrets.z[0], &q);
                }
            }
            GradingMode::Asymmetric => {
                for z in &secrets.z {
                    mul_mod_assign(&mut secrets.z_product, z, &q);
                }
            }
        }
        // h·Πz_i is overwritten in place by the division by p.
        let mut pzt = secrets.h.clone();
        mul_mod_assign(&mut pzt, &secrets.z_product, &q);
        mul_mod_assign(&mut pzt, &p_inv, &q);
        drop(secrets);

        Ok(GghParams {
            p,
            q,
            q_bits,
            y,
            pzt,
            error_bits,
            threshold_bits: q_bits * 7 / 8,
            extract_bits: lambda as u64,
        })
    }

    fn plaintext_modulus(pp: &GghParams) -> &BigUint {
        &pp.p
    }

    fn modulus_bits(pp: &GghParams) -> u64 {
        pp.q_bits
    }

    fn zero_test_threshold_bits(pp: &GghParams) -> u64 {
        pp.threshold_bits
    }

    fn encode<R: Rng + ?Sized>(
        pp: &GghParams,
        plaintext: &BigUint,
        level: &Level,
        rng: &mut R,
    ) -> BigUint {
        let numerator = pp.numerator(plaintext, rng);
        (numerator * pp.lift(level)) % &pp.q
    }

    fn sample<R: Rng + ?Sized>(pp: &GghParams, level: &Level, rng: &mut R) -> BigUint {
        let plaintext = random_biguint_below(&pp.p, rng);
        Self::encode(pp, &plaintext, level, rng)
    }

    fn add(pp: &GghParams, a: &BigUint, b: &BigUint) -> BigUint {
        (a + b) % &pp.q
    }

    fn sub(pp: &GghParams, a: &BigUint, b: &BigUint) -> BigUint {
        (a + &pp.q - b) % &pp.q
    }

    fn mul(pp: &GghParams, a: &BigUint, b: &BigUint) -> BigUint {
        (a * b) % &pp.q
    }

    fn raise(pp: &GghParams, a: &BigUint, from: &Level, to: &Level) -> BigUint {
        (a * pp.lift_between(from, to)) % &pp.q
    }

    fn rerandomize<R: Rng + ?Sized>(
        pp: &GghParams,
        a: &BigUint,
        level: &Level,
        rng: &mut R,
    ) -> BigUint {
        let r = small_error(pp.error_bits, rng).max(1);
        let zero = (&pp.p * r * pp.lift(level)) % &pp.q;
        (a + zero) % &pp.q
    }

    fn is_zero(pp: &GghParams, a: &BigUint) -> bool {
        Self::zero_test_norm_bits(pp, a) <= pp.threshold_bits
    }

    fn extract(pp: &GghParams, a: &BigUint) -> Vec<u8> {
        // Shift by half a bucket so every product below the noise bound, of
        // either sign, lands in bucket zero.
        let half_bucket = BigUint::one() << (pp.q_bits - pp.extract_bits - 1);
        let shifted = (pp.zero_test_product(a) + half_bucket) % &pp.q;
        top_bits(&shifted, pp.q_bits, pp.extract_bits)
    }

    fn zero_test_norm_bits(pp: &GghParams, a: &BigUint) -> u64 {
        centered_abs(&pp.zero_test_product(a), &pp.q).bits()
    }

    fn element_bytes(a: &BigUint) -> Vec<u8> {
        a.to_bytes_be()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::Grading;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    fn setup(mode: GradingMode, kappa: usize, seed: u64) -> (GghParams, ChaCha20Rng) {
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        let params = SetupParams {
            grading: Grading::new(mode, kappa),
            lambda: 16,
            hardened_inverse_sampling: false,
            hard_assumption: false,
        };
        let pp = GghEngine::setup(&params, &mut rng).unwrap();
        (pp, rng)
    }

    #[test]
    fn modulus_grows_with_kappa_and_lambda() {
        let bits = |lambda, kappa, error_bits| modulus_bits(lambda, kappa, error_bits).unwrap();
        assert!(bits(20, 5, 6) > bits(20, 4, 6));
        assert!(bits(40, 5, 6) > bits(20, 5, 6));
        assert!(bits(20, 5, 12) > bits(20, 5, 6));
    }

    #[test]
    fn modulus_respects_gap_conditions() {
        for (lambda, kappa) in [(1u64, 1u64), (20, 5), (80, 2), (8, 30)] {
            let q_bits = modulus_bits(lambda, kappa, 6).unwrap();
            assert!(q_bits - q_bits * 7 / 8 > lambda + 4);
        }
    }

    #[test]
    fn modulus_size_overflow_is_reported() {
        assert_eq!(modulus_bits(20, u64::MAX / 2, 16), None);
        assert_eq!(modulus_bits(u64::MAX, 1, 16), None);

        let mut rng = ChaCha20Rng::seed_from_u64(0);
        let params = SetupParams {
            grading: Grading::new(GradingMode::Asymmetric, usize::MAX / 2),
            lambda: 20,
            hardened_inverse_sampling: false,
            hard_assumption: false,
        };
        let err = GghEngine::setup(&params, &mut rng).unwrap_err();
        assert_eq!(
            err,
            EngineError::ModulusTooLarge {
                bits: u64::MAX,
                max: MAX_MODULUS_BITS
            }
        );
    }

    #[test]
    fn setup_derives_prime_plaintext_modulus() {
        let (pp, _) = setup(GradingMode::Symmetric, 3, 1);
        assert_eq!(pp.p.bits(), 17);
        assert_eq!(pp.q.bits(), pp.q_bits);
        assert_eq!(pp.y.len(), 1);
        let (pp, _) = setup(GradingMode::Asymmetric, 3, 1);
        assert_eq!(pp.y.len(), 3);
    }

    #[test]
    fn oversized_modulus_is_rejected() {
        let mut rng = ChaCha20Rng::seed_from_u64(0);
        let params = SetupParams {
            grading: Grading::new(GradingMode::Symmetric, 100_000),
            lambda: 20,
            hardened_inverse_sampling: false,
            hard_assumption: false,
        };
        let err = GghEngine::setup(&params, &mut rng).unwrap_err();
        assert!(matches!(err, EngineError::ModulusTooLarge { .. }));
    }

    #[test]
    fn top_level_zero_test_separates_zero_from_nonzero() {
        let (pp, mut rng) = setup(GradingMode::Symmetric, 2, 2);
        let top = Level::Symmetric(2);
        let zero = GghEngine::encode(&pp, &BigUint::from(0u32), &top, &mut rng);
        let one = GghEngine::encode(&pp, &BigUint::from(1u32), &top, &mut rng);
        assert!(GghEngine::is_zero(&pp, &zero));
        assert!(!GghEngine::is_zero(&pp, &one));
    }

    #[test]
    fn raising_matches_direct_encoding() {
        let (pp, mut rng) = setup(GradingMode::Asymmetric, 3, 3);
        let x = BigUint::from(1234u32);
        let low = GghEngine::encode(&pp, &x, &Level::slot(1), &mut rng);
        let top = Level::slots([0, 1, 2]);
        let raised = GghEngine::raise(&pp, &low, &Level::slot(1), &top);
        let direct = GghEngine::encode(&pp, &x, &top, &mut rng);
        assert!(GghEngine::is_zero(&pp, &GghEngine::sub(&pp, &raised, &direct)));
    }

    #[test]
    fn rerandomize_changes_bits_not_value() {
        let (pp, mut rng) = setup(GradingMode::Symmetric, 1, 4);
        let top = Level::Symmetric(1);
        let a = GghEngine::encode(&pp, &BigUint::from(77u32), &top, &mut rng);
        let b = GghEngine::rerandomize(&pp, &a, &top, &mut rng);
        assert_ne!(a, b);
        assert!(GghEngine::is_zero(&pp, &GghEngine::sub(&pp, &a, &b)));
    }

    #[test]
    fn zeros_extract_alike_regardless_of_noise_sign() {
        let (pp, mut rng) = setup(GradingMode::Symmetric, 2, 3);
        let top = Level::Symmetric(2);
        let five = BigUint::from(5u32);
        for _ in 0..50 {
            let a = GghEngine::encode(&pp, &five, &top, &mut rng);
            let b = GghEngine::encode(&pp, &five, &top, &mut rng);
            let difference = GghEngine::sub(&pp, &a, &b);
            let zero = GghEngine::encode(&pp, &BigUint::ZERO, &top, &mut rng);
            assert_eq!(GghEngine::extract(&pp, &difference), vec![0u8; 2]);
            assert_eq!(GghEngine::extract(&pp, &zero), vec![0u8; 2]);
        }
    }

    #[test]
    fn extract_has_lambda_bits() {
        let (pp, mut rng) = setup(GradingMode::Symmetric, 1, 5);
        let a = GghEngine::sample(&pp, &Level::Symmetric(1), &mut rng);
        assert_eq!(GghEngine::extract(&pp, &a).len(), 2);
    }
}
