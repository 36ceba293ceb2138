//! Narrow interface to the primitive graded-encoding engine.
//!
//! The context layer never does lattice arithmetic itself; it validates level
//! tags and then calls through [`GradedEngine`]. Engines are type-level
//! strategies (no `self`), in the same way a ring backend exposes its
//! operations against an associated context.
//!
//! Implementations may assume every level they receive has already passed the
//! [`Grading`] checks of the calling context.

pub mod ggh;
mod secrets;

use std::fmt;

use num_bigint::BigUint;
use rand::Rng;
use thiserror::Error;

use crate::crypto::{Grading, Level};

pub use ggh::{GghEngine, GghParams};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("modulus of {bits} bits exceeds the supported maximum of {max} bits")]
    ModulusTooLarge { bits: u64, max: u64 },

    #[error("no {bits}-bit prime found in {attempts} candidates")]
    PrimeSearchExhausted { bits: u64, attempts: usize },

    #[error("rejection sampling for {what} gave up after {attempts} attempts")]
    SamplingExhausted { what: &'static str, attempts: usize },
}

pub type EngineResult<T> = Result<T, EngineError>;

/// Inputs to one-time parameter generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetupParams {
    pub grading: Grading,
    pub lambda: u32,
    pub hardened_inverse_sampling: bool,
    pub hard_assumption: bool,
}

pub trait GradedEngine: Send + Sync + 'static {
    /// Public evaluation data; immutable once generated.
    type PublicParams: Send + Sync + fmt::Debug;
    /// One encoded ring element.
    type Element: Clone + Send + Sync + fmt::Debug;

    /// Generates public parameters. Secret material must not outlive this call.
    fn setup<R: Rng + ?Sized>(params: &SetupParams, rng: &mut R)
    -> EngineResult<Self::PublicParams>;

    fn plaintext_modulus(pp: &Self::PublicParams) -> &BigUint;

    /// Bit length of the encoding modulus.
    fn modulus_bits(pp: &Self::PublicParams) -> u64;

    /// Zero-test products of at most this many bits are read as zero.
    fn zero_test_threshold_bits(pp: &Self::PublicParams) -> u64;

    /// Encodes `plaintext` (already reduced modulo `p`) at `level` with fresh
    /// randomness.
    fn encode<R: Rng + ?Sized>(
        pp: &Self::PublicParams,
        plaintext: &BigUint,
        level: &Level,
        rng: &mut R,
    ) -> Self::Element;

    /// Encodes a uniformly random plaintext that never leaves the engine.
    fn sample<R: Rng + ?Sized>(
        pp: &Self::PublicParams,
        level: &Level,
        rng: &mut R,
    ) -> Self::Element;

    fn add(pp: &Self::PublicParams, a: &Self::Element, b: &Self::Element) -> Self::Element;

    fn sub(pp: &Self::PublicParams, a: &Self::Element, b: &Self::Element) -> Self::Element;

    fn mul(pp: &Self::PublicParams, a: &Self::Element, b: &Self::Element) -> Self::Element;

    /// Moves `a` from `from` up to `to`.
    fn raise(
        pp: &Self::PublicParams,
        a: &Self::Element,
        from: &Level,
        to: &Level,
    ) -> Self::Element;

    /// Adds a fresh encoding of zero at `level`.
    fn rerandomize<R: Rng + ?Sized>(
        pp: &Self::PublicParams,
        a: &Self::Element,
        level: &Level,
        rng: &mut R,
    ) -> Self::Element;

    fn is_zero(pp: &Self::PublicParams, a: &Self::Element) -> bool;

    /// Canonical representative derived from the zero-test product.
    fn extract(pp: &Self::PublicParams, a: &Self::Element) -> Vec<u8>;

    /// Bit length of the centred zero-test product.
    fn zero_test_norm_bits(pp: &Self::PublicParams, a: &Self::Element) -> u64;

    /// Raw big-endian representation of the element.
    fn element_bytes(a: &Self::Element) -> Vec<u8>;
}
