use std::fmt;
use std::sync::{Arc, Mutex, RwLock};

use num_bigint::BigUint;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use tracing::{debug, info, instrument, warn};

use super::builder::{ContextBuilder, ContextConfig};
use super::encoding::Encoding;
use super::errors::{GradedError, GradedResult};
use super::levels::{Grading, GradingMode, Level, LevelList, LevelViolation};
use super::plaintext::PlaintextRing;
use super::types::{BaseRing, ContextId, Flags, Seed};
use crate::engine::{GghEngine, GradedEngine, SetupParams};

/// State shared between a context and the encodings derived from it.
///
/// Encodings only hold a `Weak` to this, so they never keep the engine
/// parameters alive. Lock order is randomness first, then parameters.
pub(crate) struct Shared<E: GradedEngine> {
    pub(crate) id: ContextId,
    params: RwLock<Option<E::PublicParams>>,
    rng: Mutex<Option<ChaCha20Rng>>,
}

impl<E: GradedEngine> Shared<E> {
    fn disposed(&self) -> GradedError {
        GradedError::DisposedContextAccess { context: self.id }
    }

    fn poisoned(&self, resource: &'static str) -> GradedError {
        GradedError::StatePoisoned {
            context: self.id,
            resource,
        }
    }

    /// Runs `f` against the public parameters under a shared read guard.
    pub(crate) fn read<T>(&self, f: impl FnOnce(&E::PublicParams) -> T) -> GradedResult<T> {
        let guard = self.params.read().map_err(|_| self.poisoned("parameter"))?;
        let params = guard.as_ref().ok_or_else(|| self.disposed())?;
        Ok(f(params))
    }

    /// Runs `f` with exclusive use of the randomness state.
    pub(crate) fn sample<T>(
        &self,
        f: impl FnOnce(&E::PublicParams, &mut ChaCha20Rng) -> T,
    ) -> GradedResult<T> {
        let mut rng_guard = self.rng.lock().map_err(|_| self.poisoned("randomness"))?;
        let rng = rng_guard.as_mut().ok_or_else(|| self.disposed())?;
        let guard = self.params.read().map_err(|_| self.poisoned("parameter"))?;
        let params = guard.as_ref().ok_or_else(|| self.disposed())?;
        Ok(f(params, rng))
    }

    /// Releases parameters and randomness; returns `false` if already done.
    ///
    /// Poisoned locks are entered anyway so release happens on every path.
    fn release(&self) -> bool {
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(state) = rng.as_mut() {
            // Overwrite the keystream state before the allocation goes away.
            *state = ChaCha20Rng::from_seed([0u8; 32]);
        }
        let had_rng = rng.take().is_some();
        drop(rng);

        let mut params = self
            .params
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let had_params = params.take().is_some();
        had_rng || had_params
    }
}

impl<E: GradedEngine> Drop for Shared<E> {
    fn drop(&mut self) {
        self.release();
    }
}

/// Parameter context of a graded encoding scheme.
///
/// Owns the engine's public parameters and the randomness state. Encodings
/// refer back to it without owning it: once the context is disposed or
/// dropped, operations on its encodings fail with
/// [`GradedError::DisposedContextAccess`].
///
/// Sampling operations (`encode`, `sample_random`, re-randomizing `elevate`)
/// are serialized on the randomness state. Read-only operations (`add`,
/// `sub`, `multiply`, `is_zero`, `extract_canonical`) run concurrently.
pub struct Context<E: GradedEngine = GghEngine> {
    shared: Arc<Shared<E>>,
    config: ContextConfig,
    grading: Grading,
    plaintext_ring: PlaintextRing,
    modulus_bits: u64,
    threshold_bits: u64,
}

impl Context<GghEngine> {
    pub fn builder() -> ContextBuilder {
        ContextBuilder::new()
    }

    /// One-call constructor over the reference engine.
    pub fn create(
        base_ring: BaseRing,
        kappa: usize,
        lambda: u32,
        seed: Seed,
        flags: Flags,
    ) -> GradedResult<Self> {
        Self::from_config(ContextConfig {
            base_ring,
            kappa,
            lambda,
            seed,
            flags,
        })
    }
}

impl<E: GradedEngine> Context<E> {
    /// Runs the engine's one-time parameter generation.
    #[instrument(skip_all, fields(kappa = config.kappa, lambda = config.lambda, flags = %config.flags))]
    pub fn from_config(config: ContextConfig) -> GradedResult<Self> {
        config.validate()?;
        let id = ContextId::next();

        let rng = match config.seed {
            Seed::Fixed(seed) => {
                if config.seed.is_insecure() {
                    warn!(context = %id, "all-zero seed: encodings are deterministic and insecure");
                } else {
                    debug!(context = %id, "fixed seed: encodings are deterministic");
                }
                ChaCha20Rng::seed_from_u64(seed)
            }
            Seed::Entropy => ChaCha20Rng::from_rng(&mut rand::rng()),
        };

        let mode = if config.flags.contains(Flags::ASYMMETRIC) {
            GradingMode::Asymmetric
        } else {
            GradingMode::Symmetric
        };
        let grading = Grading::new(mode, config.kappa);
        let setup = SetupParams {
            grading,
            lambda: config.lambda,
            hardened_inverse_sampling: config.flags.contains(Flags::HARDENED_INVERSE_SAMPLING),
            hard_assumption: config.flags.contains(Flags::HARD_ASSUMPTION),
        };

        // Dropping `shared` on an early return clears the randomness state.
        let shared = Arc::new(Shared::<E> {
            id,
            params: RwLock::new(None),
            rng: Mutex::new(Some(rng)),
        });
        let params = {
            let mut guard = shared
                .rng
                .lock()
                .map_err(|_| shared.poisoned("randomness"))?;
            let rng = guard.as_mut().ok_or_else(|| shared.disposed())?;
            E::setup(&setup, rng)?
        };

        let plaintext_ring = PlaintextRing::new(E::plaintext_modulus(&params).clone());
        let modulus_bits = E::modulus_bits(&params);
        let threshold_bits = E::zero_test_threshold_bits(&params);
        *shared
            .params
            .write()
            .map_err(|_| shared.poisoned("parameter"))? = Some(params);

        let context = Self {
            shared,
            config,
            grading,
            plaintext_ring,
            modulus_bits,
            threshold_bits,
        };
        if config.flags.contains(Flags::VERBOSE) {
            info!(%context, "context ready");
        } else {
            debug!(%context, "context ready");
        }
        Ok(context)
    }

    pub fn id(&self) -> ContextId {
        self.shared.id
    }

    pub fn config(&self) -> &ContextConfig {
        &self.config
    }

    pub fn kappa(&self) -> usize {
        self.config.kappa
    }

    pub fn lambda(&self) -> u32 {
        self.config.lambda
    }

    pub fn flags(&self) -> Flags {
        self.config.flags
    }

    pub fn grading(&self) -> Grading {
        self.grading
    }

    pub fn top_level(&self) -> Level {
        self.grading.top()
    }

    pub fn zero_level(&self) -> Level {
        self.grading.zero()
    }

    /// Plaintext prime `p`, derived by the engine during creation.
    pub fn plaintext_modulus(&self) -> &BigUint {
        self.plaintext_ring.modulus()
    }

    pub fn plaintext_ring(&self) -> &PlaintextRing {
        &self.plaintext_ring
    }

    /// Bit length of the encoding modulus `q`.
    pub fn modulus_bits(&self) -> u64 {
        self.modulus_bits
    }

    pub fn zero_test_threshold_bits(&self) -> u64 {
        self.threshold_bits
    }

    /// `true` when the context runs on the all-zero default seed.
    pub fn is_seed_insecure(&self) -> bool {
        self.config.seed.is_insecure()
    }

    pub fn owns<F: GradedEngine>(&self, encoding: &Encoding<F>) -> bool {
        encoding.context_id() == self.id()
    }

    fn check_level(&self, level: &Level) -> GradedResult<()> {
        self.grading.check(level).map_err(|violation| {
            self.overflow(violation, vec![level.clone()])
        })
    }

    fn overflow(&self, violation: LevelViolation, levels: Vec<Level>) -> GradedError {
        let err = GradedError::LevelOverflow {
            context: self.id(),
            violation,
            kappa: self.kappa(),
            levels: LevelList(levels),
        };
        debug!(error = %err, "rejected before engine call");
        err
    }

    fn wrap(&self, level: Level, value: E::Element) -> Encoding<E> {
        Encoding::new(Arc::downgrade(&self.shared), self.id(), self.grading, level, value)
    }

    /// Encodes `plaintext` (reduced modulo `p`) at `level` with fresh
    /// randomness, so repeated encodings of one value differ bit-wise.
    pub fn encode(&self, plaintext: &BigUint, level: impl Into<Level>) -> GradedResult<Encoding<E>> {
        let level = level.into();
        self.check_level(&level)?;
        let reduced = plaintext % self.plaintext_modulus();
        let value = self
            .shared
            .sample(|pp, rng| E::encode(pp, &reduced, &level, rng))?;
        Ok(self.wrap(level, value))
    }

    /// Fresh encoding of a uniformly random plaintext the caller never sees.
    pub fn sample_random(&self, level: impl Into<Level>) -> GradedResult<Encoding<E>> {
        let level = level.into();
        self.check_level(&level)?;
        let value = self.shared.sample(|pp, rng| E::sample(pp, &level, rng))?;
        Ok(self.wrap(level, value))
    }

    /// Encodes every entry of a matrix at one level.
    #[instrument(skip_all, fields(context = %self.id(), rows = rows.len()))]
    pub fn encode_matrix(
        &self,
        rows: &[Vec<BigUint>],
        level: impl Into<Level>,
    ) -> GradedResult<Vec<Vec<Encoding<E>>>> {
        let level = level.into();
        self.check_level(&level)?;
        rows.iter()
            .map(|row| {
                row.iter()
                    .map(|entry| self.encode(entry, &level))
                    .collect::<GradedResult<Vec<_>>>()
            })
            .collect()
    }

    /// Iterated multiply; stops at the first violation.
    pub fn product<'a, I>(&self, factors: I) -> GradedResult<Encoding<E>>
    where
        I: IntoIterator<Item = &'a Encoding<E>>,
    {
        let mut factors = factors.into_iter();
        let first = factors
            .next()
            .ok_or(GradedError::EmptyProduct { context: self.id() })?;
        if !self.owns(first) {
            return Err(GradedError::IncompatibleContext {
                operation: "product",
                left: self.id(),
                right: first.context_id(),
            });
        }
        factors.try_fold(first.clone(), |acc, factor| acc.multiply(factor))
    }

    /// Releases the public parameters and clears the randomness state.
    ///
    /// Dropping the context does the same; encodings left behind report
    /// [`GradedError::DisposedContextAccess`] afterwards.
    pub fn dispose(self) {
        // Release happens in `Drop`.
    }
}

impl<E: GradedEngine> Drop for Context<E> {
    fn drop(&mut self) {
        if self.shared.release() {
            if self.config.flags.contains(Flags::VERBOSE) {
                info!(context = %self.id(), "context disposed");
            } else {
                debug!(context = %self.id(), "context disposed");
            }
        }
    }
}

impl<E: GradedEngine> fmt::Display for Context<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mode = match self.grading.mode() {
            GradingMode::Symmetric => "symmetric",
            GradingMode::Asymmetric => "asymmetric",
        };
        write!(
            f,
            "{} graded encoding context {} with kappa: {}, lambda: {}, p: {}, q: {} bits",
            mode,
            self.id(),
            self.kappa(),
            self.lambda(),
            self.plaintext_modulus(),
            self.modulus_bits
        )
    }
}

impl<E: GradedEngine> fmt::Debug for Context<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("id", &self.id())
            .field("config", &self.config)
            .field("plaintext_modulus", self.plaintext_modulus())
            .field("modulus_bits", &self.modulus_bits)
            .finish_non_exhaustive()
    }
}
