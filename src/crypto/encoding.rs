use std::fmt;
use std::sync::{Arc, Weak};

use tracing::debug;

use super::context::Shared;
use super::errors::{GradedError, GradedResult};
use super::levels::{Grading, Level, LevelList, LevelViolation};
use super::types::ContextId;
use crate::engine::{GghEngine, GradedEngine};

/// Opaque encoding of a plaintext at a known level.
///
/// Carries a non-owning handle to its context. Every operation fails with
/// [`GradedError::DisposedContextAccess`] once that context is gone.
pub struct Encoding<E: GradedEngine = GghEngine> {
    context: Weak<Shared<E>>,
    context_id: ContextId,
    grading: Grading,
    level: Level,
    value: E::Element,
}

impl<E: GradedEngine> Clone for Encoding<E> {
    fn clone(&self) -> Self {
        Self {
            context: self.context.clone(),
            context_id: self.context_id,
            grading: self.grading,
            level: self.level.clone(),
            value: self.value.clone(),
        }
    }
}

impl<E: GradedEngine> fmt::Debug for Encoding<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Encoding")
            .field("context", &self.context_id)
            .field("level", &self.level)
            .finish_non_exhaustive()
    }
}

fn rejected(err: GradedError) -> GradedError {
    debug!(error = %err, "rejected before engine call");
    err
}

impl<E: GradedEngine> Encoding<E> {
    pub(crate) fn new(
        context: Weak<Shared<E>>,
        context_id: ContextId,
        grading: Grading,
        level: Level,
        value: E::Element,
    ) -> Self {
        Self {
            context,
            context_id,
            grading,
            level,
            value,
        }
    }

    pub fn level(&self) -> &Level {
        &self.level
    }

    pub fn context_id(&self) -> ContextId {
        self.context_id
    }

    pub fn is_top_level(&self) -> bool {
        self.grading.is_top(&self.level)
    }

    /// Raw engine representation. Differs between encodings of one value.
    pub fn representation(&self) -> Vec<u8> {
        E::element_bytes(&self.value)
    }

    fn shared(&self) -> GradedResult<Arc<Shared<E>>> {
        self.context.upgrade().ok_or_else(|| {
            rejected(GradedError::DisposedContextAccess {
                context: self.context_id,
            })
        })
    }

    fn same_context(&self, other: &Self, operation: &'static str) -> GradedResult<()> {
        if self.context_id != other.context_id {
            return Err(rejected(GradedError::IncompatibleContext {
                operation,
                left: self.context_id,
                right: other.context_id,
            }));
        }
        Ok(())
    }

    fn overflow(&self, violation: LevelViolation, levels: Vec<Level>) -> GradedError {
        rejected(GradedError::LevelOverflow {
            context: self.context_id,
            violation,
            kappa: self.grading.kappa(),
            levels: LevelList(levels),
        })
    }

    fn derive(&self, level: Level, value: E::Element) -> Self {
        Self {
            context: self.context.clone(),
            context_id: self.context_id,
            grading: self.grading,
            level,
            value,
        }
    }

    fn additive(
        &self,
        other: &Self,
        operation: &'static str,
        op: fn(&E::PublicParams, &E::Element, &E::Element) -> E::Element,
    ) -> GradedResult<Self> {
        self.same_context(other, operation)?;
        if self.level != other.level {
            return Err(rejected(GradedError::LevelMismatch {
                context: self.context_id,
                operation,
                left: self.level.clone(),
                right: other.level.clone(),
            }));
        }
        let value = self.shared()?.read(|pp| op(pp, &self.value, &other.value))?;
        Ok(self.derive(self.level.clone(), value))
    }

    /// Sum of two encodings at the same level.
    pub fn add(&self, other: &Self) -> GradedResult<Self> {
        self.additive(other, "add", E::add)
    }

    pub fn sub(&self, other: &Self) -> GradedResult<Self> {
        self.additive(other, "sub", E::sub)
    }

    /// Product at the combined level: degrees add in symmetric mode, disjoint
    /// slot sets unite in asymmetric mode. Anything past the top level is a
    /// [`GradedError::LevelOverflow`].
    pub fn multiply(&self, other: &Self) -> GradedResult<Self> {
        self.same_context(other, "multiply")?;
        let level = self
            .grading
            .product(&self.level, &other.level)
            .map_err(|violation| {
                self.overflow(violation, vec![self.level.clone(), other.level.clone()])
            })?;
        let value = self
            .shared()?
            .read(|pp| E::mul(pp, &self.value, &other.value))?;
        Ok(self.derive(level, value))
    }

    /// Raises this encoding to a higher `target` level.
    ///
    /// With `rerandomize` a fresh encoding of zero is added, so the result
    /// shares no bits with a plain raise of the same input.
    pub fn elevate(&self, target: impl Into<Level>, rerandomize: bool) -> GradedResult<Self> {
        let target = target.into();
        self.grading
            .check_elevation(&self.level, &target)
            .map_err(|violation| {
                self.overflow(violation, vec![self.level.clone(), target.clone()])
            })?;
        let shared = self.shared()?;
        let value = if rerandomize {
            shared.sample(|pp, rng| {
                let raised = E::raise(pp, &self.value, &self.level, &target);
                E::rerandomize(pp, &raised, &target, rng)
            })?
        } else {
            shared.read(|pp| E::raise(pp, &self.value, &self.level, &target))?
        };
        Ok(self.derive(target, value))
    }

    /// Zero test.
    ///
    /// Only meaningful at the top level; below it the answer is whatever the
    /// engine's threshold test yields and carries no guarantee.
    pub fn is_zero(&self) -> GradedResult<bool> {
        if !self.is_top_level() {
            debug!(context = %self.context_id, level = %self.level, "zero test below the top level");
        }
        self.shared()?.read(|pp| E::is_zero(pp, &self.value))
    }

    /// Canonical bit string of the encoded value at the top level.
    ///
    /// Encodings of zero always extract to all-zero bytes, whatever the sign
    /// of their noise. Other plaintexts extract alike unless their zero-test
    /// product sits within the noise bound of a bucket edge.
    pub fn extract_canonical(&self) -> GradedResult<Vec<u8>> {
        if !self.is_top_level() {
            debug!(context = %self.context_id, level = %self.level, "extraction below the top level");
        }
        self.shared()?.read(|pp| E::extract(pp, &self.value))
    }

    /// Bit length of the centred zero-test product, for diagnostics.
    pub fn zero_test_norm_bits(&self) -> GradedResult<u64> {
        self.shared()?
            .read(|pp| E::zero_test_norm_bits(pp, &self.value))
    }
}

impl<E: GradedEngine> fmt::Display for Encoding<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "encoding at {} of {}", self.level, self.context_id)
    }
}
