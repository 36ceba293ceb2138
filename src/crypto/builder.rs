use super::context::Context;
use super::errors::{GradedError, GradedResult};
use super::types::{BaseRing, Flags, Seed};
use crate::engine::{GghEngine, GradedEngine};

pub const DEFAULT_LAMBDA: u32 = 20;
/// Largest security parameter accepted at configuration time.
pub const MAX_LAMBDA: u32 = 4096;

/// Validated settings of a context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextConfig {
    pub base_ring: BaseRing,
    pub kappa: usize,
    pub lambda: u32,
    pub seed: Seed,
    pub flags: Flags,
}

impl ContextConfig {
    /// Configuration with the documented defaults for everything but κ.
    pub fn with_kappa(kappa: usize) -> Self {
        Self {
            base_ring: BaseRing::default(),
            kappa,
            lambda: DEFAULT_LAMBDA,
            seed: Seed::default(),
            flags: Flags::NONE,
        }
    }

    pub fn validate(&self) -> GradedResult<()> {
        if self.kappa == 0 {
            return Err(GradedError::Configuration {
                message: "kappa must be at least 1".to_string(),
            });
        }
        if self.lambda == 0 {
            return Err(GradedError::Configuration {
                message: "lambda must be positive".to_string(),
            });
        }
        if self.lambda > MAX_LAMBDA {
            return Err(GradedError::Configuration {
                message: format!("lambda {} exceeds the maximum of {MAX_LAMBDA}", self.lambda),
            });
        }
        Ok(())
    }
}

pub struct ContextBuilder {
    base_ring: Option<BaseRing>,
    kappa: Option<usize>,
    lambda: Option<u32>,
    seed: Option<Seed>,
    flags: Flags,
}

impl Default for ContextBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ContextBuilder {
    pub fn new() -> Self {
        Self {
            base_ring: None,
            kappa: None,
            lambda: None,
            seed: None,
            flags: Flags::NONE,
        }
    }

    pub fn base_ring(mut self, base_ring: BaseRing) -> Self {
        self.base_ring = Some(base_ring);
        self
    }

    pub fn kappa(mut self, kappa: usize) -> Self {
        self.kappa = Some(kappa);
        self
    }

    pub fn lambda(mut self, lambda: u32) -> Self {
        self.lambda = Some(lambda);
        self
    }

    /// Deterministic seed. Test and benchmark use only; `0` is reported as
    /// insecure.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(Seed::Fixed(seed));
        self
    }

    /// Seeds the randomness state from the operating system.
    pub fn entropy_seed(mut self) -> Self {
        self.seed = Some(Seed::Entropy);
        self
    }

    pub fn flags(mut self, flags: Flags) -> Self {
        self.flags |= flags;
        self
    }

    pub fn asymmetric(self) -> Self {
        self.flags(Flags::ASYMMETRIC)
    }

    pub fn verbose(self) -> Self {
        self.flags(Flags::VERBOSE)
    }

    pub fn config(self) -> GradedResult<ContextConfig> {
        let kappa = self.kappa.ok_or_else(|| GradedError::Configuration {
            message: "kappa is required".to_string(),
        })?;
        let config = ContextConfig {
            base_ring: self.base_ring.unwrap_or_default(),
            kappa,
            lambda: self.lambda.unwrap_or(DEFAULT_LAMBDA),
            seed: self.seed.unwrap_or_default(),
            flags: self.flags,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn build(self) -> GradedResult<Context<GghEngine>> {
        self.build_with_engine::<GghEngine>()
    }

    pub fn build_with_engine<E: GradedEngine>(self) -> GradedResult<Context<E>> {
        Context::from_config(self.config()?)
    }
}
