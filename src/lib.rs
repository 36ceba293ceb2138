pub mod crypto;
pub mod engine;
pub mod math;

pub use crypto::{
    BaseRing, Context, ContextBuilder, ContextConfig, ContextId, Encoding, Flags, GradedError,
    GradedResult, Grading, GradingMode, Level, PlaintextRing, Seed, SlotSet,
};
pub use engine::{EngineError, GghEngine, GradedEngine};

/// Context over the reference engine.
pub type GghContext = Context<GghEngine>;
/// Encoding produced by a [`GghContext`].
pub type GghEncoding = Encoding<GghEngine>;
