//! Graded encoding contexts and the encodings they produce.
//!
//! A [`Context`] owns the engine parameters; [`Encoding`]s refer back to it
//! and have their levels checked before any engine call.

pub mod builder;
pub mod context;
pub mod encoding;
pub mod errors;
pub mod levels;
pub mod plaintext;
pub mod types;

pub use builder::{ContextBuilder, ContextConfig, DEFAULT_LAMBDA, MAX_LAMBDA};
pub use context::Context;
pub use encoding::Encoding;
pub use errors::{GradedError, GradedResult};
pub use levels::{Grading, GradingMode, Level, LevelList, LevelViolation, SlotSet};
pub use plaintext::PlaintextRing;
pub use types::{BaseRing, ContextId, Flags, Seed};
