use std::fmt;
use std::ops::{BitOr, BitOrAssign};
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

use super::errors::GradedError;

static NEXT_CONTEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a [`Context`](super::Context), carried by every
/// encoding and reported in every diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContextId(u64);

impl ContextId {
    pub(crate) fn next() -> Self {
        Self(NEXT_CONTEXT_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ctx#{}", self.0)
    }
}

/// Ring whose characteristic seeds the derivation of the plaintext modulus.
///
/// Only characteristic zero is supported: the engine picks a fresh prime `p`
/// and the plaintext ring becomes `Z/pZ`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[non_exhaustive]
pub enum BaseRing {
    #[default]
    Integers,
}

/// Source of the context's randomness state.
///
/// `Fixed` seeds replay bit-for-bit and are meant for tests and benchmarks.
/// `Fixed(0)` is the historical default and is reported as insecure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Seed {
    Fixed(u64),
    Entropy,
}

impl Seed {
    /// Insecure default kept for reproducible experiments.
    pub const INSECURE_DEFAULT: Seed = Seed::Fixed(0);

    pub fn is_deterministic(self) -> bool {
        matches!(self, Seed::Fixed(_))
    }

    pub fn is_insecure(self) -> bool {
        self == Self::INSECURE_DEFAULT
    }
}

impl Default for Seed {
    fn default() -> Self {
        Self::INSECURE_DEFAULT
    }
}

/// Assumption and configuration switches for a context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Flags(u8);

impl Flags {
    pub const NONE: Flags = Flags(0);
    /// κ independent slots instead of a single degree counter.
    pub const ASYMMETRIC: Flags = Flags(1);
    /// Rejects level multipliers whose inverse is short.
    pub const HARDENED_INVERSE_SAMPLING: Flags = Flags(1 << 1);
    /// Doubles the error width and grows `q` to match.
    pub const HARD_ASSUMPTION: Flags = Flags(1 << 2);
    /// Logs parameter summaries at `info` instead of `debug`.
    pub const VERBOSE: Flags = Flags(1 << 3);

    const NAMED: [(Flags, &'static str); 4] = [
        (Flags::ASYMMETRIC, "asymmetric-grading"),
        (Flags::HARDENED_INVERSE_SAMPLING, "hardened-inverse-sampling"),
        (Flags::HARD_ASSUMPTION, "hard-assumption-variant"),
        (Flags::VERBOSE, "verbose-diagnostics"),
    ];

    pub const fn contains(self, other: Flags) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn union(self, other: Flags) -> Flags {
        Flags(self.0 | other.0)
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for Flags {
    type Output = Flags;

    fn bitor(self, rhs: Flags) -> Flags {
        self.union(rhs)
    }
}

impl BitOrAssign for Flags {
    fn bitor_assign(&mut self, rhs: Flags) {
        *self = self.union(rhs);
    }
}

impl fmt::Display for Flags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("none");
        }
        let mut first = true;
        for (flag, name) in Self::NAMED {
            if self.contains(flag) {
                if !first {
                    f.write_str("|")?;
                }
                f.write_str(name)?;
                first = false;
            }
        }
        Ok(())
    }
}

/// Parses `|`- or `,`-separated flag names, e.g.
/// `"asymmetric-grading|verbose-diagnostics"`. `"none"` and `""` give no flags.
impl FromStr for Flags {
    type Err = GradedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut flags = Flags::NONE;
        for name in s.split(['|', ',']).map(str::trim) {
            if name.is_empty() || name == "none" {
                continue;
            }
            let flag = Self::NAMED
                .iter()
                .find(|(_, known)| *known == name)
                .map(|(flag, _)| *flag)
                .ok_or_else(|| GradedError::Configuration {
                    message: format!("unknown flag `{name}`"),
                })?;
            flags |= flag;
        }
        Ok(flags)
    }
}
