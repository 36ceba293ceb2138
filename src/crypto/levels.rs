//! Level tags and the algebraic rules that govern them.
//!
//! Every encoding carries a [`Level`]: a degree in `[0, κ]` under symmetric
//! grading, or a [`SlotSet`] over `κ` independent slots under asymmetric
//! grading. [`Grading`] decides which combinations are legal:
//!
//! | operation  | symmetric            | asymmetric              |
//! |------------|----------------------|-------------------------|
//! | add / sub  | equal degrees        | equal slot sets         |
//! | multiply   | `d1 + d2 <= κ`       | disjoint slot sets      |
//! | elevate    | `target >= source`   | `target ⊇ source`       |
//! | zero-test  | degree `κ`           | all `κ` slots           |
//!
//! The checks are pure and context-free; the context wraps a failed check
//! into a [`GradedError`](super::GradedError) carrying its identity.

use std::fmt;

/// Set of asymmetric slots, stored as a bit vector.
///
/// The word vector never ends in a zero word, so derived equality and hashing
/// agree with set equality.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct SlotSet {
    words: Vec<u64>,
}

impl SlotSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn singleton(slot: usize) -> Self {
        let mut set = Self::new();
        set.insert(slot);
        set
    }

    /// All slots `0..kappa`.
    pub fn full(kappa: usize) -> Self {
        (0..kappa).collect()
    }

    pub fn insert(&mut self, slot: usize) -> bool {
        let (word, bit) = (slot / 64, slot % 64);
        if self.words.len() <= word {
            self.words.resize(word + 1, 0);
        }
        let fresh = self.words[word] & (1 << bit) == 0;
        self.words[word] |= 1 << bit;
        fresh
    }

    pub fn contains(&self, slot: usize) -> bool {
        self.words
            .get(slot / 64)
            .is_some_and(|word| word & (1 << (slot % 64)) != 0)
    }

    pub fn len(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Highest slot index in the set.
    pub fn max_slot(&self) -> Option<usize> {
        let last = self.words.len().checked_sub(1)?;
        let word = self.words[last];
        Some(last * 64 + 63 - word.leading_zeros() as usize)
    }

    pub fn is_disjoint(&self, other: &SlotSet) -> bool {
        self.words
            .iter()
            .zip(&other.words)
            .all(|(a, b)| a & b == 0)
    }

    pub fn is_subset(&self, other: &SlotSet) -> bool {
        self.words.iter().enumerate().all(|(i, &a)| {
            let b = other.words.get(i).copied().unwrap_or(0);
            a & !b == 0
        })
    }

    pub fn union(&self, other: &SlotSet) -> SlotSet {
        let (long, short) = if self.words.len() >= other.words.len() {
            (self, other)
        } else {
            (other, self)
        };
        let mut words = long.words.clone();
        for (w, s) in words.iter_mut().zip(&short.words) {
            *w |= s;
        }
        SlotSet { words }
    }

    /// Slots in `self` but not in `other`, ascending.
    pub fn difference<'a>(&'a self, other: &'a SlotSet) -> impl Iterator<Item = usize> + 'a {
        self.iter().filter(move |&slot| !other.contains(slot))
    }

    /// Slots in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.words.iter().enumerate().flat_map(|(i, &word)| {
            (0..64)
                .filter(move |bit| word & (1 << bit) != 0)
                .map(move |bit| i * 64 + bit)
        })
    }
}

impl FromIterator<usize> for SlotSet {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        let mut set = SlotSet::new();
        for slot in iter {
            set.insert(slot);
        }
        set
    }
}

impl fmt::Display for SlotSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, slot) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{slot}")?;
        }
        f.write_str("}")
    }
}

/// Level tag of an encoding.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Level {
    Symmetric(usize),
    Asymmetric(SlotSet),
}

impl Level {
    pub fn degree(degree: usize) -> Self {
        Level::Symmetric(degree)
    }

    pub fn slot(slot: usize) -> Self {
        Level::Asymmetric(SlotSet::singleton(slot))
    }

    pub fn slots<I: IntoIterator<Item = usize>>(slots: I) -> Self {
        Level::Asymmetric(slots.into_iter().collect())
    }

    /// Number of multiplicative slots consumed.
    pub fn weight(&self) -> usize {
        match self {
            Level::Symmetric(d) => *d,
            Level::Asymmetric(set) => set.len(),
        }
    }
}

impl From<usize> for Level {
    fn from(degree: usize) -> Self {
        Level::Symmetric(degree)
    }
}

impl From<SlotSet> for Level {
    fn from(set: SlotSet) -> Self {
        Level::Asymmetric(set)
    }
}

impl From<&Level> for Level {
    fn from(level: &Level) -> Self {
        level.clone()
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Symmetric(d) => write!(f, "degree {d}"),
            Level::Asymmetric(set) => write!(f, "slots {set}"),
        }
    }
}

/// Comma-separated list of levels, used in error messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelList(pub Vec<Level>);

impl fmt::Display for LevelList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, level) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{level}")?;
        }
        Ok(())
    }
}

/// Which algebraic rule a level tag broke.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelViolation {
    /// Degree above κ, or a slot index `>= κ`.
    OutOfRange,
    /// A symmetric tag given to an asymmetric context, or the reverse.
    WrongGrading,
    /// Product degree exceeds κ.
    DegreeExceeded,
    /// Product would use a slot twice.
    SlotCollision,
    /// Elevation target is lower than, or not a superset of, the source.
    Unreachable,
}

impl fmt::Display for LevelViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LevelViolation::OutOfRange => "level out of range",
            LevelViolation::WrongGrading => "level kind does not match the grading",
            LevelViolation::DegreeExceeded => "product degree exceeds kappa",
            LevelViolation::SlotCollision => "product reuses an occupied slot",
            LevelViolation::Unreachable => "target level is not reachable by elevation",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GradingMode {
    Symmetric,
    Asymmetric,
}

/// Level discipline of one context: grading mode plus multilinearity κ.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Grading {
    mode: GradingMode,
    kappa: usize,
}

impl Grading {
    pub fn new(mode: GradingMode, kappa: usize) -> Self {
        Self { mode, kappa }
    }

    pub fn mode(&self) -> GradingMode {
        self.mode
    }

    pub fn kappa(&self) -> usize {
        self.kappa
    }

    pub fn zero(&self) -> Level {
        match self.mode {
            GradingMode::Symmetric => Level::Symmetric(0),
            GradingMode::Asymmetric => Level::Asymmetric(SlotSet::new()),
        }
    }

    pub fn top(&self) -> Level {
        match self.mode {
            GradingMode::Symmetric => Level::Symmetric(self.kappa),
            GradingMode::Asymmetric => Level::Asymmetric(SlotSet::full(self.kappa)),
        }
    }

    pub fn is_top(&self, level: &Level) -> bool {
        *level == self.top()
    }

    /// Validates a caller-supplied level.
    pub fn check(&self, level: &Level) -> Result<(), LevelViolation> {
        match (self.mode, level) {
            (GradingMode::Symmetric, Level::Symmetric(d)) => {
                if *d <= self.kappa {
                    Ok(())
                } else {
                    Err(LevelViolation::OutOfRange)
                }
            }
            (GradingMode::Asymmetric, Level::Asymmetric(set)) => match set.max_slot() {
                Some(max) if max >= self.kappa => Err(LevelViolation::OutOfRange),
                _ => Ok(()),
            },
            _ => Err(LevelViolation::WrongGrading),
        }
    }

    /// Level of the product of two valid levels.
    pub fn product(&self, left: &Level, right: &Level) -> Result<Level, LevelViolation> {
        match (left, right) {
            (Level::Symmetric(a), Level::Symmetric(b)) => {
                let sum = a.checked_add(*b).ok_or(LevelViolation::DegreeExceeded)?;
                if sum <= self.kappa {
                    Ok(Level::Symmetric(sum))
                } else {
                    Err(LevelViolation::DegreeExceeded)
                }
            }
            (Level::Asymmetric(a), Level::Asymmetric(b)) => {
                if a.is_disjoint(b) {
                    Ok(Level::Asymmetric(a.union(b)))
                } else {
                    Err(LevelViolation::SlotCollision)
                }
            }
            _ => Err(LevelViolation::WrongGrading),
        }
    }

    /// Checks that `target` can be reached from `source` by elevation.
    pub fn check_elevation(&self, source: &Level, target: &Level) -> Result<(), LevelViolation> {
        self.check(target)?;
        match (source, target) {
            (Level::Symmetric(from), Level::Symmetric(to)) if to >= from => Ok(()),
            (Level::Asymmetric(from), Level::Asymmetric(to)) if from.is_subset(to) => Ok(()),
            (Level::Symmetric(_), Level::Symmetric(_))
            | (Level::Asymmetric(_), Level::Asymmetric(_)) => Err(LevelViolation::Unreachable),
            _ => Err(LevelViolation::WrongGrading),
        }
    }
}
