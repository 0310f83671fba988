//! Canonical step list, its split into parts, and shuffled tile presentation.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::ops::Range;
use thiserror::Error;

/// A step's display text; also its unique key.
pub type Item = &'static str;

/// The performance cycle, in the order the player has to rebuild it.
pub static CANONICAL_SEQUENCE: [Item; 8] = [
    "Organizational goals",
    "Department goals",
    "Development focused area identifications",
    "Individual Performance goals",
    "Individual Development Plan (IDP)",
    "Discussion with Direct supervisor/ Assessor",
    "Learning Solution implementation and on going feedback",
    "Performance rating and calibration and communication",
];

/// Max tile tilt either way, in degrees.
const MAX_TILT_DEG: f32 = 15.0;
/// Max extra padding around a tile, in terminal cells.
const MAX_MARGIN: u16 = 2;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("at least one part is required")]
    NoParts,
    #[error("part {0} has zero slots")]
    EmptyPart(usize),
    #[error("parts cover {requested} steps but only {available} exist")]
    TooManySteps { requested: usize, available: usize },
}

/// Ordered part lengths. Parts are 1-indexed, slots inside a part are 0-indexed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partitioning {
    lengths: Vec<usize>,
    bases: Vec<usize>,
}

impl Partitioning {
    /// Validate `lengths` against a catalog of `available` steps.
    pub fn new(lengths: &[usize], available: usize) -> Result<Self, ConfigError> {
        if lengths.is_empty() {
            return Err(ConfigError::NoParts);
        }
        if let Some(pos) = lengths.iter().position(|&l| l == 0) {
            return Err(ConfigError::EmptyPart(pos + 1));
        }
        let too_many = |requested| ConfigError::TooManySteps {
            requested,
            available,
        };
        let requested = lengths
            .iter()
            .try_fold(0usize, |acc, &len| acc.checked_add(len))
            .ok_or_else(|| too_many(usize::MAX))?;
        if requested > available {
            return Err(too_many(requested));
        }
        let bases = lengths
            .iter()
            .scan(0, |acc, &len| {
                let base = *acc;
                *acc += len;
                Some(base)
            })
            .collect();
        Ok(Self {
            lengths: lengths.to_vec(),
            bases,
        })
    }

    pub fn part_count(&self) -> usize {
        self.lengths.len()
    }

    /// Total slots across all parts.
    pub fn total(&self) -> usize {
        self.lengths.iter().sum()
    }

    pub fn base(&self, part: usize) -> usize {
        self.bases[part - 1]
    }

    pub fn len(&self, part: usize) -> usize {
        self.lengths[part - 1]
    }

    /// Global slot range of a part.
    pub fn range(&self, part: usize) -> Range<usize> {
        let base = self.base(part);
        base..base + self.len(part)
    }
}

/// One scattered draggable: the item plus its cosmetic jitter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tile {
    pub item: Item,
    /// Degrees in [-15, 15).
    pub tilt: f32,
    /// Extra padding in cells.
    pub margin: u16,
}

/// Random permutations for the tile pool. Seeded runs are reproducible.
#[derive(Debug)]
pub struct SequenceShuffler {
    rng: StdRng,
}

impl SequenceShuffler {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_os_rng(),
        };
        Self { rng }
    }

    /// Uniform permutation (Fisher–Yates).
    pub fn shuffle(&mut self, items: &[Item]) -> Vec<Item> {
        let mut out = items.to_vec();
        out.shuffle(&mut self.rng);
        out
    }

    /// Shuffled tiles for one part, each with its own tilt and margin.
    pub fn present(&mut self, items: &[Item]) -> Vec<Tile> {
        self.shuffle(items)
            .into_iter()
            .map(|item| Tile {
                item,
                tilt: self.rng.random_range(-MAX_TILT_DEG..MAX_TILT_DEG),
                margin: self.rng.random_range(0..=MAX_MARGIN),
            })
            .collect()
    }
}
