use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{LoadTestError, Result, traffic::TrafficPattern};

/// Width of the draw used for weighted selection. Weights are read as percentages.
pub const SELECTION_RANGE: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct PatternWeight {
    pub pattern: TrafficPattern,
    pub weight: u32,
}

/// Ordered (pattern, weight) list. Iteration order is the selection order.
///
/// Selection draws `r` from `[0, 100)` and takes the first pattern whose
/// cumulative weight reaches `r`. When the weights sum to less than 100 the last
/// pattern absorbs the remainder, and when they sum to more, whatever sits past
/// the 100 mark is never chosen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternTable {
    entries: Vec<PatternWeight>,
}

impl PatternTable {
    pub fn new(entries: Vec<PatternWeight>) -> Result<Self> {
        if entries.is_empty() {
            return Err(LoadTestError::config("traffic pattern table is empty"));
        }
        if entries.iter().all(|e| e.weight == 0) {
            return Err(LoadTestError::config("traffic pattern weights are all zero"));
        }
        for (idx, entry) in entries.iter().enumerate() {
            if entries[..idx].iter().any(|e| e.pattern == entry.pattern) {
                return Err(LoadTestError::config(format!(
                    "traffic pattern {} listed twice",
                    entry.pattern
                )));
            }
        }
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[PatternWeight] {
        &self.entries
    }

    pub fn total_weight(&self) -> u64 {
        self.entries.iter().map(|e| e.weight as u64).sum()
    }

    /// Deterministic half of the selection: maps a draw `r` onto a pattern.
    pub fn pick(&self, r: f64) -> TrafficPattern {
        let mut cumulative = 0u64;
        for entry in &self.entries {
            cumulative += entry.weight as u64;
            if r <= cumulative as f64 {
                return entry.pattern;
            }
        }
        // `new` guarantees at least one entry
        self.entries[self.entries.len() - 1].pattern
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> TrafficPattern {
        self.pick(rng.gen_range(0.0..SELECTION_RANGE))
    }
}

impl Default for PatternTable {
    fn default() -> Self {
        let weights = [15, 20, 15, 15, 15, 10, 10];
        Self {
            entries: TrafficPattern::ALL
                .into_iter()
                .zip(weights)
                .map(|(pattern, weight)| PatternWeight { pattern, weight })
                .collect(),
        }
    }
}
