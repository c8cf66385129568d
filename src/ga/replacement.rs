//! Replacement policies forming the next generation of an island.

use std::collections::HashSet;

use rand::Rng;

use super::selection::tournament;
use super::types::{sort_desc, Chromosome};
use crate::graph::EdgeIdx;

/// How an island's next generation is formed after offspring insertion.
///
/// Rates above 1 are treated as 1.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum Replacement {
    /// Resample, with replacement, from the top `rate` fraction.
    Truncation(f64),

    /// Keep the top `rate` fraction and backfill the rest by binary
    /// tournament over the whole island.
    Elite(f64),

    /// Drop duplicate gene sequences, keeping the fittest copy. May shrink
    /// the island.
    Exclusion,

    /// Everyone survives.
    Identity,
}

impl Default for Replacement {
    fn default() -> Self {
        Replacement::Elite(0.1)
    }
}

impl Replacement {
    /// Builds the next generation. Chromosomes must be evaluated.
    pub fn apply<R: Rng>(&self, mut entities: Vec<Chromosome>, rng: &mut R) -> Vec<Chromosome> {
        let n = entities.len();
        if n == 0 {
            return entities;
        }
        match *self {
            Replacement::Truncation(rate) => {
                sort_desc(&mut entities);
                let top = top_count(n, rate);
                (0..n)
                    .map(|_| entities[rng.random_range(0..top)].clone())
                    .collect()
            }
            Replacement::Elite(rate) => {
                let top = top_count(n, rate);
                sort_desc(&mut entities);
                let mut next: Vec<Chromosome> = entities[..top].to_vec();
                while next.len() < n {
                    next.push(entities[tournament(&entities, 2, rng)].clone());
                }
                next
            }
            Replacement::Exclusion => {
                sort_desc(&mut entities);
                let mut seen: HashSet<Vec<EdgeIdx>> = HashSet::with_capacity(n);
                entities
                    .into_iter()
                    .filter(|c| seen.insert(c.genes().to_vec()))
                    .collect()
            }
            Replacement::Identity => entities,
        }
    }

    /// The configured rate, if the policy has one.
    pub fn rate(&self) -> Option<f64> {
        match *self {
            Replacement::Truncation(rate) | Replacement::Elite(rate) => Some(rate),
            Replacement::Exclusion | Replacement::Identity => None,
        }
    }
}

/// `ceil(n * rate)`, at least 1 and at most `n`.
fn top_count(n: usize, rate: f64) -> usize {
    let rate = rate.clamp(0.0, 1.0);
    ((n as f64 * rate).ceil() as usize).clamp(1, n)
}
