//! Per-edge pheromone levels.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::graph::EdgeIdx;

/// Pheromone levels parallel to a graph's edge array.
///
/// Levels are `f64` values stored as bits in [`AtomicU64`] so that ants of
/// the same iteration can deposit concurrently through a shared reference.
/// Evaporation needs exclusive access and runs between iterations.
#[derive(Debug)]
pub struct PheromoneGraph {
    levels: Vec<AtomicU64>,
}

impl PheromoneGraph {
    /// Every one of `edge_count` edges starts at `initial`.
    pub fn new(edge_count: usize, initial: f64) -> Self {
        Self {
            levels: (0..edge_count)
                .map(|_| AtomicU64::new(initial.to_bits()))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Current level of `edge`.
    pub fn level(&self, edge: EdgeIdx) -> f64 {
        f64::from_bits(self.levels[edge].load(Ordering::Acquire))
    }

    /// Snapshot of every level.
    pub fn levels(&self) -> Vec<f64> {
        (0..self.levels.len()).map(|e| self.level(e)).collect()
    }

    /// Multiplies every level by `remaining`.
    pub fn evaporate(&mut self, remaining: f64) {
        for level in &mut self.levels {
            let value = level.get_mut();
            *value = (f64::from_bits(*value) * remaining).to_bits();
        }
    }

    /// Adds `amount` to every edge occurrence of `walk`; an edge traversed
    /// twice receives the deposit twice.
    pub fn deposit(&self, walk: &[EdgeIdx], amount: f64) {
        for &edge in walk {
            // The closure never returns None, so the update always succeeds.
            let _ = self.levels[edge].fetch_update(Ordering::AcqRel, Ordering::Acquire, |bits| {
                Some((f64::from_bits(bits) + amount).to_bits())
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evaporation_scales_every_level() {
        let mut ph = PheromoneGraph::new(3, 2.0);
        ph.deposit(&[1], 1.0);
        ph.evaporate(0.25);
        assert_eq!(ph.levels(), vec![0.5, 0.75, 0.5]);
    }

    #[test]
    fn test_deposit_counts_occurrences() {
        let ph = PheromoneGraph::new(2, 0.0);
        ph.deposit(&[0, 1, 0], 0.5);
        assert_eq!(ph.level(0), 1.0);
        assert_eq!(ph.level(1), 0.5);
    }

    #[test]
    fn test_concurrent_deposits_are_not_lost() {
        let ph = PheromoneGraph::new(1, 0.0);
        std::thread::scope(|s| {
            for _ in 0..8 {
                s.spawn(|| {
                    for _ in 0..1000 {
                        ph.deposit(&[0], 1.0);
                    }
                });
            }
        });
        assert_eq!(ph.level(0), 8000.0);
    }
}
