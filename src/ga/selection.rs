//! Selection of the intermediate pool and parent pairing.
//!
//! Every generation first draws an intermediate pool from the island
//! ([`SelectionMethod`]), then picks two parents from that pool
//! ([`ParentPairing`]).
//!
//! All strategies **maximize** fitness. Chromosomes must be evaluated
//! before selection; unevaluated ones count as [`WORST_FITNESS`].
//!
//! # References
//!
//! - Blickle & Thiele (1996), "A Comparison of Selection Schemes used in
//!   Evolutionary Algorithms"
//! - Goldberg & Deb (1991), "A Comparative Analysis of Selection Schemes
//!   Used in Genetic Algorithms"
//!
//! [`WORST_FITNESS`]: super::WORST_FITNESS

use super::types::{Chromosome, RouteObjective};
use rand::Rng;

/// How the intermediate pool is drawn from an island.
///
/// # Examples
///
/// ```
/// use u_postman::ga::SelectionMethod;
///
/// // Binary tournament (light selection pressure)
/// let sel = SelectionMethod::Tournament(2);
///
/// // Fitness-proportionate
/// let sel = SelectionMethod::RouletteWheel;
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum SelectionMethod {
    /// Sample `k` chromosomes with replacement, keep the fittest; repeat
    /// until the pool is as large as the island.
    Tournament(usize),

    /// Fitness-proportionate sampling.
    ///
    /// Fitness values are negative lengths, so weights are shifted by the
    /// worst finite fitness. Infeasible chromosomes keep a tiny weight.
    RouletteWheel,

    /// The whole island is the pool.
    Identity,
}

impl Default for SelectionMethod {
    fn default() -> Self {
        SelectionMethod::Tournament(2)
    }
}

impl SelectionMethod {
    /// Draws an intermediate pool of `entities.len()` chromosomes.
    pub fn select_pool<R: Rng>(&self, entities: &[Chromosome], rng: &mut R) -> Vec<Chromosome> {
        if entities.is_empty() {
            return Vec::new();
        }
        match self {
            SelectionMethod::Tournament(k) => (0..entities.len())
                .map(|_| entities[tournament(entities, *k, rng)].clone())
                .collect(),
            SelectionMethod::RouletteWheel => {
                let weights = roulette_weights(entities);
                (0..entities.len())
                    .map(|_| entities[spin(&weights, rng)].clone())
                    .collect()
            }
            SelectionMethod::Identity => entities.to_vec(),
        }
    }
}

/// Tournament selection: pick `k` random chromosomes, return the fittest.
pub(crate) fn tournament<R: Rng>(entities: &[Chromosome], k: usize, rng: &mut R) -> usize {
    let k = k.max(1);
    let n = entities.len();

    let mut best_idx = rng.random_range(0..n);
    for _ in 1..k {
        let idx = rng.random_range(0..n);
        if entities[idx].fitness_or_worst() > entities[best_idx].fitness_or_worst() {
            best_idx = idx;
        }
    }
    best_idx
}

/// Shifted roulette weights: `w_i = f_i - f_min + epsilon` over finite
/// fitness values; non-finite fitness gets `epsilon`.
fn roulette_weights(entities: &[Chromosome]) -> Vec<f64> {
    let epsilon = 1e-10;
    let min_finite = entities
        .iter()
        .map(Chromosome::fitness_or_worst)
        .filter(|f| f.is_finite())
        .fold(f64::INFINITY, f64::min);

    entities
        .iter()
        .map(|c| {
            let f = c.fitness_or_worst();
            if f.is_finite() {
                f - min_finite + epsilon
            } else {
                epsilon
            }
        })
        .collect()
}

fn spin<R: Rng>(weights: &[f64], rng: &mut R) -> usize {
    let total: f64 = weights.iter().sum();
    if total <= 0.0 || !total.is_finite() {
        return rng.random_range(0..weights.len());
    }

    let threshold = rng.random_range(0.0..total);
    let mut cumulative = 0.0;
    for (i, &w) in weights.iter().enumerate() {
        cumulative += w;
        if cumulative > threshold {
            return i;
        }
    }

    weights.len() - 1 // floating-point fallback
}

/// How two parents are picked from the intermediate pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum ParentPairing {
    /// Two uniformly random chromosomes (possibly the same one).
    #[default]
    Panmixia,

    /// A random first parent and the chromosome closest to it.
    Inbreeding,

    /// A random first parent and the chromosome farthest from it.
    Outbreeding,
}

impl ParentPairing {
    /// Picks two parents from `pool`.
    ///
    /// Inbreeding and outbreeding skip entries sharing the first parent's id
    /// (copies of it in the pool). If nothing else remains the first parent
    /// is paired with itself.
    ///
    /// # Panics
    /// Panics if `pool` is empty.
    pub fn pair<'a, O, R>(
        &self,
        pool: &'a [Chromosome],
        objective: &O,
        rng: &mut R,
    ) -> (&'a Chromosome, &'a Chromosome)
    where
        O: RouteObjective + ?Sized,
        R: Rng,
    {
        assert!(!pool.is_empty(), "cannot pair parents from an empty pool");

        let first = &pool[rng.random_range(0..pool.len())];
        let second = match self {
            ParentPairing::Panmixia => &pool[rng.random_range(0..pool.len())],
            ParentPairing::Inbreeding => extreme_by_distance(pool, first, objective, false),
            ParentPairing::Outbreeding => extreme_by_distance(pool, first, objective, true),
        };
        (first, second)
    }
}

/// The first chromosome (in pool order) minimizing or maximizing the
/// distance to `first`, excluding copies of `first`.
fn extreme_by_distance<'a, O: RouteObjective + ?Sized>(
    pool: &'a [Chromosome],
    first: &'a Chromosome,
    objective: &O,
    farthest: bool,
) -> &'a Chromosome {
    let mut chosen: Option<(&Chromosome, f64)> = None;
    for candidate in pool.iter().filter(|c| c.id() != first.id()) {
        let d = objective.distance(first.genes(), candidate.genes());
        let better = match chosen {
            None => true,
            Some((_, best)) if farthest => d > best,
            Some((_, best)) => d < best,
        };
        if better {
            chosen = Some((candidate, d));
        }
    }
    chosen.map_or(first, |(c, _)| c)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::EdgeIdx;
    use crate::random::create_rng;

    /// Fitness is the first gene; distance is the difference of first genes.
    struct FirstGene;

    impl RouteObjective for FirstGene {
        fn fitness(&self, genes: &[EdgeIdx]) -> f64 {
            genes[0] as f64
        }

        fn distance(&self, a: &[EdgeIdx], b: &[EdgeIdx]) -> f64 {
            (a[0] as f64 - b[0] as f64).abs()
        }
    }

    fn make_pool(values: &[EdgeIdx]) -> Vec<Chromosome> {
        values
            .iter()
            .map(|&v| {
                let mut c = Chromosome::new(vec![v]);
                c.evaluate(&FirstGene);
                c
            })
            .collect()
    }

    fn count_first_genes(pool: &[Chromosome], max: usize) -> Vec<u32> {
        let mut counts = vec![0u32; max + 1];
        for c in pool {
            counts[c.genes()[0]] += 1;
        }
        counts
    }

    #[test]
    fn test_pool_has_population_size() {
        let entities = make_pool(&[1, 2, 3, 4, 5]);
        let mut rng = create_rng(42);
        for method in [
            SelectionMethod::Tournament(2),
            SelectionMethod::RouletteWheel,
            SelectionMethod::Identity,
        ] {
            let pool = method.select_pool(&entities, &mut rng);
            assert_eq!(pool.len(), entities.len(), "{method:?}");
        }
    }

    #[test]
    fn test_tournament_favors_fittest() {
        let entities = make_pool(&[10, 5, 1, 8]);
        let mut rng = create_rng(42);

        let mut counts = vec![0u32; 11];
        for _ in 0..2500 {
            let pool = SelectionMethod::Tournament(4).select_pool(&entities, &mut rng);
            for (i, c) in count_first_genes(&pool, 10).into_iter().enumerate() {
                counts[i] += c;
            }
        }
        let total: u32 = counts.iter().sum();
        assert!(
            counts[10] * 10 > total * 6,
            "expected the fittest >60% of the time, got {}/{total}",
            counts[10]
        );
    }

    #[test]
    fn test_roulette_favors_fittest() {
        let entities = make_pool(&[100, 50, 1, 80]);
        let mut rng = create_rng(42);

        let mut counts = vec![0u32; 101];
        for _ in 0..2500 {
            let pool = SelectionMethod::RouletteWheel.select_pool(&entities, &mut rng);
            for (i, c) in count_first_genes(&pool, 100).into_iter().enumerate() {
                counts[i] += c;
            }
        }
        assert!(
            counts[100] > counts[1],
            "best should be drawn more often: best={}, worst={}",
            counts[100],
            counts[1]
        );
    }

    #[test]
    fn test_roulette_survives_infeasible() {
        let mut entities = make_pool(&[3, 4]);
        entities.push(Chromosome::new(vec![0]));
        let weights = roulette_weights(&entities);
        assert!(weights.iter().all(|w| *w > 0.0 && w.is_finite()));
        assert!(weights[1] > weights[0]);
    }

    #[test]
    fn test_identity_keeps_order() {
        let entities = make_pool(&[3, 1, 2]);
        let mut rng = create_rng(1);
        let pool = SelectionMethod::Identity.select_pool(&entities, &mut rng);
        let ids: Vec<u64> = pool.iter().map(Chromosome::id).collect();
        let expected: Vec<u64> = entities.iter().map(Chromosome::id).collect();
        assert_eq!(ids, expected);
    }

    #[test]
    fn test_inbreeding_picks_closest() {
        let pool = make_pool(&[0, 10, 11, 30]);
        let mut rng = create_rng(42);
        for _ in 0..50 {
            let (a, b) = ParentPairing::Inbreeding.pair(&pool, &FirstGene, &mut rng);
            assert_ne!(a.id(), b.id());
            let expected = match a.genes()[0] {
                0 => 10,
                10 => 11,
                11 => 10,
                _ => 11,
            };
            assert_eq!(b.genes()[0], expected);
        }
    }

    #[test]
    fn test_outbreeding_picks_farthest() {
        let pool = make_pool(&[0, 10, 11, 30]);
        let mut rng = create_rng(42);
        for _ in 0..50 {
            let (a, b) = ParentPairing::Outbreeding.pair(&pool, &FirstGene, &mut rng);
            let expected = if a.genes()[0] == 30 { 0 } else { 30 };
            assert_eq!(b.genes()[0], expected);
        }
    }

    #[test]
    fn test_pairing_single_entity_pairs_with_itself() {
        let pool = make_pool(&[7]);
        let mut rng = create_rng(42);
        let (a, b) = ParentPairing::Inbreeding.pair(&pool, &FirstGene, &mut rng);
        assert_eq!(a.id(), b.id());
    }
}
