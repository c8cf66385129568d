//! GA entities and the objective contract.
//!
//! A [`Chromosome`] is a candidate walk: an ordered sequence of edge
//! indices. Its fitness is computed by a [`RouteObjective`] and memoized
//! until the genes change.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::graph::EdgeIdx;

/// Fitness of a chromosome that is not a usable route.
///
/// The engine maximizes, so every feasible route scores strictly above this.
pub const WORST_FITNESS: f64 = f64::NEG_INFINITY;

static NEXT_CHROMOSOME_ID: AtomicU64 = AtomicU64::new(0);

/// Scores candidate walks for the genetic engine.
///
/// Implementations are shared by all island tasks, hence `Send + Sync`.
///
/// # Examples
///
/// ```
/// use u_postman::ga::{RouteObjective, WORST_FITNESS};
///
/// /// Prefers short walks, ignoring coverage.
/// struct Shortest;
///
/// impl RouteObjective for Shortest {
///     fn fitness(&self, genes: &[usize]) -> f64 {
///         if genes.is_empty() { WORST_FITNESS } else { -(genes.len() as f64) }
///     }
///
///     fn distance(&self, a: &[usize], b: &[usize]) -> f64 {
///         a.iter().zip(b).filter(|(x, y)| x != y).count() as f64
///     }
/// }
/// ```
pub trait RouteObjective: Send + Sync {
    /// Desirability of a walk. Higher is better; infeasible walks return
    /// [`WORST_FITNESS`].
    fn fitness(&self, genes: &[EdgeIdx]) -> f64;

    /// Dissimilarity of two walks, used by inbreeding and outbreeding.
    fn distance(&self, a: &[EdgeIdx], b: &[EdgeIdx]) -> f64;
}

/// A candidate walk with a memoized fitness.
#[derive(Debug, Clone)]
pub struct Chromosome {
    id: u64,
    genes: Vec<EdgeIdx>,
    fitness: Option<f64>,
}

impl Chromosome {
    /// Creates an unevaluated chromosome with a fresh id.
    pub fn new(genes: Vec<EdgeIdx>) -> Self {
        debug_assert!(!genes.is_empty(), "chromosome genes must not be empty");
        Self {
            id: NEXT_CHROMOSOME_ID.fetch_add(1, Ordering::Relaxed),
            genes,
            fitness: None,
        }
    }

    /// Identity of this chromosome. Clones share it; offspring get new ones.
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn genes(&self) -> &[EdgeIdx] {
        &self.genes
    }

    /// Mutable access to the genes. Clears the memoized fitness.
    pub fn genes_mut(&mut self) -> &mut Vec<EdgeIdx> {
        self.fitness = None;
        &mut self.genes
    }

    pub fn into_genes(self) -> Vec<EdgeIdx> {
        self.genes
    }

    /// The memoized fitness, if evaluated since the last gene change.
    pub fn fitness(&self) -> Option<f64> {
        self.fitness
    }

    /// The memoized fitness, or [`WORST_FITNESS`] when not yet evaluated.
    pub fn fitness_or_worst(&self) -> f64 {
        self.fitness.unwrap_or(WORST_FITNESS)
    }

    /// Evaluates (once) and returns the fitness.
    pub fn evaluate<O: RouteObjective + ?Sized>(&mut self, objective: &O) -> f64 {
        match self.fitness {
            Some(f) => f,
            None => {
                let f = objective.fitness(&self.genes);
                self.fitness = Some(f);
                f
            }
        }
    }
}

/// A named group of chromosomes evolved together (one island).
#[derive(Debug, Clone, Default)]
pub struct Population {
    pub name: String,
    pub entities: Vec<Chromosome>,
}

impl Population {
    pub fn new(name: impl Into<String>, entities: Vec<Chromosome>) -> Self {
        Self {
            name: name.into(),
            entities,
        }
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Evaluates every chromosome whose fitness is not memoized.
    pub fn evaluate<O: RouteObjective + ?Sized>(&mut self, objective: &O) {
        for entity in &mut self.entities {
            entity.evaluate(objective);
        }
    }

    /// Sorts by fitness, best first.
    pub fn sort_by_fitness_desc(&mut self) {
        sort_desc(&mut self.entities);
    }

    /// The fittest chromosome.
    pub fn best(&self) -> Option<&Chromosome> {
        self.entities.iter().fold(None, |best, c| match best {
            Some(b) if b.fitness_or_worst() >= c.fitness_or_worst() => Some(b),
            _ => Some(c),
        })
    }
}

/// Stable sort, best fitness first.
pub(crate) fn sort_desc(entities: &mut [Chromosome]) {
    entities.sort_by(|a, b| {
        b.fitness_or_worst()
            .partial_cmp(&a.fitness_or_worst())
            .unwrap_or(std::cmp::Ordering::Equal)
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NegLen;

    impl RouteObjective for NegLen {
        fn fitness(&self, genes: &[EdgeIdx]) -> f64 {
            -(genes.len() as f64)
        }

        fn distance(&self, _: &[EdgeIdx], _: &[EdgeIdx]) -> f64 {
            0.0
        }
    }

    #[test]
    fn test_fitness_is_memoized_and_cleared() {
        let mut c = Chromosome::new(vec![0, 1, 2]);
        assert_eq!(c.fitness(), None);
        assert_eq!(c.evaluate(&NegLen), -3.0);
        assert_eq!(c.fitness(), Some(-3.0));

        c.genes_mut().push(3);
        assert_eq!(c.fitness(), None, "gene change must clear fitness");
        assert_eq!(c.evaluate(&NegLen), -4.0);
    }

    #[test]
    fn test_ids_are_unique_but_clones_share() {
        let a = Chromosome::new(vec![0]);
        let b = Chromosome::new(vec![0]);
        assert_ne!(a.id(), b.id());
        assert_eq!(a.clone().id(), a.id());
    }

    #[test]
    fn test_population_sort_and_best() {
        let mut pop = Population::new(
            "island-0",
            vec![
                Chromosome::new(vec![0, 0, 0]),
                Chromosome::new(vec![0]),
                Chromosome::new(vec![0, 0]),
            ],
        );
        pop.entities.push(Chromosome::new(vec![1; 5]));
        pop.evaluate(&NegLen);
        assert_eq!(pop.best().map(|c| c.genes().len()), Some(1));

        pop.sort_by_fitness_desc();
        let lens: Vec<usize> = pop.entities.iter().map(|c| c.genes().len()).collect();
        assert_eq!(lens, vec![1, 2, 3, 5]);
    }

    #[test]
    fn test_unevaluated_counts_as_worst() {
        let c = Chromosome::new(vec![4]);
        assert_eq!(c.fitness_or_worst(), WORST_FITNESS);
    }
}
