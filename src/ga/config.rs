//! GA configuration.
//!
//! [`GaConfig`] holds all parameters that control the island-model loop.

use super::operators::{Mutation, Recombination};
use super::replacement::Replacement;
use super::selection::{ParentPairing, SelectionMethod};
use crate::error::ConfigError;
use crate::graph::NodeIdx;

/// Generations an island evolves in isolation between migrations.
pub const DEFAULT_ISOLATION_ITERATIONS: usize = 15;

/// Configuration for the island-model genetic algorithm.
///
/// # Defaults
///
/// ```
/// use u_postman::ga::GaConfig;
///
/// let config = GaConfig::default();
/// assert_eq!(config.population_size, 100);
/// assert_eq!(config.isolation_iterations, 15);
/// ```
///
/// # Builder Pattern
///
/// ```
/// use u_postman::ga::{GaConfig, Mutation, Replacement, SelectionMethod};
///
/// let config = GaConfig::default()
///     .with_population_size(200)
///     .with_island_count(4)
///     .with_selection(SelectionMethod::Tournament(3))
///     .with_mutation(Some(Mutation::Swapping))
///     .with_mutation_rate(0.2)
///     .with_replacement(Replacement::Truncation(0.5));
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(default, rename_all = "camelCase", deny_unknown_fields)
)]
pub struct GaConfig {
    /// Total number of generations each island runs.
    #[cfg_attr(feature = "serde", serde(alias = "iterationsCount"))]
    pub iteration_count: usize,

    /// Number of chromosomes across all islands.
    pub population_size: usize,

    /// Number of islands. `None` derives it from the population size:
    /// one island below 100 chromosomes, 10 below 1000, otherwise 100.
    pub island_count: Option<usize>,

    /// Generations between two migrations.
    pub isolation_iterations: usize,

    /// Intermediate pool selection.
    pub selection: SelectionMethod,

    /// Parent pairing within the pool.
    pub pairing: ParentPairing,

    /// Recombination operator. `None` passes parents through unchanged.
    pub recombination: Option<Recombination>,

    /// Probability of recombining a pair of parents (0.0–1.0).
    pub recombination_rate: f64,

    /// Mutation operator. `None` disables mutation.
    pub mutation: Option<Mutation>,

    /// Probability of mutating each offspring (0.0–1.0).
    pub mutation_rate: f64,

    /// Next-generation policy.
    pub replacement: Replacement,

    /// Whether seeding walks receive a cataclysmic mutation for diversity.
    pub cataclysmic_seeding: bool,

    /// Start vertex of every walk. `None` picks one at random per run.
    pub start_node: Option<NodeIdx>,

    /// Whether islands evolve in parallel using rayon.
    pub parallel: bool,

    /// Random seed for reproducibility.
    ///
    /// `None` uses a random seed.
    pub seed: Option<u64>,

    /// Optional wall-clock time limit in milliseconds, checked between
    /// epochs.
    pub time_limit_ms: Option<u64>,
}

impl Default for GaConfig {
    fn default() -> Self {
        Self {
            iteration_count: 300,
            population_size: 100,
            island_count: None,
            isolation_iterations: DEFAULT_ISOLATION_ITERATIONS,
            selection: SelectionMethod::default(),
            pairing: ParentPairing::default(),
            recombination: Some(Recombination::ChromosomeCrossover),
            recombination_rate: 0.9,
            mutation: Some(Mutation::EdgeReplacing),
            mutation_rate: 0.1,
            replacement: Replacement::default(),
            cataclysmic_seeding: true,
            start_node: None,
            parallel: true,
            seed: None,
            time_limit_ms: None,
        }
    }
}

impl GaConfig {
    pub fn with_iteration_count(mut self, n: usize) -> Self {
        self.iteration_count = n;
        self
    }

    pub fn with_population_size(mut self, n: usize) -> Self {
        self.population_size = n;
        self
    }

    pub fn with_island_count(mut self, n: usize) -> Self {
        self.island_count = Some(n);
        self
    }

    pub fn with_isolation_iterations(mut self, n: usize) -> Self {
        self.isolation_iterations = n;
        self
    }

    pub fn with_selection(mut self, selection: SelectionMethod) -> Self {
        self.selection = selection;
        self
    }

    pub fn with_pairing(mut self, pairing: ParentPairing) -> Self {
        self.pairing = pairing;
        self
    }

    pub fn with_recombination(mut self, recombination: Option<Recombination>) -> Self {
        self.recombination = recombination;
        self
    }

    /// Sets the recombination rate, clamped to `[0, 1]`.
    pub fn with_recombination_rate(mut self, rate: f64) -> Self {
        self.recombination_rate = rate.clamp(0.0, 1.0);
        self
    }

    pub fn with_mutation(mut self, mutation: Option<Mutation>) -> Self {
        self.mutation = mutation;
        self
    }

    /// Sets the mutation rate, clamped to `[0, 1]`.
    pub fn with_mutation_rate(mut self, rate: f64) -> Self {
        self.mutation_rate = rate.clamp(0.0, 1.0);
        self
    }

    pub fn with_replacement(mut self, replacement: Replacement) -> Self {
        self.replacement = replacement;
        self
    }

    pub fn with_cataclysmic_seeding(mut self, enabled: bool) -> Self {
        self.cataclysmic_seeding = enabled;
        self
    }

    pub fn with_start_node(mut self, node: NodeIdx) -> Self {
        self.start_node = Some(node);
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_time_limit_ms(mut self, ms: u64) -> Self {
        self.time_limit_ms = Some(ms);
        self
    }

    /// Preset for quick feasibility checks.
    ///
    /// - Population: 50, Generations: 90, Time limit: 10s
    pub fn fast() -> Self {
        Self {
            population_size: 50,
            iteration_count: 90,
            time_limit_ms: Some(10_000),
            ..Self::default()
        }
    }

    /// Preset trading quality against time.
    ///
    /// - Population: 100, Generations: 300, Time limit: 30s
    pub fn balanced() -> Self {
        Self {
            population_size: 100,
            iteration_count: 300,
            time_limit_ms: Some(30_000),
            ..Self::default()
        }
    }

    /// Preset for the best routes: ten islands of 50 chromosomes.
    ///
    /// - Population: 500, Generations: 600, Time limit: 60s
    pub fn quality() -> Self {
        Self {
            population_size: 500,
            iteration_count: 600,
            time_limit_ms: Some(60_000),
            ..Self::default()
        }
    }

    /// Selects a preset from the number of edges to cover.
    ///
    /// - `edge_count < 50` → [`fast()`](Self::fast)
    /// - `50 ≤ edge_count < 200` → [`balanced()`](Self::balanced)
    /// - `edge_count ≥ 200` → [`quality()`](Self::quality)
    pub fn auto_select(edge_count: usize) -> Self {
        if edge_count < 50 {
            Self::fast()
        } else if edge_count < 200 {
            Self::balanced()
        } else {
            Self::quality()
        }
    }

    /// Number of islands the run will use.
    pub fn resolved_island_count(&self) -> usize {
        let islands = self.island_count.unwrap_or(match self.population_size {
            0..100 => 1,
            100..1000 => 10,
            _ => 100,
        });
        islands.clamp(1, self.population_size.max(1))
    }

    /// Validates the configuration.
    ///
    /// # Errors
    /// [`ConfigError::InvalidParameter`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.iteration_count == 0 {
            return Err(ConfigError::invalid("iteration_count", "must be positive"));
        }
        if self.population_size == 0 {
            return Err(ConfigError::invalid("population_size", "must be positive"));
        }
        if self.isolation_iterations == 0 {
            return Err(ConfigError::invalid(
                "isolation_iterations",
                "must be positive",
            ));
        }
        if let Some(islands) = self.island_count {
            if islands == 0 || islands > self.population_size {
                return Err(ConfigError::invalid(
                    "island_count",
                    format!("must be in 1..={}", self.population_size),
                ));
            }
        }
        if self.selection == SelectionMethod::Tournament(0) {
            return Err(ConfigError::invalid("selection", "tournament size must be positive"));
        }
        for (name, rate) in [
            ("recombination_rate", self.recombination_rate),
            ("mutation_rate", self.mutation_rate),
        ] {
            if !(0.0..=1.0).contains(&rate) {
                return Err(ConfigError::invalid(name, "must be in [0, 1]"));
            }
        }
        if let Some(rate) = self.replacement.rate() {
            if !rate.is_finite() || rate < 0.0 {
                return Err(ConfigError::invalid(
                    "replacement",
                    "rate must be finite and non-negative",
                ));
            }
        }
        if self.time_limit_ms == Some(0) {
            return Err(ConfigError::invalid("time_limit_ms", "must be positive or None"));
        }
        Ok(())
    }
}
