//! Ant colony configuration.

use crate::error::ConfigError;
use crate::graph::NodeIdx;

/// Times an ant is re-launched after failing to build a walk.
pub const DEFAULT_MAX_ATTEMPTS: usize = 10;

/// Configuration for the ant colony optimizer.
///
/// # Examples
///
/// ```
/// use u_postman::aco::AntColonyConfig;
///
/// let config = AntColonyConfig::default()
///     .with_iteration_count(50)
///     .with_ant_count(20)
///     .with_alpha(1.0)
///     .with_beta(3.0)
///     .with_remaining_pheromone_rate(0.6)
///     .with_seed(7);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(default, rename_all = "camelCase", deny_unknown_fields)
)]
pub struct AntColonyConfig {
    /// Number of colony iterations.
    pub iteration_count: usize,

    /// Ants launched per iteration.
    pub ant_count: usize,

    /// Initial pheromone level on every edge (τ0).
    pub start_pheromone: f64,

    /// Numerator of the heuristic term `proximity / weight`.
    pub proximity_coefficient: f64,

    /// Weight of the pheromone term in the transition rule.
    pub alpha: f64,

    /// Weight of the heuristic term in the transition rule.
    pub beta: f64,

    /// Fraction of pheromone kept after each iteration (ρ), in `[0, 1)`.
    pub remaining_pheromone_rate: f64,

    /// Deposit numerator: each walk adds `q / length` per edge occurrence.
    pub q: f64,

    /// Start vertex of every ant. `None` picks one at random per run.
    pub start_node: Option<NodeIdx>,

    /// Attempts per ant before it is dropped from the iteration.
    pub max_attempts: usize,

    /// Ants handled by one task. `None` sizes batches from `ant_count`:
    /// n/10 up to 100 ants, n/100 up to 1000, n/500 beyond (at least 1).
    pub ants_per_task: Option<usize>,

    /// Whether ant batches run in parallel using rayon.
    pub parallel: bool,

    /// Random seed for reproducibility.
    pub seed: Option<u64>,

    /// Optional wall-clock limit in milliseconds, checked between iterations.
    pub time_limit_ms: Option<u64>,
}

impl Default for AntColonyConfig {
    fn default() -> Self {
        Self {
            iteration_count: 100,
            ant_count: 50,
            start_pheromone: 1.0,
            proximity_coefficient: 1.0,
            alpha: 1.0,
            beta: 2.0,
            remaining_pheromone_rate: 0.5,
            q: 1.0,
            start_node: None,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            ants_per_task: None,
            parallel: true,
            seed: None,
            time_limit_ms: None,
        }
    }
}

impl AntColonyConfig {
    pub fn with_iteration_count(mut self, n: usize) -> Self {
        self.iteration_count = n;
        self
    }

    pub fn with_ant_count(mut self, n: usize) -> Self {
        self.ant_count = n;
        self
    }

    pub fn with_start_pheromone(mut self, tau0: f64) -> Self {
        self.start_pheromone = tau0;
        self
    }

    pub fn with_proximity_coefficient(mut self, proximity: f64) -> Self {
        self.proximity_coefficient = proximity;
        self
    }

    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn with_beta(mut self, beta: f64) -> Self {
        self.beta = beta;
        self
    }

    pub fn with_remaining_pheromone_rate(mut self, rho: f64) -> Self {
        self.remaining_pheromone_rate = rho;
        self
    }

    pub fn with_q(mut self, q: f64) -> Self {
        self.q = q;
        self
    }

    pub fn with_start_node(mut self, node: NodeIdx) -> Self {
        self.start_node = Some(node);
        self
    }

    pub fn with_max_attempts(mut self, n: usize) -> Self {
        self.max_attempts = n;
        self
    }

    pub fn with_ants_per_task(mut self, n: usize) -> Self {
        self.ants_per_task = Some(n);
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

    /// Preset for quick answers: 30 iterations of 20 ants.
    pub fn fast() -> Self {
        Self {
            iteration_count: 30,
            ant_count: 20,
            time_limit_ms: Some(10_000),
            ..Self::default()
        }
    }

    /// Preset: 100 iterations of 50 ants.
    pub fn balanced() -> Self {
        Self {
            time_limit_ms: Some(30_000),
            ..Self::default()
        }
    }

    /// Preset for the best routes: 300 iterations of 200 ants with slower
    /// evaporation.
    pub fn quality() -> Self {
        Self {
            iteration_count: 300,
            ant_count: 200,
            remaining_pheromone_rate: 0.7,
            time_limit_ms: Some(60_000),
            ..Self::default()
        }
    }

    /// Number of ants each task simulates.
    pub fn resolved_ants_per_task(&self) -> usize {
        let n = self.ant_count;
        let per_task = self.ants_per_task.unwrap_or(match n {
            0..=100 => n / 10,
            101..=1000 => n / 100,
            _ => n / 500,
        });
        per_task.max(1)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    /// [`ConfigError::InvalidParameter`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.iteration_count == 0 {
            return Err(ConfigError::invalid("iteration_count", "must be positive"));
        }
        if self.ant_count == 0 {
            return Err(ConfigError::invalid("ant_count", "must be positive"));
        }
        if !self.start_pheromone.is_finite() || self.start_pheromone < 0.0 {
            return Err(ConfigError::invalid(
                "start_pheromone",
                "must be finite and non-negative",
            ));
        }
        if !self.proximity_coefficient.is_finite() || self.proximity_coefficient <= 0.0 {
            return Err(ConfigError::invalid(
                "proximity_coefficient",
                "must be finite and positive",
            ));
        }
        for (name, value) in [("alpha", self.alpha), ("beta", self.beta), ("q", self.q)] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::invalid(name, "must be finite and non-negative"));
            }
        }
        if !(0.0..1.0).contains(&self.remaining_pheromone_rate) {
            return Err(ConfigError::invalid(
                "remaining_pheromone_rate",
                "must be in [0, 1)",
            ));
        }
        if self.max_attempts == 0 {
            return Err(ConfigError::invalid("max_attempts", "must be positive"));
        }
        if self.ants_per_task == Some(0) {
            return Err(ConfigError::invalid("ants_per_task", "must be positive or None"));
        }
        if self.time_limit_ms == Some(0) {
            return Err(ConfigError::invalid("time_limit_ms", "must be positive or None"));
        }
        Ok(())
    }
}
