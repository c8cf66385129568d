//! SA configuration and cooling schedules.

use crate::error::ConfigError;

/// Temperature steps assumed by [`CoolingSchedule::Linear`] when no
/// iteration budget is set.
pub const DEFAULT_LINEAR_STEPS: usize = 1000;

/// Cooling schedule for temperature reduction.
///
/// # References
///
/// - Geometric: standard textbook approach
/// - LundyMees: Lundy & Mees (1986), with convergence proof
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum CoolingSchedule {
    /// `T_{k+1} = alpha * T_k`. Typical `alpha`: 0.95 to 0.99.
    Geometric {
        /// Cooling factor in (0, 1). Higher = slower cooling.
        alpha: f64,
    },

    /// `T_k = T_0 - k * (T_0 - T_min) / steps`, where `steps` is
    /// `max_iterations / iterations_per_temperature`.
    Linear,

    /// `T_{k+1} = T_k / (1 + beta * T_k)`, one move per temperature.
    LundyMees {
        /// Typically `(T_0 - T_min) / (max_iter * T_0 * T_min)`.
        beta: f64,
    },
}

impl Default for CoolingSchedule {
    fn default() -> Self {
        CoolingSchedule::Geometric { alpha: 0.95 }
    }
}

/// Configuration for annealing over closed walks.
///
/// # Examples
///
/// ```
/// use u_postman::sa::{CoolingSchedule, SaConfig};
///
/// let config = SaConfig::default()
///     .with_initial_temperature(50.0)
///     .with_min_temperature(0.01)
///     .with_cooling(CoolingSchedule::Geometric { alpha: 0.98 })
///     .with_iterations_per_temperature(200);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(default, rename_all = "camelCase", deny_unknown_fields)
)]
pub struct SaConfig {
    /// Initial temperature. Higher values accept longer detours early on.
    #[cfg_attr(feature = "serde", serde(alias = "maxTemperature"))]
    pub initial_temperature: f64,

    /// The run stops once the temperature drops to this value.
    pub min_temperature: f64,

    pub cooling: CoolingSchedule,

    /// Moves tried at each temperature. Ignored by `LundyMees`.
    pub iterations_per_temperature: usize,

    /// Hard cap on moves. 0 = no limit.
    pub max_iterations: usize,

    /// Random seed for reproducibility.
    pub seed: Option<u64>,

    /// Optional wall-clock limit in milliseconds, checked per temperature.
    pub time_limit_ms: Option<u64>,
}

impl Default for SaConfig {
    fn default() -> Self {
        Self {
            initial_temperature: 100.0,
            min_temperature: 1e-3,
            cooling: CoolingSchedule::default(),
            iterations_per_temperature: 100,
            max_iterations: 0,
            seed: None,
            time_limit_ms: None,
        }
    }
}

impl SaConfig {
    pub fn with_initial_temperature(mut self, t: f64) -> Self {
        self.initial_temperature = t;
        self
    }

    pub fn with_min_temperature(mut self, t: f64) -> Self {
        self.min_temperature = t;
        self
    }

    pub fn with_cooling(mut self, cooling: CoolingSchedule) -> Self {
        self.cooling = cooling;
        self
    }

    pub fn with_iterations_per_temperature(mut self, n: usize) -> Self {
        self.iterations_per_temperature = n;
        self
    }

    pub fn with_max_iterations(mut self, n: usize) -> Self {
        self.max_iterations = n;
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

    /// Preset: fast cooling, 20k moves at most.
    pub fn fast() -> Self {
        Self {
            cooling: CoolingSchedule::Geometric { alpha: 0.9 },
            iterations_per_temperature: 50,
            max_iterations: 20_000,
            time_limit_ms: Some(10_000),
            ..Self::default()
        }
    }

    /// Preset: default schedule capped at 100k moves.
    pub fn balanced() -> Self {
        Self {
            max_iterations: 100_000,
            time_limit_ms: Some(30_000),
            ..Self::default()
        }
    }

    /// Preset: slow cooling with many moves per temperature.
    pub fn quality() -> Self {
        Self {
            cooling: CoolingSchedule::Geometric { alpha: 0.99 },
            iterations_per_temperature: 500,
            max_iterations: 1_000_000,
            time_limit_ms: Some(60_000),
            ..Self::default()
        }
    }

    /// Validates the configuration.
    ///
    /// # Errors
    /// [`ConfigError::InvalidParameter`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.initial_temperature.is_finite() || self.initial_temperature <= 0.0 {
            return Err(ConfigError::invalid(
                "initial_temperature",
                "must be finite and positive",
            ));
        }
        if self.min_temperature.is_nan() || self.min_temperature <= 0.0 {
            return Err(ConfigError::invalid("min_temperature", "must be positive"));
        }
        if self.min_temperature >= self.initial_temperature {
            return Err(ConfigError::invalid(
                "min_temperature",
                "must be less than initial_temperature",
            ));
        }
        if self.iterations_per_temperature == 0 {
            return Err(ConfigError::invalid(
                "iterations_per_temperature",
                "must be positive",
            ));
        }
        match self.cooling {
            CoolingSchedule::Geometric { alpha } => {
                if alpha.is_nan() || alpha <= 0.0 || alpha >= 1.0 {
                    return Err(ConfigError::invalid(
                        "cooling.alpha",
                        format!("must be in (0, 1), got {alpha}"),
                    ));
                }
            }
            CoolingSchedule::LundyMees { beta } => {
                if !beta.is_finite() || beta <= 0.0 {
                    return Err(ConfigError::invalid(
                        "cooling.beta",
                        format!("must be finite and positive, got {beta}"),
                    ));
                }
            }
            CoolingSchedule::Linear => {}
        }
        if self.time_limit_ms == Some(0) {
            return Err(ConfigError::invalid("time_limit_ms", "must be positive or None"));
        }
        Ok(())
    }

    /// Temperature steps of a linear schedule.
    pub(crate) fn linear_steps(&self) -> usize {
        if self.max_iterations > 0 {
            (self.max_iterations / self.iterations_per_temperature).max(1)
        } else {
            DEFAULT_LINEAR_STEPS
        }
    }
}
