//! SA execution loop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use rand::Rng;

use super::config::{CoolingSchedule, SaConfig};
use super::types::SaProblem;
use crate::error::Result;
use crate::random::master_rng;

/// Result of a Simulated Annealing run.
#[derive(Debug, Clone)]
pub struct SaResult<S: Clone> {
    /// The best state found.
    pub best: S,

    /// Energy of the best state.
    pub best_cost: f64,

    /// Total number of moves evaluated.
    pub iterations: usize,

    /// Temperature when the run stopped.
    pub final_temperature: f64,

    /// Accepted moves, improving ones included.
    pub accepted_moves: usize,

    pub improving_moves: usize,

    /// Whether cancelled externally.
    pub cancelled: bool,

    /// Whether the wall-clock limit stopped the run.
    pub timed_out: bool,

    /// Best energy sampled every `max(100, iterations_per_temperature)` moves.
    pub cost_history: Vec<f64>,
}

/// Executes the Simulated Annealing algorithm.
///
/// # Usage
///
/// ```
/// use u_postman::graph::Graph;
/// use u_postman::sa::{ClosedWalkProblem, SaConfig, SaRunner};
///
/// let graph = Graph::builder()
///     .node("a", "A")
///     .node("b", "B")
///     .node("c", "C")
///     .directed("ab", "a", "b", 1.0)
///     .directed("bc", "b", "c", 1.0)
///     .directed("ca", "c", "a", 1.0)
///     .build()
///     .unwrap();
/// let problem = ClosedWalkProblem::new(&graph, 0);
/// let result = SaRunner::run(&problem, &SaConfig::fast().with_seed(42)).unwrap();
/// assert_eq!(result.best_cost, 3.0);
/// ```
pub struct SaRunner;

impl SaRunner {
    /// Runs SA optimization.
    ///
    /// # Errors
    /// - [`Error::Configuration`](crate::Error::Configuration) for an
    ///   invalid config
    /// - [`Error::NoPath`](crate::Error::NoPath) when no initial state can
    ///   be built
    pub fn run<P: SaProblem>(problem: &P, config: &SaConfig) -> Result<SaResult<P::Solution>> {
        Self::run_with_cancel(problem, config, None)
    }

    /// Runs SA with an optional cancellation token, checked once per
    /// temperature level.
    pub fn run_with_cancel<P: SaProblem>(
        problem: &P,
        config: &SaConfig,
        cancel: Option<Arc<AtomicBool>>,
    ) -> Result<SaResult<P::Solution>> {
        config.validate()?;
        let started = Instant::now();
        let mut rng = master_rng(config.seed);

        let mut current = problem.initial_solution(&mut rng)?;
        let mut current_cost = problem.cost(&current);
        let mut best = current.clone();
        let mut best_cost = current_cost;
        log::info!(
            "simulated annealing: T0 {}, Tmin {}, {:?}, initial energy {current_cost}",
            config.initial_temperature,
            config.min_temperature,
            config.cooling
        );

        let mut temperature = config.initial_temperature;
        let mut total_iterations = 0usize;
        let mut accepted_moves = 0usize;
        let mut improving_moves = 0usize;
        let mut cancelled = false;
        let mut timed_out = false;

        let linear_steps = config.linear_steps();
        let history_interval = 100.max(config.iterations_per_temperature);
        let mut cost_history = vec![best_cost];
        let inner_iters = match config.cooling {
            CoolingSchedule::LundyMees { .. } => 1,
            _ => config.iterations_per_temperature,
        };
        let budget_spent =
            |moves: usize| config.max_iterations > 0 && moves >= config.max_iterations;

        let mut step = 0usize;
        while temperature > config.min_temperature {
            if let Some(ref flag) = cancel {
                if flag.load(Ordering::Relaxed) {
                    cancelled = true;
                    break;
                }
            }
            if let Some(limit) = config.time_limit_ms {
                if started.elapsed().as_millis() as u64 >= limit {
                    timed_out = true;
                    break;
                }
            }

            for _ in 0..inner_iters {
                if budget_spent(total_iterations) {
                    break;
                }

                let neighbor = problem.neighbor(&current, &mut rng);
                let neighbor_cost = problem.cost(&neighbor);
                let delta = neighbor_cost - current_cost;

                // Metropolis criterion; NaN deltas (∞ - ∞) are rejected.
                let accept = if delta < 0.0 {
                    improving_moves += 1;
                    true
                } else {
                    rng.random::<f64>() < (-delta / temperature).exp()
                };

                if accept {
                    current = neighbor;
                    current_cost = neighbor_cost;
                    accepted_moves += 1;

                    if current_cost < best_cost {
                        best = current.clone();
                        best_cost = current_cost;
                        log::debug!("best energy {best_cost} at move {total_iterations}");
                    }
                }

                total_iterations += 1;
                if total_iterations % history_interval == 0 {
                    cost_history.push(best_cost);
                }
            }

            if budget_spent(total_iterations) {
                break;
            }

            temperature = cool(temperature, config, step, linear_steps);
            step += 1;
        }

        if cost_history.last().is_none_or(|&last| last != best_cost) {
            cost_history.push(best_cost);
        }
        log::info!(
            "simulated annealing finished after {total_iterations} moves: best energy {best_cost}"
        );

        Ok(SaResult {
            best,
            best_cost,
            iterations: total_iterations,
            final_temperature: temperature,
            accepted_moves,
            improving_moves,
            cancelled,
            timed_out,
            cost_history,
        })
    }
}

/// Next temperature under the configured schedule.
fn cool(temperature: f64, config: &SaConfig, step: usize, linear_steps: usize) -> f64 {
    match config.cooling {
        CoolingSchedule::Geometric { alpha } => temperature * alpha,
        CoolingSchedule::Linear => {
            let t = config.initial_temperature
                - (step + 1) as f64 * (config.initial_temperature - config.min_temperature)
                    / linear_steps as f64;
            t.max(config.min_temperature)
        }
        CoolingSchedule::LundyMees { beta } => temperature / (1.0 + beta * temperature),
    }
}
