//! Colony iteration loop.
//!
//! Every iteration evaporates the pheromone graph, dispatches the ants in
//! batches, and lets each finished ant reinforce the edges it walked with
//! `q / length`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use rand::Rng;
use rayon::prelude::*;

use super::ant::Ant;
use super::config::AntColonyConfig;
use super::pheromone::PheromoneGraph;
use crate::error::{ConfigError, Error, Result};
use crate::graph::{EdgeIdx, Graph, NodeIdx};
use crate::random::{create_rng, master_rng, task_seeds};

/// Result of a colony run.
#[derive(Debug, Clone)]
pub struct AntColonyResult {
    /// Shortest closed covering walk found.
    pub best_walk: Vec<EdgeIdx>,

    /// Total weight of [`best_walk`](Self::best_walk).
    pub best_length: f64,

    /// Start vertex of every ant.
    pub start: NodeIdx,

    /// Iterations executed.
    pub iterations: usize,

    /// Ants that exhausted their attempts, summed over all iterations.
    pub dropped_ants: usize,

    /// Whether the run was cancelled externally.
    pub cancelled: bool,

    /// Whether the wall-clock limit stopped the run.
    pub timed_out: bool,

    /// Best length after each iteration (∞ until a walk is found).
    pub length_history: Vec<f64>,

    /// Final pheromone level of every edge.
    pub pheromones: Vec<f64>,
}

/// Executes the ant colony optimizer.
///
/// # Usage
///
/// ```
/// use u_postman::aco::{AntColonyConfig, AntColonyRunner};
/// use u_postman::graph::Graph;
///
/// let graph = Graph::builder()
///     .node("a", "A")
///     .node("b", "B")
///     .node("c", "C")
///     .undirected("ab", "a", "b", 1.0)
///     .undirected("bc", "b", "c", 2.0)
///     .undirected("ca", "c", "a", 3.0)
///     .build()
///     .unwrap();
/// let config = AntColonyConfig::fast().with_start_node(0).with_seed(42);
///
/// let result = AntColonyRunner::run(&graph, &config).unwrap();
/// assert_eq!(result.best_length, 6.0);
/// ```
pub struct AntColonyRunner;

impl AntColonyRunner {
    /// Runs the colony.
    ///
    /// # Errors
    /// - [`Error::Configuration`] for an invalid config or start node
    /// - [`Error::NoFeasibleSolution`] when no ant ever completed a walk
    pub fn run(graph: &Graph, config: &AntColonyConfig) -> Result<AntColonyResult> {
        Self::run_with_cancel(graph, config, None)
    }

    /// Runs the colony with an optional cancellation token, checked between
    /// iterations.
    pub fn run_with_cancel(
        graph: &Graph,
        config: &AntColonyConfig,
        cancel: Option<Arc<AtomicBool>>,
    ) -> Result<AntColonyResult> {
        config.validate()?;
        let started = Instant::now();
        let mut rng = master_rng(config.seed);

        let start = match config.start_node {
            Some(node) if node < graph.node_count() => node,
            Some(node) => return Err(ConfigError::UnknownStartNode(format!("#{node}")).into()),
            None => rng.random_range(0..graph.node_count()),
        };

        let per_task = config.resolved_ants_per_task();
        log::info!(
            "ant colony: {} iterations of {} ants ({} per task), start {}",
            config.iteration_count,
            config.ant_count,
            per_task,
            graph.node(start).label
        );

        let mut pheromones = PheromoneGraph::new(graph.edge_count(), config.start_pheromone);
        let best: Mutex<Option<(Vec<EdgeIdx>, f64)>> = Mutex::new(None);
        let ant_ids: Vec<usize> = (0..config.ant_count).collect();

        let mut iterations = 0usize;
        let mut dropped_ants = 0usize;
        let mut cancelled = false;
        let mut timed_out = false;
        let mut length_history = Vec::with_capacity(config.iteration_count);

        for iteration in 0..config.iteration_count {
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

            pheromones.evaporate(config.remaining_pheromone_rate);

            let seeds = task_seeds(&mut rng, config.ant_count.div_ceil(per_task));
            let shared = &pheromones;
            let run_batch = |(batch, &seed): (&[usize], &u64)| {
                let mut task_rng = create_rng(seed);
                let mut dropped = 0usize;
                for &id in batch {
                    let ant = Ant::new(id);
                    match walk_with_retries(&ant, graph, shared, start, config, &mut task_rng) {
                        Some(walk) => {
                            let length = graph.walk_length(&walk).unwrap_or(f64::INFINITY);
                            if offer_best(&best, &walk, length) {
                                log::info!(
                                    "best route updated at iteration {iteration} by ant {id}: length {length}"
                                );
                            }
                            shared.deposit(&walk, deposit_amount(config.q, length));
                        }
                        None => dropped += 1,
                    }
                }
                dropped
            };

            let dropped: usize = if config.parallel {
                ant_ids
                    .par_chunks(per_task)
                    .zip(seeds.par_iter())
                    .map(run_batch)
                    .sum()
            } else {
                ant_ids.chunks(per_task).zip(seeds.iter()).map(run_batch).sum()
            };
            dropped_ants += dropped;
            iterations += 1;

            let best_length = lock(&best).as_ref().map_or(f64::INFINITY, |(_, l)| *l);
            length_history.push(best_length);
            if iteration % 10 == 0 {
                log::debug!(
                    "iteration {iteration}: best length {best_length}, {dropped} ant(s) dropped"
                );
            }
        }

        let best = best.into_inner().unwrap_or_else(PoisonError::into_inner);
        match best {
            Some((best_walk, best_length)) => Ok(AntColonyResult {
                best_walk,
                best_length,
                start,
                iterations,
                dropped_ants,
                cancelled,
                timed_out,
                length_history,
                pheromones: pheromones.levels(),
            }),
            None => Err(Error::NoFeasibleSolution),
        }
    }
}

/// Launches `ant` up to `max_attempts` times. `None` drops the ant.
fn walk_with_retries<R: Rng>(
    ant: &Ant,
    graph: &Graph,
    pheromones: &PheromoneGraph,
    start: NodeIdx,
    config: &AntColonyConfig,
    rng: &mut R,
) -> Option<Vec<EdgeIdx>> {
    for attempt in 1..=config.max_attempts {
        match ant.walk(graph, pheromones, start, config, rng) {
            Ok(walk) => return Some(walk),
            Err(err) => log::debug!("ant {} attempt {attempt} failed: {err}", ant.id),
        }
    }
    log::warn!(
        "ant {} dropped after {} failed attempts",
        ant.id,
        config.max_attempts
    );
    None
}

/// Records `walk` as the best when strictly shorter. Returns whether it was.
fn offer_best(best: &Mutex<Option<(Vec<EdgeIdx>, f64)>>, walk: &[EdgeIdx], length: f64) -> bool {
    let mut guard = lock(best);
    let improves = guard.as_ref().is_none_or(|(_, l)| length < *l);
    if improves {
        *guard = Some((walk.to_vec(), length));
    }
    improves
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// `q / length`, or `q` for a walk of zero length.
fn deposit_amount(q: f64, length: f64) -> f64 {
    if length > 0.0 {
        q / length
    } else {
        q
    }
}
