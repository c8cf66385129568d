//! Walk construction by a single ant.

use rand::Rng;

use super::config::AntColonyConfig;
use super::pheromone::PheromoneGraph;
use crate::error::NoPathError;
use crate::graph::{EdgeIdx, Graph, NodeIdx};

/// One simulated ant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ant {
    pub id: usize,
}

impl Ant {
    pub fn new(id: usize) -> Self {
        Self { id }
    }

    /// Builds a closed walk from `start` covering every edge.
    ///
    /// At each vertex the ant considers the edges it has not taken yet, or
    /// all available edges when every one was taken, and samples one with
    /// probability proportional to `τ^α · (proximity / weight)^β`. After
    /// too many steps without covering anything new it heads to the nearest
    /// uncovered edge. Once everything is covered it returns to `start`
    /// along a BFS path.
    ///
    /// # Errors
    /// [`NoPathError::DeadEnd`] at a vertex without exits or when the
    /// remaining edges cannot be reached, [`NoPathError::Unreachable`] when
    /// `start` cannot be reached again, [`NoPathError::StepLimit`] when the
    /// step budget runs out.
    pub fn walk<R: Rng>(
        &self,
        graph: &Graph,
        pheromones: &PheromoneGraph,
        start: NodeIdx,
        config: &AntColonyConfig,
        rng: &mut R,
    ) -> Result<Vec<EdgeIdx>, NoPathError> {
        let edge_count = graph.edge_count();
        let stall_limit = graph.stall_limit();
        let step_limit = graph.walk_step_limit();
        let no_dead = vec![false; graph.node_count()];

        let mut uses = vec![0u32; edge_count];
        let mut covered = 0usize;
        let mut walk = Vec::with_capacity(edge_count * 2);
        let mut current = start;
        let mut stalled = 0usize;

        while covered < edge_count {
            if walk.len() > step_limit {
                return Err(NoPathError::StepLimit(walk.len()));
            }

            let exits = graph.edges_from(current);
            if exits.is_empty() {
                return Err(NoPathError::DeadEnd(current));
            }

            let fresh: Vec<EdgeIdx> = exits.iter().copied().filter(|&e| uses[e] == 0).collect();
            if fresh.is_empty() && stalled >= stall_limit {
                let detour = graph
                    .route_to_uncovered(current, &uses, &no_dead)
                    .ok_or_else(|| NoPathError::DeadEnd(graph.blocked_vertex(&uses, current)))?;
                for e in detour {
                    current = graph.edge(e).head_from(current).unwrap_or(current);
                    uses[e] += 1;
                    if uses[e] == 1 {
                        covered += 1;
                    }
                    walk.push(e);
                }
                stalled = 0;
                continue;
            }

            let candidates: &[EdgeIdx] = if fresh.is_empty() { exits } else { &fresh };
            let next = self.choose(graph, pheromones, candidates, config, rng);

            uses[next] += 1;
            if uses[next] == 1 {
                covered += 1;
                stalled = 0;
            } else {
                stalled += 1;
            }
            walk.push(next);
            current = graph.edge(next).head_from(current).unwrap_or(current);
        }

        if current != start {
            let back = graph
                .path_between(current, start)
                .ok_or(NoPathError::Unreachable {
                    from: current,
                    to: start,
                })?;
            walk.extend(back);
        }
        Ok(walk)
    }

    /// Roulette-wheel choice over the transition desire, falling back to a
    /// uniform pick when the desires cannot be normalized.
    fn choose<R: Rng>(
        &self,
        graph: &Graph,
        pheromones: &PheromoneGraph,
        candidates: &[EdgeIdx],
        config: &AntColonyConfig,
        rng: &mut R,
    ) -> EdgeIdx {
        let desires: Vec<f64> = candidates
            .iter()
            .map(|&e| desire(pheromones.level(e), graph.edge(e).weight, config))
            .collect();

        // Zero-weight edges have infinite desire: pick among them.
        let infinite: Vec<EdgeIdx> = candidates
            .iter()
            .zip(&desires)
            .filter(|(_, d)| d.is_infinite())
            .map(|(&e, _)| e)
            .collect();
        if !infinite.is_empty() {
            return infinite[rng.random_range(0..infinite.len())];
        }

        let total: f64 = desires.iter().sum();
        if total > 0.0 && total.is_finite() {
            let threshold = rng.random::<f64>();
            let mut cumulative = 0.0;
            for (&e, d) in candidates.iter().zip(&desires) {
                cumulative += d / total;
                if threshold < cumulative {
                    return e;
                }
            }
        }

        candidates[rng.random_range(0..candidates.len())]
    }
}

/// `τ^α · (proximity / weight)^β`; NaN is treated as no desire.
fn desire(tau: f64, weight: f64, config: &AntColonyConfig) -> f64 {
    let d = tau.powf(config.alpha) * (config.proximity_coefficient / weight).powf(config.beta);
    if d.is_nan() {
        0.0
    } else {
        d
    }
}
