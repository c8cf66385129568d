//! Annealing problem trait and the closed-walk problem.

use rand::Rng;

use crate::error::NoPathError;
use crate::ga::operators::edge_replacing_mutation;
use crate::graph::{EdgeIdx, Graph, NodeIdx};

/// Defines a Simulated Annealing problem.
///
/// The implementor supplies the initial state, its energy and the
/// neighbourhood move. [`SaRunner`](super::SaRunner) handles temperature,
/// acceptance and cooling.
///
/// # Minimization
///
/// SA minimizes the energy. An infeasible state should report
/// `f64::INFINITY` so that it is never accepted over a feasible one.
pub trait SaProblem: Send + Sync {
    /// The state representation.
    type Solution: Clone + Send;

    /// Builds the starting state.
    ///
    /// # Errors
    /// [`NoPathError`] when no valid state can be built.
    fn initial_solution<R: Rng>(&self, rng: &mut R) -> Result<Self::Solution, NoPathError>;

    /// Energy of a state. Lower is better.
    fn cost(&self, solution: &Self::Solution) -> f64;

    /// A small random perturbation of `solution`.
    fn neighbor<R: Rng>(&self, solution: &Self::Solution, rng: &mut R) -> Self::Solution;
}

/// Annealing over closed covering walks anchored at one vertex.
///
/// The energy is the closed-walk length, or infinity when the walk does not
/// return to the start or misses an edge. Neighbours either swap one edge
/// for a parallel edge or re-route a random stretch of the walk along the
/// shortest path between its end vertices.
#[derive(Debug, Clone, Copy)]
pub struct ClosedWalkProblem<'a> {
    graph: &'a Graph,
    start: NodeIdx,
}

impl<'a> ClosedWalkProblem<'a> {
    pub fn new(graph: &'a Graph, start: NodeIdx) -> Self {
        Self { graph, start }
    }

    pub fn start(&self) -> NodeIdx {
        self.start
    }

    /// Replaces `walk[i..j]` by the BFS path between the vertices it joins.
    /// Returns `None` when the walk cannot be traced or nothing changes.
    fn reroute<R: Rng>(&self, walk: &[EdgeIdx], rng: &mut R) -> Option<Vec<EdgeIdx>> {
        if walk.len() < 2 {
            return None;
        }
        let trail = self.graph.trace_walk(self.start, walk)?;
        let i = rng.random_range(0..walk.len() - 1);
        let j = rng.random_range(i + 2..=walk.len());
        let bridge = self.graph.path_between(trail[i], trail[j])?;
        if bridge.as_slice() == &walk[i..j] {
            return None;
        }

        let mut rerouted = Vec::with_capacity(walk.len() - (j - i) + bridge.len());
        rerouted.extend_from_slice(&walk[..i]);
        rerouted.extend(bridge);
        rerouted.extend_from_slice(&walk[j..]);
        Some(rerouted)
    }
}

impl SaProblem for ClosedWalkProblem<'_> {
    type Solution = Vec<EdgeIdx>;

    fn initial_solution<R: Rng>(&self, rng: &mut R) -> Result<Vec<EdgeIdx>, NoPathError> {
        self.graph.random_closed_walk(self.start, rng)
    }

    fn cost(&self, walk: &Vec<EdgeIdx>) -> f64 {
        if !self.graph.covers_all_edges(walk) {
            return f64::INFINITY;
        }
        self.graph
            .closed_walk_length(self.start, walk)
            .unwrap_or(f64::INFINITY)
    }

    fn neighbor<R: Rng>(&self, walk: &Vec<EdgeIdx>, rng: &mut R) -> Vec<EdgeIdx> {
        if rng.random_bool(0.5) {
            if let Some(rerouted) = self.reroute(walk, rng) {
                return rerouted;
            }
        }
        let mut next = walk.clone();
        edge_replacing_mutation(self.graph, &mut next, rng);
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::create_rng;

    /// Unit square a-b-c-d.
    fn square() -> Graph {
        Graph::builder()
            .node("a", "A")
            .node("b", "B")
            .node("c", "C")
            .node("d", "D")
            .undirected("ab", "a", "b", 1.0)
            .undirected("bc", "b", "c", 1.0)
            .undirected("cd", "c", "d", 1.0)
            .undirected("da", "d", "a", 1.0)
            .build()
            .unwrap()
    }

    #[test]
    fn test_energy_of_walks() {
        let g = square();
        let problem = ClosedWalkProblem::new(&g, 0);
        assert_eq!(problem.cost(&vec![0, 1, 2, 3]), 4.0);
        // misses "da"
        assert_eq!(problem.cost(&vec![0, 1, 1, 0]), f64::INFINITY);
        // covers everything but does not come back to a
        assert_eq!(problem.cost(&vec![0, 1, 2, 3, 0]), f64::INFINITY);
    }

    #[test]
    fn test_initial_solution_is_feasible() {
        let g = square();
        let problem = ClosedWalkProblem::new(&g, 2);
        let mut rng = create_rng(42);
        let walk = problem.initial_solution(&mut rng).unwrap();
        assert!(problem.cost(&walk).is_finite());
    }

    #[test]
    fn test_reroute_shortens_detours() {
        let g = square();
        let problem = ClosedWalkProblem::new(&g, 0);
        // a-b-a-b-c-d-a: the first "ab, ab" stretch is a round trip
        let walk = vec![0, 0, 0, 1, 2, 3];
        let mut rng = create_rng(3);
        let mut shorter = false;
        for _ in 0..200 {
            if let Some(next) = problem.reroute(&walk, &mut rng) {
                assert!(g.walk_end(0, &next) == Some(0), "rerouted walk must stay closed");
                if next.len() < walk.len() && problem.cost(&next).is_finite() {
                    shorter = true;
                }
            }
        }
        assert!(shorter, "expected at least one feasible shortening");
    }

    #[test]
    fn test_neighbors_stay_traceable() {
        let g = square();
        let problem = ClosedWalkProblem::new(&g, 0);
        let mut rng = create_rng(11);
        let mut walk = vec![0, 1, 2, 3, 3, 3];
        for _ in 0..100 {
            walk = problem.neighbor(&walk, &mut rng);
            assert_eq!(g.walk_end(0, &walk), Some(0));
        }
    }
}
