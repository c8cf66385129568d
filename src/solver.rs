//! Orchestration boundary.
//!
//! Maps a [`Configuration`] onto one of the engines, enforces the route
//! length bound, and converts the engine result into a [`Response`] that
//! names edges by their string ids.
//!
//! # Example
//!
//! ```
//! use u_postman::ga::GaConfig;
//! use u_postman::graph::Graph;
//! use u_postman::solver::{solve, Configuration};
//!
//! let graph = Graph::builder()
//!     .node("a", "A")
//!     .node("b", "B")
//!     .node("c", "C")
//!     .directed("ab", "a", "b", 1.0)
//!     .directed("bc", "b", "c", 2.0)
//!     .directed("ca", "c", "a", 3.0)
//!     .build()
//!     .unwrap();
//! let config = Configuration::genetic(GaConfig::fast().with_seed(1)).with_start_node_id("a");
//!
//! let response = solve(&graph, &config).unwrap();
//! assert_eq!(response.path, vec!["ab", "bc", "ca"]);
//! assert_eq!(response.length, 6.0);
//! ```

use std::time::Instant;

use rand::Rng;

use crate::aco::{AntColonyConfig, AntColonyRunner};
use crate::error::{ConfigError, Error, Result};
use crate::ga::{GaConfig, GaRunner, RouteObjective, WORST_FITNESS};
use crate::graph::{EdgeIdx, Graph, GraphSpec, NodeIdx};
use crate::random::master_rng;
use crate::sa::{ClosedWalkProblem, SaConfig, SaRunner};

/// Engine selected by a [`Configuration`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum AlgorithmKind {
    Genetic,
    AntColony,
    Annealing,
}

impl AlgorithmKind {
    fn name(self) -> &'static str {
        match self {
            AlgorithmKind::Genetic => "genetic",
            AlgorithmKind::AntColony => "ant colony",
            AlgorithmKind::Annealing => "simulated annealing",
        }
    }
}

/// What to run and under which constraints.
///
/// Only the block matching [`kind`](Self::kind) is used; it must be present.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct Configuration {
    #[cfg_attr(feature = "serde", serde(rename = "type"))]
    pub kind: AlgorithmKind,

    /// Routes longer than this are rejected.
    #[cfg_attr(feature = "serde", serde(default))]
    pub max_length: Option<f64>,

    /// Start vertex by string id. Overrides the engine block's start node;
    /// when neither is set one is chosen at random.
    #[cfg_attr(feature = "serde", serde(default))]
    pub start_node_id: Option<String>,

    #[cfg_attr(feature = "serde", serde(default))]
    pub genetic: Option<GaConfig>,

    #[cfg_attr(feature = "serde", serde(default))]
    pub ant_colony: Option<AntColonyConfig>,

    #[cfg_attr(feature = "serde", serde(default))]
    pub annealing: Option<SaConfig>,
}

impl Configuration {
    /// An empty configuration for `kind`; the engine block still has to be
    /// supplied.
    pub fn new(kind: AlgorithmKind) -> Self {
        Self {
            kind,
            max_length: None,
            start_node_id: None,
            genetic: None,
            ant_colony: None,
            annealing: None,
        }
    }

    pub fn genetic(config: GaConfig) -> Self {
        Self {
            genetic: Some(config),
            ..Self::new(AlgorithmKind::Genetic)
        }
    }

    pub fn ant_colony(config: AntColonyConfig) -> Self {
        Self {
            ant_colony: Some(config),
            ..Self::new(AlgorithmKind::AntColony)
        }
    }

    pub fn annealing(config: SaConfig) -> Self {
        Self {
            annealing: Some(config),
            ..Self::new(AlgorithmKind::Annealing)
        }
    }

    pub fn with_max_length(mut self, max_length: f64) -> Self {
        self.max_length = Some(max_length);
        self
    }

    pub fn with_start_node_id(mut self, id: impl Into<String>) -> Self {
        self.start_node_id = Some(id.into());
        self
    }

    /// Checks the configuration against `graph` and resolves the start node
    /// id, if any.
    ///
    /// # Errors
    /// - [`ConfigError::MissingAlgorithmConfig`] when the block for
    ///   [`kind`](Self::kind) is absent
    /// - [`ConfigError::UnknownStartNode`] when the start id is not in the
    ///   graph
    /// - [`ConfigError::InvalidParameter`] from the engine block or for a
    ///   non-positive length bound
    pub fn validate(&self, graph: &Graph) -> std::result::Result<Option<NodeIdx>, ConfigError> {
        let start = match &self.start_node_id {
            Some(id) => Some(
                graph
                    .node_index(id)
                    .ok_or_else(|| ConfigError::UnknownStartNode(id.clone()))?,
            ),
            None => None,
        };

        if let Some(max_length) = self.max_length {
            if max_length.is_nan() || max_length <= 0.0 {
                return Err(ConfigError::invalid("max_length", "must be positive"));
            }
        }

        let missing = || ConfigError::MissingAlgorithmConfig(self.kind.name());
        match self.kind {
            AlgorithmKind::Genetic => self.genetic.as_ref().ok_or_else(missing)?.validate()?,
            AlgorithmKind::AntColony => self.ant_colony.as_ref().ok_or_else(missing)?.validate()?,
            AlgorithmKind::Annealing => self.annealing.as_ref().ok_or_else(missing)?.validate()?,
        }
        Ok(start)
    }
}

/// Result returned to the caller.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct Response {
    /// Edge ids in walk order.
    pub path: Vec<String>,

    /// Total weight of the walk.
    pub length: f64,

    pub execution_time_ms: u64,
}

/// The genetic engine's objective: negated closed-walk length.
///
/// Walks that miss an edge, do not return to the start, or exceed
/// `max_length` score [`WORST_FITNESS`]. The distance between two walks is
/// the number of positions at which they differ, counting the extra tail of
/// the longer one.
#[derive(Debug, Clone, Copy)]
pub struct RouteFitness<'a> {
    graph: &'a Graph,
    start: NodeIdx,
    max_length: Option<f64>,
}

impl<'a> RouteFitness<'a> {
    pub fn new(graph: &'a Graph, start: NodeIdx, max_length: Option<f64>) -> Self {
        Self {
            graph,
            start,
            max_length,
        }
    }

    /// Closed-walk length when the walk is a feasible route.
    pub fn route_length(&self, genes: &[EdgeIdx]) -> Option<f64> {
        if !self.graph.covers_all_edges(genes) {
            return None;
        }
        let length = self.graph.closed_walk_length(self.start, genes)?;
        match self.max_length {
            Some(max) if length > max => None,
            _ => Some(length),
        }
    }
}

impl RouteObjective for RouteFitness<'_> {
    fn fitness(&self, genes: &[EdgeIdx]) -> f64 {
        self.route_length(genes).map_or(WORST_FITNESS, |length| -length)
    }

    fn distance(&self, a: &[EdgeIdx], b: &[EdgeIdx]) -> f64 {
        let differing = a.iter().zip(b).filter(|(x, y)| x != y).count();
        (differing + a.len().abs_diff(b.len())) as f64
    }
}

/// Runs the configured engine on `graph`.
///
/// # Errors
/// - [`Error::Configuration`] when [`Configuration::validate`] fails
/// - [`Error::NoPath`] when the engine cannot build any walk
/// - [`Error::NoFeasibleSolution`] when no covering walk fits `max_length`
pub fn solve(graph: &Graph, config: &Configuration) -> Result<Response> {
    let started = Instant::now();
    let requested = config.validate(graph)?;
    log::info!(
        "solving with the {} engine: {} nodes, {} edges",
        config.kind.name(),
        graph.node_count(),
        graph.edge_count()
    );

    let (walk, length) = match config.kind {
        AlgorithmKind::Genetic => {
            let block = config
                .genetic
                .as_ref()
                .ok_or(ConfigError::MissingAlgorithmConfig("genetic"))?;
            let start = resolve_start(graph, requested, block.start_node, block.seed)?;
            let objective = RouteFitness::new(graph, start, config.max_length);
            let result = GaRunner::run(graph, &objective, &block.clone().with_start_node(start))?;
            (result.best, -result.best_fitness)
        }
        AlgorithmKind::AntColony => {
            let block = config
                .ant_colony
                .as_ref()
                .ok_or(ConfigError::MissingAlgorithmConfig("ant colony"))?;
            let start = resolve_start(graph, requested, block.start_node, block.seed)?;
            let result = AntColonyRunner::run(graph, &block.clone().with_start_node(start))?;
            (result.best_walk, result.best_length)
        }
        AlgorithmKind::Annealing => {
            let block = config
                .annealing
                .as_ref()
                .ok_or(ConfigError::MissingAlgorithmConfig("simulated annealing"))?;
            let start = resolve_start(graph, requested, None, block.seed)?;
            let result = SaRunner::run(&ClosedWalkProblem::new(graph, start), block)?;
            (result.best, result.best_cost)
        }
    };

    if !length.is_finite() || config.max_length.is_some_and(|max| length > max) {
        log::warn!("best route of length {length} exceeds the bound {:?}", config.max_length);
        return Err(Error::NoFeasibleSolution);
    }

    let execution_time_ms = started.elapsed().as_millis() as u64;
    log::info!(
        "route of {} edges, length {length}, found in {execution_time_ms} ms",
        walk.len()
    );
    Ok(Response {
        path: graph.edge_ids(&walk),
        length,
        execution_time_ms,
    })
}

/// Builds the graph from its boundary description and runs [`solve`].
///
/// # Errors
/// [`Error::Graph`] when the description is invalid, otherwise as
/// [`solve`].
pub fn solve_spec(spec: &GraphSpec, config: &Configuration) -> Result<Response> {
    let graph = Graph::from_spec(spec)?;
    solve(&graph, config)
}

/// Start vertex: the requested id, else the engine block's node, else a
/// random vertex drawn from the block's seed.
fn resolve_start(
    graph: &Graph,
    requested: Option<NodeIdx>,
    block: Option<NodeIdx>,
    seed: Option<u64>,
) -> std::result::Result<NodeIdx, ConfigError> {
    match requested.or(block) {
        Some(node) if node < graph.node_count() => Ok(node),
        Some(node) => Err(ConfigError::UnknownStartNode(format!("#{node}"))),
        None => Ok(master_rng(seed).random_range(0..graph.node_count())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{EdgeKind, EdgeSpec, NodeSpec};

    /// Directed triangle plus an undirected spur c-d.
    fn graph() -> Graph {
        Graph::builder()
            .node("a", "A")
            .node("b", "B")
            .node("c", "C")
            .node("d", "D")
            .directed("ab", "a", "b", 1.0)
            .directed("bc", "b", "c", 2.0)
            .directed("ca", "c", "a", 3.0)
            .undirected("cd", "c", "d", 1.5)
            .build()
            .unwrap()
    }

    fn all_engines() -> Vec<Configuration> {
        vec![
            Configuration::genetic(
                GaConfig::default()
                    .with_population_size(20)
                    .with_iteration_count(30)
                    .with_parallel(false)
                    .with_seed(3),
            ),
            Configuration::ant_colony(
                AntColonyConfig::fast().with_parallel(false).with_seed(3),
            ),
            Configuration::annealing(SaConfig::fast().with_seed(3)),
        ]
    }

    #[test]
    fn test_every_engine_returns_a_covering_route() {
        let g = graph();
        for config in all_engines() {
            let config = config.with_start_node_id("a");
            let response = solve(&g, &config).unwrap();

            let walk: Vec<EdgeIdx> = response
                .path
                .iter()
                .map(|id| g.edge_index(id).unwrap())
                .collect();
            assert!(g.covers_all_edges(&walk), "{:?}", config.kind);
            let length = g.closed_walk_length(0, &walk).unwrap();
            assert!((length - response.length).abs() < 1e-10, "{:?}", config.kind);
            // a->b->c->d->c->a is optimal
            assert!(response.length >= 9.0, "{:?}", config.kind);
        }
    }

    #[test]
    fn test_missing_engine_block() {
        let g = graph();
        for kind in [
            AlgorithmKind::Genetic,
            AlgorithmKind::AntColony,
            AlgorithmKind::Annealing,
        ] {
            let result = solve(&g, &Configuration::new(kind));
            assert!(
                matches!(
                    result,
                    Err(Error::Configuration(ConfigError::MissingAlgorithmConfig(_)))
                ),
                "{kind:?}"
            );
        }
    }

    #[test]
    fn test_unknown_start_node_id() {
        let g = graph();
        let config = Configuration::ant_colony(AntColonyConfig::fast()).with_start_node_id("zz");
        let err = solve(&g, &config).unwrap_err();
        assert_eq!(err.to_string(), "start node `zz` was not found in the graph");
    }

    #[test]
    fn test_length_bound_is_enforced() {
        let g = graph();
        for config in all_engines() {
            let config = config.with_start_node_id("a").with_max_length(8.0);
            let result = solve(&g, &config);
            assert!(
                matches!(result, Err(Error::NoFeasibleSolution)),
                "{:?}",
                config.kind
            );
        }
        assert!(solve(&g, &all_engines()[0].clone().with_max_length(-1.0)).is_err());
    }

    #[test]
    fn test_engine_config_errors_surface() {
        let g = graph();
        let config = Configuration::ant_colony(AntColonyConfig::default().with_ant_count(0));
        assert!(matches!(
            solve(&g, &config),
            Err(Error::Configuration(ConfigError::InvalidParameter { name: "ant_count", .. }))
        ));
    }

    #[test]
    fn test_route_fitness() {
        let g = graph();
        let fitness = RouteFitness::new(&g, 0, None);
        assert_eq!(fitness.fitness(&[0, 1, 3, 3, 2]), -9.0);
        // misses "cd"
        assert_eq!(fitness.fitness(&[0, 1, 2]), WORST_FITNESS);
        // starts at the wrong vertex
        assert_eq!(fitness.fitness(&[1, 3, 3, 2, 0]), WORST_FITNESS);

        let bounded = RouteFitness::new(&g, 0, Some(8.5));
        assert_eq!(bounded.fitness(&[0, 1, 3, 3, 2]), WORST_FITNESS);

        assert_eq!(fitness.distance(&[0, 1, 2], &[0, 2, 2, 3]), 2.0);
        assert_eq!(fitness.distance(&[0, 1], &[0, 1]), 0.0);
    }

    #[test]
    fn test_solve_spec_rejects_bad_graph() {
        let spec = GraphSpec {
            nodes: vec![NodeSpec {
                id: "a".into(),
                label: "A".into(),
            }],
            edges: vec![EdgeSpec {
                id: "ax".into(),
                source: "a".into(),
                destination: "x".into(),
                weight: 1.0,
                kind: EdgeKind::Directed,
            }],
        };
        let result = solve_spec(&spec, &all_engines()[0]);
        assert!(matches!(result, Err(Error::Graph(_))));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_boundary_json_shapes() {
        let response = Response {
            path: vec!["ab".into(), "ba".into()],
            length: 10.0,
            execution_time_ms: 7,
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "path": ["ab", "ba"], "length": 10.0, "executionTimeMs": 7 })
        );

        let config: Configuration = serde_json::from_str(
            r#"{ "type": "ANT_COLONY", "maxLength": 100.0, "startNodeId": "a",
                 "antColony": { "iterationCount": 5, "antCount": 4,
                                "remainingPheromoneRate": 0.9 } }"#,
        )
        .unwrap();
        assert_eq!(config.kind, AlgorithmKind::AntColony);
        assert_eq!(config.start_node_id.as_deref(), Some("a"));
        let block = config.ant_colony.unwrap();
        assert_eq!(block.iteration_count, 5);
        assert_eq!(block.ant_count, 4);
        assert!((block.remaining_pheromone_rate - 0.9).abs() < 1e-12);
        assert_eq!(block.max_attempts, crate::aco::DEFAULT_MAX_ATTEMPTS);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_engine_blocks_reject_unknown_keys() {
        let snake = serde_json::from_str::<Configuration>(
            r#"{ "type": "ANT_COLONY", "antColony": { "ant_count": 4 } }"#,
        );
        assert!(snake.is_err());

        let misspelled = serde_json::from_str::<Configuration>(
            r#"{ "type": "ANNEALING", "annealing": { "initialTemprature": 5.0 } }"#,
        );
        assert!(misspelled.is_err());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_genetic_block_reads_operator_names() {
        let config: Configuration = serde_json::from_str(
            r#"{ "type": "GENETIC", "genetic": {
                   "iterationsCount": 12, "populationSize": 30,
                   "selection": { "TOURNAMENT": 3 }, "pairing": "OUTBREEDING",
                   "recombination": "TWO_POINT_CROSSOVER", "recombinationRate": 0.7,
                   "mutation": "SWAPPING", "mutationRate": 0.2,
                   "replacement": { "ELITE": 0.2 } } }"#,
        )
        .unwrap();
        let block = config.genetic.unwrap();
        assert_eq!(block.iteration_count, 12);
        assert_eq!(block.population_size, 30);
        assert_eq!(block.selection, crate::ga::SelectionMethod::Tournament(3));
        assert_eq!(block.pairing, crate::ga::ParentPairing::Outbreeding);
        assert_eq!(block.recombination, Some(crate::ga::Recombination::TwoPoint));
        assert_eq!(block.mutation, Some(crate::ga::Mutation::Swapping));
        assert_eq!(block.replacement, crate::ga::Replacement::Elite(0.2));
    }
}
