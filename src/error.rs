//! Error taxonomy.
//!
//! Configuration and graph errors are raised before any search starts.
//! [`NoPathError`] is local to one walk (one ant, one chromosome) and is
//! usually retried by the engines. [`Error::NoFeasibleSolution`] ends a run.

use thiserror::Error;

use crate::graph::NodeIdx;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error returned by the engines and the solver boundary.
#[derive(Debug, Error)]
pub enum Error {
    /// The configuration is incomplete or out of range.
    #[error(transparent)]
    Configuration(#[from] ConfigError),

    /// The input graph could not be built.
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// A walk could not be constructed.
    #[error(transparent)]
    NoPath(#[from] NoPathError),

    /// No candidate ever covered every edge within the length bound.
    #[error("no walk covering every edge within the configured length was found")]
    NoFeasibleSolution,

    /// Crossover points outside the usable gene range.
    #[error("crossover points {points:?} are outside the gene range 0..{len}")]
    InvalidRecombinationPoints {
        /// The points supplied by the caller.
        points: Vec<usize>,
        /// Number of genes both parents share.
        len: usize,
    },
}

/// Invalid or missing configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// A numeric parameter is outside its valid range.
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter {
        /// Field name.
        name: &'static str,
        /// Human-readable constraint that was violated.
        reason: String,
    },

    /// The block for the selected algorithm was not supplied.
    #[error("the {0} algorithm was selected but its configuration is missing")]
    MissingAlgorithmConfig(&'static str),

    /// The requested start node does not exist in the graph.
    #[error("start node `{0}` was not found in the graph")]
    UnknownStartNode(String),
}

impl ConfigError {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

/// Errors raised while ingesting a graph.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GraphError {
    #[error("the graph has no nodes")]
    NoNodes,

    #[error("the graph has no edges")]
    NoEdges,

    #[error("duplicate node id `{0}`")]
    DuplicateNode(String),

    #[error("duplicate edge id `{0}`")]
    DuplicateEdge(String),

    #[error("edge `{edge}` references unknown node `{node}`")]
    UnknownNode { edge: String, node: String },

    #[error("edge `{edge}` has invalid weight {weight}")]
    InvalidWeight { edge: String, weight: f64 },

    #[error("node `{id}` ({label}) is not connected to any edge")]
    IsolatedNode { id: String, label: String },
}

/// A walk could not be built from the current vertex.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NoPathError {
    /// No edge can be taken from the vertex and backtracking cannot recover.
    #[error("no outgoing edge can be taken from node #{0}")]
    DeadEnd(NodeIdx),

    /// Breadth-first search found no route.
    #[error("node #{to} is unreachable from node #{from}")]
    Unreachable { from: NodeIdx, to: NodeIdx },

    /// The walker exhausted its step budget before covering every edge.
    #[error("walk abandoned after {0} steps without covering every edge")]
    StepLimit(usize),
}
