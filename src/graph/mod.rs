//! Mixed multigraph model and traversal primitives.
//!
//! A [`Graph`] holds weighted edges that are either directed or undirected;
//! parallel edges and self-loops are allowed. Every engine in the crate
//! represents a candidate route as a sequence of [`EdgeIdx`] values and
//! relies on the primitives here to build and evaluate them:
//!
//! - [`Graph::edges_from`], [`Graph::edges_between`]: orientation-aware adjacency
//! - [`Graph::common_node`]: the vertex joining two consecutive edges
//! - [`Graph::path_between`]: breadth-first shortest path (by edge count)
//! - [`Graph::random_closed_walk`]: random edge-covering closed walk
//! - [`Graph::walk_length`], [`Graph::closed_walk_length`]: route evaluation

mod traversal;
mod types;

pub use types::{
    Edge, EdgeIdx, EdgeKind, EdgeSpec, Graph, GraphBuilder, GraphSpec, Node, NodeIdx, NodeSpec,
};
