//! Metaheuristic route covering on mixed multigraphs.
//!
//! Finds short closed walks that traverse every edge of a weighted graph at
//! least once (the Chinese Postman problem) with directed and undirected
//! edges mixed freely, parallel edges and loops allowed. The search is
//! heuristic; no optimality is claimed.
//!
//! - **Genetic Algorithm (GA)**: island-model evolution of edge-sequence
//!   chromosomes with graph-aware crossover and ring migration.
//! - **Ant Colony Optimization (ACO)**: pheromone-guided walk construction
//!   with evaporation and length-proportional reinforcement.
//! - **Simulated Annealing (SA)**: single-trajectory search over closed
//!   walks with pluggable cooling schedules.
//!
//! # Architecture
//!
//! [`graph`] holds the immutable topology and the traversal primitives every
//! engine builds on. The engines ([`ga`], [`aco`], [`sa`]) are independent
//! of each other. [`solver`] is the boundary: it takes a [`solver::Configuration`],
//! runs the selected engine and reports the route by edge id.
//!
//! Logging goes through the `log` facade; installing a logger is up to the
//! caller.

pub mod aco;
pub mod error;
pub mod ga;
pub mod graph;
pub mod random;
pub mod sa;
pub mod solver;

pub use error::{Error, Result};
