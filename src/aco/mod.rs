//! Ant colony optimization over closed covering walks.
//!
//! Ants start at a common vertex and pick their next edge by roulette over
//! `τ^α · (proximity / weight)^β`, preferring edges they have not walked.
//! After each iteration pheromone evaporates by the remaining rate ρ and
//! every finished walk deposits `q / length` on each edge occurrence.
//!
//! # Key Types
//!
//! - [`AntColonyConfig`]: Colony parameters and presets
//! - [`AntColonyRunner`]: Executes the iteration loop
//! - [`AntColonyResult`]: Best walk, history and final pheromone levels
//! - [`PheromoneGraph`]: Per-edge levels shared by concurrent ants
//!
//! # References
//!
//! - Dorigo, Maniezzo & Colorni (1996), "Ant System: Optimization by a
//!   Colony of Cooperating Agents"

mod ant;
mod config;
mod pheromone;
mod runner;

pub use ant::Ant;
pub use config::{AntColonyConfig, DEFAULT_MAX_ATTEMPTS};
pub use pheromone::PheromoneGraph;
pub use runner::{AntColonyResult, AntColonyRunner};
