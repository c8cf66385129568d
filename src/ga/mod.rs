//! Island-model genetic algorithm over edge-sequence chromosomes.
//!
//! Each [`Chromosome`] is a candidate walk. Islands evolve in isolation for
//! [`GaConfig::isolation_iterations`] generations, then exchange their
//! fittest chromosomes along a ring. Fitness is injected through
//! [`RouteObjective`]; the engine maximizes it.
//!
//! # Key Types
//!
//! - [`GaConfig`]: Algorithm parameters (operators, rates, presets)
//! - [`GaRunner`]: Executes the island loop
//! - [`GaResult`]: Best walk found with statistics
//!
//! # Operator families
//!
//! - [`SelectionMethod`], [`ParentPairing`]: pool selection and pairing
//! - [`Recombination`], [`Mutation`]: see [`operators`]
//! - [`Replacement`]: next-generation policy
//!
//! # References
//!
//! - Holland (1975), *Adaptation in Natural and Artificial Systems*
//! - Whitley, Rana & Heckendorn (1999), "The Island Model Genetic Algorithm"

mod config;
pub mod operators;
mod replacement;
mod runner;
mod selection;
mod types;

pub use config::{GaConfig, DEFAULT_ISOLATION_ITERATIONS};
pub use operators::{Mutation, Recombination};
pub use replacement::Replacement;
pub use runner::{GaResult, GaRunner};
pub use selection::{ParentPairing, SelectionMethod};
pub use types::{Chromosome, Population, RouteObjective, WORST_FITNESS};
