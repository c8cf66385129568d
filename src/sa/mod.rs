//! Simulated Annealing (SA) over closed walks.
//!
//! A single-trajectory metaheuristic: the current walk is perturbed and the
//! perturbation is kept when shorter, or with probability `exp(-Δ/T)` when
//! longer. The temperature `T` decreases according to a
//! [`CoolingSchedule`], so detours are tolerated early and rejected late.
//!
//! # References
//!
//! - Kirkpatrick, Gelatt & Vecchi (1983), "Optimization by Simulated Annealing"
//! - Lundy & Mees (1986), "Convergence of an Annealing Algorithm"

mod config;
mod runner;
mod types;

pub use config::{CoolingSchedule, SaConfig, DEFAULT_LINEAR_STEPS};
pub use runner::{SaResult, SaRunner};
pub use types::{ClosedWalkProblem, SaProblem};
