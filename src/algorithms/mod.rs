//! NSGA-II, NSGA-III, SMS-EMOA and MOGA.
//!
//! All four variants share one generational loop ([`Algorithm`]) and differ
//! only in the operator pipeline wired at initialisation. Each run owns its
//! [`SolutionStore`](crate::representation::SolutionStore), random number
//! generator and log, so independent runs can proceed on separate threads.
//!
//! # Lifecycle
//!
//! ```text
//! Uninitialised ──initialise──▶ Initialised ──step──▶ Running ──▶ Terminated(Outcome)
//!        │                                                  ▲
//!        └──────────── configuration error ─────────────────┘
//! ```
//!
//! # References
//!
//! - Deb, Pratap, Agarwal & Meyarivan (2002), "A Fast and Elitist
//!   Multiobjective Genetic Algorithm: NSGA-II"
//! - Deb & Jain (2014), "An Evolutionary Many-Objective Optimization
//!   Algorithm Using Reference-Point-Based Nondominated Sorting Approach"
//! - Beume, Naujoks & Emmerich (2007), "SMS-EMOA: Multiobjective selection
//!   based on dominated hypervolume"
//! - Fonseca & Fleming (1993), "Genetic Algorithms for Multiobjective
//!   Optimization: Formulation, Discussion and Generalization"

mod config;
mod runner;
mod types;
mod wiring;

pub use config::AlgorithmConfig;
pub use runner::Algorithm;
pub use types::{AlgorithmKind, AlgorithmState, GenerationStats, Outcome, RunResult};
