//! Multi-objective evolutionary optimization engine.
//!
//! Provides the building blocks of Pareto-based evolutionary algorithms and
//! four ready-wired algorithms on top of them:
//!
//! - **Representation**: typed elements, functions, sealed problems and
//!   solutions owned by a per-run store.
//! - **Pipeline**: operator nodes exchanging tagged solution sets, with
//!   composite nodes and read-only introspection for external editors.
//! - **Operators**: initialisation, evaluation, ranking, diversity,
//!   selection, SBX crossover, polynomial mutation and archiving.
//! - **Dominance**: Pareto, ε, reference-point and goal-based relations plus
//!   fast non-dominated sorting.
//! - **Indicators**: crowding distance, hypervolume and its exclusive
//!   contributions, robustness reductions.
//! - **Algorithms**: NSGA-II, NSGA-III, SMS-EMOA and MOGA with a seeded,
//!   cancellable run loop.
//! - **Utils**: table interpolation, radial basis functions and
//!   simplex-lattice reference points.
//!
//! # Quick start
//!
//! ```
//! use u_moea::algorithms::{Algorithm, AlgorithmConfig, AlgorithmKind};
//! use u_moea::registry::Registry;
//! use u_moea::representation::Problem;
//!
//! let registry = Registry::default();
//! let problem = Problem::builder()
//!     .shared_function(registry.create_function("zdt2").unwrap())
//!     .build()
//!     .unwrap();
//!
//! let config = AlgorithmConfig::default()
//!     .with_population_size(24)
//!     .with_max_generations(5)
//!     .with_archive(true)
//!     .with_hv_reference(vec![11.0, 11.0])
//!     .with_seed(1);
//!
//! let result = Algorithm::new(AlgorithmKind::SmsEmoa, problem, config).run();
//! assert!(result.is_success());
//! assert_eq!(result.history.len(), 5);
//! ```
//!
//! # Architecture
//!
//! Every objective is minimised internally; maximised outputs are negated
//! on evaluation and restored with [`Problem::to_declared`]. A run owns its
//! solutions, random generator and log, so runs never share mutable state
//! and can proceed on separate threads.
//!
//! [`Problem::to_declared`]: representation::Problem::to_declared

pub mod algorithms;
pub mod dominance;
pub mod error;
pub mod functions;
pub mod indicators;
pub mod log;
pub mod operators;
pub mod pipeline;
pub mod property;
pub mod random;
pub mod registry;
pub mod representation;
pub mod utils;

pub use error::{MoeaError, Result};
