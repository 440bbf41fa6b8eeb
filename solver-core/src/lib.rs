//! # solver-core: class-placement optimization engine
//!
//! Assigns a population of students to classes maximizing a three-layer
//! weighted quality score (friend satisfaction, class composition, school
//! balance) while respecting hard placement constraints (force-class,
//! force-friend groups, minimum-friends policy).
//!
//! ## Quick example
//!
//! ```no_run
//! use solver_core::config::Config;
//! use solver_core::domain::School;
//! use solver_core::initializer::Strategy;
//! use solver_core::portfolio;
//! use solver_core::solver::{Solver, SolverConfig};
//!
//! let school = School::new();
//! let config = Config::default();
//! let solver_config = SolverConfig::default();
//! let result = portfolio::optimize(
//!     &school,
//!     &config,
//!     Solver::RandomSwap,
//!     1000,
//!     &solver_config,
//!     Strategy::Balanced,
//!     true,
//!     None,
//! );
//! assert!(result.final_score >= 0.0);
//! ```

pub mod baseline;
pub mod config;
pub mod constraints;
pub mod domain;
pub mod error;
pub mod initializer;
pub mod neighborhood;
pub mod portfolio;
pub mod scorer;
pub mod solver;

pub use config::Config;
pub use domain::School;
pub use error::{SolverError, SolverResult};
pub use scorer::{score, score_quick, ScoringResult};
