//! Error taxonomy for the solver core.
//!
//! `NoSolution` is deliberately absent here: per the error-handling contract a
//! solver that cannot find a feasible assignment reports it as data inside an
//! `OptimizationResult` (`constraints_satisfied = false` plus a populated
//! violation list), not as a thrown error.

use serde::Serialize;
use thiserror::Error;

/// Errors surfaced by the solver core's public entry points.
#[derive(Error, Debug, Serialize)]
pub enum SolverError {
    /// Input data violates an entity invariant (bad id shape, rank out of domain, ...).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The requested configuration cannot be satisfied by any assignment,
    /// e.g. target class count impossible given force constraints.
    #[error("infeasible configuration: {0}")]
    InfeasibleConfiguration(String),

    /// A move or lookup referenced a student id that does not exist.
    #[error("unknown student: {0}")]
    UnknownStudent(String),

    /// A move or lookup referenced a class id that does not exist.
    #[error("unknown class: {0}")]
    UnknownClass(String),

    /// Cooperative cancellation was observed.
    #[error("cancelled")]
    Cancelled,
}

/// Convenience alias used at every fallible boundary in this crate.
pub type SolverResult<T> = Result<T, SolverError>;
