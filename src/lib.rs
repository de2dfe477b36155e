//! # assignment-solver
//!
//! Optimal one-to-one assignment between two ordered collections, such as delivery
//! addresses and drivers, using the Munkres (Hungarian) algorithm.
//!
//! Scores are maximized: the engine negates every score into a cost matrix with no
//! more rows than columns, finds a minimum-cost matching and reports the pairs along
//! with their summed score. Every entity of the shorter collection is assigned.
//!
//! ```
//! use assignment_solver::solve;
//!
//! let workers = ["ann", "bob"];
//! let jobs = ["paint", "plumb", "wire"];
//! let skill = |w: &&str, j: &&str| match (*w, *j) {
//!     ("ann", "wire") => 9.0,
//!     ("bob", "plumb") => 7.0,
//!     _ => 1.0,
//! };
//!
//! let solution = solve(&workers, &jobs, &skill).unwrap();
//! assert_eq!(solution.score, 16.0);
//! ```
//!
//! ## Modules
//!
//! - [`matrix`]: cost matrix with star/prime marks and row/column coverage
//! - [`solver`]: the phase state machine and the [`solve`]/[`minimize`] entry points
//! - [`score`]: the [`ScoreProvider`] trait and the address/driver [`SuitabilityScore`]
//! - [`cli`]: command-line front end

pub mod cli;
pub mod error;
pub mod matrix;
pub mod score;
pub mod solver;

pub use error::{AssignmentError, Result};
pub use matrix::{Cost, CostMatrix, Mark, PrimeOutcome};
pub use score::{ScoreProvider, SuitabilityScore};
pub use solver::{minimize, solve, Assignment, Solution};
