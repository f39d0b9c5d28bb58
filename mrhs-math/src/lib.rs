//! The algorithms layered on top of `mrhs-core`'s packed bit types: the MRHS
//! system itself, Gaussian echelonization and the linear/empty cleanup
//! passes, the Raddum-Zajac lookup tables, the backtracking search engine,
//! and the published cost estimators.
//!
//! This crate is the `mrhs` workspace's equivalent of `faer-math`: the
//! teacher crate holds `Qr`/`Lu`/`Svd` decompositions over `faer-core`
//! matrices, this crate holds `MrhsSystem` and the solver over `mrhs-core`
//! matrices.

pub mod error;
pub mod estimate;
pub mod preprocess;
pub mod solve;
pub mod system;

pub use error::{FillError, SolveError};
pub use estimate::BlockStats;
pub use preprocess::{echelonize, linear_substitution, remove_empty, remove_linear, TransformMatrix};
pub use solve::{free_ales, prepare, solve, ActiveListEntry, CollectSolutions, SolutionSink, TableEntry};
pub use system::{apply, BlockPair, MFiller, MrhsSystem};

#[cfg(feature = "parallel")]
pub use solve::solve_parallel;
