//! Solver tables (sec 4.G) and the backtracking search engine (sec 4.H)
//! that walks them.

pub mod engine;
pub mod tables;

pub use engine::{solve, CollectSolutions, SolutionSink};
pub use tables::{free_ales, prepare, ActiveListEntry, TableEntry};

#[cfg(feature = "parallel")]
pub use engine::solve_parallel;
