use thiserror::Error;

/// Precondition violations from the random fillers in [`crate::system`].
///
/// Per spec.md sec 4.E these are refused silently (no mutation); this crate
/// additionally reports *why*, which strengthens observability without
/// changing the no-op behavior.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillError {
    #[error("AND filler requires l == 3, got {got}")]
    AndRequiresWidthThree { got: usize },

    #[error("AND filler requires k == 4, got {got}")]
    AndRequiresFourRhs { got: usize },

    #[error("AND filler requires n == k + m - l (n={n}, k={k}, m={m}, l={l})")]
    AndDimensionMismatch {
        n: usize,
        m: usize,
        l: usize,
        k: usize,
    },

    #[error("block index {index} out of range for a system with {nblocks} blocks")]
    BlockOutOfRange { index: usize, nblocks: usize },

    #[error(transparent)]
    Shape(#[from] mrhs_core::ShapeError),
}

/// Failures the solver engine can surface. Per spec.md sec 7 the engine
/// itself cannot fail once `prepare` has succeeded; `Prepare` failures are
/// the only ones a caller of this crate should expect in practice.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveError {
    #[error("system must be echelonized before tables can be prepared")]
    NotEchelonized,

    #[error(transparent)]
    Shape(#[from] mrhs_core::ShapeError),
}
