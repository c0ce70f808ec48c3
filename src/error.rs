/// Errors raised when constructing a map with invalid parameters.
#[derive(Clone, Copy, Debug, Eq, PartialEq, thiserror::Error)]
pub enum TreeError {
    /// The requested branching factor is too small for the engine: a B-tree
    /// needs minimum degree 2, a B+-tree needs order 3.
    #[error("invalid tree degree {degree}, must be at least {minimum}")]
    InvalidDegree { degree: usize, minimum: usize },
}
