use thiserror::Error;

/// Errors that can occur in the solver
#[derive(Debug, Error)]
pub enum SolverError {
    #[error("invalid game configuration: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("blueprint serialization error: {0}")]
    Serialization(String),

    #[error("illegal action: {0}")]
    IllegalAction(String),
}
