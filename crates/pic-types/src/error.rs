use thiserror::Error;

#[derive(Error, Debug)]
pub enum PicError {
    #[error("Solver diverged at iteration {iteration}: {message}")]
    SolverDiverged { iteration: usize, message: String },

    #[error("Solver failed to converge after {iterations} iterations: {message}")]
    NotConverged { iterations: usize, message: String },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Unknown field solver algorithm: {0}")]
    UnknownAlgorithm(String),

    #[error("Grid mismatch: {0}")]
    GridMismatch(String),

    #[error("Physics constraint violated: {0}")]
    PhysicsViolation(String),

    #[error("Checkpoint error: {0}")]
    Checkpoint(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PicError {
    /// Errors after which the time loop must stop.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            PicError::SolverDiverged { .. }
                | PicError::NotConverged { .. }
                | PicError::UnknownAlgorithm(_)
        )
    }
}

pub type PicResult<T> = Result<T, PicError>;
