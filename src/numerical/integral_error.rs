use thiserror::Error;

/// Errors a user can recover from by re-entering the problem.
#[derive(Debug, Error)]
pub enum IntegralError {
    #[error("cannot parse '{input}': {reason}")]
    Parse { input: String, reason: String },
    #[error("invalid variable name '{0}'")]
    InvalidVariable(String),
    #[error("invalid bound '{input}': {reason}")]
    InvalidBound { input: String, reason: String },
    #[error("invalid number of subdivisions '{0}': expected a positive integer")]
    InvalidCount(String),
    #[error("invalid plot quality '{0}': expected a positive integer")]
    InvalidQuality(String),
    #[error("rendering failed: {0}")]
    Render(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("task document: {0}")]
    Task(String),
}

impl From<csv::Error> for IntegralError {
    fn from(error: csv::Error) -> Self {
        IntegralError::Io(std::io::Error::other(error))
    }
}
