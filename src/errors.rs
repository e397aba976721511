use thiserror::Error;

/// A result type for optimization errors
pub type Result<T> = std::result::Result<T, OptError>;

/// An error raised by the suggestion engine
#[derive(Error, Debug)]
pub enum OptError {
    /// When configuration is invalid
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// When a search domain definition is invalid
    #[error("invalid domain: {0}")]
    InvalidDomain(String),
    /// When a parameter vector length does not match the domain dimension
    #[error("invalid dimension: expected {expected} parameters, got {actual}")]
    InvalidDimension {
        /// Dimension of the search domain
        expected: usize,
        /// Length of the offending vector
        actual: usize,
    },
    /// When a parameter name is not part of the domain
    #[error("unknown parameter: {0}")]
    UnknownParameter(String),
    /// When a target value is NaN or infinite
    #[error("non-finite target value: {0}")]
    NonFiniteTarget(f64),
    /// When a parameter value is NaN or infinite
    #[error("non-finite value for parameter {0}")]
    NonFiniteParam(String),
    /// When probe or maximize is called on an engine built without an objective
    #[error("no objective function attached; evaluate externally and call register")]
    MissingObjective,
    /// When the surrogate fit keeps failing after the jitter retry
    #[error("surrogate fit failed after jitter retry: {reason}")]
    DegenerateSurrogate {
        /// Failure reported by the surrogate on the retry
        reason: anyhow::Error,
    },
    /// When a collaborator (surrogate, observer) reports a failure
    #[error(transparent)]
    Collaborator(#[from] anyhow::Error),
}
