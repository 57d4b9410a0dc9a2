use thiserror::Error;

/// Errors returned by feature extraction operations.
///
/// Every error is raised synchronously before any numeric work begins;
/// an operation either fully succeeds or produces no output.
#[derive(Debug, Error)]
pub enum FeatureError {
    /// Invalid static parameter combination.
    #[error("invalid configuration: {reason}")]
    Config { reason: String },

    /// Invalid dynamic argument value.
    #[error("invalid value: {reason}")]
    Value { reason: String },

    /// Input rank outside the supported set for a rank-polymorphic operation.
    #[error("unsupported input rank {rank}, expected {expected}")]
    ShapeMismatch { rank: usize, expected: &'static str },
}

impl FeatureError {
    pub(crate) fn config(reason: impl Into<String>) -> Self {
        FeatureError::Config { reason: reason.into() }
    }

    pub(crate) fn value(reason: impl Into<String>) -> Self {
        FeatureError::Value { reason: reason.into() }
    }
}

pub type Result<T> = std::result::Result<T, FeatureError>;
