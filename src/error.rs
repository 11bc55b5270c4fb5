/// Failures surfaced by the classification pipeline.
#[derive(Debug, thiserror::Error)]
pub enum ClassifyError {
    /// The model artifact is missing or cannot be loaded. Fatal at startup.
    #[error("Model unavailable at {path}: {reason}")]
    ModelUnavailable { path: String, reason: String },
    #[error("URL is empty")]
    EmptyInput,
    #[error("Decision store unavailable: {0}")]
    StoreUnavailable(#[from] rusqlite::Error),
    #[error("Decision store unavailable: cannot create directory {path}: {source}")]
    StoreDirectory {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Classifier returned {0}, expected 0 or 1")]
    InvalidPrediction(i64),
}

pub type Result<T> = std::result::Result<T, ClassifyError>;

impl ClassifyError {
    pub(crate) fn model_unavailable(path: &str, reason: impl ToString) -> Self {
        ClassifyError::ModelUnavailable {
            path: path.to_string(),
            reason: reason.to_string(),
        }
    }
}
