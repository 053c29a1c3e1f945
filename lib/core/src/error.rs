use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Why a title lookup produced no recommendation.
#[derive(Debug, Clone, PartialEq)]
pub enum NotFoundReason {
    /// No metadata title scored at or above the fuzzy threshold.
    NoCloseMatch { query: String, best_score: f64 },
    /// A title matched but its id has no row in the similarity matrix.
    MissingSimilarity { id: u64, title: String },
}

impl std::fmt::Display for NotFoundReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotFoundReason::NoCloseMatch { query, best_score } => write!(
                f,
                "no close match for '{}' (best score {:.1})",
                query, best_score
            ),
            NotFoundReason::MissingSimilarity { id, title } => write!(
                f,
                "item {} ('{}') has no similarity data",
                id, title
            ),
        }
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),

    #[error("Title not found: {0}")]
    NotFound(NotFoundReason),

    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl Error {
    /// Client-facing failures that should not be logged as errors.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }
}
