use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReviewError {
    #[error("not initialized: run 'review-bot init'")]
    NotInitialized,

    #[error("no available senior reviewers")]
    NoAvailableReviewer,

    #[error("not all tickets could be scheduled; left over: {}", leftover.join(", "))]
    SchedulingCapacityExceeded { leftover: Vec<String> },

    #[error("persisted rotation state unreadable: {0}")]
    PersistedStateUnreadable(String),

    #[error("fallback ranking failed: {0}")]
    FallbackRankingFailed(String),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("missing access token: set {0}")]
    MissingToken(String),

    #[error("{service} returned {status}: {body}")]
    Api {
        service: String,
        status: u16,
        body: String,
    },

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ReviewError>;
