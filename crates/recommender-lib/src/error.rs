//! Error types for the recommender

use std::time::Duration;
use thiserror::Error;

pub type Result<T, E = RecommenderError> = std::result::Result<T, E>;

/// Errors raised while reconciling VPAs against Kruize
#[derive(Debug, Error)]
pub enum RecommenderError {
    /// The VerticalPodAutoscaler CRD is not installed in the cluster
    #[error("{kind} CRD is not installed in the cluster")]
    CrdNotFound { kind: String },

    #[error("kubernetes API error: {0}")]
    Kube(#[from] kube::Error),

    #[error("kruize request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid kruize URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// A response body did not match the expected schema
    #[error("malformed response from {endpoint}: {source}")]
    MalformedResponse {
        endpoint: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// A response was well-formed but lacked an element we index into
    #[error("recommendation response for experiment '{experiment}' has no {missing}")]
    EmptyRecommendationResponse {
        experiment: String,
        missing: &'static str,
    },

    #[error("VPA {namespace}/{name} declares no container policy")]
    MissingContainerPolicy { namespace: String, name: String },

    #[error("VPA object could not be parsed: {0}")]
    InvalidVpa(String),

    #[error("deployment {namespace}/{name} has no pod template spec")]
    MissingPodSpec { namespace: String, name: String },

    #[error("{operation} timed out after {timeout:?}")]
    Timeout {
        operation: &'static str,
        timeout: Duration,
    },
}

impl RecommenderError {
    /// Whether the process should stop instead of retrying on the next cycle
    pub fn is_fatal(&self) -> bool {
        matches!(self, RecommenderError::CrdNotFound { .. })
    }
}
