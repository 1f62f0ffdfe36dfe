//! Kruize recommendation service access
//!
//! This module provides:
//! - The `KruizeApi` trait the resolver and extractor depend on
//! - An HTTP client for the Kruize REST API
//! - The experiment creation payload and its configurable defaults
//! - Typed recommendation responses

mod client;
mod experiment;
mod recommendation;


pub use client::{KruizeClient, KruizeClientConfig};
pub use experiment::{
    CreateExperiment, ExperimentObject, ExperimentTemplate, RecommendationSettings,
    TrialSettings,
};
pub use recommendation::{
    Amount, ContainerRecommendations, EngineRecommendation, ExperimentRecommendations,
    KubernetesObjectRecommendations, RecommendationData, RecommendationEngines,
    RecommendationTerms, RecommendedConfig, ResourceRequests, TermRecommendation,
    TimestampRecommendation,
};

use crate::error::Result;

pub use async_trait::async_trait;

pub const LIST_EXPERIMENTS_PATH: &str = "listExperiments";
pub const CREATE_EXPERIMENT_PATH: &str = "createExperiment";
pub const GENERATE_RECOMMENDATIONS_PATH: &str = "generateRecommendations";

/// Result of a Kruize call that reached the service
#[derive(Debug, Clone, PartialEq)]
pub enum ApiOutcome<T> {
    /// The service answered with a success status
    Success(T),
    /// The service answered with a non-success status
    Rejected { status: u16, body: String },
}

impl<T> ApiOutcome<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, ApiOutcome::Success(_))
    }
}

/// Operations of the Kruize REST API used by the recommender
#[async_trait]
pub trait KruizeApi: Send + Sync {
    /// Look up an experiment by name
    async fn list_experiment(&self, experiment_name: &str) -> Result<ApiOutcome<()>>;

    /// Register a new experiment
    async fn create_experiment(&self, experiment: &CreateExperiment) -> Result<ApiOutcome<()>>;

    /// Generate the latest recommendations for an experiment
    async fn generate_recommendations(
        &self,
        experiment_name: &str,
    ) -> Result<ApiOutcome<Vec<ExperimentRecommendations>>>;
}
