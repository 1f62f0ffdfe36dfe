//! HTTP client for the Kruize REST API

use super::{
    async_trait, ApiOutcome, CreateExperiment, ExperimentRecommendations, KruizeApi,
    CREATE_EXPERIMENT_PATH, GENERATE_RECOMMENDATIONS_PATH, LIST_EXPERIMENTS_PATH,
};
use crate::error::{RecommenderError, Result};
use reqwest::{header, Client, Response};
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Configuration for the Kruize client
#[derive(Debug, Clone)]
pub struct KruizeClientConfig {
    /// Base URL of the Kruize service (e.g., "http://kruize:8080/")
    pub base_url: String,
    /// Timeout applied to every request
    pub request_timeout: Duration,
}

impl Default for KruizeClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://kruize:8080/".to_string(),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Client for the Kruize REST API
pub struct KruizeClient {
    client: Client,
    base_url: Url,
}

impl KruizeClient {
    /// Create a new Kruize client
    pub fn new(config: KruizeClientConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.request_timeout).build()?;

        // Url::join replaces the last path segment unless the base ends in '/'
        let mut base = config.base_url;
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base)?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Endpoint URL with an `experiment_name` query parameter
    fn experiment_url(&self, path: &str, experiment_name: &str) -> Result<Url> {
        let mut url = self.base_url.join(path)?;
        url.query_pairs_mut()
            .append_pair("experiment_name", experiment_name);
        Ok(url)
    }

    async fn rejected<T>(response: Response) -> ApiOutcome<T> {
        let status = response.status().as_u16();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                debug!(status = status, error = %e, "Failed to read rejection body");
                String::new()
            }
        };
        ApiOutcome::Rejected { status, body }
    }
}

#[async_trait]
impl KruizeApi for KruizeClient {
    async fn list_experiment(&self, experiment_name: &str) -> Result<ApiOutcome<()>> {
        let url = self.experiment_url(LIST_EXPERIMENTS_PATH, experiment_name)?;
        debug!(url = %url, "Looking up experiment");

        let response = self
            .client
            .get(url)
            .header(header::CONTENT_TYPE, "application/json")
            .send()
            .await?;

        if !response.status().is_success() {
            return Ok(Self::rejected(response).await);
        }
        Ok(ApiOutcome::Success(()))
    }

    async fn create_experiment(&self, experiment: &CreateExperiment) -> Result<ApiOutcome<()>> {
        let url = self.base_url.join(CREATE_EXPERIMENT_PATH)?;
        debug!(url = %url, experiment = %experiment.experiment_name, "Creating experiment");

        // Kruize takes a list of experiments
        let response = self
            .client
            .post(url)
            .json(&[experiment])
            .send()
            .await?;

        if !response.status().is_success() {
            return Ok(Self::rejected(response).await);
        }
        Ok(ApiOutcome::Success(()))
    }

    async fn generate_recommendations(
        &self,
        experiment_name: &str,
    ) -> Result<ApiOutcome<Vec<ExperimentRecommendations>>> {
        let url = self.experiment_url(GENERATE_RECOMMENDATIONS_PATH, experiment_name)?;
        debug!(url = %url, "Generating recommendations");

        let response = self
            .client
            .post(url)
            .header(header::CONTENT_TYPE, "application/json")
            .send()
            .await?;

        if !response.status().is_success() {
            return Ok(Self::rejected(response).await);
        }

        let body = response.bytes().await?;
        let recommendations =
            serde_json::from_slice(&body).map_err(|source| RecommenderError::MalformedResponse {
                endpoint: GENERATE_RECOMMENDATIONS_PATH,
                source,
            })?;

        Ok(ApiOutcome::Success(recommendations))
    }
}
