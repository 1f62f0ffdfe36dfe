//! Recommendation extraction
//!
//! Turns a Kruize `generateRecommendations` response into VPA container
//! recommendations for the containers the VPA governs. Only the short-term,
//! cost-optimized requests are used, and each one becomes a single-point
//! estimate repeated across lower bound, target and upper bound.

use crate::error::Result;
use crate::kruize::{
    ApiOutcome, ExperimentRecommendations, KubernetesObjectRecommendations, KruizeApi,
    TimestampRecommendation,
};
use crate::matcher::match_containers;
use crate::models::{ContainerInfo, ContainerRecommendation, ResourceQuantities, VerticalPodAutoscaler};
use crate::quantity::{format_quantity, ResourceKind};
use crate::resolver::{ExperimentResolver, ExperimentState};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Which timestamp entries of a container's recommendation data are emitted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryPolicy {
    /// One recommendation per timestamp entry, in response order
    #[default]
    AllEntries,
    /// Only the entry with the most recent timestamp
    LatestOnly,
}

impl HistoryPolicy {
    fn select<'a>(
        &self,
        data: &'a [(String, TimestampRecommendation)],
    ) -> Vec<&'a TimestampRecommendation> {
        match self {
            HistoryPolicy::AllEntries => data.iter().map(|(_, entry)| entry).collect(),
            // RFC 3339 timestamps in one format order lexicographically
            HistoryPolicy::LatestOnly => data
                .iter()
                .max_by(|a, b| a.0.cmp(&b.0))
                .map(|(_, entry)| entry)
                .into_iter()
                .collect(),
        }
    }
}

pub struct RecommendationExtractor {
    kruize: Arc<dyn KruizeApi>,
    resolver: ExperimentResolver,
    history: HistoryPolicy,
}

impl RecommendationExtractor {
    pub fn new(
        kruize: Arc<dyn KruizeApi>,
        resolver: ExperimentResolver,
        history: HistoryPolicy,
    ) -> Self {
        Self {
            kruize,
            resolver,
            history,
        }
    }

    /// Recommendations for `vpa` given the containers of its live target.
    ///
    /// An empty result means nothing is actionable yet: the experiment was
    /// just created, Kruize declined to generate, or no data has accumulated.
    pub async fn extract(
        &self,
        vpa: &VerticalPodAutoscaler,
        containers: &[ContainerInfo],
    ) -> Result<Vec<ContainerRecommendation>> {
        match self.resolver.resolve(vpa, containers).await? {
            ExperimentState::Exists => {}
            state => {
                debug!(vpa = %vpa.name(), state = ?state, "Experiment not ready for recommendations");
                return Ok(Vec::new());
            }
        }

        let experiment_name = vpa.experiment_name();
        let response = match self.kruize.generate_recommendations(experiment_name).await? {
            ApiOutcome::Success(response) => response,
            ApiOutcome::Rejected { status, body } => {
                warn!(
                    experiment = %experiment_name,
                    status = status,
                    body = %body,
                    "Generate recommendations failed, will retry next cycle"
                );
                return Ok(Vec::new());
            }
        };
        info!(experiment = %experiment_name, "Fetched latest recommendations");

        let object = ExperimentRecommendations::first(&response, experiment_name)?
            .first_object(experiment_name)?;
        let targets = match_containers(vpa.primary_container_policy()?, containers);
        debug!(
            vpa = %vpa.name(),
            containers = ?targets.iter().map(|c| c.container_name.as_str()).collect::<Vec<_>>(),
            "Selected containers to update"
        );

        build_recommendations(&targets, object, self.history)
    }
}

/// Container recommendations for `targets` out of one response object.
///
/// Only entries of targeted containers are parsed, so a malformed entry for
/// any other container is ignored.
pub fn build_recommendations(
    targets: &[ContainerInfo],
    object: &KubernetesObjectRecommendations,
    history: HistoryPolicy,
) -> Result<Vec<ContainerRecommendation>> {
    let mut recommendations = Vec::new();

    for target in targets {
        for container in object.containers_named(&target.container_name) {
            let data = container.data()?;
            if data.is_empty() {
                info!(
                    container = %target.container_name,
                    "Recommendation data is not yet available"
                );
                continue;
            }

            for entry in history.select(&data.data) {
                let requests = entry.short_term_cost_requests();
                let quantities = ResourceQuantities {
                    cpu: format_quantity(ResourceKind::Cpu, requests.cpu.amount),
                    memory: format_quantity(ResourceKind::Memory, requests.memory.amount),
                };
                debug!(
                    container = %target.container_name,
                    cpu = %quantities.cpu,
                    memory = %quantities.memory,
                    "Short-term cost recommendation"
                );
                recommendations.push(ContainerRecommendation::point(
                    target.container_name.clone(),
                    quantities,
                ));
            }
        }
    }

    Ok(recommendations)
}
