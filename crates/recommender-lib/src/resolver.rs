//! Experiment resolution
//!
//! Kruize experiments are joined to VPAs by name. Before recommendations can
//! be generated for a VPA, an experiment with the VPA's name has to exist;
//! when it does not, one is registered from the VPA's target and containers.
//! Registration is not retried here: the next poll cycle looks the experiment
//! up again and creates it if it is still missing.

use crate::error::Result;
use crate::kruize::{ApiOutcome, CreateExperiment, ExperimentTemplate, KruizeApi};
use crate::matcher::match_containers;
use crate::models::{ContainerInfo, VerticalPodAutoscaler};
use crate::observability::{RecommenderMetrics, StructuredLogger};
use std::sync::Arc;
use tracing::{info, warn};

/// Outcome of resolving the experiment of a VPA
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExperimentState {
    /// The experiment was already registered
    Exists,
    /// The experiment was missing and has just been registered
    Created,
    /// The experiment was missing and Kruize refused to register it
    CreationFailed,
}

pub struct ExperimentResolver {
    kruize: Arc<dyn KruizeApi>,
    template: ExperimentTemplate,
    logger: StructuredLogger,
    metrics: RecommenderMetrics,
}

impl ExperimentResolver {
    pub fn new(
        kruize: Arc<dyn KruizeApi>,
        template: ExperimentTemplate,
        logger: StructuredLogger,
    ) -> Self {
        Self {
            kruize,
            template,
            logger,
            metrics: RecommenderMetrics::new(),
        }
    }

    /// Make sure the experiment for `vpa` exists, creating it if needed
    pub async fn resolve(
        &self,
        vpa: &VerticalPodAutoscaler,
        containers: &[ContainerInfo],
    ) -> Result<ExperimentState> {
        let experiment_name = vpa.experiment_name();

        match self.kruize.list_experiment(experiment_name).await? {
            ApiOutcome::Success(()) => {
                info!(experiment = %experiment_name, "Experiment for VPA exists");
                Ok(ExperimentState::Exists)
            }
            ApiOutcome::Rejected { status, .. } => {
                info!(
                    experiment = %experiment_name,
                    status = status,
                    "Experiment not registered with Kruize, creating it"
                );
                self.create(vpa, containers).await
            }
        }
    }

    async fn create(
        &self,
        vpa: &VerticalPodAutoscaler,
        containers: &[ContainerInfo],
    ) -> Result<ExperimentState> {
        let experiment = self.experiment_for(vpa, containers)?;

        match self.kruize.create_experiment(&experiment).await? {
            ApiOutcome::Success(()) => {
                self.logger
                    .log_experiment_created(&experiment.experiment_name, vpa.namespace());
                self.metrics.inc_experiments_created();
                Ok(ExperimentState::Created)
            }
            ApiOutcome::Rejected { status, body } => {
                warn!(
                    experiment = %experiment.experiment_name,
                    status = status,
                    body = %body,
                    "Failed to register experiment"
                );
                Ok(ExperimentState::CreationFailed)
            }
        }
    }

    /// Creation payload for `vpa`, covering the containers its first policy selects
    pub fn experiment_for(
        &self,
        vpa: &VerticalPodAutoscaler,
        containers: &[ContainerInfo],
    ) -> Result<CreateExperiment> {
        let policy = vpa.primary_container_policy()?;
        let selected = match_containers(policy, containers);

        Ok(self.template.build(
            vpa.experiment_name(),
            vpa.target_name().trim(),
            vpa.namespace().trim(),
            selected,
        ))
    }
}
