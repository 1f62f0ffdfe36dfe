use super::{Reconciler, ReconcilerConfig};
use crate::cluster::ClusterApi;
use crate::extractor::{HistoryPolicy, RecommendationExtractor};
use crate::health::HealthRegistry;
use crate::kruize::{ExperimentTemplate, KruizeApi};
use crate::observability::{RecommenderMetrics, StructuredLogger};
use crate::resolver::ExperimentResolver;
use std::sync::Arc;
use std::time::Duration;

/// Builder wiring the reconciler to its cluster and Kruize collaborators
pub struct ReconcilerBuilder {
    cluster: Arc<dyn ClusterApi>,
    kruize: Arc<dyn KruizeApi>,
    config: ReconcilerConfig,
    template: ExperimentTemplate,
    history: HistoryPolicy,
    health: Option<HealthRegistry>,
}

impl ReconcilerBuilder {
    pub fn new(cluster: Arc<dyn ClusterApi>, kruize: Arc<dyn KruizeApi>) -> Self {
        Self {
            cluster,
            kruize,
            config: ReconcilerConfig::default(),
            template: ExperimentTemplate::default(),
            history: HistoryPolicy::default(),
            health: None,
        }
    }

    pub fn recommender_name(mut self, name: impl Into<String>) -> Self {
        self.config.recommender_name = name.into();
        self
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.config.poll_interval = interval;
        self
    }

    pub fn vpa_kind(mut self, kind: impl Into<String>) -> Self {
        self.config.vpa_kind = kind.into();
        self
    }

    /// Defaults for experiments registered on behalf of VPAs
    pub fn experiment_template(mut self, template: ExperimentTemplate) -> Self {
        self.template = template;
        self
    }

    pub fn history_policy(mut self, history: HistoryPolicy) -> Self {
        self.history = history;
        self
    }

    /// Share an existing registry, e.g. with the probe server
    pub fn health(mut self, health: HealthRegistry) -> Self {
        self.health = Some(health);
        self
    }

    pub fn build(self) -> Reconciler {
        let logger = StructuredLogger::new(&self.config.recommender_name);
        let resolver =
            ExperimentResolver::new(self.kruize.clone(), self.template, logger.clone());
        let extractor = RecommendationExtractor::new(self.kruize, resolver, self.history);

        Reconciler {
            cluster: self.cluster,
            extractor,
            config: self.config,
            health: self.health.unwrap_or_default(),
            metrics: RecommenderMetrics::new(),
            logger,
        }
    }
}
