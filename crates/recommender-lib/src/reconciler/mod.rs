//! VPA reconciliation loop
//!
//! Each cycle lists the VPAs of the cluster, keeps the ones that opted into
//! this recommender and processes them one after the other: read the target
//! Deployment's containers, extract recommendations from Kruize and patch the
//! VPA status. A failing VPA is logged and retried on the next cycle; it never
//! stops the pass over the remaining VPAs.

mod builder;


pub use builder::ReconcilerBuilder;

use crate::cluster::ClusterApi;
use crate::error::{RecommenderError, Result};
use crate::extractor::RecommendationExtractor;
use crate::health::{components, HealthRegistry};
use crate::models::{VerticalPodAutoscaler, VpaStatusPatch};
use crate::observability::{RecommenderMetrics, StructuredLogger};
use crate::selector::select_vpas;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::Instant;
use tracing::{error, info};

/// Default delay between two reconciliation passes
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60);

/// Configuration for the reconciler
#[derive(Debug, Clone)]
pub struct ReconcilerConfig {
    /// Name VPAs use in `spec.recommenders` to opt in
    pub recommender_name: String,
    /// Delay after a full pass over the selected VPAs
    pub poll_interval: Duration,
    /// Kind of the VPA CRD checked at startup
    pub vpa_kind: String,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            recommender_name: "kruize".to_string(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            vpa_kind: "verticalpodautoscaler".to_string(),
        }
    }
}

/// Counters of one reconciliation pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub selected: usize,
    pub patched: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// What happened to one VPA
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VpaOutcome {
    /// Status patched with this many container recommendations
    Patched(usize),
    /// Nothing actionable yet, status left untouched
    NoRecommendations,
}

pub struct Reconciler {
    cluster: Arc<dyn ClusterApi>,
    extractor: RecommendationExtractor,
    config: ReconcilerConfig,
    health: HealthRegistry,
    metrics: RecommenderMetrics,
    logger: StructuredLogger,
}

impl Reconciler {
    pub fn config(&self) -> &ReconcilerConfig {
        &self.config
    }

    pub fn health(&self) -> &HealthRegistry {
        &self.health
    }

    /// Fail with `CrdNotFound` unless the VPA CRD is installed
    pub async fn ensure_vpa_crd(&self) -> Result<()> {
        let kind = &self.config.vpa_kind;
        let found = self.cluster.crd_installed(kind).await?;
        self.logger.log_crd_check(kind, found);

        if !found {
            return Err(RecommenderError::CrdNotFound { kind: kind.clone() });
        }

        self.health.mark_crd_verified().await;
        Ok(())
    }

    /// Run reconciliation passes until `shutdown` fires
    pub async fn run(&self, mut shutdown: broadcast::Receiver<()>) {
        info!(
            recommender = %self.config.recommender_name,
            interval_secs = self.config.poll_interval.as_secs(),
            "Starting reconciliation loop"
        );

        loop {
            if let Err(e) = self.run_cycle().await {
                error!(error = %e, "Reconciliation cycle failed");
            }

            info!(
                secs = self.config.poll_interval.as_secs(),
                "Sleeping until next cycle"
            );
            tokio::select! {
                _ = tokio::time::sleep(self.config.poll_interval) => {}
                _ = shutdown.recv() => {
                    info!("Shutting down reconciliation loop");
                    break;
                }
            }
        }
    }

    /// One pass over every VPA that opted into this recommender.
    ///
    /// Only a failure to list VPAs fails the pass; per-VPA failures are
    /// counted in the report.
    pub async fn run_cycle(&self) -> Result<CycleReport> {
        let start = Instant::now();

        let vpas = match self.cluster.list_vpas().await {
            Ok(vpas) => {
                self.health.set_healthy(components::CLUSTER_API).await;
                vpas
            }
            Err(e) => {
                self.health
                    .set_unhealthy(components::CLUSTER_API, e.to_string())
                    .await;
                self.metrics.inc_cycle_failures();
                return Err(e);
            }
        };

        let selected = select_vpas(vpas, &self.config.recommender_name);
        self.metrics.set_vpas_selected(selected.len() as i64);

        let mut report = CycleReport {
            selected: selected.len(),
            ..CycleReport::default()
        };
        let mut kruize_failures = 0;

        for vpa in &selected {
            info!(
                vpa = %vpa.name(),
                namespace = %vpa.namespace(),
                deployment = %vpa.target_name(),
                "Reconciling VPA"
            );

            match self.reconcile_vpa(vpa).await {
                Ok(VpaOutcome::Patched(_)) => report.patched += 1,
                Ok(VpaOutcome::NoRecommendations) => {
                    info!(vpa = %vpa.name(), "No recommendations found, skipping VPA update");
                    report.skipped += 1;
                }
                Err(e) => {
                    report.failed += 1;
                    if is_kruize_error(&e) {
                        kruize_failures += 1;
                    }
                    self.metrics.inc_vpa_errors();
                    self.logger
                        .log_vpa_failure(vpa.name(), vpa.namespace(), &e.to_string());
                }
            }
        }

        self.record_health(&report, kruize_failures).await;

        let elapsed = start.elapsed();
        self.metrics.observe_cycle(elapsed.as_secs_f64());
        self.logger.log_cycle(
            report.selected,
            report.patched,
            report.failed,
            elapsed.as_millis(),
        );

        Ok(report)
    }

    /// Reconcile a single VPA
    pub async fn reconcile_vpa(&self, vpa: &VerticalPodAutoscaler) -> Result<VpaOutcome> {
        let containers = self
            .cluster
            .deployment_containers(vpa.target_name(), vpa.namespace())
            .await?;

        let recommendations = self.extractor.extract(vpa, &containers).await?;
        if recommendations.is_empty() {
            return Ok(VpaOutcome::NoRecommendations);
        }

        let count = recommendations.len();
        self.cluster
            .patch_vpa_status(
                vpa.namespace(),
                vpa.name(),
                &VpaStatusPatch::new(recommendations),
            )
            .await?;

        self.metrics.inc_recommendations_patched();
        self.logger
            .log_vpa_patched(vpa.name(), vpa.namespace(), count);
        Ok(VpaOutcome::Patched(count))
    }

    async fn record_health(&self, report: &CycleReport, kruize_failures: usize) {
        if kruize_failures > 0 {
            self.health
                .set_degraded(
                    components::KRUIZE_API,
                    format!("{} VPAs failed on Kruize calls", kruize_failures),
                )
                .await;
        } else {
            self.health.set_healthy(components::KRUIZE_API).await;
        }

        if report.failed > 0 {
            self.health
                .set_degraded(
                    components::RECONCILER,
                    format!("{} of {} VPAs failed", report.failed, report.selected),
                )
                .await;
        } else {
            self.health.set_healthy(components::RECONCILER).await;
        }
    }
}

fn is_kruize_error(error: &RecommenderError) -> bool {
    matches!(
        error,
        RecommenderError::Http(_)
            | RecommenderError::MalformedResponse { .. }
            | RecommenderError::EmptyRecommendationResponse { .. }
    )
}
