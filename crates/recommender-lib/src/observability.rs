//! Observability infrastructure for the recommender
//!
//! Provides:
//! - Prometheus metrics (cycle latency, selected VPAs, experiments, patches, errors)
//! - Structured JSON logging with tracing

use prometheus::{
    register_histogram, register_int_counter, register_int_gauge, Histogram, IntCounter,
    IntGauge,
};
use std::sync::OnceLock;
use tracing::{info, warn};

/// Histogram buckets for reconciliation cycle duration (in seconds)
const CYCLE_BUCKETS: &[f64] = &[0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<RecommenderMetricsInner> = OnceLock::new();

struct RecommenderMetricsInner {
    cycle_duration_seconds: Histogram,
    cycles_total: IntCounter,
    cycle_failures: IntCounter,
    vpas_selected: IntGauge,
    experiments_created: IntCounter,
    recommendations_patched: IntCounter,
    vpa_errors: IntCounter,
}

impl RecommenderMetricsInner {
    fn new() -> Self {
        Self {
            cycle_duration_seconds: register_histogram!(
                "kruize_vpa_recommender_cycle_duration_seconds",
                "Time spent reconciling all selected VPAs",
                CYCLE_BUCKETS.to_vec()
            )
            .expect("Failed to register cycle_duration_seconds"),

            cycles_total: register_int_counter!(
                "kruize_vpa_recommender_cycles_total",
                "Total number of reconciliation cycles run"
            )
            .expect("Failed to register cycles_total"),

            cycle_failures: register_int_counter!(
                "kruize_vpa_recommender_cycle_failures_total",
                "Cycles aborted because VPAs could not be listed"
            )
            .expect("Failed to register cycle_failures"),

            vpas_selected: register_int_gauge!(
                "kruize_vpa_recommender_vpas_selected",
                "VPAs that opted into this recommender in the last cycle"
            )
            .expect("Failed to register vpas_selected"),

            experiments_created: register_int_counter!(
                "kruize_vpa_recommender_experiments_created_total",
                "Total number of Kruize experiments registered"
            )
            .expect("Failed to register experiments_created"),

            recommendations_patched: register_int_counter!(
                "kruize_vpa_recommender_recommendations_patched_total",
                "Total number of VPA status patches applied"
            )
            .expect("Failed to register recommendations_patched"),

            vpa_errors: register_int_counter!(
                "kruize_vpa_recommender_vpa_errors_total",
                "Total number of VPAs that failed to reconcile"
            )
            .expect("Failed to register vpa_errors"),
        }
    }
}

/// Recommender metrics for Prometheus exposition
///
/// Lightweight handle to the global metrics instance; clones share the same
/// underlying metrics.
#[derive(Clone)]
pub struct RecommenderMetrics {
    _private: (),
}

impl Default for RecommenderMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl RecommenderMetrics {
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(RecommenderMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &RecommenderMetricsInner {
        GLOBAL_METRICS.get_or_init(RecommenderMetricsInner::new)
    }

    pub fn observe_cycle(&self, duration_secs: f64) {
        self.inner().cycle_duration_seconds.observe(duration_secs);
        self.inner().cycles_total.inc();
    }

    pub fn inc_cycle_failures(&self) {
        self.inner().cycle_failures.inc();
    }

    pub fn set_vpas_selected(&self, count: i64) {
        self.inner().vpas_selected.set(count);
    }

    pub fn inc_experiments_created(&self) {
        self.inner().experiments_created.inc();
    }

    pub fn inc_recommendations_patched(&self) {
        self.inner().recommendations_patched.inc();
    }

    pub fn inc_vpa_errors(&self) {
        self.inner().vpa_errors.inc();
    }
}

/// Structured logger for recommender events
///
/// Emits consistently named events so log pipelines can follow a VPA from
/// experiment registration to status patch.
#[derive(Clone)]
pub struct StructuredLogger {
    recommender: String,
}

impl StructuredLogger {
    pub fn new(recommender: impl Into<String>) -> Self {
        Self {
            recommender: recommender.into(),
        }
    }

    pub fn log_startup(&self, version: &str, kruize_url: &str, poll_interval_secs: u64) {
        info!(
            event = "recommender_started",
            recommender = %self.recommender,
            version = %version,
            kruize_url = %kruize_url,
            poll_interval_secs = poll_interval_secs,
            "VPA recommender started"
        );
    }

    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "recommender_shutdown",
            recommender = %self.recommender,
            reason = %reason,
            "VPA recommender shutting down"
        );
    }

    pub fn log_crd_check(&self, kind: &str, found: bool) {
        if found {
            info!(
                event = "crd_check",
                recommender = %self.recommender,
                kind = %kind,
                found = true,
                "VerticalPodAutoscaler CRD is present"
            );
        } else {
            warn!(
                event = "crd_check",
                recommender = %self.recommender,
                kind = %kind,
                found = false,
                "VerticalPodAutoscaler CRD is not created"
            );
        }
    }

    pub fn log_experiment_created(&self, experiment: &str, namespace: &str) {
        info!(
            event = "experiment_created",
            recommender = %self.recommender,
            experiment = %experiment,
            namespace = %namespace,
            "Experiment registered with Kruize"
        );
    }

    pub fn log_vpa_patched(&self, vpa: &str, namespace: &str, containers: usize) {
        info!(
            event = "vpa_patched",
            recommender = %self.recommender,
            vpa = %vpa,
            namespace = %namespace,
            container_recommendations = containers,
            "VPA has been patched with recommendations"
        );
    }

    pub fn log_vpa_failure(&self, vpa: &str, namespace: &str, error: &str) {
        warn!(
            event = "vpa_reconcile_failed",
            recommender = %self.recommender,
            vpa = %vpa,
            namespace = %namespace,
            error = %error,
            "Failed to reconcile VPA, will retry next cycle"
        );
    }

    pub fn log_cycle(&self, selected: usize, patched: usize, failed: usize, elapsed_ms: u128) {
        info!(
            event = "cycle_complete",
            recommender = %self.recommender,
            selected = selected,
            patched = patched,
            failed = failed,
            elapsed_ms = elapsed_ms,
            "Reconciliation cycle complete"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recommender_metrics_creation() {
        let metrics = RecommenderMetrics::new();
        let other = metrics.clone();

        metrics.observe_cycle(0.2);
        metrics.set_vpas_selected(3);
        other.inc_experiments_created();
        other.inc_recommendations_patched();
        other.inc_vpa_errors();
        other.inc_cycle_failures();
    }

    #[test]
    fn test_structured_logger_creation() {
        let logger = StructuredLogger::new("kruize");
        assert_eq!(logger.recommender, "kruize");
    }
}
