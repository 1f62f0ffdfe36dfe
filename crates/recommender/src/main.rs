//! Kruize VPA recommender
//!
//! This binary runs as a Deployment in the cluster, polling VPAs that name
//! the Kruize recommender and patching their status with Kruize
//! recommendations.

use anyhow::{Context, Result};
use recommender_lib::{
    cluster::KubeCluster,
    health::HealthRegistry,
    kruize::KruizeClient,
    observability::StructuredLogger,
    reconciler::ReconcilerBuilder,
};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod api;
mod config;

const RECOMMENDER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Exit code when the VerticalPodAutoscaler CRD is not installed
const EXIT_CRD_MISSING: i32 = 2;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    let config = config::RecommenderConfig::load()?;
    info!(
        recommender = %config.recommender_name,
        kruize_url = %config.kruize_url,
        "Recommender configured"
    );

    let logger = StructuredLogger::new(&config.recommender_name);
    logger.log_startup(
        RECOMMENDER_VERSION,
        &config.kruize_url,
        config.poll_interval_secs,
    );

    let health_registry = HealthRegistry::with_components().await;

    let kruize = Arc::new(
        KruizeClient::new(config.kruize_client()).context("failed to create Kruize client")?,
    );
    let cluster = Arc::new(
        KubeCluster::try_default(&config.vpa_resource(), config.request_timeout())
            .await
            .context("failed to create Kubernetes client")?,
    );

    let reconciler = ReconcilerBuilder::new(cluster, kruize)
        .recommender_name(config.recommender_name.clone())
        .poll_interval(config.poll_interval())
        .vpa_kind(config.vpa_kind.clone())
        .experiment_template(config.experiment.clone())
        .history_policy(config.history_policy)
        .health(health_registry.clone())
        .build();

    let (shutdown_tx, _) = broadcast::channel(1);

    // Liveness is served while the CRD check runs; readiness follows it
    let app_state = Arc::new(api::AppState::new(health_registry));
    let api_handle = tokio::spawn(api::serve(
        config.api_port,
        app_state,
        shutdown_tx.subscribe(),
    ));

    if let Err(e) = reconciler.ensure_vpa_crd().await {
        if e.is_fatal() {
            error!(error = %e, "VerticalPodAutoscaler CRD is not installed, exiting");
            std::process::exit(EXIT_CRD_MISSING);
        }
        return Err(e).context("failed to check for the VerticalPodAutoscaler CRD");
    }

    let loop_shutdown = shutdown_tx.subscribe();
    let signal_logger = logger.clone();
    tokio::spawn(async move {
        let reason = shutdown_signal().await;
        signal_logger.log_shutdown(reason);
        let _ = shutdown_tx.send(());
    });

    reconciler.run(loop_shutdown).await;

    match api_handle.await {
        Ok(Err(e)) => error!(error = %e, "API server failed"),
        Err(e) => error!(error = %e, "API server task panicked"),
        Ok(Ok(())) => {}
    }

    info!("Shutdown complete");
    Ok(())
}

/// Wait for SIGINT or, on unix, SIGTERM
async fn shutdown_signal() -> &'static str {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for SIGINT");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => "SIGINT received",
        _ = terminate => "SIGTERM received",
    }
}
