//! Kubernetes cluster access
//!
//! The reconciler only talks to the cluster through `ClusterApi`, so it can
//! run against an in-memory double in tests and against `KubeCluster` in
//! production.

mod kube_cluster;

pub use kube_cluster::{KubeCluster, VpaResourceConfig};

use crate::error::Result;
use crate::models::{ContainerInfo, VerticalPodAutoscaler, VpaStatusPatch};

pub use async_trait::async_trait;

/// Cluster operations used by the recommender
#[async_trait]
pub trait ClusterApi: Send + Sync {
    /// Whether a CRD with the given kind (case-insensitive) is installed
    async fn crd_installed(&self, kind: &str) -> Result<bool>;

    /// List VPAs across all namespaces
    async fn list_vpas(&self) -> Result<Vec<VerticalPodAutoscaler>>;

    /// Containers of a Deployment's pod template
    async fn deployment_containers(&self, name: &str, namespace: &str)
        -> Result<Vec<ContainerInfo>>;

    /// Merge-patch the status subresource of a VPA
    async fn patch_vpa_status(
        &self,
        namespace: &str,
        name: &str,
        patch: &VpaStatusPatch,
    ) -> Result<()>;
}
