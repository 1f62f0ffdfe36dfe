//! `ClusterApi` backed by the Kubernetes API server

use super::{async_trait, ClusterApi};
use crate::error::{RecommenderError, Result};
use crate::models::{ContainerInfo, VerticalPodAutoscaler, VpaStatusPatch};
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
use kube::api::{Api, DynamicObject, GroupVersionKind, ListParams, Patch, PatchParams};
use kube::discovery::ApiResource;
use kube::Client;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Where the VPA custom resource lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VpaResourceConfig {
    pub group: String,
    pub version: String,
    pub plural: String,
    /// CRD kind, compared case-insensitively
    pub kind: String,
}

impl Default for VpaResourceConfig {
    fn default() -> Self {
        Self {
            group: "autoscaling.k8s.io".to_string(),
            version: "v1".to_string(),
            plural: "verticalpodautoscalers".to_string(),
            kind: "verticalpodautoscaler".to_string(),
        }
    }
}

impl VpaResourceConfig {
    fn api_resource(&self) -> ApiResource {
        let gvk = GroupVersionKind::gvk(&self.group, &self.version, "VerticalPodAutoscaler");
        ApiResource::from_gvk_with_plural(&gvk, &self.plural)
    }
}

pub struct KubeCluster {
    client: Client,
    vpa_resource: ApiResource,
    timeout: Duration,
}

impl KubeCluster {
    pub fn new(client: Client, vpa: &VpaResourceConfig, timeout: Duration) -> Self {
        Self {
            client,
            vpa_resource: vpa.api_resource(),
            timeout,
        }
    }

    /// Connect with the in-cluster service account, or the local kubeconfig
    /// when running outside a cluster
    pub async fn try_default(vpa: &VpaResourceConfig, timeout: Duration) -> Result<Self> {
        let client = Client::try_default().await?;
        Ok(Self::new(client, vpa, timeout))
    }

    async fn timed<T, F>(&self, operation: &'static str, call: F) -> Result<T>
    where
        F: Future<Output = std::result::Result<T, kube::Error>>,
    {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(RecommenderError::Timeout {
                operation,
                timeout: self.timeout,
            }),
        }
    }
}

#[async_trait]
impl ClusterApi for KubeCluster {
    async fn crd_installed(&self, kind: &str) -> Result<bool> {
        let api: Api<CustomResourceDefinition> = Api::all(self.client.clone());
        let crds = self.timed("list CRDs", api.list(&ListParams::default())).await?;

        Ok(crds
            .items
            .iter()
            .any(|crd| crd.spec.names.kind.eq_ignore_ascii_case(kind)))
    }

    async fn list_vpas(&self) -> Result<Vec<VerticalPodAutoscaler>> {
        let api: Api<DynamicObject> = Api::all_with(self.client.clone(), &self.vpa_resource);
        let objects = self.timed("list VPAs", api.list(&ListParams::default())).await?;

        let mut vpas = Vec::with_capacity(objects.items.len());
        for object in objects.items {
            let name = object.metadata.name.clone().unwrap_or_default();
            let parsed = serde_json::to_value(&object)
                .map_err(|e| RecommenderError::InvalidVpa(e.to_string()))
                .and_then(VerticalPodAutoscaler::from_value);

            match parsed {
                Ok(vpa) => vpas.push(vpa),
                Err(e) => warn!(vpa = %name, error = %e, "Skipping unparseable VPA"),
            }
        }

        debug!(count = vpas.len(), "Listed VPAs");
        Ok(vpas)
    }

    async fn deployment_containers(
        &self,
        name: &str,
        namespace: &str,
    ) -> Result<Vec<ContainerInfo>> {
        let api: Api<Deployment> = Api::namespaced(self.client.clone(), namespace);
        let deployment = self.timed("read deployment", api.get(name)).await?;

        let pod_spec = deployment
            .spec
            .and_then(|spec| spec.template.spec)
            .ok_or_else(|| RecommenderError::MissingPodSpec {
                namespace: namespace.to_string(),
                name: name.to_string(),
            })?;

        Ok(pod_spec
            .containers
            .into_iter()
            .map(|c| ContainerInfo::new(c.name, c.image.unwrap_or_default()))
            .collect())
    }

    async fn patch_vpa_status(
        &self,
        namespace: &str,
        name: &str,
        patch: &VpaStatusPatch,
    ) -> Result<()> {
        let api: Api<DynamicObject> =
            Api::namespaced_with(self.client.clone(), namespace, &self.vpa_resource);

        self.timed(
            "patch VPA status",
            api.patch_status(name, &PatchParams::default(), &Patch::Merge(patch)),
        )
        .await?;

        Ok(())
    }
}
