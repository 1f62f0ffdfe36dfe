//! In-memory cluster and Kruize doubles shared by the scenario tests

use recommender_lib::cluster::{async_trait, ClusterApi};
use recommender_lib::error::{RecommenderError, Result};
use recommender_lib::kruize::{ApiOutcome, CreateExperiment, ExperimentRecommendations, KruizeApi};
use recommender_lib::models::{
    ContainerInfo, ContainerPolicy, RecommenderRef, ResourcePolicy, TargetRef,
    VerticalPodAutoscaler, VpaSpec, VpaStatusPatch,
};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

#[derive(Default)]
pub struct InMemoryCluster {
    pub vpas: Vec<VerticalPodAutoscaler>,
    pub deployments: HashMap<(String, String), Vec<ContainerInfo>>,
    pub patches: Mutex<Vec<(String, String, VpaStatusPatch)>>,
}

impl InMemoryCluster {
    pub fn new(vpas: Vec<VerticalPodAutoscaler>) -> Self {
        Self {
            vpas,
            ..Self::default()
        }
    }

    pub fn deployment(mut self, namespace: &str, name: &str, containers: &[(&str, &str)]) -> Self {
        self.deployments.insert(
            (namespace.to_string(), name.to_string()),
            containers
                .iter()
                .map(|(container, image)| ContainerInfo::new(*container, *image))
                .collect(),
        );
        self
    }

    pub fn patches(&self) -> Vec<(String, String, VpaStatusPatch)> {
        self.patches.lock().unwrap().clone()
    }
}

#[async_trait]
impl ClusterApi for InMemoryCluster {
    async fn crd_installed(&self, kind: &str) -> Result<bool> {
        Ok("VerticalPodAutoscaler".eq_ignore_ascii_case(kind))
    }

    async fn list_vpas(&self) -> Result<Vec<VerticalPodAutoscaler>> {
        Ok(self.vpas.clone())
    }

    async fn deployment_containers(&self, name: &str, namespace: &str) -> Result<Vec<ContainerInfo>> {
        self.deployments
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
            .ok_or_else(|| RecommenderError::MissingPodSpec {
                namespace: namespace.to_string(),
                name: name.to_string(),
            })
    }

    async fn patch_vpa_status(
        &self,
        namespace: &str,
        name: &str,
        patch: &VpaStatusPatch,
    ) -> Result<()> {
        self.patches
            .lock()
            .unwrap()
            .push((namespace.to_string(), name.to_string(), patch.clone()));
        Ok(())
    }
}

/// Kruize double: experiments are registered in memory and
/// `generateRecommendations` answers with a canned body per experiment
#[derive(Default)]
pub struct InMemoryKruize {
    pub experiments: Mutex<HashSet<String>>,
    pub created: Mutex<Vec<CreateExperiment>>,
    pub responses: HashMap<String, Value>,
    pub transport_down: bool,
}

impl InMemoryKruize {
    pub fn with_experiment(self, name: &str) -> Self {
        self.experiments.lock().unwrap().insert(name.to_string());
        self
    }

    pub fn respond(mut self, experiment: &str, body: Value) -> Self {
        self.responses.insert(experiment.to_string(), body);
        self
    }

    pub fn created(&self) -> Vec<CreateExperiment> {
        self.created.lock().unwrap().clone()
    }
}

#[async_trait]
impl KruizeApi for InMemoryKruize {
    async fn list_experiment(&self, experiment_name: &str) -> Result<ApiOutcome<()>> {
        if self.transport_down {
            return Err(RecommenderError::MalformedResponse {
                endpoint: "listExperiments",
                source: serde_json::from_str::<Value>("502 Bad Gateway").unwrap_err(),
            });
        }
        if self.experiments.lock().unwrap().contains(experiment_name) {
            Ok(ApiOutcome::Success(()))
        } else {
            Ok(ApiOutcome::Rejected {
                status: 400,
                body: format!("Given experiment name - {} is not valid", experiment_name),
            })
        }
    }

    async fn create_experiment(&self, experiment: &CreateExperiment) -> Result<ApiOutcome<()>> {
        self.experiments
            .lock()
            .unwrap()
            .insert(experiment.experiment_name.clone());
        self.created.lock().unwrap().push(experiment.clone());
        Ok(ApiOutcome::Success(()))
    }

    async fn generate_recommendations(
        &self,
        experiment_name: &str,
    ) -> Result<ApiOutcome<Vec<ExperimentRecommendations>>> {
        match self.responses.get(experiment_name) {
            Some(body) => {
                let parsed = serde_json::from_value(body.clone()).map_err(|source| {
                    RecommenderError::MalformedResponse {
                        endpoint: "generateRecommendations",
                        source,
                    }
                })?;
                Ok(ApiOutcome::Success(parsed))
            }
            None => Ok(ApiOutcome::Rejected {
                status: 400,
                body: "no recommendations".to_string(),
            }),
        }
    }
}

pub fn kruize_vpa(name: &str, deployment: &str, policy: ContainerPolicy) -> VerticalPodAutoscaler {
    VerticalPodAutoscaler::new(
        name,
        Some("shop"),
        VpaSpec {
            target_ref: TargetRef {
                api_version: Some("apps/v1".to_string()),
                kind: Some("Deployment".to_string()),
                name: deployment.to_string(),
            },
            resource_policy: Some(ResourcePolicy {
                container_policies: vec![policy],
            }),
            recommenders: Some(vec![RecommenderRef {
                name: "kruize".to_string(),
            }]),
        },
    )
}

/// `generateRecommendations` body with one container and the given
/// `(timestamp, cpu, memory)` entries
pub fn recommendation_body(experiment: &str, container: &str, entries: &[(&str, f64, f64)]) -> Value {
    let mut data = serde_json::Map::new();
    for (timestamp, cpu, memory) in entries {
        data.insert(
            timestamp.to_string(),
            serde_json::json!({
                "recommendation_terms": {"short_term": {"recommendation_engines": {"cost": {
                    "config": {"requests": {
                        "cpu": {"amount": cpu, "format": "cores"},
                        "memory": {"amount": memory, "format": "bytes"}
                    }}
                }}}}
            }),
        );
    }

    serde_json::json!([{
        "experiment_name": experiment,
        "kubernetes_objects": [{
            "type": "deployment",
            "name": "app",
            "namespace": "shop",
            "containers": [{
                "container_name": container,
                "recommendations": {"data": data}
            }]
        }]
    }])
}
