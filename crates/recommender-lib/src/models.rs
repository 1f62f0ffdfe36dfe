//! Core data models for the recommender
//!
//! VPA objects are read from the cluster as dynamic objects and parsed into
//! the subset of the `autoscaling.k8s.io/v1` schema the recommender uses.
//! Unknown fields are ignored.

use crate::error::{RecommenderError, Result};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use serde::{Deserialize, Serialize};

/// Container policy name that applies to every container of the target
pub const WILDCARD_CONTAINER: &str = "*";

/// Namespace used when a VPA carries none
pub const DEFAULT_NAMESPACE: &str = "default";

/// VerticalPodAutoscaler as seen by the recommender
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerticalPodAutoscaler {
    #[serde(default)]
    pub metadata: ObjectMeta,
    pub spec: VpaSpec,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VpaSpec {
    pub target_ref: TargetRef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_policy: Option<ResourcePolicy>,
    /// Recommenders this VPA opts into; absent means the default recommender
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommenders: Option<Vec<RecommenderRef>>,
}

/// Reference to the workload a VPA scales
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetRef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    pub name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourcePolicy {
    #[serde(default)]
    pub container_policies: Vec<ContainerPolicy>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerPolicy {
    #[serde(default = "default_container_name")]
    pub container_name: String,
}

fn default_container_name() -> String {
    WILDCARD_CONTAINER.to_string()
}

impl ContainerPolicy {
    pub fn named(container_name: impl Into<String>) -> Self {
        Self {
            container_name: container_name.into(),
        }
    }

    pub fn wildcard() -> Self {
        Self::named(WILDCARD_CONTAINER)
    }

    pub fn is_wildcard(&self) -> bool {
        self.container_name == WILDCARD_CONTAINER
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommenderRef {
    pub name: String,
}

impl VerticalPodAutoscaler {
    pub fn new(name: impl Into<String>, namespace: Option<&str>, spec: VpaSpec) -> Self {
        Self {
            metadata: ObjectMeta {
                name: Some(name.into()),
                namespace: namespace.map(str::to_string),
                ..ObjectMeta::default()
            },
            spec,
        }
    }

    /// Parse a VPA from its JSON representation
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        serde_json::from_value(value).map_err(|e| RecommenderError::InvalidVpa(e.to_string()))
    }

    pub fn name(&self) -> &str {
        self.metadata.name.as_deref().unwrap_or_default()
    }

    /// Namespace of the VPA, `default` when unset
    pub fn namespace(&self) -> &str {
        self.metadata
            .namespace
            .as_deref()
            .unwrap_or(DEFAULT_NAMESPACE)
    }

    /// Name of the Kruize experiment backing this VPA
    pub fn experiment_name(&self) -> &str {
        self.name().trim()
    }

    pub fn target_name(&self) -> &str {
        &self.spec.target_ref.name
    }

    /// Whether this VPA opted into the recommender called `recommender_name`
    pub fn uses_recommender(&self, recommender_name: &str) -> bool {
        self.spec
            .recommenders
            .as_ref()
            .is_some_and(|recs| recs.iter().any(|r| r.name == recommender_name))
    }

    /// First container policy of the VPA.
    ///
    /// Additional policies are ignored; only the first one decides which
    /// containers get recommendations.
    pub fn primary_container_policy(&self) -> Result<&ContainerPolicy> {
        self.spec
            .resource_policy
            .as_ref()
            .and_then(|p| p.container_policies.first())
            .ok_or_else(|| RecommenderError::MissingContainerPolicy {
                namespace: self.namespace().to_string(),
                name: self.name().to_string(),
            })
    }
}

/// Container of a target Deployment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerInfo {
    pub container_image_name: String,
    pub container_name: String,
}

impl ContainerInfo {
    pub fn new(container_name: impl Into<String>, container_image_name: impl Into<String>) -> Self {
        Self {
            container_image_name: container_image_name.into(),
            container_name: container_name.into(),
        }
    }
}

/// CPU and memory as Kubernetes quantity strings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceQuantities {
    pub cpu: String,
    pub memory: String,
}

/// One entry of `status.recommendation.containerRecommendations`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerRecommendation {
    pub container_name: String,
    pub lower_bound: ResourceQuantities,
    pub target: ResourceQuantities,
    pub upper_bound: ResourceQuantities,
}

impl ContainerRecommendation {
    /// A single-point estimate used as lower bound, target and upper bound
    pub fn point(container_name: impl Into<String>, quantities: ResourceQuantities) -> Self {
        Self {
            container_name: container_name.into(),
            lower_bound: quantities.clone(),
            target: quantities.clone(),
            upper_bound: quantities,
        }
    }
}

/// Merge patch body for the VPA status subresource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VpaStatusPatch {
    pub status: VpaStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VpaStatus {
    pub recommendation: RecommendationStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationStatus {
    pub container_recommendations: Vec<ContainerRecommendation>,
}

impl VpaStatusPatch {
    pub fn new(container_recommendations: Vec<ContainerRecommendation>) -> Self {
        Self {
            status: VpaStatus {
                recommendation: RecommendationStatus {
                    container_recommendations,
                },
            },
        }
    }
}
