//! Experiment creation payload

use crate::models::ContainerInfo;
use serde::{Deserialize, Serialize};

/// Defaults for every field of an experiment that is not derived from the VPA
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentTemplate {
    pub version: String,
    pub cluster_name: String,
    pub performance_profile: String,
    pub mode: String,
    pub target_cluster: String,
    pub object_type: String,
    pub measurement_duration: String,
    pub threshold: String,
    pub datasource: String,
}

impl Default for ExperimentTemplate {
    fn default() -> Self {
        Self {
            version: "v2.0".to_string(),
            cluster_name: "default".to_string(),
            performance_profile: "resource-optimization-local-monitoring".to_string(),
            mode: "monitor".to_string(),
            target_cluster: "local".to_string(),
            object_type: "deployment".to_string(),
            measurement_duration: "15min".to_string(),
            threshold: "0.1".to_string(),
            datasource: "prometheus-1".to_string(),
        }
    }
}

impl ExperimentTemplate {
    /// Fill the template for one workload
    pub fn build(
        &self,
        experiment_name: &str,
        object_name: &str,
        namespace: &str,
        containers: Vec<ContainerInfo>,
    ) -> CreateExperiment {
        CreateExperiment {
            version: self.version.clone(),
            experiment_name: experiment_name.to_string(),
            cluster_name: self.cluster_name.clone(),
            performance_profile: self.performance_profile.clone(),
            mode: self.mode.clone(),
            target_cluster: self.target_cluster.clone(),
            kubernetes_objects: vec![ExperimentObject {
                object_type: self.object_type.clone(),
                name: object_name.to_string(),
                namespace: namespace.to_string(),
                containers,
            }],
            trial_settings: TrialSettings {
                measurement_duration: self.measurement_duration.clone(),
            },
            recommendation_settings: RecommendationSettings {
                threshold: self.threshold.clone(),
            },
            datasource: self.datasource.clone(),
        }
    }
}

/// Body element of `POST /createExperiment`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateExperiment {
    pub version: String,
    pub experiment_name: String,
    pub cluster_name: String,
    pub performance_profile: String,
    pub mode: String,
    pub target_cluster: String,
    pub kubernetes_objects: Vec<ExperimentObject>,
    pub trial_settings: TrialSettings,
    pub recommendation_settings: RecommendationSettings,
    pub datasource: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExperimentObject {
    #[serde(rename = "type")]
    pub object_type: String,
    pub name: String,
    pub namespace: String,
    pub containers: Vec<ContainerInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialSettings {
    pub measurement_duration: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendationSettings {
    pub threshold: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_template_payload() {
        let experiment = ExperimentTemplate::default().build(
            "app-vpa",
            "app",
            "shop",
            vec![ContainerInfo::new("web", "nginx:1.25")],
        );

        assert_eq!(
            serde_json::to_value(&experiment).unwrap(),
            json!({
                "version": "v2.0",
                "experiment_name": "app-vpa",
                "cluster_name": "default",
                "performance_profile": "resource-optimization-local-monitoring",
                "mode": "monitor",
                "target_cluster": "local",
                "kubernetes_objects": [{
                    "type": "deployment",
                    "name": "app",
                    "namespace": "shop",
                    "containers": [{"container_image_name": "nginx:1.25", "container_name": "web"}]
                }],
                "trial_settings": {"measurement_duration": "15min"},
                "recommendation_settings": {"threshold": "0.1"},
                "datasource": "prometheus-1"
            })
        );
    }

    #[test]
    fn test_partial_template_keeps_defaults() {
        let template: ExperimentTemplate =
            serde_json::from_value(json!({"cluster_name": "prod", "datasource": "thanos"})).unwrap();

        assert_eq!(template.cluster_name, "prod");
        assert_eq!(template.datasource, "thanos");
        assert_eq!(template.mode, "monitor");
        assert_eq!(template.measurement_duration, "15min");
    }
}
