//! Typed `generateRecommendations` response
//!
//! Only the parts of the response the recommender reads are modelled. The
//! per-container `recommendations` object stays raw until a container is
//! actually targeted; from there on every modelled key is required, so a
//! missing one fails to parse instead of surfacing later as a lookup failure.

use super::GENERATE_RECOMMENDATIONS_PATH;
use crate::error::{RecommenderError, Result};
use serde::de::{Deserializer, MapAccess, Visitor};
use serde::Deserialize;
use std::fmt;
use std::marker::PhantomData;

/// One experiment of the response array
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ExperimentRecommendations {
    #[serde(default)]
    pub experiment_name: Option<String>,
    pub kubernetes_objects: Vec<KubernetesObjectRecommendations>,
}

impl ExperimentRecommendations {
    /// First element of a response, which is the only one consulted
    pub fn first<'a>(
        response: &'a [ExperimentRecommendations],
        experiment: &str,
    ) -> Result<&'a ExperimentRecommendations> {
        response
            .first()
            .ok_or_else(|| RecommenderError::EmptyRecommendationResponse {
                experiment: experiment.to_string(),
                missing: "experiment entries",
            })
    }

    /// First kubernetes object, which is the only one consulted
    pub fn first_object(&self, experiment: &str) -> Result<&KubernetesObjectRecommendations> {
        self.kubernetes_objects
            .first()
            .ok_or_else(|| RecommenderError::EmptyRecommendationResponse {
                experiment: experiment.to_string(),
                missing: "kubernetes objects",
            })
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct KubernetesObjectRecommendations {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub namespace: Option<String>,
    pub containers: Vec<ContainerRecommendations>,
}

impl KubernetesObjectRecommendations {
    /// Response entries for a container name
    pub fn containers_named<'a>(
        &'a self,
        container_name: &'a str,
    ) -> impl Iterator<Item = &'a ContainerRecommendations> + 'a {
        self.containers
            .iter()
            .filter(move |c| c.container_name == container_name)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ContainerRecommendations {
    pub container_name: String,
    /// Unparsed until the container is targeted, see [`Self::data`]
    #[serde(default)]
    pub recommendations: serde_json::Value,
}

impl ContainerRecommendations {
    /// Typed recommendation data of this container
    pub fn data(&self) -> Result<RecommendationData> {
        RecommendationData::deserialize(&self.recommendations).map_err(|source| {
            RecommenderError::MalformedResponse {
                endpoint: GENERATE_RECOMMENDATIONS_PATH,
                source,
            }
        })
    }
}

/// Recommendations of a container keyed by monitoring end timestamp
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RecommendationData {
    /// Entries in the order the service returned them
    #[serde(deserialize_with = "ordered_entries")]
    pub data: Vec<(String, TimestampRecommendation)>,
}

impl RecommendationData {
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TimestampRecommendation {
    pub recommendation_terms: RecommendationTerms,
}

impl TimestampRecommendation {
    /// Requests of the short-term, cost-optimized recommendation
    pub fn short_term_cost_requests(&self) -> &ResourceRequests {
        &self
            .recommendation_terms
            .short_term
            .recommendation_engines
            .cost
            .config
            .requests
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RecommendationTerms {
    pub short_term: TermRecommendation,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TermRecommendation {
    pub recommendation_engines: RecommendationEngines,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RecommendationEngines {
    pub cost: EngineRecommendation,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EngineRecommendation {
    pub config: RecommendedConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RecommendedConfig {
    pub requests: ResourceRequests,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ResourceRequests {
    pub cpu: Amount,
    pub memory: Amount,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Amount {
    pub amount: f64,
    #[serde(default)]
    pub format: Option<String>,
}

/// Deserialize a JSON object into its entries, keeping document order
fn ordered_entries<'de, D, T>(deserializer: D) -> std::result::Result<Vec<(String, T)>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    struct EntriesVisitor<T>(PhantomData<T>);

    impl<'de, T: Deserialize<'de>> Visitor<'de> for EntriesVisitor<T> {
        type Value = Vec<(String, T)>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a map keyed by timestamp")
        }

        fn visit_map<A>(self, mut map: A) -> std::result::Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
            while let Some(entry) = map.next_entry::<String, T>()? {
                entries.push(entry);
            }
            Ok(entries)
        }
    }

    deserializer.deserialize_map(EntriesVisitor(PhantomData))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(cpu: f64, memory: f64) -> String {
        format!(
            r#"{{"recommendation_terms":{{"short_term":{{"recommendation_engines":{{"cost":{{"config":{{"requests":{{"cpu":{{"amount":{},"format":"cores"}},"memory":{{"amount":{},"format":"bytes"}}}}}}}}}}}}}}}}"#,
            cpu, memory
        )
    }

    #[test]
    fn test_data_keeps_response_order() {
        let body = format!(
            r#"{{"data":{{"2024-05-02T10:00:00.000Z":{},"2024-05-01T10:00:00.000Z":{}}}}}"#,
            entry(0.5, 1024.0),
            entry(0.25, 2048.0)
        );

        let data: RecommendationData = serde_json::from_str(&body).unwrap();
        let keys: Vec<_> = data.data.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(
            keys,
            vec!["2024-05-02T10:00:00.000Z", "2024-05-01T10:00:00.000Z"]
        );
        assert_eq!(data.data[1].1.short_term_cost_requests().cpu.amount, 0.25);
    }

    #[test]
    fn test_missing_engine_fails_to_parse() {
        let body = r#"{"data":{"2024-05-01T10:00:00.000Z":{"recommendation_terms":{"short_term":{}}}}}"#;
        assert!(serde_json::from_str::<RecommendationData>(body).is_err());
    }

    #[test]
    fn test_container_data_is_parsed_on_demand() {
        let object: KubernetesObjectRecommendations = serde_json::from_str(&format!(
            r#"{{"containers":[
                {{"container_name":"sidecar","recommendations":{{"notifications":{{}}}}}},
                {{"container_name":"web","recommendations":{{"data":{{"2024-05-01T10:00:00.000Z":{}}}}}}}
            ]}}"#,
            entry(0.25, 2048.0)
        ))
        .unwrap();

        let web = object.containers_named("web").next().unwrap();
        assert_eq!(web.data().unwrap().data.len(), 1);

        let sidecar = object.containers_named("sidecar").next().unwrap();
        assert!(matches!(
            sidecar.data(),
            Err(RecommenderError::MalformedResponse { .. })
        ));
    }

    #[test]
    fn test_empty_response_is_typed_error() {
        let err = ExperimentRecommendations::first(&[], "app-vpa").unwrap_err();
        assert!(matches!(
            err,
            RecommenderError::EmptyRecommendationResponse { .. }
        ));

        let experiment = ExperimentRecommendations {
            experiment_name: Some("app-vpa".to_string()),
            kubernetes_objects: vec![],
        };
        assert!(experiment.first_object("app-vpa").is_err());
    }
}
