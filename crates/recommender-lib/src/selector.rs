//! Selection of the VPAs that opted into this recommender

use crate::models::VerticalPodAutoscaler;
use tracing::info;

/// Keep the VPAs whose `spec.recommenders` names `recommender_name`.
///
/// Order is preserved. VPAs without a `recommenders` list are left to the
/// default recommender and never selected.
pub fn select_vpas(
    vpas: Vec<VerticalPodAutoscaler>,
    recommender_name: &str,
) -> Vec<VerticalPodAutoscaler> {
    vpas.into_iter()
        .filter(|vpa| vpa.uses_recommender(recommender_name))
        .inspect(|vpa| {
            info!(
                vpa = %vpa.name(),
                namespace = %vpa.namespace(),
                recommender = %recommender_name,
                "VPA has chosen this recommender"
            );
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RecommenderRef, TargetRef, VpaSpec};

    fn vpa(name: &str, recommenders: Option<&[&str]>) -> VerticalPodAutoscaler {
        let spec = VpaSpec {
            target_ref: TargetRef {
                name: format!("{}-deployment", name),
                ..TargetRef::default()
            },
            resource_policy: None,
            recommenders: recommenders.map(|names| {
                names
                    .iter()
                    .map(|n| RecommenderRef {
                        name: n.to_string(),
                    })
                    .collect()
            }),
        };
        VerticalPodAutoscaler::new(name, Some("default"), spec)
    }

    fn names(vpas: &[VerticalPodAutoscaler]) -> Vec<&str> {
        vpas.iter().map(|v| v.name()).collect()
    }

    #[test]
    fn test_selects_opted_in_vpas_in_order() {
        let vpas = vec![
            vpa("a", Some(&["kruize"])),
            vpa("b", Some(&["other"])),
            vpa("c", Some(&["kruize"])),
            vpa("d", None),
        ];

        let selected = select_vpas(vpas, "kruize");
        assert_eq!(names(&selected), vec!["a", "c"]);
    }

    #[test]
    fn test_missing_recommenders_is_opt_out() {
        let selected = select_vpas(vec![vpa("a", None), vpa("b", Some(&[]))], "kruize");
        assert!(selected.is_empty());
    }

    #[test]
    fn test_entry_position_does_not_matter() {
        let vpas = vec![
            vpa("first", Some(&["kruize", "default"])),
            vpa("last", Some(&["default", "custom", "kruize"])),
        ];

        let selected = select_vpas(vpas, "kruize");
        assert_eq!(names(&selected), vec!["first", "last"]);
    }

    #[test]
    fn test_duplicate_entries_select_once() {
        let selected = select_vpas(vec![vpa("a", Some(&["kruize", "kruize"]))], "kruize");
        assert_eq!(selected.len(), 1);
    }

    #[test]
    fn test_name_match_is_exact() {
        let selected = select_vpas(vec![vpa("a", Some(&["Kruize", "kruize-v2"]))], "kruize");
        assert!(selected.is_empty());
    }
}
