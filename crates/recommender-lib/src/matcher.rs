//! Resolution of a container policy against the containers of a workload

use crate::models::{ContainerInfo, ContainerPolicy};

/// Containers of `available` that `policy` applies to.
///
/// The wildcard policy selects every container; a named policy selects the
/// containers with that exact name. Order is preserved.
pub fn match_containers(policy: &ContainerPolicy, available: &[ContainerInfo]) -> Vec<ContainerInfo> {
    if policy.is_wildcard() {
        return available.to_vec();
    }

    available
        .iter()
        .filter(|c| c.container_name == policy.container_name)
        .cloned()
        .collect()
}
