//! Network service of a tier
//!
//! Only the `server` and `longpolling` tiers expose a port. Any other tier
//! resolves to a selector on cluster identity alone and no ports; it
//! reconciles correctly once the tier becomes one of the two.

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::ServicePort;
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use odoo_common::{Result, TIER_LABEL_KEY};

use super::deployment::tier_port;
use super::{cluster_selector, Scope};

/// Mutable sub-state of a service
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ServiceState {
    /// Pod selector
    pub selector: BTreeMap<String, String>,
    /// Exposed ports
    pub ports: Vec<ServicePort>,
}

/// Desired service state for the selected tier
pub fn desired_state(scope: &Scope<'_>) -> Result<ServiceState> {
    let tier = scope.tier()?;
    let tier_type = tier.tier_type();
    let mut selector = cluster_selector(&scope.cluster_name());

    let Some((name, port)) = tier_port(tier_type) else {
        return Ok(ServiceState {
            selector,
            ports: Vec::new(),
        });
    };

    selector.insert(TIER_LABEL_KEY.to_string(), tier_type.to_string());
    Ok(ServiceState {
        selector,
        ports: vec![ServicePort {
            name: Some(name.to_string()),
            protocol: Some("TCP".to_string()),
            port,
            target_port: Some(IntOrString::String(name.to_string())),
            ..Default::default()
        }],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::templates::DefaultSettings;
    use crate::resources::fixtures::sample_cluster;
    use crate::resources::Selector;
    use odoo_common::crd::OdooCluster;
    use odoo_common::CLUSTER_LABEL_KEY;

    fn state_for(cluster: &OdooCluster, tier: usize) -> ServiceState {
        let defaults = DefaultSettings::default();
        desired_state(&Scope::new(cluster, Selector::tier(tier), &defaults)).unwrap()
    }

    #[test]
    fn server_tier_exposes_client_port() {
        let state = state_for(&sample_cluster(), 0);
        assert_eq!(state.ports.len(), 1);
        assert_eq!(state.ports[0].name.as_deref(), Some("web"));
        assert_eq!(state.ports[0].port, 8069);
        assert_eq!(
            state.ports[0].target_port,
            Some(IntOrString::String("web".to_string()))
        );
        assert_eq!(state.selector[TIER_LABEL_KEY], "server");
        assert_eq!(state.selector[CLUSTER_LABEL_KEY], "acme");
    }

    #[test]
    fn longpolling_tier_exposes_longpolling_port() {
        let state = state_for(&sample_cluster(), 1);
        assert_eq!(state.ports[0].name.as_deref(), Some("longpolling"));
        assert_eq!(state.ports[0].port, 8072);
        assert_eq!(state.selector[TIER_LABEL_KEY], "longpolling");
    }

    #[test]
    fn other_tiers_yield_no_ports() {
        let mut cluster = sample_cluster();
        cluster.spec.tiers[0].name = "cron".to_string();
        cluster.spec.tiers[1].name = "something-else".to_string();

        for tier in 0..2 {
            let state = state_for(&cluster, tier);
            assert!(state.ports.is_empty());
            assert!(!state.selector.contains_key(TIER_LABEL_KEY));
        }
    }
}
