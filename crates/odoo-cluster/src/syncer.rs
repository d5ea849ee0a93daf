//! Change detection for managed resources
//!
//! Each managed kind implements [`Managed`]: how to compute its desired
//! sub-state and how to compare it field by field against the live object.
//! A difference in a field replaces that field wholesale; the live object is
//! never patched below the granularity listed in its comparator. Status and
//! fields the API server populates (bound volume names, container
//! termination settings, probe thresholds) are never compared, and optional
//! fields are only enforced when the desired state sets them.

use std::collections::BTreeMap;

use k8s_openapi::api::apps::v1::{Deployment, DeploymentSpec};
use k8s_openapi::api::core::v1::{
    ConfigMap, Container, PersistentVolumeClaim, PersistentVolumeClaimSpec, PodSpec, Probe,
    Secret, Service, ServiceSpec,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use k8s_openapi::ByteString;
use kube::Resource;
use odoo_common::crd::{PgNamespace, PgNamespaceSpec};
use odoo_common::Result;
use tracing::debug;

use crate::naming;
use crate::resources::deployment::DeploymentState;
use crate::resources::service::ServiceState;
use crate::resources::{self, Scope};

/// The closed set of managed resource kinds
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// Database-namespace claim
    PgNamespace,
    /// Volume claim
    PersistentVolumeClaim,
    /// Configuration bundle
    ConfigMap,
    /// Credential bundle
    Secret,
    /// Workload
    Deployment,
    /// Network service
    Service,
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PgNamespace => write!(f, "PgNamespace"),
            Self::PersistentVolumeClaim => write!(f, "PersistentVolumeClaim"),
            Self::ConfigMap => write!(f, "ConfigMap"),
            Self::Secret => write!(f, "Secret"),
            Self::Deployment => write!(f, "Deployment"),
            Self::Service => write!(f, "Service"),
        }
    }
}

/// A resource kind whose mutable state is derived from an OdooCluster
pub trait Managed: Resource<DynamicType = ()> + Clone {
    /// Kind tag of this resource
    const KIND: ResourceKind;

    /// Mutable sub-state owned by the operator
    type State;

    /// Deterministic name of the resource addressed by `scope`
    fn resource_name(scope: &Scope<'_>) -> Result<String>;

    /// Desired sub-state for `scope`
    fn desired_state(scope: &Scope<'_>) -> Result<Self::State>;

    /// Overwrite every differing field with its desired value.
    ///
    /// Returns true when anything was written.
    fn apply_if_changed(&mut self, desired: Self::State) -> bool;
}

/// Replace `live` with `desired` when they differ
fn sync<T: PartialEq>(live: &mut T, desired: T) -> bool {
    if *live == desired {
        return false;
    }
    *live = desired;
    true
}

/// Replace an optional list, treating absent and empty as equal
fn sync_list<T: PartialEq>(live: &mut Option<Vec<T>>, desired: Vec<T>) -> bool {
    if live.as_deref().unwrap_or_default() == desired.as_slice() {
        return false;
    }
    *live = (!desired.is_empty()).then_some(desired);
    true
}

/// Enforce an optional field only when the desired state sets it
fn sync_if_set<T: PartialEq>(live: &mut Option<T>, desired: Option<T>) -> bool {
    match desired {
        Some(value) => sync(live, Some(value)),
        None => false,
    }
}

/// Overwrite the operator-owned fields of each container.
///
/// A different container set (count or names) is replaced wholesale.
fn sync_containers(live: &mut Vec<Container>, desired: Vec<Container>) -> bool {
    let same_set = live.len() == desired.len()
        && live.iter().zip(&desired).all(|(l, d)| l.name == d.name);
    if !same_set {
        *live = desired;
        return true;
    }
    live.iter_mut()
        .zip(desired)
        .map(|(current, wanted)| sync_container(current, wanted))
        .fold(false, |acc, changed| acc | changed)
}

fn sync_container(live: &mut Container, desired: Container) -> bool {
    [
        sync(&mut live.image, desired.image),
        sync(&mut live.image_pull_policy, desired.image_pull_policy),
        sync_list(&mut live.args, desired.args.unwrap_or_default()),
        sync_list(&mut live.env, desired.env.unwrap_or_default()),
        sync_list(&mut live.ports, desired.ports.unwrap_or_default()),
        sync_list(&mut live.volume_mounts, desired.volume_mounts.unwrap_or_default()),
        sync_probe(&mut live.readiness_probe, desired.readiness_probe),
    ]
    .contains(&true)
}

/// Probe handler and timings; server-defaulted thresholds are left alone
fn sync_probe(live: &mut Option<Probe>, desired: Option<Probe>) -> bool {
    let Some(wanted) = desired else {
        return sync(live, None);
    };
    if let Some(current) = live.as_mut() {
        return [
            sync(&mut current.tcp_socket, wanted.tcp_socket),
            sync(&mut current.http_get, wanted.http_get),
            sync(&mut current.exec, wanted.exec),
            sync_if_set(&mut current.initial_delay_seconds, wanted.initial_delay_seconds),
            sync_if_set(&mut current.period_seconds, wanted.period_seconds),
        ]
        .contains(&true);
    }
    *live = Some(wanted);
    true
}

/// Replace an optional map, treating absent and empty as equal
fn sync_map<V: PartialEq>(
    live: &mut Option<BTreeMap<String, V>>,
    desired: BTreeMap<String, V>,
) -> bool {
    let unchanged = match live {
        Some(current) => *current == desired,
        None => desired.is_empty(),
    };
    if unchanged {
        return false;
    }
    *live = (!desired.is_empty()).then_some(desired);
    true
}

fn log_sync<R: Resource>(resource: &R, kind: ResourceKind, changed: bool) {
    debug!(
        resource = %resource.meta().name.as_deref().unwrap_or_default(),
        %kind,
        changed,
        "Synced desired state"
    );
}

impl Managed for PgNamespace {
    const KIND: ResourceKind = ResourceKind::PgNamespace;
    type State = PgNamespaceSpec;

    fn resource_name(scope: &Scope<'_>) -> Result<String> {
        Ok(naming::pg_namespace_name(&scope.cluster_name()))
    }

    fn desired_state(scope: &Scope<'_>) -> Result<Self::State> {
        Ok(resources::pg_namespace::desired_spec(scope))
    }

    fn apply_if_changed(&mut self, desired: Self::State) -> bool {
        let changed = sync(&mut self.spec, desired);
        log_sync(self, Self::KIND, changed);
        changed
    }
}

impl Managed for PersistentVolumeClaim {
    const KIND: ResourceKind = ResourceKind::PersistentVolumeClaim;
    type State = PersistentVolumeClaimSpec;

    fn resource_name(scope: &Scope<'_>) -> Result<String> {
        Ok(naming::volume_claim_name(
            &scope.cluster_name(),
            scope.volume()?,
        ))
    }

    fn desired_state(scope: &Scope<'_>) -> Result<Self::State> {
        resources::volume::desired_spec(scope)
    }

    fn apply_if_changed(&mut self, desired: Self::State) -> bool {
        // The server binds `volume_name` and defaults class and mode; after
        // creation only `resources.requests` may change.
        let spec = self.spec.get_or_insert_with(PersistentVolumeClaimSpec::default);
        let changed = [
            sync_list(&mut spec.access_modes, desired.access_modes.unwrap_or_default()),
            sync(&mut spec.resources, desired.resources),
            sync(&mut spec.selector, desired.selector),
            sync_if_set(&mut spec.storage_class_name, desired.storage_class_name),
            sync_if_set(&mut spec.volume_mode, desired.volume_mode),
            sync_if_set(&mut spec.data_source, desired.data_source),
            sync_if_set(&mut spec.data_source_ref, desired.data_source_ref),
        ]
        .contains(&true);

        log_sync(self, Self::KIND, changed);
        changed
    }
}

impl Managed for ConfigMap {
    const KIND: ResourceKind = ResourceKind::ConfigMap;
    type State = BTreeMap<String, String>;

    fn resource_name(scope: &Scope<'_>) -> Result<String> {
        Ok(naming::config_map_name(&scope.cluster_name(), scope.track()?))
    }

    fn desired_state(scope: &Scope<'_>) -> Result<Self::State> {
        resources::config_map::desired_data(scope)
    }

    fn apply_if_changed(&mut self, desired: Self::State) -> bool {
        let changed = sync_map(&mut self.data, desired);
        log_sync(self, Self::KIND, changed);
        changed
    }
}

impl Managed for Secret {
    const KIND: ResourceKind = ResourceKind::Secret;
    type State = BTreeMap<String, ByteString>;

    fn resource_name(scope: &Scope<'_>) -> Result<String> {
        Ok(naming::secret_name(&scope.cluster_name()))
    }

    fn desired_state(scope: &Scope<'_>) -> Result<Self::State> {
        Ok(resources::secret::desired_data(scope))
    }

    fn apply_if_changed(&mut self, desired: Self::State) -> bool {
        let changed = sync_map(&mut self.data, desired);
        log_sync(self, Self::KIND, changed);
        changed
    }
}

impl Managed for Deployment {
    const KIND: ResourceKind = ResourceKind::Deployment;
    type State = DeploymentState;

    fn resource_name(scope: &Scope<'_>) -> Result<String> {
        Ok(naming::deployment_name(
            &scope.cluster_name(),
            scope.track()?,
            scope.tier()?,
        ))
    }

    fn desired_state(scope: &Scope<'_>) -> Result<Self::State> {
        resources::deployment::desired_state(scope)
    }

    fn apply_if_changed(&mut self, desired: Self::State) -> bool {
        let spec = self.spec.get_or_insert_with(DeploymentSpec::default);
        let template_meta = spec.template.metadata.get_or_insert_with(ObjectMeta::default);
        let pod = spec.template.spec.get_or_insert_with(PodSpec::default);

        // Evaluated one by one: every differing field must be written.
        let changed = [
            sync_list(&mut pod.volumes, desired.volumes),
            sync(&mut pod.security_context, Some(desired.security_context)),
            sync_list(&mut pod.image_pull_secrets, desired.image_pull_secrets),
            sync_containers(&mut pod.containers, desired.containers),
            sync_map(&mut template_meta.labels, desired.template_labels),
            sync(&mut spec.selector, desired.selector),
            sync(&mut spec.replicas, Some(desired.replicas)),
            sync(&mut spec.strategy, Some(desired.strategy)),
        ]
        .contains(&true);

        log_sync(self, Self::KIND, changed);
        changed
    }
}

impl Managed for Service {
    const KIND: ResourceKind = ResourceKind::Service;
    type State = ServiceState;

    fn resource_name(scope: &Scope<'_>) -> Result<String> {
        Ok(naming::service_name(&scope.cluster_name(), scope.tier()?))
    }

    fn desired_state(scope: &Scope<'_>) -> Result<Self::State> {
        resources::service::desired_state(scope)
    }

    fn apply_if_changed(&mut self, desired: Self::State) -> bool {
        let spec = self.spec.get_or_insert_with(ServiceSpec::default);
        let changed = [
            sync_map(&mut spec.selector, desired.selector),
            sync_list(&mut spec.ports, desired.ports),
        ]
        .contains(&true);

        log_sync(self, Self::KIND, changed);
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
    use crate::config::templates::DefaultSettings;
    use crate::resources::fixtures::sample_cluster;
    use crate::resources::Selector;

    fn run<R: Managed>(resource: &mut R, selector: Selector) -> bool {
        let cluster = sample_cluster();
        let defaults = DefaultSettings::default();
        let desired = R::desired_state(&Scope::new(&cluster, selector, &defaults)).unwrap();
        resource.apply_if_changed(desired)
    }

    #[test]
    fn first_sync_changes_and_second_is_a_noop() {
        let mut deployment = Deployment::default();
        assert!(run(&mut deployment, Selector::workload(0, 0)));
        assert!(!run(&mut deployment, Selector::workload(0, 0)));

        let mut service = Service::default();
        assert!(run(&mut service, Selector::tier(1)));
        assert!(!run(&mut service, Selector::tier(1)));

        let mut config_map = ConfigMap::default();
        assert!(run(&mut config_map, Selector::track(0)));
        assert!(!run(&mut config_map, Selector::track(0)));

        let mut secret = Secret::default();
        assert!(run(&mut secret, Selector::cluster()));
        assert!(!run(&mut secret, Selector::cluster()));

        let mut claim = PersistentVolumeClaim::default();
        assert!(run(&mut claim, Selector::volume(0)));
        assert!(!run(&mut claim, Selector::volume(0)));

        let mut pg = PgNamespace::new("acme", PgNamespaceSpec::default());
        assert!(run(&mut pg, Selector::cluster()));
        assert!(!run(&mut pg, Selector::cluster()));
    }

    #[test]
    fn drift_in_one_field_is_corrected() {
        let mut deployment = Deployment::default();
        run(&mut deployment, Selector::workload(0, 0));

        deployment.spec.as_mut().unwrap().replicas = Some(7);
        assert!(run(&mut deployment, Selector::workload(0, 0)));
        assert_eq!(deployment.spec.as_ref().unwrap().replicas, Some(2));
    }

    #[test]
    fn every_drifted_field_is_corrected_in_one_pass() {
        let mut deployment = Deployment::default();
        run(&mut deployment, Selector::workload(0, 0));

        let spec = deployment.spec.as_mut().unwrap();
        spec.replicas = Some(7);
        spec.strategy = None;
        spec.template.spec.as_mut().unwrap().volumes = None;

        assert!(run(&mut deployment, Selector::workload(0, 0)));
        assert!(!run(&mut deployment, Selector::workload(0, 0)));
    }

    #[test]
    fn status_is_ignored() {
        let mut deployment = Deployment::default();
        run(&mut deployment, Selector::workload(0, 0));

        deployment.status = Some(Default::default());
        assert!(!run(&mut deployment, Selector::workload(0, 0)));
    }

    #[test]
    fn foreign_data_keys_are_replaced_wholesale() {
        let mut config_map = ConfigMap::default();
        run(&mut config_map, Selector::track(0));
        config_map
            .data
            .as_mut()
            .unwrap()
            .insert("extra".to_string(), "x".to_string());

        assert!(run(&mut config_map, Selector::track(0)));
        assert!(!config_map.data.as_ref().unwrap().contains_key("extra"));
    }

    #[test]
    fn empty_service_ports_match_absent_ports() {
        let mut ports = None;
        assert!(!sync_list::<u8>(&mut ports, Vec::new()));
        assert!(ports.is_none());

        let mut ports = Some(vec![1u8]);
        assert!(sync_list(&mut ports, Vec::new()));
        assert!(ports.is_none());
    }

    #[test]
    fn kind_display_matches_api_kind() {
        assert_eq!(ResourceKind::PgNamespace.to_string(), PgNamespace::kind(&()));
        assert_eq!(ResourceKind::Deployment.to_string(), Deployment::kind(&()));
        assert_eq!(ResourceKind::Service.to_string(), Service::kind(&()));
    }

    fn bound_claim() -> PersistentVolumeClaim {
        let mut claim = PersistentVolumeClaim::default();
        run(&mut claim, Selector::volume(0));
        claim.metadata.resource_version = Some("12".to_string());
        let spec = claim.spec.as_mut().unwrap();
        spec.volume_name = Some("pv-123".to_string());
        spec.storage_class_name = Some("standard".to_string());
        spec.volume_mode = Some("Filesystem".to_string());
        claim
    }

    #[test]
    fn bound_claim_keeps_server_populated_fields() {
        let mut claim = bound_claim();

        assert!(!run(&mut claim, Selector::volume(0)));

        let spec = claim.spec.unwrap();
        assert_eq!(spec.volume_name.as_deref(), Some("pv-123"));
        assert_eq!(spec.storage_class_name.as_deref(), Some("standard"));
        assert_eq!(spec.volume_mode.as_deref(), Some("Filesystem"));
    }

    #[test]
    fn claim_resize_only_touches_requests() {
        let mut claim = bound_claim();
        let mut desired = claim.spec.clone().unwrap();
        desired.volume_name = None;
        desired.storage_class_name = None;
        desired.volume_mode = None;
        desired
            .resources
            .as_mut()
            .unwrap()
            .requests
            .as_mut()
            .unwrap()
            .insert("storage".to_string(), Quantity("50Gi".to_string()));

        assert!(claim.apply_if_changed(desired));

        let spec = claim.spec.unwrap();
        assert_eq!(spec.volume_name.as_deref(), Some("pv-123"));
        assert_eq!(spec.storage_class_name.as_deref(), Some("standard"));
        assert_eq!(
            spec.resources.unwrap().requests.unwrap()["storage"],
            Quantity("50Gi".to_string())
        );
    }

    #[test]
    fn claim_storage_class_is_enforced_when_requested() {
        let mut claim = bound_claim();
        let mut desired = claim.spec.clone().unwrap();
        desired.storage_class_name = Some("fast".to_string());

        assert!(claim.apply_if_changed(desired));
        assert_eq!(
            claim.spec.unwrap().storage_class_name.as_deref(),
            Some("fast")
        );
    }

    #[test]
    fn server_defaulted_container_fields_are_not_drift() {
        let mut deployment = Deployment::default();
        run(&mut deployment, Selector::workload(0, 0));

        let pod = deployment
            .spec
            .as_mut()
            .unwrap()
            .template
            .spec
            .as_mut()
            .unwrap();
        pod.restart_policy = Some("Always".to_string());
        let container = &mut pod.containers[0];
        container.termination_message_path = Some("/dev/termination-log".to_string());
        container.termination_message_policy = Some("File".to_string());
        container.resources = Some(Default::default());
        let probe = container.readiness_probe.as_mut().unwrap();
        probe.timeout_seconds = Some(1);
        probe.success_threshold = Some(1);
        probe.failure_threshold = Some(3);

        assert!(!run(&mut deployment, Selector::workload(0, 0)));
    }

    #[test]
    fn container_drift_keeps_server_defaults() {
        let mut deployment = Deployment::default();
        run(&mut deployment, Selector::workload(0, 0));

        let container = &mut deployment
            .spec
            .as_mut()
            .unwrap()
            .template
            .spec
            .as_mut()
            .unwrap()
            .containers[0];
        container.termination_message_path = Some("/dev/termination-log".to_string());
        container.image = Some("odoo/odoo:11.0".to_string());

        assert!(run(&mut deployment, Selector::workload(0, 0)));

        let container = &deployment.spec.unwrap().template.spec.unwrap().containers[0];
        assert_eq!(
            container.image.as_deref(),
            Some("registry.example.com/odoo/odoo:12.0")
        );
        assert_eq!(
            container.termination_message_path.as_deref(),
            Some("/dev/termination-log")
        );
    }

    #[test]
    fn renamed_container_is_replaced() {
        let mut deployment = Deployment::default();
        run(&mut deployment, Selector::workload(0, 0));
        deployment
            .spec
            .as_mut()
            .unwrap()
            .template
            .spec
            .as_mut()
            .unwrap()
            .containers[0]
            .name = "sidecar".to_string();

        assert!(run(&mut deployment, Selector::workload(0, 0)));
        let pod = deployment.spec.unwrap().template.spec.unwrap();
        assert_eq!(pod.containers.len(), 1);
        assert_eq!(pod.containers[0].name, "odoo");
    }
}
