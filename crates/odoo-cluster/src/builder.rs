//! Resource dispatcher
//!
//! Entry point of the engine: given a live (or freshly initialized) managed
//! resource, the owning OdooCluster and a [`Selector`], converge the
//! resource onto its desired state, stamp ownership, and report its
//! deterministic name. Persisting is left to the caller.

use std::collections::BTreeMap;

use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{ConfigMap, PersistentVolumeClaim, Secret, Service};
use kube::api::ObjectMeta;
use kube::{Resource, ResourceExt};
use odoo_common::crd::{OdooCluster, PgNamespace, PgNamespaceSpec};
use odoo_common::{Result, CLUSTER_LABEL_KEY, LABEL_MANAGED_BY, LABEL_MANAGED_BY_ODOO};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::templates::DefaultSettings;
use crate::owner::attach_owner;
use crate::resources::{Scope, Selector};
use crate::syncer::{Managed, ResourceKind};

/// Outcome of one synthesis call
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Synthesized {
    /// Deterministic name of the resource
    pub name: String,
    /// Whether any mutable field was overwritten
    pub changed: bool,
    /// Whether an owner reference was added
    pub owner_attached: bool,
}

impl Synthesized {
    /// Whether the caller must persist the resource
    pub fn needs_persist(&self) -> bool {
        self.changed || self.owner_attached
    }
}

/// Synthesis context shared by every reconciliation
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct Synthesizer {
    /// Constants of the `default` configuration blob
    pub defaults: DefaultSettings,
}

impl Synthesizer {
    /// Create a synthesizer with the stock defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a synthesizer rendering the given defaults
    pub fn with_defaults(defaults: DefaultSettings) -> Self {
        Self { defaults }
    }

    /// Converge `resource` onto the state derived from `cluster`.
    ///
    /// Fails only when `selector` does not address an existing track, tier
    /// or volume; the resource is left untouched in that case.
    pub fn synthesize<R: Managed>(
        &self,
        resource: &mut R,
        cluster: &OdooCluster,
        selector: Selector,
    ) -> Result<Synthesized> {
        let scope = Scope::new(cluster, selector, &self.defaults);
        let name = R::resource_name(&scope)?;
        let desired = R::desired_state(&scope)?;

        stamp_identity(resource, &name, cluster);
        let changed = resource.apply_if_changed(desired);
        let owner_attached = attach_owner(resource, cluster);

        debug!(
            cluster = %cluster.name_any(),
            kind = %R::KIND,
            name = %name,
            changed,
            owner_attached,
            "Synthesized managed resource"
        );

        Ok(Synthesized {
            name,
            changed,
            owner_attached,
        })
    }
}

/// Name, namespace and labels of a resource that has never been stored
fn stamp_identity<R: Resource>(resource: &mut R, name: &str, cluster: &OdooCluster) {
    let meta = resource.meta_mut();
    if meta.resource_version.is_some() {
        return;
    }
    meta.name.get_or_insert_with(|| name.to_string());
    if meta.namespace.is_none() {
        meta.namespace = cluster.namespace();
    }
    let labels = meta.labels.get_or_insert_with(BTreeMap::new);
    labels
        .entry(CLUSTER_LABEL_KEY.to_string())
        .or_insert_with(|| cluster.name_any());
    labels
        .entry(LABEL_MANAGED_BY.to_string())
        .or_insert_with(|| LABEL_MANAGED_BY_ODOO.to_string());
}

/// A managed resource of any kind
#[derive(Clone, Debug)]
pub enum ManagedObject {
    /// Database-namespace claim
    PgNamespace(PgNamespace),
    /// Volume claim
    PersistentVolumeClaim(PersistentVolumeClaim),
    /// Configuration bundle
    ConfigMap(ConfigMap),
    /// Credential bundle
    Secret(Secret),
    /// Workload
    Deployment(Deployment),
    /// Network service
    Service(Service),
}

impl ManagedObject {
    /// An unstored object of `kind` with only its identity set
    pub fn empty(kind: ResourceKind, name: &str, namespace: &str) -> Self {
        let metadata = ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            ..Default::default()
        };
        match kind {
            ResourceKind::PgNamespace => {
                let mut claim = PgNamespace::new(name, PgNamespaceSpec::default());
                claim.metadata = metadata;
                Self::PgNamespace(claim)
            }
            ResourceKind::PersistentVolumeClaim => {
                Self::PersistentVolumeClaim(PersistentVolumeClaim {
                    metadata,
                    ..Default::default()
                })
            }
            ResourceKind::ConfigMap => Self::ConfigMap(ConfigMap {
                metadata,
                ..Default::default()
            }),
            ResourceKind::Secret => Self::Secret(Secret {
                metadata,
                ..Default::default()
            }),
            ResourceKind::Deployment => Self::Deployment(Deployment {
                metadata,
                ..Default::default()
            }),
            ResourceKind::Service => Self::Service(Service {
                metadata,
                ..Default::default()
            }),
        }
    }

    /// Kind tag of the wrapped resource
    pub fn kind(&self) -> ResourceKind {
        match self {
            Self::PgNamespace(_) => ResourceKind::PgNamespace,
            Self::PersistentVolumeClaim(_) => ResourceKind::PersistentVolumeClaim,
            Self::ConfigMap(_) => ResourceKind::ConfigMap,
            Self::Secret(_) => ResourceKind::Secret,
            Self::Deployment(_) => ResourceKind::Deployment,
            Self::Service(_) => ResourceKind::Service,
        }
    }

    /// Object metadata of the wrapped resource
    pub fn meta(&self) -> &ObjectMeta {
        match self {
            Self::PgNamespace(r) => r.meta(),
            Self::PersistentVolumeClaim(r) => r.meta(),
            Self::ConfigMap(r) => r.meta(),
            Self::Secret(r) => r.meta(),
            Self::Deployment(r) => r.meta(),
            Self::Service(r) => r.meta(),
        }
    }

    /// Name of the wrapped resource, if set
    pub fn name(&self) -> Option<&str> {
        self.meta().name.as_deref()
    }

    /// Whether the object has been stored before
    pub fn is_stored(&self) -> bool {
        self.meta().resource_version.is_some()
    }

    /// Converge the wrapped resource, dispatching on its kind
    pub fn synthesize(
        &mut self,
        synthesizer: &Synthesizer,
        cluster: &OdooCluster,
        selector: Selector,
    ) -> Result<Synthesized> {
        match self {
            Self::PgNamespace(r) => synthesizer.synthesize(r, cluster, selector),
            Self::PersistentVolumeClaim(r) => synthesizer.synthesize(r, cluster, selector),
            Self::ConfigMap(r) => synthesizer.synthesize(r, cluster, selector),
            Self::Secret(r) => synthesizer.synthesize(r, cluster, selector),
            Self::Deployment(r) => synthesizer.synthesize(r, cluster, selector),
            Self::Service(r) => synthesizer.synthesize(r, cluster, selector),
        }
    }
}

/// Converge `object` onto the state derived from `cluster` with stock defaults
pub fn synthesize(
    object: &mut ManagedObject,
    cluster: &OdooCluster,
    selector: Selector,
) -> Result<Synthesized> {
    object.synthesize(&Synthesizer::new(), cluster, selector)
}

/// Deterministic name of the `kind` resource addressed by `selector`
pub fn resource_name(
    synthesizer: &Synthesizer,
    kind: ResourceKind,
    cluster: &OdooCluster,
    selector: Selector,
) -> Result<String> {
    let scope = Scope::new(cluster, selector, &synthesizer.defaults);
    match kind {
        ResourceKind::PgNamespace => PgNamespace::resource_name(&scope),
        ResourceKind::PersistentVolumeClaim => PersistentVolumeClaim::resource_name(&scope),
        ResourceKind::ConfigMap => ConfigMap::resource_name(&scope),
        ResourceKind::Secret => Secret::resource_name(&scope),
        ResourceKind::Deployment => Deployment::resource_name(&scope),
        ResourceKind::Service => Service::resource_name(&scope),
    }
}
