//! Storage port consumed by the external reconciliation loop
//!
//! The engine itself never talks to the API server. [`ResourceStore`] is the
//! narrow get/persist interface the loop supplies, [`KubeStore`] is its
//! kube-rs implementation, and [`reconcile_resource`] glues fetch,
//! synthesis and persist together for one managed resource.

use std::fmt::Debug;

use async_trait::async_trait;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{ConfigMap, PersistentVolumeClaim, Secret, Service};
use k8s_openapi::NamespaceResourceScope;
use kube::api::{Api, PostParams};
use kube::{Client, Resource, ResourceExt};
use odoo_common::crd::{OdooCluster, PgNamespace};
use odoo_common::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::info;

#[cfg(test)]
use mockall::automock;

use crate::builder::{resource_name, ManagedObject, Synthesized, Synthesizer};
use crate::resources::Selector;
use crate::syncer::ResourceKind;

/// Get and persist primitives over managed resources
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ResourceStore: Send + Sync {
    /// Fetch the `kind` resource `name` in `namespace`, `None` if absent
    async fn fetch(
        &self,
        kind: ResourceKind,
        name: &str,
        namespace: &str,
    ) -> Result<Option<ManagedObject>>;

    /// Durably store the full state of `object`, creating it if absent
    async fn persist(&self, object: &ManagedObject) -> Result<()>;
}

/// Real store backed by the Kubernetes API
pub struct KubeStore {
    client: Client,
}

impl KubeStore {
    /// Create a new KubeStore wrapping the given kube Client
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    async fn get<K>(&self, name: &str, namespace: &str) -> Result<Option<K>>
    where
        K: Resource<Scope = NamespaceResourceScope, DynamicType = ()>
            + Clone
            + DeserializeOwned
            + Debug,
    {
        let api: Api<K> = Api::namespaced(self.client.clone(), namespace);
        api.get_opt(name)
            .await
            .map_err(|e| Error::fetch(K::kind(&()), name, e))
    }

    async fn put<K>(&self, resource: &K) -> Result<()>
    where
        K: Resource<Scope = NamespaceResourceScope, DynamicType = ()>
            + Clone
            + DeserializeOwned
            + Serialize
            + Debug,
    {
        let name = resource.name_any();
        let namespace = resource.namespace().ok_or_else(|| {
            Error::validation(format!("{} {} has no namespace", K::kind(&()), name))
        })?;
        let api: Api<K> = Api::namespaced(self.client.clone(), &namespace);
        let params = PostParams::default();

        if resource.meta().resource_version.is_none() {
            api.create(&params, resource)
                .await
                .map_err(|e| Error::persist(K::kind(&()), &name, e))?;
            info!(kind = %K::kind(&()), name = %name, namespace = %namespace, "Created managed resource");
        } else {
            api.replace(&name, &params, resource)
                .await
                .map_err(|e| Error::persist(K::kind(&()), &name, e))?;
            info!(kind = %K::kind(&()), name = %name, namespace = %namespace, "Updated managed resource");
        }
        Ok(())
    }
}

#[async_trait]
impl ResourceStore for KubeStore {
    async fn fetch(
        &self,
        kind: ResourceKind,
        name: &str,
        namespace: &str,
    ) -> Result<Option<ManagedObject>> {
        Ok(match kind {
            ResourceKind::PgNamespace => self
                .get::<PgNamespace>(name, namespace)
                .await?
                .map(ManagedObject::PgNamespace),
            ResourceKind::PersistentVolumeClaim => self
                .get::<PersistentVolumeClaim>(name, namespace)
                .await?
                .map(ManagedObject::PersistentVolumeClaim),
            ResourceKind::ConfigMap => self
                .get::<ConfigMap>(name, namespace)
                .await?
                .map(ManagedObject::ConfigMap),
            ResourceKind::Secret => self
                .get::<Secret>(name, namespace)
                .await?
                .map(ManagedObject::Secret),
            ResourceKind::Deployment => self
                .get::<Deployment>(name, namespace)
                .await?
                .map(ManagedObject::Deployment),
            ResourceKind::Service => self
                .get::<Service>(name, namespace)
                .await?
                .map(ManagedObject::Service),
        })
    }

    async fn persist(&self, object: &ManagedObject) -> Result<()> {
        match object {
            ManagedObject::PgNamespace(r) => self.put(r).await,
            ManagedObject::PersistentVolumeClaim(r) => self.put(r).await,
            ManagedObject::ConfigMap(r) => self.put(r).await,
            ManagedObject::Secret(r) => self.put(r).await,
            ManagedObject::Deployment(r) => self.put(r).await,
            ManagedObject::Service(r) => self.put(r).await,
        }
    }
}

/// Bring one managed resource of `cluster` in line with its desired state.
///
/// Fetches the named object (or initializes an empty one), synthesizes it,
/// and persists it only when it is new or synthesis changed it.
pub async fn reconcile_resource<S>(
    store: &S,
    synthesizer: &Synthesizer,
    kind: ResourceKind,
    cluster: &OdooCluster,
    selector: Selector,
) -> Result<Synthesized>
where
    S: ResourceStore + ?Sized,
{
    let cluster_name = cluster.name_any();
    let namespace = cluster
        .namespace()
        .ok_or_else(|| Error::validation_for(&cluster_name, "OdooCluster has no namespace"))?;
    let name = resource_name(synthesizer, kind, cluster, selector)?;

    let (mut object, created) = match store.fetch(kind, &name, &namespace).await? {
        Some(object) => (object, false),
        None => (ManagedObject::empty(kind, &name, &namespace), true),
    };

    let outcome = object.synthesize(synthesizer, cluster, selector)?;
    if created || outcome.needs_persist() {
        store.persist(&object).await?;
    }
    Ok(outcome)
}
