//! Ownership back-references from managed resources to their OdooCluster

use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
use kube::Resource;
use odoo_common::crd::OdooCluster;

/// Controller reference pointing at `owner`.
///
/// `None` when the owner has not been persisted yet (no uid).
pub fn owner_reference(owner: &OdooCluster) -> Option<OwnerReference> {
    let meta = owner.meta();
    Some(OwnerReference {
        api_version: OdooCluster::api_version(&()).to_string(),
        kind: OdooCluster::kind(&()).to_string(),
        name: meta.name.clone()?,
        uid: meta.uid.clone()?,
        controller: Some(true),
        block_owner_deletion: Some(true),
    })
}

/// Append a reference to `owner` unless one with the same uid is present.
///
/// Existing references are never removed. Returns true when a reference
/// was added.
pub fn attach_owner<R: Resource>(resource: &mut R, owner: &OdooCluster) -> bool {
    let Some(reference) = owner_reference(owner) else {
        return false;
    };
    let references = resource
        .meta_mut()
        .owner_references
        .get_or_insert_with(Vec::new);
    if references.iter().any(|r| r.uid == reference.uid) {
        return false;
    }
    references.push(reference);
    true
}
