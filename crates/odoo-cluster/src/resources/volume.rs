//! Volume claims

use k8s_openapi::api::core::v1::PersistentVolumeClaimSpec;
use odoo_common::Result;

use super::Scope;

/// Desired claim spec: the storage spec of the selected volume
pub fn desired_spec(scope: &Scope<'_>) -> Result<PersistentVolumeClaimSpec> {
    Ok(scope.volume()?.spec.clone())
}
