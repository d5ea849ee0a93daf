//! Database-namespace claim

use odoo_common::crd::PgNamespaceSpec;

use super::Scope;

/// Desired claim spec: the cluster's database-connection spec, verbatim
pub fn desired_spec(scope: &Scope<'_>) -> PgNamespaceSpec {
    scope.cluster.spec.pg_spec.clone()
}
