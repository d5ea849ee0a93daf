//! Credential bundle

use std::collections::BTreeMap;

use k8s_openapi::ByteString;

use super::Scope;
use crate::secrets::{
    render_admin_credential, render_database_credential, AdminCredential, DatabaseCredential,
    ADMIN_SECRET_KEY, PSQL_SECRET_KEY,
};

/// Desired bundle data: the rendered database and master-password payloads
pub fn desired_data(scope: &Scope<'_>) -> BTreeMap<String, ByteString> {
    let spec = &scope.cluster.spec;
    BTreeMap::from([
        (
            PSQL_SECRET_KEY.to_string(),
            ByteString(render_database_credential(DatabaseCredential::from(
                &spec.pg_spec,
            ))),
        ),
        (
            ADMIN_SECRET_KEY.to_string(),
            ByteString(render_admin_credential(AdminCredential {
                password: &spec.admin_password,
            })),
        ),
    ])
}
