//! Credential payloads for the credential bundle
//!
//! Payloads are mounted as files next to the configuration bundle and read
//! by the Odoo server as additional configuration. They are opaque here: no
//! encryption, no password policy.

use odoo_common::crd::PgNamespaceSpec;

/// Credential bundle key holding the database connection
pub const PSQL_SECRET_KEY: &str = "psql";

/// Credential bundle key holding the master password
pub const ADMIN_SECRET_KEY: &str = "admin";

/// Parameters of the database connection payload
#[derive(Clone, Copy, Debug)]
pub struct DatabaseCredential<'a> {
    /// PostgreSQL host
    pub host: &'a str,
    /// PostgreSQL port
    pub port: u16,
    /// Role name
    pub user: &'a str,
    /// Role password
    pub password: &'a str,
}

impl<'a> From<&'a PgNamespaceSpec> for DatabaseCredential<'a> {
    fn from(spec: &'a PgNamespaceSpec) -> Self {
        Self {
            host: &spec.pg_cluster.host,
            port: spec.pg_cluster.port,
            user: &spec.user,
            password: &spec.password,
        }
    }
}

/// Parameters of the master password payload
#[derive(Clone, Copy, Debug)]
pub struct AdminCredential<'a> {
    /// Master password
    pub password: &'a str,
}

/// Render the database connection payload
pub fn render_database_credential(params: DatabaseCredential<'_>) -> Vec<u8> {
    format!(
        "[options]\n\
         db_host = {}\n\
         db_port = {}\n\
         db_user = {}\n\
         db_password = {}\n",
        params.host, params.port, params.user, params.password,
    )
    .into_bytes()
}

/// Render the master password payload
pub fn render_admin_credential(params: AdminCredential<'_>) -> Vec<u8> {
    format!("[options]\nadmin_passwd = {}\n", params.password).into_bytes()
}
