//! PgNamespace Custom Resource Definition
//!
//! A PgNamespace claims a database namespace on a shared PostgreSQL cluster.
//! The OdooCluster copies its database-connection spec into the claim verbatim.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Default PostgreSQL port
pub const DEFAULT_PG_PORT: u16 = 5432;

fn default_pg_port() -> u16 {
    DEFAULT_PG_PORT
}

/// Location of the PostgreSQL cluster hosting the namespace
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PgClusterSpec {
    /// Hostname of the PostgreSQL service
    pub host: String,

    /// Port of the PostgreSQL service
    #[serde(default = "default_pg_port")]
    pub port: u16,
}

impl Default for PgClusterSpec {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: DEFAULT_PG_PORT,
        }
    }
}

/// Specification for a PgNamespace claim
#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[kube(
    group = "cluster.odoo.io",
    version = "v1alpha1",
    kind = "PgNamespace",
    plural = "pgnamespaces",
    shortname = "pgns",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct PgNamespaceSpec {
    /// PostgreSQL cluster serving this namespace
    pub pg_cluster: PgClusterSpec,

    /// Role owning the namespace
    pub user: String,

    /// Password of the owning role
    pub password: String,
}
