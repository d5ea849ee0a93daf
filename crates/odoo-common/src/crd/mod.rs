//! Custom Resource Definitions for the Odoo operator
//!
//! This module contains the CRDs the operator reads (`OdooCluster`) and the
//! database-namespace claim it manages (`PgNamespace`).

mod cluster;
mod config;
mod pg_namespace;

pub use cluster::{
    mount_path_for, ImageSpec, OdooCluster, OdooClusterSpec, TierSpec, TierType, TrackSpec,
    VersionSpec, VolumeSpec, VOLUME_BACKUP, VOLUME_DATA,
};
pub use config::{ConfigScalar, ConfigTree, ConfigValue};
pub use pg_namespace::{PgClusterSpec, PgNamespace, PgNamespaceSpec, DEFAULT_PG_PORT};
