//! Common types for the Odoo operator: CRDs, labels, and errors

#![deny(missing_docs)]

pub mod crd;
pub mod error;

pub use error::Error;

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;

/// API group of the operator's custom resources
pub const API_GROUP: &str = "cluster.odoo.io";

/// Label carrying the owning cluster's name (cluster identity selector)
pub const CLUSTER_LABEL_KEY: &str = "cluster.odoo.io/part-of-cluster";

/// Label carrying the track a workload belongs to
pub const TRACK_LABEL_KEY: &str = "cluster.odoo.io/part-of-track";

/// Label carrying the tier a workload serves
pub const TIER_LABEL_KEY: &str = "cluster.odoo.io/tier";

/// Standard label recording which controller manages a resource
pub const LABEL_MANAGED_BY: &str = "app.kubernetes.io/managed-by";

/// Value of [`LABEL_MANAGED_BY`] on resources owned by this operator
pub const LABEL_MANAGED_BY_ODOO: &str = "odoo-operator";
