//! Error types for the Odoo operator
//!
//! Errors are structured with fields to aid debugging in production.
//! Synthesis errors name the cluster and the list that was addressed;
//! storage errors carry the untouched kube-rs error from the external loop.

use thiserror::Error;

/// Default context value when no specific context is available
pub const UNKNOWN_CONTEXT: &str = "unknown";

/// Main error type for Odoo operator operations
#[derive(Debug, Error)]
pub enum Error {
    /// A positional index does not address an existing track, tier or volume
    #[error("index {} out of range for {list} of {cluster} (len {len})", display_index(.index))]
    IndexOutOfRange {
        /// Name of the OdooCluster being synthesized
        cluster: String,
        /// Addressed list (tracks, tiers, volumes)
        list: String,
        /// Supplied index, `None` when the selector did not carry one
        index: Option<usize>,
        /// Length of the addressed list
        len: usize,
    },

    /// Validation error for CRD specs
    #[error("validation error for {cluster}: {message}")]
    Validation {
        /// Name of the cluster with invalid configuration
        cluster: String,
        /// Description of what's invalid
        message: String,
        /// The invalid field path (e.g., "spec.tracks[0].name")
        field: Option<String>,
    },

    /// Fetching a managed resource from the API server failed
    #[error("failed to fetch {kind} {name}: {source}")]
    Fetch {
        /// Kind of the managed resource
        kind: String,
        /// Name of the managed resource
        name: String,
        /// The underlying kube-rs error
        #[source]
        source: kube::Error,
    },

    /// Persisting a managed resource to the API server failed
    #[error("failed to persist {kind} {name}: {source}")]
    Persist {
        /// Kind of the managed resource
        kind: String,
        /// Name of the managed resource
        name: String,
        /// The underlying kube-rs error
        #[source]
        source: kube::Error,
    },
}

fn display_index(index: &Option<usize>) -> String {
    index.map_or_else(|| "<none>".to_string(), |i| i.to_string())
}

impl Error {
    /// Create an out-of-range error for an addressed list
    pub fn out_of_range(
        cluster: impl Into<String>,
        list: impl Into<String>,
        index: Option<usize>,
        len: usize,
    ) -> Self {
        Self::IndexOutOfRange {
            cluster: cluster.into(),
            list: list.into(),
            index,
            len,
        }
    }

    /// Create a validation error with the given message
    ///
    /// For simple validation errors without cluster context.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            cluster: UNKNOWN_CONTEXT.to_string(),
            message: msg.into(),
            field: None,
        }
    }

    /// Create a validation error with cluster context
    pub fn validation_for(cluster: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Validation {
            cluster: cluster.into(),
            message: msg.into(),
            field: None,
        }
    }

    /// Create a validation error with cluster context and field path
    pub fn validation_for_field(
        cluster: impl Into<String>,
        field: impl Into<String>,
        msg: impl Into<String>,
    ) -> Self {
        Self::Validation {
            cluster: cluster.into(),
            message: msg.into(),
            field: Some(field.into()),
        }
    }

    /// Wrap a failed fetch of a managed resource
    pub fn fetch(kind: impl Into<String>, name: impl Into<String>, source: kube::Error) -> Self {
        Self::Fetch {
            kind: kind.into(),
            name: name.into(),
            source,
        }
    }

    /// Wrap a failed persist of a managed resource
    pub fn persist(kind: impl Into<String>, name: impl Into<String>, source: kube::Error) -> Self {
        Self::Persist {
            kind: kind.into(),
            name: name.into(),
            source,
        }
    }

    /// Check if this error is retryable
    ///
    /// Out-of-range and validation errors require a spec fix.
    /// Storage errors depend on the kube error: 4xx responses are permanent.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::IndexOutOfRange { .. } => false,
            Error::Validation { .. } => false,
            Error::Fetch { source, .. } | Error::Persist { source, .. } => !matches!(
                source,
                kube::Error::Api(ae) if (400..500).contains(&ae.code)
            ),
        }
    }

    /// Get the cluster name if this error is associated with a specific cluster
    pub fn cluster(&self) -> Option<&str> {
        match self {
            Error::IndexOutOfRange { cluster, .. } => Some(cluster),
            Error::Validation { cluster, .. } => Some(cluster),
            Error::Fetch { .. } | Error::Persist { .. } => None,
        }
    }
}
