//! Deterministic names of managed resources
//!
//! Every name derives from the owning cluster's name plus a kind-specific
//! suffix, so re-synthesis always targets the same object. Singletons
//! (database claim, credential bundle) carry no suffix.

use odoo_common::crd::{TierSpec, TrackSpec, VolumeSpec};

/// Suffix of the pod volume mounting the configuration bundle
pub const CONFIG_VOLUME_SUFFIX: &str = "config";

/// Suffix of the pod volume mounting the credential bundle
pub const SECRET_VOLUME_SUFFIX: &str = "secret";

fn scoped(parts: &[&str]) -> String {
    parts.join("-").to_lowercase()
}

/// Name of the database-namespace claim
pub fn pg_namespace_name(cluster: &str) -> String {
    scoped(&[cluster])
}

/// Name of the credential bundle
pub fn secret_name(cluster: &str) -> String {
    scoped(&[cluster])
}

/// Name of a volume claim (also used as its pod volume name)
pub fn volume_claim_name(cluster: &str, volume: &VolumeSpec) -> String {
    scoped(&[cluster, &volume.name])
}

/// Name of a track's configuration bundle
pub fn config_map_name(cluster: &str, track: &TrackSpec) -> String {
    scoped(&[cluster, &track.name])
}

/// Name of a track/tier workload
pub fn deployment_name(cluster: &str, track: &TrackSpec, tier: &TierSpec) -> String {
    scoped(&[cluster, &track.name, &tier.name])
}

/// Name of a tier's network service
pub fn service_name(cluster: &str, tier: &TierSpec) -> String {
    scoped(&[cluster, &tier.name])
}

/// Name of a fixed pod volume (`config`, `secret`)
pub fn pod_volume_name(cluster: &str, suffix: &str) -> String {
    scoped(&[cluster, suffix])
}
