//! Desired-state builders, one per managed resource kind
//!
//! Each builder is a pure function of the OdooCluster and a [`Scope`]
//! locating the track, tier or volume the resource belongs to. Builders never
//! look at the live object; comparing against it is the syncer's job.

pub mod config_map;
pub mod deployment;
pub mod pg_namespace;
pub mod secret;
pub mod service;
pub mod volume;

use std::collections::BTreeMap;

use kube::ResourceExt;
use odoo_common::crd::{OdooCluster, TierSpec, TrackSpec, VolumeSpec};
use odoo_common::{Error, Result, CLUSTER_LABEL_KEY};

use crate::config::templates::DefaultSettings;

/// Positional indices selecting the track, tier and volume of a resource
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Selector {
    /// Index into `spec.tracks`
    pub track: Option<usize>,
    /// Index into `spec.tiers`
    pub tier: Option<usize>,
    /// Index into `spec.volumes`
    pub volume: Option<usize>,
}

impl Selector {
    /// Selector for cluster-wide singletons
    pub fn cluster() -> Self {
        Self::default()
    }

    /// Selector for a volume claim
    pub fn volume(index: usize) -> Self {
        Self {
            volume: Some(index),
            ..Self::default()
        }
    }

    /// Selector for a track's configuration bundle
    pub fn track(index: usize) -> Self {
        Self {
            track: Some(index),
            ..Self::default()
        }
    }

    /// Selector for a tier's network service
    pub fn tier(index: usize) -> Self {
        Self {
            tier: Some(index),
            ..Self::default()
        }
    }

    /// Selector for a track/tier workload
    pub fn workload(track: usize, tier: usize) -> Self {
        Self {
            track: Some(track),
            tier: Some(tier),
            volume: None,
        }
    }
}

/// Everything a builder may read
#[derive(Clone, Copy, Debug)]
pub struct Scope<'a> {
    /// Owning cluster
    pub cluster: &'a OdooCluster,
    /// Addressed entries
    pub selector: Selector,
    /// Constants of the default configuration blob
    pub defaults: &'a DefaultSettings,
}

impl<'a> Scope<'a> {
    /// Bundle a cluster, selector and defaults
    pub fn new(cluster: &'a OdooCluster, selector: Selector, defaults: &'a DefaultSettings) -> Self {
        Self {
            cluster,
            selector,
            defaults,
        }
    }

    /// Name of the owning cluster
    pub fn cluster_name(&self) -> String {
        self.cluster.name_any()
    }

    /// The selected track
    pub fn track(&self) -> Result<&'a TrackSpec> {
        self.pick("tracks", &self.cluster.spec.tracks, self.selector.track)
    }

    /// The selected tier
    pub fn tier(&self) -> Result<&'a TierSpec> {
        self.pick("tiers", &self.cluster.spec.tiers, self.selector.tier)
    }

    /// The selected volume
    pub fn volume(&self) -> Result<&'a VolumeSpec> {
        self.pick("volumes", &self.cluster.spec.volumes, self.selector.volume)
    }

    fn pick<T>(&self, list: &str, items: &'a [T], index: Option<usize>) -> Result<&'a T> {
        index
            .and_then(|i| items.get(i))
            .ok_or_else(|| Error::out_of_range(self.cluster_name(), list, index, items.len()))
    }
}

/// Labels selecting every workload of a cluster
pub fn cluster_selector(cluster: &str) -> BTreeMap<String, String> {
    BTreeMap::from([(CLUSTER_LABEL_KEY.to_string(), cluster.to_string())])
}
