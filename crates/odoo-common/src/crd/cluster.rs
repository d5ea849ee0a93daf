//! OdooCluster Custom Resource Definition
//!
//! The OdooCluster is the top-level specification. It is layered:
//! cluster-wide settings, a list of tracks (deployment lineages with their
//! own image and overrides) and a list of tiers (role variants with their own
//! replica count). Managed resources address tracks, tiers and volumes by
//! positional index.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use k8s_openapi::api::core::v1::PersistentVolumeClaimSpec;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::config::ConfigTree;
use super::pg_namespace::PgNamespaceSpec;

/// Well-known volume holding the Odoo filestore
pub const VOLUME_DATA: &str = "data";

/// Well-known volume holding database backups
pub const VOLUME_BACKUP: &str = "backup";

/// Specification for an OdooCluster
#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "cluster.odoo.io",
    version = "v1alpha1",
    kind = "OdooCluster",
    plural = "odooclusters",
    shortname = "odoo",
    namespaced,
    printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct OdooClusterSpec {
    /// Database namespace claimed for this cluster
    pub pg_spec: PgNamespaceSpec,

    /// Odoo master (database manager) password
    pub admin_password: String,

    /// Persistent volumes mounted into every workload
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub volumes: Vec<VolumeSpec>,

    /// Deployment lineages
    #[serde(default)]
    pub tracks: Vec<TrackSpec>,

    /// Workload role variants
    #[serde(default)]
    pub tiers: Vec<TierSpec>,

    /// Cluster-level general options, raw `key = value` lines
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<String>,

    /// Cluster-level integrator options, raw `key = value` lines
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub integrator_config: Option<String>,

    /// Cluster-level custom options, raw `key = value` lines
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_config: Option<String>,

    /// Cluster-level structured settings (lowest precedence)
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub settings: ConfigTree,
}

/// A persistent volume shared by all workloads of the cluster
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VolumeSpec {
    /// Volume name, `data` and `backup` are well known
    pub name: String,

    /// Claim specification
    pub spec: PersistentVolumeClaimSpec,
}

impl VolumeSpec {
    /// Path at which the volume is mounted inside the workload
    pub fn mount_path(&self) -> String {
        mount_path_for(&self.name)
    }
}

/// Mount path for a named volume
pub fn mount_path_for(name: &str) -> String {
    format!("/mnt/odoo/{}/", name)
}

/// Container image reference
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ImageSpec {
    /// Registry host, may be empty for the default registry
    #[serde(default)]
    pub registry: String,

    /// Repository path
    pub image: String,

    /// Image tag
    pub tag: String,

    /// Name of the image pull secret
    #[serde(default)]
    pub secret: String,
}

impl ImageSpec {
    /// Full image reference `registry/image:tag`
    pub fn reference(&self) -> String {
        if self.registry.is_empty() {
            format!("{}:{}", self.image, self.tag)
        } else {
            format!("{}/{}:{}", self.registry.trim_end_matches('/'), self.image, self.tag)
        }
    }
}

/// Leaf-level override layer of a track
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VersionSpec {
    /// Version label
    pub name: String,

    /// Structured settings (highest precedence)
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub settings: ConfigTree,
}

/// A deployment lineage
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TrackSpec {
    /// Track name
    pub name: String,

    /// Image deployed by this track
    pub image: ImageSpec,

    /// Track-level general options
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<String>,

    /// Track-level integrator options
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub integrator_config: Option<String>,

    /// Track-level custom options
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_config: Option<String>,

    /// Track-level structured settings
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub settings: ConfigTree,

    /// Version-level override layer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<VersionSpec>,
}

/// Role variant of a tier
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TierType {
    /// Client-facing HTTP workers
    Server,
    /// Long-polling (gevent) workers
    Longpolling,
    /// Scheduled job workers
    Cron,
    /// Anything else; reconciles to a workload without ports
    Unknown,
}

impl TierType {
    /// Classify a tier name (case-insensitive)
    pub fn from_name(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "server" => Self::Server,
            "longpolling" => Self::Longpolling,
            "cron" => Self::Cron,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for TierType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Server => write!(f, "server"),
            Self::Longpolling => write!(f, "longpolling"),
            Self::Cron => write!(f, "cron"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// A workload role with its own replica count
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TierSpec {
    /// Tier name (`server`, `longpolling`, `cron`)
    pub name: String,

    /// Desired replica count
    #[serde(default)]
    pub replicas: i32,
}

impl TierSpec {
    /// Role variant of this tier
    pub fn tier_type(&self) -> TierType {
        TierType::from_name(&self.name)
    }
}

impl OdooClusterSpec {
    /// Validate the cluster specification
    ///
    /// Synthesis never validates; the reconciliation loop calls this before
    /// driving managed resources so that naming collisions surface early.
    pub fn validate(&self, cluster: &str) -> Result<(), crate::Error> {
        check_names(cluster, "volumes", self.volumes.iter().map(|v| v.name.as_str()))?;
        check_names(cluster, "tracks", self.tracks.iter().map(|t| t.name.as_str()))?;
        check_names(cluster, "tiers", self.tiers.iter().map(|t| t.name.as_str()))?;

        for (i, tier) in self.tiers.iter().enumerate() {
            if tier.replicas < 0 {
                return Err(crate::Error::validation_for_field(
                    cluster,
                    format!("spec.tiers[{i}].replicas"),
                    format!("replicas must be >= 0, got {}", tier.replicas),
                ));
            }
        }
        Ok(())
    }
}

fn check_names<'a>(
    cluster: &str,
    list: &str,
    names: impl Iterator<Item = &'a str>,
) -> Result<(), crate::Error> {
    let mut seen = HashSet::new();
    for (i, name) in names.enumerate() {
        let field = format!("spec.{list}[{i}].name");
        if name.is_empty() {
            return Err(crate::Error::validation_for_field(
                cluster,
                field,
                "name cannot be empty",
            ));
        }
        if !seen.insert(name.to_lowercase()) {
            return Err(crate::Error::validation_for_field(
                cluster,
                field,
                format!("duplicate name '{name}'"),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_spec() -> OdooClusterSpec {
        OdooClusterSpec {
            tracks: vec![TrackSpec {
                name: "prod".to_string(),
                image: ImageSpec {
                    registry: "registry.example.com".to_string(),
                    image: "odoo/odoo".to_string(),
                    tag: "12.0".to_string(),
                    secret: "regcred".to_string(),
                },
                ..Default::default()
            }],
            tiers: vec![
                TierSpec {
                    name: "server".to_string(),
                    replicas: 2,
                },
                TierSpec {
                    name: "longpolling".to_string(),
                    replicas: 1,
                },
            ],
            volumes: vec![VolumeSpec {
                name: VOLUME_DATA.to_string(),
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    #[test]
    fn tier_type_is_case_insensitive() {
        assert_eq!(TierType::from_name("Server"), TierType::Server);
        assert_eq!(TierType::from_name("LONGPOLLING"), TierType::Longpolling);
        assert_eq!(TierType::from_name("cron"), TierType::Cron);
        assert_eq!(TierType::from_name("worker"), TierType::Unknown);
    }

    #[test]
    fn image_reference_with_and_without_registry() {
        let mut image = sample_spec().tracks[0].image.clone();
        assert_eq!(image.reference(), "registry.example.com/odoo/odoo:12.0");
        image.registry.clear();
        assert_eq!(image.reference(), "odoo/odoo:12.0");
    }

    #[test]
    fn volume_mount_paths() {
        assert_eq!(mount_path_for(VOLUME_DATA), "/mnt/odoo/data/");
        assert_eq!(mount_path_for(VOLUME_BACKUP), "/mnt/odoo/backup/");
        assert_eq!(sample_spec().volumes[0].mount_path(), "/mnt/odoo/data/");
    }

    #[test]
    fn valid_spec_passes() {
        assert!(sample_spec().validate("acme").is_ok());
    }

    #[test]
    fn duplicate_tier_names_are_rejected() {
        let mut spec = sample_spec();
        spec.tiers[1].name = "Server".to_string();
        let err = spec.validate("acme").unwrap_err();
        assert!(err.to_string().contains("duplicate name"));
    }

    #[test]
    fn empty_track_name_is_rejected() {
        let mut spec = sample_spec();
        spec.tracks[0].name.clear();
        match spec.validate("acme").unwrap_err() {
            crate::Error::Validation { field, .. } => {
                assert_eq!(field.as_deref(), Some("spec.tracks[0].name"));
            }
            other => panic!("Expected Validation variant, got {other:?}"),
        }
    }

    #[test]
    fn negative_replicas_are_rejected() {
        let mut spec = sample_spec();
        spec.tiers[0].replicas = -1;
        assert!(spec.validate("acme").is_err());
    }

    #[test]
    fn deserializes_from_yaml_with_missing_optionals() {
        let yaml = r#"
pgSpec:
  pgCluster:
    host: postgres.db.svc
  user: odoo
  password: secret
adminPassword: admin
tracks:
  - name: prod
    image:
      image: odoo/odoo
      tag: "12.0"
tiers:
  - name: server
    replicas: 3
"#;
        let spec: OdooClusterSpec = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(spec.pg_spec.pg_cluster.port, 5432);
        assert!(spec.volumes.is_empty());
        assert!(spec.config.is_none());
        assert_eq!(spec.tiers[0].tier_type(), TierType::Server);
        assert!(spec.tracks[0].image.secret.is_empty());
    }

    #[test]
    fn null_setting_does_not_reject_the_cluster() {
        let yaml = r#"
pgSpec:
  pgCluster:
    host: postgres.db.svc
  user: odoo
  password: secret
adminPassword: admin
settings:
  options:
    dbfilter: ~
    ratio: 1.0
"#;
        let spec: OdooClusterSpec = serde_yaml::from_str(yaml).unwrap();
        let options = spec.settings["options"].as_section().unwrap();
        assert_eq!(options["dbfilter"].to_leaf_string().as_deref(), Some(""));
        assert_eq!(options["ratio"].to_leaf_string().as_deref(), Some("1.0"));
    }

    #[test]
    fn crd_is_namespaced_in_operator_group() {
        use kube::CustomResourceExt;

        let crd = OdooCluster::crd();
        assert_eq!(crd.spec.group, crate::API_GROUP);
        assert_eq!(crd.spec.scope, "Namespaced");
        assert_eq!(crd.spec.names.kind, "OdooCluster");
    }

    #[test]
    fn serializes_camel_case_and_skips_absent_overrides() {
        let json = serde_json::to_value(sample_spec()).unwrap();
        assert!(json.get("adminPassword").is_some());
        assert!(json.get("pgSpec").is_some());
        assert!(json.get("integratorConfig").is_none());
        assert!(json.get("settings").is_none());
        assert_eq!(json["tiers"][0]["replicas"], 2);
    }
}
