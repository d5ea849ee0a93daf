//! Workload of a track/tier pair
//!
//! Every workload mounts the track's configuration bundle, the cluster's
//! credential bundle and every cluster volume, runs as the fixed non-root
//! Odoo user, and rolls out one pod at a time.

use std::collections::BTreeMap;

use k8s_openapi::api::apps::v1::{DeploymentStrategy, RollingUpdateDeployment};
use k8s_openapi::api::core::v1::{
    ConfigMapVolumeSource, Container, ContainerPort, EnvVar, LocalObjectReference,
    PersistentVolumeClaimVolumeSource, PodSecurityContext, Probe, SecretVolumeSource,
    TCPSocketAction, Volume, VolumeMount,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::LabelSelector;
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use odoo_common::crd::{OdooCluster, TierSpec, TierType, TrackSpec};
use odoo_common::{Result, TIER_LABEL_KEY, TRACK_LABEL_KEY};

use super::{cluster_selector, Scope};
use crate::naming::{
    config_map_name, pod_volume_name, secret_name, volume_claim_name, CONFIG_VOLUME_SUFFIX,
    SECRET_VOLUME_SUFFIX,
};

/// Permission mode of the mounted configuration bundle (octal 0420)
pub const CONFIG_VOLUME_MODE: i32 = 0o420;

/// Permission mode of the mounted credential bundle (octal 0400)
pub const SECRET_VOLUME_MODE: i32 = 0o400;

/// User and filesystem group the Odoo image runs as
pub const ODOO_USER_ID: i64 = 9001;

/// Host volume group granting access to shared volumes
pub const HOST_VOLUME_GROUP: i64 = 2000;

/// Client-facing HTTP port
pub const CLIENT_PORT: i32 = 8069;

/// Name of the client-facing port
pub const CLIENT_PORT_NAME: &str = "web";

/// Long-polling port
pub const LONGPOLLING_PORT: i32 = 8072;

/// Name of the long-polling port
pub const LONGPOLLING_PORT_NAME: &str = "longpolling";

/// Mount path of the configuration bundle
pub const CONFIG_MOUNT_PATH: &str = "/run/configs/odoo/";

/// Mount path of the credential bundle
pub const SECRET_MOUNT_PATH: &str = "/run/secrets/odoo/";

const CONTAINER_NAME: &str = "odoo";

/// Mutable sub-state of a workload
#[derive(Clone, Debug, PartialEq)]
pub struct DeploymentState {
    /// Pod volumes: config, credentials, then one per cluster volume
    pub volumes: Vec<Volume>,
    /// Pod security context
    pub security_context: PodSecurityContext,
    /// The single Odoo container
    pub containers: Vec<Container>,
    /// Image pull credentials
    pub image_pull_secrets: Vec<LocalObjectReference>,
    /// Labels stamped on the pod template
    pub template_labels: BTreeMap<String, String>,
    /// Workload selector
    pub selector: LabelSelector,
    /// Desired replica count
    pub replicas: i32,
    /// Rollout strategy
    pub strategy: DeploymentStrategy,
}

/// Name and number of the port a tier listens on, if any
pub fn tier_port(tier: TierType) -> Option<(&'static str, i32)> {
    match tier {
        TierType::Server => Some((CLIENT_PORT_NAME, CLIENT_PORT)),
        TierType::Longpolling => Some((LONGPOLLING_PORT_NAME, LONGPOLLING_PORT)),
        TierType::Cron | TierType::Unknown => None,
    }
}

/// Desired workload state for the selected track and tier
pub fn desired_state(scope: &Scope<'_>) -> Result<DeploymentState> {
    let cluster_name = scope.cluster_name();
    let track = scope.track()?;
    let tier = scope.tier()?;

    let selector = cluster_selector(&cluster_name);
    let mut template_labels = selector.clone();
    template_labels.insert(TRACK_LABEL_KEY.to_string(), track.name.clone());
    template_labels.insert(TIER_LABEL_KEY.to_string(), tier.tier_type().to_string());

    Ok(DeploymentState {
        volumes: pod_volumes(scope.cluster, &cluster_name, track),
        security_context: security_context(),
        containers: vec![odoo_container(scope.cluster, &cluster_name, track, tier)],
        image_pull_secrets: pull_secrets(track),
        template_labels,
        selector: LabelSelector {
            match_labels: Some(selector),
            ..Default::default()
        },
        replicas: tier.replicas,
        strategy: rolling_update(),
    })
}

fn pod_volumes(cluster: &OdooCluster, cluster_name: &str, track: &TrackSpec) -> Vec<Volume> {
    let mut volumes = vec![
        Volume {
            name: pod_volume_name(cluster_name, CONFIG_VOLUME_SUFFIX),
            config_map: Some(ConfigMapVolumeSource {
                name: config_map_name(cluster_name, track),
                default_mode: Some(CONFIG_VOLUME_MODE),
                ..Default::default()
            }),
            ..Default::default()
        },
        Volume {
            name: pod_volume_name(cluster_name, SECRET_VOLUME_SUFFIX),
            secret: Some(SecretVolumeSource {
                secret_name: Some(secret_name(cluster_name)),
                default_mode: Some(SECRET_VOLUME_MODE),
                ..Default::default()
            }),
            ..Default::default()
        },
    ];

    volumes.extend(cluster.spec.volumes.iter().map(|v| {
        let claim = volume_claim_name(cluster_name, v);
        Volume {
            name: claim.clone(),
            persistent_volume_claim: Some(PersistentVolumeClaimVolumeSource {
                claim_name: claim,
                read_only: Some(false),
            }),
            ..Default::default()
        }
    }));

    volumes
}

fn pull_secrets(track: &TrackSpec) -> Vec<LocalObjectReference> {
    if track.image.secret.is_empty() {
        return Vec::new();
    }
    vec![LocalObjectReference {
        name: track.image.secret.clone(),
    }]
}

fn security_context() -> PodSecurityContext {
    PodSecurityContext {
        run_as_user: Some(ODOO_USER_ID),
        run_as_non_root: Some(true),
        fs_group: Some(ODOO_USER_ID),
        supplemental_groups: Some(vec![HOST_VOLUME_GROUP]),
        ..Default::default()
    }
}

fn rolling_update() -> DeploymentStrategy {
    DeploymentStrategy {
        type_: Some("RollingUpdate".to_string()),
        rolling_update: Some(RollingUpdateDeployment {
            max_unavailable: Some(IntOrString::Int(1)),
            max_surge: Some(IntOrString::Int(1)),
        }),
    }
}

fn odoo_container(
    cluster: &OdooCluster,
    cluster_name: &str,
    track: &TrackSpec,
    tier: &TierSpec,
) -> Container {
    let tier_type = tier.tier_type();

    let args: Vec<String> = match tier_type {
        TierType::Server => vec!["--max-cron-threads=0".to_string()],
        TierType::Longpolling => vec!["gevent".to_string()],
        TierType::Cron => vec!["--no-http".to_string(), "--max-cron-threads=2".to_string()],
        TierType::Unknown => Vec::new(),
    };

    let mut volume_mounts = vec![
        VolumeMount {
            name: pod_volume_name(cluster_name, CONFIG_VOLUME_SUFFIX),
            mount_path: CONFIG_MOUNT_PATH.to_string(),
            read_only: Some(true),
            ..Default::default()
        },
        VolumeMount {
            name: pod_volume_name(cluster_name, SECRET_VOLUME_SUFFIX),
            mount_path: SECRET_MOUNT_PATH.to_string(),
            read_only: Some(true),
            ..Default::default()
        },
    ];
    volume_mounts.extend(cluster.spec.volumes.iter().map(|v| VolumeMount {
        name: volume_claim_name(cluster_name, v),
        mount_path: v.mount_path(),
        ..Default::default()
    }));

    let port = tier_port(tier_type);

    Container {
        name: CONTAINER_NAME.to_string(),
        image: Some(track.image.reference()),
        image_pull_policy: Some("IfNotPresent".to_string()),
        args: (!args.is_empty()).then_some(args),
        env: Some(vec![
            EnvVar {
                name: "ODOO_RC".to_string(),
                value: Some(CONFIG_MOUNT_PATH.to_string()),
                ..Default::default()
            },
            EnvVar {
                name: "ODOO_PASSFILE".to_string(),
                value: Some(SECRET_MOUNT_PATH.to_string()),
                ..Default::default()
            },
        ]),
        ports: port.map(|(name, number)| {
            vec![ContainerPort {
                name: Some(name.to_string()),
                container_port: number,
                protocol: Some("TCP".to_string()),
                ..Default::default()
            }]
        }),
        readiness_probe: port.map(|(name, _)| Probe {
            tcp_socket: Some(TCPSocketAction {
                port: IntOrString::String(name.to_string()),
                ..Default::default()
            }),
            initial_delay_seconds: Some(10),
            period_seconds: Some(10),
            ..Default::default()
        }),
        volume_mounts: Some(volume_mounts),
        ..Default::default()
    }
}
