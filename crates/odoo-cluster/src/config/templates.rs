//! Text templates for the configuration bundle
//!
//! Every blob is rendered by a pure function from an explicit parameter
//! struct. Override strings are raw `key = value` lines contributed at the
//! cluster level and the track level; an absent override renders as an
//! empty line.

use odoo_common::crd::{mount_path_for, VOLUME_BACKUP, VOLUME_DATA};
use serde::{Deserialize, Serialize};

/// Constants of the `default` blob
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct DefaultSettings {
    /// Skip demo data on database creation
    pub without_demo: String,
    /// Modules loaded for every database
    pub server_wide_modules: String,
    /// Default database name
    pub db_name: String,
    /// Template used for new databases
    pub db_template: String,
    /// Whether the database manager lists databases
    pub list_db: String,
    /// Hostname-based database filter
    pub dbfilter: String,
    /// Publisher warranty endpoint
    pub publisher_warranty_url: String,
    /// Server log level
    pub log_level: String,
}

impl Default for DefaultSettings {
    fn default() -> Self {
        Self {
            without_demo: "True".to_string(),
            server_wide_modules: "base,web".to_string(),
            db_name: "False".to_string(),
            db_template: "template0".to_string(),
            list_db: "False".to_string(),
            dbfilter: "^%d$".to_string(),
            publisher_warranty_url: "http://services.openerp.com/publisher-warranty/".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// Cluster-level and track-level contributions to one blob
#[derive(Clone, Copy, Debug, Default)]
pub struct Overrides<'a> {
    /// Cluster-level lines
    pub cluster: Option<&'a str>,
    /// Track-level lines
    pub track: Option<&'a str>,
}

impl<'a> Overrides<'a> {
    /// Pair of optional override strings
    pub fn new(cluster: Option<&'a str>, track: Option<&'a str>) -> Self {
        Self { cluster, track }
    }

    fn cluster_or_empty(&self) -> &'a str {
        self.cluster.unwrap_or_default()
    }

    fn track_or_empty(&self) -> &'a str {
        self.track.unwrap_or_default()
    }
}

/// Paths embedded in the general options blob
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MountPaths {
    /// Filestore mount path
    pub data_dir: String,
    /// Backup mount path
    pub backup_dir: String,
}

impl Default for MountPaths {
    fn default() -> Self {
        Self {
            data_dir: mount_path_for(VOLUME_DATA),
            backup_dir: mount_path_for(VOLUME_BACKUP),
        }
    }
}

/// Render the `default` blob
pub fn render_default(settings: &DefaultSettings) -> String {
    format!(
        "[options]\n\
         ; Operator defaults\n\
         without_demo = {}\n\
         server_wide_modules = {}\n\
         db_name = {}\n\
         db_template = {}\n\
         list_db = {}\n\
         dbfilter = {}\n\
         publisher_warranty_url = {}\n\
         log_level = {}\n",
        settings.without_demo,
        settings.server_wide_modules,
        settings.db_name,
        settings.db_template,
        settings.list_db,
        settings.dbfilter,
        settings.publisher_warranty_url,
        settings.log_level,
    )
}

/// Render the `options` blob
pub fn render_options(paths: &MountPaths, overrides: Overrides<'_>) -> String {
    format!(
        "[options]\n\
         data_dir = {}\n\
         backup_dir = {}\n\
         ; From cluster spec\n\
         {}\n\
         ; From track spec\n\
         {}\n",
        paths.data_dir,
        paths.backup_dir,
        overrides.cluster_or_empty(),
        overrides.track_or_empty(),
    )
}

/// Render the `integrator` blob
pub fn render_integrator(overrides: Overrides<'_>) -> String {
    format!(
        "[options]\n\
         ; Integrator options from cluster spec\n\
         {}\n\
         ; Integrator options from track spec\n\
         {}\n",
        overrides.cluster_or_empty(),
        overrides.track_or_empty(),
    )
}

/// Render the `custom` blob
pub fn render_custom(overrides: Overrides<'_>) -> String {
    format!(
        "[options]\n\
         ; Custom options from cluster spec\n\
         {}\n\
         ; Custom options from track spec\n\
         {}\n",
        overrides.cluster_or_empty(),
        overrides.track_or_empty(),
    )
}
