//! Configuration bundle of a track
//!
//! Four fixed blobs (`default`, `options`, `integrator`, `custom`) rendered
//! from the cluster-level and track-level override strings, plus a
//! `settings` blob holding the merged structured settings when any layer
//! contributes some.

use std::collections::BTreeMap;

use odoo_common::crd::ConfigTree;
use odoo_common::Result;

use super::Scope;
use crate::config::templates::{
    render_custom, render_default, render_integrator, render_options, MountPaths, Overrides,
};
use crate::config::{merge_layers, serialize};

/// Bundle key of the operator defaults
pub const DEFAULT_CONFIG_KEY: &str = "default";

/// Bundle key of the general options
pub const OPTIONS_CONFIG_KEY: &str = "options";

/// Bundle key of the integrator options
pub const INTEGRATOR_CONFIG_KEY: &str = "integrator";

/// Bundle key of the custom options
pub const CUSTOM_CONFIG_KEY: &str = "custom";

/// Bundle key of the merged structured settings
pub const SETTINGS_CONFIG_KEY: &str = "settings";

/// Desired bundle data for the selected track
pub fn desired_data(scope: &Scope<'_>) -> Result<BTreeMap<String, String>> {
    let cluster = &scope.cluster.spec;
    let track = scope.track()?;

    let mut data = BTreeMap::from([
        (
            DEFAULT_CONFIG_KEY.to_string(),
            render_default(scope.defaults),
        ),
        (
            OPTIONS_CONFIG_KEY.to_string(),
            render_options(
                &MountPaths::default(),
                Overrides::new(cluster.config.as_deref(), track.config.as_deref()),
            ),
        ),
        (
            INTEGRATOR_CONFIG_KEY.to_string(),
            render_integrator(Overrides::new(
                cluster.integrator_config.as_deref(),
                track.integrator_config.as_deref(),
            )),
        ),
        (
            CUSTOM_CONFIG_KEY.to_string(),
            render_custom(Overrides::new(
                cluster.custom_config.as_deref(),
                track.custom_config.as_deref(),
            )),
        ),
    ]);

    let empty = ConfigTree::new();
    let version = track.version.as_ref().map_or(&empty, |v| &v.settings);
    let merged = merge_layers([&cluster.settings, &track.settings, version]);
    if !merged.is_empty() {
        data.insert(SETTINGS_CONFIG_KEY.to_string(), serialize(&merged, ""));
    }

    Ok(data)
}
