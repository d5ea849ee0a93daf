//! Configuration merge tree
//!
//! Structured settings are contributed at three levels (cluster, track,
//! version). They are merged into a single tree in that order so that the
//! more specific level always wins, then serialized into the INI dialect the
//! Odoo server reads: `[section]` / `[section:subsection]` headers followed by
//! `key = value` lines.

pub mod templates;

use odoo_common::crd::{ConfigTree, ConfigValue};

/// Merge `source` into `target`.
///
/// Sections are merged recursively, creating an empty section in `target`
/// when the key is absent. Leaves overwrite unconditionally. A section
/// arriving on a key that currently holds a leaf replaces the leaf.
pub fn merge(target: &mut ConfigTree, source: &ConfigTree) {
    for (key, value) in source {
        match value {
            ConfigValue::Section(sub) => {
                let entry = target
                    .entry(key.clone())
                    .or_insert_with(ConfigValue::section);
                if entry.as_section().is_none() {
                    *entry = ConfigValue::section();
                }
                if let ConfigValue::Section(existing) = entry {
                    merge(existing, sub);
                }
            }
            ConfigValue::Leaf(_) => {
                target.insert(key.clone(), value.clone());
            }
        }
    }
}

/// Merge override layers in precedence order, lowest first.
pub fn merge_layers<'a>(layers: impl IntoIterator<Item = &'a ConfigTree>) -> ConfigTree {
    let mut merged = ConfigTree::new();
    for layer in layers {
        merge(&mut merged, layer);
    }
    merged
}

/// Serialize a merged tree.
///
/// Leaves directly under `section_prefix` are written first (without a header
/// when the prefix is empty). Nested sections are walked depth-first and named
/// `parent:child`. A header is only written for sections that hold at least
/// one leaf.
pub fn serialize(tree: &ConfigTree, section_prefix: &str) -> String {
    let mut sections = Vec::new();
    collect_sections(tree, section_prefix, &mut sections);

    let mut out = String::new();
    for (name, leaves) in sections {
        if leaves.is_empty() {
            continue;
        }
        if !out.is_empty() {
            out.push('\n');
        }
        if !name.is_empty() {
            out.push_str(&format!("[{name}]\n"));
        }
        for (key, value) in leaves {
            out.push_str(&format!("{key} = {value}\n"));
        }
    }
    out
}

fn collect_sections<'a>(
    tree: &'a ConfigTree,
    prefix: &str,
    out: &mut Vec<(String, Vec<(&'a str, String)>)>,
) {
    let leaves = tree
        .iter()
        .filter_map(|(k, v)| v.to_leaf_string().map(|s| (k.as_str(), s)))
        .collect();
    out.push((prefix.to_string(), leaves));

    for (key, value) in tree {
        if let Some(sub) = value.as_section() {
            let name = if prefix.is_empty() {
                key.clone()
            } else {
                format!("{prefix}:{key}")
            };
            collect_sections(sub, &name, out);
        }
    }
}
