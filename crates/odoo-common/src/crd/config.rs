//! Structured configuration values
//!
//! A `ConfigValue` is either a terminal scalar or a named sub-tree, which lets
//! each override layer (cluster, track, version) express nested `[a:b]`
//! sections of the generated configuration file.

use std::collections::BTreeMap;
use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};

/// A nested mapping of configuration keys
pub type ConfigTree = BTreeMap<String, ConfigValue>;

/// Terminal configuration value
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(untagged)]
pub enum ConfigScalar {
    /// Boolean flag, rendered as `True` / `False`
    Bool(bool),
    /// Integer value
    Int(i64),
    /// Floating point value
    Float(f64),
    /// Free-form string; an explicit null decodes as the empty string
    String(#[serde(deserialize_with = "string_or_null")] String),
}

fn string_or_null<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl fmt::Display for ConfigScalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(true) => write!(f, "True"),
            Self::Bool(false) => write!(f, "False"),
            Self::Int(i) => write!(f, "{i}"),
            // Debug keeps the fraction of whole floats (`1.0`, not `1`)
            Self::Float(x) => write!(f, "{x:?}"),
            Self::String(s) => write!(f, "{s}"),
        }
    }
}

/// A configuration entry: a leaf scalar or a section of further entries
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(untagged)]
pub enum ConfigValue {
    /// Terminal value
    Leaf(ConfigScalar),
    /// Named sub-tree
    Section(ConfigTree),
}

impl JsonSchema for ConfigValue {
    fn schema_name() -> String {
        "ConfigValue".to_string()
    }

    fn json_schema(_gen: &mut schemars::gen::SchemaGenerator) -> schemars::schema::Schema {
        // Scalars or arbitrarily nested sections; checked when deserialized
        schemars::schema::Schema::Object(schemars::schema::SchemaObject {
            metadata: Some(Box::new(schemars::schema::Metadata {
                description: Some("Scalar value or nested section of settings".to_string()),
                ..Default::default()
            })),
            extensions: [(
                "x-kubernetes-preserve-unknown-fields".to_string(),
                serde_json::Value::Bool(true),
            )]
            .into_iter()
            .collect(),
            ..Default::default()
        })
    }
}

impl ConfigValue {
    /// Leaf holding a string
    pub fn string(value: impl Into<String>) -> Self {
        Self::Leaf(ConfigScalar::String(value.into()))
    }

    /// Empty section
    pub fn section() -> Self {
        Self::Section(ConfigTree::new())
    }

    /// Section built from key/value pairs
    pub fn section_from<K: Into<String>>(entries: impl IntoIterator<Item = (K, ConfigValue)>) -> Self {
        Self::Section(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Returns the sub-tree if this value is a section
    pub fn as_section(&self) -> Option<&ConfigTree> {
        match self {
            Self::Section(map) => Some(map),
            Self::Leaf(_) => None,
        }
    }

    /// String projection of a leaf; `None` for sections
    pub fn to_leaf_string(&self) -> Option<String> {
        match self {
            Self::Leaf(scalar) => Some(scalar.to_string()),
            Self::Section(_) => None,
        }
    }
}

impl From<&str> for ConfigValue {
    fn from(value: &str) -> Self {
        Self::string(value)
    }
}

impl From<bool> for ConfigValue {
    fn from(value: bool) -> Self {
        Self::Leaf(ConfigScalar::Bool(value))
    }
}

impl From<i64> for ConfigValue {
    fn from(value: i64) -> Self {
        Self::Leaf(ConfigScalar::Int(value))
    }
}
