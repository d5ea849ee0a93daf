//! Desired-state synthesis for OdooCluster managed resources
//!
//! Given an OdooCluster and a selector naming one of its tracks, tiers or
//! volumes, derives the desired shape of every dependent resource, detects
//! drift against the live object, and stamps ownership:
//! - `config`: layered configuration merge and INI rendering
//! - `secrets`: credential bundle rendering
//! - `resources`: per-kind desired-state builders
//! - `syncer`: field-by-field change detection
//! - `owner`: controller back-references
//! - `builder`: the dispatcher tying the above together
//! - `store`: the get/persist port used by the external reconcile loop
//!
//! The watch loop, finalizers and status reporting live in the host binary.

#![deny(missing_docs)]

pub mod builder;
pub mod config;
pub mod naming;
pub mod owner;
pub mod resources;
pub mod secrets;
pub mod store;
pub mod syncer;

pub use builder::{synthesize, ManagedObject, Synthesized, Synthesizer};
pub use config::templates::DefaultSettings;
pub use resources::Selector;
pub use store::{reconcile_resource, KubeStore, ResourceStore};
pub use syncer::{Managed, ResourceKind};

// Re-export common error types
pub use odoo_common::{Error, Result};
