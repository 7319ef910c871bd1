//! Global namespace handling.
//!
//! The global namespace is the set of values every template sees under one
//! binding. It comes from the configuration document and can be
//! overridden from the command line.

use std::fs;
use std::path::Path;

use serde_json::{Map, Value};

use crate::error::{Result, TgenError};

use super::DocumentFormat;

/// Name → value mapping exposed to templates.
pub type Namespace = Map<String, Value>;

/// Merge `overrides` on top of `base`. Top-level keys in `overrides` win.
pub fn merge(base: &Namespace, overrides: &Namespace) -> Namespace {
    let mut merged = base.clone();
    for (key, value) in overrides {
        merged.insert(key.clone(), value.clone());
    }
    merged
}

/// A command-line override of the global namespace.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GlobalOverride {
    namespace: Namespace,
}

impl GlobalOverride {
    /// Parse an override given either as an inline JSON object or as a
    /// path to a JSON/YAML document holding an object.
    pub fn parse(text: &str) -> Result<Self> {
        let trimmed = text.trim();

        if trimmed.starts_with('{') {
            let namespace = serde_json::from_str(trimmed).map_err(|e| TgenError::Configuration {
                message: format!("Invalid global namespace literal: {}", e),
                help: Some("Pass a JSON object such as '{\"name\": \"value\"}'".to_string()),
            })?;
            return Ok(Self { namespace });
        }

        let path = Path::new(trimmed);
        if path.is_file() {
            return Self::load(path);
        }

        Err(TgenError::Configuration {
            message: format!("Global namespace override \"{}\" is neither a JSON object nor a file", trimmed),
            help: None,
        })
    }

    /// Load an override document from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            TgenError::config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let namespace: Namespace = DocumentFormat::for_path(path).parse(&content, path)?;
        Ok(Self { namespace })
    }

    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }
}

impl From<Namespace> for GlobalOverride {
    fn from(namespace: Namespace) -> Self {
        Self { namespace }
    }
}
