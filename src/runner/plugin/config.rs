//! Import configuration file parsing.

use std::fs;
use std::path::Path;

use indexmap::IndexMap;

use super::namespace_table::NamespaceTable;
use crate::runner::ds::error::ProtoError;

/// Complete import configuration.
#[derive(Debug, Clone, Default)]
pub struct ImportConfig {
    /// Namespaces to scan for names without a static import.
    pub packages: Vec<String>,
    /// Static type imports (key: bare name, value: qualified type name).
    pub types: IndexMap<String, String>,
    /// Types defined by each namespace, used to locate package imports.
    pub namespaces: IndexMap<String, Vec<String>>,
}

impl ImportConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a TOML file.
    ///
    /// Expected format:
    /// ```toml
    /// [imports]
    /// packages = ["app.model", "app.util"]
    ///
    /// [imports.types]
    /// Point = "geom.Point"
    ///
    /// [namespaces]
    /// "app.model" = ["Customer", "Order"]
    /// "app.util" = ["Dates"]
    /// ```
    pub fn load(path: &Path) -> Result<Self, ProtoError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ProtoError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, ProtoError> {
        let mut config = ImportConfig::new();
        if content.trim().is_empty() {
            return Ok(config);
        }
        let value: toml::Value = toml::from_str(content)
            .map_err(|e| ProtoError::Config(format!("failed to parse import config: {}", e)))?;

        if let Some(imports) = value.get("imports") {
            let imports = imports
                .as_table()
                .ok_or_else(|| ProtoError::Config("[imports] must be a table".to_string()))?;
            if let Some(packages) = imports.get("packages") {
                config.packages = string_list(packages, "imports.packages")?;
            }
            if let Some(types) = imports.get("types") {
                let types = types.as_table().ok_or_else(|| {
                    ProtoError::Config("[imports.types] must be a table".to_string())
                })?;
                for (name, qualified) in types {
                    let qualified = qualified.as_str().ok_or_else(|| {
                        ProtoError::Config(format!("imports.types.{} must be a string", name))
                    })?;
                    config.types.insert(name.clone(), qualified.to_string());
                }
            }
        }

        if let Some(namespaces) = value.get("namespaces") {
            let namespaces = namespaces
                .as_table()
                .ok_or_else(|| ProtoError::Config("[namespaces] must be a table".to_string()))?;
            for (namespace, names) in namespaces {
                let names = string_list(names, &format!("namespaces.{}", namespace))?;
                config.namespaces.insert(namespace.clone(), names);
            }
        }

        Ok(config)
    }

    /// The namespace table described by `[namespaces]`.
    pub fn namespace_table(&self) -> NamespaceTable {
        self.namespaces
            .iter()
            .fold(NamespaceTable::new(), |table, (namespace, names)| {
                table.with_types(namespace, names.iter().cloned())
            })
    }
}

fn string_list(value: &toml::Value, key: &str) -> Result<Vec<String>, ProtoError> {
    let items = value
        .as_array()
        .ok_or_else(|| ProtoError::Config(format!("{} must be an array", key)))?;
    items
        .iter()
        .map(|item| {
            item.as_str()
                .map(str::to_string)
                .ok_or_else(|| ProtoError::Config(format!("{} must contain only strings", key)))
        })
        .collect()
}
