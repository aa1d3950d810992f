//! Table-backed symbol locator: namespaces and the type names each one defines.

use std::collections::{HashMap, HashSet};

use crate::runner::ds::error::ProtoError;
use crate::runner::ds::value::TypeHandle;
use crate::runner::plugin::resolver::SymbolLocator;

/// Wraps a namespace → type-names table as a [`SymbolLocator`].
pub struct NamespaceTable {
    namespaces: HashMap<String, HashSet<String>>,
}

impl NamespaceTable {
    pub fn new() -> Self {
        NamespaceTable {
            namespaces: HashMap::new(),
        }
    }

    /// Record that `namespace` defines a type named `simple_name`.
    pub fn define(&mut self, namespace: impl Into<String>, simple_name: impl Into<String>) {
        self.namespaces
            .entry(namespace.into())
            .or_insert_with(HashSet::new)
            .insert(simple_name.into());
    }

    pub fn with_types<I, S>(mut self, namespace: &str, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for name in names {
            self.define(namespace, name);
        }
        self
    }

    pub fn has_namespace(&self, namespace: &str) -> bool {
        self.namespaces.contains_key(namespace)
    }
}

impl Default for NamespaceTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolLocator for NamespaceTable {
    fn try_resolve(
        &self,
        namespace: &str,
        simple_name: &str,
    ) -> Result<Option<TypeHandle>, ProtoError> {
        Ok(self
            .namespaces
            .get(namespace)
            .filter(|names| names.contains(simple_name))
            .map(|_| TypeHandle::qualified(namespace, simple_name)))
    }

    fn name(&self) -> &str {
        "namespace-table"
    }
}
