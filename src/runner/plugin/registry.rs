//! Import registry: the compile-time table that resolves bare names to types and callables.

use std::rc::Rc;

use indexmap::{IndexMap, IndexSet};
use log::debug;

use super::config::ImportConfig;
use super::literals::{is_reserved, LITERALS};
use super::namespace_table::NamespaceTable;
use super::resolver::SymbolLocator;
use super::types::{CallableStub, Function};
use crate::runner::ds::error::ProtoError;
use crate::runner::ds::value::{TypeHandle, Value};

/// A static import entry.
#[derive(Debug, Clone, PartialEq)]
pub enum Import {
    Type(TypeHandle),
    Callable(CallableStub),
}

/// Registry for imports.
///
/// Static imports are looked up by bare name. Names without a static import may still
/// resolve through the package imports: every registered namespace is searched with the
/// [`SymbolLocator`], and a unique hit is cached as a static import.
pub struct ImportRegistry {
    /// Static imports, in registration order.
    imports: IndexMap<String, Import>,

    /// Namespaces scanned for names without a static import.
    package_imports: IndexSet<String>,

    locator: Box<dyn SymbolLocator>,
}

impl ImportRegistry {
    /// An empty registry whose package scans never find anything.
    pub fn new() -> Self {
        Self::with_locator(Box::new(NamespaceTable::new()))
    }

    pub fn with_locator(locator: Box<dyn SymbolLocator>) -> Self {
        ImportRegistry {
            imports: IndexMap::new(),
            package_imports: IndexSet::new(),
            locator,
        }
    }

    /// Build a registry from an import config: its namespace table becomes the locator and
    /// its packages and type aliases are registered.
    pub fn from_config(config: &ImportConfig) -> Self {
        let mut registry = Self::with_locator(Box::new(config.namespace_table()));
        for package in &config.packages {
            registry.add_package_import(package.clone());
        }
        for (name, qualified) in &config.types {
            registry.add_import(name.clone(), TypeHandle::named(qualified));
        }
        registry
    }

    pub fn add_import(&mut self, name: impl Into<String>, ty: TypeHandle) {
        let name = name.into();
        debug!("import {} -> {}", name, ty);
        self.imports.insert(name, Import::Type(ty));
    }

    /// Import a type under its simple name.
    pub fn add_type_import(&mut self, ty: TypeHandle) {
        let name = ty.simple_name().to_string();
        self.add_import(name, ty);
    }

    pub fn add_callable_import(&mut self, name: impl Into<String>, stub: CallableStub) {
        let name = name.into();
        debug!("import {} -> callable {}", name, stub.name());
        self.imports.insert(name, Import::Callable(stub));
    }

    /// Import a function reference, wrapped as a callable stub.
    pub fn add_function_import(&mut self, name: impl Into<String>, function: Rc<dyn Function>) {
        self.add_callable_import(name, CallableStub::new(function));
    }

    pub fn add_package_import(&mut self, namespace: impl Into<String>) {
        self.package_imports.insert(namespace.into());
    }

    pub fn package_imports(&self) -> &IndexSet<String> {
        &self.package_imports
    }

    pub fn set_package_imports<I, S>(&mut self, namespaces: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.package_imports = namespaces.into_iter().map(Into::into).collect();
    }

    pub fn imports(&self) -> &IndexMap<String, Import> {
        &self.imports
    }

    pub fn has_imports(&self) -> bool {
        !self.imports.is_empty() || !self.package_imports.is_empty()
    }

    /// Bulk-load imports. Values must be types, function references or callable stubs.
    ///
    /// Not transactional: entries before the first invalid one stay registered.
    pub fn set_imports<I, K>(&mut self, entries: I) -> Result<(), ProtoError>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        for (name, value) in entries {
            let name = name.into();
            match value {
                Value::Type(ty) => self.add_import(name, ty),
                Value::Function(f) => self.add_function_import(name, f),
                Value::Stub(stub) => self.add_callable_import(name, stub),
                other => {
                    return Err(ProtoError::InvalidImportElement {
                        name,
                        element: other.to_string(),
                    })
                }
            }
        }
        Ok(())
    }

    /// Static type import, falling back to the literal keyword table.
    pub fn get_import(&self, name: &str) -> Option<TypeHandle> {
        match self.imports.get(name) {
            Some(Import::Type(ty)) => Some(ty.clone()),
            Some(Import::Callable(_)) => None,
            None => LITERALS.get(name).and_then(|l| l.type_handle()),
        }
    }

    pub fn get_static_import(&self, name: &str) -> Option<CallableStub> {
        match self.imports.get(name) {
            Some(Import::Callable(stub)) => Some(stub.clone()),
            _ => None,
        }
    }

    pub fn get_static_or_class_import(&self, name: &str) -> Option<Import> {
        match self.imports.get(name) {
            Some(import) => Some(import.clone()),
            None => LITERALS
                .get(name)
                .and_then(|l| l.type_handle())
                .map(Import::Type),
        }
    }

    /// Whether `name` resolves to an import.
    ///
    /// Tries the static table, then the literal keywords (reserved words excluded), then a
    /// scan of the package imports. A successful scan is cached as a static import.
    pub fn has_import(&mut self, name: &str) -> Result<bool, ProtoError> {
        if self.imports.contains_key(name) {
            return Ok(true);
        }
        if !is_reserved(name) && LITERALS.contains_key(name) {
            return Ok(true);
        }
        self.check_for_dynamic_import(name)
    }

    fn check_for_dynamic_import(&mut self, name: &str) -> Result<bool, ProtoError> {
        if self.package_imports.is_empty() {
            return Ok(false);
        }

        let mut found = 0;
        let mut resolved = None;
        for namespace in &self.package_imports {
            if let Some(ty) = self.locator.try_resolve(namespace, name)? {
                debug!("{}: found {} in {}", self.locator.name(), name, namespace);
                found += 1;
                resolved = Some(ty);
            }
        }

        match (found, resolved) {
            (0, _) | (_, None) => Ok(false),
            (1, Some(ty)) => {
                self.add_import(name, ty);
                Ok(true)
            }
            _ => Err(ProtoError::AmbiguousImport {
                name: name.to_string(),
            }),
        }
    }
}

impl Default for ImportRegistry {
    fn default() -> Self {
        Self::new()
    }
}
