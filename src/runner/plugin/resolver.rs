//! Symbol locator trait for dynamic, package-scanned import resolution.
//!
//! When a bare name has no static import, the import registry asks its locator whether each
//! registered namespace defines a type of that name. Locators stand in for whatever native
//! lookup the host has (a module table, a plugin registry, ...).

use crate::runner::ds::error::ProtoError;
use crate::runner::ds::value::TypeHandle;

pub trait SymbolLocator {
    /// Look for a type `<namespace>.<simple_name>`.
    ///
    /// `Ok(None)` is the ordinary "not in this namespace" answer and is not an error.
    /// `Err` is reserved for lookups that failed unexpectedly; the registry propagates it
    /// without consulting further namespaces.
    fn try_resolve(&self, namespace: &str, simple_name: &str)
        -> Result<Option<TypeHandle>, ProtoError>;

    /// Human-readable name for this locator (for debugging/logging).
    fn name(&self) -> &str;
}
