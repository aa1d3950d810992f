//! Import resolution and the contracts shared with the host engine.
//!
//! This module implements the **import registry** - the compile-time table the surrounding
//! compiler consults whenever it meets a bare name that might denote a type or a callable.
//!
//! ## Resolution Order
//!
//! ```text
//! Import Lookup Order:
//! 1. Static imports (registered by name)
//! 2. Literal keywords (String, int, ...; never this/self/empty/null/nil/true/false)
//! 3. Package imports  ← every registered namespace is searched through a SymbolLocator
//! ```
//!
//! ### Key Components
//!
//! - **[`ImportRegistry`]**: static table plus package imports
//! - **[`SymbolLocator`]**: trait answering "does namespace N define type T?"
//! - **[`NamespaceTable`]**: table-backed locator
//! - **[`ImportConfig`]**: TOML import configuration
//! - **[`EvalContext`](types::EvalContext)**: context threaded through initializers and calls
//!
//! ### Package Scanning
//!
//! A name with no static import is looked up in every package import:
//!
//! 1. **No hit**: the name is not an import
//! 2. **One hit**: the type is cached as a static import and the name resolves
//! 3. **Several hits**: the name is ambiguous and resolution fails
//!
//! Only hits are cached. A miss or an ambiguity is rescanned on the next reference.
//!
//! ## Example: Custom Locator
//!
//! ```
//! use protoscope::runner::plugin::resolver::SymbolLocator;
//! use protoscope::runner::plugin::registry::ImportRegistry;
//! use protoscope::runner::ds::error::ProtoError;
//! use protoscope::runner::ds::value::TypeHandle;
//!
//! struct GeometryLocator;
//!
//! impl SymbolLocator for GeometryLocator {
//!     fn try_resolve(&self, namespace: &str, name: &str)
//!         -> Result<Option<TypeHandle>, ProtoError> {
//!         if namespace == "geom" && (name == "Point" || name == "Line") {
//!             Ok(Some(TypeHandle::qualified(namespace, name)))
//!         } else {
//!             Ok(None)
//!         }
//!     }
//!
//!     fn name(&self) -> &str { "geometry" }
//! }
//!
//! let mut imports = ImportRegistry::with_locator(Box::new(GeometryLocator));
//! imports.add_package_import("geom");
//! assert!(imports.has_import("Point").unwrap());
//! assert_eq!(imports.get_import("Point").unwrap().name(), "geom.Point");
//! ```

pub mod config;
pub mod literals;
pub mod namespace_table;
pub mod registry;
pub mod resolver;
pub mod types;

pub use config::ImportConfig;
pub use namespace_table::NamespaceTable;
pub use registry::{Import, ImportRegistry};
pub use resolver::SymbolLocator;
pub use types::{CallableStub, EvalContext, ExecutableStatement, Function, NativeFn, NativeFunction};
