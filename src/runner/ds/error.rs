use thiserror::Error;

/// Every failure the object and scope runtime can raise.
///
/// All kinds are terminal at the point they are raised; nothing here is retried.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProtoError {
    #[error("ambiguous class name: {name}")]
    AmbiguousImport { name: String },

    #[error("invalid element in imports map: {name} ({element})")]
    InvalidImportElement { name: String, element: String },

    #[error("variable already defined within scope: {declared} {name}")]
    DuplicateTypedBinding { name: String, declared: String },

    #[error("cannot assign {found} to '{name}' of type: {expected}")]
    BindingTypeMismatch {
        name: String,
        expected: String,
        found: String,
    },

    #[error("unable to resolve variable '{name}'")]
    UnresolvableName { name: String },

    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error("lookup of '{name}' in namespace '{namespace}' failed: {reason}")]
    SymbolLookup {
        namespace: String,
        name: String,
        reason: String,
    },

    #[error("cannot convert value of {from} to {to}: {reason}")]
    Conversion {
        from: String,
        to: String,
        reason: String,
    },

    #[error("evaluation failed: {0}")]
    Evaluation(String),

    #[error("import config error: {0}")]
    Config(String),
}

impl ProtoError {
    pub fn unresolvable(name: impl Into<String>) -> Self {
        ProtoError::UnresolvableName { name: name.into() }
    }

    pub fn is_unresolvable(&self) -> bool {
        matches!(self, ProtoError::UnresolvableName { .. })
    }
}
