use std::fmt;
use std::fmt::{Display, Formatter};
use std::rc::Rc;

use crate::runner::ds::operations::type_conversion::{
    TYPE_STR_BOOLEAN, TYPE_STR_FLOAT, TYPE_STR_FUNCTION, TYPE_STR_INTEGER, TYPE_STR_NULL,
    TYPE_STR_PROTO, TYPE_STR_STRING, TYPE_STR_STUB, TYPE_STR_TYPE,
};
use crate::runner::ds::proto::PrototypeDefinition;
use crate::runner::ds::proto_instance::PrototypeInstance;
use crate::runner::plugin::types::{CallableStub, Function};

/// A runtime type, identified by name.
///
/// Built-in types use the `TYPE_STR_*` names. Types found by package scanning carry their
/// qualified `<namespace>.<Name>` name, and prototype instances are typed by their prototype's
/// name.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct TypeHandle {
    name: Rc<str>,
}

impl TypeHandle {
    pub fn named(name: impl AsRef<str>) -> Self {
        TypeHandle {
            name: Rc::from(name.as_ref()),
        }
    }

    pub fn qualified(namespace: &str, simple_name: &str) -> Self {
        TypeHandle::named(format!("{}.{}", namespace, simple_name))
    }

    pub fn integer() -> Self {
        TypeHandle::named(TYPE_STR_INTEGER)
    }

    pub fn float() -> Self {
        TypeHandle::named(TYPE_STR_FLOAT)
    }

    pub fn boolean() -> Self {
        TypeHandle::named(TYPE_STR_BOOLEAN)
    }

    pub fn string() -> Self {
        TypeHandle::named(TYPE_STR_STRING)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The last dotted segment of the name.
    pub fn simple_name(&self) -> &str {
        match self.name.rfind('.') {
            Some(idx) => &self.name[idx + 1..],
            None => &self.name,
        }
    }
}

impl Display for TypeHandle {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

impl fmt::Debug for TypeHandle {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "TypeHandle({})", self.name)
    }
}

#[derive(Clone)]
pub enum Value {
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Type(TypeHandle),
    Function(Rc<dyn Function>),
    Stub(CallableStub),
    Prototype(Rc<PrototypeDefinition>),
    Instance(Rc<PrototypeInstance>),
}

impl Value {
    /// Runtime type of the value. `Null` is untyped and satisfies every constraint.
    pub fn type_handle(&self) -> Option<TypeHandle> {
        match self {
            Value::Null => None,
            Value::Boolean(_) => Some(TypeHandle::boolean()),
            Value::Integer(_) => Some(TypeHandle::integer()),
            Value::Float(_) => Some(TypeHandle::float()),
            Value::String(_) => Some(TypeHandle::string()),
            Value::Type(_) => Some(TypeHandle::named(TYPE_STR_TYPE)),
            Value::Function(_) => Some(TypeHandle::named(TYPE_STR_FUNCTION)),
            Value::Stub(_) => Some(TypeHandle::named(TYPE_STR_STUB)),
            Value::Prototype(_) => Some(TypeHandle::named(TYPE_STR_PROTO)),
            Value::Instance(i) => Some(TypeHandle::named(i.definition().name())),
        }
    }

    pub fn type_name(&self) -> String {
        match self.type_handle() {
            Some(t) => t.name().to_string(),
            None => TYPE_STR_NULL.to_string(),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "{}", TYPE_STR_NULL),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Float(n) => write!(f, "{}", n),
            Value::String(s) => write!(f, "\"{}\"", s),
            Value::Type(t) => write!(f, "{}", t),
            Value::Function(func) => write!(f, "function {}", func.name()),
            Value::Stub(s) => write!(f, "stub {}", s.name()),
            Value::Prototype(p) => write!(f, "{}", p),
            Value::Instance(i) => write!(f, "{}", i),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "Value::Null"),
            Value::Boolean(b) => write!(f, "Value::Boolean({})", b),
            Value::Integer(i) => write!(f, "Value::Integer({})", i),
            Value::Float(n) => write!(f, "Value::Float({})", n),
            Value::String(s) => write!(f, "Value::String({:?})", s),
            Value::Type(t) => write!(f, "Value::Type({})", t),
            Value::Function(func) => write!(f, "Value::Function({})", func.name()),
            Value::Stub(s) => write!(f, "Value::Stub({})", s.name()),
            Value::Prototype(p) => write!(f, "Value::Prototype({})", p.name()),
            Value::Instance(i) => write!(f, "Value::Instance({})", i.id()),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Type(a), Value::Type(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Stub(a), Value::Stub(b)) => a == b,
            (Value::Prototype(a), Value::Prototype(b)) => Rc::ptr_eq(a, b),
            (Value::Instance(a), Value::Instance(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Float(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<TypeHandle> for Value {
    fn from(t: TypeHandle) -> Self {
        Value::Type(t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_name() {
        assert_eq!(TypeHandle::named("app.model.Customer").simple_name(), "Customer");
        assert_eq!(TypeHandle::integer().simple_name(), "int");
        assert_eq!(TypeHandle::qualified("geom", "Point").name(), "geom.Point");
    }

    #[test]
    fn test_null_is_untyped() {
        assert_eq!(Value::Null.type_handle(), None);
        assert_eq!(Value::Null.type_name(), TYPE_STR_NULL);
        assert_eq!(Value::from(1.5).type_handle(), Some(TypeHandle::float()));
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::from("a").to_string(), "\"a\"");
        assert_eq!(Value::Type(TypeHandle::named("geom.Point")).to_string(), "geom.Point");
        assert_eq!(Value::Null.to_string(), "null");
    }
}
