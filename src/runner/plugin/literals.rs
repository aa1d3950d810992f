//! Literal keywords known to the import table.

use std::collections::HashMap;

use crate::runner::ds::operations::type_conversion::{
    TYPE_STR_BOOLEAN, TYPE_STR_FLOAT, TYPE_STR_FUNCTION, TYPE_STR_INTEGER, TYPE_STR_STRING,
    TYPE_STR_TYPE,
};
use crate::runner::ds::value::TypeHandle;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Literal {
    Type(&'static str),
    Null,
    Boolean(bool),
    This,
    Empty,
}

impl Literal {
    pub fn type_handle(&self) -> Option<TypeHandle> {
        match self {
            Literal::Type(name) => Some(TypeHandle::named(*name)),
            _ => None,
        }
    }
}

/// Literal words that are never importable names.
pub const RESERVED_LITERALS: [&str; 7] = ["this", "self", "empty", "null", "nil", "true", "false"];

lazy_static! {
    pub static ref LITERALS: HashMap<&'static str, Literal> = {
        let mut m = HashMap::new();
        m.insert("this", Literal::This);
        m.insert("self", Literal::This);
        m.insert("empty", Literal::Empty);
        m.insert("null", Literal::Null);
        m.insert("nil", Literal::Null);
        m.insert("true", Literal::Boolean(true));
        m.insert("false", Literal::Boolean(false));

        m.insert("String", Literal::Type(TYPE_STR_STRING));
        m.insert("string", Literal::Type(TYPE_STR_STRING));
        m.insert("int", Literal::Type(TYPE_STR_INTEGER));
        m.insert("Integer", Literal::Type(TYPE_STR_INTEGER));
        m.insert("long", Literal::Type(TYPE_STR_INTEGER));
        m.insert("Long", Literal::Type(TYPE_STR_INTEGER));
        m.insert("float", Literal::Type(TYPE_STR_FLOAT));
        m.insert("Float", Literal::Type(TYPE_STR_FLOAT));
        m.insert("double", Literal::Type(TYPE_STR_FLOAT));
        m.insert("Double", Literal::Type(TYPE_STR_FLOAT));
        m.insert("boolean", Literal::Type(TYPE_STR_BOOLEAN));
        m.insert("Boolean", Literal::Type(TYPE_STR_BOOLEAN));
        m.insert("Class", Literal::Type(TYPE_STR_TYPE));
        m.insert("Function", Literal::Type(TYPE_STR_FUNCTION));
        m
    };
}

pub fn is_reserved(name: &str) -> bool {
    RESERVED_LITERALS.contains(&name)
}
