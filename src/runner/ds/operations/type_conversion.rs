use std::collections::HashMap;

use crate::runner::ds::error::ProtoError;
use crate::runner::ds::value::{TypeHandle, Value};

pub const TYPE_STR_NULL: &str = "null";
pub const TYPE_STR_BOOLEAN: &str = "boolean";
pub const TYPE_STR_INTEGER: &str = "int";
pub const TYPE_STR_FLOAT: &str = "float";
pub const TYPE_STR_STRING: &str = "string";
pub const TYPE_STR_TYPE: &str = "type";
pub const TYPE_STR_FUNCTION: &str = "function";
pub const TYPE_STR_STUB: &str = "stub";
pub const TYPE_STR_PROTO: &str = "proto";

/// Signature of a registered coercion.
pub type ConvertFn = fn(value: &Value) -> Result<Value, ProtoError>;

/// Coercions consulted when a value is assigned to a typed binding.
pub struct ConversionRegistry {
    converters: HashMap<(TypeHandle, TypeHandle), ConvertFn>,
}

impl ConversionRegistry {
    /// A registry without any coercions.
    pub fn new() -> Self {
        ConversionRegistry {
            converters: HashMap::new(),
        }
    }

    /// A registry holding the numeric, boolean and string coercions.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(TypeHandle::integer(), TypeHandle::float(), integer_to_float);
        registry.register(TypeHandle::float(), TypeHandle::integer(), float_to_integer);
        registry.register(TypeHandle::integer(), TypeHandle::string(), to_string_value);
        registry.register(TypeHandle::float(), TypeHandle::string(), to_string_value);
        registry.register(TypeHandle::boolean(), TypeHandle::string(), to_string_value);
        registry.register(TypeHandle::string(), TypeHandle::integer(), string_to_integer);
        registry.register(TypeHandle::string(), TypeHandle::float(), string_to_float);
        registry.register(TypeHandle::string(), TypeHandle::boolean(), string_to_boolean);
        registry.register(TypeHandle::integer(), TypeHandle::boolean(), integer_to_boolean);
        registry.register(TypeHandle::boolean(), TypeHandle::integer(), boolean_to_integer);
        registry
    }

    /// Register (or replace) the coercion from `from` to `to`.
    pub fn register(&mut self, from: TypeHandle, to: TypeHandle, convert: ConvertFn) {
        self.converters.insert((from, to), convert);
    }

    pub fn can_convert(&self, to: &TypeHandle, from: &TypeHandle) -> bool {
        from == to || self.converters.contains_key(&(from.clone(), to.clone()))
    }

    /// Convert `value` to `to`. Untyped values and values already of type `to` pass through.
    pub fn convert(&self, value: Value, to: &TypeHandle) -> Result<Value, ProtoError> {
        let from = match value.type_handle() {
            None => return Ok(value),
            Some(from) if &from == to => return Ok(value),
            Some(from) => from,
        };
        match self.converters.get(&(from.clone(), to.clone())) {
            Some(convert) => convert(&value),
            None => Err(conversion_error(&from, to, "no conversion registered")),
        }
    }
}

impl Default for ConversionRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

fn conversion_error(from: &TypeHandle, to: &TypeHandle, reason: impl Into<String>) -> ProtoError {
    ProtoError::Conversion {
        from: from.name().to_string(),
        to: to.name().to_string(),
        reason: reason.into(),
    }
}

fn integer_to_float(v: &Value) -> Result<Value, ProtoError> {
    match v {
        Value::Integer(i) => Ok(Value::Float(*i as f64)),
        _ => Err(unexpected(v, &TypeHandle::float())),
    }
}

fn float_to_integer(v: &Value) -> Result<Value, ProtoError> {
    match v {
        Value::Float(f) if !f.is_finite() => Err(conversion_error(
            &TypeHandle::float(),
            &TypeHandle::integer(),
            format!("{} has no integer value", f),
        )),
        // i64::MAX rounds up to 2^63 as f64, so the upper bound is exclusive.
        Value::Float(f) if *f >= i64::MIN as f64 && *f < i64::MAX as f64 => {
            Ok(Value::Integer(f.trunc() as i64))
        }
        Value::Float(f) => Err(conversion_error(
            &TypeHandle::float(),
            &TypeHandle::integer(),
            format!("{} is out of integer range", f),
        )),
        _ => Err(unexpected(v, &TypeHandle::integer())),
    }
}

fn to_string_value(v: &Value) -> Result<Value, ProtoError> {
    match v {
        Value::Integer(i) => Ok(Value::String(i.to_string())),
        Value::Float(f) => Ok(Value::String(f.to_string())),
        Value::Boolean(b) => Ok(Value::String(b.to_string())),
        _ => Err(unexpected(v, &TypeHandle::string())),
    }
}

fn string_to_integer(v: &Value) -> Result<Value, ProtoError> {
    match v {
        Value::String(s) => s.trim().parse::<i64>().map(Value::Integer).map_err(|e| {
            conversion_error(&TypeHandle::string(), &TypeHandle::integer(), e.to_string())
        }),
        _ => Err(unexpected(v, &TypeHandle::integer())),
    }
}

fn string_to_float(v: &Value) -> Result<Value, ProtoError> {
    match v {
        Value::String(s) => s.trim().parse::<f64>().map(Value::Float).map_err(|e| {
            conversion_error(&TypeHandle::string(), &TypeHandle::float(), e.to_string())
        }),
        _ => Err(unexpected(v, &TypeHandle::float())),
    }
}

fn string_to_boolean(v: &Value) -> Result<Value, ProtoError> {
    match v {
        Value::String(s) => match s.trim() {
            "true" => Ok(Value::Boolean(true)),
            "false" => Ok(Value::Boolean(false)),
            other => Err(conversion_error(
                &TypeHandle::string(),
                &TypeHandle::boolean(),
                format!("'{}' is not a boolean", other),
            )),
        },
        _ => Err(unexpected(v, &TypeHandle::boolean())),
    }
}

fn integer_to_boolean(v: &Value) -> Result<Value, ProtoError> {
    match v {
        Value::Integer(i) => Ok(Value::Boolean(*i != 0)),
        _ => Err(unexpected(v, &TypeHandle::boolean())),
    }
}

fn boolean_to_integer(v: &Value) -> Result<Value, ProtoError> {
    match v {
        Value::Boolean(b) => Ok(Value::Integer(if *b { 1 } else { 0 })),
        _ => Err(unexpected(v, &TypeHandle::integer())),
    }
}

fn unexpected(v: &Value, to: &TypeHandle) -> ProtoError {
    ProtoError::Conversion {
        from: v.type_name(),
        to: to.name().to_string(),
        reason: "unexpected source value".to_string(),
    }
}
