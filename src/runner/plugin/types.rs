//! Core types shared by the runtime and its external collaborators.

use std::fmt;
use std::rc::Rc;

use crate::runner::ds::error::ProtoError;
use crate::runner::ds::operations::type_conversion::ConversionRegistry;
use crate::runner::ds::scope::ScopeFactory;
use crate::runner::ds::value::Value;

/// Execution context passed to every initializer and function call.
pub struct EvalContext {
    /// The root object expressions are evaluated against, if any.
    pub context_object: Option<Value>,
    conversions: Rc<ConversionRegistry>,
}

impl EvalContext {
    pub fn new() -> Self {
        EvalContext {
            context_object: None,
            conversions: Rc::new(ConversionRegistry::with_defaults()),
        }
    }

    pub fn with_conversions(conversions: ConversionRegistry) -> Self {
        EvalContext {
            context_object: None,
            conversions: Rc::new(conversions),
        }
    }

    pub fn conversions(&self) -> &Rc<ConversionRegistry> {
        &self.conversions
    }
}

impl Default for EvalContext {
    fn default() -> Self {
        Self::new()
    }
}

/// A compiled expression, as produced by the parser. Used for property initializers.
pub trait ExecutableStatement {
    fn evaluate(
        &self,
        ctx: &mut EvalContext,
        this: &Value,
        scope: &dyn ScopeFactory,
    ) -> Result<Value, ProtoError>;
}

impl<F> ExecutableStatement for F
where
    F: Fn(&mut EvalContext, &Value, &dyn ScopeFactory) -> Result<Value, ProtoError>,
{
    fn evaluate(
        &self,
        ctx: &mut EvalContext,
        this: &Value,
        scope: &dyn ScopeFactory,
    ) -> Result<Value, ProtoError> {
        self(ctx, this, scope)
    }
}

/// Wraps a host closure as an initializer statement.
pub fn statement<F>(f: F) -> Rc<dyn ExecutableStatement>
where
    F: Fn(&mut EvalContext, &Value, &dyn ScopeFactory) -> Result<Value, ProtoError> + 'static,
{
    Rc::new(f)
}

/// A named callable. Function receivers store one of these and are invoked with the
/// call-bridging scope of the instance they belong to.
pub trait Function {
    fn name(&self) -> &str;

    fn call(
        &self,
        ctx: &mut EvalContext,
        this: &Value,
        scope: &dyn ScopeFactory,
        args: &[Value],
    ) -> Result<Value, ProtoError>;
}

/// Function signature for host-provided functions.
pub type NativeFn = fn(
    ctx: &mut EvalContext,
    this: &Value,
    scope: &dyn ScopeFactory,
    args: &[Value],
) -> Result<Value, ProtoError>;

/// Host-provided function body.
pub enum NativeBody {
    /// Direct function pointer.
    Native(NativeFn),

    /// Closure, for bodies that capture state.
    Closure(
        Box<dyn Fn(&mut EvalContext, &Value, &dyn ScopeFactory, &[Value]) -> Result<Value, ProtoError>>,
    ),
}

/// A `Function` implemented by the host.
pub struct NativeFunction {
    name: String,
    body: NativeBody,
}

impl NativeFunction {
    pub fn new(name: impl Into<String>, func: NativeFn) -> Self {
        NativeFunction {
            name: name.into(),
            body: NativeBody::Native(func),
        }
    }

    pub fn from_closure<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&mut EvalContext, &Value, &dyn ScopeFactory, &[Value]) -> Result<Value, ProtoError>
            + 'static,
    {
        NativeFunction {
            name: name.into(),
            body: NativeBody::Closure(Box::new(func)),
        }
    }

    pub fn into_rc(self) -> Rc<dyn Function> {
        Rc::new(self)
    }
}

impl Function for NativeFunction {
    fn name(&self) -> &str {
        &self.name
    }

    fn call(
        &self,
        ctx: &mut EvalContext,
        this: &Value,
        scope: &dyn ScopeFactory,
        args: &[Value],
    ) -> Result<Value, ProtoError> {
        match &self.body {
            NativeBody::Native(f) => f(ctx, this, scope, args),
            NativeBody::Closure(f) => f(ctx, this, scope, args),
        }
    }
}

/// A statically imported callable, registered in the import table under a bare name.
#[derive(Clone)]
pub struct CallableStub {
    name: String,
    target: Rc<dyn Function>,
}

impl CallableStub {
    pub fn new(target: Rc<dyn Function>) -> Self {
        CallableStub {
            name: target.name().to_string(),
            target,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn target(&self) -> &Rc<dyn Function> {
        &self.target
    }

    pub fn invoke(
        &self,
        ctx: &mut EvalContext,
        this: &Value,
        scope: &dyn ScopeFactory,
        args: &[Value],
    ) -> Result<Value, ProtoError> {
        self.target.call(ctx, this, scope, args)
    }
}

impl PartialEq for CallableStub {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.target, &other.target)
    }
}

impl fmt::Debug for CallableStub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CallableStub({})", self.name)
    }
}
