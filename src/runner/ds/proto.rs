//! Prototype definitions: the "classes" of prototype objects.

use std::fmt;
use std::fmt::{Display, Formatter};
use std::rc::Rc;

use indexmap::IndexMap;
use log::debug;

use crate::runner::ds::error::ProtoError;
use crate::runner::ds::proto_instance::{PrototypeInstance, Receiver};
use crate::runner::ds::scope::ScopeFactory;
use crate::runner::ds::value::Value;
use crate::runner::plugin::types::{EvalContext, ExecutableStatement, Function};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiverKind {
    Function,
    MappedMethod,
    Property,
}

/// Definition-level description of one named member of a prototype.
#[derive(Clone)]
pub enum ReceiverSpec {
    Function(Rc<dyn Function>),
    /// Reserved. Mapped-method receivers have no dispatch behavior yet.
    MappedMethod,
    /// A property, initialized once per instance. Without an initializer it starts as null.
    Property(Option<Rc<dyn ExecutableStatement>>),
}

impl ReceiverSpec {
    pub fn kind(&self) -> ReceiverKind {
        match self {
            ReceiverSpec::Function(_) => ReceiverKind::Function,
            ReceiverSpec::MappedMethod => ReceiverKind::MappedMethod,
            ReceiverSpec::Property(_) => ReceiverKind::Property,
        }
    }

    /// Materialize the instance-level state for this receiver.
    ///
    /// Property initializers run here, exactly once per instance.
    pub(crate) fn materialize(
        &self,
        ctx: &mut EvalContext,
        this: &Value,
        scope: &dyn ScopeFactory,
    ) -> Result<Receiver, ProtoError> {
        Ok(match self {
            ReceiverSpec::Function(f) => Receiver::Function(f.clone()),
            ReceiverSpec::MappedMethod => Receiver::MappedMethod,
            ReceiverSpec::Property(Some(init)) => Receiver::Property(init.evaluate(ctx, this, scope)?),
            ReceiverSpec::Property(None) => Receiver::Property(Value::Null),
        })
    }
}

/// A named, ordered set of receivers shared by every instance created from it.
pub struct PrototypeDefinition {
    name: String,
    receivers: IndexMap<String, ReceiverSpec>,
}

impl PrototypeDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        PrototypeDefinition {
            name: name.into(),
            receivers: IndexMap::new(),
        }
    }

    /// Declare a function receiver. Re-declaring a name replaces the earlier receiver.
    pub fn with_function(mut self, name: impl Into<String>, function: Rc<dyn Function>) -> Self {
        self.declare(name.into(), ReceiverSpec::Function(function));
        self
    }

    /// Declare a property receiver whose value is computed by `initializer` at instantiation.
    pub fn with_property(
        mut self,
        name: impl Into<String>,
        initializer: Rc<dyn ExecutableStatement>,
    ) -> Self {
        self.declare(name.into(), ReceiverSpec::Property(Some(initializer)));
        self
    }

    /// Declare a property receiver that starts as null.
    pub fn with_empty_property(mut self, name: impl Into<String>) -> Self {
        self.declare(name.into(), ReceiverSpec::Property(None));
        self
    }

    pub fn with_mapped_method(mut self, name: impl Into<String>) -> Self {
        self.declare(name.into(), ReceiverSpec::MappedMethod);
        self
    }

    fn declare(&mut self, name: String, spec: ReceiverSpec) {
        if self.receivers.insert(name.clone(), spec).is_some() {
            debug!("proto {}: receiver '{}' redeclared", self.name, name);
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn receivers(&self) -> &IndexMap<String, ReceiverSpec> {
        &self.receivers
    }

    pub fn receiver(&self, name: &str) -> Option<&ReceiverSpec> {
        self.receivers.get(name)
    }

    pub fn len(&self) -> usize {
        self.receivers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.receivers.is_empty()
    }

    /// Name this definition into `scope`, the way a `proto` declaration does when evaluated.
    pub fn declare_in(self: &Rc<Self>, scope: &dyn ScopeFactory) -> Result<Value, ProtoError> {
        let value = Value::Prototype(self.clone());
        scope.create_variable(&self.name, value.clone())?;
        Ok(value)
    }

    /// Create an instance. Initializers are evaluated against `(ctx, this, scope)`.
    pub fn new_instance(
        self: &Rc<Self>,
        ctx: &mut EvalContext,
        this: &Value,
        scope: &dyn ScopeFactory,
    ) -> Result<Rc<PrototypeInstance>, ProtoError> {
        PrototypeInstance::create(self.clone(), ctx, this, scope, None)
    }

    /// Like [`new_instance`](Self::new_instance), with the instance scope chained below
    /// `enclosing` for names the instance does not own.
    ///
    /// Only a weak link is kept; the caller keeps `enclosing` alive.
    pub fn new_instance_within(
        self: &Rc<Self>,
        ctx: &mut EvalContext,
        this: &Value,
        scope: &dyn ScopeFactory,
        enclosing: &Rc<dyn ScopeFactory>,
    ) -> Result<Rc<PrototypeInstance>, ProtoError> {
        let enclosing = Rc::downgrade(enclosing);
        PrototypeInstance::create(self.clone(), ctx, this, scope, Some(enclosing))
    }
}

impl Display for PrototypeDefinition {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "proto {}", self.name)
    }
}
