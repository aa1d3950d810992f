use std::rc::Rc;

use crate::runner::ds::error::ProtoError;
use crate::runner::ds::scope::{ScopeFactory, VariableBinding};
use crate::runner::ds::value::{TypeHandle, Value};

/// Scope seen by a function receiver while it runs.
///
/// Merges the caller's live scope with the scope of the instance the function belongs to.
/// Instance state shadows caller state; a name reaches the caller only when the instance
/// cannot resolve it. Built per invocation and dropped when the call returns.
pub struct CallContext<'a> {
    caller: &'a dyn ScopeFactory,
    instance: &'a dyn ScopeFactory,
}

impl<'a> CallContext<'a> {
    pub fn new(caller: &'a dyn ScopeFactory, instance: &'a dyn ScopeFactory) -> Self {
        CallContext { caller, instance }
    }

    pub fn caller(&self) -> &'a dyn ScopeFactory {
        self.caller
    }

    pub fn instance(&self) -> &'a dyn ScopeFactory {
        self.instance
    }

    fn routes_to_caller(&self, name: &str) -> bool {
        self.caller.is_resolveable(name) && !self.instance.is_resolveable(name)
    }

    fn route(&self, name: &str) -> &'a dyn ScopeFactory {
        if self.routes_to_caller(name) {
            self.caller
        } else {
            self.instance
        }
    }
}

impl<'a> ScopeFactory for CallContext<'a> {
    fn get_variable_resolver(&self, name: &str) -> Result<Rc<VariableBinding>, ProtoError> {
        self.route(name).get_variable_resolver(name)
    }

    fn create_variable(&self, name: &str, value: Value) -> Result<Rc<VariableBinding>, ProtoError> {
        self.route(name).create_variable(name, value)
    }

    fn create_typed_variable(
        &self,
        name: &str,
        value: Value,
        declared: &TypeHandle,
    ) -> Result<Rc<VariableBinding>, ProtoError> {
        self.route(name).create_typed_variable(name, value, declared)
    }

    fn is_resolveable(&self, name: &str) -> bool {
        self.instance.is_resolveable(name) || self.caller.is_resolveable(name)
    }

    fn is_target(&self, name: &str) -> bool {
        self.instance.is_target(name)
    }

    fn next_factory(&self) -> Option<&dyn ScopeFactory> {
        Some(self.caller)
    }
}
