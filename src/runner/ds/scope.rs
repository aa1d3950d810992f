//! Scope chains and variable bindings.
//!
//! A scope resolves a bare name to a [`VariableBinding`], falling back to its parent scope when
//! the name is not its own. Chains are assembled once, innermost first, and are never re-linked:
//! a [`MapScope`] borrows its parent for the duration of the frame, so the chain mirrors the
//! native call stack.

use std::cell::{OnceCell, RefCell};
use std::rc::{Rc, Weak};

use indexmap::IndexMap;
use log::trace;

use crate::runner::ds::error::ProtoError;
use crate::runner::ds::operations::type_conversion::ConversionRegistry;
use crate::runner::ds::proto_instance::ReceiverSlot;
use crate::runner::ds::value::{TypeHandle, Value};

pub trait ScopeFactory {
    /// Resolve `name` to its binding, searching this scope and then its parents.
    fn get_variable_resolver(&self, name: &str) -> Result<Rc<VariableBinding>, ProtoError>;

    /// Assign `value` to `name` without introducing a declared type.
    fn create_variable(&self, name: &str, value: Value) -> Result<Rc<VariableBinding>, ProtoError>;

    /// Declare `name` with an explicit type and assign `value` to it.
    fn create_typed_variable(
        &self,
        name: &str,
        value: Value,
        declared: &TypeHandle,
    ) -> Result<Rc<VariableBinding>, ProtoError>;

    fn is_resolveable(&self, name: &str) -> bool;

    /// Whether a new declaration of `name` is anchored in this scope.
    fn is_target(&self, name: &str) -> bool;

    fn next_factory(&self) -> Option<&dyn ScopeFactory>;

    fn get_value(&self, name: &str) -> Result<Value, ProtoError> {
        self.get_variable_resolver(name)?.value()
    }

    fn set_value(&self, name: &str, value: Value) -> Result<(), ProtoError> {
        self.get_variable_resolver(name)?.set_value(value)
    }
}

/// Where a binding keeps its value.
pub enum BindingTarget {
    /// A receiver slot of a prototype instance. Not owned: the instance owns its slots.
    Slot(Weak<ReceiverSlot>),
    /// A plain variable of a map-backed frame.
    Local(RefCell<Value>),
}

pub struct VariableBinding {
    name: String,
    declared_type: OnceCell<TypeHandle>,
    target: BindingTarget,
    conversions: Rc<ConversionRegistry>,
}

impl VariableBinding {
    pub fn for_slot(
        name: impl Into<String>,
        slot: &Rc<ReceiverSlot>,
        conversions: Rc<ConversionRegistry>,
    ) -> Self {
        VariableBinding {
            name: name.into(),
            declared_type: OnceCell::new(),
            target: BindingTarget::Slot(Rc::downgrade(slot)),
            conversions,
        }
    }

    pub fn local(name: impl Into<String>, value: Value, conversions: Rc<ConversionRegistry>) -> Self {
        VariableBinding {
            name: name.into(),
            declared_type: OnceCell::new(),
            target: BindingTarget::Local(RefCell::new(value)),
            conversions,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn declared_type(&self) -> Option<&TypeHandle> {
        self.declared_type.get()
    }

    /// The slot this binding wraps, if it wraps a live one.
    pub fn slot(&self) -> Option<Rc<ReceiverSlot>> {
        match &self.target {
            BindingTarget::Slot(slot) => slot.upgrade(),
            BindingTarget::Local(_) => None,
        }
    }

    pub fn value(&self) -> Result<Value, ProtoError> {
        match &self.target {
            BindingTarget::Slot(_) => self.live_slot()?.value(),
            BindingTarget::Local(cell) => Ok(cell.borrow().clone()),
        }
    }

    /// Assign `value`, coercing it to the declared type if one is set.
    ///
    /// On failure the stored value is left untouched.
    pub fn set_value(&self, value: Value) -> Result<(), ProtoError> {
        let value = match self.declared_type.get() {
            Some(declared) => self.coerce(value, declared)?,
            None => value,
        };
        self.store(value)
    }

    /// Fix the declared type of this binding and assign `value` under it.
    ///
    /// The type is only recorded once the value has been accepted.
    pub fn declare(&self, declared: TypeHandle, value: Value) -> Result<(), ProtoError> {
        if let Some(existing) = self.declared_type.get() {
            return Err(ProtoError::DuplicateTypedBinding {
                name: self.name.clone(),
                declared: existing.to_string(),
            });
        }
        let value = self.coerce(value, &declared)?;
        self.store(value)?;
        trace!("declared '{}' as {}", self.name, declared);
        let _ = self.declared_type.set(declared);
        Ok(())
    }

    fn coerce(&self, value: Value, declared: &TypeHandle) -> Result<Value, ProtoError> {
        let found = match value.type_handle() {
            None => return Ok(value),
            Some(found) if &found == declared => return Ok(value),
            Some(found) => found,
        };
        let mismatch = || ProtoError::BindingTypeMismatch {
            name: self.name.clone(),
            expected: declared.to_string(),
            found: found.to_string(),
        };
        if !self.conversions.can_convert(declared, &found) {
            return Err(mismatch());
        }
        self.conversions
            .convert(value, declared)
            .map_err(|_| mismatch())
    }

    fn store(&self, value: Value) -> Result<(), ProtoError> {
        match &self.target {
            BindingTarget::Slot(_) => self.live_slot()?.store(value),
            BindingTarget::Local(cell) => {
                *cell.borrow_mut() = value;
                Ok(())
            }
        }
    }

    fn live_slot(&self) -> Result<Rc<ReceiverSlot>, ProtoError> {
        self.slot()
            .ok_or_else(|| ProtoError::unresolvable(self.name.as_str()))
    }
}

/// A map-backed scope frame: the root scope of an evaluation, or a local frame chained
/// below another scope.
///
/// This is the only kind of scope where assigning to an unknown name creates a variable.
pub struct MapScope<'p> {
    variables: RefCell<IndexMap<String, Rc<VariableBinding>>>,
    parent: Option<&'p dyn ScopeFactory>,
    conversions: Rc<ConversionRegistry>,
}

impl MapScope<'static> {
    pub fn root(conversions: Rc<ConversionRegistry>) -> Self {
        MapScope {
            variables: RefCell::new(IndexMap::new()),
            parent: None,
            conversions,
        }
    }
}

impl<'p> MapScope<'p> {
    pub fn with_parent(parent: &'p dyn ScopeFactory, conversions: Rc<ConversionRegistry>) -> Self {
        MapScope {
            variables: RefCell::new(IndexMap::new()),
            parent: Some(parent),
            conversions,
        }
    }

    /// Names declared in this frame, in declaration order.
    pub fn names(&self) -> Vec<String> {
        self.variables.borrow().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.variables.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.borrow().is_empty()
    }

    fn own(&self, name: &str) -> Option<Rc<VariableBinding>> {
        self.variables.borrow().get(name).cloned()
    }

    fn insert(&self, binding: Rc<VariableBinding>) {
        trace!("created variable '{}'", binding.name());
        self.variables
            .borrow_mut()
            .insert(binding.name().to_string(), binding);
    }
}

impl<'p> ScopeFactory for MapScope<'p> {
    fn get_variable_resolver(&self, name: &str) -> Result<Rc<VariableBinding>, ProtoError> {
        if let Some(binding) = self.own(name) {
            return Ok(binding);
        }
        match self.parent {
            Some(parent) => parent.get_variable_resolver(name),
            None => Err(ProtoError::unresolvable(name)),
        }
    }

    fn create_variable(&self, name: &str, value: Value) -> Result<Rc<VariableBinding>, ProtoError> {
        match self.get_variable_resolver(name) {
            Ok(binding) => {
                binding.set_value(value)?;
                Ok(binding)
            }
            Err(e) if e.is_unresolvable() => {
                let binding = Rc::new(VariableBinding::local(name, value, self.conversions.clone()));
                self.insert(binding.clone());
                Ok(binding)
            }
            Err(e) => Err(e),
        }
    }

    fn create_typed_variable(
        &self,
        name: &str,
        value: Value,
        declared: &TypeHandle,
    ) -> Result<Rc<VariableBinding>, ProtoError> {
        if let Some(binding) = self.own(name) {
            binding.declare(declared.clone(), value)?;
            return Ok(binding);
        }
        let binding = Rc::new(VariableBinding::local(
            name,
            Value::Null,
            self.conversions.clone(),
        ));
        binding.declare(declared.clone(), value)?;
        self.insert(binding.clone());
        Ok(binding)
    }

    fn is_resolveable(&self, name: &str) -> bool {
        self.variables.borrow().contains_key(name)
            || self.parent.map_or(false, |p| p.is_resolveable(name))
    }

    fn is_target(&self, name: &str) -> bool {
        self.variables.borrow().contains_key(name)
    }

    fn next_factory(&self) -> Option<&dyn ScopeFactory> {
        self.parent
    }
}
