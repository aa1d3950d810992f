//! Prototype instances, their receiver slots, and the scope that exposes those slots to
//! evaluated code.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::fmt::{Display, Formatter};
use std::rc::{Rc, Weak};

use indexmap::IndexMap;
use log::{debug, trace};
use uuid::Uuid;

use crate::runner::ds::call_context::CallContext;
use crate::runner::ds::error::ProtoError;
use crate::runner::ds::operations::type_conversion::ConversionRegistry;
use crate::runner::ds::proto::{PrototypeDefinition, ReceiverKind};
use crate::runner::ds::scope::{ScopeFactory, VariableBinding};
use crate::runner::ds::value::{TypeHandle, Value};
use crate::runner::plugin::types::{EvalContext, Function};

pub type SlotMap = IndexMap<String, Rc<ReceiverSlot>>;

/// Live state of one receiver.
#[derive(Clone)]
pub enum Receiver {
    Function(Rc<dyn Function>),
    Property(Value),
    MappedMethod,
}

/// Per-instance storage cell backing one receiver.
///
/// Every binding that resolves the receiver's name observes this same slot.
pub struct ReceiverSlot {
    name: String,
    receiver: RefCell<Receiver>,
    owner: RefCell<Weak<PrototypeInstance>>,
}

impl ReceiverSlot {
    /// A property slot not yet attached to any instance.
    pub fn property(name: impl Into<String>, value: Value) -> Rc<Self> {
        Rc::new(ReceiverSlot::attached(name.into(), Receiver::Property(value), Weak::new()))
    }

    /// A function slot not yet attached to any instance.
    pub fn function(name: impl Into<String>, function: Rc<dyn Function>) -> Rc<Self> {
        Rc::new(ReceiverSlot::attached(name.into(), Receiver::Function(function), Weak::new()))
    }

    fn attached(name: String, receiver: Receiver, owner: Weak<PrototypeInstance>) -> Self {
        ReceiverSlot {
            name,
            receiver: RefCell::new(receiver),
            owner: RefCell::new(owner),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ReceiverKind {
        match &*self.receiver.borrow() {
            Receiver::Function(_) => ReceiverKind::Function,
            Receiver::Property(_) => ReceiverKind::Property,
            Receiver::MappedMethod => ReceiverKind::MappedMethod,
        }
    }

    pub fn owner(&self) -> Option<Rc<PrototypeInstance>> {
        self.owner.borrow().upgrade()
    }

    fn adopt(&self, owner: Weak<PrototypeInstance>) {
        *self.owner.borrow_mut() = owner;
    }

    /// The current property value, or the function itself for function receivers.
    pub fn value(&self) -> Result<Value, ProtoError> {
        match &*self.receiver.borrow() {
            Receiver::Function(f) => Ok(Value::Function(f.clone())),
            Receiver::Property(v) => Ok(v.clone()),
            Receiver::MappedMethod => Err(mapped_method_unsupported(&self.name)),
        }
    }

    /// Replace the slot's state in place.
    ///
    /// A function receiver assigned a non-function value becomes a property.
    pub(crate) fn store(&self, value: Value) -> Result<(), ProtoError> {
        let replacement = match (self.kind(), value) {
            (ReceiverKind::MappedMethod, _) => return Err(mapped_method_unsupported(&self.name)),
            (ReceiverKind::Function, Value::Function(f)) => Receiver::Function(f),
            (_, value) => Receiver::Property(value),
        };
        *self.receiver.borrow_mut() = replacement;
        Ok(())
    }

    /// Dispatch a call on this receiver.
    ///
    /// Functions run against a [`CallContext`] bridging `caller_scope` with the owning
    /// instance's scope. Properties return their value and ignore `args`.
    pub fn call(
        &self,
        ctx: &mut EvalContext,
        this: &Value,
        caller_scope: &dyn ScopeFactory,
        args: &[Value],
    ) -> Result<Value, ProtoError> {
        let function = match &*self.receiver.borrow() {
            Receiver::Function(f) => f.clone(),
            Receiver::Property(v) => return Ok(v.clone()),
            Receiver::MappedMethod => return Err(mapped_method_unsupported(&self.name)),
        };
        let instance = self.owner().ok_or_else(|| {
            ProtoError::UnsupportedOperation(format!(
                "receiver '{}' is not attached to an instance",
                self.name
            ))
        })?;
        trace!("calling {}.{}", instance.definition().name(), self.name);
        let bridge = CallContext::new(caller_scope, instance.scope());
        function.call(ctx, this, &bridge, args)
    }
}

impl fmt::Debug for ReceiverSlot {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "ReceiverSlot({}: {:?})", self.name, self.kind())
    }
}

fn mapped_method_unsupported(name: &str) -> ProtoError {
    ProtoError::UnsupportedOperation(format!("mapped method receiver '{}'", name))
}

/// One object created from a [`PrototypeDefinition`].
pub struct PrototypeInstance {
    id: Uuid,
    definition: Rc<PrototypeDefinition>,
    slots: Rc<RefCell<SlotMap>>,
    scope: InstanceScope,
    this: Weak<PrototypeInstance>,
}

impl PrototypeInstance {
    pub(crate) fn create(
        definition: Rc<PrototypeDefinition>,
        ctx: &mut EvalContext,
        this: &Value,
        scope: &dyn ScopeFactory,
        enclosing: Option<Weak<dyn ScopeFactory>>,
    ) -> Result<Rc<Self>, ProtoError> {
        let mut materialized = Vec::with_capacity(definition.len());
        for (name, spec) in definition.receivers() {
            materialized.push((name.clone(), spec.materialize(ctx, this, scope)?));
        }
        let conversions = ctx.conversions().clone();

        let instance = Rc::new_cyclic(|me: &Weak<PrototypeInstance>| {
            let slots: SlotMap = materialized
                .into_iter()
                .map(|(name, receiver)| {
                    let slot = ReceiverSlot::attached(name.clone(), receiver, me.clone());
                    (name, Rc::new(slot))
                })
                .collect();
            let slots = Rc::new(RefCell::new(slots));
            PrototypeInstance {
                id: Uuid::new_v4(),
                definition,
                scope: InstanceScope::new(slots.clone(), conversions, enclosing),
                slots,
                this: me.clone(),
            }
        });
        debug!("created {} with {} receivers", instance, instance.size());
        Ok(instance)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn definition(&self) -> &Rc<PrototypeDefinition> {
        &self.definition
    }

    pub fn scope(&self) -> &InstanceScope {
        &self.scope
    }

    /// Call the receiver `name` with `caller_scope` as the caller's live scope.
    pub fn invoke(
        &self,
        name: &str,
        ctx: &mut EvalContext,
        this: &Value,
        caller_scope: &dyn ScopeFactory,
        args: &[Value],
    ) -> Result<Value, ProtoError> {
        let slot = self.get(name).ok_or_else(|| ProtoError::unresolvable(name))?;
        slot.call(ctx, this, caller_scope, args)
    }

    pub fn size(&self) -> usize {
        self.slots.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.borrow().is_empty()
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.slots.borrow().contains_key(name)
    }

    /// Slot identity, not value equality.
    pub fn contains_value(&self, slot: &Rc<ReceiverSlot>) -> bool {
        self.slots.borrow().values().any(|s| Rc::ptr_eq(s, slot))
    }

    pub fn get(&self, name: &str) -> Option<Rc<ReceiverSlot>> {
        self.slots.borrow().get(name).cloned()
    }

    pub fn keys(&self) -> Vec<String> {
        self.slots.borrow().keys().cloned().collect()
    }

    pub fn values(&self) -> Vec<Rc<ReceiverSlot>> {
        self.slots.borrow().values().cloned().collect()
    }

    pub fn entries(&self) -> Vec<(String, Rc<ReceiverSlot>)> {
        self.slots
            .borrow()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Install `slot` under `name`, attaching it to this instance. Returns the replaced slot.
    pub fn put(&self, name: impl Into<String>, slot: Rc<ReceiverSlot>) -> Option<Rc<ReceiverSlot>> {
        let name = name.into();
        slot.adopt(self.this.clone());
        self.scope.forget(&name);
        self.slots.borrow_mut().insert(name, slot)
    }

    pub fn remove(&self, name: &str) -> Option<Rc<ReceiverSlot>> {
        self.scope.forget(name);
        self.slots.borrow_mut().shift_remove(name)
    }

    pub fn put_all<I>(&self, _entries: I) -> Result<(), ProtoError>
    where
        I: IntoIterator<Item = (String, Rc<ReceiverSlot>)>,
    {
        Err(ProtoError::UnsupportedOperation(
            "put_all on a prototype instance".to_string(),
        ))
    }

    pub fn clear(&self) -> Result<(), ProtoError> {
        Err(ProtoError::UnsupportedOperation(
            "clear on a prototype instance".to_string(),
        ))
    }
}

impl Display for PrototypeInstance {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}@{}",
            self.definition.name(),
            self.id.to_hyphenated()
        )
    }
}

/// Scope over the slots of one prototype instance.
///
/// Bindings are materialized on first lookup and cached, so repeated lookups of a name hand
/// out the same binding and its declared type survives between them.
///
/// The link to the enclosing scope is weak: the enclosing scope usually holds the instance,
/// and a dropped enclosing scope reads as no parent at all.
pub struct InstanceScope {
    slots: Rc<RefCell<SlotMap>>,
    resolvers: RefCell<HashMap<String, Rc<VariableBinding>>>,
    conversions: Rc<ConversionRegistry>,
    next: Option<Weak<dyn ScopeFactory>>,
}

impl InstanceScope {
    fn new(
        slots: Rc<RefCell<SlotMap>>,
        conversions: Rc<ConversionRegistry>,
        next: Option<Weak<dyn ScopeFactory>>,
    ) -> Self {
        InstanceScope {
            slots,
            resolvers: RefCell::new(HashMap::new()),
            conversions,
            next,
        }
    }

    /// Number of bindings materialized so far.
    pub fn cached_bindings(&self) -> usize {
        self.resolvers.borrow().len()
    }

    /// The enclosing scope, if one was given and is still alive.
    pub fn enclosing(&self) -> Option<Rc<dyn ScopeFactory>> {
        self.next.as_ref().and_then(Weak::upgrade)
    }

    fn forget(&self, name: &str) {
        self.resolvers.borrow_mut().remove(name);
    }

    fn own_binding(&self, name: &str) -> Option<Rc<VariableBinding>> {
        if let Some(binding) = self.resolvers.borrow().get(name) {
            return Some(binding.clone());
        }
        let slot = self.slots.borrow().get(name).cloned()?;
        trace!("materializing binding for receiver '{}'", name);
        let binding = Rc::new(VariableBinding::for_slot(
            name,
            &slot,
            self.conversions.clone(),
        ));
        self.resolvers
            .borrow_mut()
            .insert(name.to_string(), binding.clone());
        Some(binding)
    }
}

impl ScopeFactory for InstanceScope {
    fn get_variable_resolver(&self, name: &str) -> Result<Rc<VariableBinding>, ProtoError> {
        if let Some(binding) = self.own_binding(name) {
            return Ok(binding);
        }
        match self.enclosing() {
            Some(next) => next.get_variable_resolver(name),
            None => Err(ProtoError::unresolvable(name)),
        }
    }

    fn create_variable(&self, name: &str, value: Value) -> Result<Rc<VariableBinding>, ProtoError> {
        if let Some(binding) = self.own_binding(name) {
            binding.set_value(value)?;
            return Ok(binding);
        }
        match self.enclosing() {
            Some(next) => next.create_variable(name, value),
            None => Err(ProtoError::unresolvable(name)),
        }
    }

    fn create_typed_variable(
        &self,
        name: &str,
        value: Value,
        declared: &TypeHandle,
    ) -> Result<Rc<VariableBinding>, ProtoError> {
        if let Some(binding) = self.own_binding(name) {
            binding.declare(declared.clone(), value)?;
            return Ok(binding);
        }
        let next = match self.enclosing() {
            Some(next) => next,
            None => return Err(ProtoError::unresolvable(name)),
        };
        match next.get_variable_resolver(name) {
            Ok(binding) => {
                binding.declare(declared.clone(), value)?;
                Ok(binding)
            }
            Err(e) if e.is_unresolvable() => next.create_typed_variable(name, value, declared),
            Err(e) => Err(e),
        }
    }

    fn is_resolveable(&self, name: &str) -> bool {
        self.resolvers.borrow().contains_key(name)
            || self.slots.borrow().contains_key(name)
            || self.enclosing().map_or(false, |n| n.is_resolveable(name))
    }

    fn is_target(&self, name: &str) -> bool {
        self.slots.borrow().contains_key(name)
    }

    /// Always `None`: the enclosing link is weak and cannot be lent out. Use
    /// [`enclosing`](Self::enclosing) instead.
    fn next_factory(&self) -> Option<&dyn ScopeFactory> {
        None
    }
}
