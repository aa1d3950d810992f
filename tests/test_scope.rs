extern crate protoscope;

use protoscope::runner::ds::error::ProtoError;
use protoscope::runner::ds::operations::type_conversion::ConversionRegistry;
use protoscope::runner::ds::proto::{PrototypeDefinition, ReceiverKind};
use protoscope::runner::ds::proto_instance::{PrototypeInstance, ReceiverSlot};
use protoscope::runner::ds::scope::{MapScope, ScopeFactory, VariableBinding};
use protoscope::runner::ds::value::{TypeHandle, Value};
use protoscope::runner::plugin::types::{statement, EvalContext, NativeFunction};
use std::rc::Rc;

/// Build a root scope sharing the context's conversions.
fn root(ctx: &EvalContext) -> MapScope<'static> {
    MapScope::root(ctx.conversions().clone())
}

/// `Point { x = 1, y = 2, label }`
fn point_definition() -> Rc<PrototypeDefinition> {
    Rc::new(
        PrototypeDefinition::new("Point")
            .with_property("x", statement(|_, _, _| Ok(Value::Integer(1))))
            .with_property("y", statement(|_, _, _| Ok(Value::Integer(2))))
            .with_empty_property("label"),
    )
}

fn new_point(ctx: &mut EvalContext) -> Rc<PrototypeInstance> {
    let globals = root(ctx);
    point_definition()
        .new_instance(ctx, &Value::Null, &globals)
        .unwrap()
}

// ── Root scope ───────────────────────────────────────────────────────

#[test]
fn test_root_assignment_creates() {
    let ctx = EvalContext::new();
    let globals = root(&ctx);

    assert!(!globals.is_resolveable("total"));
    globals.create_variable("total", Value::Integer(10)).unwrap();
    assert!(globals.is_resolveable("total"));
    assert!(globals.is_target("total"));
    assert_eq!(globals.get_value("total").unwrap(), Value::Integer(10));

    globals.create_variable("total", Value::Integer(11)).unwrap();
    assert_eq!(globals.len(), 1);
    assert_eq!(globals.get_value("total").unwrap(), Value::Integer(11));
}

#[test]
fn test_unresolvable_name() {
    let ctx = EvalContext::new();
    let globals = root(&ctx);

    let err = globals.get_variable_resolver("missing").err().unwrap();
    assert_eq!(err, ProtoError::unresolvable("missing"));
    assert!(matches!(
        globals.set_value("missing", Value::Null),
        Err(ProtoError::UnresolvableName { .. })
    ));
    assert!(globals.is_empty());
}

#[test]
fn test_child_frame_delegates_to_parent() {
    let ctx = EvalContext::new();
    let globals = root(&ctx);
    globals.create_variable("shared", Value::Integer(1)).unwrap();

    let frame = MapScope::with_parent(&globals, ctx.conversions().clone());
    assert!(frame.is_resolveable("shared"));
    assert!(!frame.is_target("shared"));
    assert_eq!(frame.get_value("shared").unwrap(), Value::Integer(1));

    frame.create_variable("shared", Value::Integer(2)).unwrap();
    assert_eq!(globals.get_value("shared").unwrap(), Value::Integer(2));
    assert!(frame.is_empty());

    frame.create_variable("local", Value::Boolean(true)).unwrap();
    assert_eq!(frame.names(), vec!["local".to_string()]);
    assert!(!globals.is_resolveable("local"));
    assert!(frame.next_factory().is_some());
}

// ── Typed bindings ───────────────────────────────────────────────────

#[test]
fn test_typed_mismatch_leaves_value_unchanged() {
    let ctx = EvalContext::new();
    let globals = root(&ctx);
    globals
        .create_typed_variable("n", Value::Integer(1), &TypeHandle::integer())
        .unwrap();

    let err = globals
        .set_value("n", Value::Type(TypeHandle::string()))
        .unwrap_err();
    assert_eq!(
        err,
        ProtoError::BindingTypeMismatch {
            name: "n".to_string(),
            expected: "int".to_string(),
            found: "type".to_string(),
        }
    );
    assert_eq!(globals.get_value("n").unwrap(), Value::Integer(1));
}

#[test]
fn test_failing_coercion_is_a_mismatch() {
    let ctx = EvalContext::new();
    let globals = root(&ctx);
    globals
        .create_typed_variable("n", Value::Integer(1), &TypeHandle::integer())
        .unwrap();

    let err = globals.set_value("n", Value::from("forty-two")).unwrap_err();
    assert!(matches!(err, ProtoError::BindingTypeMismatch { .. }));
    assert_eq!(globals.get_value("n").unwrap(), Value::Integer(1));
}

#[test]
fn test_out_of_range_float_is_a_mismatch() {
    let ctx = EvalContext::new();
    let globals = root(&ctx);
    globals
        .create_typed_variable("n", Value::Integer(1), &TypeHandle::integer())
        .unwrap();

    let err = globals.set_value("n", Value::Float(1e300)).unwrap_err();
    assert!(matches!(err, ProtoError::BindingTypeMismatch { .. }));
    assert_eq!(globals.get_value("n").unwrap(), Value::Integer(1));
}

#[test]
fn test_convertible_value_is_stored_converted() {
    let ctx = EvalContext::new();
    let globals = root(&ctx);
    globals
        .create_typed_variable("ratio", Value::Integer(2), &TypeHandle::float())
        .unwrap();
    assert_eq!(globals.get_value("ratio").unwrap(), Value::Float(2.0));

    globals.set_value("ratio", Value::from("0.5")).unwrap();
    assert_eq!(globals.get_value("ratio").unwrap(), Value::Float(0.5));
}

#[test]
fn test_null_satisfies_any_declared_type() {
    let ctx = EvalContext::new();
    let globals = root(&ctx);
    globals
        .create_typed_variable("s", Value::from("text"), &TypeHandle::string())
        .unwrap();
    globals.set_value("s", Value::Null).unwrap();
    assert_eq!(globals.get_value("s").unwrap(), Value::Null);
}

#[test]
fn test_duplicate_typed_declaration() {
    let ctx = EvalContext::new();
    let globals = root(&ctx);
    globals
        .create_typed_variable("n", Value::Integer(1), &TypeHandle::integer())
        .unwrap();

    let err = globals
        .create_typed_variable("n", Value::Integer(2), &TypeHandle::integer())
        .err()
        .unwrap();
    assert_eq!(
        err,
        ProtoError::DuplicateTypedBinding {
            name: "n".to_string(),
            declared: "int".to_string(),
        }
    );
    assert_eq!(globals.get_value("n").unwrap(), Value::Integer(1));

    globals.create_variable("n", Value::from("9")).unwrap();
    assert_eq!(globals.get_value("n").unwrap(), Value::Integer(9));
}

#[test]
fn test_untyped_binding_can_be_declared_later() {
    let ctx = EvalContext::new();
    let globals = root(&ctx);
    globals.create_variable("n", Value::from("5")).unwrap();

    let binding = globals
        .create_typed_variable("n", Value::from("7"), &TypeHandle::integer())
        .unwrap();
    assert_eq!(binding.declared_type(), Some(&TypeHandle::integer()));
    assert_eq!(globals.get_value("n").unwrap(), Value::Integer(7));
}

#[test]
fn test_rejected_declaration_records_nothing() {
    let ctx = EvalContext::new();
    let globals = root(&ctx);

    let err = globals
        .create_typed_variable("flag", Value::from("maybe"), &TypeHandle::boolean())
        .err()
        .unwrap();
    assert!(matches!(err, ProtoError::BindingTypeMismatch { .. }));
    assert!(!globals.is_target("flag"));

    globals.create_variable("n", Value::Type(TypeHandle::string())).unwrap();
    assert!(globals
        .create_typed_variable("n", Value::Type(TypeHandle::string()), &TypeHandle::integer())
        .is_err());
    let binding = globals.get_variable_resolver("n").unwrap();
    assert_eq!(binding.declared_type(), None);
}

#[test]
fn test_custom_conversions() {
    let mut conversions = ConversionRegistry::new();
    conversions.register(TypeHandle::boolean(), TypeHandle::string(), |v| match v {
        Value::Boolean(true) => Ok(Value::from("yes")),
        _ => Ok(Value::from("no")),
    });
    let ctx = EvalContext::with_conversions(conversions);
    let globals = root(&ctx);
    globals
        .create_typed_variable("answer", Value::Boolean(true), &TypeHandle::string())
        .unwrap();
    assert_eq!(globals.get_value("answer").unwrap(), Value::from("yes"));

    assert!(globals.set_value("answer", Value::Integer(1)).is_err());
}

// ── Instance scopes ──────────────────────────────────────────────────

#[test]
fn test_instance_bindings_are_cached() {
    let mut ctx = EvalContext::new();
    let point = new_point(&mut ctx);
    let scope = point.scope();

    assert_eq!(scope.cached_bindings(), 0);
    let first = scope.get_variable_resolver("x").unwrap();
    let second = scope.get_variable_resolver("x").unwrap();
    assert!(Rc::ptr_eq(&first, &second));
    assert_eq!(scope.cached_bindings(), 1);
}

#[test]
fn test_bindings_share_the_slot() {
    let mut ctx = EvalContext::new();
    let point = new_point(&mut ctx);

    point.scope().set_value("x", Value::Integer(40)).unwrap();
    assert_eq!(point.get("x").unwrap().value().unwrap(), Value::Integer(40));

    let slot = point.get("y").unwrap();
    let a = VariableBinding::for_slot("y", &slot, ctx.conversions().clone());
    let b = VariableBinding::for_slot("y", &slot, ctx.conversions().clone());
    a.set_value(Value::Integer(7)).unwrap();
    assert_eq!(b.value().unwrap(), Value::Integer(7));
    assert_eq!(point.scope().get_value("y").unwrap(), Value::Integer(7));
}

#[test]
fn test_typed_instance_binding() {
    let mut ctx = EvalContext::new();
    let point = new_point(&mut ctx);
    let scope = point.scope();

    scope
        .create_typed_variable("label", Value::Integer(3), &TypeHandle::string())
        .unwrap();
    assert_eq!(scope.get_value("label").unwrap(), Value::from("3"));

    assert!(matches!(
        scope.create_typed_variable("label", Value::from("a"), &TypeHandle::string()),
        Err(ProtoError::DuplicateTypedBinding { .. })
    ));

    assert!(scope.set_value("label", Value::Type(TypeHandle::integer())).is_err());
    assert_eq!(scope.get_value("label").unwrap(), Value::from("3"));
}

#[test]
fn test_instance_scope_does_not_grow() {
    let mut ctx = EvalContext::new();
    let point = new_point(&mut ctx);
    let scope = point.scope();

    assert!(scope.is_target("x"));
    assert!(!scope.is_target("z"));
    assert!(scope
        .create_variable("z", Value::Integer(0))
        .err()
        .unwrap()
        .is_unresolvable());
    assert!(scope
        .create_typed_variable("z", Value::Integer(0), &TypeHandle::integer())
        .is_err());
    assert_eq!(point.size(), 3);
}

#[test]
fn test_enclosing_scope_creates_unknown_names() {
    let mut ctx = EvalContext::new();
    let globals: Rc<dyn ScopeFactory> = Rc::new(root(&ctx));
    globals.create_variable("origin", Value::Integer(0)).unwrap();

    let point = point_definition()
        .new_instance_within(&mut ctx, &Value::Null, &*globals, &globals)
        .unwrap();
    let scope = point.scope();

    assert_eq!(scope.get_value("origin").unwrap(), Value::Integer(0));
    assert!(scope.is_resolveable("origin"));
    assert!(!scope.is_target("origin"));

    scope.create_variable("z", Value::Integer(9)).unwrap();
    assert_eq!(globals.get_value("z").unwrap(), Value::Integer(9));
    assert!(!point.contains_key("z"));

    scope
        .create_typed_variable("w", Value::Integer(1), &TypeHandle::float())
        .unwrap();
    assert_eq!(globals.get_value("w").unwrap(), Value::Float(1.0));
}

#[test]
fn test_instance_does_not_keep_enclosing_scope_alive() {
    let mut ctx = EvalContext::new();
    let globals: Rc<dyn ScopeFactory> = Rc::new(root(&ctx));
    let point = point_definition()
        .new_instance_within(&mut ctx, &Value::Null, &*globals, &globals)
        .unwrap();
    globals
        .create_variable("p", Value::Instance(point.clone()))
        .unwrap();

    let weak_globals = Rc::downgrade(&globals);
    let weak_point = Rc::downgrade(&point);
    drop(point);
    drop(globals);

    assert!(weak_globals.upgrade().is_none());
    assert!(weak_point.upgrade().is_none());
}

#[test]
fn test_dropped_enclosing_scope_reads_as_no_parent() {
    let mut ctx = EvalContext::new();
    let globals: Rc<dyn ScopeFactory> = Rc::new(root(&ctx));
    globals.create_variable("origin", Value::Integer(0)).unwrap();
    let point = point_definition()
        .new_instance_within(&mut ctx, &Value::Null, &*globals, &globals)
        .unwrap();
    assert!(point.scope().enclosing().is_some());

    drop(globals);
    let scope = point.scope();
    assert!(scope.enclosing().is_none());
    assert!(!scope.is_resolveable("origin"));
    assert!(scope.get_value("origin").unwrap_err().is_unresolvable());
    assert!(scope
        .create_variable("z", Value::Integer(1))
        .err()
        .unwrap()
        .is_unresolvable());
    assert_eq!(scope.get_value("x").unwrap(), Value::Integer(1));
}

#[test]
fn test_binding_outlived_by_slot() {
    let ctx = EvalContext::new();
    let slot = ReceiverSlot::property("ghost", Value::Integer(1));
    let binding = VariableBinding::for_slot("ghost", &slot, ctx.conversions().clone());
    assert_eq!(binding.value().unwrap(), Value::Integer(1));

    drop(slot);
    assert!(binding.slot().is_none());
    assert!(binding.value().unwrap_err().is_unresolvable());
    assert!(binding.set_value(Value::Integer(2)).is_err());
}

#[test]
fn test_put_invalidates_cached_binding() {
    let mut ctx = EvalContext::new();
    let point = new_point(&mut ctx);
    let scope = point.scope();

    scope
        .create_typed_variable("x", Value::Integer(5), &TypeHandle::integer())
        .unwrap();
    point.put("x", ReceiverSlot::property("x", Value::from("fresh")));

    assert_eq!(scope.get_value("x").unwrap(), Value::from("fresh"));
    assert!(scope.get_variable_resolver("x").unwrap().declared_type().is_none());

    point.remove("y");
    assert!(scope.get_value("y").unwrap_err().is_unresolvable());
}

#[test]
fn test_assigning_over_function_receiver() {
    let mut ctx = EvalContext::new();
    let globals = root(&ctx);
    let noop = NativeFunction::from_closure("noop", |_, _, _, _| Ok(Value::Null)).into_rc();
    let other = NativeFunction::from_closure("other", |_, _, _, _| Ok(Value::Null)).into_rc();
    let definition = Rc::new(
        PrototypeDefinition::new("Handler")
            .with_function("handle", noop)
            .with_mapped_method("dispatch"),
    );
    let handler = definition.new_instance(&mut ctx, &Value::Null, &globals).unwrap();
    let scope = handler.scope();

    scope.set_value("handle", Value::Function(other.clone())).unwrap();
    assert_eq!(handler.get("handle").unwrap().kind(), ReceiverKind::Function);
    assert_eq!(scope.get_value("handle").unwrap(), Value::Function(other));

    scope.set_value("handle", Value::Integer(1)).unwrap();
    assert_eq!(handler.get("handle").unwrap().kind(), ReceiverKind::Property);

    assert!(matches!(
        scope.set_value("dispatch", Value::Integer(1)),
        Err(ProtoError::UnsupportedOperation(_))
    ));
    assert_eq!(handler.get("dispatch").unwrap().kind(), ReceiverKind::MappedMethod);
}
