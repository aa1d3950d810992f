//! # protoscope - object and scope runtime for an expression language
//!
//! The runtime half of an expression-language engine, featuring:
//! - Prototype objects whose instances bind functions and properties at creation time
//! - Chained scopes with shadowing and fallback to enclosing scopes
//! - Type-constrained bindings with registered coercions
//! - Per-call scope bridging between a caller and the instance it calls into
//! - A compile-time import registry with ambiguity-checked package scanning
//!
//! Parsing and compilation live in the host engine. The host hands compiled expressions to
//! this crate as [`ExecutableStatement`](runner::plugin::types::ExecutableStatement)s and
//! callables as [`Function`](runner::plugin::types::Function)s.
//!
//! ## Quick Start
//!
//! ```
//! use std::rc::Rc;
//! use protoscope::runner::ds::proto::PrototypeDefinition;
//! use protoscope::runner::ds::scope::{MapScope, ScopeFactory};
//! use protoscope::runner::ds::value::Value;
//! use protoscope::runner::plugin::types::{statement, EvalContext, NativeFunction};
//!
//! let mut ctx = EvalContext::new();
//! let globals = MapScope::root(ctx.conversions().clone());
//!
//! let increment = NativeFunction::from_closure("increment", |_ctx, _this, scope, _args| {
//!     let next = match scope.get_value("count")? {
//!         Value::Integer(n) => n + 1,
//!         _ => 1,
//!     };
//!     scope.create_variable("count", Value::Integer(next))?;
//!     Ok(Value::Integer(next))
//! });
//!
//! let counter = Rc::new(
//!     PrototypeDefinition::new("Counter")
//!         .with_property("count", statement(|_, _, _| Ok(Value::Integer(0))))
//!         .with_function("increment", increment.into_rc()),
//! );
//! counter.declare_in(&globals).unwrap();
//!
//! let instance = counter.new_instance(&mut ctx, &Value::Null, &globals).unwrap();
//! instance.invoke("increment", &mut ctx, &Value::Null, &globals, &[]).unwrap();
//! assert_eq!(instance.scope().get_value("count").unwrap(), Value::Integer(1));
//! ```
//!
//! ## Scope Chains
//!
//! ```text
//! Name lookup inside a function receiver:
//! 1. Instance scope (the receivers of the called instance)
//! 2. Caller scope   (only for names the instance cannot resolve)
//! 3. ... the caller's own parents, up to the root scope
//! ```
//!
//! Assigning to a name nobody resolves creates it in the root scope. Instance scopes never
//! grow new receivers.
//!
//! ## Architecture
//!
//! - **[`runner::ds`]** - Values, prototypes, instances, scopes and bindings
//! - **[`runner::plugin`]** - Import registry, symbol locators, host contracts

#[macro_use]
extern crate lazy_static;

pub mod runner;
