//! Data structures of the object and scope runtime: values, prototypes and their instances,
//! scope chains and bindings.

pub mod call_context;
pub mod error;
pub mod operations;
pub mod proto;
pub mod proto_instance;
pub mod scope;
pub mod value;
