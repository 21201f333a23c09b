//! # Operation abstractions.
//!
//! - [`Operation`] — trait for async fallible units of work (method semantics)
//! - [`OperationFn`] — closure-backed implementation (plain-function semantics)

mod op_fn;
mod operation;

pub use op_fn::OperationFn;
pub use operation::Operation;
