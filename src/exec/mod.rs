//! The execution engine: compiles function bodies once and interprets them.
pub(crate) mod compile;
mod error;
mod interp;

pub use error::ExecError;
pub(crate) use interp::{Executor, eval_const};
