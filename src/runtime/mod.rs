//! Runtime entities: the values and mutable state a running instance works on.
mod func;
mod global;
mod local;
mod memory;
mod stack;
pub(crate) mod store;
mod table;
mod value;

pub use func::{FuncRef, Function, HostCallable, HostFunction, WasmFunction};
pub use global::GlobalValue;
pub use local::LocalValue;
pub use memory::{Memory, PAGE_SIZE};
pub use stack::ValueStack;
pub use store::{SharedGlobal, SharedMemory, SharedTable};
pub use table::Table;
pub use value::Value;

pub(crate) use local::check_type;
