//! A WebAssembly binary decoder, encoder and interpreter.
//!
//! This library implements the Binary format of the WebAssembly [specification], version 2,
//! in both directions, and runs the i32 subset of the instruction set.
//!
//! - [`load()`] (or [`decode::decode_module`] for any reader) turns bytes into a [`Module`].
//! - [`Module::encode`] writes a module back; a decoded module re-encodes to the same bytes.
//! - [`Module::instantiate`] links a module against [`Imports`] and yields an [`Instance`]
//!   whose exported functions can be called with [`Instance::call`].
//!
//! ```
//! let bytes = [0x00, 0x61, 0x73, 0x6D, 0x01, 0x00, 0x00, 0x00];
//! let module = wadex::load(&bytes).unwrap();
//! assert_eq!(module.to_bytes().unwrap(), bytes);
//! ```
//!
//! [specification]: https://www.w3.org/TR/wasm-core-2/
#![forbid(unsafe_code)]

pub mod config;
pub mod core;
pub mod decode;
pub mod encode;
pub mod exec;
pub mod instance;
pub mod runtime;

pub use crate::config::Config;
pub use crate::core::Module;
pub use crate::decode::{DecodeModuleError, decode_module};
pub use crate::encode::EncodeError;
pub use crate::exec::ExecError;
pub use crate::instance::{CallError, Extern, Imports, Instance, InstantiateError};
pub use crate::runtime::{Function, GlobalValue, Memory, Table, Value};

/// Decode a module held in memory.
pub fn load(bytes: &[u8]) -> Result<Module, DecodeModuleError> {
    decode_module(bytes)
}
