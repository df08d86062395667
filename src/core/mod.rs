//! The in-memory representation of a decoded WebAssembly module.
pub mod indices;
pub mod instruction;
pub mod types;

mod module;
pub use instruction::{BlockType, Expr, Instruction, Memarg};
pub use module::{
    Code, CustomSection, Data, DataMode, Elem, ElemInit, ElemMode, Export, ExportDesc, Global,
    Import, ImportDesc, Locals, Module, Section, SectionKind,
};
pub(crate) use module::{MAGIC_NUMBER, VERSION};
