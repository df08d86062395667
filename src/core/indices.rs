//! Type definitions for WebAssembly indices.
//!
//! See <https://www.w3.org/TR/wasm-core-2/#indices>

macro_rules! define_index_type {
    ($name:ident) => {
        #[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, PartialOrd, Ord)]
        pub struct $name(pub u32);
    };
}

define_index_type!(TypeIdx);
define_index_type!(FuncIdx);
define_index_type!(TableIdx);
define_index_type!(MemIdx);
define_index_type!(GlobalIdx);
define_index_type!(LocalIdx);
define_index_type!(LabelIdx);

impl TypeIdx {
    /// Position in the module's type list.
    pub(crate) fn index(self) -> usize {
        // u32 always fits in usize on the targets we support
        self.0 as usize
    }
}
