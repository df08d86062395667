use super::indices::{FuncIdx, GlobalIdx, MemIdx, TableIdx, TypeIdx};
use super::instruction::Expr;
use super::types::{FuncType, GlobalType, MemType, RefType, TableType, ValType};

pub(crate) const MAGIC_NUMBER: [u8; 4] = [0x00, 0x61, 0x73, 0x6D];
pub(crate) const VERSION: [u8; 4] = [0x01, 0x00, 0x00, 0x00];

/// WebAssembly programs are organized into modules, which are the unit of deployment,
/// loading, and compilation. A module collects definitions for types, functions, tables,
/// memories, and globals. In addition, it can declare imports and exports and provide
/// initialization in the form of data and element segments, or a start function.
///
/// The sections are kept in the order they appeared in the binary, so that re-encoding a
/// decoded module reproduces the input byte for byte.
///
/// <https://www.w3.org/TR/wasm-core-2/#modules>
/// <https://www.w3.org/TR/wasm-core-2/#binary-module>
#[derive(Debug, PartialEq, Clone)]
pub struct Module {
    pub magic: [u8; 4],
    pub version: [u8; 4],
    pub sections: Vec<Section>,
}

impl Default for Module {
    fn default() -> Self {
        Module {
            magic: MAGIC_NUMBER,
            version: VERSION,
            sections: vec![],
        }
    }
}

/// One section of the binary format. Each variant owns the decoded payload of the section
/// with the matching id.
#[derive(Debug, PartialEq, Clone)]
pub enum Section {
    /// Custom sections have the id 0. They are intended to be used for debugging information or
    /// third-party extensions, and are ignored by the WebAssembly semantics.
    ///
    /// <https://www.w3.org/TR/wasm-core-2/#binary-customsec>
    Custom(CustomSection),

    /// The types component of a module defines a vector of function types. All function types
    /// used in a module must be defined in this component. They are referenced by type indices.
    ///
    /// <https://www.w3.org/TR/wasm-core-2/#binary-typesec>
    Type(Vec<FuncType>),

    /// <https://www.w3.org/TR/wasm-core-2/#import-section>
    Import(Vec<Import>),

    /// The type index of every function defined in the module. The bodies follow in the Code
    /// section, in the same order.
    ///
    /// <https://www.w3.org/TR/wasm-core-2/#function-section>
    Function(Vec<TypeIdx>),

    /// <https://www.w3.org/TR/wasm-core-2/#table-section>
    Table(Vec<TableType>),

    /// <https://www.w3.org/TR/wasm-core-2/#memory-section>
    Memory(Vec<MemType>),

    /// <https://www.w3.org/TR/wasm-core-2/#global-section>
    Global(Vec<Global>),

    /// <https://www.w3.org/TR/wasm-core-2/#export-section>
    Export(Vec<Export>),

    /// The start component of a module declares the function index of a start function that is
    /// automatically invoked when the module is instantiated, after tables and memories have
    /// been initialized.
    ///
    /// <https://www.w3.org/TR/wasm-core-2/#start-section>
    Start(FuncIdx),

    /// <https://www.w3.org/TR/wasm-core-2/#element-section>
    Element(Vec<Elem>),

    /// <https://www.w3.org/TR/wasm-core-2/#code-section>
    Code(Vec<Code>),

    /// <https://www.w3.org/TR/wasm-core-2/#data-section>
    Data(Vec<Data>),

    /// The optional data count section declares the number of data segments that follow.
    ///
    /// <https://www.w3.org/TR/wasm-core-2/#data-count-section>
    DataCount(u32),
}

impl Section {
    pub fn kind(&self) -> SectionKind {
        match self {
            Section::Custom(_) => SectionKind::Custom,
            Section::Type(_) => SectionKind::Type,
            Section::Import(_) => SectionKind::Import,
            Section::Function(_) => SectionKind::Function,
            Section::Table(_) => SectionKind::Table,
            Section::Memory(_) => SectionKind::Memory,
            Section::Global(_) => SectionKind::Global,
            Section::Export(_) => SectionKind::Export,
            Section::Start(_) => SectionKind::Start,
            Section::Element(_) => SectionKind::Element,
            Section::Code(_) => SectionKind::Code,
            Section::Data(_) => SectionKind::Data,
            Section::DataCount(_) => SectionKind::DataCount,
        }
    }
}

/// The kinds of sections, declared in the order they must appear in a module. Custom sections
/// are the exception and may appear anywhere.
///
/// Note that Data Count (id 12) is placed before Code (id 10): the prescribed order is not the
/// id order.
#[derive(PartialEq, Eq, PartialOrd, Ord, Debug, Copy, Clone, Hash)]
pub enum SectionKind {
    Custom,
    Type,
    Import,
    Function,
    Table,
    Memory,
    Global,
    Export,
    Start,
    Element,
    DataCount,
    Code,
    Data,
}

impl SectionKind {
    pub fn id(self) -> u8 {
        match self {
            SectionKind::Custom => 0,
            SectionKind::Type => 1,
            SectionKind::Import => 2,
            SectionKind::Function => 3,
            SectionKind::Table => 4,
            SectionKind::Memory => 5,
            SectionKind::Global => 6,
            SectionKind::Export => 7,
            SectionKind::Start => 8,
            SectionKind::Element => 9,
            SectionKind::Code => 10,
            SectionKind::Data => 11,
            SectionKind::DataCount => 12,
        }
    }
}

/// Custom sections are intended to be used for debugging information or third-party
/// extensions. Their contents consist of a name further identifying the custom section,
/// followed by an uninterpreted sequence of bytes for custom use.
///
/// <https://www.w3.org/TR/wasm-core-2/#custom-section>
#[derive(Debug, PartialEq, Clone)]
pub struct CustomSection {
    pub name: String,
    pub contents: Vec<u8>,
}

/// The imports component of a module defines a set of imports that are required for
/// instantiation. Each import is labeled by a two-level name space, consisting of a module
/// name and a name for an entity within that module. Every import defines an index in the
/// respective index space. In each index space, the indices of imports go before the first
/// index of any definition contained in the module itself.
///
/// <https://www.w3.org/TR/wasm-core-2/#imports>
#[derive(Debug, PartialEq, Clone)]
pub struct Import {
    pub module: String,
    pub name: String,
    pub desc: ImportDesc,
}

#[derive(Debug, PartialEq, Clone)]
pub enum ImportDesc {
    Func(TypeIdx),
    Table(TableType),
    Mem(MemType),
    Global(GlobalType),
}

/// The exports component of a module defines a set of exports that become accessible to the
/// host environment once the module has been instantiated. Each export is labeled by a
/// unique name and references a definition through the combined index space, imports first.
///
/// <https://www.w3.org/TR/wasm-core-2/#exports>
#[derive(Debug, PartialEq, Clone)]
pub struct Export {
    pub name: String,
    pub desc: ExportDesc,
}

#[derive(Debug, PartialEq, Clone, Copy)]
pub enum ExportDesc {
    Func(FuncIdx),
    Table(TableIdx),
    Mem(MemIdx),
    Global(GlobalIdx),
}

/// Each global stores a single value of the given global type, initialized by a constant
/// expression.
///
/// <https://www.w3.org/TR/wasm-core-2/#globals>
#[derive(Debug, PartialEq, Clone)]
pub struct Global {
    pub r#type: GlobalType,
    pub init: Expr,
}

/// An element segment initializes a subrange of a table from a static vector of elements.
///
/// <https://www.w3.org/TR/wasm-core-2/#element-segments>
#[derive(Debug, PartialEq, Clone)]
pub struct Elem {
    pub mode: ElemMode,
    pub init: ElemInit,
}

#[derive(Debug, PartialEq, Clone)]
pub enum ElemMode {
    Passive,
    /// `table` is `None` for the encodings that imply table 0 without spelling it out.
    Active {
        table: Option<TableIdx>,
        offset: Expr,
    },
    Declarative,
}

#[derive(Debug, PartialEq, Clone)]
pub enum ElemInit {
    /// A plain vector of function indices, as in bitfield forms 0 to 3.
    Funcs(Vec<FuncIdx>),
    /// A vector of constant expressions of the given reference type, as in forms 4 to 7.
    Exprs(RefType, Vec<Expr>),
}

/// The body of a function: its declared locals, grouped as they appear in the binary, and
/// the instruction sequence.
///
/// <https://www.w3.org/TR/wasm-core-2/#binary-code>
#[derive(Debug, PartialEq, Clone)]
pub struct Code {
    pub locals: Vec<Locals>,
    pub body: Expr,
}

impl Code {
    /// Iterate over the declared locals one by one, expanding the groups.
    /// Number of locals the groups expand to, without allocating them.
    pub fn local_count(&self) -> u64 {
        self.locals.iter().map(|l| u64::from(l.count)).sum()
    }

    pub fn local_types(&self) -> impl Iterator<Item = ValType> + '_ {
        self.locals
            .iter()
            .flat_map(|l| std::iter::repeat_n(l.t, l.count as usize))
    }
}

#[derive(Debug, PartialEq, Clone, Copy)]
pub struct Locals {
    pub count: u32,
    pub t: ValType,
}

/// A data segment initializes a range of memory from a static vector of bytes.
///
/// <https://www.w3.org/TR/wasm-core-2/#data-segments>
#[derive(Debug, PartialEq, Clone)]
pub struct Data {
    pub init: Vec<u8>,
    pub mode: DataMode,
}

#[derive(Debug, PartialEq, Clone)]
pub enum DataMode {
    Passive,
    /// `memory` is `None` for the encoding that implies memory 0 without spelling it out.
    Active {
        memory: Option<MemIdx>,
        offset: Expr,
    },
}

macro_rules! section_accessor {
    ($(#[$doc:meta])* $fn:ident, $variant:ident, $t:ty) => {
        $(#[$doc])*
        pub fn $fn(&self) -> &[$t] {
            self.sections
                .iter()
                .find_map(|s| match s {
                    Section::$variant(items) => Some(items.as_slice()),
                    _ => None,
                })
                .unwrap_or(&[])
        }
    };
}

impl Module {
    section_accessor!(types, Type, FuncType);
    section_accessor!(imports, Import, Import);
    section_accessor!(
        /// Type indices of the functions defined by the module, excluding imports.
        functions, Function, TypeIdx
    );
    section_accessor!(tables, Table, TableType);
    section_accessor!(mems, Memory, MemType);
    section_accessor!(globals, Global, Global);
    section_accessor!(exports, Export, Export);
    section_accessor!(elems, Element, Elem);
    section_accessor!(codes, Code, Code);
    section_accessor!(datas, Data, Data);

    pub fn start(&self) -> Option<FuncIdx> {
        self.sections.iter().find_map(|s| match s {
            Section::Start(idx) => Some(*idx),
            _ => None,
        })
    }

    pub fn data_count(&self) -> Option<u32> {
        self.sections.iter().find_map(|s| match s {
            Section::DataCount(n) => Some(*n),
            _ => None,
        })
    }

    pub fn custom_sections(&self) -> impl Iterator<Item = &CustomSection> {
        self.sections.iter().filter_map(|s| match s {
            Section::Custom(c) => Some(c),
            _ => None,
        })
    }

    /// Find an exported function by name.
    pub fn exported_func(&self, name: &str) -> Option<FuncIdx> {
        self.exports().iter().find_map(|e| match e.desc {
            ExportDesc::Func(idx) if e.name == name => Some(idx),
            _ => None,
        })
    }
}
