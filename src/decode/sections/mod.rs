//! One decoder per section body. Each receives a reader already bounded to the section's
//! declared size.
mod code;
mod custom;
mod data;
mod data_count;
mod element;
mod export;
mod function;
mod global;
mod import;
mod memory;
mod start;
mod table;
mod r#type;

pub use code::{DecodeCodeError, DecodeCodeLocalsError, DecodeCodeSectionError};
pub use custom::DecodeCustomSectionError;
pub use data::{DecodeDataSectionError, DecodeDataSegmentError};
pub use data_count::DecodeDataCountSectionError;
pub use element::{DecodeElementError, DecodeElementKindError, DecodeElementSectionError};
pub use export::{DecodeExportError, DecodeExportSectionError, InvalidExportDescMarkerByte};
pub use function::DecodeFunctionSectionError;
pub use global::{DecodeGlobalError, DecodeGlobalSectionError};
pub use import::{DecodeImportError, DecodeImportSectionError};
pub use memory::DecodeMemorySectionError;
pub use start::DecodeStartSectionError;
pub use table::DecodeTableSectionError;
pub use r#type::DecodeTypeSectionError;

pub(crate) use code::decode_code_section;
pub(crate) use custom::decode_custom_section;
pub(crate) use data::decode_data_section;
pub(crate) use data_count::decode_datacount_section;
pub(crate) use element::decode_element_section;
pub(crate) use export::decode_export_section;
pub(crate) use function::decode_function_section;
pub(crate) use global::decode_global_section;
pub(crate) use import::decode_import_section;
pub(crate) use memory::decode_memory_section;
pub(crate) use start::decode_start_section;
pub(crate) use table::decode_table_section;
pub(crate) use r#type::decode_type_section;
