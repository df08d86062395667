use crate::core::{MAGIC_NUMBER, Module, Section, SectionKind, VERSION};
use crate::decode::integer::{DecodeIntegerError, decode_u32};
use crate::decode::sections::*;
use crate::decode::{FromMarkerByte, read_byte};
use log::debug;
use phf::phf_ordered_map;
use std::io::{self, Read};
use thiserror::Error;

#[derive(Debug, Error)]
#[error("invalid section ID: expected one of {markers}; got {0:#04X}", markers = SectionKind::markers_formatted())]
pub struct InvalidSectionIdError(pub u8);

impl From<u8> for InvalidSectionIdError {
    fn from(b: u8) -> Self {
        Self(b)
    }
}

// Valid marker bytes for [SectionKind].
#[expect(non_upper_case_globals)]
static SectionId_MARKERS: phf::OrderedMap<u8, SectionKind> = phf_ordered_map! {
    0u8 => SectionKind::Custom,
    1u8 => SectionKind::Type,
    2u8 => SectionKind::Import,
    3u8 => SectionKind::Function,
    4u8 => SectionKind::Table,
    5u8 => SectionKind::Memory,
    6u8 => SectionKind::Global,
    7u8 => SectionKind::Export,
    8u8 => SectionKind::Start,
    9u8 => SectionKind::Element,
    10u8 => SectionKind::Code,
    11u8 => SectionKind::Data,
    12u8 => SectionKind::DataCount,
};

impl FromMarkerByte for SectionKind {
    type Error = InvalidSectionIdError;

    fn markers() -> &'static phf::OrderedMap<u8, Self> {
        &SectionId_MARKERS
    }
}

/// The top-level error that may occur when attempting to decode bytes into
/// a [Module].
///
/// Encompasses all possible errors that may occur during decoding,
/// including section-specific errors.
#[derive(Debug, Error)]
pub enum DecodeModuleError {
    #[error(transparent)]
    ParsePreamble(#[from] ParsePreambleError),

    #[error(
        "number of Code entries does not match number of Function entries: {codes_len} vs {funcs_len}"
    )]
    CodeFuncEntriesLenMismatch { codes_len: usize, funcs_len: usize },

    #[error("Data Count section declares {data_count} segments; Data section has {datas_len}")]
    DataCountMismatch { datas_len: usize, data_count: u32 },

    #[error("out of order section: {current:?} cannot appear after {previous:?}")]
    SectionOutOfOrder {
        current: SectionKind,
        previous: SectionKind,
    },

    #[error("encountered duplicate section: {0:?}")]
    DuplicateSection(SectionKind),

    #[error("{section_kind:?} section size mismatch: declared {declared} bytes; consumed {got}")]
    SectionSizeMismatch {
        section_kind: SectionKind,
        declared: u32,
        got: u64,
    },

    // section-specific errors
    #[error(transparent)]
    DecodeSectionHeader(#[from] DecodeSectionHeaderError),

    #[error(transparent)]
    DecodeCustomSection(#[from] DecodeCustomSectionError),

    #[error(transparent)]
    DecodeTypeSection(#[from] DecodeTypeSectionError),

    #[error(transparent)]
    DecodeImportSection(#[from] DecodeImportSectionError),

    #[error(transparent)]
    DecodeFunctionSection(#[from] DecodeFunctionSectionError),

    #[error(transparent)]
    DecodeTableSection(#[from] DecodeTableSectionError),

    #[error(transparent)]
    DecodeMemorySection(#[from] DecodeMemorySectionError),

    #[error(transparent)]
    DecodeGlobalSection(#[from] DecodeGlobalSectionError),

    #[error(transparent)]
    DecodeExportSection(#[from] DecodeExportSectionError),

    #[error(transparent)]
    DecodeStartSection(#[from] DecodeStartSectionError),

    #[error(transparent)]
    DecodeElementSection(#[from] DecodeElementSectionError),

    #[error(transparent)]
    DecodeDatacountSection(#[from] DecodeDataCountSectionError),

    #[error(transparent)]
    DecodeCodeSection(#[from] DecodeCodeSectionError),

    #[error(transparent)]
    DecodeDataSection(#[from] DecodeDataSectionError),
}

struct SectionHeader {
    kind: SectionKind,
    size: u32,
}

/// Decode `input` into a WebAssembly [Module].
///
/// Sections are read one at a time through a reader limited to the declared section size, and
/// must consume it exactly. Non-custom sections must appear at most once and in the prescribed
/// order.
pub fn decode_module(mut input: impl Read) -> Result<Module, DecodeModuleError> {
    parse_preamble(&mut input)?;

    let mut module = Module::default();
    let mut previous: Option<SectionKind> = None;

    while let Some(header) = decode_section_header(&mut input)? {
        debug!("section {:?}, {} bytes", header.kind, header.size);

        let kind = header.kind;
        if kind != SectionKind::Custom {
            validate_section_order(previous, kind)?;
            previous = Some(kind);
        }

        let mut reader = input.by_ref().take(header.size.into());
        let section = match kind {
            SectionKind::Custom => Section::Custom(decode_custom_section(&mut reader)?),
            SectionKind::Type => Section::Type(decode_type_section(&mut reader)?),
            SectionKind::Import => Section::Import(decode_import_section(&mut reader)?),
            SectionKind::Function => Section::Function(decode_function_section(&mut reader)?),
            SectionKind::Table => Section::Table(decode_table_section(&mut reader)?),
            SectionKind::Memory => Section::Memory(decode_memory_section(&mut reader)?),
            SectionKind::Global => Section::Global(decode_global_section(&mut reader)?),
            SectionKind::Export => Section::Export(decode_export_section(&mut reader)?),
            SectionKind::Start => Section::Start(decode_start_section(&mut reader)?),
            SectionKind::Element => Section::Element(decode_element_section(&mut reader)?),
            SectionKind::DataCount => Section::DataCount(decode_datacount_section(&mut reader)?),
            SectionKind::Code => Section::Code(decode_code_section(&mut reader)?),
            SectionKind::Data => Section::Data(decode_data_section(&mut reader)?),
        };

        if reader.limit() != 0 {
            return Err(DecodeModuleError::SectionSizeMismatch {
                section_kind: kind,
                declared: header.size,
                got: u64::from(header.size) - reader.limit(),
            });
        }

        module.sections.push(section);
    }

    // the function and code sections must declare the same number of entries, whether or not
    // either is present
    let funcs_len = module.functions().len();
    let codes_len = module.codes().len();
    if funcs_len != codes_len {
        return Err(DecodeModuleError::CodeFuncEntriesLenMismatch {
            codes_len,
            funcs_len,
        });
    }

    if let Some(data_count) = module.data_count() {
        let datas_len = module.datas().len();
        if u64::from(data_count) != datas_len as u64 {
            return Err(DecodeModuleError::DataCountMismatch {
                datas_len,
                data_count,
            });
        }
    }

    Ok(module)
}

fn validate_section_order(
    previous: Option<SectionKind>,
    current: SectionKind,
) -> Result<(), DecodeModuleError> {
    let Some(previous) = previous else {
        return Ok(());
    };

    if current < previous {
        return Err(DecodeModuleError::SectionOutOfOrder { current, previous });
    }
    if current == previous {
        return Err(DecodeModuleError::DuplicateSection(current));
    }

    Ok(())
}

static EXPECTED_PREAMBLE: [u8; 8] = [
    MAGIC_NUMBER[0],
    MAGIC_NUMBER[1],
    MAGIC_NUMBER[2],
    MAGIC_NUMBER[3],
    VERSION[0],
    VERSION[1],
    VERSION[2],
    VERSION[3],
];

#[derive(Debug, Error)]
pub enum ParsePreambleError {
    #[error("failed reading preamble")]
    Io(#[from] io::Error),

    #[error("unexpected preamble: expected {preamble:02X?}; got {0:02X?}", preamble = EXPECTED_PREAMBLE)]
    Unexpected([u8; 8]),
}

fn parse_preamble<R: Read + ?Sized>(reader: &mut R) -> Result<(), ParsePreambleError> {
    let mut preamble = [0u8; 8];
    reader.read_exact(&mut preamble)?;

    if preamble != EXPECTED_PREAMBLE {
        return Err(ParsePreambleError::Unexpected(preamble));
    }

    Ok(())
}

#[derive(Debug, Error)]
pub enum DecodeSectionHeaderError {
    #[error("failed reading section ID byte")]
    ReadSectionIdByte(#[from] io::Error),

    #[error("invalid section ID")]
    InvalidSectionId(#[from] InvalidSectionIdError),

    #[error("failed decoding section size")]
    DecodeSectionSize(#[from] DecodeIntegerError),
}

// A clean end of input between sections ends the module.
fn decode_section_header<R: Read + ?Sized>(
    reader: &mut R,
) -> Result<Option<SectionHeader>, DecodeSectionHeaderError> {
    let id = match read_byte(reader) {
        Ok(id) => id,
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    let kind = SectionKind::from_marker(id)?;
    let size = decode_u32(reader)?;

    Ok(Some(SectionHeader { kind, size }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn with_preamble(body: &[u8]) -> Vec<u8> {
        let mut bytes = EXPECTED_PREAMBLE.to_vec();
        bytes.extend_from_slice(body);
        bytes
    }

    #[test]
    fn empty_module_has_no_sections() {
        let module = decode_module(Cursor::new(with_preamble(&[]))).unwrap();
        assert_eq!(module, Module::default());
    }

    #[test]
    fn bad_magic_is_rejected() {
        let err = decode_module(Cursor::new(b"\0asn\x01\0\0\0".to_vec())).unwrap_err();
        assert!(matches!(
            err,
            DecodeModuleError::ParsePreamble(ParsePreambleError::Unexpected(_))
        ));
    }

    #[test]
    fn unknown_section_id_is_rejected() {
        let err = decode_module(Cursor::new(with_preamble(&[0x0D, 0x00]))).unwrap_err();
        assert!(matches!(
            err,
            DecodeModuleError::DecodeSectionHeader(DecodeSectionHeaderError::InvalidSectionId(
                InvalidSectionIdError(0x0D)
            ))
        ));
    }

    #[test]
    fn data_count_must_precede_code() {
        // code section (empty vector) followed by a data count section
        let err =
            decode_module(Cursor::new(with_preamble(&[0x0A, 0x01, 0x00, 0x0C, 0x01, 0x00])))
                .unwrap_err();
        assert!(matches!(
            err,
            DecodeModuleError::SectionOutOfOrder {
                current: SectionKind::DataCount,
                previous: SectionKind::Code
            }
        ));
    }

    #[test]
    fn custom_sections_may_appear_anywhere() {
        let module = decode_module(Cursor::new(with_preamble(&[
            0x01, 0x01, 0x00, // empty type section
            0x00, 0x03, 0x01, b'a', 0xFF, // custom "a" with one content byte
            0x03, 0x01, 0x00, // empty function section
        ])))
        .unwrap();
        let kinds: Vec<_> = module.sections.iter().map(Section::kind).collect();
        assert_eq!(
            kinds,
            [SectionKind::Type, SectionKind::Custom, SectionKind::Function]
        );
    }

    #[test]
    fn duplicate_sections_are_rejected() {
        let err = decode_module(Cursor::new(with_preamble(&[0x01, 0x01, 0x00, 0x01, 0x01, 0x00])))
            .unwrap_err();
        assert!(matches!(
            err,
            DecodeModuleError::DuplicateSection(SectionKind::Type)
        ));
    }

    #[test]
    fn section_must_consume_its_declared_size() {
        // type section declares 2 bytes but its empty vector only needs 1
        let err = decode_module(Cursor::new(with_preamble(&[0x01, 0x02, 0x00, 0x00])))
            .unwrap_err();
        assert!(matches!(
            err,
            DecodeModuleError::SectionSizeMismatch {
                section_kind: SectionKind::Type,
                declared: 2,
                got: 1
            }
        ));
    }

    #[test]
    fn function_without_code_is_rejected() {
        let err = decode_module(Cursor::new(with_preamble(&[0x03, 0x02, 0x01, 0x00])))
            .unwrap_err();
        assert!(matches!(
            err,
            DecodeModuleError::CodeFuncEntriesLenMismatch {
                codes_len: 0,
                funcs_len: 1
            }
        ));
    }
}
