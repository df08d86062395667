use crate::core::types::RefType;
use crate::core::{
    Code, Data, DataMode, Elem, ElemInit, ElemMode, Export, ExportDesc, Global, Import,
    ImportDesc, Section,
};
use crate::encode::instructions::encode_expr;
use crate::encode::integer::encode_u32;
use crate::encode::{EncodeError, append_sized, encode_byte_vector, encode_list, encode_name};
use log::trace;
use std::io::Write;

impl Section {
    /// Write the section id, then the body prefixed with its size.
    pub(crate) fn encode<W: Write + ?Sized>(&self, w: &mut W) -> Result<(), EncodeError> {
        let mut body = Vec::new();
        match self {
            Section::Custom(custom) => {
                encode_name(&mut body, &custom.name)?;
                body.extend_from_slice(&custom.contents);
            }
            Section::Type(types) => encode_list(&mut body, types, |w, t| t.encode(w))?,
            Section::Import(imports) => encode_list(&mut body, imports, encode_import)?,
            Section::Function(funcs) => {
                encode_list(&mut body, funcs, |w, idx| Ok(encode_u32(w, idx.0)?))?
            }
            Section::Table(tables) => encode_list(&mut body, tables, |w, t| t.encode(w))?,
            Section::Memory(mems) => encode_list(&mut body, mems, |w, m| m.encode(w))?,
            Section::Global(globals) => encode_list(&mut body, globals, encode_global)?,
            Section::Export(exports) => encode_list(&mut body, exports, encode_export)?,
            Section::Start(idx) => encode_u32(&mut body, idx.0)?,
            Section::Element(elems) => encode_list(&mut body, elems, encode_elem)?,
            Section::Code(codes) => encode_list(&mut body, codes, encode_code)?,
            Section::Data(datas) => encode_list(&mut body, datas, encode_data)?,
            Section::DataCount(n) => encode_u32(&mut body, *n)?,
        }

        let kind = self.kind();
        trace!("encoded section {kind:?}, {} bytes", body.len());
        w.write_all(&[kind.id()])?;
        append_sized(w, &body)
    }
}

fn encode_import<W: Write + ?Sized>(w: &mut W, import: &Import) -> Result<(), EncodeError> {
    encode_name(w, &import.module)?;
    encode_name(w, &import.name)?;
    match &import.desc {
        ImportDesc::Func(idx) => {
            w.write_all(&[0x00])?;
            encode_u32(w, idx.0)?;
        }
        ImportDesc::Table(t) => {
            w.write_all(&[0x01])?;
            t.encode(w)?;
        }
        ImportDesc::Mem(m) => {
            w.write_all(&[0x02])?;
            m.encode(w)?;
        }
        ImportDesc::Global(g) => {
            w.write_all(&[0x03])?;
            g.encode(w)?;
        }
    }
    Ok(())
}

fn encode_export<W: Write + ?Sized>(w: &mut W, export: &Export) -> Result<(), EncodeError> {
    encode_name(w, &export.name)?;
    let (kind, idx) = match export.desc {
        ExportDesc::Func(x) => (0x00, x.0),
        ExportDesc::Table(x) => (0x01, x.0),
        ExportDesc::Mem(x) => (0x02, x.0),
        ExportDesc::Global(x) => (0x03, x.0),
    };
    w.write_all(&[kind])?;
    Ok(encode_u32(w, idx)?)
}

fn encode_global<W: Write + ?Sized>(w: &mut W, global: &Global) -> Result<(), EncodeError> {
    global.r#type.encode(w)?;
    encode_expr(w, &global.init)
}

fn encode_elem<W: Write + ?Sized>(w: &mut W, elem: &Elem) -> Result<(), EncodeError> {
    let uses_exprs = matches!(elem.init, ElemInit::Exprs(..));

    // the implicit-table forms can only express funcref expressions; anything else spells out
    // table 0 instead
    let implicit_table_ok = !matches!(elem.init, ElemInit::Exprs(t, _) if t != RefType::Func);

    let (mode_bits, table) = match &elem.mode {
        ElemMode::Active { table: None, .. } if implicit_table_ok => (0b000, None),
        ElemMode::Active { table, .. } => (0b010, Some(table.map_or(0, |t| t.0))),
        ElemMode::Passive => (0b001, None),
        ElemMode::Declarative => (0b011, None),
    };
    let bitfield = mode_bits | if uses_exprs { 0b100 } else { 0 };
    encode_u32(w, bitfield)?;

    if let Some(table) = table {
        encode_u32(w, table)?;
    }
    if let ElemMode::Active { offset, .. } = &elem.mode {
        encode_expr(w, offset)?;
    }

    let has_kind = mode_bits != 0;
    match &elem.init {
        ElemInit::Funcs(funcs) => {
            if has_kind {
                w.write_all(&[0x00])?;
            }
            encode_list(w, funcs, |w, f| Ok(encode_u32(w, f.0)?))
        }
        ElemInit::Exprs(reftype, exprs) => {
            if has_kind {
                reftype.encode(w)?;
            }
            encode_list(w, exprs, |w, e| encode_expr(w, e))
        }
    }
}

fn encode_code<W: Write + ?Sized>(w: &mut W, code: &Code) -> Result<(), EncodeError> {
    let mut body = Vec::new();
    encode_list(&mut body, &code.locals, |w, l| {
        encode_u32(w, l.count)?;
        l.t.encode(w)
    })?;
    encode_expr(&mut body, &code.body)?;
    append_sized(w, &body)
}

fn encode_data<W: Write + ?Sized>(w: &mut W, data: &Data) -> Result<(), EncodeError> {
    match &data.mode {
        DataMode::Active {
            memory: None,
            offset,
        } => {
            encode_u32(w, 0)?;
            encode_expr(w, offset)?;
        }
        DataMode::Passive => encode_u32(w, 1)?,
        DataMode::Active {
            memory: Some(memory),
            offset,
        } => {
            encode_u32(w, 2)?;
            encode_u32(w, memory.0)?;
            encode_expr(w, offset)?;
        }
    }
    encode_byte_vector(w, &data.init)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Instruction;
    use crate::core::indices::{FuncIdx, TableIdx};

    fn elem_bytes(elem: &Elem) -> Vec<u8> {
        let mut buf = Vec::new();
        encode_elem(&mut buf, elem).unwrap();
        buf
    }

    fn offset(n: i32) -> Vec<Instruction> {
        vec![Instruction::I32Const(n)]
    }

    #[test]
    fn element_forms_follow_mode_and_payload() {
        let active_implicit = Elem {
            mode: ElemMode::Active {
                table: None,
                offset: offset(0),
            },
            init: ElemInit::Funcs(vec![FuncIdx(1)]),
        };
        assert_eq!(
            elem_bytes(&active_implicit),
            [0x00, 0x41, 0x00, 0x0B, 0x01, 0x01]
        );

        let passive = Elem {
            mode: ElemMode::Passive,
            init: ElemInit::Funcs(vec![]),
        };
        assert_eq!(elem_bytes(&passive), [0x01, 0x00, 0x00]);

        let explicit = Elem {
            mode: ElemMode::Active {
                table: Some(TableIdx(1)),
                offset: offset(2),
            },
            init: ElemInit::Funcs(vec![]),
        };
        assert_eq!(
            elem_bytes(&explicit),
            [0x02, 0x01, 0x41, 0x02, 0x0B, 0x00, 0x00]
        );

        let declarative_exprs = Elem {
            mode: ElemMode::Declarative,
            init: ElemInit::Exprs(RefType::Func, vec![vec![Instruction::RefFunc(FuncIdx(0))]]),
        };
        assert_eq!(
            elem_bytes(&declarative_exprs),
            [0x07, 0x70, 0x01, 0xD2, 0x00, 0x0B]
        );
    }

    #[test]
    fn externref_exprs_spell_out_table_zero() {
        let elem = Elem {
            mode: ElemMode::Active {
                table: None,
                offset: offset(0),
            },
            init: ElemInit::Exprs(RefType::Extern, vec![]),
        };
        assert_eq!(
            elem_bytes(&elem),
            [0x06, 0x00, 0x41, 0x00, 0x0B, 0x6F, 0x00]
        );
    }
}
