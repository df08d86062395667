use crate::core::instruction::{BlockType, Expr, Instruction, Memarg};
use crate::encode::integer::{encode_i32, encode_i64, encode_s33, encode_u32};
use crate::encode::{EncodeError, encode_list};
use std::io::Write;

const END: u8 = 0x0B;
const ELSE: u8 = 0x05;

/// Encode an instruction sequence followed by its `end` marker.
pub(crate) fn encode_expr<W: Write + ?Sized>(w: &mut W, expr: &Expr) -> Result<(), EncodeError> {
    encode_instrs(w, expr)?;
    Ok(w.write_all(&[END])?)
}

/// Work left for the encoder: the rest of an instruction sequence, or a delimiter to write
/// once the sequence before it is done.
enum Pending<'a> {
    Seq(std::slice::Iter<'a, Instruction>),
    Marker(u8),
}

// Nested bodies are queued on `pending` instead of recursed into.
fn encode_instrs<W: Write + ?Sized>(w: &mut W, instrs: &[Instruction]) -> Result<(), EncodeError> {
    let mut pending = vec![Pending::Seq(instrs.iter())];
    while let Some(top) = pending.pop() {
        match top {
            Pending::Marker(b) => w.write_all(&[b])?,
            Pending::Seq(mut rest) => {
                if let Some(ins) = rest.next() {
                    pending.push(Pending::Seq(rest));
                    ins.encode(w, &mut pending)?;
                }
            }
        }
    }
    Ok(())
}

impl BlockType {
    fn encode<W: Write + ?Sized>(&self, w: &mut W) -> Result<(), EncodeError> {
        match self {
            BlockType::Empty => w.write_all(&[BlockType::EMPTY_MARKER])?,
            BlockType::Value(t) => t.encode(w)?,
            BlockType::Type(idx) => encode_s33(w, idx.0)?,
        }
        Ok(())
    }
}

impl Memarg {
    fn encode<W: Write + ?Sized>(&self, w: &mut W) -> Result<(), EncodeError> {
        encode_u32(w, self.align)?;
        Ok(encode_u32(w, self.offset)?)
    }
}

impl Instruction {
    /// The opcode of every instruction that carries no immediates.
    fn plain_opcode(&self) -> Option<u8> {
        use Instruction::*;
        Some(match self {
            Unreachable => 0x00,
            Nop => 0x01,
            Return => 0x0F,
            RefIsNull => 0xD1,
            Drop => 0x1A,
            Select(None) => 0x1B,
            I32Eqz => 0x45,
            I32Eq => 0x46,
            I32Ne => 0x47,
            I32LtS => 0x48,
            I32LtU => 0x49,
            I32GtS => 0x4A,
            I32GtU => 0x4B,
            I32LeS => 0x4C,
            I32LeU => 0x4D,
            I32GeS => 0x4E,
            I32GeU => 0x4F,
            I32Clz => 0x67,
            I32Ctz => 0x68,
            I32Popcnt => 0x69,
            I32Add => 0x6A,
            I32Sub => 0x6B,
            I32Mul => 0x6C,
            I32DivS => 0x6D,
            I32DivU => 0x6E,
            I32RemS => 0x6F,
            I32RemU => 0x70,
            I32And => 0x71,
            I32Or => 0x72,
            I32Xor => 0x73,
            I32Shl => 0x74,
            I32ShrS => 0x75,
            I32ShrU => 0x76,
            I32Rotl => 0x77,
            I32Rotr => 0x78,
            I32Extend8S => 0xC0,
            I32Extend16S => 0xC1,
            _ => return None,
        })
    }

    fn memory_opcode(&self) -> Option<(u8, &Memarg)> {
        use Instruction::*;
        Some(match self {
            I32Load(m) => (0x28, m),
            I64Load(m) => (0x29, m),
            F32Load(m) => (0x2A, m),
            F64Load(m) => (0x2B, m),
            I32Load8s(m) => (0x2C, m),
            I32Load8u(m) => (0x2D, m),
            I32Load16s(m) => (0x2E, m),
            I32Load16u(m) => (0x2F, m),
            I32Store(m) => (0x36, m),
            I64Store(m) => (0x37, m),
            F32Store(m) => (0x38, m),
            F64Store(m) => (0x39, m),
            I32Store8(m) => (0x3A, m),
            I32Store16(m) => (0x3B, m),
            _ => return None,
        })
    }

    /// Write the opcode and immediates. The bodies of structured instructions, with their
    /// delimiters, are queued on `pending` in reverse order of output.
    fn encode<'a, W: Write + ?Sized>(
        &'a self,
        w: &mut W,
        pending: &mut Vec<Pending<'a>>,
    ) -> Result<(), EncodeError> {
        if let Some(op) = self.plain_opcode() {
            return Ok(w.write_all(&[op])?);
        }
        if let Some((op, memarg)) = self.memory_opcode() {
            w.write_all(&[op])?;
            return memarg.encode(w);
        }

        match self {
            Instruction::Block(bt, body) => {
                w.write_all(&[0x02])?;
                bt.encode(w)?;
                pending.push(Pending::Marker(END));
                pending.push(Pending::Seq(body.iter()));
            }
            Instruction::Loop(bt, body) => {
                w.write_all(&[0x03])?;
                bt.encode(w)?;
                pending.push(Pending::Marker(END));
                pending.push(Pending::Seq(body.iter()));
            }
            Instruction::If(bt, then, otherwise) => {
                w.write_all(&[0x04])?;
                bt.encode(w)?;
                pending.push(Pending::Marker(END));
                if let Some(otherwise) = otherwise {
                    pending.push(Pending::Seq(otherwise.iter()));
                    pending.push(Pending::Marker(ELSE));
                }
                pending.push(Pending::Seq(then.iter()));
            }
            Instruction::Br(l) => {
                w.write_all(&[0x0C])?;
                encode_u32(w, l.0)?;
            }
            Instruction::BrIf(l) => {
                w.write_all(&[0x0D])?;
                encode_u32(w, l.0)?;
            }
            Instruction::BrTable(labels, default) => {
                w.write_all(&[0x0E])?;
                encode_list(w, labels, |w, l| Ok(encode_u32(w, l.0)?))?;
                encode_u32(w, default.0)?;
            }
            Instruction::Call(f) => {
                w.write_all(&[0x10])?;
                encode_u32(w, f.0)?;
            }
            Instruction::CallIndirect(table, ty) => {
                w.write_all(&[0x11])?;
                encode_u32(w, ty.0)?;
                encode_u32(w, table.0)?;
            }
            Instruction::RefNull(t) => {
                w.write_all(&[0xD0])?;
                t.encode(w)?;
            }
            Instruction::RefFunc(f) => {
                w.write_all(&[0xD2])?;
                encode_u32(w, f.0)?;
            }
            Instruction::Select(Some(types)) => {
                w.write_all(&[0x1C])?;
                encode_list(w, types, |w, t| t.encode(w))?;
            }
            Instruction::LocalGet(x) => {
                w.write_all(&[0x20])?;
                encode_u32(w, x.0)?;
            }
            Instruction::LocalSet(x) => {
                w.write_all(&[0x21])?;
                encode_u32(w, x.0)?;
            }
            Instruction::LocalTee(x) => {
                w.write_all(&[0x22])?;
                encode_u32(w, x.0)?;
            }
            Instruction::GlobalGet(x) => {
                w.write_all(&[0x23])?;
                encode_u32(w, x.0)?;
            }
            Instruction::GlobalSet(x) => {
                w.write_all(&[0x24])?;
                encode_u32(w, x.0)?;
            }
            Instruction::MemorySize => w.write_all(&[0x3F, 0x00])?,
            Instruction::MemoryGrow => w.write_all(&[0x40, 0x00])?,
            Instruction::I32Const(n) => {
                w.write_all(&[0x41])?;
                encode_i32(w, *n)?;
            }
            Instruction::I64Const(n) => {
                w.write_all(&[0x42])?;
                encode_i64(w, *n)?;
            }
            Instruction::F32Const(z) => {
                w.write_all(&[0x43])?;
                w.write_all(&z.to_le_bytes())?;
            }
            Instruction::F64Const(z) => {
                w.write_all(&[0x44])?;
                w.write_all(&z.to_le_bytes())?;
            }
            // written through the opcode tables above
            Instruction::Unreachable
            | Instruction::Nop
            | Instruction::Return
            | Instruction::RefIsNull
            | Instruction::Drop
            | Instruction::I32Eqz
            | Instruction::I32Eq
            | Instruction::I32Ne
            | Instruction::I32LtS
            | Instruction::I32LtU
            | Instruction::I32GtS
            | Instruction::I32GtU
            | Instruction::I32LeS
            | Instruction::I32LeU
            | Instruction::I32GeS
            | Instruction::I32GeU
            | Instruction::I32Clz
            | Instruction::I32Ctz
            | Instruction::I32Popcnt
            | Instruction::I32Add
            | Instruction::I32Sub
            | Instruction::I32Mul
            | Instruction::I32DivS
            | Instruction::I32DivU
            | Instruction::I32RemS
            | Instruction::I32RemU
            | Instruction::I32And
            | Instruction::I32Or
            | Instruction::I32Xor
            | Instruction::I32Shl
            | Instruction::I32ShrS
            | Instruction::I32ShrU
            | Instruction::I32Rotl
            | Instruction::I32Rotr
            | Instruction::I32Extend8S
            | Instruction::I32Extend16S
            | Instruction::Select(None)
            | Instruction::I32Load(_)
            | Instruction::I64Load(_)
            | Instruction::F32Load(_)
            | Instruction::F64Load(_)
            | Instruction::I32Load8s(_)
            | Instruction::I32Load8u(_)
            | Instruction::I32Load16s(_)
            | Instruction::I32Load16u(_)
            | Instruction::I32Store(_)
            | Instruction::I64Store(_)
            | Instruction::F32Store(_)
            | Instruction::F64Store(_)
            | Instruction::I32Store8(_)
            | Instruction::I32Store16(_) => {}
        }
        Ok(())
    }
}
