// This module holds the small instruction-building helpers shared by the
// legalizer, the registry and the tests: packing a constant's bit pattern
// into immediate operands at its declared width (64-bit values split into two
// words, low word first; widths outside 1/8/16/32/64 are rejected), packing a
// string literal into immediate word operands, and the convenience builders
// for name and decoration instructions that combine both.

//! Builder helpers for immediates, strings, names and decorations.

use crate::core::error::{LegalizeError, LegalizeResult};
use crate::ir::{Instr, Operand, ValueId};
use crate::spv::{strings, Decoration, Opcode};

/// Append a constant's bit pattern as immediate operands at the given width.
///
/// 1-bit constants contribute no operand (true/false are separate opcodes);
/// 64-bit constants split into two 32-bit words, low word first.
pub fn push_const_words(bits: u64, width: u32, ops: &mut Vec<Operand>) -> LegalizeResult<()> {
    match width {
        1 => {}
        8 | 16 | 32 => ops.push(Operand::Imm((bits & 0xffff_ffff) as i64)),
        64 => {
            ops.push(Operand::Imm((bits & 0xffff_ffff) as i64));
            ops.push(Operand::Imm(((bits >> 32) & 0xffff_ffff) as i64));
        }
        _ => return Err(LegalizeError::UnsupportedConstantWidth { width }),
    }
    Ok(())
}

/// Append a string literal as packed immediate word operands.
pub fn push_string_imm(s: &str, ops: &mut Vec<Operand>) {
    for word in strings::encode_string(s) {
        ops.push(Operand::Imm(i64::from(word)));
    }
}

/// Build an `OpName` binding a textual name to a value. Empty names produce
/// no instruction.
pub fn build_op_name(target: ValueId, name: &str) -> Option<Instr> {
    if name.is_empty() {
        return None;
    }
    let mut ops = vec![Operand::Reg(target)];
    push_string_imm(name, &mut ops);
    Some(Instr::new(Opcode::OpName).with_ops(ops))
}

/// Build an `OpDecorate` with optional string and literal arguments.
pub fn build_op_decorate(
    target: ValueId,
    dec: Decoration,
    dec_args: &[u32],
    str_imm: Option<&str>,
) -> Instr {
    let mut ops = vec![Operand::Reg(target), Operand::Imm(i64::from(dec as u32))];
    if let Some(s) = str_imm {
        push_string_imm(s, &mut ops);
    }
    for &arg in dec_args {
        ops.push(Operand::Imm(i64::from(arg)));
    }
    Instr::new(Opcode::OpDecorate).with_ops(ops)
}
