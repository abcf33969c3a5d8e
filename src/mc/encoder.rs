// This module turns flat instructions into binary words and back. Encoding
// is uniform: the leading word packs the total word count in the upper
// sixteen bits and the opcode value in the lower sixteen, ids follow
// 1-based, integer immediates are truncated to their word and
// floating-point immediates are stored as 32-bit float bits. Wide integer
// constants arrive from the builders already split into two words, low word
// first, so the encoder never re-packs them. The decoder walks the same
// descriptor grammar in reverse and exists for diagnostics and round-trip
// checks; where a tail is ambiguous in isolation (literal weights versus
// ids) it sides with the dominant form.

//! Binary word-stream encoding of flat instructions.

use crate::core::error::{LegalizeError, LegalizeResult};
use crate::mc::{McInst, McOperand};
use crate::spv::{FixedOp, MemoryOperand, Opcode, Tail};

fn shape_err(mnemonic: &'static str, reason: impl Into<String>) -> LegalizeError {
    LegalizeError::UnsupportedOperandShape {
        mnemonic,
        reason: reason.into(),
    }
}

/// Encode one instruction into its words.
pub fn encode_inst(inst: &McInst) -> LegalizeResult<Vec<u32>> {
    let desc = inst.opcode.desc().ok_or_else(|| {
        shape_err("<pseudo>", format!("{:?} has no binary form", inst.opcode))
    })?;
    let mut words = Vec::with_capacity(inst.operands.len() + 1);
    words.push(0);
    for op in &inst.operands {
        match op {
            McOperand::Id(v) => words.push(v + 1),
            McOperand::Imm(v) => words.push(*v as u32),
            McOperand::FpImm(v) => words.push((*v as f32).to_bits()),
        }
    }
    words[0] = ((words.len() as u32) << 16) | u32::from(desc.value);
    Ok(words)
}

/// Opcode of a binary opcode value. The two wide-constant mnemonics share
/// one value; the integer spelling wins on decode.
fn opcode_for_value(value: u16) -> Option<Opcode> {
    use Opcode::*;
    const CANDIDATES: &[Opcode] = &[
        OpUndef, OpName, OpString, OpExtension, OpExtInstImport, OpExtInst, OpMemoryModel,
        OpEntryPoint, OpExecutionMode, OpCapability, OpTypeVoid, OpTypeBool, OpTypeInt,
        OpTypeFloat, OpTypeVector, OpTypeImage, OpTypeStruct, OpTypePointer, OpTypeFunction,
        OpTypeForwardPointer, OpConstantTrue, OpConstantFalse, OpConstantI, OpConstantComposite,
        OpConstantNull, OpFunction, OpFunctionParameter, OpFunctionEnd, OpFunctionCall,
        OpVariable, OpLoad, OpStore, OpCopyMemory, OpCopyMemorySized, OpDecorate,
        OpMemberDecorate, OpImageSampleImplicitLod, OpImageFetch, OpImageRead, OpImageWrite,
        OpBitcast, OpIAdd, OpFAdd, OpISub, OpFSub, OpIMul, OpFMul, OpLoopMerge,
        OpSelectionMerge, OpLabel, OpBranch, OpBranchConditional, OpReturn, OpReturnValue,
    ];
    CANDIDATES
        .iter()
        .copied()
        .find(|op| op.desc().map(|d| d.value) == Some(value))
}

/// Decode one instruction from its words. Intended for diagnostics and
/// round-trip checks, not as a general reader.
pub fn decode_inst(words: &[u32]) -> LegalizeResult<McInst> {
    let Some(&word0) = words.first() else {
        return Err(shape_err("<binary>", "empty word stream"));
    };
    let count = (word0 >> 16) as usize;
    if count != words.len() {
        return Err(shape_err(
            "<binary>",
            format!("word count {} does not match stream length {}", count, words.len()),
        ));
    }
    let opcode = opcode_for_value(word0 as u16)
        .ok_or_else(|| shape_err("<binary>", format!("unknown opcode value {}", word0 as u16)))?;
    let desc = opcode.desc().ok_or_else(|| shape_err("<binary>", "opcode without grammar"))?;

    let mut inst = McInst::new(opcode);
    let mut idx = 1;
    let id = |w: u32| McOperand::Id(w.wrapping_sub(1));

    for &fixed in desc.fixed {
        let Some(&w) = words.get(idx) else {
            return Err(shape_err(desc.mnemonic, "truncated fixed operand region"));
        };
        match fixed {
            FixedOp::Def | FixedOp::Id => inst.operands.push(id(w)),
            FixedOp::Imm | FixedOp::Enum(_) | FixedOp::ExtInstNum => inst.push_imm(w as i64),
            FixedOp::Str => {
                // Consume words through the null terminator.
                while let Some(&w) = words.get(idx) {
                    inst.push_imm(w as i64);
                    idx += 1;
                    if w.to_le_bytes().contains(&0) {
                        break;
                    }
                }
                continue;
            }
        }
        idx += 1;
    }

    match desc.tail {
        Tail::None | Tail::StringDone => {}
        Tail::Plain | Tail::IdsOnly | Tail::Single | Tail::ExtInst => {
            for &w in &words[idx.min(words.len())..] {
                inst.operands.push(id(w));
            }
        }
        Tail::Literals | Tail::AccessQualifier | Tail::WideConstant | Tail::Decorate
        | Tail::MemoryGroups => {
            for &w in &words[idx.min(words.len())..] {
                inst.push_imm(w as i64);
            }
        }
        Tail::Memory | Tail::Image => {
            if let Some(&mask) = words.get(idx) {
                inst.push_imm(mask as i64);
                idx += 1;
                if desc.tail == Tail::Memory && mask & MemoryOperand::Aligned != 0 {
                    if let Some(&align) = words.get(idx) {
                        inst.push_imm(align as i64);
                        idx += 1;
                    }
                }
                for &w in &words[idx..] {
                    inst.operands.push(id(w));
                }
            }
        }
    }
    Ok(inst)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn word0_packs_count_and_value() {
        let words = encode_inst(
            &McInst::new(Opcode::OpTypeInt).with_operands(vec![
                McOperand::Id(1),
                McOperand::Imm(32),
                McOperand::Imm(0),
            ]),
        )
        .unwrap();
        assert_eq!(words, vec![(4 << 16) | 21, 2, 32, 0]);
    }

    #[test]
    fn ids_encode_one_based() {
        let words = encode_inst(
            &McInst::new(Opcode::OpBranch).with_operands(vec![McOperand::Id(0)]),
        )
        .unwrap();
        assert_eq!(words, vec![(2 << 16) | 249, 1]);
    }

    #[test]
    fn pseudo_has_no_binary_form() {
        assert!(encode_inst(&McInst::new(Opcode::GetId)).is_err());
    }

    #[test]
    fn aligned_load_round_trips() {
        let inst = McInst::new(Opcode::OpLoad).with_operands(vec![
            McOperand::Id(5),
            McOperand::Id(1),
            McOperand::Id(3),
            McOperand::Imm((MemoryOperand::Volatile | MemoryOperand::Aligned) as i64),
            McOperand::Imm(4),
        ]);
        let words = encode_inst(&inst).unwrap();
        assert_eq!(words.len(), 6);
        assert_eq!(decode_inst(&words).unwrap(), inst);
    }

    #[test]
    fn truncated_stream_is_rejected() {
        let mut words = encode_inst(
            &McInst::new(Opcode::OpBranch).with_operands(vec![McOperand::Id(0)]),
        )
        .unwrap();
        words.pop();
        assert!(decode_inst(&words).is_err());
    }
}
