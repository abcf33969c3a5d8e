// This module is the machine-code layer: the flat instruction form that the
// textual printer and binary encoder consume, plus the lowering step that
// produces it from the legalized IR. An McInst is an opcode with a plain
// operand list and no def slot; when an instruction defines a result, the
// result id is operand 0, which keeps fixed-operand index arithmetic
// identical between the descriptor table and both emitters. Operands are
// down to three kinds by this point: ids, integer immediates and
// floating-point immediates. Symbolic references (function names, block
// references, extended-set immediates) are resolved by lowering before an
// McInst exists.

//! Flat machine instructions shared by the printer and encoder.

pub mod emit;
pub mod encoder;
pub mod lower;
pub mod printer;

use crate::spv::Opcode;

/// One operand of a flat instruction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum McOperand {
    /// Module-level id. Emitted 1-based in both output forms.
    Id(u32),
    /// Integer literal word (including packed string words and enum values).
    Imm(i64),
    /// Floating-point literal.
    FpImm(f64),
}

/// A flat instruction. Operand 0 is the result id when the opcode's
/// descriptor starts with a def.
#[derive(Debug, Clone, PartialEq)]
pub struct McInst {
    pub opcode: Opcode,
    pub operands: Vec<McOperand>,
}

impl McInst {
    pub fn new(opcode: Opcode) -> Self {
        Self {
            opcode,
            operands: Vec::new(),
        }
    }

    pub fn with_operands(mut self, operands: Vec<McOperand>) -> Self {
        self.operands = operands;
        self
    }

    pub fn push_id(&mut self, id: u32) {
        self.operands.push(McOperand::Id(id));
    }

    pub fn push_imm(&mut self, imm: i64) {
        self.operands.push(McOperand::Imm(imm));
    }

    /// Id value at operand index `k`, if that operand is an id.
    pub fn id_at(&self, k: usize) -> Option<u32> {
        match self.operands.get(k) {
            Some(McOperand::Id(v)) => Some(*v),
            _ => None,
        }
    }

    /// Immediate value at operand index `k`, if that operand is an imm.
    pub fn imm_at(&self, k: usize) -> Option<i64> {
        match self.operands.get(k) {
            Some(McOperand::Imm(v)) => Some(*v),
            _ => None,
        }
    }
}
