// This module lowers legalized IR instructions into flat machine
// instructions. Lowering is where the last symbolic references disappear:
// function-name operands resolve against the ids assigned to function
// definitions, block references resolve against durable per-block label ids
// assigned lazily on first touch (so forward branches and the block's own
// label agree), and the set immediate of an extended-instruction call is
// replaced by the id of the matching import. The resolution state lives in a
// ModuleInfo shared across the module; label ids are drawn from the same
// registry counter as every other id, keeping module numbering a single
// space.

//! IR-to-McInst lowering and the module-wide resolution tables.

use crate::core::error::{LegalizeError, LegalizeResult};
use crate::ir::{BlockId, Instr, Operand, ValueId};
use crate::legalize::GlobalRegistry;
use crate::mc::{McInst, McOperand};
use crate::spv::{strings, ExtInstSet, Opcode};
use hashbrown::HashMap;

/// Module-wide resolution state built up while lowering.
#[derive(Debug, Default)]
pub struct ModuleInfo {
    func_ids: HashMap<String, ValueId>,
    block_ids: HashMap<(u32, BlockId), ValueId>,
    import_ids: HashMap<ExtInstSet, ValueId>,
}

impl ModuleInfo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the result id of a function definition.
    pub fn register_function(&mut self, name: &str, id: ValueId) {
        self.func_ids.insert(name.to_string(), id);
    }

    pub fn function_id(&self, name: &str) -> LegalizeResult<ValueId> {
        self.func_ids
            .get(name)
            .copied()
            .ok_or_else(|| LegalizeError::UnresolvedSymbol {
                name: name.to_string(),
            })
    }

    /// Durable label id of a block, assigned on first touch.
    pub fn block_id(
        &mut self,
        func_idx: u32,
        block: BlockId,
        registry: &mut GlobalRegistry,
    ) -> ValueId {
        *self
            .block_ids
            .entry((func_idx, block))
            .or_insert_with(|| registry.fresh_id())
    }

    /// Record an extended-set import's result id.
    pub fn register_import(&mut self, set: ExtInstSet, id: ValueId) {
        self.import_ids.insert(set, id);
    }

    pub fn import_id(&self, set: ExtInstSet) -> LegalizeResult<ValueId> {
        self.import_ids
            .get(&set)
            .copied()
            .ok_or_else(|| LegalizeError::UnresolvedSymbol {
                name: set.name().to_string(),
            })
    }
}

/// Set selector carried as the set immediate of an un-lowered OpExtInst.
fn set_from_imm(v: i64) -> Option<ExtInstSet> {
    match v {
        0 => Some(ExtInstSet::OpenclStd),
        1 => Some(ExtInstSet::GlslStd450),
        _ => None,
    }
}

/// Index of the set operand of a flat OpExtInst.
pub const EXT_INST_SET_OPERAND: usize = 2;

/// Lower one IR instruction to its flat form.
pub fn lower_instr(
    instr: &Instr,
    func_idx: u32,
    info: &mut ModuleInfo,
    registry: &mut GlobalRegistry,
) -> LegalizeResult<McInst> {
    let mut out = McInst::new(instr.opcode);
    if let Some(def) = instr.def {
        out.push_id(def.0);
    }

    // An extended-set import defines the id later calls resolve against.
    if instr.opcode == Opcode::OpExtInstImport {
        if let Some(def) = instr.def {
            let words: Vec<u32> = instr
                .ops
                .iter()
                .filter_map(|op| match op {
                    Operand::Imm(v) => Some(*v as u32),
                    _ => None,
                })
                .collect();
            if let Some(set) = ExtInstSet::from_name(&strings::decode_string(&words)) {
                info.register_import(set, def);
            }
        }
    }

    for op in &instr.ops {
        let mc_index = out.operands.len();
        match op {
            Operand::Reg(r) => out.push_id(r.0),
            Operand::Imm(v) => {
                // The set selector of an extended call becomes the import id.
                if instr.opcode == Opcode::OpExtInst && mc_index == EXT_INST_SET_OPERAND {
                    let set = set_from_imm(*v).ok_or_else(|| {
                        LegalizeError::UnsupportedOperandShape {
                            mnemonic: "OpExtInst",
                            reason: format!("unknown instruction set selector {v}"),
                        }
                    })?;
                    out.push_id(info.import_id(set)?.0);
                } else {
                    out.push_imm(*v);
                }
            }
            Operand::FpImm(v) => out.operands.push(McOperand::FpImm(*v)),
            Operand::Block(b) => out.push_id(info.block_id(func_idx, *b, registry).0),
            Operand::Global(name) => out.push_id(info.function_id(name)?.0),
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::Function;

    #[test]
    fn block_ids_are_durable() {
        let mut registry = GlobalRegistry::new();
        let mut info = ModuleInfo::new();
        let mut f = Function::new("f");
        let b0 = f.add_block("entry");
        let b1 = f.add_block("exit");
        let first = info.block_id(0, b1, &mut registry);
        let again = info.block_id(0, b1, &mut registry);
        assert_eq!(first, again);
        assert_ne!(info.block_id(0, b0, &mut registry), first);
        // Same block index in a different function gets its own id.
        assert_ne!(info.block_id(1, b1, &mut registry), first);
    }

    #[test]
    fn branch_operand_resolves_to_label_id() {
        let mut registry = GlobalRegistry::new();
        let mut info = ModuleInfo::new();
        let mut f = Function::new("f");
        let _entry = f.add_block("entry");
        let exit = f.add_block("exit");
        let instr = Instr::new(Opcode::OpBranch).with_ops(vec![Operand::Block(exit)]);
        let mc = lower_instr(&instr, 0, &mut info, &mut registry).unwrap();
        let label = info.block_id(0, exit, &mut registry);
        assert_eq!(mc.operands, vec![McOperand::Id(label.0)]);
    }

    #[test]
    fn unresolved_callee_is_an_error() {
        let mut registry = GlobalRegistry::new();
        let mut info = ModuleInfo::new();
        let instr = Instr::new(Opcode::OpFunctionCall)
            .with_def(ValueId(0))
            .with_ops(vec![
                Operand::Reg(ValueId(1)),
                Operand::Global("missing".to_string()),
            ]);
        let err = lower_instr(&instr, 0, &mut info, &mut registry).unwrap_err();
        assert!(matches!(err, LegalizeError::UnresolvedSymbol { .. }));
    }

    #[test]
    fn ext_inst_set_imm_becomes_import_id() {
        let mut registry = GlobalRegistry::new();
        let mut info = ModuleInfo::new();
        let import_def = registry.fresh_id();
        let mut import = Instr::new(Opcode::OpExtInstImport).with_def(import_def);
        for word in strings::encode_string("OpenCL.std") {
            import.ops.push(Operand::Imm(word as i64));
        }
        lower_instr(&import, 0, &mut info, &mut registry).unwrap();

        let call = Instr::new(Opcode::OpExtInst)
            .with_def(ValueId(10))
            .with_ops(vec![
                Operand::Reg(ValueId(11)),
                Operand::Imm(0),
                Operand::Imm(crate::spv::opencl_std::SQRT),
                Operand::Reg(ValueId(12)),
            ]);
        let mc = lower_instr(&call, 0, &mut info, &mut registry).unwrap();
        assert_eq!(mc.id_at(EXT_INST_SET_OPERAND), Some(import_def.0));
    }
}
