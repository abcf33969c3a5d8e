// This module materializes id-class conversions around type-folding
// arithmetic. After the rewriter has run, every type-folding instruction's
// result feeds exactly one AssignType; its operands and result must then be
// moved into the id class matching the bound type so later selection sees
// plain ids rather than typed virtual values. The class is read off the
// registry: pointers map to the pointer class, vectors to the vector class
// (float-element vectors to their own), scalar floats to the float class and
// everything else to the plain id class. Each register operand gets one
// conversion pseudo inserted in front of the consumer (repeated operands
// share it) and the result is renamed into a fresh id, with the AssignType
// use updated to follow. The pass recognizes its own conversions and is a
// no-op the second time around.

//! Id-class materialization for type-folding instructions.

use crate::core::error::LegalizeResult;
use crate::ir::{BlockId, Function, Instr, Operand, SemanticType, ValueId};
use crate::legalize::registry::GlobalRegistry;
use crate::spv::Opcode;
use hashbrown::HashMap;

/// Conversion opcode for a value of the given interned type.
fn id_class_opcode(registry: &GlobalRegistry, type_id: ValueId) -> Opcode {
    let Some(ty) = registry.semantic_type(type_id) else {
        return Opcode::GetId;
    };
    if ty.is_pointer() {
        return Opcode::GetPId;
    }
    if let SemanticType::Vector { elem, .. } = ty {
        let float_elems = registry
            .semantic_type(*elem)
            .is_some_and(SemanticType::is_float);
        return if float_elems { Opcode::GetVfId } else { Opcode::GetVId };
    }
    if ty.is_float() {
        Opcode::GetFId
    } else {
        Opcode::GetId
    }
}

fn is_id_class_conversion(op: Opcode) -> bool {
    matches!(
        op,
        Opcode::GetId | Opcode::GetFId | Opcode::GetPId | Opcode::GetVId | Opcode::GetVfId
    )
}

/// Rewrite every type-folding instruction of `func` into id-class form.
pub fn materialize_id_classes(
    func: &mut Function,
    registry: &mut GlobalRegistry,
) -> LegalizeResult<()> {
    for block in 0..func.blocks.len() {
        let block = BlockId(block as u32);
        for instr_id in func.block_instrs(block) {
            if !func.instr(instr_id).opcode.is_type_folding() {
                continue;
            }
            // Already in id-class form if any operand flows through a
            // conversion pseudo.
            let converted = func.instr(instr_id).ops.iter().any(|op| match op {
                Operand::Reg(r) => func
                    .def_instr(*r)
                    .map(|d| is_id_class_conversion(func.instr(d).opcode))
                    .unwrap_or(false),
                _ => false,
            });
            if converted {
                continue;
            }

            // One conversion per distinct source register.
            let mut by_source: HashMap<ValueId, ValueId> = HashMap::new();
            let op_count = func.instr(instr_id).ops.len();
            for k in 0..op_count {
                let source = match func.instr(instr_id).ops[k] {
                    Operand::Reg(r) => r,
                    _ => continue,
                };
                let id_reg = match by_source.get(&source) {
                    Some(&r) => r,
                    None => {
                        let Some(type_id) = registry.type_of(source) else {
                            continue;
                        };
                        let conv = id_class_opcode(registry, type_id);
                        let id_reg = registry.fresh_id();
                        registry.bind_type(id_reg, type_id)?;
                        func.insert_before(
                            block,
                            instr_id,
                            Instr::new(conv)
                                .with_def(id_reg)
                                .with_ops(vec![Operand::Reg(source)]),
                        );
                        by_source.insert(source, id_reg);
                        id_reg
                    }
                };
                func.instr_mut(instr_id).ops[k] = Operand::Reg(id_reg);
            }

            // Rename the result into a fresh id of the same class and keep
            // the AssignType consumer pointing at it.
            if let Some(def_reg) = func.instr(instr_id).def {
                if let Some(type_id) = registry.type_of(def_reg) {
                    let id_reg = registry.fresh_id();
                    registry.bind_type(id_reg, type_id)?;
                    func.set_def(instr_id, id_reg);
                    func.replace_uses(def_reg, id_reg);
                }
            }
        }
    }
    Ok(())
}
