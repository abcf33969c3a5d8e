// This module implements the type-binding rewriter, the pass that turns a
// raw generic function into one where every type-needing value has exactly
// one explicit AssignType instruction after its definition and every repeated
// constant resolves to the id first registered for it. It runs as a short
// pipeline per function: constant-tracking markers are honored first
// (registering new literals and rewiring duplicates to their canonical id,
// erasing superseded defs and composite producers whose elements have no
// other use), then marker operands that may be literal immediates are folded
// in place, bitcast markers become real bitcasts, and finally the
// AssignType-insertion walk runs in reverse post-order over the CFG visiting
// each block backward so pass-through propagation resolves before the
// original definition is rewritten. The walk is idempotent: values whose
// definitions are already bound are skipped, so a second run changes
// nothing.

//! Type-binding rewriter: constant tracking, operand folding and
//! AssignType insertion.

use crate::core::error::LegalizeResult;
use crate::ir::{BlockId, Function, Instr, InstrId, Operand, SemanticType, ValueId};
use crate::legalize::propagate::{propagate_type, TypeCache};
use crate::legalize::registry::{ConstKey, ConstScope, GlobalRegistry};
use crate::spv::Opcode;
use hashbrown::HashMap;

/// Identity key for the literal produced by a defining instruction,
/// interning its declared type. For vector builds every element constant is
/// registered individually as well, so sub-expressions dedup on their own.
fn const_key_of(
    func: &Function,
    registry: &mut GlobalRegistry,
    def_id: InstrId,
    scope: ConstScope,
) -> Option<ConstKey> {
    let instr = func.instr(def_id);
    match instr.opcode {
        Opcode::GConstant => {
            let ty = registry.intern_type(instr.ty.clone()?);
            let bits = match instr.ops.first()? {
                Operand::Imm(v) => *v as u64,
                _ => return None,
            };
            Some(ConstKey::Int { ty, bits })
        }
        Opcode::GFConstant => {
            let ty = registry.intern_type(instr.ty.clone()?);
            let bits = match instr.ops.first()? {
                Operand::FpImm(v) => v.to_bits(),
                Operand::Imm(v) => *v as u64,
                _ => return None,
            };
            Some(ConstKey::Float { ty, bits })
        }
        Opcode::GBuildVector | Opcode::GIntrConstComposite => {
            let elem_regs: Vec<ValueId> = instr
                .ops
                .iter()
                .filter_map(|op| match op {
                    Operand::Reg(r) => Some(*r),
                    _ => None,
                })
                .collect();
            let mut elems = Vec::with_capacity(elem_regs.len());
            let mut elem_ty = None;
            for reg in elem_regs {
                let elem_def = func.def_instr(reg)?;
                let key = const_key_of(func, registry, elem_def, scope)?;
                if elem_ty.is_none() {
                    elem_ty = func.instr(elem_def).ty.clone();
                }
                // Register the element itself for sub-expression reuse.
                elems.push(registry.add_constant(key, scope, reg));
            }
            let elem_ty = registry.intern_type(elem_ty?);
            let ty = registry.type_vector(elem_ty, elems.len() as u32);
            Some(ConstKey::Composite { ty, elems })
        }
        Opcode::GGlobalValue => match instr.ops.first()? {
            Operand::Global(name) => Some(ConstKey::Global { name: name.clone() }),
            _ => None,
        },
        _ => None,
    }
}

/// Honor constant-tracking markers: register new literals, rewire duplicate
/// results to the first-registered id and erase whatever that supersedes.
pub fn add_constants_to_track(
    func: &mut Function,
    func_idx: u32,
    registry: &mut GlobalRegistry,
) {
    let mut markers: Vec<InstrId> = Vec::new();
    let mut already: HashMap<InstrId, ValueId> = HashMap::new();

    for block in 0..func.blocks.len() {
        for instr_id in func.block_instrs(BlockId(block as u32)) {
            if func.instr(instr_id).opcode != Opcode::GIntrTrackConstant {
                continue;
            }
            markers.push(instr_id);
            let Some(tracked) = func.instr(instr_id).src_reg() else {
                continue;
            };
            let Some(def_id) = func.def_instr(tracked) else {
                continue;
            };
            let scope = if func.instr(def_id).opcode == Opcode::GGlobalValue {
                ConstScope::Module
            } else {
                ConstScope::Function(func_idx)
            };
            let Some(key) = const_key_of(func, registry, def_id, scope) else {
                continue;
            };
            match registry.lookup_constant(&key, scope) {
                None => {
                    registry.add_constant(key, scope, tracked);
                }
                Some(first) => {
                    log::debug!(
                        "constant held by %{} duplicates %{}",
                        tracked.0,
                        first.0
                    );
                    already.insert(instr_id, first);
                }
            }
        }
    }

    for marker in markers {
        let Some(target) = func.instr(marker).def else {
            func.erase(marker);
            continue;
        };
        let tracked = func.instr(marker).src_reg();
        let repl = already.get(&marker).copied().or(tracked);
        func.erase(marker);
        let Some(repl) = repl else { continue };
        func.replace_uses(target, repl);

        // A duplicated result leaves its original definition behind; erase
        // it once nothing consumes it, together with a composite producer's
        // now-unused element definitions.
        if let Some(tracked) = tracked {
            if repl != tracked && func.use_count(tracked) == 0 {
                if let Some(def_id) = func.def_instr(tracked) {
                    let elem_regs: Vec<ValueId> = func
                        .instr(def_id)
                        .ops
                        .iter()
                        .filter_map(|op| match op {
                            Operand::Reg(r) => Some(*r),
                            _ => None,
                        })
                        .collect();
                    func.erase(def_id);
                    for elem in elem_regs {
                        if func.use_count(elem) == 0 {
                            if let Some(elem_def) = func.def_instr(elem) {
                                func.erase(elem_def);
                            }
                        }
                    }
                }
            }
        }
    }
}

/// Fold constant register operands of literal-accepting markers into plain
/// immediates, erasing constant definitions that lose their last use.
pub fn fold_constant_operands(func: &mut Function) {
    let mut fold_candidates: Vec<ValueId> = Vec::new();
    for block in 0..func.blocks.len() {
        for instr_id in func.block_instrs(BlockId(block as u32)) {
            if func.instr(instr_id).opcode != Opcode::GIntrAssignName {
                continue;
            }
            let op_count = func.instr(instr_id).ops.len();
            for k in 1..op_count {
                let reg = match func.instr(instr_id).ops[k] {
                    Operand::Reg(r) => r,
                    _ => continue,
                };
                let Some(def_id) = func.def_instr(reg) else { continue };
                let def = func.instr(def_id);
                debug_assert_eq!(def.opcode, Opcode::GConstant);
                let imm = match def.ops.first() {
                    Some(Operand::Imm(v)) => *v,
                    _ => continue,
                };
                func.instr_mut(instr_id).ops[k] = Operand::Imm(imm);
                fold_candidates.push(reg);
            }
        }
    }
    for reg in fold_candidates {
        if func.use_count(reg) == 0 {
            if let Some(def_id) = func.def_instr(reg) {
                func.erase(def_id);
            }
        }
    }
}

/// Replace bitcast markers with real bitcast instructions.
pub fn insert_bitcasts(func: &mut Function) {
    for block in 0..func.blocks.len() {
        for instr_id in func.block_instrs(BlockId(block as u32)) {
            if func.instr(instr_id).opcode == Opcode::GIntrBitcast {
                func.instr_mut(instr_id).opcode = Opcode::GBitcast;
            }
        }
    }
}

/// Insert the AssignType pairing for `reg`, rewriting its definition to a
/// fresh id. Both the original and the fresh id are bound to the resolved
/// type, which is interned through the registry (a requested type is never
/// trusted verbatim). The binding goes into the block holding the
/// definition, which need not be the block the request came from.
pub fn insert_assign_instr(
    func: &mut Function,
    registry: &mut GlobalRegistry,
    reg: ValueId,
    ty: Option<SemanticType>,
    known_type: Option<ValueId>,
) -> LegalizeResult<ValueId> {
    let def_id = func
        .def_instr(reg)
        .expect("expecting an instruction that defines the value");
    let def_block = func
        .block_of(def_id)
        .expect("definition is listed in a block");
    let type_id = match known_type {
        Some(t) => t,
        None => registry.intern_type(ty.expect("either a semantic or an interned type")),
    };
    let new_reg = registry.fresh_id();
    registry.bind_type(reg, type_id)?;
    registry.bind_type(new_reg, type_id)?;
    func.set_def(def_id, new_reg);
    func.insert_after(
        def_block,
        def_id,
        Instr::new(Opcode::AssignType)
            .with_def(reg)
            .with_ops(vec![Operand::Reg(new_reg), Operand::Reg(type_id)]),
    );
    log::trace!("assign type %{} to %{} (def moved to %{})", type_id.0, reg.0, new_reg.0);
    Ok(new_reg)
}

/// The AssignType-insertion walk: reverse post-order over the CFG, each
/// block visited from its last instruction to its first.
pub fn generate_assign_instrs(
    func: &mut Function,
    registry: &mut GlobalRegistry,
) -> LegalizeResult<()> {
    let mut cache = TypeCache::new();
    let mut to_delete: Vec<InstrId> = Vec::new();

    for block in func.reverse_post_order() {
        for instr_id in func.block_instrs(block).into_iter().rev() {
            let opcode = func.instr(instr_id).opcode;
            match opcode {
                Opcode::GIntrAssignType => {
                    let target = func
                        .instr(instr_id)
                        .src_reg()
                        .expect("type marker names a register");
                    let requested = func.instr(instr_id).ty.clone();
                    let def_id = func
                        .def_instr(target)
                        .expect("expecting an instruction that defines the value");
                    // Global values already carry type info.
                    if func.instr(def_id).opcode != Opcode::GGlobalValue {
                        insert_assign_instr(func, registry, target, requested, None)?;
                    }
                    to_delete.push(instr_id);
                }
                Opcode::GConstant | Opcode::GFConstant | Opcode::GBuildVector => {
                    let Some(def_reg) = func.instr(instr_id).def else {
                        continue;
                    };
                    // Already rewritten on an earlier run or by a marker.
                    if registry.type_of(def_reg).is_some() {
                        continue;
                    }
                    // A sole consumer that is itself a type or name marker
                    // will handle (or fold away) this definition.
                    let users = func.users(def_reg);
                    if users.len() == 1 {
                        let user_op = func.instr(users[0]).opcode;
                        if matches!(
                            user_op,
                            Opcode::GIntrAssignType | Opcode::GIntrAssignName
                        ) {
                            continue;
                        }
                    }
                    let ty = match opcode {
                        Opcode::GBuildVector => build_vector_type(func, registry, instr_id),
                        _ => func.instr(instr_id).ty.clone(),
                    };
                    let Some(ty) = ty else { continue };
                    insert_assign_instr(func, registry, def_reg, Some(ty), None)?;
                }
                Opcode::GTrunc
                | Opcode::GGlobalValue
                | Opcode::GCopy
                | Opcode::GAddrSpaceCast
                | Opcode::GBitcast => {
                    propagate_type(func, registry, instr_id, &mut cache)?;
                }
                _ => {}
            }
        }
    }

    for id in to_delete {
        func.erase(id);
    }
    Ok(())
}

/// Vector type of a build-vector from its first element's declared type.
fn build_vector_type(
    func: &Function,
    registry: &mut GlobalRegistry,
    instr_id: InstrId,
) -> Option<SemanticType> {
    let instr = func.instr(instr_id);
    let len = instr.ops.len() as u32;
    let first = instr.src_reg()?;
    let elem_def = func.def_instr(first)?;
    let elem_ty = func.instr(elem_def).ty.clone()?;
    let elem = registry.intern_type(elem_ty);
    Some(SemanticType::Vector { elem, len })
}

/// Rewrite folded name markers into real OpName instructions. Markers whose
/// operands failed to fold never reach here in a well-formed pipeline.
pub fn lower_name_markers(func: &mut Function) {
    for block in 0..func.blocks.len() {
        for instr_id in func.block_instrs(BlockId(block as u32)) {
            let instr = func.instr(instr_id);
            if instr.opcode != Opcode::GIntrAssignName {
                continue;
            }
            let folded = instr.ops.iter().skip(1).all(|op| matches!(op, Operand::Imm(_)));
            debug_assert!(folded, "name marker with unfolded operands");
            if folded {
                func.instr_mut(instr_id).opcode = Opcode::OpName;
            }
        }
    }
}
