// This module implements result-type propagation for values whose defining
// instruction carries no type of its own. Pass-through forms (copies,
// truncates, address-space casts, bitcasts) inherit the type of their single
// source operand; constant and global-value materializations derive it from
// their declared literal type and intern it. The chase over a copy chain is
// an explicit stack walk with a per-run memo cache keyed by instruction
// handle, so long chains cost linear time once and never recurse. An
// instruction the propagator does not understand yields no type, which is a
// valid answer the caller must tolerate: not every instruction needs one.
// Every type resolved along a chain is bound to the chain's defined values on
// the way out.

//! Type propagation through copy-like instruction chains.

use crate::core::error::LegalizeResult;
use crate::ir::{Function, InstrId, ValueId};
use crate::legalize::registry::GlobalRegistry;
use crate::spv::Opcode;
use hashbrown::HashMap;

/// Memo cache for one rewriter run over a function.
pub type TypeCache = HashMap<InstrId, Option<ValueId>>;

/// Determine the result type of `instr_id`, interning it if needed and
/// binding it to every value defined along the chased chain.
pub fn propagate_type(
    func: &Function,
    registry: &mut GlobalRegistry,
    instr_id: InstrId,
    cache: &mut TypeCache,
) -> LegalizeResult<Option<ValueId>> {
    let mut chain: Vec<InstrId> = Vec::new();
    let mut cur = instr_id;

    let resolved = loop {
        if let Some(&cached) = cache.get(&cur) {
            break cached;
        }
        let instr = func.instr(cur);
        if let Some(ty) = instr.def.and_then(|def| registry.type_of(def)) {
            break Some(ty);
        }
        match instr.opcode {
            Opcode::GConstant | Opcode::GFConstant | Opcode::GGlobalValue => {
                break instr.ty.clone().map(|ty| registry.intern_type(ty));
            }
            op if op.is_pass_through() => {
                chain.push(cur);
                match instr.src_reg().and_then(|src| func.def_instr(src)) {
                    // A cyclic chain cannot resolve; treat it as untyped.
                    Some(next) if !chain.contains(&next) => cur = next,
                    _ => break None,
                }
            }
            _ => break None,
        }
    };

    chain.push(cur);
    for id in chain {
        cache.insert(id, resolved);
        if let Some(ty) = resolved {
            if let Some(def) = func.instr(id).def {
                registry.bind_type(def, ty)?;
            }
        }
    }
    Ok(resolved)
}
