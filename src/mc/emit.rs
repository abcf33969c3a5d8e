// This module drives whole-module emission. It lays the flat instruction
// stream out in the logical section order consumers expect: capabilities
// first, then extensions, extended-set imports and the memory model, then
// the front end's header instructions (entry points, execution modes, names,
// decorations), then every type and constant declaration the registry
// materialized, and finally each function as OpFunction / label-led blocks /
// OpFunctionEnd.
// Function result ids and function types are assigned before anything that
// can reference a function is lowered, so forward calls and entry points
// resolve. Capabilities and extensions are emitted in sorted order to keep
// the stream deterministic. Bodies must be fully selected by this point; a
// generic or pseudo opcode in a block is reported, not silently skipped.

//! Whole-module emission: section ordering, text and binary serialization.

use crate::core::config::TargetConfig;
use crate::core::error::{LegalizeError, LegalizeResult};
use crate::ir::{BlockId, Instr, Module, Operand, ValueId};
use crate::legalize::GlobalRegistry;
use crate::mc::lower::{lower_instr, ModuleInfo};
use crate::mc::printer::InstPrinter;
use crate::mc::{encoder, McInst, McOperand};
use crate::spv::{strings, AddressingModel, Capability, MemoryModel, Opcode};

/// Binary module magic word.
pub const MAGIC: u32 = 0x0723_0203;

/// Flatten a module into ordered flat instructions.
pub fn emit_module(
    module: &Module,
    registry: &mut GlobalRegistry,
    target: &TargetConfig,
) -> LegalizeResult<Vec<McInst>> {
    let mut info = ModuleInfo::new();
    let mut out = Vec::new();

    let mut caps: Vec<Capability> = target.capabilities().collect();
    caps.sort_by_key(|c| *c as u32);
    for cap in caps {
        out.push(
            McInst::new(Opcode::OpCapability).with_operands(vec![McOperand::Imm(cap as i64)]),
        );
    }

    let mut exts: Vec<&str> = target.extensions().collect();
    exts.sort_unstable();
    for ext in exts {
        let mut inst = McInst::new(Opcode::OpExtension);
        for word in strings::encode_string(ext) {
            inst.push_imm(word as i64);
        }
        out.push(inst);
    }

    for &set in target.ext_inst_sets() {
        let def = registry.fresh_id();
        let mut import = Instr::new(Opcode::OpExtInstImport).with_def(def);
        for word in strings::encode_string(set.name()) {
            import.ops.push(Operand::Imm(word as i64));
        }
        out.push(lower_instr(&import, 0, &mut info, registry)?);
    }

    let (addressing, memory) = if target.declares_capability(Capability::Kernel) {
        (AddressingModel::Physical64, MemoryModel::OpenCL)
    } else {
        (AddressingModel::Logical, MemoryModel::GLSL450)
    };
    out.push(McInst::new(Opcode::OpMemoryModel).with_operands(vec![
        McOperand::Imm(addressing as i64),
        McOperand::Imm(memory as i64),
    ]));

    // Function ids and function types exist before any reference to them is
    // lowered and before the type section is written out.
    let mut signatures: Vec<(ValueId, ValueId, ValueId)> = Vec::new();
    for func in &module.functions {
        let fn_id = registry.fresh_id();
        info.register_function(&func.name, fn_id);
        let ret = registry.type_void();
        let fn_ty = registry.type_function(ret, Vec::new());
        registry.bind_type(fn_id, fn_ty)?;
        signatures.push((fn_id, ret, fn_ty));
    }

    for instr in &module.header {
        if !instr.opcode.is_header_instr() {
            return Err(LegalizeError::UnsupportedOperandShape {
                mnemonic: "<header>",
                reason: format!("{:?} is not a module-header instruction", instr.opcode),
            });
        }
        out.push(lower_instr(instr, 0, &mut info, registry)?);
    }

    for decl in registry.type_decls().to_vec() {
        debug_assert!(decl.opcode.is_type_decl_instr());
        out.push(lower_instr(&decl, 0, &mut info, registry)?);
    }
    for decl in registry.const_decls().to_vec() {
        debug_assert!(decl.opcode.is_constant_instr());
        out.push(lower_instr(&decl, 0, &mut info, registry)?);
    }

    for (func_idx, func) in module.functions.iter().enumerate() {
        let (fn_id, ret, fn_ty) = signatures[func_idx];
        out.push(McInst::new(Opcode::OpFunction).with_operands(vec![
            McOperand::Id(fn_id.0),
            McOperand::Id(ret.0),
            McOperand::Imm(0),
            McOperand::Id(fn_ty.0),
        ]));
        for block_idx in 0..func.blocks.len() {
            let block = BlockId(block_idx as u32);
            let label = info.block_id(func_idx as u32, block, registry);
            out.push(
                McInst::new(Opcode::OpLabel).with_operands(vec![McOperand::Id(label.0)]),
            );
            for instr_id in func.block_instrs(block) {
                let instr = func.instr(instr_id);
                if instr.opcode.is_pseudo() {
                    return Err(LegalizeError::UnsupportedOperandShape {
                        mnemonic: "<pseudo>",
                        reason: format!("{:?} reached emission in @{}", instr.opcode, func.name),
                    });
                }
                out.push(lower_instr(instr, func_idx as u32, &mut info, registry)?);
            }
        }
        out.push(McInst::new(Opcode::OpFunctionEnd));
    }
    Ok(out)
}

/// Render flat instructions as one assembly listing.
pub fn print_module(insts: &[McInst]) -> LegalizeResult<String> {
    let mut printer = InstPrinter::new();
    let mut out = String::new();
    for inst in insts {
        out.push_str(&printer.print_inst(inst)?);
        out.push('\n');
    }
    Ok(out)
}

/// Serialize flat instructions as a binary word stream with the standard
/// module header (magic, version, generator, id bound, schema).
pub fn encode_module(
    insts: &[McInst],
    registry: &GlobalRegistry,
    target: &TargetConfig,
) -> LegalizeResult<Vec<u32>> {
    let (major, minor) = target.version();
    let mut words = vec![
        MAGIC,
        (major << 16) | (minor << 8),
        0, // generator
        registry.id_count() + 1,
        0, // schema
    ];
    for inst in insts {
        words.extend(encoder::encode_inst(inst)?);
    }
    Ok(words)
}
