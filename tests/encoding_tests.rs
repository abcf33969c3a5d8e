//! Test binary encoding of whole modules and single instructions.
//!
//! Checks the module header words, the per-instruction word-count layout,
//! 1-based id emission and the low-word-first split of 64-bit constants.

use spvemit::core::TargetConfig;
use spvemit::ir::{builders, Function, Instr, Module, Operand};
use spvemit::legalize::{ConstScope, GlobalRegistry};
use spvemit::mc::lower::{lower_instr, ModuleInfo};
use spvemit::mc::{emit, encoder, McInst, McOperand};
use spvemit::spv::{MemoryOperand, Opcode};

fn emit_words() -> (Vec<u32>, GlobalRegistry) {
    let mut registry = GlobalRegistry::new();
    let mut module = Module::new();
    let int32 = registry.type_int(32, false);
    let answer = registry.fresh_id();
    module.header.push(
        Instr::new(Opcode::OpConstantI)
            .with_def(answer)
            .with_ops(vec![Operand::Reg(int32), Operand::Imm(42)]),
    );
    let mut f = Function::new("demo");
    let entry = f.add_block("entry");
    f.append(entry, Instr::new(Opcode::OpReturn));
    module.add_function(f);

    let target = TargetConfig::opencl_compute();
    let insts = emit::emit_module(&module, &mut registry, &target).unwrap();
    let words = emit::encode_module(&insts, &registry, &target).unwrap();
    (words, registry)
}

#[test]
fn module_header_words() {
    let (words, registry) = emit_words();
    assert_eq!(words[0], emit::MAGIC);
    assert_eq!(words[1], (1 << 16) | (2 << 8));
    assert_eq!(words[2], 0);
    assert_eq!(words[3], registry.id_count() + 1);
    assert_eq!(words[4], 0);
}

#[test]
fn word_counts_tile_the_stream_exactly() {
    let (words, _) = emit_words();
    let mut idx = 5;
    let mut instrs = 0;
    while idx < words.len() {
        let count = (words[idx] >> 16) as usize;
        assert!(count >= 1, "zero-length instruction at word {idx}");
        idx += count;
        instrs += 1;
    }
    assert_eq!(idx, words.len());
    assert!(instrs > 5);
}

#[test]
fn type_int_encodes_one_based_def() {
    let (words, _) = emit_words();
    // OpTypeInt %1 32 0: four words, value 21, def id 0 emitted as 1.
    let mut idx = 5;
    while idx < words.len() {
        let count = (words[idx] >> 16) as usize;
        if words[idx] as u16 == 21 {
            assert_eq!(&words[idx..idx + count], &[(4 << 16) | 21, 1, 32, 0]);
            return;
        }
        idx += count;
    }
    panic!("no OpTypeInt in stream");
}

#[test]
fn wide_constant_encodes_low_word_first() {
    let mut registry = GlobalRegistry::new();
    let mut info = ModuleInfo::new();
    let ty = registry.type_int(64, false);
    let c = registry.fresh_id();
    let mut instr = Instr::new(Opcode::OpConstantI)
        .with_def(c)
        .with_ops(vec![Operand::Reg(ty)]);
    builders::push_const_words(0x1_0000_002a, 64, &mut instr.ops).unwrap();

    let mc = lower_instr(&instr, 0, &mut info, &mut registry).unwrap();
    let words = encoder::encode_inst(&mc).unwrap();
    assert_eq!(words, vec![(5 << 16) | 43, c.0 + 1, ty.0 + 1, 0x2a, 1]);
}

#[test]
fn copy_memory_groups_round_trip() {
    let inst = McInst::new(Opcode::OpCopyMemory).with_operands(vec![
        McOperand::Id(4),
        McOperand::Id(7),
        McOperand::Imm((MemoryOperand::Volatile | MemoryOperand::Aligned) as i64),
        McOperand::Imm(16),
        McOperand::Imm(MemoryOperand::Nontemporal as i64),
    ]);
    let words = encoder::encode_inst(&inst).unwrap();
    assert_eq!(words.len(), 6);
    assert_eq!(encoder::decode_inst(&words).unwrap(), inst);
}

#[test]
fn float_immediates_encode_as_f32_bits() {
    let inst = McInst::new(Opcode::OpConstantF).with_operands(vec![
        McOperand::Id(3),
        McOperand::Id(1),
        McOperand::FpImm(1.5),
    ]);
    let words = encoder::encode_inst(&inst).unwrap();
    assert_eq!(words[3], 1.5f32.to_bits());
}

#[test]
fn double_constants_encode_both_words() {
    let mut registry = GlobalRegistry::new();
    let mut info = ModuleInfo::new();
    let f64_ty = registry.type_float(64);
    let value = 1.000_000_000_000_000_2_f64;
    let c = registry
        .get_or_create_const_float(f64_ty, value, ConstScope::Module)
        .unwrap();

    let decl = registry.const_decls()[0].clone();
    let inst = lower_instr(&decl, 0, &mut info, &mut registry).unwrap();
    let words = encoder::encode_inst(&inst).unwrap();

    let bits = value.to_bits();
    assert_eq!(
        words,
        vec![
            (5 << 16) | 43,
            c.0 + 1,
            f64_ty.0 + 1,
            (bits & 0xffff_ffff) as u32,
            (bits >> 32) as u32,
        ]
    );
}

#[test]
fn body_opcode_in_the_header_is_reported() {
    let mut registry = GlobalRegistry::new();
    let mut module = Module::new();
    module.header.push(Instr::new(Opcode::OpReturn));
    let target = TargetConfig::opencl_compute();
    let err = emit::emit_module(&module, &mut registry, &target).unwrap_err();
    assert!(matches!(
        err,
        spvemit::LegalizeError::UnsupportedOperandShape { .. }
    ));
}
