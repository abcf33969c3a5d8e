//! Test whole-module emission to assembly text.
//!
//! Builds a small fully-selected module and checks the printed listing:
//! section order, symbolic operand rendering, 1-based ids and string
//! quoting.

use spvemit::core::TargetConfig;
use spvemit::ir::{builders, Function, Instr, Module, Operand};
use spvemit::legalize::GlobalRegistry;
use spvemit::mc::emit;
use spvemit::spv::{strings, Decoration, ExecutionModel, LinkageType, Opcode};

/// One kernel, one named constant, one linkage decoration.
fn create_demo_module(registry: &mut GlobalRegistry) -> Module {
    let mut module = Module::new();

    let int32 = registry.type_int(32, false);
    let answer = registry.fresh_id();
    module.header.push(
        Instr::new(Opcode::OpConstantI)
            .with_def(answer)
            .with_ops(vec![Operand::Reg(int32), Operand::Imm(42)]),
    );
    module
        .header
        .push(builders::build_op_name(answer, "answer").unwrap());
    let mut export = builders::build_op_decorate(
        answer,
        Decoration::LinkageAttributes,
        &[],
        Some("answer"),
    );
    export.ops.push(Operand::Imm(LinkageType::Export as i64));
    module.header.push(export);

    let mut entry_point = Instr::new(Opcode::OpEntryPoint).with_ops(vec![
        Operand::Imm(ExecutionModel::Kernel as i64),
        Operand::Global("demo".to_string()),
    ]);
    for word in strings::encode_string("demo") {
        entry_point.ops.push(Operand::Imm(word as i64));
    }
    module.header.push(entry_point);

    let mut f = Function::new("demo");
    let entry = f.add_block("entry");
    f.append(entry, Instr::new(Opcode::OpReturn));
    module.add_function(f);
    module
}

fn emit_text() -> String {
    let mut registry = GlobalRegistry::new();
    let module = create_demo_module(&mut registry);
    let target = TargetConfig::opencl_compute();
    let insts = emit::emit_module(&module, &mut registry, &target).unwrap();
    emit::print_module(&insts).unwrap()
}

fn assert_has_line(text: &str, line: &str) {
    assert!(
        text.lines().any(|l| l == line),
        "missing line {line:?} in:\n{text}"
    );
}

#[test]
fn capabilities_come_first_in_value_order() {
    let text = emit_text();
    let caps: Vec<&str> = text
        .lines()
        .filter(|l| l.starts_with("OpCapability"))
        .collect();
    assert_eq!(
        caps,
        vec![
            "OpCapability Addresses",
            "OpCapability Linkage",
            "OpCapability Kernel",
            "OpCapability Float64",
            "OpCapability Int64",
        ]
    );
    assert!(text.starts_with("OpCapability"));
}

#[test]
fn header_renders_symbolically() {
    let text = emit_text();
    assert_has_line(&text, "%3 = OpExtInstImport \"OpenCL.std\"");
    assert_has_line(&text, "OpMemoryModel Physical64 OpenCL");
    assert_has_line(&text, "%2 = OpConstantI %1 42");
    assert_has_line(&text, "OpName %2 \"answer\"");
    assert_has_line(&text, "OpDecorate %2 LinkageAttributes \"answer\" Export");
    assert_has_line(&text, "OpEntryPoint Kernel %4 \"demo\"");
}

#[test]
fn types_precede_the_function_that_uses_them() {
    let text = emit_text();
    assert_has_line(&text, "%1 = OpTypeInt 32 0");
    assert_has_line(&text, "%5 = OpTypeVoid");
    assert_has_line(&text, "%6 = OpTypeFunction %5");
    assert_has_line(&text, "%4 = OpFunction %5 None %6");

    let fn_ty_pos = text.find("%6 = OpTypeFunction").unwrap();
    let fn_pos = text.find("%4 = OpFunction ").unwrap();
    assert!(fn_ty_pos < fn_pos);
}

#[test]
fn function_body_is_label_led_and_terminated() {
    let text = emit_text();
    let lines: Vec<&str> = text.lines().collect();
    let open = lines
        .iter()
        .position(|l| l.starts_with("%4 = OpFunction "))
        .unwrap();
    assert_eq!(lines[open + 1], "%7 = OpLabel");
    assert_eq!(lines[open + 2], "OpReturn");
    assert_eq!(lines[open + 3], "OpFunctionEnd");
}

#[test]
fn pseudo_in_a_body_is_reported() {
    let mut registry = GlobalRegistry::new();
    let mut module = Module::new();
    let mut f = Function::new("broken");
    let entry = f.add_block("entry");
    let v = registry.fresh_id();
    f.append(
        entry,
        Instr::new(Opcode::GConstant)
            .with_def(v)
            .with_ops(vec![Operand::Imm(1)]),
    );
    module.add_function(f);
    let target = TargetConfig::opencl_compute();
    assert!(emit::emit_module(&module, &mut registry, &target).is_err());
}
