//! Demo emission binary.
//!
//! Runs the legalization pipeline on a small marker-laden kernel and emits a
//! fully-selected demo module as assembly text, optionally writing the
//! binary word stream to a file.

use clap::Parser;
use spvemit::core::TargetConfig;
use spvemit::ir::{Function, Instr, Module, Operand, SemanticType};
use spvemit::legalize::{legalize_function, GlobalRegistry};
use spvemit::mc::emit;
use spvemit::spv::{strings, ExecutionModel, Opcode};
use std::fs;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "spvemit", about = "Legalize and emit the built-in demo module")]
struct Cli {
    /// Write the binary word stream to this file.
    #[arg(long)]
    binary: Option<PathBuf>,

    /// Print the demo kernel before and after legalization.
    #[arg(long)]
    show_ir: bool,
}

/// A kernel the way a front end would hand it over: duplicate tracked
/// constants and a typed add that still needs its AssignType.
fn demo_kernel(registry: &mut GlobalRegistry) -> Function {
    let int32 = SemanticType::Int {
        width: 32,
        signed: false,
    };
    let mut f = Function::new("demo");
    let entry = f.add_block("entry");

    let a = registry.fresh_id();
    f.append(
        entry,
        Instr::new(Opcode::GConstant)
            .with_def(a)
            .with_ops(vec![Operand::Imm(42)])
            .with_type(int32.clone()),
    );
    let ta = registry.fresh_id();
    f.append(
        entry,
        Instr::new(Opcode::GIntrTrackConstant)
            .with_def(ta)
            .with_ops(vec![Operand::Reg(a)]),
    );

    let b = registry.fresh_id();
    f.append(
        entry,
        Instr::new(Opcode::GConstant)
            .with_def(b)
            .with_ops(vec![Operand::Imm(42)])
            .with_type(int32.clone()),
    );
    let tb = registry.fresh_id();
    f.append(
        entry,
        Instr::new(Opcode::GIntrTrackConstant)
            .with_def(tb)
            .with_ops(vec![Operand::Reg(b)]),
    );

    let sum = registry.fresh_id();
    f.append(
        entry,
        Instr::new(Opcode::GAdd)
            .with_def(sum)
            .with_ops(vec![Operand::Reg(ta), Operand::Reg(tb)]),
    );
    f.append(
        entry,
        Instr::new(Opcode::GIntrAssignType)
            .with_ops(vec![Operand::Reg(sum)])
            .with_type(int32),
    );
    f
}

/// A fully-selected module ready for emission.
fn demo_module(registry: &mut GlobalRegistry) -> Module {
    let mut module = Module::new();

    let int32 = registry.type_int(32, false);
    let answer = registry.fresh_id();
    module.header.push(
        Instr::new(Opcode::OpConstantI)
            .with_def(answer)
            .with_ops(vec![Operand::Reg(int32), Operand::Imm(42)]),
    );
    if let Some(name) = spvemit::ir::builders::build_op_name(answer, "answer") {
        module.header.push(name);
    }

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

fn run(cli: &Cli) -> spvemit::LegalizeResult<()> {
    let mut registry = GlobalRegistry::new();
    let mut kernel = demo_kernel(&mut registry);
    if cli.show_ir {
        println!("; before legalization\n{}", kernel.dump());
    }
    legalize_function(&mut kernel, 0, &mut registry)?;
    if cli.show_ir {
        println!("; after legalization\n{}", kernel.dump());
    }

    let mut registry = GlobalRegistry::new();
    let module = demo_module(&mut registry);
    let target = TargetConfig::opencl_compute();
    let insts = emit::emit_module(&module, &mut registry, &target)?;
    print!("{}", emit::print_module(&insts)?);

    if let Some(path) = &cli.binary {
        let words = emit::encode_module(&insts, &registry, &target)?;
        let mut bytes = Vec::with_capacity(words.len() * 4);
        for word in words {
            bytes.extend_from_slice(&word.to_le_bytes());
        }
        if let Err(e) = fs::write(path, bytes) {
            eprintln!("error: cannot write {}: {e}", path.display());
            std::process::exit(1);
        }
    }
    Ok(())
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();
    if let Err(e) = run(&cli) {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
