//! spvemit - SPIR-V-style backend legalization and emission.
//!
//! The crate takes the register-based generic IR a front end produces,
//! legalizes it (explicit type bindings, deduplicated constants, resolved
//! identifier classes) and emits the result as assembly text or a binary
//! word stream driven by a per-opcode operand-grammar table.
//!
//! # Primary Usage
//!
//! ```ignore
//! use spvemit::core::TargetConfig;
//! use spvemit::legalize::{legalize_module, GlobalRegistry};
//! use spvemit::mc::emit;
//!
//! let mut registry = GlobalRegistry::new();
//! legalize_module(&mut module, &mut registry)?;
//! let target = TargetConfig::opencl_compute();
//! let insts = emit::emit_module(&module, &mut registry, &target)?;
//! println!("{}", emit::print_module(&insts)?);
//! ```
//!
//! # Architecture
//!
//! - [`spv`] - Instruction vocabulary: opcodes, grammar descriptors, operand
//!   kinds, strings, extended instruction sets
//! - [`ir`] - The register-based IR the passes operate on
//! - [`legalize`] - Registry, type propagation, the type-binding rewriter
//!   and id-class materialization
//! - [`mc`] - Lowering, textual printing and binary encoding
//! - [`core`] - Errors and target configuration

pub mod core;
pub mod ir;
pub mod legalize;
pub mod mc;
pub mod spv;

pub use crate::core::{LegalizeError, LegalizeResult, TargetConfig};
pub use crate::legalize::{legalize_function, legalize_module, GlobalRegistry};
