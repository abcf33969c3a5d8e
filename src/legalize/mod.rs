// This module wires the legalization passes into one per-function driver.
// The order is fixed: constant-tracking markers first (so duplicate literals
// collapse onto their canonical ids before anything consumes them), then
// marker-operand folding, bitcast materialization, the AssignType-insertion
// walk and finally id-class conversion for type-folding arithmetic. Name
// markers are rewritten into real name instructions at the end and the
// function's block lists are swept once, after all passes have marked their
// dead instructions. The registry is shared across functions of a module and
// owns the id counter, so running the driver over functions in order yields
// deterministic numbering.

//! Legalization passes and their per-function driver.

pub mod assign;
pub mod idclass;
pub mod propagate;
pub mod registry;

pub use registry::{ConstKey, ConstScope, GlobalRegistry};

use crate::core::error::LegalizeResult;
use crate::ir::Function;

/// Run the full legalization pipeline over one function.
pub fn legalize_function(
    func: &mut Function,
    func_idx: u32,
    registry: &mut GlobalRegistry,
) -> LegalizeResult<()> {
    log::debug!("legalizing function @{}", func.name);
    assign::add_constants_to_track(func, func_idx, registry);
    assign::fold_constant_operands(func);
    assign::insert_bitcasts(func);
    assign::generate_assign_instrs(func, registry)?;
    idclass::materialize_id_classes(func, registry)?;
    assign::lower_name_markers(func);
    func.sweep();
    Ok(())
}

/// Legalize every function of a module against one shared registry.
pub fn legalize_module(
    module: &mut crate::ir::Module,
    registry: &mut GlobalRegistry,
) -> LegalizeResult<()> {
    for (idx, func) in module.functions.iter_mut().enumerate() {
        legalize_function(func, idx as u32, registry)?;
    }
    Ok(())
}
