// This module defines the register-based IR that the legalization passes
// operate on. A module holds functions plus module-level header instructions;
// a function holds named basic blocks and an index-addressed instruction
// arena. Instructions live in the arena behind stable InstrId handles and
// carry a live flag: passes mark instructions dead while iterating and a
// separate sweep removes them from block lists afterwards, so no iterator is
// ever invalidated by erasure. Every instruction has at most one defined
// value; a per-function definition map provides O(1) lookup from a value id
// to its defining instruction, while use queries scan live instructions.
// Value ids are issued by the registry from a single module-wide counter, so
// numbering is deterministic for a given build order. The block walk used by
// the rewriter (reverse post-order over successors) also lives here, in the
// same explicit-stack form the analyzer uses.

//! Register-based IR: module, functions, blocks and the instruction arena.

use crate::spv::Opcode;
use hashbrown::HashMap;
use std::collections::HashSet;

pub mod builders;
pub mod types;

pub use types::SemanticType;

/// Opaque handle naming the result of a defining instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ValueId(pub u32);

/// Stable handle of an instruction in a function's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstrId(pub u32);

/// Handle of a basic block within a function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockId(pub u32);

/// One operand of an instruction.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// Use of a defined value.
    Reg(ValueId),
    /// Integer literal, including packed string-literal words.
    Imm(i64),
    /// Floating-point literal; lowered to its bit pattern for the binary
    /// encoding.
    FpImm(f64),
    /// Reference to a basic block, resolved to a durable id at lowering.
    Block(BlockId),
    /// Reference to a function or global by name, resolved at lowering.
    Global(String),
}

/// An instruction in the arena.
#[derive(Debug, Clone)]
pub struct Instr {
    pub opcode: Opcode,
    pub def: Option<ValueId>,
    pub ops: Vec<Operand>,
    /// Declared type metadata, carried by constant/global materializations
    /// and by type-request markers. Erased along with the markers.
    pub ty: Option<SemanticType>,
    live: bool,
}

impl Instr {
    pub fn new(opcode: Opcode) -> Self {
        Self {
            opcode,
            def: None,
            ops: Vec::new(),
            ty: None,
            live: true,
        }
    }

    pub fn with_def(mut self, def: ValueId) -> Self {
        self.def = Some(def);
        self
    }

    pub fn with_ops(mut self, ops: Vec<Operand>) -> Self {
        self.ops = ops;
        self
    }

    pub fn with_type(mut self, ty: SemanticType) -> Self {
        self.ty = Some(ty);
        self
    }

    pub fn is_live(&self) -> bool {
        self.live
    }

    /// First register operand, if any. The single source of copy-like forms.
    pub fn src_reg(&self) -> Option<ValueId> {
        self.ops.iter().find_map(|op| match op {
            Operand::Reg(r) => Some(*r),
            _ => None,
        })
    }
}

/// A basic block: ordered instruction handles plus successor edges.
#[derive(Debug, Clone)]
pub struct Block {
    pub name: String,
    pub instrs: Vec<InstrId>,
    pub succs: Vec<BlockId>,
}

/// A function: blocks over a shared instruction arena.
#[derive(Debug)]
pub struct Function {
    pub name: String,
    pub blocks: Vec<Block>,
    instrs: Vec<Instr>,
    defs: HashMap<ValueId, InstrId>,
}

impl Function {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            blocks: Vec::new(),
            instrs: Vec::new(),
            defs: HashMap::new(),
        }
    }

    pub fn add_block(&mut self, name: &str) -> BlockId {
        let id = BlockId(self.blocks.len() as u32);
        self.blocks.push(Block {
            name: name.to_string(),
            instrs: Vec::new(),
            succs: Vec::new(),
        });
        id
    }

    pub fn add_edge(&mut self, from: BlockId, to: BlockId) {
        let succs = &mut self.blocks[from.0 as usize].succs;
        if !succs.contains(&to) {
            succs.push(to);
        }
    }

    pub fn entry_block(&self) -> BlockId {
        BlockId(0)
    }

    pub fn block(&self, id: BlockId) -> &Block {
        &self.blocks[id.0 as usize]
    }

    pub fn instr(&self, id: InstrId) -> &Instr {
        &self.instrs[id.0 as usize]
    }

    pub fn instr_mut(&mut self, id: InstrId) -> &mut Instr {
        &mut self.instrs[id.0 as usize]
    }

    fn alloc(&mut self, instr: Instr) -> InstrId {
        let id = InstrId(self.instrs.len() as u32);
        if let Some(def) = instr.def {
            debug_assert!(!self.defs.contains_key(&def), "value %{} redefined", def.0);
            self.defs.insert(def, id);
        }
        self.instrs.push(instr);
        id
    }

    /// Append an instruction to the end of a block.
    pub fn append(&mut self, block: BlockId, instr: Instr) -> InstrId {
        let id = self.alloc(instr);
        self.blocks[block.0 as usize].instrs.push(id);
        id
    }

    /// Insert an instruction immediately after `after` in `block`. The
    /// anchor must live in that block.
    pub fn insert_after(&mut self, block: BlockId, after: InstrId, instr: Instr) -> InstrId {
        let id = self.alloc(instr);
        let list = &mut self.blocks[block.0 as usize].instrs;
        let pos = list
            .iter()
            .position(|&i| i == after)
            .expect("insertion anchor lives in another block");
        list.insert(pos + 1, id);
        id
    }

    /// Insert an instruction immediately before `before` in `block`. The
    /// anchor must live in that block.
    pub fn insert_before(&mut self, block: BlockId, before: InstrId, instr: Instr) -> InstrId {
        let id = self.alloc(instr);
        let list = &mut self.blocks[block.0 as usize].instrs;
        let pos = list
            .iter()
            .position(|&i| i == before)
            .expect("insertion anchor lives in another block");
        list.insert(pos, id);
        id
    }

    /// Block holding an instruction, if it is still listed in one.
    pub fn block_of(&self, instr_id: InstrId) -> Option<BlockId> {
        self.blocks
            .iter()
            .position(|b| b.instrs.contains(&instr_id))
            .map(|i| BlockId(i as u32))
    }

    /// Defining instruction of a value, if it is defined in this function.
    pub fn def_instr(&self, reg: ValueId) -> Option<InstrId> {
        self.defs.get(&reg).copied().filter(|&i| self.instrs[i.0 as usize].live)
    }

    /// Move the definition of `instr_id` to a different value id.
    pub fn set_def(&mut self, instr_id: InstrId, new_def: ValueId) {
        if let Some(old) = self.instrs[instr_id.0 as usize].def {
            self.defs.remove(&old);
        }
        self.instrs[instr_id.0 as usize].def = Some(new_def);
        self.defs.insert(new_def, instr_id);
    }

    /// Mark an instruction dead. Block lists are cleaned by [`Self::sweep`].
    pub fn erase(&mut self, instr_id: InstrId) {
        let instr = &mut self.instrs[instr_id.0 as usize];
        instr.live = false;
        if let Some(def) = instr.def {
            self.defs.remove(&def);
        }
    }

    /// Remove dead instruction handles from every block list.
    pub fn sweep(&mut self) {
        let instrs = &self.instrs;
        for block in &mut self.blocks {
            block.instrs.retain(|&i| instrs[i.0 as usize].live);
        }
    }

    /// Number of live uses of a value across the function.
    pub fn use_count(&self, reg: ValueId) -> usize {
        self.instrs
            .iter()
            .filter(|i| i.live)
            .flat_map(|i| i.ops.iter())
            .filter(|op| matches!(op, Operand::Reg(r) if *r == reg))
            .count()
    }

    /// Handles of live instructions that use `reg`.
    pub fn users(&self, reg: ValueId) -> Vec<InstrId> {
        self.instrs
            .iter()
            .enumerate()
            .filter(|(_, i)| {
                i.live && i.ops.iter().any(|op| matches!(op, Operand::Reg(r) if *r == reg))
            })
            .map(|(idx, _)| InstrId(idx as u32))
            .collect()
    }

    /// Rewrite every use of `old` to `new`.
    pub fn replace_uses(&mut self, old: ValueId, new: ValueId) {
        for instr in self.instrs.iter_mut().filter(|i| i.live) {
            for op in &mut instr.ops {
                if matches!(op, Operand::Reg(r) if *r == old) {
                    *op = Operand::Reg(new);
                }
            }
        }
    }

    /// Live instruction handles of a block, in order.
    pub fn block_instrs(&self, block: BlockId) -> Vec<InstrId> {
        self.blocks[block.0 as usize]
            .instrs
            .iter()
            .copied()
            .filter(|&i| self.instrs[i.0 as usize].live)
            .collect()
    }

    /// Blocks in reverse post-order over the successor graph.
    pub fn reverse_post_order(&self) -> Vec<BlockId> {
        if self.blocks.is_empty() {
            return Vec::new();
        }
        let mut post = Vec::new();
        let mut stack = vec![(self.entry_block(), false)];
        let mut visited = HashSet::new();
        while let Some((block, processed)) = stack.pop() {
            if processed {
                post.push(block);
                continue;
            }
            if !visited.insert(block) {
                continue;
            }
            stack.push((block, true));
            for &succ in &self.blocks[block.0 as usize].succs {
                stack.push((succ, false));
            }
        }
        post.reverse();
        post
    }

    /// Stable textual dump used by tests to pin pass output.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("func @{} {{\n", self.name));
        for block_id in (0..self.blocks.len()).map(|i| BlockId(i as u32)) {
            let block = self.block(block_id);
            out.push_str(&format!("{}:\n", block.name));
            for instr_id in self.block_instrs(block_id) {
                let instr = self.instr(instr_id);
                out.push_str("  ");
                if let Some(def) = instr.def {
                    out.push_str(&format!("%{} = ", def.0));
                }
                out.push_str(&format!("{:?}", instr.opcode));
                for op in &instr.ops {
                    match op {
                        Operand::Reg(r) => out.push_str(&format!(" %{}", r.0)),
                        Operand::Imm(v) => out.push_str(&format!(" ${v}")),
                        Operand::FpImm(v) => out.push_str(&format!(" ${v}")),
                        Operand::Block(b) => {
                            out.push_str(&format!(" ^{}", self.block(*b).name))
                        }
                        Operand::Global(name) => out.push_str(&format!(" @{name}")),
                    }
                }
                out.push('\n');
            }
        }
        out.push_str("}\n");
        out
    }
}

/// A compilation unit: header instructions plus functions.
#[derive(Debug, Default)]
pub struct Module {
    /// Module-level instructions (entry points, execution modes, names,
    /// decorations, extended-set imports).
    pub header: Vec<Instr>,
    pub functions: Vec<Function>,
}

impl Module {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_function(&mut self, func: Function) -> usize {
        self.functions.push(func);
        self.functions.len() - 1
    }
}
