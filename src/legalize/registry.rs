// This module implements the per-compilation-unit registry that owns value
// id allocation, structural type interning, constant deduplication and the
// value-to-type binding table. Types are interned bottom-up: a composite
// SemanticType embeds the already-interned ids of its components, so
// structural identity is plain map equality, and the first interning of a
// type also materializes its OpType* declaration instruction in a
// module-level section kept in insertion order. Constants and global-value
// references are tracked in a forward map from (literal, scope) to the id
// first registered for them; the scope is the whole module for globals and
// the owning function for everything else. The binding table records the
// resolved type of every defined value and refuses to rebind a value to a
// structurally different type. Registry growth is monotonic; nothing is ever
// removed. The registry is an explicit context object handed &mut to each
// pass, never global state, and it is the single id issuer so identifier
// numbering is deterministic for a given traversal order.

//! Type/constant registry: interning, deduplication and type bindings.

use crate::core::error::{LegalizeError, LegalizeResult};
use crate::ir::{Instr, Operand, SemanticType, ValueId};
use crate::spv::{Opcode, StorageClass};
use hashbrown::HashMap;

/// Deduplication scope of a constant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstScope {
    /// Whole module: global values.
    Module,
    /// One function, by index in the module.
    Function(u32),
}

/// Identity of a constant literal: its interned type id plus its value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ConstKey {
    Int { ty: ValueId, bits: u64 },
    Float { ty: ValueId, bits: u64 },
    Composite { ty: ValueId, elems: Vec<ValueId> },
    Null { ty: ValueId },
    Global { name: String },
}

/// Per-compilation-unit table of interned types, deduplicated constants and
/// value type bindings. The single issuer of value ids.
#[derive(Debug, Default)]
pub struct GlobalRegistry {
    next_id: u32,
    types: HashMap<SemanticType, ValueId>,
    type_list: Vec<(ValueId, SemanticType)>,
    type_by_id: HashMap<ValueId, usize>,
    type_decls: Vec<Instr>,
    consts: HashMap<(ConstKey, ConstScope), ValueId>,
    const_decls: Vec<Instr>,
    bindings: HashMap<ValueId, ValueId>,
}

impl GlobalRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a fresh value id. Monotonic across the whole unit.
    pub fn fresh_id(&mut self) -> ValueId {
        let id = ValueId(self.next_id);
        self.next_id += 1;
        id
    }

    pub fn id_count(&self) -> u32 {
        self.next_id
    }

    /// Intern a structural type, materializing its declaration on first use.
    ///
    /// Component types must be interned before any composite built from
    /// them, since composite identity embeds component ids.
    pub fn intern_type(&mut self, ty: SemanticType) -> ValueId {
        if let Some(&id) = self.types.get(&ty) {
            return id;
        }
        let id = self.fresh_id();
        log::trace!("intern type {:?} as %{}", ty, id.0);
        self.type_decls.push(Self::type_decl(id, &ty));
        self.types.insert(ty.clone(), id);
        self.type_by_id.insert(id, self.type_list.len());
        self.type_list.push((id, ty));
        id
    }

    fn type_decl(id: ValueId, ty: &SemanticType) -> Instr {
        match ty {
            SemanticType::Void => Instr::new(Opcode::OpTypeVoid).with_def(id),
            SemanticType::Bool => Instr::new(Opcode::OpTypeBool).with_def(id),
            SemanticType::Int { width, signed } => Instr::new(Opcode::OpTypeInt)
                .with_def(id)
                .with_ops(vec![
                    Operand::Imm(i64::from(*width)),
                    Operand::Imm(i64::from(*signed)),
                ]),
            SemanticType::Float { width } => Instr::new(Opcode::OpTypeFloat)
                .with_def(id)
                .with_ops(vec![Operand::Imm(i64::from(*width))]),
            SemanticType::Vector { elem, len } => Instr::new(Opcode::OpTypeVector)
                .with_def(id)
                .with_ops(vec![Operand::Reg(*elem), Operand::Imm(i64::from(*len))]),
            SemanticType::Pointer { storage, pointee } => Instr::new(Opcode::OpTypePointer)
                .with_def(id)
                .with_ops(vec![
                    Operand::Imm(i64::from(*storage as u32)),
                    Operand::Reg(*pointee),
                ]),
            SemanticType::Struct { members } => Instr::new(Opcode::OpTypeStruct)
                .with_def(id)
                .with_ops(members.iter().map(|m| Operand::Reg(*m)).collect()),
            SemanticType::Function { ret, params } => {
                let mut ops = vec![Operand::Reg(*ret)];
                ops.extend(params.iter().map(|p| Operand::Reg(*p)));
                Instr::new(Opcode::OpTypeFunction).with_def(id).with_ops(ops)
            }
            SemanticType::ForwardPointer { storage } => Instr::new(Opcode::OpTypeForwardPointer)
                .with_ops(vec![
                    Operand::Reg(id),
                    Operand::Imm(i64::from(*storage as u32)),
                ]),
        }
    }

    // Convenience constructors for the common shapes.

    pub fn type_void(&mut self) -> ValueId {
        self.intern_type(SemanticType::Void)
    }

    pub fn type_bool(&mut self) -> ValueId {
        self.intern_type(SemanticType::Bool)
    }

    pub fn type_int(&mut self, width: u32, signed: bool) -> ValueId {
        self.intern_type(SemanticType::Int { width, signed })
    }

    pub fn type_float(&mut self, width: u32) -> ValueId {
        self.intern_type(SemanticType::Float { width })
    }

    pub fn type_vector(&mut self, elem: ValueId, len: u32) -> ValueId {
        self.intern_type(SemanticType::Vector { elem, len })
    }

    pub fn type_pointer(&mut self, storage: StorageClass, pointee: ValueId) -> ValueId {
        self.intern_type(SemanticType::Pointer { storage, pointee })
    }

    pub fn type_function(&mut self, ret: ValueId, params: Vec<ValueId>) -> ValueId {
        self.intern_type(SemanticType::Function { ret, params })
    }

    pub fn type_struct(&mut self, members: Vec<ValueId>) -> ValueId {
        self.intern_type(SemanticType::Struct { members })
    }

    /// Structural type behind an interned type id.
    pub fn semantic_type(&self, id: ValueId) -> Option<&SemanticType> {
        self.type_by_id.get(&id).map(|&idx| &self.type_list[idx].1)
    }

    /// Module-level type declarations in interning order.
    pub fn type_decls(&self) -> &[Instr] {
        &self.type_decls
    }

    /// Record the resolved type of a defined value.
    ///
    /// Idempotent for the same type; a different type is an internal error
    /// of an earlier stage.
    pub fn bind_type(&mut self, value: ValueId, type_id: ValueId) -> LegalizeResult<()> {
        match self.bindings.get(&value) {
            Some(&existing) if existing == type_id => Ok(()),
            Some(&existing) => Err(LegalizeError::InconsistentTypeBinding {
                value: value.0,
                first: existing.0,
                second: type_id.0,
            }),
            None => {
                self.bindings.insert(value, type_id);
                Ok(())
            }
        }
    }

    /// Resolved type id of a value, if one has been bound.
    pub fn type_of(&self, value: ValueId) -> Option<ValueId> {
        self.bindings.get(&value).copied()
    }

    /// First id registered for a constant in a scope.
    pub fn lookup_constant(&self, key: &ConstKey, scope: ConstScope) -> Option<ValueId> {
        self.consts.get(&(key.clone(), scope)).copied()
    }

    /// Track a constant under the id already holding it. First registration
    /// wins; re-adding the same key is a no-op returning the first id.
    pub fn add_constant(&mut self, key: ConstKey, scope: ConstScope, id: ValueId) -> ValueId {
        *self.consts.entry((key, scope)).or_insert(id)
    }

    /// Id for a constant, allocating a fresh one if the literal is new in
    /// this scope. The bool is true when the id was newly allocated.
    pub fn intern_constant(&mut self, key: ConstKey, scope: ConstScope) -> (ValueId, bool) {
        if let Some(id) = self.lookup_constant(&key, scope) {
            return (id, false);
        }
        let id = self.fresh_id();
        self.consts.insert((key, scope), id);
        (id, true)
    }

    /// Module-level constant declarations in creation order.
    pub fn const_decls(&self) -> &[Instr] {
        &self.const_decls
    }

    /// Integer (or boolean) constant of an interned type, materializing its
    /// declaration on first use.
    pub fn get_or_create_const_int(
        &mut self,
        ty: ValueId,
        bits: u64,
        scope: ConstScope,
    ) -> LegalizeResult<ValueId> {
        let key = ConstKey::Int { ty, bits };
        if let Some(id) = self.lookup_constant(&key, scope) {
            return Ok(id);
        }
        let width = self
            .semantic_type(ty)
            .and_then(SemanticType::scalar_width)
            .unwrap_or(32);
        let id = self.fresh_id();
        self.consts.insert((key, scope), id);
        self.bind_type(id, ty)?;
        let decl = if width == 1 {
            let opcode = if bits != 0 {
                Opcode::OpConstantTrue
            } else {
                Opcode::OpConstantFalse
            };
            Instr::new(opcode).with_def(id).with_ops(vec![Operand::Reg(ty)])
        } else {
            let mut ops = vec![Operand::Reg(ty)];
            crate::ir::builders::push_const_words(bits, width, &mut ops)?;
            Instr::new(Opcode::OpConstantI).with_def(id).with_ops(ops)
        };
        self.const_decls.push(decl);
        Ok(id)
    }

    /// Floating-point constant of an interned type.
    pub fn get_or_create_const_float(
        &mut self,
        ty: ValueId,
        value: f64,
        scope: ConstScope,
    ) -> LegalizeResult<ValueId> {
        let key = ConstKey::Float {
            ty,
            bits: value.to_bits(),
        };
        if let Some(id) = self.lookup_constant(&key, scope) {
            return Ok(id);
        }
        let width = self
            .semantic_type(ty)
            .and_then(SemanticType::scalar_width)
            .unwrap_or(32);
        let id = self.fresh_id();
        self.consts.insert((key, scope), id);
        self.bind_type(id, ty)?;
        // A 64-bit literal is carried as two raw words so no precision is
        // lost downstream; 32-bit floats stay symbolic for the f32 codec.
        let mut ops = vec![Operand::Reg(ty)];
        if width == 64 {
            crate::ir::builders::push_const_words(value.to_bits(), width, &mut ops)?;
        } else {
            ops.push(Operand::FpImm(value));
        }
        self.const_decls
            .push(Instr::new(Opcode::OpConstantF).with_def(id).with_ops(ops));
        Ok(id)
    }

    /// Composite constant built from already-registered element ids.
    pub fn get_or_create_const_composite(
        &mut self,
        ty: ValueId,
        elems: Vec<ValueId>,
        scope: ConstScope,
    ) -> LegalizeResult<ValueId> {
        debug_assert!(
            self.semantic_type(ty).is_some_and(SemanticType::is_vector),
            "composite constants take a vector type"
        );
        let key = ConstKey::Composite {
            ty,
            elems: elems.clone(),
        };
        if let Some(id) = self.lookup_constant(&key, scope) {
            return Ok(id);
        }
        let id = self.fresh_id();
        self.consts.insert((key, scope), id);
        self.bind_type(id, ty)?;
        let mut ops = vec![Operand::Reg(ty)];
        ops.extend(elems.into_iter().map(Operand::Reg));
        self.const_decls.push(
            Instr::new(Opcode::OpConstantComposite)
                .with_def(id)
                .with_ops(ops),
        );
        Ok(id)
    }

    /// Null constant of an interned type.
    pub fn get_or_create_const_null(
        &mut self,
        ty: ValueId,
        scope: ConstScope,
    ) -> LegalizeResult<ValueId> {
        let key = ConstKey::Null { ty };
        if let Some(id) = self.lookup_constant(&key, scope) {
            return Ok(id);
        }
        let id = self.fresh_id();
        self.consts.insert((key, scope), id);
        self.bind_type(id, ty)?;
        self.const_decls.push(
            Instr::new(Opcode::OpConstantNull)
                .with_def(id)
                .with_ops(vec![Operand::Reg(ty)]),
        );
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structurally_equal_types_intern_to_one_id() {
        let mut reg = GlobalRegistry::new();
        let a = reg.type_int(32, false);
        let b = reg.intern_type(SemanticType::Int { width: 32, signed: false });
        assert_eq!(a, b);
        assert_ne!(a, reg.type_int(32, true));
        assert_eq!(reg.type_decls().len(), 2);
    }

    #[test]
    fn composite_identity_follows_component_ids() {
        let mut reg = GlobalRegistry::new();
        let f32_id = reg.type_float(32);
        let v1 = reg.type_vector(f32_id, 4);
        let f32_again = reg.type_float(32);
        let v2 = reg.type_vector(f32_again, 4);
        assert_eq!(v1, v2);
    }

    #[test]
    fn rebinding_same_type_is_noop_different_fails() {
        let mut reg = GlobalRegistry::new();
        let t1 = reg.type_int(32, false);
        let t2 = reg.type_int(64, false);
        let v = reg.fresh_id();
        reg.bind_type(v, t1).unwrap();
        reg.bind_type(v, t1).unwrap();
        assert!(matches!(
            reg.bind_type(v, t2),
            Err(LegalizeError::InconsistentTypeBinding { .. })
        ));
    }

    #[test]
    fn constant_scopes_are_disjoint() {
        let mut reg = GlobalRegistry::new();
        let ty = reg.type_int(32, false);
        let key = ConstKey::Int { ty, bits: 7 };
        let (a, fresh_a) = reg.intern_constant(key.clone(), ConstScope::Function(0));
        let (b, fresh_b) = reg.intern_constant(key.clone(), ConstScope::Function(1));
        let (a2, fresh_a2) = reg.intern_constant(key, ConstScope::Function(0));
        assert!(fresh_a && fresh_b && !fresh_a2);
        assert_ne!(a, b);
        assert_eq!(a, a2);
    }

    #[test]
    fn const_declarations_materialize_once() {
        let mut reg = GlobalRegistry::new();
        let i64_ty = reg.type_int(64, false);
        let c = reg
            .get_or_create_const_int(i64_ty, 0x1_0000_002a, ConstScope::Module)
            .unwrap();
        let again = reg
            .get_or_create_const_int(i64_ty, 0x1_0000_002a, ConstScope::Module)
            .unwrap();
        assert_eq!(c, again);
        assert_eq!(reg.const_decls().len(), 1);
        assert_eq!(reg.type_of(c), Some(i64_ty));

        // 64-bit value split into two words, low word first.
        let decl = &reg.const_decls()[0];
        assert_eq!(decl.opcode, Opcode::OpConstantI);
        assert_eq!(
            decl.ops,
            vec![Operand::Reg(i64_ty), Operand::Imm(0x2a), Operand::Imm(1)]
        );
    }

    #[test]
    fn bool_constants_pick_true_false_opcodes() {
        let mut reg = GlobalRegistry::new();
        let bool_ty = reg.type_bool();
        reg.get_or_create_const_int(bool_ty, 1, ConstScope::Module)
            .unwrap();
        reg.get_or_create_const_int(bool_ty, 0, ConstScope::Module)
            .unwrap();
        let opcodes: Vec<Opcode> = reg.const_decls().iter().map(|d| d.opcode).collect();
        assert_eq!(opcodes, vec![Opcode::OpConstantTrue, Opcode::OpConstantFalse]);
    }

    #[test]
    fn double_constants_carry_their_full_bit_pattern() {
        let mut reg = GlobalRegistry::new();
        let f64_ty = reg.type_float(64);
        let f32_ty = reg.type_float(32);
        let value = 1.000_000_000_000_000_2_f64;
        reg.get_or_create_const_float(f64_ty, value, ConstScope::Module)
            .unwrap();
        reg.get_or_create_const_float(f32_ty, 1.5, ConstScope::Module)
            .unwrap();

        // 64-bit literals are split into raw words, low first, so nothing
        // is rounded through f32 on the way out.
        let bits = value.to_bits();
        let decls = reg.const_decls();
        assert_eq!(
            decls[0].ops,
            vec![
                Operand::Reg(f64_ty),
                Operand::Imm((bits & 0xffff_ffff) as i64),
                Operand::Imm((bits >> 32) as i64),
            ]
        );
        assert_eq!(decls[1].ops, vec![Operand::Reg(f32_ty), Operand::FpImm(1.5)]);
    }

    #[test]
    fn null_constants_materialize_and_dedup() {
        let mut reg = GlobalRegistry::new();
        let ty = reg.type_int(32, false);
        let a = reg.get_or_create_const_null(ty, ConstScope::Module).unwrap();
        let b = reg.get_or_create_const_null(ty, ConstScope::Module).unwrap();
        assert_eq!(a, b);
        assert_eq!(reg.const_decls().len(), 1);
        assert_eq!(reg.const_decls()[0].opcode, Opcode::OpConstantNull);
        assert_eq!(reg.type_of(a), Some(ty));
    }
}
