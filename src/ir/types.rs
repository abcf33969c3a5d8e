// This module defines SemanticType, the structural description of a value's
// shape that the registry interns for identity. Scalar types carry their
// width (and signedness for integers), vectors and pointers reference the
// already-interned id of their component type, and aggregates and function
// signatures carry ordered component id lists. Because composite forms embed
// component *ids* rather than nested structures, structural equality of two
// independently built types reduces to plain Eq/Hash over the enum, and
// interning is inherently bottom-up. ForwardPointer is the escape hatch for
// the recursive forms the format declares ahead of their pointee.

//! Structural value types, interned by the registry.

use crate::ir::ValueId;
use crate::spv::StorageClass;

/// Structural description of a value's shape.
///
/// Composite forms reference component types by their interned id, so a
/// component must be interned before any type built from it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SemanticType {
    Void,
    Bool,
    Int { width: u32, signed: bool },
    Float { width: u32 },
    Vector { elem: ValueId, len: u32 },
    Pointer { storage: StorageClass, pointee: ValueId },
    Struct { members: Vec<ValueId> },
    Function { ret: ValueId, params: Vec<ValueId> },
    /// Forward declaration for explicitly-recursive pointer forms.
    ForwardPointer { storage: StorageClass },
}

impl SemanticType {
    /// Bit width of a scalar type, if it has one.
    pub fn scalar_width(&self) -> Option<u32> {
        match self {
            SemanticType::Bool => Some(1),
            SemanticType::Int { width, .. } | SemanticType::Float { width } => Some(*width),
            _ => None,
        }
    }

    pub fn is_float(&self) -> bool {
        matches!(self, SemanticType::Float { .. })
    }

    pub fn is_pointer(&self) -> bool {
        matches!(
            self,
            SemanticType::Pointer { .. } | SemanticType::ForwardPointer { .. }
        )
    }

    pub fn is_vector(&self) -> bool {
        matches!(self, SemanticType::Vector { .. })
    }
}
