// This module defines the opcode space of the backend and a per-opcode
// descriptor table that makes the operand grammar data-driven. The opcode
// enum covers three layers: generic pre-legalization operations produced by
// the front end (constants, global values, copies, casts, arithmetic and the
// side-channel intrinsic markers), pseudo operations synthesized during
// legalization (AssignType and the GetId identifier-class family), and the
// target instructions that survive to emission. Each target opcode carries an
// OpDesc naming its mnemonic, its binary opcode value, the static layout of
// its fixed operand region (ids, immediates, enum kinds, embedded strings),
// whether a variable tail follows, and which tail grammar governs it. The
// printer and encoder look descriptors up once per instruction instead of
// branching on the opcode throughout, which keeps each grammar rule testable
// on its own.

//! Opcodes and the per-opcode operand-grammar descriptor table.

/// Kind of an enum-typed immediate operand, used by the printer to pick the
/// right symbolic name table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumKind {
    StorageClass,
    ExecutionModel,
    AddressingModel,
    MemoryModel,
    ExecutionMode,
    Capability,
    Decoration,
    Dim,
    ImageFormat,
    FunctionControl,
}

/// Static shape of one operand in the fixed region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixedOp {
    /// Result id; rendered as a `%n = ` prefix.
    Def,
    /// Plain id reference.
    Id,
    /// Plain integer literal.
    Imm,
    /// Enum immediate printed through its name table.
    Enum(EnumKind),
    /// Packed string literal starting at this index; consumes a
    /// value-dependent number of operands. Must be the last fixed entry.
    Str,
    /// Extended-instruction number, resolved against the set operand.
    ExtInstNum,
}

/// Grammar of the variable operand tail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tail {
    /// No variable operands.
    None,
    /// Plain operand list.
    Plain,
    /// Everything after the fixed region was consumed by the fixed string.
    StringDone,
    /// One optional access qualifier (OpTypeImage).
    AccessQualifier,
    /// One optional plain operand (OpVariable initializer).
    Single,
    /// Id operands only; string-literal words in the tail are skipped
    /// (OpEntryPoint interface list).
    IdsOnly,
    /// Flat literal tail (OpExecutionMode, OpLoopMerge).
    Literals,
    /// One memory-operand mask, then plain operands (OpLoad/OpStore).
    Memory,
    /// Repeated memory-operand groups, each mask optionally followed by an
    /// alignment literal (OpCopyMemory/OpCopyMemorySized).
    MemoryGroups,
    /// One image-operand mask, then plain operands.
    Image,
    /// Either a two-word packed 64-bit literal or a plain list
    /// (OpConstantI/OpConstantF).
    WideConstant,
    /// Sub-grammar selected by the decoration kind operand.
    Decorate,
    /// Sub-grammar selected by the imported instruction set.
    ExtInst,
}

/// Per-opcode grammar descriptor.
#[derive(Debug, Clone, Copy)]
pub struct OpDesc {
    pub mnemonic: &'static str,
    /// Binary opcode value for the word stream.
    pub value: u16,
    pub fixed: &'static [FixedOp],
    pub is_variadic: bool,
    pub tail: Tail,
}

impl OpDesc {
    /// Index of the first variable operand. Meaningless for descriptors
    /// whose last fixed operand is a string.
    pub fn num_fixed_ops(&self) -> usize {
        self.fixed.len()
    }

    pub fn has_def(&self) -> bool {
        matches!(self.fixed.first(), Some(FixedOp::Def))
    }
}

/// Every operation the backend knows about.
///
/// `G*` opcodes are the generic pre-legalization layer, `GIntr*` are the
/// side-channel markers erased by legalization, `AssignType`/`Get*Id` are
/// legalization pseudos, and `Op*` are target instructions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    // Generic layer.
    GConstant,
    GFConstant,
    GBuildVector,
    GGlobalValue,
    GTrunc,
    GAddrSpaceCast,
    GBitcast,
    GCopy,
    GAdd,
    GSub,
    GMul,
    // Intrinsic markers.
    GIntrAssignType,
    GIntrTrackConstant,
    GIntrConstComposite,
    GIntrAssignName,
    GIntrBitcast,
    // Legalization pseudos.
    AssignType,
    GetId,
    GetFId,
    GetPId,
    GetVId,
    GetVfId,
    // Target instructions.
    OpUndef,
    OpName,
    OpString,
    OpExtension,
    OpExtInstImport,
    OpExtInst,
    OpMemoryModel,
    OpEntryPoint,
    OpExecutionMode,
    OpCapability,
    OpTypeVoid,
    OpTypeBool,
    OpTypeInt,
    OpTypeFloat,
    OpTypeVector,
    OpTypeImage,
    OpTypeStruct,
    OpTypePointer,
    OpTypeFunction,
    OpTypeForwardPointer,
    OpConstantTrue,
    OpConstantFalse,
    OpConstantI,
    OpConstantF,
    OpConstantComposite,
    OpConstantNull,
    OpFunction,
    OpFunctionParameter,
    OpFunctionEnd,
    OpFunctionCall,
    OpVariable,
    OpLoad,
    OpStore,
    OpCopyMemory,
    OpCopyMemorySized,
    OpDecorate,
    OpMemberDecorate,
    OpImageSampleImplicitLod,
    OpImageFetch,
    OpImageRead,
    OpImageWrite,
    OpBitcast,
    OpIAdd,
    OpFAdd,
    OpISub,
    OpFSub,
    OpIMul,
    OpFMul,
    OpLoopMerge,
    OpSelectionMerge,
    OpLabel,
    OpBranch,
    OpBranchConditional,
    OpReturn,
    OpReturnValue,
}

macro_rules! desc {
    ($mnemonic:literal, $value:literal, [$($fixed:expr),*], $variadic:literal, $tail:expr) => {
        &OpDesc {
            mnemonic: $mnemonic,
            value: $value,
            fixed: &[$($fixed),*],
            is_variadic: $variadic,
            tail: $tail,
        }
    };
}

use EnumKind as K;
use FixedOp::{Def, Enum, ExtInstNum, Id, Imm, Str};

impl Opcode {
    /// Grammar descriptor for target instructions. Generic and pseudo
    /// opcodes have no descriptor; they must never reach the printer or
    /// encoder.
    pub fn desc(self) -> Option<&'static OpDesc> {
        use Opcode::*;
        let d: &'static OpDesc = match self {
            OpUndef => desc!("OpUndef", 1, [Def, Id], false, Tail::None),
            OpName => desc!("OpName", 5, [Id, Str], true, Tail::StringDone),
            OpString => desc!("OpString", 7, [Def, Str], true, Tail::StringDone),
            OpExtension => desc!("OpExtension", 10, [Str], true, Tail::StringDone),
            OpExtInstImport => {
                desc!("OpExtInstImport", 11, [Def, Str], true, Tail::StringDone)
            }
            OpExtInst => {
                desc!("OpExtInst", 12, [Def, Id, Id, ExtInstNum], true, Tail::ExtInst)
            }
            OpMemoryModel => desc!(
                "OpMemoryModel",
                14,
                [Enum(K::AddressingModel), Enum(K::MemoryModel)],
                false,
                Tail::None
            ),
            OpEntryPoint => desc!(
                "OpEntryPoint",
                15,
                [Enum(K::ExecutionModel), Id, Str],
                true,
                Tail::IdsOnly
            ),
            OpExecutionMode => desc!(
                "OpExecutionMode",
                16,
                [Id, Enum(K::ExecutionMode)],
                true,
                Tail::Literals
            ),
            OpCapability => {
                desc!("OpCapability", 17, [Enum(K::Capability)], false, Tail::None)
            }
            OpTypeVoid => desc!("OpTypeVoid", 19, [Def], false, Tail::None),
            OpTypeBool => desc!("OpTypeBool", 20, [Def], false, Tail::None),
            OpTypeInt => desc!("OpTypeInt", 21, [Def, Imm, Imm], false, Tail::None),
            OpTypeFloat => desc!("OpTypeFloat", 22, [Def, Imm], false, Tail::None),
            OpTypeVector => desc!("OpTypeVector", 23, [Def, Id, Imm], false, Tail::None),
            OpTypeImage => desc!(
                "OpTypeImage",
                25,
                [Def, Id, Enum(K::Dim), Imm, Imm, Imm, Imm, Enum(K::ImageFormat)],
                true,
                Tail::AccessQualifier
            ),
            OpTypeStruct => desc!("OpTypeStruct", 30, [Def], true, Tail::Plain),
            OpTypePointer => desc!(
                "OpTypePointer",
                32,
                [Def, Enum(K::StorageClass), Id],
                false,
                Tail::None
            ),
            OpTypeFunction => desc!("OpTypeFunction", 33, [Def, Id], true, Tail::Plain),
            OpTypeForwardPointer => desc!(
                "OpTypeForwardPointer",
                39,
                [Id, Enum(K::StorageClass)],
                false,
                Tail::None
            ),
            OpConstantTrue => desc!("OpConstantTrue", 41, [Def, Id], false, Tail::None),
            OpConstantFalse => desc!("OpConstantFalse", 42, [Def, Id], false, Tail::None),
            OpConstantI => desc!("OpConstantI", 43, [Def, Id], true, Tail::WideConstant),
            OpConstantF => desc!("OpConstantF", 43, [Def, Id], true, Tail::WideConstant),
            OpConstantComposite => {
                desc!("OpConstantComposite", 44, [Def, Id], true, Tail::Plain)
            }
            OpConstantNull => desc!("OpConstantNull", 46, [Def, Id], false, Tail::None),
            OpFunction => desc!(
                "OpFunction",
                54,
                [Def, Id, Enum(K::FunctionControl), Id],
                false,
                Tail::None
            ),
            OpFunctionParameter => {
                desc!("OpFunctionParameter", 55, [Def, Id], false, Tail::None)
            }
            OpFunctionEnd => desc!("OpFunctionEnd", 56, [], false, Tail::None),
            OpFunctionCall => desc!("OpFunctionCall", 57, [Def, Id, Id], true, Tail::Plain),
            OpVariable => desc!(
                "OpVariable",
                59,
                [Def, Id, Enum(K::StorageClass)],
                true,
                Tail::Single
            ),
            OpLoad => desc!("OpLoad", 61, [Def, Id, Id], true, Tail::Memory),
            OpStore => desc!("OpStore", 62, [Id, Id], true, Tail::Memory),
            OpCopyMemory => desc!("OpCopyMemory", 63, [Id, Id], true, Tail::MemoryGroups),
            OpCopyMemorySized => {
                desc!("OpCopyMemorySized", 64, [Id, Id, Id], true, Tail::MemoryGroups)
            }
            OpDecorate => desc!(
                "OpDecorate",
                71,
                [Id, Enum(K::Decoration)],
                true,
                Tail::Decorate
            ),
            OpMemberDecorate => desc!(
                "OpMemberDecorate",
                72,
                [Id, Imm, Enum(K::Decoration)],
                true,
                Tail::Decorate
            ),
            OpImageSampleImplicitLod => desc!(
                "OpImageSampleImplicitLod",
                87,
                [Def, Id, Id, Id],
                true,
                Tail::Image
            ),
            OpImageFetch => desc!("OpImageFetch", 95, [Def, Id, Id, Id], true, Tail::Image),
            OpImageRead => desc!("OpImageRead", 98, [Def, Id, Id, Id], true, Tail::Image),
            OpImageWrite => desc!("OpImageWrite", 99, [Id, Id, Id], true, Tail::Image),
            OpBitcast => desc!("OpBitcast", 124, [Def, Id, Id], false, Tail::None),
            OpIAdd => desc!("OpIAdd", 128, [Def, Id, Id, Id], false, Tail::None),
            OpFAdd => desc!("OpFAdd", 129, [Def, Id, Id, Id], false, Tail::None),
            OpISub => desc!("OpISub", 130, [Def, Id, Id, Id], false, Tail::None),
            OpFSub => desc!("OpFSub", 131, [Def, Id, Id, Id], false, Tail::None),
            OpIMul => desc!("OpIMul", 132, [Def, Id, Id, Id], false, Tail::None),
            OpFMul => desc!("OpFMul", 133, [Def, Id, Id, Id], false, Tail::None),
            OpLoopMerge => desc!("OpLoopMerge", 246, [Id, Id, Imm], true, Tail::Literals),
            OpSelectionMerge => {
                desc!("OpSelectionMerge", 247, [Id, Imm], false, Tail::None)
            }
            OpLabel => desc!("OpLabel", 248, [Def], false, Tail::None),
            OpBranch => desc!("OpBranch", 249, [Id], false, Tail::None),
            OpBranchConditional => {
                desc!("OpBranchConditional", 250, [Id, Id, Id], true, Tail::Plain)
            }
            OpReturn => desc!("OpReturn", 253, [], false, Tail::None),
            OpReturnValue => desc!("OpReturnValue", 254, [Id], false, Tail::None),
            _ => return None,
        };
        Some(d)
    }

    /// True for generic and pseudo opcodes that legalization must remove or
    /// that a later selection stage consumes.
    pub fn is_pseudo(self) -> bool {
        self.desc().is_none()
    }

    /// Copy-like forms the type propagator chases through.
    pub fn is_pass_through(self) -> bool {
        matches!(
            self,
            Opcode::GCopy | Opcode::GTrunc | Opcode::GAddrSpaceCast | Opcode::GBitcast
        )
    }

    /// Opcodes whose operands must be folded into identifier classes before
    /// selection.
    pub fn is_type_folding(self) -> bool {
        matches!(self, Opcode::GAdd | Opcode::GSub | Opcode::GMul)
    }

    /// Instructions that declare a constant.
    pub fn is_constant_instr(self) -> bool {
        matches!(
            self,
            Opcode::OpConstantTrue
                | Opcode::OpConstantFalse
                | Opcode::OpConstantI
                | Opcode::OpConstantF
                | Opcode::OpConstantComposite
                | Opcode::OpConstantNull
                | Opcode::OpUndef
        )
    }

    /// Instructions that declare a type.
    pub fn is_type_decl_instr(self) -> bool {
        matches!(
            self,
            Opcode::OpTypeVoid
                | Opcode::OpTypeBool
                | Opcode::OpTypeInt
                | Opcode::OpTypeFloat
                | Opcode::OpTypeVector
                | Opcode::OpTypeImage
                | Opcode::OpTypeStruct
                | Opcode::OpTypePointer
                | Opcode::OpTypeFunction
                | Opcode::OpTypeForwardPointer
        )
    }

    /// Instructions that decorate another value.
    pub fn is_decoration_instr(self) -> bool {
        matches!(self, Opcode::OpDecorate | Opcode::OpMemberDecorate)
    }

    /// Module-header instructions, emitted before any function body.
    pub fn is_header_instr(self) -> bool {
        matches!(
            self,
            Opcode::OpCapability
                | Opcode::OpExtension
                | Opcode::OpExtInstImport
                | Opcode::OpMemoryModel
                | Opcode::OpEntryPoint
                | Opcode::OpExecutionMode
                | Opcode::OpString
                | Opcode::OpName
        ) || self.is_type_decl_instr()
            || self.is_constant_instr()
            || self.is_decoration_instr()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_ops_have_descriptors() {
        let d = Opcode::OpDecorate.desc().unwrap();
        assert_eq!(d.mnemonic, "OpDecorate");
        assert_eq!(d.num_fixed_ops(), 2);
        assert!(d.is_variadic);
        assert!(!d.has_def());

        let d = Opcode::OpLoad.desc().unwrap();
        assert!(d.has_def());
        assert_eq!(d.tail, Tail::Memory);
    }

    #[test]
    fn pseudo_ops_have_none() {
        assert!(Opcode::GConstant.is_pseudo());
        assert!(Opcode::AssignType.is_pseudo());
        assert!(Opcode::GetFId.is_pseudo());
        assert!(!Opcode::OpLoad.is_pseudo());
    }

    #[test]
    fn section_classifiers_partition_the_stream() {
        assert!(Opcode::OpTypeInt.is_type_decl_instr());
        assert!(Opcode::OpConstantNull.is_constant_instr());
        assert!(Opcode::OpMemberDecorate.is_decoration_instr());
        assert!(Opcode::OpEntryPoint.is_header_instr());
        assert!(Opcode::OpDecorate.is_header_instr());
        assert!(!Opcode::OpLoad.is_header_instr());
        assert!(!Opcode::OpFunction.is_header_instr());
    }

    #[test]
    fn constant_variants_share_binary_value() {
        assert_eq!(
            Opcode::OpConstantI.desc().unwrap().value,
            Opcode::OpConstantF.desc().unwrap().value
        );
    }
}
